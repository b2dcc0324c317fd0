use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use serpmerge_core::{
    bundle_archive, transform, TableInput, TransformError, TransformOptions,
};

fn fixture(name: &str) -> TableInput {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let path = base.join("tests/data").join(name);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", path.display(), err));
    TableInput::new(name, contents)
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

#[test]
fn merges_filters_and_flags_fixture_reports() {
    let inputs = [fixture("organic_page1.csv"), fixture("organic_page2.csv")];
    let options = TransformOptions {
        max_position: 11,
        branded_terms: vec!["acme".to_string()],
        include_segments: false,
    };

    let output = transform(&inputs, &options).expect("transform failed");

    // The page-2 copy of "running shoes" is an exact duplicate and must
    // merge away instead of doubling its traffic.
    let keywords: Vec<&str> = output
        .combined
        .iter()
        .map(|row| row.keyword.as_str())
        .collect();
    assert_eq!(
        keywords,
        [
            "acme",
            "acme shoes",
            "running shoes",
            "trail shoes guide",
            "acme returns",
            "size chart",
            "waterproof shoes",
        ]
    );
    assert_eq!(output.combined[0].traffic, 9100);
    assert!(output.combined.iter().all(|row| row.position <= 11));
    assert!(output
        .combined
        .iter()
        .all(|row| row.date == Some(day(2024, 3, 11))));

    let branded: Vec<Option<bool>> = output.combined.iter().map(|row| row.branded).collect();
    assert_eq!(
        branded,
        [
            Some(true),
            Some(true),
            Some(false),
            Some(false),
            Some(true),
            Some(false),
            Some(false),
        ]
    );

    let segments: Vec<(&str, i64, usize)> = output
        .full_segments
        .iter()
        .map(|rollup| (rollup.segment.as_str(), rollup.traffic, rollup.occurrences))
        .collect();
    assert_eq!(
        segments,
        [
            ("home", 9100, 1),
            ("shoes", 7500, 2),
            ("trail-shoes", 950, 1),
            ("returns", 880, 1),
            ("size-chart", 410, 1),
            ("waterproof", 300, 1),
        ]
    );
    assert!(output.partial_segments.is_empty());

    let table = output.combined_table().expect("render failed");
    assert_eq!(table.columns.last().map(String::as_str), Some("branded"));
    assert!(!table.columns.iter().any(|column| column == "segment"));
}

#[test]
fn wide_position_window_keeps_deep_rows() {
    let inputs = [fixture("organic_page1.csv"), fixture("organic_page2.csv")];
    let options = TransformOptions {
        max_position: 100,
        branded_terms: vec![],
        include_segments: true,
    };

    let output = transform(&inputs, &options).expect("transform failed");
    assert_eq!(output.combined.len(), 12);
    assert_eq!(output.full_segments.len(), 10);
    assert!(!output.branded_applied);

    // Both blog rows point at the same URL, so their traffic rolls up
    // into one segment across the two reports.
    let trail = output
        .full_segments
        .iter()
        .find(|rollup| rollup.segment == "trail-shoes")
        .expect("trail-shoes segment missing");
    assert_eq!(trail.traffic, 990);
    assert_eq!(trail.occurrences, 2);
    assert_eq!(
        trail.keywords,
        ["trail shoes guide", "appalachian trail shoes"]
    );

    // The insoles timestamp is unreadable; the row survives with a null
    // date rather than failing the run.
    let insoles = output
        .combined
        .iter()
        .find(|row| row.keyword == "insoles")
        .expect("insoles row missing");
    assert_eq!(insoles.date, None);

    let table = output.combined_table().expect("render failed");
    assert_eq!(table.columns.last().map(String::as_str), Some("segment"));
    let insoles_row = table
        .rows
        .iter()
        .find(|cells| cells[0] == "insoles")
        .expect("insoles row missing from table");
    assert_eq!(insoles_row[6], "");
    assert_eq!(insoles_row[7], "insoles");
}

#[test]
fn empty_result_keeps_shaped_headers() {
    let inputs = [fixture("organic_page2.csv")];
    let options = TransformOptions {
        max_position: 1,
        branded_terms: vec!["acme".to_string()],
        include_segments: false,
    };

    let output = transform(&inputs, &options).expect("transform failed");
    assert!(output.combined.is_empty());
    assert!(output.full_segments.is_empty());
    assert!(output.partial_segments.is_empty());

    let combined = output
        .combined_table()
        .expect("render failed")
        .to_csv()
        .expect("csv failed");
    assert_eq!(
        combined,
        "keyword,position,search_volume,keyword_intents,url,traffic,date,branded\n"
    );

    let full = output
        .full_segment_table()
        .expect("render failed")
        .to_csv()
        .expect("csv failed");
    assert_eq!(full, "segment,traffic,keyword,url,occurrences\n");
}

#[test]
fn partial_band_rollup_from_generated_rows() {
    let mut contents =
        String::from("Keyword,Position,Search Volume,Keyword Intents,URL,Traffic,Timestamp\n");
    for index in 0..8 {
        contents.push_str(&format!(
            "guide topic {index},3,400,informational,https://acme.com/guides/seo?page={index},50,2024-03-02\n"
        ));
    }
    contents.push_str("acme,1,9000,branded,https://acme.com/,800,2024-03-02\n");
    let inputs = [TableInput::new("guides.csv", contents)];

    let output = transform(&inputs, &TransformOptions::default()).expect("transform failed");
    assert_eq!(output.full_segments.len(), 2);
    assert_eq!(output.full_segments[0].segment, "home");

    assert_eq!(output.partial_segments.len(), 1);
    let partial = &output.partial_segments[0];
    assert_eq!(partial.segment, "seo");
    assert_eq!(partial.occurrences, 8);
    assert_eq!(partial.traffic, 400);
    // Equal traffic keeps merged order, so the sample is the first three.
    assert_eq!(
        partial.keywords,
        ["guide topic 0", "guide topic 1", "guide topic 2"]
    );
}

#[test]
fn single_branded_row_flows_through_both_views() {
    let row = "client shoes,3,100,commercial,https://site.com/shop/shoes,\"1,200\",2024-03-15\n";
    let header = "Keyword,Position,Search Volume,Keyword Intents,URL,Traffic,Timestamp\n";
    let inputs = [
        TableInput::new("march.csv", format!("{header}{row}")),
        TableInput::new("march_rerun.csv", format!("{header}{row}")),
    ];
    let options = TransformOptions {
        max_position: 11,
        branded_terms: vec!["client".to_string()],
        include_segments: false,
    };

    let output = transform(&inputs, &options).expect("transform failed");

    assert_eq!(output.combined.len(), 1);
    let combined = &output.combined[0];
    assert_eq!(combined.keyword, "client shoes");
    assert_eq!(combined.traffic, 1200);
    assert_eq!(combined.branded, Some(true));
    assert_eq!(combined.date, Some(day(2024, 3, 11)));

    assert_eq!(output.full_segments.len(), 1);
    let segment = &output.full_segments[0];
    assert_eq!(segment.segment, "shoes");
    assert_eq!(segment.traffic, 1200);
    assert_eq!(segment.occurrences, 1);
    assert!(output.partial_segments.is_empty());

    let table = output.combined_table().expect("render failed");
    assert_eq!(table.rows[0][5], "1,200");
    assert_eq!(table.rows[0][6], "2024-03-11");
    assert_eq!(table.rows[0][7], "true");
}

#[test]
fn missing_required_column_is_fatal() {
    let inputs = [fixture("organic_page1.csv"), fixture("missing_timestamp.csv")];

    match transform(&inputs, &TransformOptions::default()) {
        Err(TransformError::MissingColumn { input, column }) => {
            assert_eq!(input, "missing_timestamp.csv");
            assert_eq!(column, "Timestamp");
        }
        other => panic!("expected MissingColumn error, got {other:?}"),
    }
}

#[test]
fn invalid_max_position_is_rejected() {
    let inputs = [fixture("organic_page1.csv")];
    let options = TransformOptions {
        max_position: 0,
        ..TransformOptions::default()
    };

    assert!(matches!(
        transform(&inputs, &options),
        Err(TransformError::MaxPositionOutOfRange { value: 0 })
    ));
}

#[test]
fn repeat_runs_produce_identical_output() {
    let inputs = [fixture("organic_page1.csv"), fixture("organic_page2.csv")];
    let options = TransformOptions {
        max_position: 11,
        branded_terms: vec!["acme".to_string()],
        include_segments: true,
    };

    let first = transform(&inputs, &options).expect("first run failed");
    let second = transform(&inputs, &options).expect("second run failed");
    assert_eq!(first, second);

    let left = bundle_archive(&first).expect("first bundle failed");
    let right = bundle_archive(&second).expect("second bundle failed");
    assert_eq!(left, right);
}
