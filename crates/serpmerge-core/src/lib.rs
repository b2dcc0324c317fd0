pub mod cache;
pub mod classify;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod rollup;

pub use cache::{cache_key, TransformCache};
pub use classify::extract_segment;
pub use error::{Result, TransformError};
pub use export::{
    bundle_archive, ExportError, OutputTable, ARCHIVE_NAME, COMBINED_CSV, FULL_SEGMENT_CSV,
    PARTIAL_SEGMENT_CSV,
};
pub use model::{
    ClassifiedRow, MergedRow, MergedTable, NormalizedRow, RawTable, RowOrigin, SegmentRollup,
    TableInput, TransformOptions, TransformOutput, REQUIRED_COLUMNS,
};
pub use pipeline::transform;
