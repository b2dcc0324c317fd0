use tracing::info;

use crate::classify;
use crate::error::Result;
use crate::loader;
use crate::model::{TableInput, TransformOptions, TransformOutput};
use crate::normalize;
use crate::rollup;

/// Runs the full pipeline over the supplied reports in one blocking
/// call: merge, filter and type, classify, roll up. A fatal error at
/// any stage aborts the run with no partial output; reruns with the
/// same inputs and options produce identical results.
pub fn transform(inputs: &[TableInput], options: &TransformOptions) -> Result<TransformOutput> {
    options.validate()?;

    let merged = loader::merge_inputs(inputs)?;
    let normalized = normalize::normalize(&merged, options.max_position)?;
    let (combined, branded_applied) = classify::classify(normalized, &options.branded_terms)?;
    let (full_segments, partial_segments) = rollup::rollup_segments(&combined);

    info!(
        combined_rows = combined.len(),
        segments = full_segments.len(),
        partial_segments = partial_segments.len(),
        branded_applied,
        "transform complete"
    );

    Ok(TransformOutput {
        combined,
        full_segments,
        partial_segments,
        branded_applied,
        include_segments: options.include_segments,
    })
}
