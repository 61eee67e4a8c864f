//! Shelf layout inference over object-detection output.
//!
//! This crate turns an unordered set of labeled bounding boxes for one image
//! into a structured picture of a retail shelf: how many rows and columns the
//! objects imply, how densely the frame is packed, which shelf and column each
//! object sits on, and a categorical label for the display.
//!
//! # Pipeline
//!
//! 1. `detect`: validate raw boxes against the frame and derive centers, areas
//!    and normalized coordinates. Bad boxes are dropped and counted.
//! 2. `layout::cluster`: gap-based 1-D clustering on normalized `center_y` and
//!    `center_x` to estimate row and column counts.
//! 3. `layout::assign`: fixed-band row and left/center/right column labels.
//! 4. `layout::classify`: density, per-class counts, layout label, stock level.
//! 5. `report`: everything above folded into one [`AnalysisReport`].
//!
//! Every stage is a pure function of its inputs. Nothing is shared between
//! calls, so independent analyses can run on any number of threads.
//!
//! The only fatal error is an invalid frame (or an invalid config); an empty
//! detection list yields a valid `empty` report.

pub mod batch;
pub mod config;
pub mod detect;
pub mod error;
pub mod fingerprint;
pub mod layout;
pub mod report;

pub use batch::analyze_batch;
pub use config::AnalysisConfig;
pub use detect::{AnalysisRequest, Detection, ImageFrame, RawDetection};
pub use error::{AnalysisError, RejectReason, RejectedDetection};
pub use layout::{ColumnLabel, ColumnSide, LayoutType, PositioningDetail, ThresholdPolicy};
pub use report::{AnalysisReport, DropCounts};

/// Analyzes one image's detections.
///
/// Fails only on an invalid frame or config. Malformed detections are
/// excluded from every figure and reported in [`AnalysisReport::dropped`].
pub fn analyze(
    request: &AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;
    let batch = detect::normalize_detections(
        &request.detections,
        request.image_width,
        request.image_height,
        &config.normalization,
    )?;
    let fingerprint = fingerprint::request_fingerprint(request, config)?;
    let report = report::build_report(&batch, config, fingerprint);

    log::info!(
        "analyzed {}x{} frame: {} objects ({} dropped), {} rows x {} columns, layout {}",
        report.image_dimensions.width,
        report.image_dimensions.height,
        report.total_objects,
        batch.rejected.len(),
        report.estimated_rows,
        report.estimated_columns,
        report.layout_type
    );
    Ok(report)
}
