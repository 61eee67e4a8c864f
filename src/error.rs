use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that abort a whole analysis call.
///
/// A single bad detection never shows up here; it is recorded as a
/// [`RejectedDetection`] and the batch carries on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid frame dimensions {width}x{height}: width and height must be positive")]
    InvalidFrame { width: i64, height: i64 },

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

/// Why the normalizer dropped a detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// `x_max <= x_min` or `y_max <= y_min`.
    InvertedBox,
    /// An edge, or a size derived from the edges, is not finite.
    NonFiniteCoordinate,
    /// No overlap with the frame once clipped to it.
    OutOfFrame,
    EmptyLabel,
    /// Confidence outside `[0, 1]` or NaN.
    ConfidenceOutOfRange,
    /// Valid, but under the configured minimum confidence.
    BelowMinConfidence,
}

impl RejectReason {
    /// Low-confidence drops are a filter, everything else is malformed input.
    pub fn is_malformed(self) -> bool {
        !matches!(self, RejectReason::BelowMinConfidence)
    }
}

/// A detection dropped during normalization, keyed by its input position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RejectedDetection {
    pub index: usize,
    pub reason: RejectReason,
}
