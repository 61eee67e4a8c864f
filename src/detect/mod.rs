mod normalize;
mod result;

pub use normalize::{normalize_detections, NormalizedBatch};
pub use result::{AnalysisRequest, Detection, ImageFrame, RawDetection};
