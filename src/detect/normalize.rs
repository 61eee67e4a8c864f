use crate::config::NormalizationSettings;
use crate::detect::result::{Detection, ImageFrame, RawDetection};
use crate::error::{AnalysisError, RejectReason, RejectedDetection};

/// Output of [`normalize_detections`]: survivors plus a record of every drop.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedBatch {
    pub frame: ImageFrame,
    pub detections: Vec<Detection>,
    pub rejected: Vec<RejectedDetection>,
}

impl NormalizedBatch {
    pub fn malformed_count(&self) -> usize {
        self.rejected
            .iter()
            .filter(|r| r.reason.is_malformed())
            .count()
    }

    pub fn low_confidence_count(&self) -> usize {
        self.rejected.len() - self.malformed_count()
    }
}

/// Validates raw detector output against a frame.
///
/// A bad frame fails the whole call. A bad detection is dropped and recorded;
/// it never aborts the batch.
pub fn normalize_detections(
    raw: &[RawDetection],
    width: i64,
    height: i64,
    settings: &NormalizationSettings,
) -> Result<NormalizedBatch, AnalysisError> {
    let frame = ImageFrame::new(width, height)?;

    let mut detections = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    for (index, det) in raw.iter().enumerate() {
        match check_detection(det, frame, settings.min_confidence) {
            Ok(()) => detections.push(Detection::from_raw(det, frame)),
            Err(reason) => {
                log::debug!(
                    "dropping detection #{} ({:?}): {:?}",
                    index,
                    det.class_name,
                    reason
                );
                rejected.push(RejectedDetection { index, reason });
            }
        }
    }

    if detections.is_empty() && !raw.is_empty() {
        log::warn!("all {} detections were rejected during normalization", raw.len());
    }

    Ok(NormalizedBatch {
        frame,
        detections,
        rejected,
    })
}

fn check_detection(
    det: &RawDetection,
    frame: ImageFrame,
    min_confidence: f64,
) -> Result<(), RejectReason> {
    if det.class_name.trim().is_empty() {
        return Err(RejectReason::EmptyLabel);
    }
    let coords = [det.x_min, det.y_min, det.x_max, det.y_max];
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(RejectReason::NonFiniteCoordinate);
    }
    if !(0.0..=1.0).contains(&det.confidence) {
        return Err(RejectReason::ConfidenceOutOfRange);
    }
    if det.x_max <= det.x_min || det.y_max <= det.y_min {
        return Err(RejectReason::InvertedBox);
    }
    // Finite edges can still overflow once subtracted, summed or multiplied.
    let width = det.x_max - det.x_min;
    let height = det.y_max - det.y_min;
    let derived = [
        width,
        height,
        width * height,
        (det.x_min + det.x_max) / 2.0,
        (det.y_min + det.y_max) / 2.0,
    ];
    if derived.iter().any(|v| !v.is_finite()) {
        return Err(RejectReason::NonFiniteCoordinate);
    }
    let [x_min, y_min, x_max, y_max] = frame.clip([det.x_min, det.y_min, det.x_max, det.y_max]);
    if x_max <= x_min || y_max <= y_min {
        return Err(RejectReason::OutOfFrame);
    }
    if det.confidence < min_confidence {
        return Err(RejectReason::BelowMinConfidence);
    }
    Ok(())
}
