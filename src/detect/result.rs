use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Detection as handed over by the upstream detector (pixel space, unvalidated).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_name: String,
    pub confidence: f64,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl RawDetection {
    pub fn new(class_name: impl Into<String>, confidence: f64, bbox: [f64; 4]) -> Self {
        let [x_min, y_min, x_max, y_max] = bbox;
        Self {
            class_name: class_name.into(),
            confidence,
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

/// One image's worth of detector output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Signed so that bad upstream dimensions reach validation instead of failing decode.
    pub image_width: i64,
    pub image_height: i64,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// Pixel coordinate space shared by every detection of one analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
}

impl ImageFrame {
    pub fn new(width: i64, height: i64) -> Result<Self, AnalysisError> {
        let invalid = AnalysisError::InvalidFrame { width, height };
        if width <= 0 || height <= 0 {
            return Err(invalid);
        }
        let w = u32::try_from(width).map_err(|_| invalid.clone())?;
        let h = u32::try_from(height).map_err(|_| invalid)?;
        Ok(Self {
            width: w,
            height: h,
        })
    }

    pub fn area(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }

    /// Clips `[x_min, y_min, x_max, y_max]` to `[0, width] x [0, height]`.
    pub fn clip(&self, bbox: [f64; 4]) -> [f64; 4] {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let [x_min, y_min, x_max, y_max] = bbox;
        [
            x_min.clamp(0.0, w),
            y_min.clamp(0.0, h),
            x_max.clamp(0.0, w),
            y_max.clamp(0.0, h),
        ]
    }
}

/// Canonical, validated detection.
///
/// Only the normalizer builds these. The box is clipped to the frame and every
/// derived field is recomputed from the clipped box, so the normalized values
/// stay within `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f64,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub normalized_center_x: f64,
    pub normalized_center_y: f64,
    pub normalized_area: f64,
}

impl Detection {
    pub(crate) fn from_raw(raw: &RawDetection, frame: ImageFrame) -> Self {
        let [x_min, y_min, x_max, y_max] = frame.clip([raw.x_min, raw.y_min, raw.x_max, raw.y_max]);
        let width = x_max - x_min;
        let height = y_max - y_min;
        let area = width * height;
        let center_x = (x_min + x_max) / 2.0;
        let center_y = (y_min + y_max) / 2.0;
        Self {
            class_name: raw.class_name.clone(),
            confidence: raw.confidence,
            x_min,
            y_min,
            x_max,
            y_max,
            center_x,
            center_y,
            width,
            height,
            area,
            normalized_center_x: center_x / f64::from(frame.width),
            normalized_center_y: center_y / f64::from(frame.height),
            normalized_area: area / frame.area(),
        }
    }
}
