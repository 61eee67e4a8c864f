//! Per-detection shelf row and column labels from fixed fractional bands.
//!
//! This is deliberately independent of [`super::cluster`]: cluster counts
//! summarise the display, bands give every object a stable label.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AssignmentSettings;
use crate::detect::{Detection, ImageFrame};

/// The frame width is always split into thirds.
pub const COLUMN_BANDS: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLabeling {
    /// `left` / `center` / `right`.
    #[default]
    Named,
    /// `1` / `2` / `3`, left to right.
    Numeric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSide {
    Left,
    Center,
    Right,
}

impl ColumnSide {
    fn from_bucket(bucket: u32) -> Self {
        match bucket {
            1 => ColumnSide::Left,
            2 => ColumnSide::Center,
            _ => ColumnSide::Right,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnSide::Left => "left",
            ColumnSide::Center => "center",
            ColumnSide::Right => "right",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLabel {
    Side(ColumnSide),
    Bucket(u32),
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLabel::Side(side) => f.write_str(side.as_str()),
            ColumnLabel::Bucket(n) => write!(f, "{}", n),
        }
    }
}

/// Row/column assignment for one surviving detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositioningDetail {
    /// Position in the normalized detection list.
    pub index: usize,
    pub class_name: String,
    pub confidence: f64,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    /// 1-based shelf row, top to bottom.
    pub row: u32,
    pub column: ColumnLabel,
    pub description: String,
}

/// 1-based band holding `value` when `extent` is split into `bands` equal parts.
///
/// Values outside the frame are clamped into the first or last band.
pub fn band_index(value: f64, extent: u32, bands: u32) -> u32 {
    let bands = bands.max(1);
    let band_size = f64::from(extent) / f64::from(bands);
    let band = (value / band_size).floor().max(0.0);
    // Float-to-int casts saturate; NaN maps to 0.
    (band as u32).saturating_add(1).min(bands)
}

/// Assigns every detection a shelf row and column. Nothing is dropped here.
pub fn assign_positions(
    detections: &[Detection],
    frame: ImageFrame,
    settings: &AssignmentSettings,
) -> Vec<PositioningDetail> {
    detections
        .iter()
        .enumerate()
        .map(|(index, det)| {
            let row = band_index(det.center_y, frame.height, settings.shelf_bands);
            let bucket = band_index(det.center_x, frame.width, COLUMN_BANDS);
            let (column, description) = match settings.column_labels {
                ColumnLabeling::Named => {
                    let side = ColumnSide::from_bucket(bucket);
                    (
                        ColumnLabel::Side(side),
                        format!(
                            "{} on shelf {}, {} side",
                            det.class_name,
                            row,
                            side.as_str()
                        ),
                    )
                }
                ColumnLabeling::Numeric => (
                    ColumnLabel::Bucket(bucket),
                    format!("{} on shelf {}, column {}", det.class_name, row, bucket),
                ),
            };
            PositioningDetail {
                index,
                class_name: det.class_name.clone(),
                confidence: det.confidence,
                x_min: det.x_min,
                y_min: det.y_min,
                x_max: det.x_max,
                y_max: det.y_max,
                row,
                column,
                description,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::RawDetection;

    const FRAME: ImageFrame = ImageFrame {
        width: 600,
        height: 300,
    };

    fn det(name: &str, cx: f64, cy: f64) -> Detection {
        let raw = RawDetection::new(name, 0.8, [cx - 5.0, cy - 5.0, cx + 5.0, cy + 5.0]);
        Detection::from_raw(&raw, FRAME)
    }

    #[test]
    fn band_index_clamps_to_range() {
        assert_eq!(band_index(0.0, 300, 3), 1);
        assert_eq!(band_index(99.9, 300, 3), 1);
        assert_eq!(band_index(100.0, 300, 3), 2);
        assert_eq!(band_index(299.0, 300, 3), 3);
        assert_eq!(band_index(300.0, 300, 3), 3);
        assert_eq!(band_index(-20.0, 300, 3), 1);
        assert_eq!(band_index(1e9, 300, 3), 3);
    }

    #[test]
    fn named_columns_and_descriptions() {
        let dets = vec![det("bottle", 50.0, 50.0), det("can", 300.0, 150.0), det("cup", 590.0, 290.0)];
        let settings = AssignmentSettings {
            shelf_bands: 3,
            column_labels: ColumnLabeling::Named,
        };
        let details = assign_positions(&dets, FRAME, &settings);
        assert_eq!(details.len(), 3);
        assert_eq!(details[0].row, 1);
        assert_eq!(details[0].column, ColumnLabel::Side(ColumnSide::Left));
        assert_eq!(details[0].description, "bottle on shelf 1, left side");
        assert_eq!(details[1].description, "can on shelf 2, center side");
        assert_eq!(details[2].description, "cup on shelf 3, right side");
        assert_eq!(details[2].index, 2);
    }

    #[test]
    fn numeric_columns_and_custom_band_count() {
        let dets = vec![det("bottle", 590.0, 260.0)];
        let settings = AssignmentSettings {
            shelf_bands: 5,
            column_labels: ColumnLabeling::Numeric,
        };
        let details = assign_positions(&dets, FRAME, &settings);
        assert_eq!(details[0].row, 5);
        assert_eq!(details[0].column, ColumnLabel::Bucket(3));
        assert_eq!(details[0].description, "bottle on shelf 5, column 3");
    }

    #[test]
    fn column_label_serializes_by_mode() -> anyhow::Result<()> {
        assert_eq!(
            serde_json::to_string(&ColumnLabel::Side(ColumnSide::Center))?,
            r#""center""#
        );
        assert_eq!(serde_json::to_string(&ColumnLabel::Bucket(2))?, "2");
        Ok(())
    }
}
