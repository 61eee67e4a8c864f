//! Occupancy density, per-class counts and the categorical layout label.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ClassificationSettings, RecommendationSettings, StockSettings};
use crate::detect::{Detection, ImageFrame};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Label by share of detections in the target category.
    #[default]
    TargetCategory,
    /// Label by object count, then by covered area.
    Occupancy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    Empty,
    Sparse,
    Moderate,
    Dense,
    NoTarget,
    CategoryDominant,
    Mixed,
    General,
}

impl LayoutType {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutType::Empty => "empty",
            LayoutType::Sparse => "sparse",
            LayoutType::Moderate => "moderate",
            LayoutType::Dense => "dense",
            LayoutType::NoTarget => "no_target",
            LayoutType::CategoryDominant => "category_dominant",
            LayoutType::Mixed => "mixed",
            LayoutType::General => "general",
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Empty,
    VeryLow,
    Low,
    Moderate,
    WellStocked,
}

/// Unrounded occupancy figures for one detection set.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancySummary {
    pub total_objects: usize,
    pub class_distribution: BTreeMap<String, usize>,
    pub avg_confidence: f64,
    pub density: f64,
    pub target_objects: usize,
    pub target_ratio: f64,
    pub layout_type: LayoutType,
}

/// Summed box area over frame area. Overlaps are counted twice, so this can exceed 1.
pub fn density(detections: &[Detection], frame: ImageFrame) -> f64 {
    let covered: f64 = detections.iter().map(|d| d.area).sum();
    covered / frame.area()
}

pub fn average_confidence(detections: &[Detection]) -> f64 {
    if detections.is_empty() {
        return 0.0;
    }
    detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64
}

pub fn class_distribution(detections: &[Detection]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for det in detections {
        *counts.entry(det.class_name.clone()).or_insert(0) += 1;
    }
    counts
}

/// Case-insensitive substring match against the configured target terms.
pub fn is_target(class_name: &str, target_terms: &[String]) -> bool {
    let name = class_name.to_lowercase();
    target_terms
        .iter()
        .any(|term| name.contains(&term.to_lowercase()))
}

/// Total labelling function; see [`ClassificationPolicy`] for the branches.
///
/// Zero objects is always `Empty` and is decided before any ratio is taken.
/// Under `Occupancy` the count thresholds are consulted before density.
pub fn classify_layout(
    total: usize,
    targets: usize,
    density: f64,
    settings: &ClassificationSettings,
) -> LayoutType {
    if total == 0 {
        return LayoutType::Empty;
    }
    match settings.policy {
        ClassificationPolicy::TargetCategory => {
            if targets == 0 {
                return LayoutType::NoTarget;
            }
            let ratio = targets as f64 / total as f64;
            if ratio > settings.dominant_ratio {
                LayoutType::CategoryDominant
            } else if ratio > settings.mixed_ratio {
                LayoutType::Mixed
            } else {
                LayoutType::General
            }
        }
        ClassificationPolicy::Occupancy => {
            if total > settings.dense_min_count || density > settings.dense_density {
                LayoutType::Dense
            } else if total > settings.moderate_min_count || density > settings.moderate_density
            {
                LayoutType::Moderate
            } else {
                LayoutType::Sparse
            }
        }
    }
}

pub fn stock_level(total: usize, settings: &StockSettings) -> StockLevel {
    if total == 0 {
        StockLevel::Empty
    } else if total < settings.very_low_below {
        StockLevel::VeryLow
    } else if total < settings.low_below {
        StockLevel::Low
    } else if total < settings.moderate_below {
        StockLevel::Moderate
    } else {
        StockLevel::WellStocked
    }
}

/// Restocking advice from the object count alone.
///
/// Always ends with one space-utilization line; an empty or thin shelf gets a
/// more specific line before it.
pub fn recommendations(total: usize, settings: &RecommendationSettings) -> Vec<String> {
    let mut out = Vec::new();
    if total == 0 {
        out.push("Shelf appears empty - consider restocking".to_string());
    } else if total < settings.low_density_below {
        out.push("Low product density - opportunity to add more products".to_string());
    }
    if total > settings.good_density_above {
        out.push("Good product density - maintain current stock levels".to_string());
    } else {
        out.push("Consider adding more products to optimize space utilization".to_string());
    }
    out
}

pub fn summarize(
    detections: &[Detection],
    frame: ImageFrame,
    settings: &ClassificationSettings,
) -> OccupancySummary {
    let total = detections.len();
    let targets = detections
        .iter()
        .filter(|d| is_target(&d.class_name, &settings.target_terms))
        .count();
    let target_ratio = if total == 0 {
        0.0
    } else {
        targets as f64 / total as f64
    };
    let density = density(detections, frame);
    OccupancySummary {
        total_objects: total,
        class_distribution: class_distribution(detections),
        avg_confidence: average_confidence(detections),
        density,
        target_objects: targets,
        target_ratio,
        layout_type: classify_layout(total, targets, density, settings),
    }
}
