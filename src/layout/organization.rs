use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::OrganizationSettings;
use crate::detect::{Detection, ImageFrame};
use crate::layout::assign::band_index;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfCount {
    /// 1-based band, top to bottom.
    pub row: u32,
    pub label: String,
    pub count: usize,
    /// Distinct class names on this shelf, sorted.
    pub classes: Vec<String>,
}

/// Objects per shelf band plus a one-line reading of the distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfOrganization {
    pub shelves: Vec<ShelfCount>,
    pub narrative: String,
}

fn band_label(row: u32, bands: u32) -> String {
    match (bands, row) {
        (3, 1) => "top".to_string(),
        (3, 2) => "middle".to_string(),
        (3, _) => "bottom".to_string(),
        (2, 1) => "top".to_string(),
        (2, _) => "bottom".to_string(),
        _ => format!("shelf {}", row),
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Counts detections per band (same bands as row assignment) and describes the spread.
pub fn analyze_organization(
    detections: &[Detection],
    frame: ImageFrame,
    bands: u32,
    settings: &OrganizationSettings,
) -> ShelfOrganization {
    let bands = bands.max(1);
    let mut counts = vec![0usize; bands as usize];
    let mut classes = vec![BTreeSet::new(); bands as usize];
    for det in detections {
        let slot = (band_index(det.center_y, frame.height, bands) - 1) as usize;
        counts[slot] += 1;
        classes[slot].insert(det.class_name.as_str());
    }
    let shelves: Vec<ShelfCount> = (1..=bands)
        .zip(counts.into_iter().zip(classes))
        .map(|(row, (count, names))| ShelfCount {
            row,
            label: band_label(row, bands),
            count,
            classes: names.into_iter().map(str::to_string).collect(),
        })
        .collect();

    let narrative = describe(&shelves, detections.len(), bands, settings);
    ShelfOrganization { shelves, narrative }
}

fn describe(
    shelves: &[ShelfCount],
    total: usize,
    bands: u32,
    settings: &OrganizationSettings,
) -> String {
    if total == 0 {
        return "No objects to analyze".to_string();
    }

    // First band wins ties, reading top to bottom.
    let mut busiest = &shelves[0];
    for shelf in &shelves[1..] {
        if shelf.count > busiest.count {
            busiest = shelf;
        }
    }

    let percents: Vec<f64> = shelves
        .iter()
        .map(|s| s.count as f64 / total as f64 * 100.0)
        .collect();
    let max_percent = percents.iter().copied().fold(0.0, f64::max);

    if max_percent > settings.concentrated_percent {
        let place = if matches!(bands, 2 | 3) {
            format!("{} shelf", busiest.label)
        } else {
            busiest.label.clone()
        };
        return format!("Concentrated on {} ({} items)", place, busiest.count);
    }

    let even = percents
        .windows(2)
        .all(|pair| (pair[0] - pair[1]).abs() < settings.even_spread_percent);
    if even {
        return "Evenly distributed across shelves".to_string();
    }

    let parts: Vec<String> = shelves
        .iter()
        .map(|s| format!("{} {}", capitalize(&s.label), s.count))
        .collect();
    format!("Uneven distribution: {}", parts.join(", "))
}
