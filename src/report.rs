//! Aggregation of every stage into one [`AnalysisReport`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, StatisticsSettings};
use crate::detect::{Detection, ImageFrame, NormalizedBatch};
use crate::layout::{
    analyze_organization, assign_positions, classify, cluster_detections, Axis, LayoutType,
    PositioningDetail, ShelfOrganization, StockLevel,
};

/// Detections removed before analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub malformed: usize,
    pub low_confidence: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeStats {
    pub average_area: f64,
    pub average_width: f64,
    pub average_height: f64,
    pub largest_object: f64,
    pub smallest_object: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionStatistics {
    pub confidence_stats: ConfidenceStats,
    pub size_stats: SizeStats,
}

/// Structured result of one analysis. Built fresh per call, never mutated after.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_objects: usize,
    pub dropped: DropCounts,
    pub image_dimensions: ImageFrame,
    pub class_distribution: BTreeMap<String, usize>,
    pub avg_confidence: f64,
    pub density: f64,
    pub estimated_rows: usize,
    pub estimated_columns: usize,
    pub layout_type: LayoutType,
    pub target_objects: usize,
    pub target_ratio: f64,
    pub stock_level: StockLevel,
    pub shelf_organization: ShelfOrganization,
    pub detection_summary: String,
    pub recommendations: Vec<String>,
    pub statistics: Option<DetectionStatistics>,
    pub positioning_details: Vec<PositioningDetail>,
    /// Hex SHA-256 of the request and config; equal inputs give equal reports.
    pub fingerprint: String,
}

pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Confidence and size statistics; `None` when nothing survived normalization.
pub fn detection_statistics(
    detections: &[Detection],
    settings: &StatisticsSettings,
    precision: u32,
) -> Option<DetectionStatistics> {
    if detections.is_empty() {
        return None;
    }
    let n = detections.len() as f64;
    let confidences = detections.iter().map(|d| d.confidence);
    let areas = detections.iter().map(|d| d.area);

    let high = detections
        .iter()
        .filter(|d| d.confidence > settings.high_confidence)
        .count();
    let low = detections
        .iter()
        .filter(|d| d.confidence < settings.low_confidence)
        .count();

    let confidence_stats = ConfidenceStats {
        average: round_to(confidences.clone().sum::<f64>() / n, precision),
        max: round_to(confidences.clone().fold(f64::MIN, f64::max), precision),
        min: round_to(confidences.fold(f64::MAX, f64::min), precision),
        high_confidence: high,
        medium_confidence: detections.len() - high - low,
        low_confidence: low,
    };
    let size_stats = SizeStats {
        average_area: round_to(areas.clone().sum::<f64>() / n, 2),
        average_width: round_to(detections.iter().map(|d| d.width).sum::<f64>() / n, 2),
        average_height: round_to(detections.iter().map(|d| d.height).sum::<f64>() / n, 2),
        largest_object: areas.clone().fold(f64::MIN, f64::max),
        smallest_object: areas.fold(f64::MAX, f64::min),
    };
    Some(DetectionStatistics {
        confidence_stats,
        size_stats,
    })
}

/// Runs clustering, assignment and classification over a normalized batch.
///
/// Only surviving detections feed any figure or text; an empty batch yields a
/// well-formed `empty` report.
pub fn build_report(
    batch: &NormalizedBatch,
    config: &AnalysisConfig,
    fingerprint: String,
) -> AnalysisReport {
    let detections = &batch.detections;
    let frame = batch.frame;
    let precision = config.rounding.precision;

    let estimated_rows = cluster_detections(detections, Axis::Row, config.rows.policy()).count();
    let estimated_columns =
        cluster_detections(detections, Axis::Column, config.columns.policy()).count();
    let summary = classify::summarize(detections, frame, &config.classification);
    let shelf_organization = analyze_organization(
        detections,
        frame,
        config.assignment.shelf_bands,
        &config.organization,
    );
    let positioning_details = assign_positions(detections, frame, &config.assignment);

    AnalysisReport {
        total_objects: summary.total_objects,
        dropped: DropCounts {
            malformed: batch.malformed_count(),
            low_confidence: batch.low_confidence_count(),
        },
        image_dimensions: frame,
        class_distribution: summary.class_distribution,
        avg_confidence: round_to(summary.avg_confidence, precision),
        density: round_to(summary.density, precision),
        estimated_rows,
        estimated_columns,
        layout_type: summary.layout_type,
        target_objects: summary.target_objects,
        target_ratio: round_to(summary.target_ratio, config.rounding.ratio_precision),
        stock_level: classify::stock_level(summary.total_objects, &config.stock),
        shelf_organization,
        detection_summary: format!(
            "Found {} objects ({} target-related)",
            summary.total_objects, summary.target_objects
        ),
        recommendations: classify::recommendations(
            summary.total_objects,
            &config.recommendations,
        ),
        statistics: detection_statistics(detections, &config.statistics, precision),
        positioning_details,
        fingerprint,
    }
}
