//! Gap-based 1-D clustering used to estimate shelf row and column counts.
//!
//! Values are sorted, consecutive gaps are measured, and a new cluster starts at
//! every gap the [`ThresholdPolicy`] deems significant. Inputs are normalized
//! coordinates, so thresholds are fractions of the frame extent.

use serde::{Deserialize, Serialize};

use crate::detect::Detection;

/// How a gap between neighbouring values is judged significant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Gap must exceed a fixed fraction of the frame extent.
    Fixed { gap_fraction: f64 },
    /// Gap must exceed `mean(gaps) + stddev(gaps)` (population deviation).
    Statistical,
}

impl ThresholdPolicy {
    pub fn fixed(gap_fraction: f64) -> Self {
        ThresholdPolicy::Fixed { gap_fraction }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThresholdPolicy::Fixed { .. } => "fixed",
            ThresholdPolicy::Statistical => "statistical",
        }
    }

    fn threshold(&self, gaps: &[f64]) -> f64 {
        match *self {
            ThresholdPolicy::Fixed { gap_fraction } => gap_fraction,
            ThresholdPolicy::Statistical => {
                if gaps.is_empty() {
                    return 0.0;
                }
                let n = gaps.len() as f64;
                let mean = gaps.iter().sum::<f64>() / n;
                let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;
                mean + variance.sqrt()
            }
        }
    }
}

/// Which coordinate of a detection to cluster on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Normalized `center_y`; clusters are shelf rows.
    Row,
    /// Normalized `center_x`; clusters are columns.
    Column,
}

/// Contiguous run of values along one axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisCluster {
    /// Indices into the clustered slice, in ascending value order.
    pub members: Vec<usize>,
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisClusterResult {
    pub clusters: Vec<AxisCluster>,
}

impl AxisClusterResult {
    pub fn count(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Clusters scalar values. Input order does not affect the result.
pub fn cluster_axis(values: &[f64], policy: ThresholdPolicy) -> AxisClusterResult {
    if values.is_empty() {
        return AxisClusterResult::default();
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

    let gaps: Vec<f64> = order
        .windows(2)
        .map(|pair| values[pair[1]] - values[pair[0]])
        .collect();
    let threshold = policy.threshold(&gaps);

    let first = order[0];
    let mut clusters = Vec::new();
    let mut current = AxisCluster {
        members: vec![first],
        start: values[first],
        end: values[first],
    };
    for (gap, &idx) in gaps.iter().zip(order.iter().skip(1)) {
        // Zero gaps never split, whatever the threshold.
        if *gap > 0.0 && *gap > threshold {
            clusters.push(current);
            current = AxisCluster {
                members: Vec::new(),
                start: values[idx],
                end: values[idx],
            };
        }
        current.members.push(idx);
        current.end = values[idx];
    }
    clusters.push(current);

    log::debug!(
        "{} clustering: {} values, threshold {:.4}, {} clusters",
        policy.name(),
        values.len(),
        threshold,
        clusters.len()
    );

    AxisClusterResult { clusters }
}

/// Clusters detections along one axis; member indices refer to `detections`.
pub fn cluster_detections(
    detections: &[Detection],
    axis: Axis,
    policy: ThresholdPolicy,
) -> AxisClusterResult {
    let values: Vec<f64> = detections
        .iter()
        .map(|d| match axis {
            Axis::Row => d.normalized_center_y,
            Axis::Column => d.normalized_center_x,
        })
        .collect();
    cluster_axis(&values, policy)
}
