//! Geometric shelf inference over normalized detections.
//!
//! - `cluster`: gap-based row/column count estimation
//! - `assign`: per-object shelf row and column bands
//! - `classify`: density, class counts, layout label, stock level
//! - `organization`: per-shelf counts and their narrative

pub mod assign;
pub mod classify;
pub mod cluster;
pub mod organization;

pub use assign::{
    assign_positions, ColumnLabel, ColumnLabeling, ColumnSide, PositioningDetail, COLUMN_BANDS,
};
pub use classify::{ClassificationPolicy, LayoutType, OccupancySummary, StockLevel};
pub use cluster::{cluster_axis, cluster_detections, Axis, AxisCluster, AxisClusterResult, ThresholdPolicy};
pub use organization::{analyze_organization, ShelfCount, ShelfOrganization};
