use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::AnalysisError;
use crate::layout::{ClassificationPolicy, ColumnLabeling, ThresholdPolicy};

const DEFAULT_ROW_GAP_FRACTION: f64 = 0.10;
const DEFAULT_COLUMN_GAP_FRACTION: f64 = 0.15;
const DEFAULT_SHELF_BANDS: u32 = 3;
const DEFAULT_MIN_CONFIDENCE: f64 = 0.0;
const DEFAULT_TARGET_TERMS: [&str; 6] = ["bottle", "can", "cup", "glass", "drink", "container"];
const DEFAULT_DOMINANT_RATIO: f64 = 0.7;
const DEFAULT_MIXED_RATIO: f64 = 0.3;
const DEFAULT_DENSE_MIN_COUNT: usize = 20;
const DEFAULT_MODERATE_MIN_COUNT: usize = 10;
const DEFAULT_DENSE_DENSITY: f64 = 0.5;
const DEFAULT_MODERATE_DENSITY: f64 = 0.2;
const DEFAULT_HIGH_CONFIDENCE: f64 = 0.7;
const DEFAULT_LOW_CONFIDENCE: f64 = 0.3;
const DEFAULT_CONCENTRATED_PERCENT: f64 = 60.0;
const DEFAULT_EVEN_SPREAD_PERCENT: f64 = 20.0;
const DEFAULT_VERY_LOW_STOCK_BELOW: usize = 5;
const DEFAULT_LOW_STOCK_BELOW: usize = 15;
const DEFAULT_MODERATE_STOCK_BELOW: usize = 30;
const DEFAULT_LOW_DENSITY_BELOW: usize = 10;
const DEFAULT_GOOD_DENSITY_ABOVE: usize = 20;
const DEFAULT_PRECISION: u32 = 4;
const DEFAULT_RATIO_PRECISION: u32 = 3;
const MAX_PRECISION: u32 = 12;
const MAX_SHELF_BANDS: u32 = 64;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SHELF_CONFIG";

#[derive(Debug, Deserialize, Default)]
struct AnalysisConfigFile {
    rows: Option<AxisConfigFile>,
    columns: Option<AxisConfigFile>,
    assignment: Option<AssignmentConfigFile>,
    normalization: Option<NormalizationConfigFile>,
    classification: Option<ClassificationConfigFile>,
    statistics: Option<StatisticsConfigFile>,
    organization: Option<OrganizationConfigFile>,
    stock: Option<StockConfigFile>,
    recommendations: Option<RecommendationConfigFile>,
    rounding: Option<RoundingConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct AxisConfigFile {
    strategy: Option<ThresholdStrategy>,
    gap_fraction: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct AssignmentConfigFile {
    shelf_bands: Option<u32>,
    column_labels: Option<ColumnLabeling>,
}

#[derive(Debug, Deserialize, Default)]
struct NormalizationConfigFile {
    min_confidence: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassificationConfigFile {
    policy: Option<ClassificationPolicy>,
    target_terms: Option<Vec<String>>,
    dominant_ratio: Option<f64>,
    mixed_ratio: Option<f64>,
    dense_min_count: Option<usize>,
    moderate_min_count: Option<usize>,
    dense_density: Option<f64>,
    moderate_density: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct StatisticsConfigFile {
    high_confidence: Option<f64>,
    low_confidence: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OrganizationConfigFile {
    concentrated_percent: Option<f64>,
    even_spread_percent: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct StockConfigFile {
    very_low_below: Option<usize>,
    low_below: Option<usize>,
    moderate_below: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct RecommendationConfigFile {
    low_density_below: Option<usize>,
    good_density_above: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct RoundingConfigFile {
    precision: Option<u32>,
    ratio_precision: Option<u32>,
}

/// Every tunable threshold of an analysis, in one place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub rows: AxisSettings,
    pub columns: AxisSettings,
    pub assignment: AssignmentSettings,
    pub normalization: NormalizationSettings,
    pub classification: ClassificationSettings,
    pub statistics: StatisticsSettings,
    pub organization: OrganizationSettings,
    pub stock: StockSettings,
    pub recommendations: RecommendationSettings,
    pub rounding: RoundingSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStrategy {
    Fixed,
    Statistical,
}

impl FromStr for ThresholdStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(ThresholdStrategy::Fixed),
            "statistical" => Ok(ThresholdStrategy::Statistical),
            other => Err(anyhow!(
                "unknown threshold strategy '{}' (expected fixed or statistical)",
                other
            )),
        }
    }
}

/// Clustering settings for one axis. `gap_fraction` only applies to `Fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisSettings {
    pub strategy: ThresholdStrategy,
    pub gap_fraction: f64,
}

impl AxisSettings {
    pub fn policy(&self) -> ThresholdPolicy {
        match self.strategy {
            ThresholdStrategy::Fixed => ThresholdPolicy::fixed(self.gap_fraction),
            ThresholdStrategy::Statistical => ThresholdPolicy::Statistical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssignmentSettings {
    pub shelf_bands: u32,
    pub column_labels: ColumnLabeling,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizationSettings {
    pub min_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSettings {
    pub policy: ClassificationPolicy,
    pub target_terms: Vec<String>,
    pub dominant_ratio: f64,
    pub mixed_ratio: f64,
    pub dense_min_count: usize,
    pub moderate_min_count: usize,
    pub dense_density: f64,
    pub moderate_density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsSettings {
    pub high_confidence: f64,
    pub low_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrganizationSettings {
    pub concentrated_percent: f64,
    pub even_spread_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StockSettings {
    pub very_low_below: usize,
    pub low_below: usize,
    pub moderate_below: usize,
}

/// Object-count cut points for the restocking advice in a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendationSettings {
    pub low_density_below: usize,
    pub good_density_above: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundingSettings {
    pub precision: u32,
    pub ratio_precision: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::from_file(AnalysisConfigFile::default())
    }
}

impl AnalysisConfig {
    /// Loads from `SHELF_CONFIG` (if set), applies env overrides, validates.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Same as [`AnalysisConfig::load`] with an explicit file path.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => AnalysisConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AnalysisConfigFile) -> Self {
        let rows = axis_settings(file.rows, DEFAULT_ROW_GAP_FRACTION);
        let columns = axis_settings(file.columns, DEFAULT_COLUMN_GAP_FRACTION);
        let assignment = AssignmentSettings {
            shelf_bands: file
                .assignment
                .as_ref()
                .and_then(|a| a.shelf_bands)
                .unwrap_or(DEFAULT_SHELF_BANDS),
            column_labels: file
                .assignment
                .as_ref()
                .and_then(|a| a.column_labels)
                .unwrap_or_default(),
        };
        let normalization = NormalizationSettings {
            min_confidence: file
                .normalization
                .and_then(|n| n.min_confidence)
                .unwrap_or(DEFAULT_MIN_CONFIDENCE),
        };

        let cls = file.classification.unwrap_or_default();
        let classification = ClassificationSettings {
            policy: cls.policy.unwrap_or_default(),
            target_terms: cls.target_terms.unwrap_or_else(|| {
                DEFAULT_TARGET_TERMS.iter().map(|t| t.to_string()).collect()
            }),
            dominant_ratio: cls.dominant_ratio.unwrap_or(DEFAULT_DOMINANT_RATIO),
            mixed_ratio: cls.mixed_ratio.unwrap_or(DEFAULT_MIXED_RATIO),
            dense_min_count: cls.dense_min_count.unwrap_or(DEFAULT_DENSE_MIN_COUNT),
            moderate_min_count: cls.moderate_min_count.unwrap_or(DEFAULT_MODERATE_MIN_COUNT),
            dense_density: cls.dense_density.unwrap_or(DEFAULT_DENSE_DENSITY),
            moderate_density: cls.moderate_density.unwrap_or(DEFAULT_MODERATE_DENSITY),
        };

        let stats = file.statistics.unwrap_or_default();
        let statistics = StatisticsSettings {
            high_confidence: stats.high_confidence.unwrap_or(DEFAULT_HIGH_CONFIDENCE),
            low_confidence: stats.low_confidence.unwrap_or(DEFAULT_LOW_CONFIDENCE),
        };

        let org = file.organization.unwrap_or_default();
        let organization = OrganizationSettings {
            concentrated_percent: org
                .concentrated_percent
                .unwrap_or(DEFAULT_CONCENTRATED_PERCENT),
            even_spread_percent: org
                .even_spread_percent
                .unwrap_or(DEFAULT_EVEN_SPREAD_PERCENT),
        };

        let stock_file = file.stock.unwrap_or_default();
        let stock = StockSettings {
            very_low_below: stock_file
                .very_low_below
                .unwrap_or(DEFAULT_VERY_LOW_STOCK_BELOW),
            low_below: stock_file.low_below.unwrap_or(DEFAULT_LOW_STOCK_BELOW),
            moderate_below: stock_file
                .moderate_below
                .unwrap_or(DEFAULT_MODERATE_STOCK_BELOW),
        };

        let rec = file.recommendations.unwrap_or_default();
        let recommendations = RecommendationSettings {
            low_density_below: rec.low_density_below.unwrap_or(DEFAULT_LOW_DENSITY_BELOW),
            good_density_above: rec.good_density_above.unwrap_or(DEFAULT_GOOD_DENSITY_ABOVE),
        };

        let rounding_file = file.rounding.unwrap_or_default();
        let rounding = RoundingSettings {
            precision: rounding_file.precision.unwrap_or(DEFAULT_PRECISION),
            ratio_precision: rounding_file
                .ratio_precision
                .unwrap_or(DEFAULT_RATIO_PRECISION),
        };

        Self {
            rows,
            columns,
            assignment,
            normalization,
            classification,
            statistics,
            organization,
            stock,
            recommendations,
            rounding,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(strategy) = env_parse::<ThresholdStrategy>("SHELF_ROW_STRATEGY")? {
            self.rows.strategy = strategy;
        }
        if let Some(fraction) = env_parse::<f64>("SHELF_ROW_GAP_FRACTION")? {
            self.rows.gap_fraction = fraction;
        }
        if let Some(strategy) = env_parse::<ThresholdStrategy>("SHELF_COLUMN_STRATEGY")? {
            self.columns.strategy = strategy;
        }
        if let Some(fraction) = env_parse::<f64>("SHELF_COLUMN_GAP_FRACTION")? {
            self.columns.gap_fraction = fraction;
        }
        if let Some(bands) = env_parse::<u32>("SHELF_BANDS")? {
            self.assignment.shelf_bands = bands;
        }
        if let Some(min_confidence) = env_parse::<f64>("SHELF_MIN_CONFIDENCE")? {
            self.normalization.min_confidence = min_confidence;
        }
        if let Ok(terms) = std::env::var("SHELF_TARGET_TERMS") {
            let parsed = split_csv(&terms);
            if !parsed.is_empty() {
                self.classification.target_terms = parsed;
            }
        }
        Ok(())
    }

    /// Rejects threshold combinations that would make the labels meaningless.
    pub fn validate(&self) -> std::result::Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfig(msg));

        for (axis, settings) in [("rows", &self.rows), ("columns", &self.columns)] {
            if !settings.gap_fraction.is_finite() || settings.gap_fraction < 0.0 {
                return invalid(format!(
                    "{}.gap_fraction must be a finite non-negative number, got {}",
                    axis, settings.gap_fraction
                ));
            }
        }
        if !(1..=MAX_SHELF_BANDS).contains(&self.assignment.shelf_bands) {
            return invalid(format!(
                "assignment.shelf_bands must be within [1, {}], got {}",
                MAX_SHELF_BANDS, self.assignment.shelf_bands
            ));
        }

        let unit_fields = [
            ("normalization.min_confidence", self.normalization.min_confidence),
            ("classification.dominant_ratio", self.classification.dominant_ratio),
            ("classification.mixed_ratio", self.classification.mixed_ratio),
            ("statistics.high_confidence", self.statistics.high_confidence),
            ("statistics.low_confidence", self.statistics.low_confidence),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [0, 1], got {}", name, value));
            }
        }

        let cls = &self.classification;
        if cls.mixed_ratio > cls.dominant_ratio {
            return invalid("classification.mixed_ratio exceeds dominant_ratio".to_string());
        }
        if cls.moderate_min_count > cls.dense_min_count {
            return invalid("classification.moderate_min_count exceeds dense_min_count".to_string());
        }
        if !cls.dense_density.is_finite()
            || !cls.moderate_density.is_finite()
            || cls.moderate_density < 0.0
            || cls.moderate_density > cls.dense_density
        {
            return invalid(
                "classification densities must be finite with 0 <= moderate <= dense".to_string(),
            );
        }
        if self.statistics.low_confidence > self.statistics.high_confidence {
            return invalid("statistics.low_confidence exceeds high_confidence".to_string());
        }

        let org = &self.organization;
        for (name, value) in [
            ("organization.concentrated_percent", org.concentrated_percent),
            ("organization.even_spread_percent", org.even_spread_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return invalid(format!("{} must be within [0, 100], got {}", name, value));
            }
        }

        let stock = &self.stock;
        if stock.very_low_below > stock.low_below || stock.low_below > stock.moderate_below {
            return invalid(
                "stock thresholds must satisfy very_low_below <= low_below <= moderate_below"
                    .to_string(),
            );
        }

        let rec = &self.recommendations;
        if rec.low_density_below > rec.good_density_above {
            return invalid(
                "recommendations.low_density_below exceeds good_density_above".to_string(),
            );
        }

        if self.rounding.precision > MAX_PRECISION || self.rounding.ratio_precision > MAX_PRECISION
        {
            return invalid(format!(
                "rounding precision must not exceed {} decimal places",
                MAX_PRECISION
            ));
        }
        Ok(())
    }
}

fn axis_settings(file: Option<AxisConfigFile>, default_fraction: f64) -> AxisSettings {
    let file = file.unwrap_or_default();
    AxisSettings {
        strategy: file.strategy.unwrap_or(ThresholdStrategy::Fixed),
        gap_fraction: file.gap_fraction.unwrap_or(default_fraction),
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value: {}", key, raw)),
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<AnalysisConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
