use sha2::{Digest, Sha256};

use crate::config::AnalysisConfig;
use crate::detect::AnalysisRequest;
use crate::error::AnalysisError;

/// Hex SHA-256 over the frame, the raw detections in input order, and the
/// config's JSON form.
///
/// Suitable as a memoization key: the analysis is a pure function of exactly
/// these inputs.
pub fn request_fingerprint(
    request: &AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<String, AnalysisError> {
    let config_json = serde_json::to_vec(config)
        .map_err(|e| AnalysisError::InvalidConfig(format!("unserializable config: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(request.image_width.to_le_bytes());
    hasher.update(request.image_height.to_le_bytes());
    hasher.update((request.detections.len() as u64).to_le_bytes());
    for det in &request.detections {
        hasher.update((det.class_name.len() as u64).to_le_bytes());
        hasher.update(det.class_name.as_bytes());
        for value in [det.confidence, det.x_min, det.y_min, det.x_max, det.y_max] {
            hasher.update(value.to_bits().to_le_bytes());
        }
    }
    hasher.update((config_json.len() as u64).to_le_bytes());
    hasher.update(&config_json);
    Ok(hex::encode(hasher.finalize()))
}
