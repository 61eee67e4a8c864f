use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::detect::AnalysisRequest;
use crate::error::AnalysisError;
use crate::report::AnalysisReport;

/// Analyzes independent requests in parallel.
///
/// Results come back in input order. One invalid frame fails only its own slot.
pub fn analyze_batch(
    requests: &[AnalysisRequest],
    config: &AnalysisConfig,
) -> Vec<Result<AnalysisReport, AnalysisError>> {
    requests
        .par_iter()
        .map(|request| crate::analyze(request, config))
        .collect()
}
