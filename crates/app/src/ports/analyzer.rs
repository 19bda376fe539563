//! Analyzer port: the external anomaly-analysis collaborator.

use std::future::Future;

use owlhub_domain::alert::AnalysisVerdict;
use owlhub_domain::error::OwlHubError;
use owlhub_domain::telemetry::Telemetry;

/// Forwards one reading to the analysis collaborator and interprets its answer.
///
/// Implementations map an unreachable endpoint to
/// [`OwlHubError::AnalysisUnreachable`] and anything else that goes wrong
/// (bad status, malformed body) to [`OwlHubError::AnalysisProtocol`].
pub trait AnomalyAnalyzer: Send + Sync + 'static {
    /// Submit `reading` and wait for the verdict.
    fn analyze(
        &self,
        reading: Telemetry,
    ) -> impl Future<Output = Result<AnalysisVerdict, OwlHubError>> + Send;
}

impl<T: AnomalyAnalyzer> AnomalyAnalyzer for std::sync::Arc<T> {
    fn analyze(
        &self,
        reading: Telemetry,
    ) -> impl Future<Output = Result<AnalysisVerdict, OwlHubError>> + Send {
        (**self).analyze(reading)
    }
}
