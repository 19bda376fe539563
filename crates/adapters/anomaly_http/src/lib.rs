//! # owlhub-adapter-anomaly-http
//!
//! [`AnomalyAnalyzer`] backed by an HTTP service.
//!
//! Every reading is POSTed as JSON; the response
//! `{anomaly: bool, message: string, ...}` is interpreted by
//! [`AnalysisVerdict::from_value`]. A refused or failed connection maps to
//! [`OwlHubError::AnalysisUnreachable`]; a bad status or body maps to
//! [`OwlHubError::AnalysisProtocol`].
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `owlhub-app` and `owlhub-domain`.

mod config;
mod error;
mod payload;

pub use config::AnalysisConfig;
pub use error::AnalysisHttpError;
pub use payload::AnalysisPayload;

use owlhub_app::ports::AnomalyAnalyzer;
use owlhub_domain::alert::AnalysisVerdict;
use owlhub_domain::error::OwlHubError;
use owlhub_domain::telemetry::Telemetry;

/// Submits readings to the analysis service with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpAnomalyAnalyzer {
    client: reqwest::Client,
    url: String,
}

impl HttpAnomalyAnalyzer {
    /// Create an analyzer posting to `config.url`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisHttpError::Client`] if the HTTP client cannot be
    /// initialised.
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisHttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(AnalysisHttpError::Client)?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    async fn post(&self, reading: &Telemetry) -> Result<AnalysisVerdict, OwlHubError> {
        tracing::trace!(url = %self.url, "submitting reading for analysis");
        let response = self
            .client
            .post(&self.url)
            .json(&AnalysisPayload::from(reading))
            .send()
            .await
            .map_err(AnalysisHttpError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisHttpError::HttpStatus(status.as_u16()).into());
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(AnalysisHttpError::Decode)?;
        AnalysisVerdict::from_value(body)
    }
}

impl AnomalyAnalyzer for HttpAnomalyAnalyzer {
    async fn analyze(&self, reading: Telemetry) -> Result<AnalysisVerdict, OwlHubError> {
        self.post(&reading).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Json;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port and return the `/data` URL.
    async fn serve(router: axum::Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/data")
    }

    fn analyzer(url: String) -> HttpAnomalyAnalyzer {
        HttpAnomalyAnalyzer::new(&AnalysisConfig {
            url,
            ..AnalysisConfig::default()
        })
        .unwrap()
    }

    fn reading() -> Telemetry {
        Telemetry {
            temperature: Some(21.5),
            humidity: Some(72.0),
            motion: Some(true),
            gas_level: Some(800),
            alarm: None,
        }
    }

    #[tokio::test]
    async fn should_post_payload_and_parse_verdict() {
        let router = axum::Router::new().route(
            "/data",
            post(|Json(body): Json<serde_json::Value>| async move {
                let anomaly = body["gas"].as_i64().is_some_and(|gas| gas > 500);
                Json(serde_json::json!({
                    "status": "success",
                    "anomaly": anomaly,
                    "message": "High gas level",
                    "echo": body,
                }))
            }),
        );
        let url = serve(router).await;

        let verdict = analyzer(url).analyze(reading()).await.unwrap();

        assert!(verdict.anomaly);
        assert_eq!(verdict.message.as_deref(), Some("High gas level"));
        assert_eq!(verdict.details["echo"]["temp"], 21.5);
        assert_eq!(verdict.details["echo"]["motion"], 1);
    }

    #[tokio::test]
    async fn should_report_error_status_as_protocol_error() {
        let router = axum::Router::new().route(
            "/data",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = serve(router).await;

        let err = analyzer(url).analyze(reading()).await.unwrap_err();

        assert!(matches!(err, OwlHubError::AnalysisProtocol(_)));
    }

    #[tokio::test]
    async fn should_report_non_json_body_as_protocol_error() {
        let router = axum::Router::new().route("/data", post(|| async { "not json" }));
        let url = serve(router).await;

        let err = analyzer(url).analyze(reading()).await.unwrap_err();

        assert!(matches!(err, OwlHubError::AnalysisProtocol(_)));
    }

    #[tokio::test]
    async fn should_report_refused_connection_as_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = analyzer(format!("http://{addr}/data"))
            .analyze(reading())
            .await
            .unwrap_err();

        assert!(matches!(err, OwlHubError::AnalysisUnreachable));
    }
}
