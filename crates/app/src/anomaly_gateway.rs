//! Anomaly gateway: fire-and-forget analysis of every calibrated reading.
//!
//! [`AnomalyGateway::submit`] spawns a detached task per reading and returns
//! immediately. Each task sends its outcome back over an unbounded channel to
//! a single router task, which:
//!
//! - publishes an [`Event::AnomalyAlert`] for every positive verdict,
//! - owns the one expiry timer, re-armed (not stacked) by each new alert,
//!   and publishes [`Event::AlertCleared`] when it fires; an alert superseded
//!   before its timer fires is cleared when its successor arrives,
//! - ignores an unreachable collaborator and logs any other failure.
//!
//! Nothing from the analysis side ever flows back into the ingestion loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use owlhub_domain::alert::{ALERT_TTL, AnalysisVerdict, AnomalyAlert};
use owlhub_domain::error::OwlHubError;
use owlhub_domain::event::Event;
use owlhub_domain::id::AlertId;
use owlhub_domain::telemetry::Telemetry;
use owlhub_domain::time;

use crate::ports::{AnomalyAnalyzer, EventPublisher};

type Outcome = Result<AnalysisVerdict, OwlHubError>;

/// Non-blocking bridge between the ingestion loop and the analysis collaborator.
pub struct AnomalyGateway<A> {
    analyzer: Arc<A>,
    outcomes: mpsc::UnboundedSender<Outcome>,
}

impl<A: AnomalyAnalyzer> AnomalyGateway<A> {
    /// Create the gateway and spawn its alert router.
    ///
    /// Alerts are cleared `alert_ttl` after publication. Must be called from
    /// within a tokio runtime.
    pub fn spawn<P>(analyzer: A, publisher: P, alert_ttl: Duration) -> (Self, JoinHandle<()>)
    where
        P: EventPublisher + Send + 'static,
    {
        let (outcomes, rx) = mpsc::unbounded_channel();
        let router = tokio::spawn(route_outcomes(rx, publisher, alert_ttl));
        let gateway = Self {
            analyzer: Arc::new(analyzer),
            outcomes,
        };
        (gateway, router)
    }

    /// Create the gateway with the default alert lifetime.
    pub fn with_default_ttl<P>(analyzer: A, publisher: P) -> (Self, JoinHandle<()>)
    where
        P: EventPublisher + Send + 'static,
    {
        Self::spawn(analyzer, publisher, ALERT_TTL)
    }

    /// Forward `reading` to the collaborator without waiting for the answer.
    pub fn submit(&self, reading: Telemetry) {
        let analyzer = Arc::clone(&self.analyzer);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let outcome = analyzer.analyze(reading).await;
            // The router is gone only during shutdown.
            let _ = outcomes.send(outcome);
        });
    }
}

/// Single owner of the alert expiry timer.
async fn route_outcomes<P: EventPublisher>(
    mut rx: mpsc::UnboundedReceiver<Outcome>,
    publisher: P,
    alert_ttl: Duration,
) {
    let mut pending: Option<(AlertId, Instant)> = None;

    loop {
        let deadline = pending.map(|(_, deadline)| deadline);
        let expiry = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            outcome = rx.recv() => match outcome {
                Some(outcome) => {
                    let Some(alert) = accept_outcome(outcome) else {
                        continue;
                    };
                    // A superseded alert is cleared now; only the new one keeps a timer.
                    if let Some((superseded, _)) = pending.take() {
                        clear_alert(superseded, &publisher);
                    }
                    pending = Some((alert.id, Instant::now() + alert_ttl));
                    publisher.publish(Event::from(alert));
                }
                None => break,
            },
            () = expiry => {
                if let Some((alert_id, _)) = pending.take() {
                    clear_alert(alert_id, &publisher);
                }
            }
        }
    }

    if let Some((alert_id, deadline)) = pending {
        tokio::time::sleep_until(deadline).await;
        clear_alert(alert_id, &publisher);
    }
}

/// Alert carried by `outcome`, if any. Failures other than an unreachable
/// collaborator are logged.
fn accept_outcome(outcome: Outcome) -> Option<AnomalyAlert> {
    match outcome {
        Ok(verdict) => {
            let alert = verdict.into_alert()?;
            tracing::info!(detail = %alert.message, "anomaly detected by analysis service");
            Some(alert)
        }
        Err(err) if err.is_benign() => None,
        Err(err) => {
            tracing::warn!(%err, "analysis request failed");
            None
        }
    }
}

fn clear_alert<P: EventPublisher>(alert_id: AlertId, publisher: &P) {
    tracing::debug!(alert = %alert_id, "anomaly alert expired");
    publisher.publish(Event::AlertCleared {
        alert_id,
        cleared_at: time::now(),
    });
}
