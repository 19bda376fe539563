//! Ingestion pipeline: drives every raw line through decode, calibration,
//! automation, fan-out and analysis.
//!
//! For each line the order is fixed: the actuator command is written before
//! the reading is published and handed to the [`AnomalyGateway`]. Analysis
//! never blocks the loop and its outcome never feeds back into it.
//!
//! A failing session (read error, closed transport, failed write) is reported
//! to the [`Connector`], which waits out the backoff and starts a fresh
//! discovery cycle. Lines in flight on a dropped session are lost.

use std::future::Future;

use owlhub_domain::error::OwlHubError;
use owlhub_domain::event::Event;

use crate::anomaly_gateway::AnomalyGateway;
use crate::automation::AutomationController;
use crate::calibrator::Calibrator;
use crate::connector::Connector;
use crate::decoder;
use crate::ports::{AnomalyAnalyzer, Connection, EventPublisher, Transport};

/// The long-running ingestion loop and the stages it owns.
pub struct Pipeline<T, A, P> {
    connector: Connector<T>,
    calibrator: Calibrator,
    automation: AutomationController,
    gateway: AnomalyGateway<A>,
    publisher: P,
}

impl<T, A, P> Pipeline<T, A, P>
where
    T: Transport,
    A: AnomalyAnalyzer,
    P: EventPublisher,
{
    /// Assemble the pipeline from its stages.
    pub fn new(
        connector: Connector<T>,
        calibrator: Calibrator,
        automation: AutomationController,
        gateway: AnomalyGateway<A>,
        publisher: P,
    ) -> Self {
        Self {
            connector,
            calibrator,
            automation,
            gateway,
            publisher,
        }
    }

    /// Ingest forever, reconnecting after every fault, until `shutdown` resolves.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        loop {
            let mut connection = tokio::select! {
                connection = self.connector.establish() => connection,
                () = &mut shutdown => break,
            };

            let fault = tokio::select! {
                fault = self.run_session(&mut connection) => fault,
                () = &mut shutdown => break,
            };
            drop(connection);

            tokio::select! {
                () = self.connector.report_fault(&fault) => {}
                () = &mut shutdown => break,
            }
        }

        tracing::info!("ingestion pipeline stopped");
    }

    /// Process lines until the session fails and return the fault.
    async fn run_session(&self, connection: &mut T::Connection) -> OwlHubError {
        loop {
            let line = match connection.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return OwlHubError::TransportFault("transport closed".into()),
                Err(err) => return err,
            };

            if let Err(err) = self.process_line(&line, connection) {
                return err;
            }
        }
    }

    /// Run one raw line through every stage.
    ///
    /// The reading is still published and submitted when the actuator write
    /// fails; the write error is returned afterwards so the session faults.
    fn process_line(&self, line: &str, connection: &mut T::Connection) -> Result<(), OwlHubError> {
        tracing::debug!(raw = line, "line received");

        let reading = self.calibrator.calibrate(decoder::decode(line));
        let written = self.automation.drive(&reading, connection).map(|_| ());

        self.publisher.publish(Event::from(reading));
        self.gateway.submit(reading);

        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use owlhub_domain::alert::AnalysisVerdict;
    use owlhub_domain::device::DeviceCandidate;
    use owlhub_domain::telemetry::Telemetry;

    use crate::connector::SelectionPolicy;
    use crate::event_bus::EventFanout;

    struct ScriptedConnection {
        lines: VecDeque<String>,
        written: Arc<Mutex<Vec<u8>>>,
        fail_writes: bool,
    }

    impl Connection for ScriptedConnection {
        async fn next_line(&mut self) -> Result<Option<String>, OwlHubError> {
            Ok(self.lines.pop_front())
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), OwlHubError> {
            if self.fail_writes {
                return Err(OwlHubError::TransportFault("write timed out".into()));
            }
            self.written.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }
    }

    /// One device that serves each scripted session once, in order.
    #[derive(Default)]
    struct ScriptedTransport {
        sessions: Mutex<VecDeque<Vec<&'static str>>>,
        opens: Mutex<usize>,
        written: Arc<Mutex<Vec<u8>>>,
        fail_writes: bool,
    }

    impl ScriptedTransport {
        fn with_sessions(sessions: Vec<Vec<&'static str>>) -> Self {
            Self {
                sessions: Mutex::new(sessions.into()),
                ..Self::default()
            }
        }
    }

    impl Transport for ScriptedTransport {
        type Connection = ScriptedConnection;

        async fn discover(&self) -> Result<Vec<DeviceCandidate>, OwlHubError> {
            if self.sessions.lock().unwrap().is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![
                DeviceCandidate::new("/dev/ttyACM0").with_manufacturer("Arduino (www.arduino.cc)"),
            ])
        }

        async fn open(&self, _candidate: &DeviceCandidate) -> Result<ScriptedConnection, OwlHubError> {
            *self.opens.lock().unwrap() += 1;
            let lines = self
                .sessions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default()
                .into_iter()
                .map(str::to_owned)
                .collect();
            Ok(ScriptedConnection {
                lines,
                written: Arc::clone(&self.written),
                fail_writes: self.fail_writes,
            })
        }
    }

    struct FixedAnalyzer(fn() -> Result<AnalysisVerdict, OwlHubError>);

    impl AnomalyAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _reading: Telemetry) -> Result<AnalysisVerdict, OwlHubError> {
            (self.0)()
        }
    }

    fn unreachable() -> Result<AnalysisVerdict, OwlHubError> {
        Err(OwlHubError::AnalysisUnreachable)
    }

    fn build(
        transport: Arc<ScriptedTransport>,
        analyzer: FixedAnalyzer,
        bus: &Arc<EventFanout>,
    ) -> Pipeline<Arc<ScriptedTransport>, FixedAnalyzer, Arc<EventFanout>> {
        let connector = Connector::new(
            transport,
            SelectionPolicy::default(),
            Duration::from_secs(3),
        );
        let (gateway, _router) = AnomalyGateway::with_default_ttl(analyzer, Arc::clone(bus));
        Pipeline::new(
            connector,
            Calibrator::default(),
            AutomationController::default(),
            gateway,
            Arc::clone(bus),
        )
    }

    fn drain(sub: &mut crate::event_bus::Subscription) -> Vec<Telemetry> {
        let mut readings = Vec::new();
        while let Some(event) = sub.try_recv() {
            if let Event::Telemetry { reading } = event {
                readings.push(reading);
            }
        }
        readings
    }

    #[tokio::test(start_paused = true)]
    async fn should_write_command_and_publish_calibrated_reading() {
        let transport = Arc::new(ScriptedTransport::with_sessions(vec![vec![
            "Temp: 33.9 C, Humidity: 65 %, Motion: 1",
            "TEMP:25.0,HUM:40,MOT:1,GAS:120",
        ]]));
        let bus = Arc::new(EventFanout::new(16));
        let mut sub = bus.subscribe();
        let pipeline = build(Arc::clone(&transport), FixedAnalyzer(unreachable), &bus);

        pipeline
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await;

        assert_eq!(transport.written.lock().unwrap().as_slice(), b"Bb");
        let readings = drain(&mut sub);
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].temperature, Some(21.5));
        assert_eq!(readings[0].motion, Some(true));
        assert_eq!(readings[1].temperature, Some(12.6));
        assert_eq!(readings[1].gas_level, Some(120));
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_empty_reading_for_unrecognized_line() {
        let transport = Arc::new(ScriptedTransport::with_sessions(vec![vec!["hello world"]]));
        let bus = Arc::new(EventFanout::new(16));
        let mut sub = bus.subscribe();
        let pipeline = build(Arc::clone(&transport), FixedAnalyzer(unreachable), &bus);

        pipeline
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await;

        assert_eq!(transport.written.lock().unwrap().as_slice(), b"b");
        let readings = drain(&mut sub);
        assert_eq!(readings, vec![Telemetry::default()]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_reconnect_after_transport_closes() {
        let transport = Arc::new(ScriptedTransport::with_sessions(vec![
            vec!["TEMP:30.0,HUM:70,MOT:0"],
            vec!["TEMP:30.0,HUM:70,MOT:1"],
        ]));
        let bus = Arc::new(EventFanout::new(16));
        let mut sub = bus.subscribe();
        let pipeline = build(Arc::clone(&transport), FixedAnalyzer(unreachable), &bus);

        pipeline
            .run_until(tokio::time::sleep(Duration::from_secs(5)))
            .await;

        assert_eq!(*transport.opens.lock().unwrap(), 2);
        assert_eq!(transport.written.lock().unwrap().as_slice(), b"bB");
        assert_eq!(drain(&mut sub).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_reading_even_when_write_fails() {
        let transport = Arc::new(ScriptedTransport {
            fail_writes: true,
            ..ScriptedTransport::with_sessions(vec![vec![
                "TEMP:30.0,HUM:70,MOT:1",
                "TEMP:31.0,HUM:70,MOT:1",
            ]])
        });
        let bus = Arc::new(EventFanout::new(16));
        let mut sub = bus.subscribe();
        let pipeline = build(Arc::clone(&transport), FixedAnalyzer(unreachable), &bus);

        pipeline
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await;

        let readings = drain(&mut sub);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].temperature, Some(17.6));
    }

    #[tokio::test(start_paused = true)]
    async fn should_surface_alert_from_analysis() {
        fn anomaly() -> Result<AnalysisVerdict, OwlHubError> {
            AnalysisVerdict::from_value(serde_json::json!({"anomaly": true}))
        }

        let transport = Arc::new(ScriptedTransport::with_sessions(vec![vec![
            "TEMP:30.0,HUM:70,MOT:1",
        ]]));
        let bus = Arc::new(EventFanout::new(16));
        let pipeline = build(Arc::clone(&transport), FixedAnalyzer(anomaly), &bus);

        pipeline
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await;

        let alert = bus.snapshot().active_alert.expect("alert should be active");
        assert_eq!(alert.message, "Unusual activity detected!");
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_while_searching() {
        let transport = Arc::new(ScriptedTransport::default());
        let bus = Arc::new(EventFanout::new(16));
        let pipeline = build(Arc::clone(&transport), FixedAnalyzer(unreachable), &bus);

        pipeline
            .run_until(tokio::time::sleep(Duration::from_secs(30)))
            .await;

        assert_eq!(*transport.opens.lock().unwrap(), 0);
    }
}
