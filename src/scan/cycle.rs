use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info};

use super::ScanSettings;
use super::buckets::BucketDiscoverer;
use super::governor::Governor;
use super::objects::ObjectScanner;
use super::report::{CycleReport, EndpointReport};
use crate::aggregate::{AggregateStore, LogLineParser};
use crate::shutdown::ShutdownReceiver;
use crate::storage::{ConnectStorage, EndpointConfig};

/// Drives discovery and scanning over all endpoints until shutdown.
///
/// Endpoints are visited one after another; buckets of one endpoint are
/// scanned concurrently under the shared [`Governor`].
pub struct CycleScheduler {
    endpoints: Vec<EndpointConfig>,
    connector: Arc<dyn ConnectStorage>,
    discoverer: BucketDiscoverer,
    governor: Governor,
    interval: Duration,
}

impl CycleScheduler {
    #[must_use]
    pub fn new(
        settings: &ScanSettings,
        endpoints: Vec<EndpointConfig>,
        connector: Arc<dyn ConnectStorage>,
        store: Arc<AggregateStore>,
        parser: LogLineParser,
    ) -> Self {
        let governor = Governor::new(settings.max_concurrency);
        let scanner = Arc::new(ObjectScanner::new(
            store,
            governor.clone(),
            parser,
            &settings.log_prefix,
            settings.page_size,
        ));
        Self {
            endpoints,
            connector,
            discoverer: BucketDiscoverer::new(scanner, governor.clone()),
            governor,
            interval: settings.cycle_interval,
        }
    }

    /// Runs one full pass over every endpoint.
    ///
    /// A failing endpoint is logged and recorded in the report; the
    /// remaining endpoints are still processed.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(self.endpoints.len());
        for endpoint in &self.endpoints {
            reports.push(self.scan_endpoint(endpoint).await);
        }
        let report = CycleReport::finish(reports, started.elapsed());
        info!(
            "Cycle finished in {} ms: {} buckets scanned, {} endpoints failed.",
            report.elapsed_ms,
            report.buckets_scanned(),
            report.failed_endpoints()
        );
        report
    }

    /// Alternates between a full cycle and an idle wait of one interval
    /// until `shutdown` fires.
    ///
    /// A shutdown during a cycle closes the governor and waits for the calls
    /// already in flight. Unfinished buckets keep their previous entries.
    pub async fn run(&self, shutdown: &mut ShutdownReceiver) {
        loop {
            let cycle = self.run_cycle();
            tokio::pin!(cycle);
            tokio::select! {
                _report = &mut cycle => {}
                _ = shutdown.recv() => {
                    info!("Shutdown requested; winding down the current cycle.");
                    self.governor.close();
                    cycle.await;
                    return;
                }
            }
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => return,
            }
        }
    }

    async fn scan_endpoint(&self, endpoint: &EndpointConfig) -> EndpointReport {
        let client = match self.connector.connect(endpoint) {
            Ok(client) => client,
            Err(err) => {
                error!("Failed to connect to endpoint '{}': {}", endpoint.region, err);
                return EndpointReport::failed(&endpoint.region, err.to_string());
            }
        };
        match self.discoverer.discover(client).await {
            Ok(report) => report,
            Err(err) => {
                error!(
                    "Failed to list buckets on endpoint '{}': {}",
                    endpoint.region, err
                );
                EndpointReport::failed(&endpoint.region, err.to_string())
            }
        }
    }
}
