//! Probe dispatcher
//!
//! The engine validates a whole batch up front, then polls every probe
//! concurrently and collects the results in input order. An optional
//! callback sees each result as soon as its probe finishes, so callback
//! order is completion order, not input order.

use crate::config::ProbeConfig;
use crate::network::interface::local_primary_ipv4;
use crate::network::socket::{BindProber, ConnectProber};
use crate::scanner::ProbeReport;
use crate::target::{resolve_batch, resolve_target, ProbeJob, Target};
use futures::future::join_all;
use serde_json::Value;
use std::time::Instant;

/// Per-result notification, invoked once per completed probe
pub type ProbeCallback<'a> = &'a (dyn Fn(bool) + Send + Sync);

/// Main probe engine
#[derive(Debug, Clone)]
pub struct ProbeEngine {
    config: ProbeConfig,
    connect_prober: ConnectProber,
    bind_prober: BindProber,
}

impl ProbeEngine {
    /// Create a new probe engine with the given configuration
    pub fn new(config: ProbeConfig) -> crate::Result<Self> {
        config.validate()?;

        // Resolved once per engine
        let bind_address = config.bind_address.unwrap_or_else(local_primary_ipv4);
        let connect_prober = ConnectProber::new(config.connect_timeout());
        let bind_prober = BindProber::new(bind_address, config.bind_timeout());

        Ok(Self {
            config,
            connect_prober,
            bind_prober,
        })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe a single target and return its result directly
    pub async fn probe_one(&self, target: &Target) -> crate::Result<bool> {
        let job = resolve_target(0, target)?;
        Ok(self.run(&job).await)
    }

    /// Probe every target concurrently; results follow input order
    pub async fn probe_many(&self, targets: &[Target]) -> crate::Result<Vec<bool>> {
        self.probe_many_with(targets, None).await
    }

    /// Like [`probe_many`](Self::probe_many), notifying `callback` as each probe completes.
    ///
    /// Nothing is probed if any target fails validation.
    pub async fn probe_many_with(
        &self,
        targets: &[Target],
        callback: Option<ProbeCallback<'_>>,
    ) -> crate::Result<Vec<bool>> {
        // Validate everything before the first socket opens
        let jobs = resolve_batch(targets)?;
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        log::info!("Probing {} target(s)", jobs.len());
        let start = Instant::now();

        // join_all keeps input order regardless of completion order
        let probes = jobs.iter().map(|job| async move {
            let result = self.run(job).await;
            if let Some(callback) = callback {
                callback(result);
            }
            result
        });
        let results = join_all(probes).await;

        log::info!(
            "Probed {} target(s) in {:?}, {} up",
            results.len(),
            start.elapsed(),
            results.iter().filter(|&&up| up).count()
        );
        Ok(results)
    }

    /// Probe dynamically typed entries (strings and port numbers).
    ///
    /// Entries of any other type fail the batch before a socket is opened.
    pub async fn probe_entries(
        &self,
        entries: &[Value],
        callback: Option<ProbeCallback<'_>>,
    ) -> crate::Result<Vec<bool>> {
        let targets = Target::from_values(entries)?;
        self.probe_many_with(&targets, callback).await
    }

    /// Probe a batch and keep the targets and timing alongside the results
    pub async fn probe_report(
        &self,
        targets: &[Target],
        callback: Option<ProbeCallback<'_>>,
    ) -> crate::Result<ProbeReport> {
        let start = Instant::now();
        let results = self.probe_many_with(targets, callback).await?;
        Ok(ProbeReport::new(targets.to_vec(), results, start.elapsed()))
    }

    async fn run(&self, job: &ProbeJob) -> bool {
        match job {
            ProbeJob::Connect(endpoint) => self.connect_prober.probe(endpoint).await,
            ProbeJob::Bind(port) => self.bind_prober.probe(*port).await,
        }
    }
}

/// Probe a single target with the default configuration
pub async fn probe_one(target: &Target) -> crate::Result<bool> {
    ProbeEngine::new(ProbeConfig::default())?
        .probe_one(target)
        .await
}

/// Probe a batch with the default configuration
pub async fn probe_many(targets: &[Target]) -> crate::Result<Vec<bool>> {
    ProbeEngine::new(ProbeConfig::default())?
        .probe_many(targets)
        .await
}
