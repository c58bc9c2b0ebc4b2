//! The cooperative poll loop tying probes, diff engines and alerts together.
//!
//! One tick checks every enabled domain in a fixed order (VPN, services,
//! payments, health), strictly sequentially, then the loop sleeps for the
//! configured interval.

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use hostwatch_config::Config;

use crate::alert_manager::AlertManager;
use crate::alerts::Alert;
use crate::command::{CommandRunner, SystemCommandRunner};
use crate::error::MonitorError;
use crate::health::HealthEvaluator;
use crate::payments::PaymentDetector;
use crate::services::{self, ServiceProbe, ServiceSet};
use crate::vpn::{self, VpnProbe, VpnSnapshot};

/// Lifecycle of a [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Startup reports not sent yet.
    Uninitialized,
    /// Polling.
    Running,
}

/// Owns every domain's probe and retained state.
pub struct Monitor {
    alerts: AlertManager,
    interval: Duration,
    state: SchedulerState,
    vpn: Option<VpnProbe>,
    vpn_snapshot: Option<VpnSnapshot>,
    services: Option<ServiceProbe>,
    service_units: Vec<String>,
    service_set: ServiceSet,
    payments: Option<PaymentDetector>,
    health: Option<HealthEvaluator>,
}

impl Monitor {
    /// Create a monitor with no domains enabled.
    pub fn new(alerts: AlertManager, interval: Duration) -> Self {
        Self {
            alerts,
            interval,
            state: SchedulerState::Uninitialized,
            vpn: None,
            vpn_snapshot: None,
            services: None,
            service_units: Vec::new(),
            service_set: ServiceSet::default(),
            payments: None,
            health: None,
        }
    }

    /// Build every enabled domain from configuration.
    ///
    /// A missing or unusable health base URL disables the health domain
    /// instead of failing.
    pub fn from_config(config: &Config) -> Result<Self, MonitorError> {
        let alerts = AlertManager::from_config(&config.telegram)?;
        let runner: Arc<dyn CommandRunner> =
            Arc::new(SystemCommandRunner::new(config.monitor.command_timeout()));

        let mut monitor = Self::new(alerts, config.monitor.check_interval());

        if config.vpn.enabled {
            monitor = monitor.with_vpn(VpnProbe::new(runner.clone(), &config.vpn.command));
        }

        let units = config.services.unique_units();
        if !units.is_empty() {
            monitor = monitor.with_services(ServiceProbe::new(runner.clone()), units);
        }

        if config.payments.enabled {
            monitor = monitor.with_payments(PaymentDetector::from_config(runner, &config.payments));
        }

        match HealthEvaluator::from_config(&config.health) {
            Ok(Some(evaluator)) => {
                info!("BTCPay health checks enabled: {}", evaluator.url());
                monitor = monitor.with_health(evaluator);
            }
            Ok(None) => info!("BTCPay health checks disabled: no base URL configured"),
            Err(e) => error!("BTCPay health checks disabled: {}", e),
        }

        Ok(monitor)
    }

    pub fn with_vpn(mut self, probe: VpnProbe) -> Self {
        self.vpn = Some(probe);
        self
    }

    /// Watch `units` in order. Repeats are watched once.
    pub fn with_services(
        mut self,
        probe: ServiceProbe,
        units: impl IntoIterator<Item = String>,
    ) -> Self {
        self.services = Some(probe);
        self.service_units =
            ServiceSet::new(units.into_iter().map(|unit| (unit, false))).names();
        self
    }

    pub fn with_payments(mut self, detector: PaymentDetector) -> Self {
        self.payments = Some(detector);
        self
    }

    pub fn with_health(mut self, evaluator: HealthEvaluator) -> Self {
        self.health = Some(evaluator);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Last VPN snapshot, `None` before the first successful probe.
    pub fn vpn_snapshot(&self) -> Option<&VpnSnapshot> {
        self.vpn_snapshot.as_ref()
    }

    pub fn service_set(&self) -> &ServiceSet {
        &self.service_set
    }

    /// Send the startup reports and take the first baselines. Runs once.
    pub async fn initialize(&mut self) {
        if self.state == SchedulerState::Running {
            return;
        }

        if let Err(e) = self.check_vpn().await {
            error!("VPN status unavailable at startup, will retry next tick: {}", e);
        }

        if let Some(probe) = &self.services {
            let mut observed = Vec::with_capacity(self.service_units.len());
            for unit in &self.service_units {
                let active = match probe.is_active(unit).await {
                    Ok(active) => active,
                    Err(e) => {
                        warn!("Could not check service {} at startup: {}", unit, e);
                        false
                    }
                };
                info!("Service {} is {}", unit, if active { "active" } else { "inactive" });
                observed.push((unit.clone(), active));
            }
            self.service_set = ServiceSet::new(observed);

            for unit in self.service_set.names() {
                let active = self.service_set.is_active(&unit).unwrap_or(false);
                self.notify(services::startup_alert(&unit, active)).await;
            }
        }

        self.state = SchedulerState::Running;
    }

    /// Check every enabled domain once, in order. A failing domain is logged
    /// and does not stop the ones after it.
    pub async fn tick(&mut self) {
        if let Err(e) = self.check_vpn().await {
            error!("vpn check failed: {}", e);
        }
        if let Err(e) = self.check_services().await {
            error!("services check failed: {}", e);
        }
        if let Err(e) = self.check_payments().await {
            error!("payments check failed: {}", e);
        }
        if let Err(e) = self.check_health().await {
            error!("health check failed: {}", e);
        }
    }

    /// Initialize and run a single tick without sleeping.
    pub async fn run_once(&mut self) {
        self.initialize().await;
        self.tick().await;
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Shutdown interrupts whatever step is in flight, including the sleep.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<(), MonitorError> {
        info!("Starting monitoring (interval: {:?})", self.interval);

        tokio::select! {
            _ = self.poll_forever() => {}
            _ = shutdown => {
                info!("Shutdown requested");
            }
        }

        info!("Monitoring stopped");
        Ok(())
    }

    async fn poll_forever(&mut self) {
        self.initialize().await;
        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn notify(&self, alert: Alert) {
        // Failures are already logged by the manager.
        let _ = self.alerts.send(&alert).await;
    }

    async fn check_vpn(&mut self) -> Result<(), MonitorError> {
        let Some(probe) = &self.vpn else {
            return Ok(());
        };
        let current = probe.probe().await?;

        let alert = match &self.vpn_snapshot {
            None => Some(vpn::status_report(&current)),
            Some(previous) => {
                let changes = vpn::diff(previous, &current);
                for change in &changes {
                    info!("VPN change: {}", change);
                }
                vpn::change_alert(&changes)
            }
        };

        self.vpn_snapshot = Some(current);
        if let Some(alert) = alert {
            self.notify(alert).await;
        }
        Ok(())
    }

    async fn check_services(&mut self) -> Result<(), MonitorError> {
        let Some(probe) = &self.services else {
            return Ok(());
        };

        let mut changes = Vec::new();
        for unit in self.service_set.names() {
            match probe.is_active(&unit).await {
                Ok(active) => {
                    if let Some(change) = self.service_set.record(&unit, active) {
                        info!("{}", change);
                        changes.push(change);
                    }
                }
                Err(e) => warn!("Could not check service {}, keeping last state: {}", unit, e),
            }
        }

        for change in changes {
            self.notify(change.to_alert()).await;
        }
        Ok(())
    }

    async fn check_payments(&self) -> Result<(), MonitorError> {
        let Some(detector) = &self.payments else {
            return Ok(());
        };
        if let Some(alert) = detector.detect().await.to_alert() {
            self.notify(alert).await;
        }
        Ok(())
    }

    async fn check_health(&self) -> Result<(), MonitorError> {
        let Some(evaluator) = &self.health else {
            return Ok(());
        };
        if let Some(alert) = evaluator.evaluate().await.to_alert() {
            self.notify(alert).await;
        }
        Ok(())
    }
}
