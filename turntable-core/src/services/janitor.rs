//! Background sweep for the login throttle table.
//!
//! The sweep only reclaims memory: [`LoginThrottle::check_allowed`] already
//! ignores stale records. The task is owned by a [`Janitor`] handle and stops
//! when the handle is shut down or dropped.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::{clock::Clock, services::LoginThrottle};

const FALLBACK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

/// Handle to a running sweep task.
pub struct Janitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Spawn the sweep on the current tokio runtime.
    ///
    /// The first sweep runs immediately, then once per
    /// `ThrottleConfig::janitor_interval`.
    pub fn start(throttle: Arc<LoginThrottle>, clock: Arc<dyn Clock>) -> Self {
        let period = throttle
            .config()
            .janitor_interval
            .to_std()
            .unwrap_or(FALLBACK_INTERVAL);
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = throttle.sweep(clock.now());
                        if removed > 0 {
                            tracing::info!(
                                count = removed,
                                remaining = throttle.len(),
                                "Swept stale login attempt records"
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::info!("Shutting down login throttle janitor");
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the sweep and wait for the task to finish.
    pub async fn shutdown(self) {
        // The receiver only disappears once the task has already exited.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Login throttle janitor ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, services::ThrottleConfig};
    use chrono::{Duration, TimeZone, Utc};

    fn setup() -> (Arc<LoginThrottle>, Arc<ManualClock>) {
        let config = ThrottleConfig::default().with_janitor_interval(Duration::minutes(60));
        let throttle = Arc::new(LoginThrottle::new(config).unwrap());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        (throttle, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_start_and_every_interval() {
        let (throttle, clock) = setup();
        throttle.record_outcome("old@example.com", clock.now(), false);
        clock.advance(Duration::minutes(31));

        let janitor = Janitor::start(throttle.clone(), clock.clone());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(throttle.is_empty());

        throttle.record_outcome("next@example.com", clock.now(), false);
        clock.advance(Duration::minutes(31));
        assert_eq!(throttle.len(), 1);

        tokio::time::sleep(std::time::Duration::from_secs(3601)).await;
        assert!(throttle.is_empty());

        janitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_records_inside_window() {
        let (throttle, clock) = setup();
        for _ in 0..5 {
            throttle.record_outcome("locked@example.com", clock.now(), false);
        }
        clock.advance(Duration::minutes(10));

        let janitor = Janitor::start(throttle.clone(), clock.clone());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let record = throttle.record("locked@example.com").unwrap();
        assert!(record.is_locked(clock.now()));

        janitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let (throttle, clock) = setup();
        let janitor = Janitor::start(throttle.clone(), clock.clone());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!janitor.is_finished());

        janitor.shutdown().await;

        // Stale records are no longer swept once the janitor is gone.
        throttle.record_outcome("old@example.com", clock.now(), false);
        clock.advance(Duration::minutes(31));
        tokio::time::sleep(std::time::Duration::from_secs(7200)).await;
        assert_eq!(throttle.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_task() {
        let (throttle, clock) = setup();
        let janitor = Janitor::start(throttle.clone(), clock.clone());
        drop(janitor);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // The task held the only other reference to the throttle.
        assert_eq!(Arc::strong_count(&throttle), 1);
    }
}
