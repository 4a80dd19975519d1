//! # Notification Dispatch
//!
//! Runs fan-out after the primary write has committed. Each event is handled
//! on its own detached task, so dropping the caller's future does not cancel
//! it. Failures are logged at `warn` and dropped; nothing is retried.

use std::sync::Arc;

use parking_lot::Mutex;
use rpms_core::Timestamp;
use tokio::task::JoinHandle;

use crate::error::NotificationError;
use crate::fanout::{announcements, FanOut, WorkflowEvent};
use crate::model::Notification;
use crate::store::NotificationRepository;

/// Outcome counts of one or more fan-outs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Notifications written.
    pub delivered: usize,
    /// Audiences that failed to resolve plus notifications that failed to write.
    pub failed: usize,
}

impl std::ops::AddAssign for DeliveryReport {
    fn add_assign(&mut self, rhs: Self) {
        self.delivered += rhs.delivered;
        self.failed += rhs.failed;
    }
}

/// Detached, best-effort notification delivery.
#[derive(Clone)]
pub struct NotificationDispatcher {
    fanout: FanOut,
    sink: Arc<dyn NotificationRepository>,
    in_flight: Arc<Mutex<Vec<JoinHandle<DeliveryReport>>>>,
}

impl NotificationDispatcher {
    pub fn new(fanout: FanOut, sink: Arc<dyn NotificationRepository>) -> Self {
        Self {
            fanout,
            sink,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Spawn delivery of `event` and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: WorkflowEvent) {
        let this = self.clone();
        let handle = tokio::spawn(async move { this.deliver(&event).await });
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Resolve and write every notification for `event` on the current task.
    ///
    /// An audience that fails to resolve is skipped; the others are still
    /// delivered.
    pub async fn deliver(&self, event: &WorkflowEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for announcement in announcements(event) {
            let deliveries = match self.fanout.resolve(event, &announcement).await {
                Ok(deliveries) => deliveries,
                Err(e) => {
                    tracing::warn!(
                        paper_id = %event.paper_id,
                        event = event.kind.name(),
                        error = %e,
                        "notification fan-out failed"
                    );
                    report.failed += 1;
                    continue;
                }
            };
            for delivery in deliveries {
                let notification = Notification::unread(
                    delivery.recipient,
                    delivery.message,
                    delivery.paper_id,
                    Timestamp::now(),
                );
                match self.sink.insert_notification(&notification).await {
                    Ok(()) => report.delivered += 1,
                    Err(source) => {
                        let e = NotificationError::Deliver {
                            recipient: delivery.recipient,
                            source,
                        };
                        tracing::warn!(
                            paper_id = %event.paper_id,
                            event = event.kind.name(),
                            error = %e,
                            "notification delivery failed"
                        );
                        report.failed += 1;
                    }
                }
            }
        }
        tracing::debug!(
            paper_id = %event.paper_id,
            event = event.kind.name(),
            delivered = report.delivered,
            failed = report.failed,
            "fan-out finished"
        );
        report
    }

    /// Wait for every task spawned so far, including tasks spawned while
    /// waiting.
    pub async fn flush(&self) -> DeliveryReport {
        let mut total = DeliveryReport::default();
        loop {
            let handles = std::mem::take(&mut *self.in_flight.lock());
            if handles.is_empty() {
                return total;
            }
            for handle in handles {
                match handle.await {
                    Ok(report) => total += report,
                    Err(e) => {
                        tracing::warn!(error = %e, "notification task did not complete");
                    }
                }
            }
        }
    }
}
