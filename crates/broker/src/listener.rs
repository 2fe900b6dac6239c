//! Consumer side: runs a handler over a queue with retry and dead-lettering.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{HandlerError, TransportError};
use crate::memory::InMemoryBroker;
use crate::message::{Delivery, Message};
use crate::retry::RetryPolicy;

/// Dead-letter reason for messages the handler rejected outright.
pub const REASON_REJECTED: &str = "rejected";

/// Dead-letter reason for messages that kept failing transiently.
pub const REASON_RETRIES_EXHAUSTED: &str = "expired-retries";

/// Processes one message from a queue.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError>;
}

/// What happened to a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handler succeeded, possibly after retries.
    Acked,
    /// Handler rejected the message; it went to the DLQ without retry.
    Rejected,
    /// Handler failed transiently on every attempt; it went to the DLQ.
    RetriesExhausted,
    /// Dead-lettering itself failed; the delivery went back on its queue.
    Requeued,
}

/// Tally of a [`ListenerContainer::drain`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub acked: usize,
    pub rejected: usize,
    pub retries_exhausted: usize,
    pub requeued: usize,
}

impl DrainReport {
    /// Deliveries that were settled. Requeued ones are still pending.
    pub fn processed(&self) -> usize {
        self.acked + self.rejected + self.retries_exhausted
    }

    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Acked => self.acked += 1,
            DeliveryOutcome::Rejected => self.rejected += 1,
            DeliveryOutcome::RetriesExhausted => self.retries_exhausted += 1,
            DeliveryOutcome::Requeued => self.requeued += 1,
        }
    }
}

impl std::ops::AddAssign for DrainReport {
    fn add_assign(&mut self, rhs: Self) {
        self.acked += rhs.acked;
        self.rejected += rhs.rejected;
        self.retries_exhausted += rhs.retries_exhausted;
        self.requeued += rhs.requeued;
    }
}

/// Binds a handler to a queue.
///
/// Each delivery gets up to `retry.max_attempts` handler invocations.
/// A [`HandlerError::Reject`] dead-letters immediately. A
/// [`HandlerError::Transient`] is retried with backoff and dead-lettered once
/// attempts run out. Deliveries are processed one at a time per container.
#[derive(Clone)]
pub struct ListenerContainer {
    broker: InMemoryBroker,
    queue: String,
    handler: Arc<dyn MessageHandler>,
    retry: RetryPolicy,
}

impl ListenerContainer {
    pub fn new(
        broker: InMemoryBroker,
        queue: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            broker,
            queue: queue.into(),
            handler,
            retry,
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Handles one delivery to completion and settles it.
    #[tracing::instrument(skip(self, delivery), fields(queue = %self.queue))]
    pub async fn process(&self, delivery: Delivery) -> Result<DeliveryOutcome, TransportError> {
        metrics::counter!("messages_consumed_total", "queue" => self.queue.clone()).increment(1);

        let mut attempt = 1;
        loop {
            match self.handler.handle(&delivery.message).await {
                Ok(()) => {
                    tracing::debug!(attempt, "Message acknowledged");
                    return Ok(DeliveryOutcome::Acked);
                }
                Err(HandlerError::Reject(reason)) => {
                    tracing::warn!(%reason, "Message rejected, routing to dead-letter queue");
                    return self
                        .dead_letter(delivery, REASON_REJECTED, &reason, DeliveryOutcome::Rejected)
                        .await;
                }
                Err(HandlerError::Transient(reason)) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        %reason,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    metrics::counter!("messages_retried_total", "queue" => self.queue.clone())
                        .increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(HandlerError::Transient(reason)) => {
                    tracing::error!(%reason, attempt, "Retries exhausted, routing to dead-letter queue");
                    return self
                        .dead_letter(
                            delivery,
                            REASON_RETRIES_EXHAUSTED,
                            &reason,
                            DeliveryOutcome::RetriesExhausted,
                        )
                        .await;
                }
            }
        }
    }

    /// Routes a failed delivery to the DLX. If that fails the delivery goes
    /// back on its own queue instead of being lost.
    async fn dead_letter(
        &self,
        delivery: Delivery,
        reason: &'static str,
        detail: &str,
        outcome: DeliveryOutcome,
    ) -> Result<DeliveryOutcome, TransportError> {
        match self.broker.dead_letter(delivery.clone(), reason, detail).await {
            Ok(()) => {
                metrics::counter!(
                    "messages_dead_lettered_total",
                    "queue" => self.queue.clone(),
                    "reason" => reason
                )
                .increment(1);
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, reason, "Dead-lettering failed, requeueing message");
                metrics::counter!("messages_requeued_total", "queue" => self.queue.clone())
                    .increment(1);
                self.broker.requeue(delivery).await?;
                Ok(DeliveryOutcome::Requeued)
            }
        }
    }

    /// Processes the messages currently on the queue and returns.
    ///
    /// Stops early at the first requeued delivery so a message that cannot be
    /// dead-lettered is not cycled forever.
    pub async fn drain(&self) -> Result<DrainReport, TransportError> {
        let mut report = DrainReport::default();
        while let Some(delivery) = self.broker.try_next(&self.queue).await? {
            let outcome = self.process(delivery).await?;
            report.record(outcome);
            if outcome == DeliveryOutcome::Requeued {
                break;
            }
        }
        Ok(report)
    }

    /// Consumes the queue until `shutdown` flips to true.
    ///
    /// A delivery already being processed is finished before returning. After
    /// a requeue the listener backs off for `retry.max_interval` and keeps
    /// consuming.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), TransportError> {
        tracing::info!(queue = %self.queue, "Listener started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                delivery = self.broker.next_delivery(&self.queue) => {
                    if self.process(delivery?).await? == DeliveryOutcome::Requeued {
                        tokio::time::sleep(self.retry.max_interval).await;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::info!(queue = %self.queue, "Listener stopped");
        Ok(())
    }

    /// Spawns [`run`](Self::run) on the runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<Result<(), TransportError>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
