//! Wires the producer, the broker and both consumers into one process.

use std::sync::Arc;

use broker::{DrainReport, InMemoryBroker, ListenerContainer, Topology};
use common::Clock;
use domain::{EventPublisher, InMemoryOrderRepository, InMemoryProductCatalog, OrderService};
use kitchen::{InMemoryKitchenStore, KitchenService, OrderPlacedListener};
use report::{
    InMemoryReportStore, OrderPlacedReportListener, OrderReadyReportListener,
    ReportProcessingService, ReportService,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::routes::health::HealthState;

pub type Orders = OrderService<InMemoryOrderRepository, InMemoryProductCatalog, InMemoryBroker>;
pub type Kitchen = KitchenService<InMemoryKitchenStore>;
pub type ReportProcessing = ReportProcessingService<InMemoryReportStore>;
pub type Reports = ReportService<InMemoryReportStore>;

/// Every service of the system sharing one in-memory broker.
pub struct Pipeline {
    pub broker: InMemoryBroker,
    pub orders: Arc<Orders>,
    pub kitchen: Arc<Kitchen>,
    pub report_processing: Arc<ReportProcessing>,
    pub reports: Arc<Reports>,
    listeners: Vec<ListenerContainer>,
}

impl Pipeline {
    /// Declares the producer and consumer topologies and builds the services.
    pub async fn build(
        config: &Config,
        catalog: InMemoryProductCatalog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let broker = InMemoryBroker::new();
        let kitchen_group = config.broker.kitchen_group();
        let report_group = config.broker.report_group();

        broker
            .declare(&Topology::producer(config.broker.exchange.clone()))
            .await;
        broker.declare(&Topology::consumer_group(&kitchen_group)).await;
        broker.declare(&Topology::consumer_group(&report_group)).await;

        let orders = Arc::new(OrderService::new(
            InMemoryOrderRepository::new(),
            catalog,
            EventPublisher::new(broker.clone(), config.broker.publisher()),
            clock.clone(),
        ));

        let kitchen = Arc::new(KitchenService::new(
            InMemoryKitchenStore::new(),
            clock.clone(),
        ));

        let report_store = InMemoryReportStore::new();
        let report_processing = Arc::new(ReportProcessingService::new(
            report_store.clone(),
            clock,
        ));
        let reports = Arc::new(ReportService::new(report_store));

        // Report listeners first: consumers are independent and this keeps
        // drain order stable.
        let listeners = vec![
            ListenerContainer::new(
                broker.clone(),
                config.broker.report_placed_queue.clone(),
                Arc::new(OrderPlacedReportListener::new(report_processing.clone())),
                config.retry,
            ),
            ListenerContainer::new(
                broker.clone(),
                config.broker.report_ready_queue.clone(),
                Arc::new(OrderReadyReportListener::new(report_processing.clone())),
                config.retry,
            ),
            ListenerContainer::new(
                broker.clone(),
                config.broker.kitchen_queue.clone(),
                Arc::new(OrderPlacedListener::new(kitchen.clone())),
                config.retry,
            ),
        ];

        tracing::info!(
            exchange = %config.broker.exchange,
            listeners = listeners.len(),
            "Pipeline wired"
        );

        Self {
            broker,
            orders,
            kitchen,
            report_processing,
            reports,
            listeners,
        }
    }

    pub fn listeners(&self) -> &[ListenerContainer] {
        &self.listeners
    }

    /// Broker handle and consumed queue names for the health endpoint.
    pub fn health_state(&self) -> HealthState {
        HealthState {
            broker: self.broker.clone(),
            queues: self
                .listeners
                .iter()
                .map(|l| l.queue().to_string())
                .collect(),
        }
    }

    /// Processes queued messages on every listener until no listener settles
    /// anything more. Requeued deliveries stay on their queues.
    pub async fn drain(&self) -> Result<DrainReport> {
        let mut total = DrainReport::default();
        loop {
            let mut round = DrainReport::default();
            for listener in &self.listeners {
                round += listener.drain().await.map_err(|source| AppError::Listener {
                    queue: listener.queue().to_string(),
                    source,
                })?;
            }
            let settled = round.processed();
            total += round;
            if settled == 0 {
                return Ok(total);
            }
        }
    }

    /// Starts one background consumer per queue.
    pub fn spawn_listeners(&self, shutdown: watch::Receiver<bool>) -> RunningListeners {
        let handles = self
            .listeners
            .iter()
            .map(|listener| {
                let queue = listener.queue().to_string();
                (queue, listener.clone().spawn(shutdown.clone()))
            })
            .collect();
        RunningListeners { handles }
    }
}

/// Handles of spawned listeners.
pub struct RunningListeners {
    handles: Vec<(String, JoinHandle<std::result::Result<(), broker::TransportError>>)>,
}

impl RunningListeners {
    /// Waits for every listener to stop, returning the first failure.
    pub async fn join(self) -> Result<()> {
        let (queues, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        let results = futures_util::future::join_all(handles).await;

        let mut first_error = None;
        for (queue, result) in queues.into_iter().zip(results) {
            let err = match result {
                Ok(Ok(())) => continue,
                Ok(Err(source)) => AppError::Listener { queue, source },
                Err(_) => AppError::ListenerTask { queue },
            };
            tracing::error!(error = %err, "Listener ended with an error");
            first_error.get_or_insert(err);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
