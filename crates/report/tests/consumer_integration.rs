//! Integration tests: broker → report listeners → projection → report.

use std::sync::Arc;
use std::time::Duration;

use broker::{
    ConsumerGroupConfig, DEATH_REASON_HEADER, ExchangeKind, InMemoryBroker, ListenerContainer,
    Message, RetryPolicy, Topology, Transport, WorkQueueConfig,
};
use chrono::{NaiveDate, TimeZone, Utc};
use common::{FixedClock, Money, OrderId, OrderStatus, ProductId};
use report::{
    InMemoryReportStore, OrderPlacedReportListener, OrderReadyReportListener,
    ReportOrderStore, ReportProcessingService, ReportService,
};
use serde_json::json;

const PLACED_QUEUE: &str = "report.order.placed";
const READY_QUEUE: &str = "report.order.ready";
const DLQ: &str = "report.order.dlq";

struct Harness {
    broker: InMemoryBroker,
    store: InMemoryReportStore,
    placed: ListenerContainer,
    ready: ListenerContainer,
}

async fn harness() -> Harness {
    let broker = InMemoryBroker::new();
    broker
        .declare(&Topology::consumer_group(&ConsumerGroupConfig {
            exchange: "order.exchange".into(),
            dead_letter_exchange: "report.dlx".into(),
            dead_letter_exchange_kind: ExchangeKind::Direct,
            dead_letter_queue: DLQ.into(),
            work_queues: vec![
                WorkQueueConfig {
                    queue: PLACED_QUEUE.into(),
                    binding_key: "order.placed".into(),
                    dead_letter_routing_key: "order.placed".into(),
                },
                WorkQueueConfig {
                    queue: READY_QUEUE.into(),
                    binding_key: "order.ready".into(),
                    dead_letter_routing_key: "order.ready".into(),
                },
            ],
        }))
        .await;

    let store = InMemoryReportStore::new();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap());
    let service = Arc::new(ReportProcessingService::new(store.clone(), Arc::new(clock)));
    let retry = RetryPolicy {
        max_attempts: 2,
        initial_interval: Duration::from_millis(1),
        multiplier: 2.0,
        max_interval: Duration::from_millis(2),
    };

    Harness {
        placed: ListenerContainer::new(
            broker.clone(),
            PLACED_QUEUE,
            Arc::new(OrderPlacedReportListener::new(service.clone())),
            retry,
        ),
        ready: ListenerContainer::new(
            broker.clone(),
            READY_QUEUE,
            Arc::new(OrderReadyReportListener::new(service)),
            retry,
        ),
        broker,
        store,
    }
}

fn placed(order_id: OrderId, version: i64, items: serde_json::Value) -> Message {
    let body = json!({
        "eventId": "5d3c7a8e-1b2f-4c6d-9e0a-7f8b9c0d1e2f",
        "eventType": "order.placed",
        "eventVersion": version,
        "occurredAt": "2024-05-01T12:00:01Z",
        "payload": {
            "orderId": order_id,
            "tableId": 5,
            "createdAt": "2024-05-01T12:00:00Z",
            "items": items
        }
    });
    Message::new(serde_json::to_vec(&body).unwrap())
        .with_header("eventType", "order.placed")
        .with_header("eventVersion", version)
}

fn ready(order_id: OrderId, updated_at: &str) -> Message {
    let body = json!({
        "eventId": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d",
        "eventType": "order.ready",
        "eventVersion": 1,
        "occurredAt": updated_at,
        "payload": {"orderId": order_id, "status": "READY", "updatedAt": updated_at}
    });
    Message::new(serde_json::to_vec(&body).unwrap())
}

fn burger_and_soda() -> serde_json::Value {
    json!([
        {"productId": 1, "quantity": 2, "price": 15.50, "productName": "Burger"},
        {"productId": 2, "quantity": 1, "price": 3.00, "productName": "Soda"}
    ])
}

async fn publish(h: &Harness, routing_key: &str, message: Message) {
    h.broker
        .publish("order.exchange", routing_key, message)
        .await
        .unwrap();
}

#[tokio::test]
async fn placed_event_creates_pending_projection_with_items() {
    let h = harness().await;
    let order_id = OrderId::new();
    publish(&h, "order.placed", placed(order_id, 1, burger_and_soda())).await;

    h.placed.drain().await.unwrap();

    let order = h.store.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].price, Some(Money::from_decimal(15.50)));
    assert_eq!(order.total(), Money::from_cents(3400));
}

#[tokio::test]
async fn duplicate_placed_is_idempotent() {
    let h = harness().await;
    let order_id = OrderId::new();
    publish(&h, "order.placed", placed(order_id, 1, burger_and_soda())).await;
    publish(&h, "order.placed", placed(order_id, 1, burger_and_soda())).await;

    let report = h.placed.drain().await.unwrap();

    assert_eq!(report.acked, 2);
    assert_eq!(h.store.len().await, 1);
    let order = h.store.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.items.len(), 2);
}

#[tokio::test]
async fn version_two_is_dead_lettered_from_both_queues() {
    let h = harness().await;
    publish(&h, "order.placed", placed(OrderId::new(), 2, burger_and_soda())).await;
    let body = json!({"eventType": "order.ready", "eventVersion": 2,
        "payload": {"orderId": OrderId::new(), "status": "READY"}});
    publish(&h, "order.ready", Message::new(serde_json::to_vec(&body).unwrap())).await;

    assert_eq!(h.placed.drain().await.unwrap().rejected, 1);
    assert_eq!(h.ready.drain().await.unwrap().rejected, 1);

    assert!(h.store.is_empty().await);
    let dead = h.broker.messages(DLQ).await.unwrap();
    let keys: Vec<_> = dead.iter().map(|d| d.routing_key.as_str()).collect();
    assert_eq!(keys, vec!["order.placed", "order.ready"]);
    assert!(
        dead.iter()
            .all(|d| d.message.header_str(DEATH_REASON_HEADER) == Some("rejected"))
    );
}

#[tokio::test]
async fn out_of_range_price_is_rejected_and_report_still_aggregates() {
    let h = harness().await;
    let bad = OrderId::new();
    let good = OrderId::new();
    publish(
        &h,
        "order.placed",
        placed(bad, 1, json!([{"productId": 1, "quantity": 2, "price": 1e17}])),
    )
    .await;
    publish(&h, "order.placed", placed(good, 1, burger_and_soda())).await;
    publish(&h, "order.ready", ready(bad, "2024-05-01T12:20:00Z")).await;
    publish(&h, "order.ready", ready(good, "2024-05-01T12:25:00Z")).await;

    let placed_report = h.placed.drain().await.unwrap();
    assert_eq!(placed_report.rejected, 1);
    assert_eq!(placed_report.acked, 1);
    h.ready.drain().await.unwrap();

    let dead = h.broker.messages(DLQ).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(
        dead[0].message.header_str(DEATH_REASON_HEADER),
        Some("rejected")
    );

    // The rejected order only exists as an itemless stub from its ready event.
    let stub = h.store.find_by_id(bad).await.unwrap().unwrap();
    assert!(stub.is_stub());

    let day = NaiveDate::from_ymd_opt(2024, 5, 1);
    let summary = ReportService::new(h.store.clone())
        .generate_report(day, day)
        .await
        .unwrap();
    assert_eq!(summary.total_ready_orders, 2);
    assert_eq!(summary.total_revenue, Money::from_cents(3400));
}

#[tokio::test]
async fn ready_before_placed_leaves_stub_without_items() {
    let h = harness().await;
    let order_id = OrderId::new();
    publish(&h, "order.ready", ready(order_id, "2024-05-01T12:30:00Z")).await;
    publish(&h, "order.placed", placed(order_id, 1, burger_and_soda())).await;

    h.ready.drain().await.unwrap();
    h.placed.drain().await.unwrap();

    let order = h.store.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Ready);
    assert_eq!(order.table_id, 0);
    assert!(order.items.is_empty());
    assert_eq!(
        order.created_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    );
}

#[tokio::test]
async fn store_outage_dead_letters_after_retries() {
    let h = harness().await;
    h.store.set_unavailable(true);
    publish(&h, "order.placed", placed(OrderId::new(), 1, burger_and_soda())).await;

    let report = h.placed.drain().await.unwrap();

    assert_eq!(report.retries_exhausted, 1);
    let dead = h.broker.messages(DLQ).await.unwrap();
    assert_eq!(
        dead[0].message.header_str(DEATH_REASON_HEADER),
        Some("expired-retries")
    );
}

#[tokio::test]
async fn ready_orders_feed_the_revenue_report() {
    let h = harness().await;
    let first = OrderId::new();
    let second = OrderId::new();
    let pending = OrderId::new();

    publish(&h, "order.placed", placed(first, 1, burger_and_soda())).await;
    publish(
        &h,
        "order.placed",
        placed(
            second,
            1,
            json!([{"productId": 1, "quantity": 1, "price": 15.50, "productName": "Burger"}]),
        ),
    )
    .await;
    publish(&h, "order.placed", placed(pending, 1, burger_and_soda())).await;
    publish(&h, "order.ready", ready(first, "2024-05-01T12:20:00Z")).await;
    publish(&h, "order.ready", ready(second, "2024-05-01T12:25:00Z")).await;

    h.placed.drain().await.unwrap();
    h.ready.drain().await.unwrap();

    let reports = ReportService::new(h.store.clone());
    let may_first = NaiveDate::from_ymd_opt(2024, 5, 1);
    let summary = reports.generate_report(may_first, may_first).await.unwrap();

    assert_eq!(summary.total_ready_orders, 2);
    assert_eq!(summary.total_revenue, Money::from_decimal(49.50));
    let burger = &summary.product_breakdown[0];
    assert_eq!(burger.product_id, ProductId::new(1));
    assert_eq!(burger.quantity_sold, 3);
    assert_eq!(burger.product_name.as_deref(), Some("Burger"));

    let next_day = NaiveDate::from_ymd_opt(2024, 5, 2);
    let empty = reports.generate_report(next_day, next_day).await.unwrap();
    assert_eq!(empty.total_ready_orders, 0);
}
