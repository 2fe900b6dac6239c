//! Date-range revenue reports over the projection store.

use chrono::NaiveDate;
use common::OrderStatus;

use crate::aggregation::{ReportSummary, aggregate};
use crate::date_range::DateRangeFilter;
use crate::error::Result;
use crate::projection::ReportOrder;
use crate::store::ReportOrderStore;

/// Answers "what did we sell between these days".
pub struct ReportService<S> {
    store: S,
    filter: DateRangeFilter,
}

impl<S: ReportOrderStore> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            filter: DateRangeFilter,
        }
    }

    /// Summarises READY orders created within `[start_date, end_date]`.
    #[tracing::instrument(skip(self))]
    pub async fn generate_report(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<ReportSummary> {
        let range = self.filter.validate_and_create(start_date, end_date)?;
        let filter = self.filter;

        let orders = self
            .store
            .find_by_predicate(&|order: &ReportOrder| {
                order.status == OrderStatus::Ready && filter.is_within_range(order.created_at, &range)
            })
            .await?;

        let summary = aggregate(&orders);
        tracing::info!(
            orders = summary.total_ready_orders,
            revenue = %summary.total_revenue,
            "Report generated"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use common::{Money, OrderId, ProductId};

    use super::*;
    use crate::error::ReportError;
    use crate::projection::ReportItem;
    use crate::store::InMemoryReportStore;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 5, d)
    }

    async fn seed(store: &InMemoryReportStore, d: u32, h: u32, status: OrderStatus, cents: i64) {
        let at = Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap();
        store
            .save(&ReportOrder {
                order_id: OrderId::new(),
                table_id: 1,
                status,
                created_at: at,
                received_at: at,
                items: vec![ReportItem {
                    product_id: ProductId::new(1),
                    product_name: Some("Burger".into()),
                    quantity: 1,
                    price: Some(Money::from_cents(cents)),
                }],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_report_covers_ready_orders_in_range() {
        let store = InMemoryReportStore::new();
        seed(&store, 1, 0, OrderStatus::Ready, 1000).await;
        seed(&store, 2, 23, OrderStatus::Ready, 200).await;
        seed(&store, 2, 12, OrderStatus::Pending, 5000).await;
        seed(&store, 3, 0, OrderStatus::Ready, 7000).await;
        let service = ReportService::new(store);

        let summary = service.generate_report(day(1), day(2)).await.unwrap();

        assert_eq!(summary.total_ready_orders, 2);
        assert_eq!(summary.total_revenue, Money::from_cents(1200));
    }

    #[tokio::test]
    async fn test_report_rejects_inverted_range() {
        let service = ReportService::new(InMemoryReportStore::new());
        let err = service.generate_report(day(5), day(1)).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidDateRange(_)));
    }

    #[tokio::test]
    async fn test_empty_range_yields_empty_summary() {
        let service = ReportService::new(InMemoryReportStore::new());
        let summary = service.generate_report(day(1), day(1)).await.unwrap();
        assert_eq!(summary, ReportSummary::default());
    }
}
