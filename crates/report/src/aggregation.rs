//! Revenue and quantity summary over report projections.
//!
//! [`aggregate`] is a pure function: no I/O, no clock, output fully
//! determined by the input slice.

use common::{Money, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};

use crate::projection::ReportOrder;

/// Per-product totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub quantity_sold: u64,
    pub total_accumulated: Money,
}

/// Totals over READY orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_ready_orders: usize,
    pub total_revenue: Money,
    /// One entry per product, in the order products were first seen.
    pub product_breakdown: Vec<ProductSummary>,
}

/// Folds READY orders into a summary.
///
/// Orders in any other status are ignored. A missing price counts as zero.
/// The breakdown keeps first-seen product order and takes the product name
/// from the first item seen for that product.
pub fn aggregate(orders: &[ReportOrder]) -> ReportSummary {
    let mut summary = ReportSummary::default();

    for order in orders.iter().filter(|o| o.status == OrderStatus::Ready) {
        summary.total_ready_orders += 1;

        for item in &order.items {
            let line = item.line_total();
            summary.total_revenue += line;

            match summary
                .product_breakdown
                .iter_mut()
                .find(|p| p.product_id == item.product_id)
            {
                Some(product) => {
                    product.quantity_sold += u64::from(item.quantity);
                    product.total_accumulated += line;
                }
                None => summary.product_breakdown.push(ProductSummary {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    quantity_sold: u64::from(item.quantity),
                    total_accumulated: line,
                }),
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use common::OrderId;
    use proptest::prelude::*;

    use super::*;
    use crate::projection::ReportItem;

    fn item(product: i64, name: &str, quantity: u32, cents: Option<i64>) -> ReportItem {
        ReportItem {
            product_id: ProductId::new(product),
            product_name: Some(name.to_string()),
            quantity,
            price: cents.map(Money::from_cents),
        }
    }

    fn order(status: OrderStatus, items: Vec<ReportItem>) -> ReportOrder {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ReportOrder {
            order_id: OrderId::new(),
            table_id: 1,
            status,
            created_at: at,
            received_at: at,
            items,
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(aggregate(&[]), ReportSummary::default());
    }

    #[test]
    fn test_only_ready_orders_count() {
        let orders = vec![
            order(OrderStatus::Ready, vec![item(1, "Burger", 2, Some(1550))]),
            order(OrderStatus::Ready, vec![item(2, "Soda", 1, Some(300))]),
            order(OrderStatus::Pending, vec![item(1, "Burger", 10, Some(1550))]),
        ];

        let summary = aggregate(&orders);

        assert_eq!(summary.total_ready_orders, 2);
        assert_eq!(summary.total_revenue, Money::from_cents(3400));
    }

    #[test]
    fn test_two_ready_orders_revenue() {
        let orders = vec![
            order(
                OrderStatus::Ready,
                vec![item(1, "Burger", 2, Some(1550)), item(2, "Soda", 1, Some(300))],
            ),
            order(OrderStatus::Ready, vec![item(1, "Burger", 1, Some(1550))]),
        ];

        let summary = aggregate(&orders);

        assert_eq!(summary.total_ready_orders, 2);
        assert_eq!(summary.total_revenue, Money::from_decimal(49.50));
        let burger = &summary.product_breakdown[0];
        assert_eq!(burger.product_id, ProductId::new(1));
        assert_eq!(burger.quantity_sold, 3);
        assert_eq!(burger.total_accumulated, Money::from_cents(4650));
    }

    #[test]
    fn test_extreme_amounts_saturate_instead_of_overflowing() {
        let orders = vec![
            order(OrderStatus::Ready, vec![item(1, "Gold", u32::MAX, Some(i64::MAX / 2))]),
            order(OrderStatus::Ready, vec![item(1, "Gold", 2, Some(i64::MAX / 2))]),
        ];

        let summary = aggregate(&orders);

        assert_eq!(summary.total_revenue, Money::from_cents(i64::MAX));
        assert_eq!(
            summary.product_breakdown[0].total_accumulated,
            Money::from_cents(i64::MAX)
        );
        assert_eq!(summary.product_breakdown[0].quantity_sold, u64::from(u32::MAX) + 2);
    }

    #[test]
    fn test_breakdown_is_first_seen_order_with_first_name() {
        let orders = vec![
            order(OrderStatus::Ready, vec![item(9, "Fries", 1, Some(400))]),
            order(
                OrderStatus::Ready,
                vec![item(3, "Salad", 1, Some(800)), item(9, "Chips", 2, Some(400))],
            ),
        ];

        let summary = aggregate(&orders);

        let ids: Vec<_> = summary.product_breakdown.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![ProductId::new(9), ProductId::new(3)]);
        assert_eq!(summary.product_breakdown[0].product_name.as_deref(), Some("Fries"));
        assert_eq!(summary.product_breakdown[0].quantity_sold, 3);
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let orders = vec![order(
            OrderStatus::Ready,
            vec![item(1, "Mystery", 4, None), item(2, "Soda", 1, Some(300))],
        )];

        let summary = aggregate(&orders);

        assert_eq!(summary.total_revenue, Money::from_cents(300));
        assert_eq!(summary.product_breakdown[0].quantity_sold, 4);
        assert!(summary.product_breakdown[0].total_accumulated.is_zero());
    }

    #[test]
    fn test_ready_stub_counts_as_order_without_revenue() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let stub = ReportOrder::ready_stub(OrderId::new(), at, at);

        let summary = aggregate(&[stub]);

        assert_eq!(summary.total_ready_orders, 1);
        assert!(summary.total_revenue.is_zero());
        assert!(summary.product_breakdown.is_empty());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let orders = vec![order(OrderStatus::Ready, vec![item(1, "Burger", 1, Some(1550))])];
        let json = serde_json::to_value(aggregate(&orders)).unwrap();

        assert_eq!(json["totalReadyOrders"], 1);
        assert_eq!(json["totalRevenue"], 15.5);
        assert_eq!(json["productBreakdown"][0]["quantitySold"], 1);
    }

    fn arb_status() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::InPreparation),
            Just(OrderStatus::Ready),
        ]
    }

    fn arb_item() -> impl Strategy<Value = ReportItem> {
        (1i64..6, 1u32..10, proptest::option::of(0i64..5000)).prop_map(|(id, qty, cents)| {
            item(id, &format!("product-{id}"), qty, cents)
        })
    }

    fn arb_orders() -> impl Strategy<Value = Vec<ReportOrder>> {
        proptest::collection::vec(
            (arb_status(), proptest::collection::vec(arb_item(), 0..5))
                .prop_map(|(status, items)| order(status, items)),
            0..20,
        )
    }

    proptest! {
        #[test]
        fn prop_ready_count_matches_filter(orders in arb_orders()) {
            let expected = orders.iter().filter(|o| o.status == OrderStatus::Ready).count();
            prop_assert_eq!(aggregate(&orders).total_ready_orders, expected);
        }

        #[test]
        fn prop_revenue_equals_sum_of_ready_items(orders in arb_orders()) {
            let expected: Money = orders
                .iter()
                .filter(|o| o.status == OrderStatus::Ready)
                .flat_map(|o| o.items.iter())
                .map(ReportItem::line_total)
                .sum();
            prop_assert_eq!(aggregate(&orders).total_revenue, expected);
        }

        #[test]
        fn prop_breakdown_sums_to_revenue(orders in arb_orders()) {
            let summary = aggregate(&orders);
            let from_breakdown: Money = summary
                .product_breakdown
                .iter()
                .map(|p| p.total_accumulated)
                .sum();
            prop_assert_eq!(from_breakdown, summary.total_revenue);
        }

        #[test]
        fn prop_breakdown_has_unique_products(orders in arb_orders()) {
            let summary = aggregate(&orders);
            let mut ids: Vec<_> = summary.product_breakdown.iter().map(|p| p.product_id).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }

        #[test]
        fn prop_non_ready_orders_do_not_affect_result(orders in arb_orders()) {
            let ready: Vec<_> = orders
                .iter()
                .filter(|o| o.status == OrderStatus::Ready)
                .cloned()
                .collect();
            prop_assert_eq!(aggregate(&orders), aggregate(&ready));
        }
    }
}
