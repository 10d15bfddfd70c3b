//! Turns material shortages into purchase-order drafts.

use chrono::Days;

use forgeplan_core::{Clock, IdGenerator, PurchaseOrderId};
use forgeplan_production::ProductionOrder;

use crate::options::ProcurementOptions;
use crate::order::{PurchaseOrder, PurchaseOrderStatus};
use crate::shortage::{MaterialCatalog, analyze_shortages};

/// Plan purchases covering every shortage of `order`.
///
/// Unknown items and items nobody supplies are skipped. Drafts are `Open`
/// when `auto_create_orders` is set, `Planned` otherwise; nothing is stored.
pub fn plan_purchases<C: MaterialCatalog + ?Sized>(
    catalog: &C,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
    order: &ProductionOrder,
    options: &ProcurementOptions,
) -> Vec<PurchaseOrder> {
    let today = clock.today();
    let status = if options.auto_create_orders {
        PurchaseOrderStatus::Open
    } else {
        PurchaseOrderStatus::Planned
    };

    let mut planned = Vec::new();
    for shortage in analyze_shortages(catalog, order, options) {
        if shortage.reorder_recommendation <= 0.0 && shortage.shortage <= 0.0 {
            continue;
        }
        let Some(item) = catalog.item(shortage.item_id) else {
            tracing::debug!(item = %shortage.item_id, "skipping purchase for unknown item");
            continue;
        };
        let supplier = shortage
            .recommended_supplier_id
            .and_then(|id| catalog.supplier(id))
            .or_else(|| catalog.recommend_supplier(item.id_typed()));
        let Some(supplier) = supplier else {
            tracing::debug!(item = %item.name(), "no supplier linked, skipping purchase");
            continue;
        };

        let mut lead_time = match item.lead_time_days() {
            0 => options.default_lead_time_days,
            days => days,
        }
        .max(1);
        if order.priority().is_urgent() && options.expedite_high_priority_days > 0 {
            lead_time = lead_time
                .saturating_sub(options.expedite_high_priority_days)
                .max(1);
        }
        let expected_receipt = today
            .checked_add_days(Days::new(u64::from(lead_time)))
            .unwrap_or(today);

        let purchase = PurchaseOrder {
            id: PurchaseOrderId::from_uuid(ids.next_uuid()),
            supplier_id: supplier.id_typed(),
            supplier_name: supplier.name().to_string(),
            item_id: item.id_typed(),
            quantity: shortage.reorder_recommendation.max(shortage.shortage),
            expected_receipt,
            status,
            created_at: clock.now(),
            notes: format!("planned for production order {}", order.reference()),
        };
        tracing::debug!(
            item = %item.name(),
            supplier = %purchase.supplier_name,
            quantity = purchase.quantity,
            expected = %purchase.expected_receipt,
            "purchase planned"
        );
        planned.push(purchase);
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Catalog, item, order_requiring, supplier};
    use chrono::NaiveDate;
    use forgeplan_core::{FixedClock, ItemId, SequentialIdGenerator};
    use forgeplan_production::OrderPriority;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn plan(catalog: &Catalog, order: &ProductionOrder, options: &ProcurementOptions) -> Vec<PurchaseOrder> {
        plan_purchases(catalog, &SequentialIdGenerator::new(), &FixedClock::on(today()), order, options)
    }

    #[test]
    fn draft_covers_larger_of_shortage_and_recommendation() {
        let steel = item("steel", 180.0, 80.0, 100.0, 5);
        let steel_id = steel.id_typed();
        let vendor = supplier("Stahlhandel Nord", &[steel_id], 4.2);
        let order = order_requiring(OrderPriority::Normal, &[(steel_id, 150.0)]);
        let catalog = Catalog::new(vec![steel], vec![vendor]);

        let drafts = plan(&catalog, &order, &ProcurementOptions::default());
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.quantity, 70.0);
        assert_eq!(draft.status, PurchaseOrderStatus::Planned);
        assert_eq!(draft.expected_receipt, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(draft.supplier_name, "Stahlhandel Nord");
        assert!(draft.notes.contains("FA-2024-017"));
        assert!(!draft.is_committed());
    }

    #[test]
    fn auto_create_marks_drafts_open() {
        let steel = item("steel", 10.0, 20.0, 0.0, 3);
        let steel_id = steel.id_typed();
        let catalog = Catalog::new(vec![steel], vec![supplier("Nord", &[steel_id], 4.0)]);
        let order = order_requiring(OrderPriority::Normal, &[(steel_id, 5.0)]);
        let options = ProcurementOptions {
            auto_create_orders: true,
            ..ProcurementOptions::default()
        };

        let drafts = plan(&catalog, &order, &options);
        assert_eq!(drafts[0].status, PurchaseOrderStatus::Open);
        assert_eq!(drafts[0].quantity, 15.0);
    }

    #[test]
    fn urgent_orders_are_expedited_but_never_below_one_day() {
        let steel = item("steel", 0.0, 10.0, 0.0, 4);
        let steel_id = steel.id_typed();
        let catalog = Catalog::new(vec![steel], vec![supplier("Nord", &[steel_id], 4.0)]);
        let options = ProcurementOptions {
            expedite_high_priority_days: 2,
            ..ProcurementOptions::default()
        };

        let high = order_requiring(OrderPriority::High, &[(steel_id, 1.0)]);
        assert_eq!(plan(&catalog, &high, &options)[0].expected_receipt, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());

        let normal = order_requiring(OrderPriority::Normal, &[(steel_id, 1.0)]);
        assert_eq!(plan(&catalog, &normal, &options)[0].expected_receipt, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());

        let options = ProcurementOptions {
            expedite_high_priority_days: 10,
            ..ProcurementOptions::default()
        };
        let critical = order_requiring(OrderPriority::Critical, &[(steel_id, 1.0)]);
        assert_eq!(plan(&catalog, &critical, &options)[0].expected_receipt, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn missing_lead_time_falls_back_to_default_then_one_day() {
        let steel = item("steel", 0.0, 10.0, 0.0, 0);
        let steel_id = steel.id_typed();
        let catalog = Catalog::new(vec![steel], vec![supplier("Nord", &[steel_id], 4.0)]);
        let order = order_requiring(OrderPriority::Normal, &[(steel_id, 1.0)]);

        let drafts = plan(&catalog, &order, &ProcurementOptions::default());
        assert_eq!(drafts[0].expected_receipt, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());

        let options = ProcurementOptions {
            default_lead_time_days: 14,
            ..ProcurementOptions::default()
        };
        let drafts = plan(&catalog, &order, &options);
        assert_eq!(drafts[0].expected_receipt, NaiveDate::from_ymd_opt(2024, 3, 18).unwrap());
    }

    #[test]
    fn unknown_items_and_unsourced_items_are_skipped() {
        let steel = item("steel", 0.0, 10.0, 0.0, 2);
        let steel_id = steel.id_typed();
        let catalog = Catalog::new(vec![steel], vec![]);
        let order = order_requiring(OrderPriority::Normal, &[(steel_id, 5.0), (ItemId::new(), 3.0)]);

        assert!(plan(&catalog, &order, &ProcurementOptions::default()).is_empty());
    }
}
