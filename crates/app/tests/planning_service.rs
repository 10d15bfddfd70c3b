//! Black-box tests of `PlanningService` over in-memory stores.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use forgeplan_app::{
    BacklogRun, NewEvaluation, NewInventoryItem, NewMachine, NewProductionOrder, NewSupplier,
    PlanningService, Stores,
};
use forgeplan_calendar::Shift;
use forgeplan_core::{CalendarId, CustomerId, DomainError, FixedClock, ItemId, SequentialIdGenerator};
use forgeplan_infra::ForgeplanConfig;
use forgeplan_inventory::StockPolicy;
use forgeplan_production::{Machine, Operation, OrderPriority, OrderStatus, Process, ProductionOrder};
use forgeplan_purchasing::{ProcurementOverrides, PurchaseOrderStatus};
use forgeplan_scheduling::PlanningOptions;

/// 2024-03-04 is a Monday.
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    d(3, day).and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn service_with(config: ForgeplanConfig) -> PlanningService {
    forgeplan_observability::init();
    PlanningService::new(
        Stores::in_memory(),
        config,
        Arc::new(FixedClock::on(today())),
        Arc::new(SequentialIdGenerator::new()),
    )
}

fn service() -> PlanningService {
    service_with(ForgeplanConfig::default())
}

fn machine(service: &PlanningService, name: &str, processes: &[Process], calendar_id: Option<CalendarId>) -> Machine {
    service
        .register_machine(NewMachine {
            name: name.to_string(),
            processes: processes.to_vec(),
            capacity_hours_per_week: 40.0,
            calendar_id,
            location: Some("Hall 2".to_string()),
        })
        .unwrap()
}

fn order(
    service: &PlanningService,
    reference: &str,
    priority: OrderPriority,
    due_date: NaiveDate,
    operations: Vec<Operation>,
) -> ProductionOrder {
    service
        .create_production_order(NewProductionOrder {
            customer_id: CustomerId::new(),
            reference: reference.to_string(),
            due_date,
            priority,
            operations,
            remarks: None,
        })
        .unwrap()
}

fn turning(service: &PlanningService, hours: f64) -> Operation {
    service.build_operation("turn shaft", Process::Turning, hours, 0.0).unwrap()
}

fn steel(service: &PlanningService, on_hand: f64) -> ItemId {
    service
        .register_inventory_item(NewInventoryItem {
            name: "S355 round bar".to_string(),
            unit_of_measure: "kg".to_string(),
            on_hand,
            policy: StockPolicy {
                safety_stock: 80.0,
                reorder_point: 100.0,
                lead_time_days: 5,
            },
        })
        .unwrap()
        .id_typed()
}

fn evaluation(q: f64, d: f64, c: f64) -> NewEvaluation {
    NewEvaluation {
        quality_score: q,
        delivery_reliability_score: d,
        communication_score: c,
        evaluated_on: None,
        notes: String::new(),
    }
}

#[test]
fn schedule_order_defaults_to_today_at_shift_start() -> anyhow::Result<()> {
    let service = service();
    let lathe = machine(&service, "CNC lathe", &[Process::Turning], None);
    let op = turning(&service, 2.0);
    let order = order(&service, "FA-100", OrderPriority::Normal, d(3, 20), vec![op]);

    let summary = service.schedule_order(order.id_typed(), None)?;

    let scheduled = &summary.scheduled_operations[0];
    assert_eq!(scheduled.machine_id, lathe.id());
    assert_eq!((scheduled.start, scheduled.end), (at(4, 6, 0), at(4, 8, 0)));
    assert_eq!(summary.machine_loads[&lathe.id()], 2.0);

    let stored = service.order(order.id_typed())?;
    assert_eq!(stored.status(), OrderStatus::Released);
    assert_eq!(stored.operations()[0].assigned_machine_id(), Some(lathe.id()));

    let upcoming = service.upcoming_operations(0)?;
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].order_id, order.id_typed());
    Ok(())
}

#[test]
fn missing_machine_is_capacity_unavailable_and_leaves_order_unscheduled() {
    let service = service();
    machine(&service, "CNC lathe", &[Process::Turning], None);
    let weld = service.build_operation("weld frame", Process::Welding, 1.5, 0.0).unwrap();
    let order = order(&service, "FA-101", OrderPriority::High, d(3, 20), vec![weld]);

    let err = service.schedule_order(order.id_typed(), None).unwrap_err();

    assert!(matches!(err, DomainError::CapacityUnavailable(_)));
    assert!(service.upcoming_operations(0).unwrap().is_empty());
    assert_eq!(service.order(order.id_typed()).unwrap().status(), OrderStatus::Planned);
}

#[test]
fn sub_minute_operation_is_scheduled() -> anyhow::Result<()> {
    let service = service();
    machine(&service, "CNC lathe", &[Process::Turning], None);
    let tiny = service.build_operation("tiny", Process::Turning, 0.005, 0.0)?;
    let order = order(&service, "FA-102", OrderPriority::Normal, d(3, 20), vec![tiny]);

    let summary = service.schedule_order(order.id_typed(), None)?;

    let scheduled = &summary.scheduled_operations[0];
    assert_eq!((scheduled.start, scheduled.end), (at(4, 6, 0), at(4, 6, 1)));
    assert_eq!(scheduled.working_minutes, 1);
    Ok(())
}

#[test]
fn backlog_puts_high_before_normal_on_equal_due_dates() -> anyhow::Result<()> {
    let service = service();
    machine(&service, "CNC lathe", &[Process::Turning], None);
    let op = turning(&service, 3.0);
    let normal = order(&service, "FA-200", OrderPriority::Normal, d(3, 15), vec![op]);
    let op = turning(&service, 3.0);
    let high = order(&service, "FA-201", OrderPriority::High, d(3, 15), vec![op]);

    let report = service.schedule_backlog(BacklogRun::default())?;

    assert_eq!(report.scheduled_order_ids(), vec![high.id_typed(), normal.id_typed()]);
    let high_start = report.summary(high.id_typed()).unwrap().scheduled_operations[0].start;
    let normal_start = report.summary(normal.id_typed()).unwrap().scheduled_operations[0].start;
    assert!(high_start < normal_start);
    assert!(report.is_complete());

    // A second run starts from a clean session and yields the same plan.
    let rerun = service.schedule_backlog(BacklogRun::default())?;
    assert_eq!(rerun.summary(high.id_typed()).unwrap().scheduled_operations[0].start, high_start);
    Ok(())
}

#[test]
fn backlog_skips_cancelled_orders_and_honours_the_cap() -> anyhow::Result<()> {
    let service = service();
    machine(&service, "CNC lathe", &[Process::Turning], None);
    let op = turning(&service, 1.0);
    let cancelled = order(&service, "FA-300", OrderPriority::Critical, d(3, 10), vec![op]);
    service.update_order_status(cancelled.id_typed(), OrderStatus::Cancelled)?;
    let op = turning(&service, 1.0);
    let low = order(&service, "FA-301", OrderPriority::Low, d(3, 10), vec![op]);
    let op = turning(&service, 1.0);
    let normal = order(&service, "FA-302", OrderPriority::Normal, d(3, 12), vec![op]);

    let report = service.schedule_backlog(BacklogRun {
        max_orders: Some(1),
        ..BacklogRun::default()
    })?;

    assert_eq!(report.scheduled_order_ids(), vec![normal.id_typed()]);
    assert_eq!(service.order(low.id_typed())?.status(), OrderStatus::Planned);
    Ok(())
}

#[test]
fn shift_calendar_changes_reach_live_schedules() -> anyhow::Result<()> {
    let service = service();
    let early = Shift::weekdays_only(
        "early",
        NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    )?;
    let calendar = service.create_shift_calendar("single shift", vec![early], vec![])?;
    machine(&service, "CNC lathe", &[Process::Turning], Some(calendar.id()));

    let op = turning(&service, 10.0);
    let first = order(&service, "FA-400", OrderPriority::Normal, d(3, 20), vec![op]);
    let summary = service.schedule_order(first.id_typed(), None)?;
    assert_eq!(summary.scheduled_operations[0].end, at(5, 8, 0));

    service.add_non_working_day(calendar.id(), d(3, 5))?;

    let op = turning(&service, 1.0);
    let second = order(&service, "FA-401", OrderPriority::Normal, d(3, 20), vec![op]);
    let summary = service.schedule_order(second.id_typed(), None)?;
    assert_eq!(summary.scheduled_operations[0].start, at(6, 6, 0));
    Ok(())
}

#[test]
fn register_machine_requires_a_known_calendar() {
    let service = service();
    let err = service
        .register_machine(NewMachine {
            name: "press brake".to_string(),
            processes: vec![Process::Bending],
            capacity_hours_per_week: 40.0,
            calendar_id: Some(CalendarId::new()),
            location: None,
        })
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn updating_planning_options_clamps_and_resets_schedules() -> anyhow::Result<()> {
    let service = service();
    let lathe = machine(&service, "CNC lathe", &[Process::Turning], None);
    let op = turning(&service, 4.0);
    let first = order(&service, "FA-500", OrderPriority::Normal, d(3, 20), vec![op]);
    service.schedule_order(first.id_typed(), None)?;

    let options = service.update_planning_options(PlanningOptions {
        priority_weight: 0.0,
        setup_time_factor: -1.0,
        ..PlanningOptions::default()
    })?;
    assert_eq!(options.priority_weight, 0.01);
    assert_eq!(options.setup_time_factor, 0.0);

    let op = turning(&service, 1.0);
    let second = order(&service, "FA-501", OrderPriority::Normal, d(3, 20), vec![op]);
    let summary = service.schedule_order(second.id_typed(), None)?;
    assert_eq!(summary.scheduled_operations[0].start, at(4, 6, 0));
    assert_eq!(summary.machine_loads[&lathe.id()], 1.0);
    Ok(())
}

#[test]
fn shortage_report_matches_stock_arithmetic() -> anyhow::Result<()> {
    let service = service();
    let item_id = steel(&service, 180.0);

    let op = service
        .build_operation("saw blanks", Process::Sawing, 1.0, 0.0)?
        .with_material(item_id, 60.0);
    let light = order(&service, "FA-600", OrderPriority::Normal, d(3, 20), vec![op]);
    let report = service.material_shortage_report(light.id_typed(), None, None)?;
    // projected 120 stays above both safety stock and reorder point
    assert!(report.is_empty());

    let op = service
        .build_operation("saw blanks", Process::Sawing, 1.0, 0.0)?
        .with_material(item_id, 150.0);
    let heavy = order(&service, "FA-601", OrderPriority::Normal, d(3, 20), vec![op]);
    let report = service.material_shortage_report(heavy.id_typed(), None, None)?;
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].projected_on_hand, 30.0);
    assert_eq!(report[0].shortage, 50.0);
    assert_eq!(report[0].reorder_recommendation, 70.0);

    let without_safety = service.material_shortage_report(heavy.id_typed(), Some(false), Some(0.5))?;
    assert_eq!(without_safety[0].shortage, 0.0);
    assert_eq!(without_safety[0].reorder_recommendation, 35.0);
    Ok(())
}

#[test]
fn purchase_planning_only_persists_when_auto_creating() -> anyhow::Result<()> {
    let service = service();
    let item_id = steel(&service, 180.0);
    let supplier = service.register_supplier(NewSupplier {
        name: "Stahlhandel Nord".to_string(),
        contact: None,
        processes: vec![],
        material_item_ids: vec![],
    })?;
    service.link_supplier_to_material(supplier.id_typed(), item_id)?;

    let op = service
        .build_operation("saw blanks", Process::Sawing, 1.0, 0.0)?
        .with_material(item_id, 150.0);
    let order = order(&service, "FA-700", OrderPriority::High, d(3, 20), vec![op]);

    let drafts = service.plan_material_purchases(order.id_typed(), &ProcurementOverrides::default())?;
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].status, PurchaseOrderStatus::Planned);
    assert_eq!(drafts[0].quantity, 70.0);
    assert_eq!(drafts[0].supplier_id, supplier.id_typed());
    assert!(service.purchase_orders().is_empty());

    let committed = service.plan_material_purchases(
        order.id_typed(),
        &ProcurementOverrides {
            auto_create: Some(true),
            expedite_days: Some(2),
            ..ProcurementOverrides::default()
        },
    )?;
    assert_eq!(committed[0].status, PurchaseOrderStatus::Open);
    assert_eq!(committed[0].expected_receipt, d(3, 7));
    assert_eq!(service.purchase_orders(), committed);
    Ok(())
}

#[test]
fn supplier_rating_follows_evaluations() -> anyhow::Result<()> {
    let service = service();
    let item_id = steel(&service, 0.0);
    let strong = service.register_supplier(NewSupplier {
        name: "Präzisionsteile GmbH".to_string(),
        contact: None,
        processes: vec![Process::Turning],
        material_item_ids: vec![item_id],
    })?;
    let weak = service.register_supplier(NewSupplier {
        name: "Metall Süd".to_string(),
        contact: None,
        processes: vec![],
        material_item_ids: vec![item_id],
    })?;

    service.record_supplier_evaluation(strong.id_typed(), evaluation(4.5, 4.7, 4.2))?;
    let rated = service.supplier(strong.id_typed())?;
    assert!((rated.rating() - 4.467).abs() < 1e-3);

    let second = service.record_supplier_evaluation(strong.id_typed(), evaluation(4.8, 4.6, 4.9))?;
    assert_eq!(second.evaluated_on, today());
    let rated = service.supplier(strong.id_typed())?;
    assert!((rated.rating() - 4.617).abs() < 1e-3);
    assert_eq!(service.evaluations_for(strong.id_typed()).len(), 2);

    service.record_supplier_evaluation(weak.id_typed(), evaluation(2.0, 2.5, 3.0))?;
    let best = service.recommend_supplier_for_item(item_id).unwrap();
    assert_eq!(best.id_typed(), strong.id_typed());
    assert!(service.recommend_supplier_for_item(ItemId::new()).is_none());
    Ok(())
}

#[test]
fn linking_requires_a_known_item_and_is_idempotent() -> anyhow::Result<()> {
    let service = service();
    let item_id = steel(&service, 10.0);
    let supplier = service.register_supplier(NewSupplier {
        name: "Nord".to_string(),
        contact: None,
        processes: vec![],
        material_item_ids: vec![],
    })?;

    let err = service
        .link_supplier_to_material(supplier.id_typed(), ItemId::new())
        .unwrap_err();
    assert!(err.is_not_found());

    service.link_supplier_to_material(supplier.id_typed(), item_id)?;
    let linked = service.link_supplier_to_material(supplier.id_typed(), item_id)?;
    assert_eq!(linked.material_item_ids(), &[item_id]);
    Ok(())
}

#[test]
fn consuming_materials_is_all_or_nothing() -> anyhow::Result<()> {
    let service = service();
    let plenty = steel(&service, 100.0);
    let scarce = steel(&service, 5.0);

    let op = service
        .build_operation("saw blanks", Process::Sawing, 1.0, 0.0)?
        .with_material(plenty, 30.0);
    let ok = order(&service, "FA-800", OrderPriority::Normal, d(3, 20), vec![op]);
    service.consume_materials(ok.id_typed())?;
    assert_eq!(service.inventory_item(plenty)?.on_hand(), 70.0);

    let op = service
        .build_operation("saw blanks", Process::Sawing, 1.0, 0.0)?
        .with_material(plenty, 10.0)
        .with_material(scarce, 6.0);
    let too_much = order(&service, "FA-801", OrderPriority::Normal, d(3, 20), vec![op]);
    let err = service.consume_materials(too_much.id_typed()).unwrap_err();
    assert!(matches!(err, DomainError::InvariantViolation(_)));
    assert_eq!(service.inventory_item(plenty)?.on_hand(), 70.0);
    assert_eq!(service.inventory_item(scarce)?.on_hand(), 5.0);

    let op = service
        .build_operation("saw blanks", Process::Sawing, 1.0, 0.0)?
        .with_material(ItemId::new(), 1.0);
    let unknown = order(&service, "FA-802", OrderPriority::Normal, d(3, 20), vec![op]);
    assert!(service.consume_materials(unknown.id_typed()).unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn order_lifecycle_is_enforced() -> anyhow::Result<()> {
    let service = service();
    let op = turning(&service, 1.0);
    let order = order(&service, "FA-900", OrderPriority::Normal, d(3, 20), vec![op]);

    let err = service
        .update_order_status(order.id_typed(), OrderStatus::Completed)
        .unwrap_err();
    assert!(matches!(err, DomainError::InvariantViolation(_)));

    service.update_order_status(order.id_typed(), OrderStatus::Released)?;
    let extra = turning(&service, 0.5);
    let updated = service.add_operation_to_order(order.id_typed(), extra)?;
    assert_eq!(updated.operations().len(), 2);
    Ok(())
}

#[test]
fn config_json_drives_the_service() -> anyhow::Result<()> {
    let config = ForgeplanConfig::from_json_str(
        r#"{
            "planning": { "default_start_time": "07:30:00", "auto_release_orders": false },
            "procurement": { "auto_create_orders": true }
        }"#,
    )?;
    let service = service_with(config);
    machine(&service, "CNC lathe", &[Process::Turning], None);
    let op = turning(&service, 1.0);
    let order = order(&service, "FA-950", OrderPriority::Normal, d(3, 20), vec![op]);

    let summary = service.schedule_order(order.id_typed(), None)?;
    assert_eq!(summary.scheduled_operations[0].start, at(4, 7, 30));
    assert_eq!(service.order(order.id_typed())?.status(), OrderStatus::Planned);
    assert!(service.procurement_options()?.auto_create_orders);
    Ok(())
}
