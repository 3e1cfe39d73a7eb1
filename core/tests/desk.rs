//! Settlement boundary tests: the desk against an in-memory store.
//!
//! Verifies the side-effect contract around a rendition:
//! 1. The rendition is persisted with its findings and status
//! 2. The register balance becomes the counted amount
//! 3. Alerts follow their own band, independent of approval
//! 4. Malformed submissions write nothing
//! 5. A write failing mid-settlement rolls back every earlier write
//! 6. Incentive reports read goals and sales through the store

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use walker_core::{
    alert::{AlertReason, RenditionAlert},
    desk::{IncentiveDesk, RenditionDesk},
    engine::Engine,
    error::{EngineError, EngineResult},
    event::EngineEvent,
    metrics::RenditionMetrics,
    model::{BusinessUnit, CashRegister, Goal, PaymentMethod, TransactionRecord},
    rendition::{RenditionStatus, RenditionSubmission},
    money::Money,
    source::{
        AlertSink, EventSink, GoalSource, RegisterSource, RenditionRecord, RenditionSink,
        TransactionSource,
    },
    store::EngineStore,
};

const DAY: &str = "2024-07-15";

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn day() -> NaiveDate {
    DAY.parse().unwrap()
}

fn txn(id: &str, amount: Decimal, method: PaymentMethod, when: &str) -> TransactionRecord {
    TransactionRecord {
        id: id.into(),
        business_unit_id: "BU-1".into(),
        cash_register_id: Some("REG-1".into()),
        amount,
        payment_method: method,
        occurred_at: at(when),
    }
}

/// Store seeded with a 50,000 float, two cash sales and one card sale.
fn seeded_store() -> EngineStore {
    let store = EngineStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    for (id, company) in [("BU-1", "ACME"), ("BU-2", "ACME"), ("BU-X", "OTHER")] {
        store
            .insert_business_unit(&BusinessUnit {
                id: id.into(),
                company_id: company.into(),
                name: format!("Unit {id}"),
            })
            .unwrap();
    }
    store
        .insert_register(&CashRegister {
            id: "REG-1".into(),
            business_unit_id: "BU-1".into(),
            name: "Caja 1".into(),
            initial_amount: dec!(50000),
            current_amount: dec!(50000),
        })
        .unwrap();
    store
        .insert_transactions(&[
            txn("t1", dec!(20000), PaymentMethod::Cash, "2024-07-15T10:00:00Z"),
            txn("t2", dec!(15000), PaymentMethod::Cash, "2024-07-15T12:30:00Z"),
            txn("t3", dec!(10000), PaymentMethod::Debit, "2024-07-15T15:00:00Z"),
            txn("t4", dec!(99999), PaymentMethod::Cash, "2024-07-14T15:00:00Z"),
        ])
        .unwrap();
    store
}

fn submission(actual: Decimal) -> RenditionSubmission {
    RenditionSubmission {
        cash_register_id: "REG-1".into(),
        business_unit_id: "BU-1".into(),
        cashier_id: "CASHIER-7".into(),
        actual_amount: Some(actual),
        breakdown: None,
        notes: Some("closing".into()),
    }
}

fn now() -> DateTime<Utc> {
    at("2024-07-15T23:00:00Z")
}

// ─────────────────────────────────────────────────────────────────────────────
// Renditions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn clean_rendition_is_persisted_and_balance_updated() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let desk = RenditionDesk::new(&engine, &store);

    let outcome = desk.submit(&submission(dec!(85000)), day(), now()).unwrap();

    assert_eq!(outcome.evaluation.expected.expected_amount, dec!(85000));
    assert!(outcome.evaluation.result.auto_approved);
    assert!(!outcome.alert_raised());
    assert_eq!(store.register("REG-1").unwrap().current_amount, dec!(85000));

    let saved = store.renditions_for_unit("BU-1", day(), day()).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].rendition_id, outcome.rendition_id);
    assert_eq!(saved[0].status, RenditionStatus::AutoApproved);
    assert_eq!(saved[0].result, outcome.evaluation.result);
    assert_eq!(saved[0].notes.as_deref(), Some("closing"));
    assert!(store.alerts_for_register("REG-1").unwrap().is_empty());
}

#[test]
fn large_shortfall_is_pending_and_alerted() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let desk = RenditionDesk::new(&engine, &store);

    let outcome = desk.submit(&submission(dec!(83500)), day(), now()).unwrap();
    let result = &outcome.evaluation.result;

    assert_eq!(result.discrepancy_messages(), vec!["large difference: -1500".to_string()]);
    assert!(!result.auto_approved);
    assert_eq!(
        outcome.evaluation.alert,
        Some(AlertReason::DiscrepanciesAndDifference)
    );

    let alerts = store.alerts_for_register("REG-1").unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(Some(alerts[0].alert_id.clone()), outcome.alert_id);
    assert_eq!(alerts[0].difference_amount, dec!(-1500));
    assert_eq!(alerts[0].messages, vec!["large difference: -1500".to_string()]);

    let saved = store.renditions_for_unit("BU-1", day(), day()).unwrap();
    assert_eq!(saved[0].status, RenditionStatus::PendingReview);
    assert!(saved[0].alerted);
    // The count is what the till holds now, approved or not.
    assert_eq!(store.register("REG-1").unwrap().current_amount, dec!(83500));
}

#[test]
fn difference_of_600_alerts_without_any_finding() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let outcome = RenditionDesk::new(&engine, &store)
        .submit(&submission(dec!(84400)), day(), now())
        .unwrap();

    assert!(outcome.evaluation.result.is_clean());
    assert!(!outcome.evaluation.result.auto_approved);
    assert_eq!(
        outcome.evaluation.alert,
        Some(AlertReason::DifferenceAboveThreshold)
    );
    assert!(outcome.alert_raised());
}

#[test]
fn difference_of_300_needs_review_but_does_not_alert() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let outcome = RenditionDesk::new(&engine, &store)
        .submit(&submission(dec!(85300)), day(), now())
        .unwrap();

    assert!(!outcome.evaluation.result.auto_approved);
    assert!(!outcome.alert_raised());
}

#[test]
fn events_are_logged_for_every_write() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let outcome = RenditionDesk::new(&engine, &store)
        .submit(&submission(dec!(83500)), day(), now())
        .unwrap();

    let logged: Vec<EngineEvent> = store
        .events()
        .unwrap()
        .iter()
        .map(|e| e.decode().unwrap())
        .collect();
    assert_eq!(logged, outcome.events);
    assert_eq!(store.event_count("rendition_validated").unwrap(), 1);
    assert_eq!(store.event_count("register_balance_updated").unwrap(), 1);
    assert_eq!(store.event_count("rendition_alert_raised").unwrap(), 1);
    assert!(matches!(
        &logged[1],
        EngineEvent::RegisterBalanceUpdated { previous_amount, new_amount, .. }
            if *previous_amount == dec!(50000) && *new_amount == dec!(83500)
    ));
}

#[test]
fn malformed_submission_writes_nothing() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let desk = RenditionDesk::new(&engine, &store);

    let mut sub = submission(dec!(85000));
    sub.actual_amount = None;
    assert!(matches!(
        desk.submit(&sub, day(), now()),
        Err(EngineError::Validation { .. })
    ));

    let mut sub = submission(dec!(85000));
    sub.business_unit_id = "BU-2".into();
    assert!(matches!(
        desk.submit(&sub, day(), now()),
        Err(EngineError::Validation { .. })
    ));

    assert!(store.renditions_for_unit("BU-1", day(), day()).unwrap().is_empty());
    assert!(store.events().unwrap().is_empty());
    assert_eq!(store.register("REG-1").unwrap().current_amount, dec!(50000));
}

#[test]
fn unknown_register_is_not_found() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let mut sub = submission(dec!(1));
    sub.cash_register_id = "REG-404".into();
    assert!(matches!(
        RenditionDesk::new(&engine, &store).submit(&sub, day(), now()),
        Err(EngineError::NotFound { .. })
    ));
}

/// The store with an alert channel that always fails.
struct AlertsDown<'a>(&'a EngineStore);

impl TransactionSource for AlertsDown<'_> {
    fn transactions_for_register(
        &self,
        register_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> EngineResult<Vec<TransactionRecord>> {
        self.0.transactions_for_register(register_id, from, to, offset)
    }

    fn transactions_for_unit(
        &self,
        business_unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> EngineResult<Vec<TransactionRecord>> {
        self.0.transactions_for_unit(business_unit_id, from, to, offset)
    }
}

impl RegisterSource for AlertsDown<'_> {
    fn register(&self, register_id: &str) -> EngineResult<CashRegister> {
        self.0.register(register_id)
    }
}

impl RenditionSink for AlertsDown<'_> {
    fn record_rendition(&self, record: &RenditionRecord) -> EngineResult<()> {
        self.0.record_rendition(record)
    }

    fn update_register_balance(&self, register_id: &str, amount: Money) -> EngineResult<()> {
        self.0.update_register_balance(register_id, amount)
    }

    fn atomically<T, F>(&self, work: F) -> EngineResult<T>
    where
        F: FnOnce() -> EngineResult<T>,
    {
        self.0.atomically(work)
    }
}

impl AlertSink for AlertsDown<'_> {
    fn raise_alert(&self, _alert: &RenditionAlert) -> EngineResult<()> {
        Err(EngineError::validation("alert", "channel unavailable"))
    }
}

impl EventSink for AlertsDown<'_> {
    fn append_event(
        &self,
        source: &str,
        recorded_at: DateTime<Utc>,
        event: &EngineEvent,
    ) -> EngineResult<()> {
        self.0.append_event(source, recorded_at, event)
    }
}

#[test]
fn failed_alert_rolls_back_rendition_and_balance() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let failing = AlertsDown(&store);

    let err = RenditionDesk::new(&engine, &failing)
        .submit(&submission(dec!(75000)), day(), now())
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "alert"));

    assert!(store.renditions_for_unit("BU-1", day(), day()).unwrap().is_empty());
    assert_eq!(store.register("REG-1").unwrap().current_amount, dec!(50000));
    assert!(store.events().unwrap().is_empty());
    assert!(store.alerts_for_register("REG-1").unwrap().is_empty());

    // A retry once the channel is back stores exactly one rendition.
    RenditionDesk::new(&engine, &store)
        .submit(&submission(dec!(75000)), day(), now())
        .unwrap();
    assert_eq!(store.renditions_for_unit("BU-1", day(), day()).unwrap().len(), 1);
    assert_eq!(store.register("REG-1").unwrap().current_amount, dec!(75000));
}

#[test]
fn metrics_roll_up_persisted_renditions() {
    let store = seeded_store();
    let engine = Engine::with_defaults();
    let desk = RenditionDesk::new(&engine, &store);
    desk.submit(&submission(dec!(85000)), day(), now()).unwrap();
    desk.submit(&submission(dec!(83500)), day(), now()).unwrap();
    desk.submit(&submission(dec!(85300)), day(), now()).unwrap();

    let records = store.renditions_for_unit("BU-1", day(), day()).unwrap();
    let m = RenditionMetrics::compute("BU-1", &records).unwrap();

    assert_eq!(m.total_renditions, 3);
    assert_eq!(m.auto_approved, 1);
    assert_eq!(m.pending_review, 2);
    assert_eq!(m.alerted, 1);
    assert_eq!(m.with_discrepancies, 1);
    assert_eq!(m.gross_difference, dec!(1800));
    assert_eq!(m.net_difference, dec!(-1200));
    assert_eq!(m.largest_shortfall, dec!(1500));
}

// ─────────────────────────────────────────────────────────────────────────────
// Store round-trips used by the desk
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn register_transactions_are_read_by_local_day() {
    let store = seeded_store();
    let offset = Engine::with_defaults().offset();
    let rows = store
        .transactions_for_register("REG-1", day(), day(), offset)
        .unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    assert_eq!(rows[2].payment_method, PaymentMethod::Debit);
    assert_eq!(rows[0].amount, dec!(20000));
}

#[test]
fn failed_batch_import_leaves_no_rows() {
    let store = seeded_store();
    let before = store.transaction_count().unwrap();
    // Second record reuses an existing id.
    let batch = [
        txn("t9", dec!(1), PaymentMethod::Cash, "2024-07-16T10:00:00Z"),
        txn("t1", dec!(1), PaymentMethod::Cash, "2024-07-16T10:00:00Z"),
    ];
    assert!(store.insert_transactions(&batch).is_err());
    assert_eq!(store.transaction_count().unwrap(), before);
}

// ─────────────────────────────────────────────────────────────────────────────
// Incentives
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn incentive_report_reads_company_goals_only() {
    let store = seeded_store();
    for (unit, period, target) in [
        ("BU-1", "2024-07", dec!(40000)),
        ("BU-2", "2024-07", dec!(1000)),
        ("BU-1", "2024-06", dec!(1000)),
        ("BU-X", "2024-07", dec!(1)),
    ] {
        store
            .upsert_goal(&Goal {
                business_unit_id: unit.into(),
                period_key: period.parse().unwrap(),
                target_amount: target,
                bonus_percentage: dec!(5),
            })
            .unwrap();
    }
    store
        .insert_transactions(&[TransactionRecord {
            id: "june".into(),
            business_unit_id: "BU-1".into(),
            cash_register_id: None,
            amount: dec!(2000),
            payment_method: PaymentMethod::Transfer,
            occurred_at: at("2024-06-20T12:00:00Z"),
        }])
        .unwrap();

    let engine = Engine::with_defaults();
    let report = IncentiveDesk::new(&engine, &store)
        .report(&"ACME".to_string(), at("2024-07-20T12:00:00Z"))
        .unwrap();

    assert_eq!(report.progress.len(), 3, "BU-X belongs to another company");
    // July BU-1: 20000 + 15000 + 10000 on the 15th, 99999 on the 14th.
    let july_bu1 = report
        .progress
        .iter()
        .find(|p| p.business_unit_id == "BU-1" && p.period_key.to_string() == "2024-07")
        .unwrap();
    assert_eq!(july_bu1.actual_amount, dec!(144999));
    assert!(july_bu1.achieved);
    assert_eq!(july_bu1.bonus_amount, dec!(7249.95));

    assert_eq!(report.summary.goals_met, 1);
    assert_eq!(report.summary.bonuses_pending, 1);
    // June BU-1: 2000 of 1000 → 100 paid.
    assert_eq!(report.summary.total_bonuses_paid, dec!(100));
    assert_eq!(store.event_count("goal_achieved").unwrap(), 1);
}

#[test]
fn goal_upsert_replaces_existing_target() {
    let store = seeded_store();
    let mut goal = Goal {
        business_unit_id: "BU-1".into(),
        period_key: "2024-07".parse().unwrap(),
        target_amount: dec!(1000),
        bonus_percentage: dec!(5),
    };
    store.upsert_goal(&goal).unwrap();
    goal.target_amount = dec!(2500);
    store.upsert_goal(&goal).unwrap();

    let read = store
        .goal_for("BU-1", "2024-07".parse().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(read.target_amount, dec!(2500));
    assert_eq!(store.goals_for_company(&"ACME".to_string()).unwrap().len(), 1);
}
