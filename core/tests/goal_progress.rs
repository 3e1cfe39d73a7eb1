//! Goal progress tests.
//!
//! The achievement boundary is inclusive and decided on the unclamped
//! percentage; the bonus is paid on achieved sales without a ceiling.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use walker_core::{
    error::EngineError,
    goal_progress::GoalProgressEngine,
    model::{Goal, PaymentMethod, TransactionRecord},
};

fn engine() -> GoalProgressEngine {
    GoalProgressEngine::new(FixedOffset::east_opt(0).unwrap())
}

fn goal(target: Decimal, bonus_pct: Decimal) -> Goal {
    Goal {
        business_unit_id: "BU-1".into(),
        period_key: "2024-07".parse().unwrap(),
        target_amount: target,
        bonus_percentage: bonus_pct,
    }
}

fn sale(id: &str, unit: &str, amount: Decimal, at: &str) -> TransactionRecord {
    TransactionRecord {
        id: id.into(),
        business_unit_id: unit.into(),
        cash_register_id: None,
        amount,
        payment_method: PaymentMethod::Credit,
        occurred_at: at.parse::<DateTime<Utc>>().unwrap(),
    }
}

#[test]
fn over_achievement_caps_display_but_not_bonus() {
    let records = vec![
        sale("s1", "BU-1", dec!(700000), "2024-07-03T12:00:00Z"),
        sale("s2", "BU-1", dec!(500000), "2024-07-28T12:00:00Z"),
    ];
    let p = engine().progress(&goal(dec!(1000000), dec!(5)), &records).unwrap();

    assert_eq!(p.actual_amount, dec!(1200000));
    assert_eq!(p.raw_progress_percent, dec!(120));
    assert_eq!(p.display_progress_percent, dec!(100));
    assert!(p.achieved);
    assert_eq!(p.bonus_amount, dec!(60000));
    assert_eq!(p.remaining_amount, Decimal::ZERO);
}

#[test]
fn achievement_boundary_is_inclusive() {
    let g = goal(dec!(1000000), dec!(5));
    let e = engine();

    let just_under = e.progress_from_total(&g, dec!(999990)).unwrap();
    assert_eq!(just_under.raw_progress_percent, dec!(99.999));
    assert!(!just_under.achieved);
    assert_eq!(just_under.bonus_amount, Decimal::ZERO);
    assert_eq!(just_under.remaining_amount, dec!(10));

    let exact = e.progress_from_total(&g, dec!(1000000)).unwrap();
    assert!(exact.achieved);
    assert_eq!(exact.bonus_amount, dec!(50000));

    let just_over = e.progress_from_total(&g, dec!(1000010)).unwrap();
    assert_eq!(just_over.raw_progress_percent, dec!(100.001));
    assert!(just_over.achieved);
    assert_eq!(just_over.bonus_amount, dec!(50000.5));
    assert!(just_over.bonus_amount > exact.bonus_amount);
}

#[test]
fn only_matching_unit_and_month_count() {
    let records = vec![
        sale("s1", "BU-1", dec!(100), "2024-07-01T00:00:00Z"),
        sale("s2", "BU-1", dec!(200), "2024-07-31T23:59:59Z"),
        sale("s3", "BU-1", dec!(400), "2024-06-30T23:59:59Z"),
        sale("s4", "BU-1", dec!(800), "2024-08-01T00:00:00Z"),
        sale("s5", "BU-2", dec!(1600), "2024-07-15T12:00:00Z"),
    ];
    let p = engine().progress(&goal(dec!(1000), dec!(10)), &records).unwrap();
    assert_eq!(p.actual_amount, dec!(300));
    assert_eq!(p.raw_progress_percent, dec!(30));
    assert!(!p.achieved);
}

#[test]
fn month_is_taken_in_local_time() {
    // 2024-08-01 03:00 UTC is still July 31st in UTC-4.
    let records = vec![sale("s1", "BU-1", dec!(1000), "2024-08-01T03:00:00Z")];
    let chile = GoalProgressEngine::new(FixedOffset::west_opt(4 * 3600).unwrap());
    let p = chile.progress(&goal(dec!(1000), dec!(2)), &records).unwrap();
    assert!(p.achieved);
    assert_eq!(p.bonus_amount, dec!(20));
}

#[test]
fn zero_bonus_percentage_achieves_without_paying() {
    let p = engine()
        .progress_from_total(&goal(dec!(500), Decimal::ZERO), dec!(800))
        .unwrap();
    assert!(p.achieved);
    assert_eq!(p.bonus_amount, Decimal::ZERO);
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let records = vec![
        sale("s1", "BU-1", dec!(333.33), "2024-07-03T12:00:00Z"),
        sale("s2", "BU-1", dec!(666.67), "2024-07-04T12:00:00Z"),
    ];
    let g = goal(dec!(900), dec!(3.5));
    let a = engine().progress(&g, &records).unwrap();
    let b = engine().progress(&g, &records).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn non_positive_target_is_an_invalid_goal() {
    for target in [Decimal::ZERO, dec!(-1)] {
        match engine().progress(&goal(target, dec!(5)), &[]) {
            Err(EngineError::InvalidGoal { business_unit_id, period_key, .. }) => {
                assert_eq!(business_unit_id, "BU-1");
                assert_eq!(period_key, "2024-07");
            }
            other => panic!("expected InvalidGoal, got {other:?}"),
        }
    }
}

#[test]
fn negative_bonus_percentage_is_an_invalid_goal() {
    assert!(matches!(
        engine().progress_from_total(&goal(dec!(100), dec!(-1)), dec!(200)),
        Err(EngineError::InvalidGoal { .. })
    ));
}

#[test]
fn totals_too_large_to_represent_are_validation_errors() {
    let err = engine()
        .progress_from_total(&goal(dec!(0.5), dec!(5)), Decimal::MAX)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "actual_amount"));

    let err = engine()
        .progress_from_total(&goal(dec!(1000), dec!(200)), Decimal::MAX)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "bonus_amount"));
}
