//! walker-core — reconciliation and incentive engine for WalkerGestion.
//!
//! Pure components (no I/O):
//!   - `expected_amount` — what a till should hold
//!   - `rendition`       — counted vs expected, findings, approval
//!   - `goal_progress`   — sales vs monthly target, bonus accrual
//!   - `bonus_accrual`   — company rollup of paid and pending bonuses
//!
//! Boundary:
//!   - `source` — collaborator traits; `store` — SQLite implementation
//!   - `desk`   — settles renditions and builds incentive reports

pub mod alert;
pub mod bonus_accrual;
pub mod config;
pub mod desk;
pub mod engine;
pub mod error;
pub mod event;
pub mod expected_amount;
pub mod goal_progress;
pub mod metrics;
pub mod model;
pub mod money;
pub mod rendition;
pub mod source;
pub mod store;
pub mod types;
