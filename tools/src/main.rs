//! walker-runner: headless driver for the reconciliation & incentive engine.
//!
//! Usage:
//!   walker-runner import    --db shop.db --file seed.json
//!   walker-runner reconcile --db shop.db --register REG-1 --unit BU-1 \
//!                           --cashier C-7 --date 2024-07-15 --actual 85000 \
//!                           [--breakdown count.json] [--notes "..."]
//!   walker-runner goals     --db shop.db --company ACME [--now 2024-07-31T23:00:00Z]
//!   walker-runner metrics   --db shop.db --unit BU-1 --from 2024-07-01 --to 2024-07-31
//!
//! Every command accepts `--config data/engine_config.json`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::env;
use walker_core::{
    config::EngineConfig,
    desk::{IncentiveDesk, RenditionDesk},
    engine::Engine,
    metrics::RenditionMetrics,
    model::{BusinessUnit, CashRegister, Goal, TransactionRecord},
    rendition::{CashBreakdown, RenditionSubmission},
    store::EngineStore,
};

#[derive(serde::Deserialize)]
struct SeedFile {
    #[serde(default)]
    business_units: Vec<BusinessUnit>,
    #[serde(default)]
    registers: Vec<CashRegister>,
    #[serde(default)]
    transactions: Vec<TransactionRecord>,
    #[serde(default)]
    goals: Vec<Goal>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    let db = str_arg(&args, "--db").unwrap_or("walker.db");

    let config = match str_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config)?;

    let store = EngineStore::open(db)?;
    store.migrate()?;

    match command {
        "import" => import(&store, &args),
        "reconcile" => reconcile(&engine, &store, &args),
        "goals" => goals(&engine, &store, &args),
        "metrics" => metrics(&store, &args),
        other => {
            eprintln!("unknown command '{other}': expected import | reconcile | goals | metrics");
            std::process::exit(2);
        }
    }
}

fn import(store: &EngineStore, args: &[String]) -> Result<()> {
    let path = required(args, "--file")?;
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    let seed: SeedFile = serde_json::from_str(&content)?;

    for unit in &seed.business_units {
        store.insert_business_unit(unit)?;
    }
    for register in &seed.registers {
        store.insert_register(register)?;
    }
    let txns = store.insert_transactions(&seed.transactions)?;
    for goal in &seed.goals {
        store.upsert_goal(goal)?;
    }

    log::info!("imported {path}");
    println!("=== IMPORT SUMMARY ===");
    println!("  business units: {}", seed.business_units.len());
    println!("  registers:      {}", seed.registers.len());
    println!("  transactions:   {txns}");
    println!("  goals:          {}", seed.goals.len());
    Ok(())
}

fn reconcile(engine: &Engine, store: &EngineStore, args: &[String]) -> Result<()> {
    let breakdown = match str_arg(args, "--breakdown") {
        Some(path) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
            Some(serde_json::from_str::<CashBreakdown>(&content)?)
        }
        None => None,
    };
    let submission = RenditionSubmission {
        cash_register_id: required(args, "--register")?.to_string(),
        business_unit_id: required(args, "--unit")?.to_string(),
        cashier_id: required(args, "--cashier")?.to_string(),
        actual_amount: parse_arg::<Decimal>(args, "--actual")?,
        breakdown,
        notes: str_arg(args, "--notes").map(str::to_string),
    };
    let as_of: NaiveDate =
        parse_arg(args, "--date")?.unwrap_or_else(|| Utc::now().date_naive());

    let desk = RenditionDesk::new(engine, store);
    let outcome = desk.submit(&submission, as_of, now(args)?)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn goals(engine: &Engine, store: &EngineStore, args: &[String]) -> Result<()> {
    let company = required(args, "--company")?.to_string();
    let desk = IncentiveDesk::new(engine, store);
    let report = desk.report(&company, now(args)?)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn metrics(store: &EngineStore, args: &[String]) -> Result<()> {
    let unit = required(args, "--unit")?;
    let (Some(from), Some(to)) = (
        parse_arg::<NaiveDate>(args, "--from")?,
        parse_arg::<NaiveDate>(args, "--to")?,
    ) else {
        bail!("--from and --to are required (YYYY-MM-DD)");
    };
    let records = store.renditions_for_unit(unit, from, to)?;
    let metrics = RenditionMetrics::compute(unit, &records)?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

fn now(args: &[String]) -> Result<DateTime<Utc>> {
    Ok(parse_arg(args, "--now")?.unwrap_or_else(Utc::now))
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn required<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    str_arg(args, flag).with_context(|| format!("{flag} is required"))
}

/// `None` when the flag is absent; an error when present but unparseable.
fn parse_arg<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match str_arg(args, flag) {
        Some(raw) => match raw.parse() {
            Ok(v) => Ok(Some(v)),
            Err(e) => bail!("invalid value '{raw}' for {flag}: {e}"),
        },
        None => Ok(None),
    }
}
