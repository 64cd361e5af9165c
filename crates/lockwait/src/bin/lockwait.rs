//! `lockwait` command line
//!
//! Seeds a database, runs the deadlock harness one or more times, checks the
//! seed rows, and prints what happened.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use lockwait::harness::{Actor, DeadlockHarness, HarnessConfig, RunReport};
use lockwait::{
    fixtures, Backend, Config, Database, DeadlockDetection, LockConfig, LockStats, StorageEngine,
    VictimPolicy,
};

/// Provoke a two-transaction deadlock and report how it was broken
#[derive(Parser, Debug)]
#[command(name = "lockwait")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Storage backend
    #[arg(short, long, value_enum, env = "LOCKWAIT_BACKEND", default_value = "memory")]
    backend: BackendArg,

    /// Database file for the redb backend
    #[arg(short, long, env = "LOCKWAIT_PATH")]
    path: Option<PathBuf>,

    /// Number of harness runs
    #[arg(short = 'n', long, default_value = "1")]
    runs: usize,

    /// How wait cycles are broken
    #[arg(long, value_enum, default_value = "wait-for-graph")]
    detection: DetectionArg,

    /// Which transaction in a cycle is aborted
    #[arg(long, value_enum, default_value = "requester")]
    victim: VictimArg,

    /// Longest each lock request may wait, in milliseconds
    #[arg(long, default_value = "2000")]
    lock_timeout_ms: u64,

    /// Longest a whole run may take, in milliseconds
    #[arg(long, default_value = "10000")]
    run_timeout_ms: u64,

    /// Print the full reports as JSON
    #[arg(long)]
    json: bool,
}

/// Storage backends selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// In-process ordered map
    Memory,
    /// Redb database file (requires --path)
    Redb,
    /// Redb in-memory backend
    RedbMemory,
}

/// Cycle detection modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DetectionArg {
    /// Detect cycles in the wait-for graph when a request blocks
    WaitForGraph,
    /// Let lock waits time out
    TimeoutOnly,
}

/// Victim selection policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VictimArg {
    /// Abort the request that closed the cycle
    Requester,
    /// Abort the youngest transaction in the cycle
    Youngest,
}

/// The JSON document printed with `--json`.
#[derive(Serialize)]
struct Summary<'a> {
    backend: &'a str,
    runs: usize,
    alice_victim: usize,
    bob_victim: usize,
    locks: LockStats,
    reports: &'a [RunReport],
}

impl Args {
    fn config(&self) -> Result<Config> {
        let lock_timeout = Duration::from_millis(self.lock_timeout_ms);
        let detection = match self.detection {
            DetectionArg::WaitForGraph => DeadlockDetection::WaitForGraph,
            DetectionArg::TimeoutOnly => DeadlockDetection::TimeoutOnly,
        };
        let victim = match self.victim {
            VictimArg::Requester => VictimPolicy::Requester,
            VictimArg::Youngest => VictimPolicy::Youngest,
        };
        let backend = match self.backend {
            BackendArg::Memory => Backend::Memory,
            BackendArg::Redb => Backend::Redb {
                path: self.path.clone().ok_or_else(|| {
                    anyhow!("the redb backend needs a path: use --path or set LOCKWAIT_PATH")
                })?,
            },
            BackendArg::RedbMemory => Backend::RedbInMemory,
        };

        let locks =
            LockConfig::new().detection(detection).victim(victim).wait_timeout(lock_timeout);
        let config = Config::new().backend(backend).locks(locks);
        config.validate()?;
        Ok(config)
    }

    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::new()
            .lock_timeout(Duration::from_millis(self.lock_timeout_ms))
            .run_timeout(Duration::from_millis(self.run_timeout_ms))
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lockwait=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = args.config()?;

    match &config.backend {
        Backend::Memory => run(Database::in_memory_with_locks(config.locks), &config, &args),
        Backend::Redb { path } => {
            let db = Database::open_redb(path, &config)
                .with_context(|| format!("failed to open {}", path.display()))?;
            run(db, &config, &args)
        }
        Backend::RedbInMemory => run(Database::redb_in_memory(&config)?, &config, &args),
    }
}

fn run<E: StorageEngine + 'static>(db: Database<E>, config: &Config, args: &Args) -> Result<()> {
    fixtures::seed(&db).context("failed to seed the database")?;

    let harness = DeadlockHarness::new(db.clone(), args.harness_config());
    let reports = harness.run_many(args.runs).context("harness run failed")?;

    fixtures::verify_seed(&db).context("seed rows changed")?;

    let victims = |actor: Actor| reports.iter().filter(|r| r.victims().contains(&actor)).count();
    let summary = Summary {
        backend: config.backend.name(),
        runs: reports.len(),
        alice_victim: victims(Actor::Alice),
        bob_victim: victims(Actor::Bob),
        locks: db.lock_stats(),
        reports: &reports,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for (i, report) in reports.iter().enumerate() {
        println!(
            "run {}: Alice {:?}, Bob {:?} ({:?})",
            i + 1,
            report.alice,
            report.bob,
            report.elapsed
        );
    }
    println!(
        "{} run(s) on {}: Alice aborted {} time(s), Bob aborted {} time(s)",
        summary.runs, summary.backend, summary.alice_victim, summary.bob_victim
    );
    println!(
        "locks: {} granted, {} waits, {} deadlocks, {} timeouts",
        summary.locks.granted, summary.locks.waits, summary.locks.deadlocks, summary.locks.timeouts
    );
    Ok(())
}
