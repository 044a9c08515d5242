//! Evaluate command implementation
//!
//! Runs one snapshot through a fresh engine and prints the alerts.

use super::load_snapshot;
use crate::alerts::{AlertEngine, MemoryStore, SystemClock, TimeoutStore};
use crate::cli::args::{EvaluateArgs, OutputFormat};
use crate::cli::output::{print_output, AlertList};
use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Execute the evaluate command
pub fn run_evaluate(args: &EvaluateArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;

    let memory = Arc::new(MemoryStore::new());
    if let Some(path) = &args.previous {
        let previous = load_snapshot(path)?;
        if previous.group_id != snapshot.group_id {
            log::warn!(
                "Previous snapshot is for group {}, not {}; it will not be used",
                previous.group_id,
                snapshot.group_id
            );
        }
        memory.record_snapshot(previous);
    }

    let store = Arc::new(TimeoutStore::new(memory, config.general.store_timeout()));
    let engine = AlertEngine::new(&config.alerts, store.clone(), store, Arc::new(SystemClock))?;
    log::debug!(
        "Evaluating {} subject(s) of {} with {} evaluator(s)",
        snapshot.subjects.len(),
        snapshot.group_name,
        engine.registry().len()
    );

    let alerts = match args.deadline_ms {
        Some(ms) => {
            engine.evaluate_with_deadline(&snapshot, Instant::now() + Duration::from_millis(ms))?
        }
        None => engine.evaluate(&snapshot)?,
    };

    print_output(&AlertList::new(&snapshot, &alerts), format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_evaluate_with_previous() {
        let dir = TempDir::new().unwrap();
        let current = dir.path().join("current.json");
        let previous = dir.path().join("previous.json");
        std::fs::write(
            &current,
            r#"{"group_id": 1, "group_name": "Test Track", "captured_at": "2024-05-01T13:05:00Z",
                "subjects": [{"subject_id": 1, "fields": {"win_odds": "5-2"}}]}"#,
        )
        .unwrap();
        std::fs::write(
            &previous,
            r#"{"group_id": 1, "captured_at": "2024-05-01T13:00:00Z",
                "subjects": [{"subject_id": 1, "fields": {"win_odds": 4.0}}]}"#,
        )
        .unwrap();

        let args = EvaluateArgs {
            snapshot: current,
            previous: Some(previous),
            deadline_ms: None,
        };
        assert!(run_evaluate(&args, &Config::default(), OutputFormat::Compact).is_ok());
    }

    #[test]
    fn test_run_evaluate_missing_file() {
        let args = EvaluateArgs {
            snapshot: "/nonexistent/snapshot.json".into(),
            previous: None,
            deadline_ms: None,
        };
        assert!(run_evaluate(&args, &Config::default(), OutputFormat::Table).is_err());
    }
}
