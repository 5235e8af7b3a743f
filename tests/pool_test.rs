//! Tests de integración del pool de workers
//! tests/pool_test.rs
//!
//! Ejercitan el pool completo: admisión, ejecución concurrente, fallos
//! aislados, archivo de resultados y shutdown ordenado.

use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use task_runner::config::Config;
use task_runner::error::{PoolError, QueryError, SubmitError};
use task_runner::jobs::storage::NullArchiver;
use task_runner::jobs::{task, JobOutcome, JobStatus, Task, TaskFailure, WorkerPool};

/// Configuración rápida para tests: sin archivo en disco y polling corto
fn test_config(threads: usize) -> Config {
    Config {
        num_threads: Some(threads.to_string()),
        archive_results: false,
        poll_interval_ms: 20,
        join_timeout_ms: 2_000,
        ..Config::default()
    }
}

fn value_task(value: Value) -> Task {
    task(move |_| Ok(value.clone()))
}

fn sleeping_task(ms: u64, value: Value) -> Task {
    task(move |_| {
        thread::sleep(Duration::from_millis(ms));
        Ok(value.clone())
    })
}

/// Espera a que el job llegue a un estado terminal
fn wait_terminal(pool: &WorkerPool, id: &str) -> JobStatus {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let status = pool.status(id).expect("job should exist");
        if status.is_terminal() || Instant::now() > deadline {
            return status;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_invalid_timeouts_rejected_at_construction() {
    for config in [
        Config {
            poll_interval_ms: 0,
            ..test_config(2)
        },
        Config {
            join_timeout_ms: 0,
            ..test_config(2)
        },
    ] {
        assert!(matches!(WorkerPool::new(&config), Err(PoolError::Config(_))));
    }
}

#[test]
fn test_status_running_then_done() {
    let pool = WorkerPool::new(&test_config(2)).unwrap();

    pool.submit(sleeping_task(100, json!("ok")), json!({}), "1").unwrap();
    assert_eq!(pool.status("1"), Ok(JobStatus::Running));
    assert_eq!(pool.result("1"), Err(QueryError::NotReady("1".to_string())));

    assert_eq!(wait_terminal(&pool, "1"), JobStatus::Done);
    assert_eq!(pool.result("1"), Ok(JobOutcome::Done(json!("ok"))));

    pool.shutdown();
}

#[test]
fn test_payload_is_passed_verbatim() {
    let pool = WorkerPool::new(&test_config(1)).unwrap();
    let count_values = task(|payload| {
        let state = payload["state"].as_str().unwrap_or_default();
        let count = payload["values"].as_array().map(|v| v.len()).unwrap_or(0);
        Ok(json!({"state": state, "count": count}))
    });

    let id = pool
        .submit_new(count_values, json!({"state": "Ohio", "values": [1, 2, 3]}))
        .unwrap();
    assert_eq!(wait_terminal(&pool, &id), JobStatus::Done);
    assert_eq!(
        pool.result(&id),
        Ok(JobOutcome::Done(json!({"state": "Ohio", "count": 3})))
    );

    pool.shutdown();
}

#[test]
fn test_two_workers_long_and_short_job() {
    let pool = WorkerPool::new(&test_config(2)).unwrap();

    pool.submit(sleeping_task(200, json!(10)), json!({}), "A").unwrap();
    pool.submit(value_task(json!(20)), json!({}), "B").unwrap();

    assert_eq!(wait_terminal(&pool, "A"), JobStatus::Done);
    assert_eq!(wait_terminal(&pool, "B"), JobStatus::Done);
    assert_eq!(pool.result("A"), Ok(JobOutcome::Done(json!(10))));
    assert_eq!(pool.result("B"), Ok(JobOutcome::Done(json!(20))));

    pool.shutdown();
}

#[test]
fn test_duplicate_id_is_rejected_and_not_queued() {
    let pool = WorkerPool::new(&test_config(1)).unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let counting = {
        let runs = Arc::clone(&runs);
        task(move |_| {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(json!(null))
        })
    };

    pool.submit(Arc::clone(&counting), json!({}), "dup").unwrap();
    assert_eq!(
        pool.submit(counting, json!({}), "dup"),
        Err(SubmitError::DuplicateId("dup".to_string()))
    );

    pool.shutdown();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(pool.job_count(), 1);
}

#[test]
fn test_failing_task_becomes_error_and_worker_survives() {
    let pool = WorkerPool::new(&test_config(1)).unwrap();

    let failing = task(|_| Err(TaskFailure::new("ValueError", "boom")));
    pool.submit(failing, json!({}), "7").unwrap();
    assert_eq!(wait_terminal(&pool, "7"), JobStatus::Error);

    let outcome = pool.result("7").unwrap();
    let failure = outcome.failure().unwrap();
    assert!(failure.message.contains("boom"));
    assert!(!failure.message.is_empty());

    // El único worker sigue vivo
    pool.submit(value_task(json!(1)), json!({}), "8").unwrap();
    assert_eq!(wait_terminal(&pool, "8"), JobStatus::Done);

    pool.shutdown();
}

#[test]
fn test_panicking_task_is_contained() {
    let pool = WorkerPool::new(&test_config(1)).unwrap();

    let panicking = task(|_| panic!("boom"));
    pool.submit(panicking, json!({}), "1").unwrap();
    assert_eq!(wait_terminal(&pool, "1"), JobStatus::Error);

    let outcome = pool.result("1").unwrap();
    assert_eq!(outcome.failure().unwrap().kind, "panic");
    assert!(outcome.failure().unwrap().message.contains("boom"));

    pool.submit(value_task(json!(2)), json!({}), "2").unwrap();
    assert_eq!(wait_terminal(&pool, "2"), JobStatus::Done);

    pool.shutdown();
}

#[test]
fn test_concurrent_submissions_all_finish_once() {
    let pool = Arc::new(WorkerPool::new(&test_config(4)).unwrap());
    let submitters = 8;
    let per_submitter = 25;

    let handles: Vec<_> = (0..submitters)
        .map(|s| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for j in 0..per_submitter {
                    let id = format!("{}-{}", s, j);
                    let echo = task(|p| Ok(p.clone()));
                    pool.submit(echo, json!(id.clone()), id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    pool.shutdown();

    let outcomes = pool.outcomes();
    assert_eq!(outcomes.len(), submitters * per_submitter);
    for (id, outcome) in &outcomes {
        assert_eq!(outcome, &JobOutcome::Done(json!(id)));
    }
    assert!(pool
        .statuses()
        .values()
        .all(|status| *status == JobStatus::Done));
}

#[test]
fn test_concurrent_next_id_unique() {
    let pool = Arc::new(WorkerPool::new(&test_config(1)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || (0..250).map(|_| pool.next_id()).collect::<Vec<_>>())
        })
        .collect();

    let ids: HashSet<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .map(|id| id.parse().unwrap())
        .collect();
    assert_eq!(ids.len(), 1000);
    assert_eq!(ids, (1..=1000).collect::<HashSet<u64>>());

    pool.shutdown();
}

#[test]
fn test_shutdown_drains_all_submitted_jobs() {
    let pool = WorkerPool::new(&test_config(2)).unwrap();

    let ids: Vec<String> = (0..10)
        .map(|i| pool.submit_new(sleeping_task(20, json!(i)), json!({})).unwrap())
        .collect();
    assert!(pool.pending() > 0);

    pool.shutdown();

    for id in &ids {
        assert!(pool.status(id).unwrap().is_terminal());
    }
    assert_eq!(pool.pending(), 0);
}

#[test]
fn test_submit_after_shutdown_rejected() {
    let pool = WorkerPool::new(&test_config(2)).unwrap();
    pool.submit(value_task(json!(1)), json!({}), "1").unwrap();
    pool.shutdown();

    let before = pool.job_count();
    assert_eq!(
        pool.submit(value_task(json!(2)), json!({}), "2"),
        Err(SubmitError::Rejected)
    );
    assert_eq!(pool.job_count(), before);
    assert_eq!(pool.pending(), 0);
    assert_eq!(pool.status("2"), Err(QueryError::NotFound("2".to_string())));
}

#[test]
fn test_second_shutdown_is_noop() {
    let pool = WorkerPool::new(&test_config(2)).unwrap();
    let workers = pool.worker_count();
    pool.shutdown();

    let start = Instant::now();
    pool.shutdown();
    assert!(start.elapsed() < Duration::from_millis(500));
    assert_eq!(pool.worker_count(), workers);
    assert!(pool.is_shutting_down());
}

#[test]
fn test_shutdown_bounded_with_stuck_task() {
    let config = Config {
        drain_timeout_ms: 100,
        join_timeout_ms: 100,
        ..test_config(1)
    };
    let pool = WorkerPool::with_archiver(&config, Arc::new(NullArchiver)).unwrap();

    pool.submit(sleeping_task(3_000, json!(null)), json!({}), "stuck").unwrap();

    let start = Instant::now();
    pool.shutdown();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(pool.is_shutting_down());
}

#[test]
fn test_results_are_archived_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        archive_results: true,
        results_dir: dir.path().join("results"),
        ..test_config(2)
    };
    let pool = WorkerPool::new(&config).unwrap();

    pool.submit(value_task(json!({"Ohio": 30.1})), json!({}), "1").unwrap();
    let failing = task(|_| Err(TaskFailure::new("KeyError", "no data")));
    pool.submit(failing, json!({}), "2").unwrap();
    pool.shutdown();

    let read = |name: &str| -> Value {
        let content = fs::read_to_string(dir.path().join("results").join(name)).unwrap();
        serde_json::from_str(&content).unwrap()
    };
    assert_eq!(read("job_1.json"), json!({"Ohio": 30.1}));
    assert_eq!(read("job_2.json"), json!({"error": "no data", "type": "KeyError"}));
}

#[test]
fn test_archive_failure_keeps_status() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("results");
    fs::write(&blocker, b"not a dir").unwrap();

    let config = Config {
        archive_results: true,
        results_dir: blocker,
        ..test_config(1)
    };
    let pool = WorkerPool::new(&config).unwrap();

    pool.submit(value_task(json!(5)), json!({}), "1").unwrap();
    pool.shutdown();

    assert_eq!(pool.status("1"), Ok(JobStatus::Done));
    assert_eq!(pool.result("1"), Ok(JobOutcome::Done(json!(5))));
}
