mod common;

use std::sync::Arc;

use common::*;
use mind_worker::{
    DurableCache, MemoryCache, WorkerCommand, WorkerEvent, WorkerHandle, WorkerServices,
};
use pretty_assertions::assert_eq;

fn spawn(engine: MockEngine, cache: Arc<MemoryCache>, fetcher: Arc<StaticFetcher>) -> WorkerHandle {
    init_logging();
    let services = WorkerServices::new(test_config(), cache).with_fetcher(fetcher);
    WorkerHandle::spawn(engine, services)
}

#[test]
fn init_fetches_assets_loads_model_and_reports_ready() {
    let probe = EngineProbe::default();
    let cache = Arc::new(MemoryCache::new());
    let fetcher = StaticFetcher::model();
    let worker = spawn(MockEngine::new(probe.clone()), cache.clone(), fetcher.clone());

    worker.send(WorkerCommand::Init);
    let events = worker.shutdown();

    assert_eq!(events.last(), Some(&WorkerEvent::Ready));
    assert_eq!(probe.loads.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(fetcher.request_count(), 3);

    let percents: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::InitProgress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert!(!percents.is_empty());
    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(percents.last(), Some(&100.0));

    // Assets were written behind and flushed before shutdown returned.
    assert!(cache.get("model.safetensors").unwrap().is_some());
    assert!(cache.get("tokenizer.json").unwrap().is_some());
    assert!(cache.get("config.json").unwrap().is_some());
}

#[test]
fn second_init_reuses_the_loaded_model() {
    let probe = EngineProbe::default();
    let worker = spawn(
        MockEngine::new(probe.clone()),
        Arc::new(MemoryCache::new()),
        StaticFetcher::model(),
    );
    worker.send(WorkerCommand::Init);
    worker.send(WorkerCommand::Init);
    let events = worker.shutdown();

    let readies = events.iter().filter(|e| **e == WorkerEvent::Ready).count();
    assert_eq!(readies, 2);
    assert_eq!(probe.loads.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn failed_asset_fetch_is_a_single_fatal_error() {
    let fetcher = Arc::new(
        StaticFetcher::new()
            .with(WEIGHTS_URL, vec![1; 8])
            .with(TOKENIZER_URL, vec![2; 8]),
    );
    let probe = EngineProbe::default();
    let worker = spawn(MockEngine::new(probe.clone()), Arc::new(MemoryCache::new()), fetcher);

    worker.send(WorkerCommand::Init);
    worker.send(WorkerCommand::Search {
        query: "anything".into(),
        allowed_ids: None,
    });
    let events = worker.shutdown();

    let errs = errors(&events);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].0.contains("http status 404"), "{}", errs[0].0);
    assert_eq!(errs[0].1, None);
    assert!(!events.contains(&WorkerEvent::Ready));
    assert!(!events
        .iter()
        .any(|e| matches!(e, WorkerEvent::SearchResults { .. })));
    assert_eq!(probe.loads.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn search_before_ready_is_silently_dropped() {
    let worker = spawn(
        MockEngine::default(),
        Arc::new(MemoryCache::new()),
        StaticFetcher::model(),
    );
    worker.send(WorkerCommand::Search {
        query: "hello".into(),
        allowed_ids: None,
    });
    assert!(worker.shutdown().is_empty());
}

#[test]
fn add_before_init_reports_a_precondition_error() {
    let probe = EngineProbe::default();
    let worker = spawn(
        MockEngine::new(probe.clone()),
        Arc::new(MemoryCache::new()),
        StaticFetcher::model(),
    );
    worker.send(add("early.txt", "too soon"));
    let events = worker.shutdown();

    let errs = errors(&events);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].0.contains("not initialized"));
    assert_eq!(errs[0].1.as_deref(), Some("early.txt"));
    assert_eq!(probe.adds_started_for("early.txt"), 0);
}

#[test]
fn add_document_emits_progress_then_added_and_persists_snapshot() {
    let cache = Arc::new(MemoryCache::new());
    let worker = spawn(MockEngine::default(), cache.clone(), StaticFetcher::model());

    worker.send(WorkerCommand::Init);
    worker.send(add("notes.md", "first\n\nsecond\n\nthird"));
    let events = worker.shutdown();

    let ready_at = events.iter().position(|e| *e == WorkerEvent::Ready).unwrap();
    let after_ready: Vec<WorkerEvent> = events[ready_at + 1..].to_vec();
    assert_eq!(
        after_ready,
        vec![
            WorkerEvent::IndexProgress {
                filename: "notes.md".into(),
                current: 1,
                total: 3,
                percent: 100.0 / 3.0,
            },
            WorkerEvent::IndexProgress {
                filename: "notes.md".into(),
                current: 2,
                total: 3,
                percent: 200.0 / 3.0,
            },
            WorkerEvent::IndexProgress {
                filename: "notes.md".into(),
                current: 3,
                total: 3,
                percent: 100.0,
            },
            WorkerEvent::DocumentAdded {
                count: 3,
                id: "notes.md".into(),
            },
        ]
    );
    assert!(cache.get(mind_worker::DEFAULT_SNAPSHOT_KEY).unwrap().is_some());
}

#[test]
fn cancel_sent_before_add_is_consumed_by_that_add() {
    let probe = EngineProbe::default();
    let worker = spawn(
        MockEngine::new(probe.clone()),
        Arc::new(MemoryCache::new()),
        StaticFetcher::model(),
    );

    worker.send(WorkerCommand::Init);
    worker.send(cancel("a.txt"));
    worker.send(add("a.txt", "hello"));
    // The cancel was one-shot; a second add of the same id goes through.
    worker.send(add("a.txt", "hello again"));
    let events = worker.shutdown();

    assert_eq!(added_ids(&events), vec!["a.txt".to_string()]);
    assert_eq!(probe.adds_started_for("a.txt"), 1);
}

#[test]
fn engine_fault_fails_only_that_document() {
    let worker = spawn(
        MockEngine::default().failing_on("bad.txt"),
        Arc::new(MemoryCache::new()),
        StaticFetcher::model(),
    );
    worker.send(WorkerCommand::Init);
    worker.send(add("bad.txt", "broken"));
    worker.send(add("good.txt", "fine"));
    let events = worker.shutdown();

    assert_eq!(
        errors(&events),
        vec![(
            "engine fault: cannot embed bad.txt".to_string(),
            Some("bad.txt".to_string())
        )]
    );
    assert_eq!(added_ids(&events), vec!["good.txt".to_string()]);
}

#[test]
fn documents_are_never_indexed_concurrently() {
    let probe = EngineProbe::default();
    let worker = spawn(
        MockEngine::new(probe.clone()),
        Arc::new(MemoryCache::new()),
        StaticFetcher::model(),
    );
    worker.send(WorkerCommand::Init);
    for i in 0..5 {
        worker.send(add(&format!("doc{i}.txt"), "one\n\ntwo"));
    }
    let events = worker.shutdown();

    assert_eq!(added_ids(&events).len(), 5);
    let calls = probe.calls();
    assert_eq!(calls.len(), 10);
    for (i, pair) in calls.chunks(2).enumerate() {
        assert_eq!(pair[0], format!("start doc{i}.txt"));
        assert_eq!(pair[1], format!("end doc{i}.txt"));
    }
}

#[test]
fn search_results_respect_the_allow_list() {
    let worker = spawn(
        MockEngine::default().ignoring_allow_list(),
        Arc::new(MemoryCache::new()),
        StaticFetcher::model(),
    );
    worker.send(WorkerCommand::Init);
    worker.send(add("a.txt", "rust ownership"));
    worker.send(add("b.txt", "rust borrowing"));
    worker.send(WorkerCommand::Search {
        query: "rust".into(),
        allowed_ids: Some(vec!["b.txt".into()]),
    });
    worker.send(WorkerCommand::Search {
        query: "rust".into(),
        allowed_ids: Some(Vec::new()),
    });
    let events = worker.shutdown();

    let result_sets: Vec<Vec<String>> = events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::SearchResults { results } => {
                Some(results.iter().map(|r| r.doc_id.clone()).collect())
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        result_sets,
        vec![
            vec!["b.txt".to_string()],
            vec!["a.txt".to_string(), "b.txt".to_string()],
        ]
    );
}

#[test]
fn restart_restores_documents_without_network() {
    let cache = Arc::new(MemoryCache::new());
    let fetcher = StaticFetcher::model();

    let first = spawn(MockEngine::default(), cache.clone(), fetcher.clone());
    first.send(WorkerCommand::Init);
    first.send(add("a.txt", "alpha"));
    first.send(add("b.txt", "beta"));
    first.shutdown();
    assert_eq!(fetcher.request_count(), 3);

    let second = spawn(MockEngine::default(), cache, fetcher.clone());
    second.send(WorkerCommand::Init);
    let events = second.shutdown();

    assert_eq!(fetcher.request_count(), 3);
    let restored_at = events
        .iter()
        .position(|e| {
            *e == WorkerEvent::RestoredDocs {
                ids: vec!["a.txt".into(), "b.txt".into()],
            }
        })
        .expect("restored docs event");
    let ready_at = events.iter().position(|e| *e == WorkerEvent::Ready).unwrap();
    assert!(restored_at < ready_at);
}

#[test]
fn broken_cache_degrades_to_network_and_skips_persistence() {
    init_logging();
    let fetcher = StaticFetcher::model();
    let services =
        WorkerServices::new(test_config(), Arc::new(BrokenCache)).with_fetcher(fetcher.clone());
    let worker = WorkerHandle::spawn(MockEngine::default(), services);

    worker.send(WorkerCommand::Init);
    worker.send(add("a.txt", "alpha"));
    let events = worker.shutdown();

    assert!(errors(&events).is_empty());
    assert!(events.contains(&WorkerEvent::Ready));
    assert_eq!(added_ids(&events), vec!["a.txt".to_string()]);
    assert_eq!(fetcher.request_count(), 3);
}
