use std::sync::Arc;

use services::auth::StaticToken;
use services::generation::GenerationCache;
use services::progress_service::ProgressStore;
use services::{TutorConfig, TutorServices};
use storage::repository::Storage;
use tutor_core::model::{CacheKey, Lesson, Series, SeriesId};
use tutor_core::time::fixed_clock;

async fn shared_memory(name: &str) -> Storage {
    Storage::sqlite(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .unwrap()
}

fn series(id: SeriesId, count: usize) -> Series {
    let lessons = (1..=count)
        .map(|n| {
            Lesson::new(
                id,
                format!("{}{n}", id.lesson_prefix()),
                format!("Lesson {n}"),
                None,
                vec!["text".into()],
            )
        })
        .collect();
    Series::new(id, id.info().title, "", lessons)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_cache_writes_keep_every_entry() {
    let storage = shared_memory("memdb_concurrent_cache").await;
    let cache = GenerationCache::new(fixed_clock(), Arc::clone(&storage.kv));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .set(CacheKey::explain(SeriesId::Ot, "OT-1", i), "text")
                    .await;
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let keys = cache.keys().await;
    assert_eq!(keys.len(), 20);
    for i in 0..20 {
        assert!(keys.contains(&format!("explain:OT:OT-1:{i}")));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_cache_deletes_and_writes_do_not_resurrect() {
    let storage = shared_memory("memdb_concurrent_cache_delete").await;
    let cache = GenerationCache::new(fixed_clock(), Arc::clone(&storage.kv));
    for i in 0..10 {
        cache
            .set(CacheKey::explain(SeriesId::U, "U-1", i), "old")
            .await;
    }

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    cache.delete(CacheKey::explain(SeriesId::U, "U-1", i)).await;
                } else {
                    cache
                        .set(CacheKey::explain(SeriesId::U, "U-2", i), "new")
                        .await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let keys = cache.keys().await;
    assert_eq!(keys.len(), 10);
    assert!(!keys.contains(&"explain:U:U-1:0".to_string()));
    assert!(keys.contains(&"explain:U:U-1:1".to_string()));
    assert!(keys.contains(&"explain:U:U-2:1".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_progress_updates_are_both_kept() {
    let storage = shared_memory("memdb_concurrent_progress").await;
    let progress = ProgressStore::new(fixed_clock(), Arc::clone(&storage.kv));
    progress.load().await;

    let completing = progress.clone();
    let moving = progress.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { completing.mark_completed("OT-1").await }),
        tokio::spawn(async move { moving.update_position("OT-2", 3).await }),
    );
    a.unwrap();
    b.unwrap();

    let stored = progress.load().await;
    assert!(stored.is_completed("OT-1"));
    assert_eq!(stored.current_lesson_id.as_deref(), Some("OT-2"));
    assert_eq!(stored.current_paragraph_index, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_completions_record_every_lesson() {
    let storage = shared_memory("memdb_concurrent_complete").await;
    let svc = TutorServices::new(
        &storage,
        fixed_clock(),
        TutorConfig::default(),
        Arc::new(StaticToken::none()),
    );
    let ot = Arc::new(series(SeriesId::Ot, 8));

    let tasks: Vec<_> = (1..=8)
        .map(|n| {
            let svc = svc.clone();
            let ot = Arc::clone(&ot);
            tokio::spawn(async move { svc.complete_lesson(&ot, &format!("OT-{n}")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let progress = svc.progress().load().await;
    for n in 1..=8 {
        assert!(progress.is_completed(&format!("OT-{n}")));
    }
    assert_eq!(progress.completed_lesson_ids.len(), 8);
}
