//! SqlAndonSource against a seeded in-memory SQLite database

mod helpers;

use andon_common::db::SourceQualifier;
use andon_common::Error;
use andon_status::master::MasterLookupCache;
use andon_status::models::MasterNamespace;
use andon_status::source::{MasterSource, SqlAndonSource, StatusSource};
use helpers::sqlite::{insert_master, insert_status, seeded_pool};
use std::sync::Arc;

const CLEAR: [Option<bool>; 6] = [None; 6];

#[tokio::test]
async fn test_fetch_all_ordered_by_machine() {
    let pool = seeded_pool().await;
    insert_status(&pool, 3, [None, None, Some(true), None, None, None], Some(12), None).await;
    insert_status(&pool, 1, [Some(true), Some(true), None, None, None, None], None, None).await;
    insert_status(&pool, 2, CLEAR, None, None).await;

    let source = SqlAndonSource::new(pool, SourceQualifier::default());
    let rows = source.fetch_all().await.unwrap();

    let ids: Vec<u8> = rows.iter().map(|r| r.machine_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let waiting = &rows[2];
    assert_eq!(waiting.waiting, Some(true));
    assert_eq!(waiting.wait_code, Some(12));
    assert_eq!(waiting.produced_count, Some(300));
    assert_eq!(waiting.lot_number.as_deref(), Some("L-0001"));
    assert!(waiting.updated_at.is_some());

    assert!(rows[1].all_flags_clear());
    assert_eq!(rows[1].errored, None);
}

#[tokio::test]
async fn test_fetch_one_by_machine() {
    let pool = seeded_pool().await;
    insert_status(&pool, 5, [None, Some(true), None, None, None, None], None, None).await;

    let source = SqlAndonSource::new(pool, SourceQualifier::default());
    let row = source.fetch_one(5).await.unwrap().unwrap();
    assert_eq!(row.running, Some(true));
    assert!(source.fetch_one(6).await.unwrap().is_none());
}

#[tokio::test]
async fn test_schema_qualified_tables() {
    let pool = seeded_pool().await;
    insert_status(&pool, 1, CLEAR, None, None).await;

    let source = SqlAndonSource::new(pool, SourceQualifier::new(None, None, Some("main")));
    assert_eq!(source.fetch_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_machine_fails_query() {
    let pool = seeded_pool().await;
    insert_status(&pool, 300, CLEAR, None, None).await;

    let source = SqlAndonSource::new(pool, SourceQualifier::default());
    let err = source.fetch_all().await.unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[tokio::test]
async fn test_master_queries_filter_disabled_rows() {
    let pool = seeded_pool().await;
    insert_master(&pool, "M_ERR", 1, 101, Some("spindle overload"), true).await;
    insert_master(&pool, "M_ERR", 1, 102, Some("retired code"), false).await;
    insert_master(&pool, "M_ERR", 1, 103, None, true).await;
    insert_master(&pool, "M_WAIT", 3, 12, Some("waiting for material"), true).await;
    insert_master(&pool, "M_WAIT", 3, 13, None, true).await;
    insert_master(&pool, "M_STOP", 4, 9, Some("manual stop"), true).await;

    let source = SqlAndonSource::new(pool, SourceQualifier::default());

    let errors = source.fetch_names(MasterNamespace::Error).await.unwrap();
    let codes: Vec<i16> = errors.iter().map(|e| e.code).collect();
    assert_eq!(errors.len(), 2);
    assert!(codes.contains(&101) && codes.contains(&103));

    let waits = source.fetch_names(MasterNamespace::Wait).await.unwrap();
    assert_eq!(waits.len(), 1);
    assert_eq!(waits[0].name.as_deref(), Some("waiting for material"));

    let stops = source.fetch_names(MasterNamespace::Stop).await.unwrap();
    assert_eq!(stops.len(), 1);
}

#[tokio::test]
async fn test_cache_over_sql_source() {
    let pool = seeded_pool().await;
    insert_master(&pool, "M_ERR", 1, 101, Some("spindle overload"), true).await;
    insert_master(&pool, "M_ERR", 1, 103, None, true).await;
    insert_master(&pool, "M_WAIT", 3, 12, Some("waiting for material"), true).await;

    let cache = MasterLookupCache::new(Arc::new(SqlAndonSource::new(
        pool,
        SourceQualifier::default(),
    )));
    let counts = cache.refresh().await.unwrap();

    assert_eq!((counts.errors, counts.waits, counts.stops), (2, 1, 0));
    assert_eq!(
        cache.lookup(MasterNamespace::Error, 1, 101).as_deref(),
        Some("spindle overload")
    );
    assert_eq!(cache.lookup(MasterNamespace::Error, 1, 103), None);
}

#[tokio::test]
async fn test_missing_table_fails_refresh_without_publishing() {
    let pool = seeded_pool().await;
    insert_master(&pool, "M_ERR", 1, 101, Some("spindle overload"), true).await;
    insert_master(&pool, "M_WAIT", 3, 12, Some("waiting for material"), true).await;
    insert_master(&pool, "M_STOP", 4, 9, Some("manual stop"), true).await;

    let cache = MasterLookupCache::new(Arc::new(SqlAndonSource::new(
        pool.clone(),
        SourceQualifier::default(),
    )));
    cache.refresh().await.unwrap();

    // Second of the three queries now fails
    sqlx::query("DROP TABLE M_WAIT").execute(&pool).await.unwrap();
    sqlx::query("UPDATE M_ERR SET ERR_NAME = 'renamed'")
        .execute(&pool)
        .await
        .unwrap();

    let err = cache.refresh().await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    assert_eq!(
        cache.lookup(MasterNamespace::Error, 1, 101).as_deref(),
        Some("spindle overload")
    );
    assert_eq!(
        cache.lookup(MasterNamespace::Wait, 3, 12).as_deref(),
        Some("waiting for material")
    );
    assert_eq!(
        cache.lookup(MasterNamespace::Stop, 4, 9).as_deref(),
        Some("manual stop")
    );
}
