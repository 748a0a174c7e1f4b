use inkpress_core::db::document::Document;
use inkpress_core::db::{
    open_store_in_memory, CancelToken, Deadline, FieldPath, Filter, FindOptions, SortDirection,
    StoreError,
};
use inkpress_core::model::category::Category;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct SlowRow {
    uid: Uuid,
}

impl Document for SlowRow {
    const COLLECTION: &'static str = "slow_rows";

    fn uid(&self) -> Uuid {
        self.uid
    }
}

fn path(value: &str) -> FieldPath {
    FieldPath::parse(value).unwrap()
}

#[test]
fn saved_document_reads_back_equal() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let category = Category::new("rust", "Rust");

    docs.save(&category).unwrap();
    let loaded = docs
        .read_one::<Category>(&Filter::uid(category.uid))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, category);
}

#[test]
fn read_one_without_match_is_none_not_error() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let missing = docs
        .read_one::<Category>(&Filter::uid(Uuid::new_v4()))
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn duplicate_identity_is_a_conflict() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let category = Category::new("rust", "Rust");
    docs.save(&category).unwrap();

    let mut clone = category.clone();
    clone.slug = "other".to_string();
    assert!(matches!(
        docs.save(&clone),
        Err(StoreError::Conflict { collection: "categories", .. })
    ));
}

#[test]
fn update_and_delete_of_absent_identity_are_not_found() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let ghost = Category::new("ghost", "Ghost");

    assert!(matches!(docs.update(&ghost), Err(StoreError::NotFound { .. })));
    assert!(matches!(docs.delete(&ghost), Err(StoreError::NotFound { .. })));
}

#[test]
fn active_only_unique_index_allows_reuse_after_trash() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let mut first = Category::new("news", "News");
    docs.save(&first).unwrap();

    let second = Category::new("news", "More news");
    assert!(matches!(docs.save(&second), Err(StoreError::Conflict { .. })));

    first.deleted_at = Some(1);
    docs.update(&first).unwrap();
    docs.save(&second).unwrap();
}

#[test]
fn filters_sort_and_paginate() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    for (index, slug) in ["alpha", "bravo", "charlie", "delta"].iter().enumerate() {
        let mut category = Category::new(*slug, slug.to_uppercase());
        category.created_at = index as i64 * 10;
        docs.save(&category).unwrap();
    }

    let newest_first = FindOptions::new().sort_by(path("created_at"), SortDirection::Descending);
    let all = docs
        .read_many::<Category>(&Filter::all(), &newest_first)
        .unwrap();
    let slugs = all.iter().map(|c| c.slug.as_str()).collect::<Vec<_>>();
    assert_eq!(slugs, ["delta", "charlie", "bravo", "alpha"]);

    let page = docs
        .read_many::<Category>(&Filter::all(), &newest_first.clone().skip(1).limit(2))
        .unwrap();
    let slugs = page.iter().map(|c| c.slug.as_str()).collect::<Vec<_>>();
    assert_eq!(slugs, ["charlie", "bravo"]);

    let picked = Filter::is_in(path("slug"), ["alpha", "delta"]);
    assert_eq!(docs.count::<Category>(&picked).unwrap(), 2);
    let range = Filter::gt(path("created_at"), 0).and(Filter::lt(path("created_at"), 30));
    assert_eq!(docs.count::<Category>(&range).unwrap(), 2);
    let either = Filter::eq(path("slug"), "alpha").or(Filter::eq(path("name"), "BRAVO"));
    assert_eq!(docs.count::<Category>(&either).unwrap(), 2);
    let not_alpha = Filter::ne(path("slug"), "alpha").and(Filter::is_null(path("deleted_at")));
    assert_eq!(docs.count::<Category>(&not_alpha).unwrap(), 3);
}

#[test]
fn update_if_respects_guard() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let mut category = Category::new("guarded", "Guarded");
    docs.save(&category).unwrap();

    category.name = "Changed".to_string();
    let rejected = docs
        .update_if(&category, &Filter::not_null(path("deleted_at")))
        .unwrap();
    assert!(!rejected);
    let stored = docs
        .read_one::<Category>(&Filter::uid(category.uid))
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Guarded");

    let applied = docs
        .update_if(&category, &Filter::is_null(path("deleted_at")))
        .unwrap();
    assert!(applied);
}

#[test]
fn field_update_leaves_other_fields_of_a_stale_copy_alone() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let category = Category::new("partial", "Partial");
    docs.save(&category).unwrap();

    let mut stale = category.clone();
    let mut fresh = category.clone();
    fresh.name = "Renamed elsewhere".to_string();
    docs.update(&fresh).unwrap();

    stale.deleted_at = Some(42);
    let applied = docs
        .update_fields_if(&stale, &[path("deleted_at")], &Filter::is_null(path("deleted_at")))
        .unwrap();
    assert!(applied);

    let stored = docs
        .read_one::<Category>(&Filter::uid(category.uid))
        .unwrap()
        .unwrap();
    assert_eq!(stored.deleted_at, Some(42));
    assert_eq!(stored.name, "Renamed elsewhere");

    stale.deleted_at = None;
    let again = docs
        .update_fields_if(&stale, &[path("deleted_at")], &Filter::is_null(path("deleted_at")))
        .unwrap();
    assert!(!again);

    let restored = docs
        .update_fields_if(&stale, &[path("deleted_at")], &Filter::not_null(path("deleted_at")))
        .unwrap();
    assert!(restored);
    let stored = docs
        .read_one::<Category>(&Filter::uid(category.uid))
        .unwrap()
        .unwrap();
    assert_eq!(stored.deleted_at, None);
}

#[test]
fn increment_and_delete_many() {
    let store = open_store_in_memory().unwrap();
    let docs = store.documents(&Deadline::none());
    let category = Category::new("counted", "Counted");
    docs.save(&category).unwrap();

    assert!(docs
        .increment::<Category>(category.uid, &path("created_at"), 5)
        .unwrap());
    assert!(!docs
        .increment::<Category>(Uuid::new_v4(), &path("created_at"), 5)
        .unwrap());
    let stored = docs
        .read_one::<Category>(&Filter::uid(category.uid))
        .unwrap()
        .unwrap();
    assert_eq!(stored.created_at, category.created_at + 5);

    docs.save(&Category::new("second", "Second")).unwrap();
    let removed = docs.delete_many::<Category>(&Filter::all()).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(docs.count::<Category>(&Filter::all()).unwrap(), 0);
}

#[test]
fn expired_or_cancelled_deadline_fails_before_touching_the_store() {
    let store = open_store_in_memory().unwrap();

    let expired = store.documents(&Deadline::after(Duration::ZERO));
    assert!(matches!(
        expired.save(&Category::new("late", "Late")),
        Err(StoreError::Timeout)
    ));

    let token = CancelToken::new();
    token.cancel();
    let cancelled = store.documents(&Deadline::none().with_cancel(token));
    assert!(matches!(
        cancelled.count::<Category>(&Filter::all()),
        Err(StoreError::Cancelled)
    ));

    let live = store.documents(&Deadline::none());
    assert_eq!(live.count::<Category>(&Filter::all()).unwrap(), 0);
}

#[test]
fn long_running_statement_is_interrupted_at_the_deadline() {
    let store = open_store_in_memory().unwrap();
    store
        .connection()
        .execute_batch(
            "CREATE VIEW slow_rows AS
             WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 1000000000)
             SELECT CAST(i AS TEXT) AS uid, '{}' AS body FROM n;",
        )
        .unwrap();

    let docs = store.documents(&Deadline::after(Duration::from_millis(50)));
    let err = docs.count::<SlowRow>(&Filter::all()).unwrap_err();
    assert!(matches!(err, StoreError::Timeout), "unexpected error: {err}");

    // The progress handler is removed once the call returns.
    let docs = store.documents(&Deadline::none());
    assert_eq!(docs.count::<Category>(&Filter::all()).unwrap(), 0);
}

#[test]
fn invalid_field_paths_are_rejected() {
    assert!(matches!(
        FieldPath::parse("slug; DROP TABLE posts"),
        Err(StoreError::InvalidFilter(_))
    ));
}
