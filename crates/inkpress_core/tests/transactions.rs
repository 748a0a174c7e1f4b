use inkpress_core::db::{
    open_store, open_store_in_memory, Deadline, FallbackPolicy, Filter, StoreConfig, StoreError,
};
use inkpress_core::model::category::Category;
use inkpress_core::model::post::{Post, PostContent};
use inkpress_core::model::snapshot::AuthorSnapshot;
use inkpress_core::service::post_service::{PostForm, PostPatch, PostService};
use inkpress_core::{ErrorClass, Store};
use std::time::Duration;
use uuid::Uuid;

fn author() -> AuthorSnapshot {
    AuthorSnapshot {
        uid: Uuid::new_v4(),
        username: "ada".to_string(),
    }
}

fn form(slug: &str) -> PostForm {
    PostForm {
        slug: slug.to_string(),
        title: "Title".to_string(),
        content: "Body".to_string(),
        ..PostForm::default()
    }
}

fn count<D: inkpress_core::db::document::Document>(store: &Store) -> i64 {
    store
        .documents(&Deadline::none())
        .count::<D>(&Filter::all())
        .unwrap()
}

fn inject_failure(store: &Store, sql: &str) {
    store.connection().execute_batch(sql).unwrap();
}

#[test]
fn failed_unit_of_work_leaves_no_partial_writes() {
    let store = open_store_in_memory().unwrap();

    let result = store.transact(&Deadline::none(), |docs| -> Result<(), StoreError> {
        docs.save(&Category::new("kept", "Kept"))?;
        Err(StoreError::InvalidFilter("boom".to_string()))
    });
    assert!(result.is_err());
    assert_eq!(count::<Category>(&store), 0);
}

#[test]
fn post_create_rolls_back_metadata_when_content_write_fails() {
    let store = open_store_in_memory().unwrap();
    inject_failure(
        &store,
        "CREATE TRIGGER fail_content BEFORE INSERT ON post_contents
         BEGIN SELECT RAISE(ABORT, 'injected'); END;",
    );

    let err = PostService::new(&store)
        .create(&Deadline::none(), &author(), &form("hello-world"))
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Internal);
    assert_eq!(count::<Post>(&store), 0);
    assert_eq!(count::<PostContent>(&store), 0);
}

#[test]
fn post_update_rolls_back_metadata_when_content_update_fails() {
    let store = open_store_in_memory().unwrap();
    let service = PostService::new(&store);
    let created = service
        .create(&Deadline::none(), &author(), &form("hello-world"))
        .unwrap();
    inject_failure(
        &store,
        "CREATE TRIGGER fail_content BEFORE UPDATE ON post_contents
         BEGIN SELECT RAISE(ABORT, 'injected'); END;",
    );

    let patch = PostPatch {
        title: Some("Renamed".to_string()),
        content: Some("New body".to_string()),
        ..PostPatch::default()
    };
    assert!(service
        .update(&Deadline::none(), created.post.uid, &patch)
        .is_err());

    let stored = service
        .get_with_content(&Deadline::none(), created.post.uid)
        .unwrap();
    assert_eq!(stored.post.title, "Title");
    assert_eq!(stored.content.content, "Body");
}

#[test]
fn post_delete_keeps_both_halves_when_metadata_delete_fails() {
    let store = open_store_in_memory().unwrap();
    let service = PostService::new(&store);
    let created = service
        .create(&Deadline::none(), &author(), &form("hello-world"))
        .unwrap();
    inject_failure(
        &store,
        "CREATE TRIGGER fail_post_delete BEFORE DELETE ON posts
         BEGIN SELECT RAISE(ABORT, 'injected'); END;",
    );

    assert!(service.delete(&Deadline::none(), created.post.uid).is_err());
    assert_eq!(count::<Post>(&store), 1);
    assert_eq!(count::<PostContent>(&store), 1);
}

#[test]
fn nested_unit_of_work_joins_the_outer_transaction() {
    let store = open_store_in_memory().unwrap();

    let result = store.transact(&Deadline::none(), |docs| -> Result<(), StoreError> {
        docs.save(&Category::new("outer", "Outer"))?;
        store.transact(&Deadline::none(), |inner| {
            inner.save(&Category::new("inner", "Inner"))
        })?;
        Err(StoreError::InvalidFilter("abort outer".to_string()))
    });
    assert!(result.is_err());
    assert_eq!(count::<Category>(&store), 0);
}

#[test]
fn deadline_expiring_during_work_rolls_back_before_commit() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::after(Duration::from_millis(30));

    let result = store.transact(&deadline, |docs| -> Result<(), StoreError> {
        docs.save(&Category::new("slow", "Slow"))?;
        std::thread::sleep(Duration::from_millis(60));
        Ok(())
    });
    assert!(matches!(result, Err(StoreError::Timeout)));
    assert_eq!(count::<Category>(&store), 0);
}

#[test]
fn lock_contention_is_retryable_and_never_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let holder = open_store(&StoreConfig::file(&path).with_migrate_on_open(true)).unwrap();

    let strict = open_store(
        &StoreConfig::file(&path).with_busy_timeout(Duration::from_millis(20)),
    )
    .unwrap();
    let lenient = open_store(
        &StoreConfig::file(&path)
            .with_busy_timeout(Duration::from_millis(20))
            .with_transaction_fallback(FallbackPolicy::AllowNonTransactional),
    )
    .unwrap();

    holder
        .connection()
        .execute_batch("BEGIN IMMEDIATE;")
        .unwrap();

    for store in [&strict, &lenient] {
        let mut ran = false;
        let result = store.transact(&Deadline::none(), |docs| {
            ran = true;
            docs.save(&Category::new("contended", "Contended"))
        });
        let err = result.unwrap_err();
        assert!(matches!(err, StoreError::Busy(_)), "got {err:?}");
        assert!(err.is_retryable());
        assert!(!ran);
    }

    holder.connection().execute_batch("ROLLBACK;").unwrap();
    assert_eq!(count::<Category>(&strict), 0);

    // Once the lock is released the same unit of work goes through.
    strict
        .transact(&Deadline::none(), |docs| {
            docs.save(&Category::new("contended", "Contended"))
        })
        .unwrap();
    assert_eq!(count::<Category>(&lenient), 1);
}

#[test]
fn commit_failure_is_aborted_retryable_and_leaves_nothing() {
    let store = open_store_in_memory().unwrap();
    inject_failure(
        &store,
        "PRAGMA foreign_keys = ON;
         CREATE TABLE owners (id INTEGER PRIMARY KEY);
         CREATE TABLE claims (
             id INTEGER PRIMARY KEY,
             owner_id INTEGER REFERENCES owners(id) DEFERRABLE INITIALLY DEFERRED
         );
         CREATE TRIGGER orphan_claim AFTER INSERT ON categories
         BEGIN INSERT INTO claims (owner_id) VALUES (404); END;",
    );

    let mut worked = false;
    let result = store.transact(&Deadline::none(), |docs| {
        docs.save(&Category::new("deferred", "Deferred"))?;
        worked = true;
        Ok::<_, StoreError>(())
    });

    let err = result.unwrap_err();
    assert!(worked);
    assert!(matches!(err, StoreError::TransactionAborted(_)), "got {err:?}");
    assert!(err.is_retryable());
    assert!(store.connection().is_autocommit());
    assert_eq!(count::<Category>(&store), 0);
    let claims: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM claims", [], |row| row.get(0))
        .unwrap();
    assert_eq!(claims, 0);
}
