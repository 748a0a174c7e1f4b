use inkpress_core::db::{open_store_in_memory, Deadline, FieldPath, Filter, FindOptions};
use inkpress_core::model::snapshot::AuthorSnapshot;
use inkpress_core::service::category_service::{CategoryForm, CategoryService};
use inkpress_core::service::comment_service::{CommentForm, CommentService};
use inkpress_core::service::post_service::{PostForm, PostPatch, PostService};
use inkpress_core::{ErrorClass, ServiceError};
use uuid::Uuid;

fn author() -> AuthorSnapshot {
    AuthorSnapshot {
        uid: Uuid::new_v4(),
        username: "ada".to_string(),
    }
}

fn post_form(slug: &str) -> PostForm {
    PostForm {
        slug: slug.to_string(),
        title: "Hello".to_string(),
        description: "First post".to_string(),
        content: "Hello, world.".to_string(),
        category_uids: Vec::new(),
        tags: vec!["Intro".to_string()],
    }
}

fn comment_form() -> CommentForm {
    CommentForm {
        email: "reader@example.org".to_string(),
        name: "Reader".to_string(),
        content: "Nice post".to_string(),
    }
}

#[test]
fn publish_flow_gates_comments() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let posts = PostService::new(&store);
    let comments = CommentService::new(&store);

    let created = posts
        .create(&deadline, &author(), &post_form("hello-world"))
        .unwrap();
    assert_eq!(created.post.published_at, None);
    assert_eq!(created.post.comment_count, 0);
    assert_eq!(created.content.uid, created.post.uid);

    let draft_comment = comments
        .create(&deadline, created.post.uid, &comment_form())
        .unwrap_err();
    assert_eq!(draft_comment.class(), ErrorClass::Conflict);

    let first = posts.publish(&deadline, created.post.uid).unwrap();
    assert!(first.applied);
    let published_at = first.document.published_at.unwrap();

    let second = posts.publish(&deadline, created.post.uid).unwrap();
    assert!(!second.applied);
    assert_eq!(second.document.published_at, Some(published_at));

    comments
        .create(&deadline, created.post.uid, &comment_form())
        .unwrap();
    let post = posts.get(&deadline, created.post.uid).unwrap();
    assert_eq!(post.comment_count, 1);
}

#[test]
fn created_post_reads_back_equal() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let categories = CategoryService::new(&store);
    let posts = PostService::new(&store);

    let rust = categories
        .create(
            &deadline,
            &CategoryForm {
                slug: "rust".to_string(),
                name: "Rust".to_string(),
            },
        )
        .unwrap();
    let mut form = post_form("typed-documents");
    form.category_uids = vec![rust.uid, rust.uid];
    form.tags = vec!["SQLite".to_string(), " sqlite ".to_string(), "serde".to_string()];

    let created = posts.create(&deadline, &author(), &form).unwrap();
    assert_eq!(created.post.categories.len(), 1);
    assert_eq!(created.post.categories[0].slug, "rust");
    assert_eq!(created.post.tags, vec!["sqlite", "serde"]);

    let loaded = posts.get_with_content(&deadline, created.post.uid).unwrap();
    assert_eq!(loaded, created);
    let by_slug = posts.get_by_slug(&deadline, "typed-documents").unwrap();
    assert_eq!(by_slug, created);
}

#[test]
fn unknown_or_trashed_category_is_not_found() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let categories = CategoryService::new(&store);
    let posts = PostService::new(&store);

    let old = categories
        .create(
            &deadline,
            &CategoryForm {
                slug: "old".to_string(),
                name: "Old".to_string(),
            },
        )
        .unwrap();
    categories.trash(&deadline, old.uid).unwrap();

    for uid in [old.uid, Uuid::new_v4()] {
        let mut form = post_form("orphan");
        form.category_uids = vec![uid];
        let err = posts.create(&deadline, &author(), &form).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "category", .. }));
    }
    assert_eq!(posts.count(&deadline, &Filter::all()).unwrap(), 0);
}

#[test]
fn trash_then_detrash_restores_only_deleted_at() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let posts = PostService::new(&store);
    let created = posts
        .create(&deadline, &author(), &post_form("round-trip"))
        .unwrap();

    let trashed = posts.trash(&deadline, created.post.uid).unwrap();
    assert!(trashed.applied);
    assert!(trashed.document.deleted_at.is_some());
    assert!(!posts.trash(&deadline, created.post.uid).unwrap().applied);

    let restored = posts.detrash(&deadline, created.post.uid).unwrap().document;
    assert_eq!(restored.deleted_at, None);
    assert_eq!(restored.slug, created.post.slug);
    assert_eq!(restored.title, created.post.title);
    assert_eq!(restored.tags, created.post.tags);
    assert_eq!(restored.published_at, created.post.published_at);
    assert_eq!(restored.comment_count, created.post.comment_count);
    assert_eq!(restored.created_at, created.post.created_at);
}

#[test]
fn slug_is_unique_among_active_posts_only() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let posts = PostService::new(&store);
    let first = posts
        .create(&deadline, &author(), &post_form("same-slug"))
        .unwrap();

    let duplicate = posts
        .create(&deadline, &author(), &post_form("same-slug"))
        .unwrap_err();
    assert_eq!(duplicate.class(), ErrorClass::Conflict);

    posts.trash(&deadline, first.post.uid).unwrap();
    let reused = posts
        .create(&deadline, &author(), &post_form("same-slug"))
        .unwrap();
    assert_ne!(reused.post.uid, first.post.uid);

    // Restoring the original would collide with the new active post.
    let err = posts.detrash(&deadline, first.post.uid).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);
}

#[test]
fn update_patches_fields_without_touching_lifecycle() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let posts = PostService::new(&store);
    let created = posts
        .create(&deadline, &author(), &post_form("patch-me"))
        .unwrap();
    posts.publish(&deadline, created.post.uid).unwrap();
    posts.trash(&deadline, created.post.uid).unwrap();
    let before = posts.get(&deadline, created.post.uid).unwrap();

    let patch = PostPatch {
        title: Some("Patched".to_string()),
        content: Some("Patched body".to_string()),
        ..PostPatch::default()
    };
    let updated = posts.update(&deadline, created.post.uid, &patch).unwrap();
    assert_eq!(updated.post.title, "Patched");
    assert_eq!(updated.post.description, before.description);
    assert_eq!(updated.post.published_at, before.published_at);
    assert_eq!(updated.post.deleted_at, before.deleted_at);
    assert_eq!(updated.content.content, "Patched body");
    assert!(updated.post.updated_at >= before.updated_at);

    let moved = posts
        .update(
            &deadline,
            created.post.uid,
            &PostPatch {
                slug: Some(" patched-slug  ".to_string()),
                ..PostPatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.post.slug, "patched-slug");

    let invalid = PostPatch {
        slug: Some("Not A Slug".to_string()),
        ..PostPatch::default()
    };
    let err = posts
        .update(&deadline, created.post.uid, &invalid)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn published_reads_hide_drafts_and_trash() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let posts = PostService::new(&store);
    let created = posts
        .create(&deadline, &author(), &post_form("visible"))
        .unwrap();

    let draft = posts.get_published(&deadline, "visible").unwrap_err();
    assert_eq!(draft.class(), ErrorClass::NotFound);

    posts.publish(&deadline, created.post.uid).unwrap();
    assert!(posts.get_published(&deadline, "visible").is_ok());

    posts.trash(&deadline, created.post.uid).unwrap();
    assert!(posts.get_published(&deadline, "visible").is_err());
    assert!(posts.get_by_slug(&deadline, "visible").is_err());
    // Identity reads see every state.
    assert!(posts.get(&deadline, created.post.uid).is_ok());

    posts.detrash(&deadline, created.post.uid).unwrap();
    let depublished = posts.depublish(&deadline, created.post.uid).unwrap();
    assert!(depublished.applied);
    assert_eq!(depublished.document.published_at, None);
    assert!(posts.get_published(&deadline, "visible").is_err());
}

#[test]
fn list_passes_filter_and_options_through() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let posts = PostService::new(&store);
    for slug in ["one", "two", "three"] {
        let created = posts.create(&deadline, &author(), &post_form(slug)).unwrap();
        if slug != "two" {
            posts.publish(&deadline, created.post.uid).unwrap();
        }
    }

    let published = Filter::not_null(FieldPath::parse("published_at").unwrap());
    assert_eq!(posts.count(&deadline, &published).unwrap(), 2);
    let listed = posts
        .list(&deadline, &published, &FindOptions::new().limit(1))
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn delete_removes_content_and_comments() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let posts = PostService::new(&store);
    let comments = CommentService::new(&store);
    let created = posts
        .create(&deadline, &author(), &post_form("doomed"))
        .unwrap();
    posts.publish(&deadline, created.post.uid).unwrap();
    let top = comments
        .create(&deadline, created.post.uid, &comment_form())
        .unwrap();
    comments.reply(&deadline, top.uid, &comment_form()).unwrap();

    posts.delete(&deadline, created.post.uid).unwrap();

    let err = posts.get(&deadline, created.post.uid).unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    assert!(comments.get(&deadline, top.uid).is_err());
    let second = posts.delete(&deadline, created.post.uid).unwrap_err();
    assert_eq!(second.class(), ErrorClass::NotFound);
}
