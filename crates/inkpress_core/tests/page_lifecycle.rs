use inkpress_core::db::{open_store_in_memory, Deadline, Filter};
use inkpress_core::model::page::{Page, PageContent};
use inkpress_core::model::snapshot::AuthorSnapshot;
use inkpress_core::service::page_service::{PageForm, PagePatch, PageService};
use inkpress_core::{ErrorClass, Store};
use uuid::Uuid;

fn author() -> AuthorSnapshot {
    AuthorSnapshot {
        uid: Uuid::new_v4(),
        username: "grace".to_string(),
    }
}

fn form(slug: &str) -> PageForm {
    PageForm {
        slug: slug.to_string(),
        title: "About".to_string(),
        content: "About this blog.".to_string(),
    }
}

fn stored_halves(store: &Store) -> (i64, i64) {
    let docs = store.documents(&Deadline::none());
    (
        docs.count::<Page>(&Filter::all()).unwrap(),
        docs.count::<PageContent>(&Filter::all()).unwrap(),
    )
}

#[test]
fn page_moves_through_publish_and_trash_axes_independently() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let pages = PageService::new(&store);
    let created = pages.create(&deadline, &author(), &form("about")).unwrap();
    assert_eq!(created.page.published_at, None);
    assert_eq!(created.page.deleted_at, None);

    pages.trash(&deadline, created.page.uid).unwrap();
    // Publishing is legal while trashed; the page stays hidden.
    let published = pages.publish(&deadline, created.page.uid).unwrap();
    assert!(published.applied);
    assert!(published.document.deleted_at.is_some());
    assert!(pages.get_published(&deadline, "about").is_err());

    let restored = pages.detrash(&deadline, created.page.uid).unwrap().document;
    assert_eq!(restored.published_at, published.document.published_at);
    let public = pages.get_published(&deadline, "about").unwrap();
    assert_eq!(public.content.content, "About this blog.");

    assert!(!pages.detrash(&deadline, created.page.uid).unwrap().applied);
    assert!(pages.depublish(&deadline, created.page.uid).unwrap().applied);
    assert!(!pages.depublish(&deadline, created.page.uid).unwrap().applied);
}

#[test]
fn create_and_delete_keep_halves_paired() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let pages = PageService::new(&store);

    let created = pages.create(&deadline, &author(), &form("contact")).unwrap();
    assert_eq!(created.content.uid, created.page.uid);
    assert_eq!(stored_halves(&store), (1, 1));
    assert_eq!(
        pages.get_with_content(&deadline, created.page.uid).unwrap(),
        created
    );

    pages.delete(&deadline, created.page.uid).unwrap();
    assert_eq!(stored_halves(&store), (0, 0));
    let err = pages.delete(&deadline, created.page.uid).unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[test]
fn failed_create_persists_neither_half() {
    let store = open_store_in_memory().unwrap();
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER fail_page_content BEFORE INSERT ON page_contents
             BEGIN SELECT RAISE(ABORT, 'injected'); END;",
        )
        .unwrap();

    let err = PageService::new(&store)
        .create(&Deadline::none(), &author(), &form("broken"))
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Internal);
    assert_eq!(stored_halves(&store), (0, 0));
}

#[test]
fn update_patches_only_given_fields() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let pages = PageService::new(&store);
    let created = pages.create(&deadline, &author(), &form("faq")).unwrap();

    let retitled = pages
        .update(
            &deadline,
            created.page.uid,
            &PagePatch {
                title: Some("Questions".to_string()),
                ..PagePatch::default()
            },
        )
        .unwrap();
    assert_eq!(retitled.page.title, "Questions");
    assert_eq!(retitled.page.slug, "faq");
    assert_eq!(retitled.content, created.content);

    let rewritten = pages
        .update(
            &deadline,
            created.page.uid,
            &PagePatch {
                content: Some("Answers.".to_string()),
                ..PagePatch::default()
            },
        )
        .unwrap();
    assert_eq!(rewritten.content.content, "Answers.");
    assert_eq!(
        pages
            .get_by_slug(&deadline, "faq")
            .unwrap()
            .content
            .content,
        "Answers."
    );

    let moved = pages
        .update(
            &deadline,
            created.page.uid,
            &PagePatch {
                slug: Some("  help ".to_string()),
                ..PagePatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.page.slug, "help");
    assert_eq!(
        pages.get_by_slug(&deadline, "help").unwrap().page.uid,
        created.page.uid
    );

    let missing = pages
        .update(&deadline, Uuid::new_v4(), &PagePatch::default())
        .unwrap_err();
    assert_eq!(missing.class(), ErrorClass::NotFound);
}

#[test]
fn duplicate_active_slug_is_a_conflict() {
    let store = open_store_in_memory().unwrap();
    let deadline = Deadline::none();
    let pages = PageService::new(&store);
    pages.create(&deadline, &author(), &form("terms")).unwrap();

    let err = pages.create(&deadline, &author(), &form("terms")).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(stored_halves(&store), (1, 1));
    assert_eq!(pages.count(&deadline, &Filter::all()).unwrap(), 1);
}
