use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wp_orm::backends::{MemoryPosts, PostStore};
use wp_orm::events::Dispatcher;
use wp_orm::model::{Action, ActionOutput};
use wp_orm::observers::ModelObserver;
use wp_orm::prelude::*;
use wp_orm::{DbQuery, EventContext, Query};

model! {
    /// Blog posts
    pub struct Post => post("post");
}

model! {
    pub struct Abc => post("abc");
}

model! {
    pub struct Category => term("category");
}

model! {
    pub struct Booking => table("bookings", "id");
}

model! {
    /// Rows that refuse to be deleted
    pub struct Archive => table("archives", "id") {
        fn doing(&self, action: &Action) -> Option<ModelResult<ActionOutput>> {
            match action {
                Action::Delete { .. } => Some(Ok(ActionOutput::Deleted(false))),
                _ => None,
            }
        }
    }
}

/// Table query without persistence support
#[derive(Clone)]
struct ReadOnlyQuery(DbQuery);

impl Query for ReadOnlyQuery {
    fn table(&self) -> &str {
        self.0.table()
    }

    fn primary_key(&self) -> &str {
        self.0.primary_key()
    }

    fn object_type(&self) -> &str {
        self.0.object_type()
    }

    fn set_table(&mut self, table: &str) {
        self.0.set_table(table)
    }

    fn set_primary_key(&mut self, primary_key: &str) {
        self.0.set_primary_key(primary_key)
    }

    fn set_object_type(&mut self, object_type: &str) {
        self.0.set_object_type(object_type)
    }

    fn query_vars(&self) -> wp_orm::query::VarsRef<'_> {
        self.0.query_vars()
    }

    fn query_vars_mut(&mut self) -> wp_orm::query::VarsMut<'_> {
        self.0.query_vars_mut()
    }

    fn get_by_id(&self, id: &Value) -> Option<Row> {
        self.0.get_by_id(id)
    }

    fn do_query(&self, vars: wp_orm::query::VarsRef<'_>) -> ModelResult<wp_orm::query::QueryResult> {
        self.0.do_query(vars)
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }
}

model! {
    pub struct Report => table("reports", "id") {
        fn new_query(ctx: &Context) -> Box<dyn Query> {
            Box::new(ReadOnlyQuery(DbQuery::new(ctx.connection().clone(), ctx.table("reports"))))
        }
    }
}

fn row(value: Value) -> Row {
    serde_json::from_value(value).unwrap()
}

type EventLog = Arc<Mutex<Vec<String>>>;

/// Context whose dispatcher records every lifecycle event of `object_type`
fn tracked(object_type: &str) -> (Context, Arc<Dispatcher>, EventLog) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Arc::new(Dispatcher::new());

    for event in [
        "retrieved", "saving", "saved", "creating", "created", "updating", "updated", "deleting", "deleted",
    ] {
        let log = log.clone();
        let name = event.to_string();
        dispatcher.on(&format!("wp/{}/{}", object_type, event), move |_| {
            log.lock().unwrap().push(name.clone());
        });
    }

    let ctx = Context::in_memory().with_events(dispatcher.clone());
    (ctx, dispatcher, log)
}

fn take(log: &EventLog) -> Vec<String> {
    std::mem::take(&mut *log.lock().unwrap())
}

#[test]
fn test_insert_and_fetch_by_id() {
    let ctx = Context::in_memory();
    let mut model = Abc::with_attributes(&ctx, row(json!({"post_type": "abc", "post_title": "First"})));

    assert!(model.save().unwrap());
    let id = model.id();
    assert!(id > 0);

    let fetched = Abc::find(&ctx, &json!(id)).unwrap().unwrap();
    assert_eq!(fetched.get("post_type"), Some(&json!("abc")));
    assert_eq!(fetched.get("post_title"), Some(&json!("First")));
    assert!(fetched.exists());
    assert!(fetched.is_clean(&[]));
}

#[test]
fn test_update_changes_stored_post() {
    let ctx = Context::in_memory();
    let mut model = Abc::with_attributes(&ctx, row(json!({"post_title": "First"})));
    model.save().unwrap();
    let id = model.id();

    assert!(model.update(row(json!({"post_type": "ddd"}))).unwrap());

    let stored = ctx.posts().get_post(id).unwrap().unwrap();
    assert_eq!(stored["post_type"], json!("ddd"));
    assert!(Abc::find(&ctx, &json!(id)).unwrap().is_none());
}

#[test]
fn test_post_type_defaults_to_model_type() {
    let ctx = Context::in_memory();
    let mut model = Abc::with_attributes(&ctx, row(json!({"post_title": "Typed"})));
    model.save().unwrap();

    let stored = ctx.posts().get_post(model.id()).unwrap().unwrap();
    assert_eq!(stored["post_type"], json!("abc"));
}

#[test]
fn test_insert_fires_events_in_order() {
    let (ctx, _, log) = tracked("post");
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Hello"})));

    assert!(post.save().unwrap());
    assert_eq!(take(&log), vec!["saving", "creating", "created", "saved"]);
    assert!(post.exists());
    assert!(post.recently_created());
    assert!(post.is_clean(&[]));
    assert_eq!(post.key(), Some(&json!(post.id())));
}

#[test]
fn test_update_fires_events_and_records_changes() {
    let (ctx, _, log) = tracked("post");
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Hello"})));
    post.save().unwrap();
    take(&log);

    post.set("post_title", "Goodbye");
    assert!(post.is_dirty(&["post_title"]));
    assert!(post.save().unwrap());

    assert_eq!(take(&log), vec!["saving", "updating", "updated", "saved"]);
    assert!(!post.recently_created());
    assert!(post.was_changed(&["post_title"]));
    assert_eq!(post.get_changes().get("post_title"), Some(&json!("Goodbye")));
    assert_eq!(post.get_original("post_title"), Some(&json!("Goodbye")));
}

#[test]
fn test_clean_save_skips_update() {
    let (ctx, _, log) = tracked("post");
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Hello"})));
    post.save().unwrap();
    take(&log);

    assert!(post.save().unwrap());
    assert_eq!(take(&log), vec!["saving", "saved"]);
}

#[test]
fn test_cancelled_creating_aborts_insert() {
    let store = Arc::new(MemoryPosts::new());
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.listen("wp/post/creating", |_| Outcome::Cancel);

    let ctx = Context::in_memory()
        .with_posts(store.clone())
        .with_events(dispatcher);
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Nope"})));

    assert!(!post.save().unwrap());
    assert!(!post.exists());
    assert!(store.is_empty());
}

#[test]
fn test_saving_listener_sees_pending_attributes() {
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.listen("wp/post/saving", |event: &EventContext<'_>| {
        if event.get("post_status") == Some(&json!("private")) {
            Outcome::Cancel
        } else {
            Outcome::Proceed
        }
    });
    let ctx = Context::in_memory().with_events(dispatcher);

    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Open"})));
    assert!(post.save().unwrap());

    post.set("post_status", "private");
    assert!(!post.save().unwrap());
    assert!(post.is_dirty(&["post_status"]));
}

#[test]
fn test_cancelled_deleting_keeps_post() {
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.listen("wp/post/deleting", |_| Outcome::Cancel);
    let ctx = Context::in_memory().with_events(dispatcher);

    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Keep"})));
    post.save().unwrap();

    assert_eq!(post.delete(true).unwrap(), Some(false));
    assert!(post.exists());
    assert!(ctx.posts().get_post(post.id()).unwrap().is_some());
}

#[test]
fn test_delete_unsaved_is_none() {
    let ctx = Context::in_memory();
    let mut post = Post::new(&ctx);
    assert_eq!(post.delete(false).unwrap(), None);
    assert!(!post.update(row(json!({"post_title": "x"}))).unwrap());
}

#[test]
fn test_soft_then_hard_delete() {
    let (ctx, _, log) = tracked("post");
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Trash me"})));
    post.save().unwrap();
    let id = post.id();
    take(&log);

    assert_eq!(post.delete(false).unwrap(), Some(true));
    assert_eq!(take(&log), vec!["deleting", "deleted"]);
    assert!(!post.exists());
    assert_eq!(ctx.posts().get_post(id).unwrap().unwrap()["post_status"], json!("trash"));

    let mut trashed = Post::find(&ctx, &json!(id)).unwrap().unwrap();
    assert_eq!(trashed.delete(false).unwrap(), Some(true));
    assert!(ctx.posts().get_post(id).unwrap().is_none());
}

#[test]
fn test_force_delete_skips_trash() {
    let ctx = Context::in_memory();
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Gone"})));
    post.save().unwrap();

    assert_eq!(post.delete(true).unwrap(), Some(true));
    assert!(ctx.posts().get_post(post.id()).unwrap().is_none());
}

#[test]
fn test_disabled_trash_deletes_permanently() {
    let config = ModelConfig {
        empty_trash_days: 0,
        ..ModelConfig::default()
    };
    let ctx = Context::in_memory_with(config).unwrap();
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Gone"})));
    post.save().unwrap();

    assert_eq!(post.delete(false).unwrap(), Some(true));
    assert!(ctx.posts().get_post(post.id()).unwrap().is_none());
}

#[test]
fn test_destroy_counts_deleted_records() {
    let ctx = Context::in_memory();
    let ids: Vec<Value> = (0..3)
        .map(|i| {
            let mut post = Post::with_attributes(&ctx, row(json!({"post_title": format!("Post {}", i)})));
            post.save().unwrap();
            json!(post.id())
        })
        .collect();

    let count = Post::destroy(&ctx, &[ids[0].clone(), ids[1].clone(), json!(999)]).unwrap();
    assert_eq!(count, 2);
    assert!(ctx.posts().get_post(ids[2].as_i64().unwrap()).unwrap().is_some());
}

#[test]
fn test_retrieved_fires_on_hydration() {
    let (ctx, _, log) = tracked("post");
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Read me"})));
    post.save().unwrap();
    take(&log);

    Post::find(&ctx, &json!(post.id())).unwrap().unwrap();
    assert_eq!(take(&log), vec!["retrieved"]);
}

#[test]
fn test_sanitizer_filters_attribute_writes() {
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.add_sanitizer("wp/post/sanitize_attribute", |key, value| match (key, value) {
        ("post_title", Value::String(title)) => Value::from(title.trim()),
        (_, value) => value,
    });
    let ctx = Context::in_memory().with_events(dispatcher);

    let mut post = Post::new(&ctx);
    post.set("post_title", "  padded  ");
    assert_eq!(post.get("post_title"), Some(&json!("padded")));
}

#[derive(Default)]
struct Counter {
    created: Mutex<usize>,
    deleted: Mutex<usize>,
}

impl ModelObserver for Counter {
    fn created(&self, _event: &EventContext<'_>) {
        *self.created.lock().unwrap() += 1;
    }

    fn updating(&self, event: &EventContext<'_>) -> Outcome {
        Outcome::from(!event.is_dirty(&["locked"]))
    }

    fn deleted(&self, _event: &EventContext<'_>) {
        *self.deleted.lock().unwrap() += 1;
    }
}

#[test]
fn test_observer_receives_typed_events() {
    let dispatcher = Arc::new(Dispatcher::new());
    let counter = Arc::new(Counter::default());
    dispatcher
        .observers()
        .register_for::<Booking>(counter.clone() as Arc<dyn ModelObserver>);
    let ctx = Context::in_memory().with_events(dispatcher.clone());

    let mut booking = Booking::with_attributes(&ctx, row(json!({"guest": "Ann"})));
    booking.save().unwrap();
    assert_eq!(*counter.created.lock().unwrap(), 1);

    booking.set("locked", true);
    assert!(!booking.save().unwrap());

    booking.revert("locked");
    booking.delete(false).unwrap();
    assert_eq!(*counter.deleted.lock().unwrap(), 1);

    // Other model types are not observed
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "x"})));
    post.save().unwrap();
    assert_eq!(*counter.created.lock().unwrap(), 1);
}

#[test]
fn test_table_update_is_keyed_by_original_id() {
    let ctx = Context::in_memory();
    let mut booking = Booking::with_attributes(&ctx, row(json!({"guest": "Ann"})));
    booking.save().unwrap();
    let id = booking.id();

    booking.set("id", 500);
    assert_eq!(booking.key_for_save(), Some(json!(id)));
    assert!(booking.save().unwrap());

    assert_eq!(booking.key_for_save(), Some(json!(500)));
    assert!(Booking::find(&ctx, &json!(id)).unwrap().is_none());
    let moved = Booking::find(&ctx, &json!(500)).unwrap().unwrap();
    assert_eq!(moved.get("guest"), Some(&json!("Ann")));
}

#[test]
fn test_model_handler_runs_before_backend() {
    let ctx = Context::in_memory();
    let mut archive = Archive::with_attributes(&ctx, row(json!({"title": "2019"})));
    assert!(archive.save().unwrap());

    assert_eq!(archive.delete(true).unwrap(), Some(false));
    assert!(Archive::find(&ctx, &json!(archive.id())).unwrap().is_some());
}

#[test]
fn test_unsupported_action_names_model() {
    let ctx = Context::in_memory();
    let mut report = Report::with_attributes(&ctx, row(json!({"title": "Q1"})));

    let err = report.save().unwrap_err();
    match err {
        ModelError::UnsupportedAction { action, model } => {
            assert_eq!(action, "insert");
            assert!(model.ends_with("Report"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_term_model_lifecycle() {
    let ctx = Context::in_memory();

    let mut nameless = Category::with_attributes(&ctx, row(json!({"slug": "nameless"})));
    assert!(!nameless.save().unwrap());

    let mut news = Category::with_attributes(&ctx, row(json!({"name": "News"})));
    assert!(news.save().unwrap());
    assert_eq!(news.key_name(), "term_id");

    let id = json!(news.id());
    assert!(news.update(row(json!({"name": "Headlines"}))).unwrap());
    let fetched = Category::find(&ctx, &id).unwrap().unwrap();
    assert_eq!(fetched.get("name"), Some(&json!("Headlines")));
    assert_eq!(fetched.get("id"), Some(&id));

    assert_eq!(news.delete(false).unwrap(), Some(true));
    assert!(Category::find(&ctx, &id).unwrap().is_none());
}

#[test]
fn test_serialization() {
    let ctx = Context::in_memory();
    let booking = Booking::with_attributes(&ctx, row(json!({"guest": "Ann", "nights": 2})));

    let json: Value = serde_json::from_str(&booking.to_json().unwrap()).unwrap();
    assert_eq!(json, json!({"guest": "Ann", "nights": 2}));
    assert_eq!(booking.to_string(), booking.to_json().unwrap());
    assert_eq!(booking.only(&["guest", "missing"]), row(json!({"guest": "Ann", "missing": null})));
}

#[test]
fn test_metadata_relation() {
    let ctx = Context::in_memory();
    let mut post = Post::with_attributes(&ctx, row(json!({"post_title": "Meta"})));
    post.save().unwrap();

    let meta = Metadata::new(&post);
    assert_eq!(meta.meta_type(), "post");
    assert_eq!(meta.get_meta("color"), None);

    assert!(meta.add_meta("color", "red").is_some());
    assert!(meta.add_meta("color", "blue").is_none());
    assert_eq!(meta.get_meta("color"), Some(json!("red")));

    assert!(meta.update_meta("color", "green"));
    assert_eq!(meta.get_meta("color"), Some(json!("green")));

    assert!(meta.delete_meta("color"));
    assert_eq!(meta.get_meta("color"), None);

    let mut category = Category::with_attributes(&ctx, row(json!({"name": "Tagged"})));
    category.save().unwrap();
    let term_meta = Metadata::new(&category);
    assert_eq!(term_meta.meta_type(), "term");
    assert!(term_meta.add_meta("color", "red").is_some());
    assert_eq!(Metadata::with_type(&post, "user").get_meta("color"), None);
}
