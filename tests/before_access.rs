use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arbor::ArborError;
use arbor::construct::{Database, Listener};
use arbor::datatype::Value;
use arbor::query::Query;

fn setup() -> Database {
    let mut db = Database::new();
    for sentence in [
        "astrid.relationships.jordan.reputation!30",
        "astrid.relationships.jordan.tags.rivalry",
        "astrid.relationships.lee.reputation!20",
        "astrid.relationships.lee.tags.friend",
    ] {
        db.insert(sentence).unwrap();
    }
    db
}

fn counter() -> (Arc<AtomicUsize>, Listener) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let listener: Listener = Arc::new(move |_db: &mut Database| -> arbor::Result<()> {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (count, listener)
}

#[test]
fn fires_once_per_query_run() {
    let mut db = setup();
    let (count, listener) = counter();
    db.add_before_access_listener("astrid.relationships", listener).unwrap();

    let query = Query::from_clauses([
        "astrid.relationships.?other.reputation!?r",
        "astrid.relationships.?other.tags.?tag",
        "not astrid.relationships.?other.tags.enemy",
    ]);
    let result = query.run(&mut db).unwrap();
    assert!(result.success);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    query.run(&mut db).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2, "every run starts afresh");
}

#[test]
fn fires_on_every_direct_assert() {
    let mut db = setup();
    let (count, listener) = counter();
    db.add_before_access_listener("astrid", listener).unwrap();
    assert!(db.assert("astrid.relationships.jordan").unwrap());
    assert!(!db.assert("astrid.relationships.haley").unwrap());
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(db.assert("player").is_ok());
    assert_eq!(count.load(Ordering::SeqCst), 2, "player is not under astrid");
}

#[test]
fn untouched_prefixes_do_not_fire() {
    let mut db = setup();
    db.insert("player.relationships.jordan.reputation!-20").unwrap();
    let (count, listener) = counter();
    db.add_before_access_listener("player", listener).unwrap();
    Query::new()
        .clause("astrid.relationships.?other")
        .run(&mut db)
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn listeners_materialize_facts_lazily() {
    let mut db = setup();
    let listener: Listener = Arc::new(|db: &mut Database| -> arbor::Result<()> {
        db.insert("astrid.mood!happy")
    });
    db.add_before_access_listener("astrid", listener).unwrap();
    assert!(!db.tree().has_child(
        db.tree().child(db.tree().root(), "astrid").unwrap(),
        "mood"
    ));

    let result = Query::new().clause("astrid.mood!?m").run(&mut db).unwrap();
    assert!(result.success);
    assert_eq!(result.bindings[0]["?m"], Value::Symbol("happy".into()));
}

#[test]
fn prefix_cardinality_must_match() {
    let mut db = setup();
    let (count, listener) = counter();
    // astrid holds many children, so this prefix never matches a real path
    db.add_before_access_listener("astrid!relationships", listener).unwrap();
    Query::new()
        .clause("astrid.relationships.?other")
        .run(&mut db)
        .unwrap();
    db.assert("astrid.relationships.jordan").unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn removing_listeners() {
    let mut db = setup();
    let (first_count, first) = counter();
    let (second_count, second) = counter();
    db.add_before_access_listener("astrid", first.clone()).unwrap();
    db.add_before_access_listener("astrid", second).unwrap();

    db.assert("astrid").unwrap();
    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(second_count.load(Ordering::SeqCst), 1);

    assert!(db.remove_before_access_listener("astrid", &first));
    assert!(!db.remove_before_access_listener("astrid", &first));
    db.assert("astrid").unwrap();
    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(second_count.load(Ordering::SeqCst), 2);

    assert!(db.remove_all_before_access_listeners("astrid"));
    assert!(!db.remove_all_before_access_listeners("astrid"));
    db.assert("astrid").unwrap();
    assert_eq!(second_count.load(Ordering::SeqCst), 2);
}

#[test]
fn listener_errors_abort_the_query() {
    let mut db = setup();
    let listener: Listener = Arc::new(|_db: &mut Database| -> arbor::Result<()> {
        Err(ArborError::Structure("listener refused".into()))
    });
    db.add_before_access_listener("astrid", listener).unwrap();
    let err = Query::new()
        .clause("astrid.relationships.?other")
        .run(&mut db)
        .unwrap_err();
    assert!(matches!(err, ArborError::Structure(_)));
}

#[test]
fn syntax_errors_are_caught_before_anything_fires() {
    let mut db = setup();
    let (count, listener) = counter();
    db.add_before_access_listener("astrid", listener).unwrap();
    let err = Query::from_clauses(["astrid.relationships.?other", "like ?other"])
        .run(&mut db)
        .unwrap_err();
    assert!(matches!(err, ArborError::Syntax { .. }));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn prefixes_fire_when_their_own_path_is_expanded() {
    let mut db = setup();
    db.insert("astrid.mood!sad").unwrap();
    let (count, listener) = counter();
    db.add_before_access_listener("astrid.mood", listener).unwrap();

    // reading the child of astrid.mood expands astrid.mood itself
    Query::new().clause("astrid.mood!?m").run(&mut db).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // a pattern ending at jordan never expands it
    let (stopped_count, stopped) = counter();
    db.add_before_access_listener("astrid.relationships.jordan", stopped).unwrap();
    Query::new()
        .clause("astrid.relationships.?other")
        .run(&mut db)
        .unwrap();
    assert_eq!(stopped_count.load(Ordering::SeqCst), 0);
}
