use arbor::ArborError;
use arbor::construct::Database;

#[test]
fn create_retrieve_update_delete() {
    let mut db = Database::new();
    db.insert("A.relationships.B.reputation!10").unwrap();
    db.insert("A.relationships.B.type!rivalry").unwrap();

    assert!(!db.assert("A.relationships.B.reputation!19").unwrap());
    assert!(db.assert("A.relationships.B.type").unwrap());
    assert!(db.assert("A").unwrap());

    // update through the exclusive separator
    db.insert("A.relationships.B.reputation!-99").unwrap();
    assert!(
        !db.assert("A.relationships.B.reputation.-99").unwrap(),
        "intermediate cardinality must match"
    );
    assert!(db.assert("A.relationships.B.reputation!-99").unwrap());
    assert!(!db.assert("A.relationships.B.reputation!10").unwrap(), "old value replaced");

    assert!(db.delete("A.relationships.B.reputation").unwrap());
    assert!(!db.assert("A.relationships.B.reputation").unwrap());
    assert!(db.assert("A.relationships.B.type!rivalry").unwrap(), "siblings untouched");
}

#[test]
fn assert_false_until_inserted() {
    let mut db = Database::new();
    assert!(!db.assert("astrid.mood!happy").unwrap());
    db.insert("astrid.mood!happy").unwrap();
    assert!(db.assert("astrid.mood!happy").unwrap());
    assert!(db.assert("astrid.mood").unwrap());
}

#[test]
fn insert_is_idempotent() {
    let mut db = Database::new();
    db.insert("a.b.c").unwrap();
    let nodes = db.tree().len();
    db.insert("a.b.c").unwrap();
    assert_eq!(db.tree().len(), nodes, "no duplicate nodes");
    assert!(db.assert("a.b.c").unwrap());
}

#[test]
fn one_cardinality_overwrites() {
    let mut db = Database::new();
    db.insert("A!x").unwrap();
    db.insert("A!y").unwrap();
    assert!(db.assert("A!y").unwrap());
    assert!(!db.assert("A!x").unwrap());
}

#[test]
fn many_cardinality_accumulates() {
    let mut db = Database::new();
    db.insert("A.x").unwrap();
    db.insert("A.y").unwrap();
    assert!(db.assert("A.x").unwrap());
    assert!(db.assert("A.y").unwrap());
}

#[test]
fn cardinality_mismatch_fails() {
    let mut db = Database::new();
    db.insert("A.x").unwrap();
    let err = db.insert("A!y").unwrap_err();
    assert!(matches!(err, ArborError::Cardinality { .. }), "unexpected error: {err}");
    assert!(db.assert("A.x").unwrap(), "tree left as it was");
    assert!(!db.assert("A.y").unwrap());
}

#[test]
fn variables_are_rejected() {
    let mut db = Database::new();
    assert!(matches!(db.insert("a.?x").unwrap_err(), ArborError::Variable { .. }));
    assert!(matches!(db.assert("a.?x").unwrap_err(), ArborError::Variable { .. }));
    assert!(matches!(db.delete("a.?x").unwrap_err(), ArborError::Variable { .. }));
    assert_eq!(db.tree().len(), 1, "nothing inserted");
}

#[test]
fn malformed_paths_are_syntax_errors() {
    let mut db = Database::new();
    assert!(matches!(db.insert("a..b").unwrap_err(), ArborError::Syntax { .. }));
    assert!(matches!(db.assert("").unwrap_err(), ArborError::Syntax { .. }));
}

#[test]
fn deleting_nothing_is_a_no_op() {
    let mut db = Database::new();
    assert!(!db.delete("nope").unwrap());
    assert!(!db.delete("nope.nothing.here").unwrap());
    db.insert("a.b").unwrap();
    assert!(!db.delete("a.c").unwrap());
    assert!(db.assert("a.b").unwrap());
}

#[test]
fn round_trip() {
    let mut db = Database::new();
    for sentence in ["x.y!1", "x.z.w", "player.relationships.jordan.reputation!-20"] {
        db.insert(sentence).unwrap();
        assert!(db.assert(sentence).unwrap(), "{sentence} after insert");
        assert!(db.delete(sentence).unwrap(), "{sentence} deleted");
        assert!(!db.assert(sentence).unwrap(), "{sentence} after delete");
    }
}

#[test]
fn delete_removes_the_subtree() {
    let mut db = Database::new();
    db.insert("a.b.c.d").unwrap();
    db.insert("a.b.e").unwrap();
    assert_eq!(db.tree().len(), 6);
    assert!(db.delete("a.b").unwrap());
    assert_eq!(db.tree().len(), 2, "only root and a remain");
    assert!(!db.assert("a.b.c.d").unwrap());
}

#[test]
fn clear_empties_the_tree() {
    let mut db = Database::new();
    db.insert("a.b").unwrap();
    db.insert("c!d").unwrap();
    db.clear();
    assert!(db.tree().is_empty());
    assert!(!db.assert("a").unwrap());
    db.insert("a.b").unwrap();
    assert!(db.assert("a.b").unwrap(), "usable after clear");
}
