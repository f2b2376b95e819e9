use uuid::Uuid;

use pfstore::{
    DatabaseConfig, MatchPolicy, Order, PfidEntry, Predicate, Selector, Storage, StorageError,
    TableKind, TableStore, Value,
};

fn memory_storage() -> Storage {
    Storage::new(DatabaseConfig::sqlite(":memory:"))
}

#[test]
fn create_then_load_yields_zero() {
    let storage = memory_storage();
    storage.ledger.create_record("alice").unwrap();
    assert_eq!(storage.ledger.load_amount("alice").unwrap(), Some(0));
}

#[test]
fn duplicate_create_fails_and_leaves_the_amount_alone() {
    let storage = memory_storage();
    storage.ledger.create_record("alice").unwrap();

    match storage.ledger.create_record("alice") {
        Err(StorageError::DuplicateRecord(name)) => assert_eq!(name, "alice"),
        other => panic!("expected DuplicateRecord, got {other:?}"),
    }
    assert_eq!(storage.ledger.load_amount("alice").unwrap(), Some(0));
}

#[test]
fn loading_a_missing_name_returns_none() {
    let storage = memory_storage();
    assert_eq!(storage.ledger.load_amount("nobody").unwrap(), None);
}

#[test]
fn transfer_updates_both_balances_together() {
    let storage = memory_storage();
    storage.ledger.create_record("alice").unwrap();
    storage.ledger.create_record("bob").unwrap();

    storage.transfers.transfer("alice", 900, "bob", 100).unwrap();

    assert_eq!(storage.ledger.load_amount("alice").unwrap(), Some(900));
    assert_eq!(storage.ledger.load_amount("bob").unwrap(), Some(100));
}

#[test]
fn failed_transfer_changes_neither_balance() {
    let storage = memory_storage();
    storage.ledger.create_record("alice").unwrap();
    storage.transfers.transfer("alice", 500, "alice", 500).unwrap();

    // partner has no record, so the second update fails after the first
    // already ran; the whole transaction must unwind
    match storage.transfers.transfer("alice", 5, "nobody", 10) {
        Err(StorageError::MissingRecord(name)) => assert_eq!(name, "nobody"),
        other => panic!("expected MissingRecord, got {other:?}"),
    }
    assert_eq!(storage.ledger.load_amount("alice").unwrap(), Some(500));
}

#[test]
fn negative_amounts_are_stored_verbatim() {
    // no balance-validity policy lives in the storage core
    let storage = memory_storage();
    storage.ledger.create_record("alice").unwrap();
    storage.ledger.create_record("bob").unwrap();

    storage.transfers.transfer("alice", -100, "bob", 100).unwrap();

    assert_eq!(storage.ledger.load_amount("alice").unwrap(), Some(-100));
    assert_eq!(storage.ledger.load_amount("bob").unwrap(), Some(100));
}

#[test]
fn schema_creation_is_idempotent_and_preserves_rows() {
    let storage = memory_storage();
    storage.ledger.create_record("alice").unwrap();

    for _ in 0..4 {
        storage.schema.ensure_money_table().unwrap();
    }
    assert_eq!(storage.ledger.load_amount("alice").unwrap(), Some(0));

    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    for _ in 0..4 {
        storage.schema.ensure_table(TableKind::ProfundusId, false).unwrap();
    }
    assert_eq!(storage.pfids.count(&Predicate::All).unwrap(), 1);
}

#[test]
fn drop_if_exists_recreates_the_table_empty() {
    let storage = memory_storage();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    assert_eq!(storage.pfids.count(&Predicate::All).unwrap(), 1);

    storage.schema.ensure_table(TableKind::ProfundusId, true).unwrap();
    assert_eq!(storage.pfids.count(&Predicate::All).unwrap(), 0);
}

#[test]
fn schema_failures_are_reported_and_recoverable() {
    let storage = memory_storage();
    storage.ledger.create_record("alice").unwrap();

    // squat on the table's name with a view; the recreate's DROP TABLE
    // cannot remove it and the DDL batch fails
    storage
        .connection()
        .with_txn(|tx| {
            tx.execute("CREATE VIEW profundus_id AS SELECT 1 AS seqID", &[])
                .map(|_| ())
                .map_err(|e| StorageError::Schema(e.to_string()))
        })
        .unwrap();

    match storage.schema.ensure_table(TableKind::ProfundusId, true) {
        Err(StorageError::Schema(_)) => {}
        other => panic!("expected Schema, got {other:?}"),
    }

    // the failure rolled back; the connection and the ledger still work
    storage.ping().unwrap();
    assert_eq!(storage.ledger.load_amount("alice").unwrap(), Some(0));

    storage
        .connection()
        .with_txn(|tx| {
            tx.execute("DROP VIEW profundus_id", &[])
                .map(|_| ())
                .map_err(|e| StorageError::Schema(e.to_string()))
        })
        .unwrap();
    storage.schema.ensure_table(TableKind::ProfundusId, true).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
}

#[test]
fn undefined_table_kinds_are_an_explicit_failure() {
    let storage = memory_storage();
    match storage.schema.ensure_table(TableKind::User, false) {
        Err(StorageError::SchemaUndefined(kind)) => assert_eq!(kind, TableKind::User),
        other => panic!("expected SchemaUndefined, got {other:?}"),
    }
}

#[test]
fn ping_fails_without_a_connection_and_reconnect_is_lazy() {
    let storage = memory_storage();
    assert!(storage.ping().is_err());

    storage.connect().unwrap();
    storage.ping().unwrap();

    storage.disconnect().unwrap();
    assert!(storage.ping().is_err());

    // the next operation reconnects on its own (a fresh in-memory database)
    assert_eq!(storage.ledger.load_amount("alice").unwrap(), None);
    storage.ping().unwrap();
}

#[test]
fn pfid_entries_round_trip_through_search() {
    let storage = memory_storage();
    let id = Uuid::new_v4();
    storage.pfids.add(&PfidEntry::new(id, "player")).unwrap();

    let found = storage
        .pfids
        .search(&Selector::matching(Predicate::Eq(
            "type",
            Value::from("player"),
        )))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].uuid(), id);
    assert_eq!(found[0].tag, "player");
    assert!(found[0].seq_id.is_some());
}

#[test]
fn search_honors_the_requested_order() {
    let storage = memory_storage();
    for _ in 0..3 {
        storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    }

    let descending = storage
        .pfids
        .search(&Selector::all().ordered_by("seqID", Order::Descending))
        .unwrap();
    let ids: Vec<i64> = descending.iter().filter_map(|e| e.seq_id).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn count_distinguishes_tags() {
    let storage = memory_storage();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "group")).unwrap();

    let players = Predicate::Eq("type", Value::from("player"));
    assert_eq!(storage.pfids.count(&players).unwrap(), 2);
    assert_eq!(storage.pfids.count(&Predicate::All).unwrap(), 3);
}

#[test]
fn delete_one_requires_exactly_one_match() {
    let storage = memory_storage();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();

    let players = Predicate::Eq("type", Value::from("player"));
    match storage.pfids.delete_one(&players) {
        Err(StorageError::AmbiguousMatch(n)) => assert_eq!(n, 2),
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
    assert_eq!(storage.pfids.count(&players).unwrap(), 2);

    match storage.pfids.delete_one(&Predicate::Eq("type", Value::from("ghost"))) {
        Err(StorageError::MissingRecord(_)) => {}
        other => panic!("expected MissingRecord, got {other:?}"),
    }
}

#[test]
fn first_match_policy_deletes_the_lowest_sequence_id() {
    let storage = memory_storage();
    let pfids = pfstore::PfidTable::with_policy(
        storage.connection().clone(),
        MatchPolicy::FirstMatch,
    );
    pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();

    let players = Predicate::Eq("type", Value::from("player"));
    pfids.delete_one(&players).unwrap();

    let left = pfids
        .search(&Selector::matching(players.clone()))
        .unwrap();
    assert_eq!(left.len(), 1);
    // the first-inserted (lowest seqID) row is the one that went away
    assert_eq!(left[0].seq_id, Some(2));
}

#[test]
fn delete_all_reports_how_many_went_away() {
    let storage = memory_storage();
    for _ in 0..3 {
        storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    }
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "group")).unwrap();

    let removed = storage
        .pfids
        .delete_all(&Predicate::Eq("type", Value::from("player")))
        .unwrap();
    assert_eq!(removed, 3);
    assert_eq!(storage.pfids.count(&Predicate::All).unwrap(), 1);
}

#[test]
fn update_one_and_update_all_rewrite_tags() {
    let storage = memory_storage();
    let id = Uuid::new_v4();
    storage.pfids.add(&PfidEntry::new(id, "player")).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "group")).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "group")).unwrap();

    storage
        .pfids
        .update_one(
            &Predicate::Eq("type", Value::from("player")),
            &[("type", Value::from("retired"))],
        )
        .unwrap();
    let retired = storage
        .pfids
        .search(&Selector::matching(Predicate::Eq(
            "type",
            Value::from("retired"),
        )))
        .unwrap();
    assert_eq!(retired.len(), 1);
    assert_eq!(retired[0].uuid(), id);

    let rewritten = storage
        .pfids
        .update_all(
            &Predicate::Eq("type", Value::from("group")),
            &[("type", Value::from("guild"))],
        )
        .unwrap();
    assert_eq!(rewritten, 2);
    assert_eq!(
        storage
            .pfids
            .count(&Predicate::Eq("type", Value::from("guild")))
            .unwrap(),
        2
    );
}

#[test]
fn predicates_compose_across_columns() {
    let storage = memory_storage();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "group")).unwrap();

    let late_players = Predicate::Eq("type", Value::from("player"))
        .and(Predicate::Gt("seqID", Value::from(1i64)));
    assert_eq!(storage.pfids.count(&late_players).unwrap(), 1);

    let either = Predicate::Eq("type", Value::from("group"))
        .or(Predicate::Eq("type", Value::from("player")));
    assert_eq!(storage.pfids.count(&either).unwrap(), 3);
}

#[test]
fn ensure_schema_through_the_store_handles_drop() {
    let storage = memory_storage();
    storage.pfids.ensure_schema(false).unwrap();
    storage.pfids.add(&PfidEntry::new(Uuid::new_v4(), "player")).unwrap();

    storage.pfids.ensure_schema(false).unwrap();
    assert_eq!(storage.pfids.count(&Predicate::All).unwrap(), 1);

    storage.pfids.ensure_schema(true).unwrap();
    assert_eq!(storage.pfids.count(&Predicate::All).unwrap(), 0);
}
