use retail_core::db::open_db_in_memory;
use retail_core::{
    Branch, BranchChanges, DocumentStore, Product, ProductChanges, Sells, SellsKey, StoreError,
};
use rusqlite::types::Value;
use rusqlite::Connection;

#[test]
fn insert_returns_distinct_ids_and_find_by_key_loads_record() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Product>::try_new(&conn).unwrap();

    let first = store.insert(&Product::new(101, "Yerba", 40)).unwrap();
    let second = store.insert(&Product::new(102, "Cafe", 10)).unwrap();
    assert_ne!(first, second);

    let loaded = store.find_by_key(&101).unwrap().unwrap();
    assert_eq!(loaded.id, first);
    assert_eq!(loaded.record, Product::new(101, "Yerba", 40));
    assert!(store.find_by_key(&999).unwrap().is_none());
}

#[test]
fn duplicate_natural_key_is_rejected_by_unique_index() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Branch>::try_new(&conn).unwrap();

    store.insert(&Branch::new("Centro", "Av. 1")).unwrap();
    let err = store.insert(&Branch::new("Centro", "Otra")).unwrap_err();

    assert!(err.is_unique_violation());
    assert!(matches!(
        err,
        StoreError::UniqueViolation {
            collection: "sucursales"
        }
    ));
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn compound_key_allows_same_branch_with_other_product() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Sells>::try_new(&conn).unwrap();

    store.insert(&Sells::new("Centro", 101, 12.5, 3)).unwrap();
    store.insert(&Sells::new("Centro", 102, 8.0, 1)).unwrap();
    store.insert(&Sells::new("Norte", 101, 13.0, 7)).unwrap();
    let err = store
        .insert(&Sells::new("Centro", 101, 99.0, 1))
        .unwrap_err();

    assert!(err.is_unique_violation());
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn missing_key_mutations_report_zero_rows() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Product>::try_new(&conn).unwrap();

    assert_eq!(store.delete_by_key(&7).unwrap(), 0);
    assert_eq!(
        store
            .update_by_key(&7, &ProductChanges::all("nada", 1))
            .unwrap(),
        0
    );
}

#[test]
fn update_by_key_merges_only_present_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Product>::try_new(&conn).unwrap();
    store.insert(&Product::new(101, "Yerba", 40)).unwrap();

    let changes = ProductChanges {
        stock: Some(12),
        ..ProductChanges::default()
    };
    assert_eq!(store.update_by_key(&101, &changes).unwrap(), 1);

    let loaded = store.find_by_key(&101).unwrap().unwrap();
    assert_eq!(loaded.record, Product::new(101, "Yerba", 12));
}

#[test]
fn update_by_key_rejects_non_object_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Branch>::try_new(&conn).unwrap();
    store.insert(&Branch::new("Centro", "Av. 1")).unwrap();

    let err = store
        .update_by_key(&"Centro".to_string(), &"Av. 2")
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDocument { .. }));

    let unchanged = store.find_by_key(&"Centro".to_string()).unwrap().unwrap();
    assert_eq!(unchanged.record.address, "Av. 1");
}

#[test]
fn find_all_and_find_by_field_keep_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Sells>::try_new(&conn).unwrap();
    store.insert(&Sells::new("Norte", 101, 10.0, 1)).unwrap();
    store.insert(&Sells::new("Centro", 102, 11.0, 2)).unwrap();
    store.insert(&Sells::new("Centro", 101, 12.0, 3)).unwrap();

    let all: Vec<SellsKey> = store
        .find_all()
        .unwrap()
        .into_iter()
        .map(|document| document.record.key())
        .collect();
    assert_eq!(
        all,
        vec![
            SellsKey::new("Norte", 101),
            SellsKey::new("Centro", 102),
            SellsKey::new("Centro", 101),
        ]
    );

    let sold_101: Vec<String> = store
        .find_by_field("codigoProducto", Value::Integer(101))
        .unwrap()
        .into_iter()
        .map(|document| document.record.branch)
        .collect();
    assert_eq!(sold_101, vec!["Norte".to_string(), "Centro".to_string()]);
}

#[test]
fn stored_body_uses_collection_field_names() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Sells>::try_new(&conn).unwrap();
    store.insert(&Sells::new("Centro", 101, 12.5, 3)).unwrap();

    let body: String = conn
        .query_row("SELECT body FROM vende;", [], |row| row.get(0))
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["sucursal"], "Centro");
    assert_eq!(json["codigoProducto"], 101);
    assert_eq!(json["precio"], 12.5);
    assert_eq!(json["stock"], 3);
}

#[test]
fn corrupt_documents_surface_as_invalid_document() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO sucursales (id, body) VALUES (?1, ?2);",
        [
            "2f1b3c1e-7a57-4c1b-9a64-0b1f0c1d2e3f",
            "{\"nombre\":\"Centro\",\"direccion\":\"   \"}",
        ],
    )
    .unwrap();
    let store = DocumentStore::<Branch>::try_new(&conn).unwrap();

    let err = store.find_all().unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidDocument {
            collection: "sucursales",
            ..
        }
    ));
}

#[test]
fn branch_changes_patch_keeps_natural_key() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::<Branch>::try_new(&conn).unwrap();
    store.insert(&Branch::new("Centro", "Av. 1")).unwrap();

    store
        .update_by_key(&"Centro".to_string(), &BranchChanges::address("Av. 9"))
        .unwrap();

    let loaded = store.find_by_key(&"Centro".to_string()).unwrap().unwrap();
    assert_eq!(loaded.record, Branch::new("Centro", "Av. 9"));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = DocumentStore::<Product>::try_new(&conn)
        .err()
        .unwrap();
    assert!(matches!(
        err,
        StoreError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn try_new_rejects_missing_collection_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE vende;").unwrap();

    let err = DocumentStore::<Sells>::try_new(&conn).err().unwrap();
    assert!(matches!(err, StoreError::MissingCollection("vende")));
}
