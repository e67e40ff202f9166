use retail_core::db::open_db_in_memory;
use retail_core::{
    Branch, BranchRepository, EntityRepository, ErrorKind, Miss, NaturalKey, Product,
    ProductRepository, QueryOutcome, Reference, RepoError, Sells, SellsChanges, SellsKey,
    SellsRelationManager, WriteOutcome,
};
use rusqlite::Connection;

fn seed(conn: &Connection) {
    let branches = BranchRepository::try_new(conn).unwrap();
    branches.alta(&Branch::new("Centro", "Av. 1")).unwrap();
    branches.alta(&Branch::new("Norte", "Ruta 9")).unwrap();
    branches.alta(&Branch::new("Sur", "Calle 3")).unwrap();

    let products = ProductRepository::try_new(conn).unwrap();
    products.alta(&Product::new(101, "Yerba", 40)).unwrap();
    products.alta(&Product::new(102, "Cafe", 10)).unwrap();
}

fn seed_relations(manager: &SellsRelationManager<'_>) {
    manager.alta(&Sells::new("Centro", 101, 12.5, 3)).unwrap();
    manager.alta(&Sells::new("Centro", 102, 8.0, 1)).unwrap();
    manager.alta(&Sells::new("Norte", 101, 13.0, 7)).unwrap();
}

#[test]
fn consulta_dispatches_on_selector_text() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();
    seed_relations(&manager);

    let by_product: Vec<String> = manager
        .consulta_text("101")
        .unwrap()
        .into_records()
        .into_iter()
        .map(|sells| sells.branch)
        .collect();
    assert_eq!(by_product, vec!["Centro".to_string(), "Norte".to_string()]);

    let by_branch: Vec<i64> = manager
        .consulta_text("Centro")
        .unwrap()
        .into_records()
        .into_iter()
        .map(|sells| sells.product_code)
        .collect();
    assert_eq!(by_branch, vec![101, 102]);

    assert_eq!(manager.consulta_text("todas").unwrap().records().len(), 3);
    assert_eq!(
        manager.consulta_text("9999").unwrap(),
        QueryOutcome::NotFound(Miss::ProductNotSold(9999))
    );
}

#[test]
fn consulta_by_branch_distinguishes_idle_from_unknown_branch() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();
    seed_relations(&manager);

    assert_eq!(
        manager.consulta_text("Sur").unwrap(),
        QueryOutcome::NotFound(Miss::BranchSellsNothing("Sur".to_string()))
    );
    assert_eq!(
        manager.consulta_text("Oeste").unwrap(),
        QueryOutcome::NotFound(Miss::UnknownBranch("Oeste".to_string()))
    );
}

#[test]
fn consulta_todas_on_empty_relation_is_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    let manager = SellsRelationManager::try_new(&conn).unwrap();

    assert_eq!(
        manager.consulta_text("TODAS").unwrap().miss(),
        Some(&Miss::EmptyCollection("vende"))
    );
}

#[test]
fn alta_gates_run_branch_then_product_then_pair() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();
    seed_relations(&manager);

    let err = manager
        .alta(&Sells::new("Oeste", 999, 1.0, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::MissingReference(Reference::Branch(ref name)) if name == "Oeste"
    ));

    let err = manager
        .alta(&Sells::new("Centro", 999, 1.0, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::MissingReference(Reference::Product(999))
    ));

    let err = manager
        .alta(&Sells::new("Centro", 101, 1.0, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey(NaturalKey::Sells(ref key)) if *key == SellsKey::new("Centro", 101)
    ));
    assert_eq!(manager.consulta_text("todas").unwrap().records().len(), 3);
}

#[test]
fn alta_rejects_non_positive_price() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();

    for price in [0.0, -3.0, f64::NAN] {
        let err = manager
            .alta(&Sells::new("Sur", 102, price, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}

#[test]
fn modificacion_updates_relation_attributes() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();
    seed_relations(&manager);

    let key = SellsKey::new("Centro", 101);
    assert_eq!(
        manager
            .modificacion(&key, &SellsChanges::all(14.0, 9))
            .unwrap(),
        WriteOutcome::Applied
    );

    let updated = manager
        .consulta_text("Centro")
        .unwrap()
        .into_records()
        .into_iter()
        .find(|sells| sells.product_code == 101)
        .unwrap();
    assert_eq!(updated, Sells::new("Centro", 101, 14.0, 9));
}

#[test]
fn modificacion_does_not_revalidate_endpoints() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();
    seed_relations(&manager);
    let products = ProductRepository::try_new(&conn).unwrap();
    assert!(products.baja(&102).unwrap().is_applied());

    let changes = SellsChanges {
        stock: Some(0),
        ..SellsChanges::default()
    };
    let outcome = manager
        .modificacion(&SellsKey::new("Centro", 102), &changes)
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Applied);
}

#[test]
fn modificacion_and_baja_of_missing_relation_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();

    let key = SellsKey::new("Sur", 101);
    let expected = WriteOutcome::NotFound(NaturalKey::Sells(key.clone()));
    assert_eq!(
        manager
            .modificacion(&key, &SellsChanges::all(1.0, 1))
            .unwrap(),
        expected
    );
    assert_eq!(manager.baja(&key).unwrap(), expected);
}

#[test]
fn baja_removes_only_the_named_pair() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();
    seed_relations(&manager);

    assert!(manager
        .baja(&SellsKey::new("Centro", 101))
        .unwrap()
        .is_applied());

    let remaining: Vec<SellsKey> = manager
        .consulta_text("todas")
        .unwrap()
        .records()
        .iter()
        .map(Sells::key)
        .collect();
    assert_eq!(
        remaining,
        vec![SellsKey::new("Centro", 102), SellsKey::new("Norte", 101)]
    );
}

#[test]
fn deleting_endpoints_leaves_relations_in_place() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();
    seed_relations(&manager);

    let branches = BranchRepository::try_new(&conn).unwrap();
    assert!(branches.baja(&"Norte".to_string()).unwrap().is_applied());

    assert_eq!(manager.consulta_text("Norte").unwrap().records().len(), 1);
}

#[test]
fn padded_branch_is_rejected_and_query_text_is_trimmed() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let manager = SellsRelationManager::try_new(&conn).unwrap();

    let err = manager
        .alta(&Sells::new("Centro ", 101, 9.5, 2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    manager.alta(&Sells::new("Centro", 101, 9.5, 2)).unwrap();
    assert_eq!(
        manager.consulta_text(" Centro ").unwrap(),
        QueryOutcome::Found(vec![Sells::new("Centro", 101, 9.5, 2)])
    );
}
