//! Cost-model tests: every estimate a planner would compare.

use std::sync::Arc;

use minirel::datum::Constant;
use minirel::engine::Engine;
use minirel::plan::{
    BlockJoinPlan, GroupByPlan, Plan, ProductPlan, ProjectPlan, SelectPlan, SortPlan, TablePlan,
};
use minirel::query::{AggregateFn, Expression, Predicate, TableScan, Term};
use minirel::record::Schema;
use minirel::storage::MemoryStorage;
use minirel::tx::Transaction;

type Tx = Arc<Transaction<MemoryStorage>>;

/// Seeds smer (2 rows), predmet (3 rows) and big (40 rows over 5 blocks).
async fn seeded_tx(pool_size: usize) -> Tx {
    let engine = Engine::new(MemoryStorage::new(), pool_size);
    let tx = engine.begin();

    let mut smer = Schema::new();
    smer.add_int_field("smid").unwrap();
    smer.add_string_field("smername", 25).unwrap();
    let info = engine.catalog().create_table("smer", smer).unwrap();
    let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
    for (smid, name) in [(1, "SI"), (2, "ET")] {
        scan.insert().await.unwrap();
        scan.set_value("smid", &Constant::Int(smid)).await.unwrap();
        scan.set_value("smername", &Constant::from(name))
            .await
            .unwrap();
    }
    drop(scan);

    let mut predmet = Schema::new();
    predmet.add_int_field("predid").unwrap();
    predmet.add_string_field("prednaziv", 25).unwrap();
    predmet.add_int_field("predgod").unwrap();
    predmet.add_int_field("predsmerid").unwrap();
    let info = engine.catalog().create_table("predmet", predmet).unwrap();
    let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
    for (predid, naziv, god, smerid) in
        [(10, "Baze", 1, 1), (11, "Mreze", 1, 2), (20, "Analog", 2, 1)]
    {
        scan.insert().await.unwrap();
        scan.set_value("predid", &Constant::Int(predid)).await.unwrap();
        scan.set_value("prednaziv", &Constant::from(naziv))
            .await
            .unwrap();
        scan.set_value("predgod", &Constant::Int(god)).await.unwrap();
        scan.set_value("predsmerid", &Constant::Int(smerid))
            .await
            .unwrap();
    }
    drop(scan);

    // Slot is 4 + 4 + 500 = 508 bytes: 8 records per 4096-byte block, so
    // 40 rows fill exactly 5 blocks.
    let mut big = Schema::new();
    big.add_int_field("id").unwrap();
    big.add_string_field("pad", 496).unwrap();
    let info = engine.catalog().create_table("big", big).unwrap();
    let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
    for i in 0..40 {
        scan.insert().await.unwrap();
        scan.set_value("id", &Constant::Int(i)).await.unwrap();
        scan.set_value("pad", &Constant::from(format!("row{}", i)))
            .await
            .unwrap();
    }
    drop(scan);

    tx
}

async fn table(tx: &Tx, name: &str) -> Plan<MemoryStorage> {
    Plan::Table(TablePlan::new(Arc::clone(tx), name).await.unwrap())
}

fn eq_const(field: &str, val: impl Into<Constant>) -> Predicate {
    Predicate::from_term(Term::new(Expression::field(field), Expression::constant(val)))
}

#[tokio::test]
async fn test_table_estimates_match_seeded_data() {
    let tx = seeded_tx(16).await;
    let predmet = table(&tx, "predmet").await;

    assert_eq!(predmet.blocks_accessed(), 1);
    assert_eq!(predmet.records_output(), 3);
    assert_eq!(predmet.distinct_values("predgod").unwrap(), 2);
    assert_eq!(predmet.distinct_values("predid").unwrap(), 3);

    let big = table(&tx, "big").await;
    assert_eq!(big.blocks_accessed(), 5);
    assert_eq!(big.records_output(), 40);
    assert_eq!(big.distinct_values("id").unwrap(), 40);
}

#[tokio::test]
async fn test_projection_preserves_every_estimate() {
    let tx = seeded_tx(16).await;
    let child = table(&tx, "predmet").await;
    let (blocks, records, distinct) = (
        child.blocks_accessed(),
        child.records_output(),
        child.distinct_values("predgod").unwrap(),
    );

    let fields = vec!["prednaziv".to_string(), "predgod".to_string()];
    let proj = Plan::Project(ProjectPlan::new(child, fields.clone()).unwrap());

    assert_eq!(proj.schema().fields(), &fields[..]);
    assert_eq!(proj.blocks_accessed(), blocks);
    assert_eq!(proj.records_output(), records);
    assert_eq!(proj.distinct_values("predgod").unwrap(), distinct);
}

#[tokio::test]
async fn test_projection_of_missing_field_fails_construction() {
    let tx = seeded_tx(16).await;
    let child = table(&tx, "predmet").await;
    assert!(ProjectPlan::new(child, vec!["nope".to_string()]).is_err());
}

#[tokio::test]
async fn test_selection_never_increases_block_reads() {
    let tx = seeded_tx(16).await;
    let child = table(&tx, "predmet").await;
    let blocks = child.blocks_accessed();

    let select = Plan::Select(SelectPlan::new(child, eq_const("predgod", 1)));
    assert_eq!(select.blocks_accessed(), blocks);
}

#[tokio::test]
async fn test_selection_constant_selectivity() {
    let tx = seeded_tx(16).await;
    let child = table(&tx, "predmet").await;

    // predgod = 1 reduces 3 rows by V(predgod) = 2.
    let select = Plan::Select(SelectPlan::new(child, eq_const("predgod", 1)));
    assert_eq!(select.records_output(), 3 / 2);
    // The pinned field's distinct count is capped at the reduced rows.
    assert_eq!(select.distinct_values("predgod").unwrap(), 1);
    // Other fields keep the child's estimate.
    assert_eq!(select.distinct_values("predid").unwrap(), 3);
}

#[tokio::test]
async fn test_selection_field_equality_selectivity() {
    let tx = seeded_tx(16).await;
    let child = table(&tx, "predmet").await;

    // predgod = predsmerid reduces by max(V(predgod), V(predsmerid)) = 2.
    let pred = Predicate::from_term(Term::new(
        Expression::field("predgod"),
        Expression::field("predsmerid"),
    ));
    let select = Plan::Select(SelectPlan::new(child, pred));
    assert_eq!(select.records_output(), 3 / 2);
}

#[tokio::test]
async fn test_selection_unmatched_predicate_keeps_cardinality() {
    let tx = seeded_tx(16).await;
    let child = table(&tx, "predmet").await;

    let select = Plan::Select(SelectPlan::new(child, Predicate::new()));
    assert_eq!(select.records_output(), 3);
}

#[tokio::test]
async fn test_product_cost_formula() {
    let tx = seeded_tx(16).await;
    let smer = table(&tx, "smer").await;
    let predmet = table(&tx, "predmet").await;

    let product = Plan::Product(ProductPlan::new(smer, predmet).unwrap());
    // One smer pass plus one full predmet pass per smer row.
    assert_eq!(product.blocks_accessed(), 1 + 2 * 1);
    assert_eq!(product.records_output(), 2 * 3);
    assert_eq!(product.distinct_values("smid").unwrap(), 2);
    assert_eq!(product.distinct_values("predgod").unwrap(), 2);
    assert!(product.distinct_values("nope").is_err());
}

#[tokio::test]
async fn test_join_cardinality_estimate() {
    let tx = seeded_tx(16).await;
    let smer = table(&tx, "smer").await;
    let predmet = table(&tx, "predmet").await;

    let join =
        BlockJoinPlan::new(Arc::clone(&tx), smer, predmet, "smid", "predsmerid").unwrap();
    // 2 * 3 pairs over max(V(smid), V(predsmerid)) = 2 join values.
    assert_eq!(join.records_output(), 3);
}

#[tokio::test]
async fn test_join_blocks_when_inner_fits_in_one_chunk() {
    let tx = seeded_tx(16).await;
    let predmet = table(&tx, "predmet").await;
    let big = table(&tx, "big").await;

    let join = BlockJoinPlan::new(Arc::clone(&tx), predmet, big, "predid", "id").unwrap();
    // 15 usable frames hold all 5 materialized inner blocks at once.
    assert_eq!(join.chunk_size(), 5);
    // One materialization pass plus a single outer pass.
    assert_eq!(join.blocks_accessed(), 5 + 1 * 1);
}

#[tokio::test]
async fn test_join_blocks_track_inner_chunking() {
    let tx = seeded_tx(4).await;
    let predmet = table(&tx, "predmet").await;
    let big = table(&tx, "big").await;

    let join = BlockJoinPlan::new(Arc::clone(&tx), predmet, big, "predid", "id").unwrap();
    // 3 usable frames split the 5 inner blocks into chunks of 3: two chunks.
    let chunk = join.chunk_size();
    assert_eq!(chunk, 3);
    let chunks = 5u64.div_ceil(chunk);
    assert_eq!(join.blocks_accessed(), 5 + chunks * 1);

    // Deriving the chunk count from the *outer* side's blocks over the
    // available buffers (one chunk here) would claim one outer pass fewer;
    // the estimate deliberately follows the cursor, which chunks the
    // materialized inner relation.
    let outer_based = 5 + 1u64.div_ceil(4) * 1;
    assert_ne!(join.blocks_accessed(), outer_based);
}

#[tokio::test]
async fn test_join_distinct_values_dispatch_by_side() {
    let tx = seeded_tx(16).await;
    let smer = table(&tx, "smer").await;
    let predmet = table(&tx, "predmet").await;

    let join =
        BlockJoinPlan::new(Arc::clone(&tx), smer, predmet, "smid", "predsmerid").unwrap();
    assert_eq!(join.distinct_values("smername").unwrap(), 2);
    assert_eq!(join.distinct_values("prednaziv").unwrap(), 3);
    assert!(join.distinct_values("nope").is_err());
}

#[tokio::test]
async fn test_join_rejects_unresolvable_columns() {
    let tx = seeded_tx(16).await;
    let smer = table(&tx, "smer").await;
    let predmet = table(&tx, "predmet").await;
    assert!(BlockJoinPlan::new(Arc::clone(&tx), smer, predmet, "nope", "predsmerid").is_err());
}

#[tokio::test]
async fn test_sort_cost_models_one_materialization() {
    let tx = seeded_tx(16).await;
    let big = table(&tx, "big").await;
    let records = big.records_output();

    let sort = Plan::Sort(SortPlan::new(big, vec!["id".to_string()]).unwrap());
    // 40 rows at 8 slots per block: the sorted output spans 5 blocks.
    assert_eq!(sort.blocks_accessed(), 5);
    assert_eq!(sort.records_output(), records);
    assert_eq!(sort.distinct_values("id").unwrap(), 40);
}

#[tokio::test]
async fn test_group_by_cost() {
    let tx = seeded_tx(16).await;
    let predmet = table(&tx, "predmet").await;

    let group = Plan::GroupBy(
        GroupByPlan::new(
            predmet,
            vec!["predgod".to_string()],
            vec![AggregateFn::count("predid")],
        )
        .unwrap(),
    );
    // One output row per distinct predgod value.
    assert_eq!(group.records_output(), 2);
    assert_eq!(group.distinct_values("predgod").unwrap(), 2);
    assert_eq!(group.distinct_values("countofpredid").unwrap(), 2);
    assert_eq!(
        group.schema().fields(),
        &["predgod".to_string(), "countofpredid".to_string()][..]
    );
}
