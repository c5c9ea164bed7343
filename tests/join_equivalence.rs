//! The block-nested-loop join must produce exactly the rows of a selection
//! over a cross product, for every chunk size the buffer pool can induce.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use minirel::datum::Constant;
use minirel::engine::Engine;
use minirel::plan::{BlockJoinPlan, Plan, ProductPlan, SelectPlan, TablePlan};
use minirel::query::{Expression, Predicate, Scan, TableScan, Term};
use minirel::record::Schema;
use minirel::storage::MemoryStorage;
use minirel::tx::Transaction;

type Tx = Arc<Transaction<MemoryStorage>>;
type Row = (i32, i32, i32, i32);

/// Generates the two relations once; every engine is seeded identically.
///
/// Keys are drawn from a small domain so the join matches often; the pad
/// fields push both relations past one block (r slot 136 bytes, s slot 266
/// bytes) so chunking actually happens.
fn generate_data() -> (Vec<(i32, i32)>, Vec<(i32, i32)>) {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let r: Vec<(i32, i32)> = (0..45).map(|i| (i, rng.gen_range(0..8))).collect();
    let s: Vec<(i32, i32)> = (0..70).map(|i| (rng.gen_range(0..8), i)).collect();
    (r, s)
}

async fn seeded_tx(pool_size: usize, r: &[(i32, i32)], s: &[(i32, i32)]) -> Tx {
    let engine = Engine::new(MemoryStorage::new(), pool_size);
    let tx = engine.begin();

    let mut r_schema = Schema::new();
    r_schema.add_int_field("rid").unwrap();
    r_schema.add_int_field("rkey").unwrap();
    r_schema.add_string_field("rpad", 120).unwrap();
    let info = engine.catalog().create_table("r", r_schema).unwrap();
    let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
    for &(rid, rkey) in r {
        scan.insert().await.unwrap();
        scan.set_value("rid", &Constant::Int(rid)).await.unwrap();
        scan.set_value("rkey", &Constant::Int(rkey)).await.unwrap();
        scan.set_value("rpad", &Constant::from(format!("r{}", rid)))
            .await
            .unwrap();
    }
    drop(scan);

    let mut s_schema = Schema::new();
    s_schema.add_int_field("skey").unwrap();
    s_schema.add_int_field("sval").unwrap();
    s_schema.add_string_field("spad", 250).unwrap();
    let info = engine.catalog().create_table("s", s_schema).unwrap();
    let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
    for &(skey, sval) in s {
        scan.insert().await.unwrap();
        scan.set_value("skey", &Constant::Int(skey)).await.unwrap();
        scan.set_value("sval", &Constant::Int(sval)).await.unwrap();
        scan.set_value("spad", &Constant::from(format!("s{}", sval)))
            .await
            .unwrap();
    }
    drop(scan);

    tx
}

async fn table(tx: &Tx, name: &str) -> Plan<MemoryStorage> {
    Plan::Table(TablePlan::new(Arc::clone(tx), name).await.unwrap())
}

/// Drains a scan into a sorted row multiset over the four data fields.
async fn drain(scan: &mut Scan<MemoryStorage>) -> Vec<Row> {
    let mut rows = Vec::new();
    while scan.next().await.unwrap() {
        rows.push((
            scan.get_i32("rid").await.unwrap(),
            scan.get_i32("rkey").await.unwrap(),
            scan.get_i32("skey").await.unwrap(),
            scan.get_i32("sval").await.unwrap(),
        ));
    }
    scan.close();
    rows.sort_unstable();
    rows
}

async fn product_baseline(tx: &Tx) -> Vec<Row> {
    let product = ProductPlan::new(table(tx, "r").await, table(tx, "s").await).unwrap();
    let pred = Predicate::from_term(Term::new(
        Expression::field("rkey"),
        Expression::field("skey"),
    ));
    let plan = Plan::Select(SelectPlan::new(Plan::Product(product), pred));
    let mut scan = plan.open().await.unwrap();
    drain(&mut scan).await
}

async fn block_join(tx: &Tx) -> (Vec<Row>, u64) {
    let plan = Plan::BlockJoin(
        BlockJoinPlan::new(
            Arc::clone(tx),
            table(tx, "r").await,
            table(tx, "s").await,
            "rkey",
            "skey",
        )
        .unwrap(),
    );
    let mut scan = plan.open().await.unwrap();
    let chunk_size = match &scan {
        Scan::BlockJoin(s) => s.chunk_size(),
        _ => unreachable!(),
    };
    (drain(&mut scan).await, chunk_size)
}

#[tokio::test]
async fn test_join_equals_filtered_product_across_pool_sizes() {
    let (r, s) = generate_data();

    let baseline_tx = seeded_tx(64, &r, &s).await;
    let baseline = product_baseline(&baseline_tx).await;
    assert!(!baseline.is_empty(), "keys overlap, the join must match");

    let mut chunk_sizes = HashSet::new();
    for pool_size in [2, 3, 4, 5, 7, 16, 64] {
        let tx = seeded_tx(pool_size, &r, &s).await;
        let (rows, chunk_size) = block_join(&tx).await;
        assert_eq!(
            rows, baseline,
            "pool of {} frames (chunk size {}) changed the join output",
            pool_size, chunk_size
        );
        chunk_sizes.insert(chunk_size);
    }
    // The sweep must actually exercise different chunkings, including the
    // degenerate one-block chunk.
    assert!(chunk_sizes.len() >= 3, "chunk sizes seen: {:?}", chunk_sizes);
    assert!(chunk_sizes.contains(&1));
}

#[tokio::test]
async fn test_join_is_symmetric_in_outer_choice() {
    let (r, s) = generate_data();
    let tx = seeded_tx(16, &r, &s).await;

    let baseline = product_baseline(&tx).await;

    // Materializing r instead of s must not change the multiset.
    let plan = Plan::BlockJoin(
        BlockJoinPlan::new(
            Arc::clone(&tx),
            table(&tx, "s").await,
            table(&tx, "r").await,
            "skey",
            "rkey",
        )
        .unwrap(),
    );
    let mut scan = plan.open().await.unwrap();
    assert_eq!(drain(&mut scan).await, baseline);
}

#[tokio::test]
async fn test_empty_inner_side_yields_no_rows() {
    let (r, _) = generate_data();
    let tx = seeded_tx(8, &r, &[]).await;
    let (rows, _) = block_join(&tx).await;
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_empty_outer_side_yields_no_rows() {
    let (_, s) = generate_data();
    let tx = seeded_tx(8, &[], &s).await;
    let (rows, _) = block_join(&tx).await;
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_draining_twice_is_idempotent() {
    let (r, s) = generate_data();
    let tx = seeded_tx(16, &r, &s).await;

    let before: Vec<(i32, i32)> = {
        let mut scan = table(&tx, "s").await.open().await.unwrap();
        let mut rows = Vec::new();
        while scan.next().await.unwrap() {
            rows.push((
                scan.get_i32("skey").await.unwrap(),
                scan.get_i32("sval").await.unwrap(),
            ));
        }
        rows
    };

    let (first, _) = block_join(&tx).await;
    let (second, _) = block_join(&tx).await;
    assert_eq!(first, second);

    // The underlying relation is untouched by two full join passes.
    let after: Vec<(i32, i32)> = {
        let mut scan = table(&tx, "s").await.open().await.unwrap();
        let mut rows = Vec::new();
        while scan.next().await.unwrap() {
            rows.push((
                scan.get_i32("skey").await.unwrap(),
                scan.get_i32("sval").await.unwrap(),
            ));
        }
        rows
    };
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_mistyped_join_columns_match_nothing() {
    let (r, s) = generate_data();
    let tx = seeded_tx(16, &r, &s).await;

    // rpad is text, skey is integer: equality is always false, never an
    // error.
    let plan = Plan::BlockJoin(
        BlockJoinPlan::new(
            Arc::clone(&tx),
            table(&tx, "r").await,
            table(&tx, "s").await,
            "rpad",
            "skey",
        )
        .unwrap(),
    );
    let mut scan = plan.open().await.unwrap();
    assert!(!scan.next().await.unwrap());
}
