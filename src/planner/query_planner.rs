//! Query planning: descriptor to plan tree.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::plan::{BlockJoinPlan, Plan, ProductPlan, ProjectPlan, SelectPlan, TablePlan};
use crate::query::{Predicate, Term};
use crate::storage::Storage;
use crate::tx::Transaction;

use super::data::QueryData;
use super::error::PlannerError;

/// Boxed future breaking the recursive async cycle through view expansion.
type PlannerFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PlannerError>> + Send + 'a>>;

/// Builds a plan tree from a query descriptor.
///
/// The shape is fixed: one leaf per referenced table (views expand
/// recursively to their stored definitions), each wrapped in a selection on
/// the predicate conjuncts that mention only that leaf's fields; leaves
/// combined left to right, using a block-nested-loop join whenever a
/// conjunct equates a field on each side and a cross product otherwise;
/// conjuncts not enforced anywhere below applied in one selection at the
/// root; the projection on top. No plan search happens — the tree follows
/// the statement — but every node still carries honest cost estimates.
pub struct BasicQueryPlanner;

impl BasicQueryPlanner {
    /// Creates the planner.
    pub fn new() -> Self {
        Self
    }

    /// Builds the plan for `data` inside `tx`.
    pub fn create_plan<'a, S: Storage>(
        &'a self,
        data: &'a QueryData,
        tx: &'a Arc<Transaction<S>>,
    ) -> PlannerFuture<'a, Plan<S>> {
        Box::pin(async move {
            let mut remaining: Vec<Term> = data.pred().terms().to_vec();

            // One leaf per table, per-leaf conjuncts pushed down onto it.
            let mut plans = Vec::with_capacity(data.tables().len());
            for table in data.tables() {
                let leaf = match tx.engine().catalog().view_definition(table) {
                    Some(definition) => self.create_plan(&definition, tx).await?,
                    None => Plan::Table(TablePlan::new(Arc::clone(tx), table).await?),
                };
                let leaf = match data.pred().select_sub_pred(leaf.schema()) {
                    Some(sub) => {
                        remaining.retain(|t| !sub.terms().contains(t));
                        Plan::Select(SelectPlan::new(leaf, sub))
                    }
                    None => leaf,
                };
                plans.push(leaf);
            }

            let mut iter = plans.into_iter();
            let mut current = iter.next().ok_or(PlannerError::NoTables)?;
            for next in iter {
                current = combine(Arc::clone(tx), current, next, data.pred(), &mut remaining)?;
            }

            // Conjuncts no pair of leaves could enforce end up here.
            if !remaining.is_empty() {
                let mut pred = Predicate::new();
                for term in remaining {
                    pred.add_term(term);
                }
                current = Plan::Select(SelectPlan::new(current, pred));
            }

            Ok(Plan::Project(ProjectPlan::new(
                current,
                data.fields().to_vec(),
            )?))
        })
    }
}

impl Default for BasicQueryPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Combines two subtrees: a block join if some conjunct equates a field on
/// each side, a cross product otherwise.
fn combine<S: Storage>(
    tx: Arc<Transaction<S>>,
    current: Plan<S>,
    next: Plan<S>,
    pred: &Predicate,
    remaining: &mut Vec<Term>,
) -> Result<Plan<S>, PlannerError> {
    let mut join_on: Option<(String, String, Term)> = None;
    if let Some(join_pred) = pred.join_sub_pred(current.schema(), next.schema()) {
        'terms: for term in join_pred.terms() {
            for field in current.schema().fields() {
                if let Some(other) = term.equates_with_field(field) {
                    if next.schema().has_field(other) {
                        join_on = Some((field.clone(), other.to_string(), term.clone()));
                        break 'terms;
                    }
                }
            }
        }
    }

    if let Some((outer_field, inner_field, term)) = join_on {
        remaining.retain(|t| *t != term);
        return Ok(Plan::BlockJoin(BlockJoinPlan::new(
            tx,
            current,
            next,
            outer_field,
            inner_field,
        )?));
    }
    Ok(Plan::Product(ProductPlan::new(current, next)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Constant;
    use crate::engine::Engine;
    use crate::query::{Expression, TableScan};
    use crate::record::Schema;
    use crate::storage::MemoryStorage;

    async fn seeded_tx() -> Arc<Transaction<MemoryStorage>> {
        let engine = Engine::new(MemoryStorage::new(), 16);
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
        predmet.add_int_field("predsmerid").unwrap();
        let info = engine.catalog().create_table("predmet", predmet).unwrap();
        let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
        for (predid, naziv, smerid) in [(10, "Baze", 1), (11, "Mreze", 2)] {
            scan.insert().await.unwrap();
            scan.set_value("predid", &Constant::Int(predid))
                .await
                .unwrap();
            scan.set_value("prednaziv", &Constant::from(naziv))
                .await
                .unwrap();
            scan.set_value("predsmerid", &Constant::Int(smerid))
                .await
                .unwrap();
        }
        drop(scan);

        tx
    }

    fn term(lhs: Expression, rhs: Expression) -> Term {
        Term::new(lhs, rhs)
    }

    #[tokio::test]
    async fn test_join_term_builds_block_join() {
        let tx = seeded_tx().await;
        let mut pred = Predicate::from_term(term(
            Expression::field("smid"),
            Expression::field("predsmerid"),
        ));
        pred.add_term(term(Expression::field("smername"), Expression::constant("SI")));
        let data = QueryData::new(
            vec!["prednaziv".to_string()],
            vec!["smer".to_string(), "predmet".to_string()],
            pred,
        );

        let plan = BasicQueryPlanner::new().create_plan(&data, &tx).await.unwrap();
        let explain = plan.explain();
        // The per-table conjunct lands on the leaf, the spanning one on the
        // join node, and nothing is left for a root selection.
        assert!(explain.contains("BlockJoin: smid = predsmerid"));
        assert!(explain.contains("Select: smername = 'SI'"));
        assert!(!explain.starts_with("Select"));

        let mut scan = plan.open().await.unwrap();
        let mut names = Vec::new();
        while scan.next().await.unwrap() {
            names.push(scan.get_string("prednaziv").await.unwrap());
        }
        assert_eq!(names, vec!["Baze".to_string()]);
    }

    #[tokio::test]
    async fn test_no_join_term_builds_product() {
        let tx = seeded_tx().await;
        let data = QueryData::new(
            vec!["smername".to_string(), "prednaziv".to_string()],
            vec!["smer".to_string(), "predmet".to_string()],
            Predicate::new(),
        );

        let plan = BasicQueryPlanner::new().create_plan(&data, &tx).await.unwrap();
        assert!(plan.explain().contains("Product"));

        let mut scan = plan.open().await.unwrap();
        let mut count = 0;
        while scan.next().await.unwrap() {
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_view_expands_to_its_definition() {
        let tx = seeded_tx().await;
        let view_def = QueryData::new(
            vec!["smid".to_string(), "smername".to_string()],
            vec!["smer".to_string()],
            Predicate::from_term(term(
                Expression::field("smername"),
                Expression::constant("SI"),
            )),
        );
        tx.engine().catalog().create_view("si_smer", view_def).unwrap();

        let data = QueryData::new(
            vec!["smid".to_string()],
            vec!["si_smer".to_string()],
            Predicate::new(),
        );
        let plan = BasicQueryPlanner::new().create_plan(&data, &tx).await.unwrap();

        let mut scan = plan.open().await.unwrap();
        let mut ids = Vec::new();
        while scan.next().await.unwrap() {
            ids.push(scan.get_i32("smid").await.unwrap());
        }
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_empty_table_list_is_error() {
        let tx = seeded_tx().await;
        let data = QueryData::new(vec![], vec![], Predicate::new());
        assert!(matches!(
            BasicQueryPlanner::new().create_plan(&data, &tx).await,
            Err(PlannerError::NoTables)
        ));
    }
}
