//! Terms and predicates.

use std::fmt;

use crate::datum::Constant;
use crate::plan::Plan;
use crate::record::Schema;
use crate::storage::Storage;

use super::error::QueryError;
use super::expression::Expression;
use super::scan::Scan;

/// An equality comparison between two expressions.
///
/// Satisfied iff both sides evaluate to equal constants on the current row.
/// Constants of different types are unequal (not an error), so a join
/// condition over mistyped columns simply matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    lhs: Expression,
    rhs: Expression,
}

impl Term {
    /// Creates the term `lhs = rhs`.
    pub fn new(lhs: Expression, rhs: Expression) -> Self {
        Self { lhs, rhs }
    }

    /// Tests the term against the current row of `scan`.
    pub async fn is_satisfied<S: Storage>(&self, scan: &Scan<S>) -> Result<bool, QueryError> {
        let lhs = self.lhs.evaluate(scan).await?;
        let rhs = self.rhs.evaluate(scan).await?;
        Ok(lhs == rhs)
    }

    /// Estimates how many times this term cuts the plan's output: the
    /// number of distinct candidate values the equated expression can take.
    ///
    /// - `F1 = F2`: `max(V(F1), V(F2))`
    /// - `F = c` or `c = F`: `V(F)`
    /// - `c1 = c2`: 1 if equal (no reduction), effectively infinite if not
    ///
    /// A field the plan cannot resolve contributes no reduction; term
    /// applicability is validated when the selection plan is built.
    pub fn reduction_factor<S: Storage>(&self, plan: &Plan<S>) -> u64 {
        match (self.lhs.as_field_name(), self.rhs.as_field_name()) {
            (Some(l), Some(r)) => {
                let vl = plan.distinct_values(l).unwrap_or(1);
                let vr = plan.distinct_values(r).unwrap_or(1);
                vl.max(vr)
            }
            (Some(l), None) => plan.distinct_values(l).unwrap_or(1),
            (None, Some(r)) => plan.distinct_values(r).unwrap_or(1),
            (None, None) => {
                if self.lhs.as_constant() == self.rhs.as_constant() {
                    1
                } else {
                    u64::MAX
                }
            }
        }
    }

    /// If this term fixes `field` to a constant (`field = c` or
    /// `c = field`), returns that constant.
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(name), Expression::Constant(c)) if name == field => Some(c),
            (Expression::Constant(c), Expression::Field(name)) if name == field => Some(c),
            _ => None,
        }
    }

    /// If this term equates `field` with another field, returns the other
    /// field's name.
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(l), Expression::Field(r)) if l == field => Some(r),
            (Expression::Field(l), Expression::Field(r)) if r == field => Some(l),
            _ => None,
        }
    }

    /// Returns whether both sides can be evaluated against the schema.
    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }

    /// Returns every field name the term references.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.lhs
            .as_field_name()
            .into_iter()
            .chain(self.rhs.as_field_name())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// A conjunction of zero or more [`Term`]s.
///
/// The empty predicate is always true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    /// Creates the always-true predicate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-term predicate.
    pub fn from_term(term: Term) -> Self {
        Self { terms: vec![term] }
    }

    /// Adds a conjunct.
    pub fn add_term(&mut self, term: Term) {
        self.terms.push(term);
    }

    /// Conjoins another predicate's terms into this one.
    pub fn conjoin_with(&mut self, other: Predicate) {
        self.terms.extend(other.terms);
    }

    /// Returns the conjuncts.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Tests the conjunction against the current row of `scan`.
    pub async fn is_satisfied<S: Storage>(&self, scan: &Scan<S>) -> Result<bool, QueryError> {
        for term in &self.terms {
            if !term.is_satisfied(scan).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Estimates the combined reduction factor of all conjuncts.
    pub fn reduction_factor<S: Storage>(&self, plan: &Plan<S>) -> u64 {
        self.terms
            .iter()
            .fold(1u64, |acc, t| acc.saturating_mul(t.reduction_factor(plan)))
    }

    /// If some conjunct fixes `field` to a constant, returns that constant.
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        self.terms
            .iter()
            .find_map(|t| t.equates_with_constant(field))
    }

    /// If some conjunct equates `field` with another field, returns the
    /// other field's name.
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| t.equates_with_field(field))
    }

    /// Returns the conjuncts that can be evaluated against `schema` alone,
    /// or `None` if there are none.
    ///
    /// Used to push selections toward the leaves.
    pub fn select_sub_pred(&self, schema: &Schema) -> Option<Predicate> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.applies_to(schema))
            .cloned()
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(Predicate { terms })
        }
    }

    /// Returns the conjuncts that span the two schemas — evaluable against
    /// their concatenation but against neither side alone — or `None` if
    /// there are none.
    ///
    /// These are the terms that realize a join condition between the two
    /// relations.
    pub fn join_sub_pred(&self, lhs: &Schema, rhs: &Schema) -> Option<Predicate> {
        let mut joined = Schema::new();
        // The caller guarantees disjoint schemas (they come from a product
        // plan's two sides), so the concatenation cannot fail.
        if joined.add_all(lhs).is_err() || joined.add_all(rhs).is_err() {
            return None;
        }
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| {
                !t.applies_to(lhs) && !t.applies_to(rhs) && t.applies_to(&joined)
            })
            .cloned()
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(Predicate { terms })
        }
    }

    /// Returns every field name referenced by some conjunct.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().flat_map(|t| t.fields())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "true");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}
