//! The composed query object handed to the remote store.

use serde::{Deserialize, Serialize};

use crate::document::{FieldPath, Record};
use crate::wire::WireValue;

/// Comparison applied by one [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    /// `==`
    Equal,
    /// membership
    In,
    /// non-membership
    NotIn,
    /// array contains value
    ArrayContains,
    /// array contains any of values
    ArrayContainsAny,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// stored null
    IsNull,
    /// stored, not null
    IsNotNull,
}

/// One field constraint. Membership operators carry an array value;
/// null checks carry `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field being constrained.
    pub field: FieldPath,
    /// Comparison.
    pub op: FilterOp,
    /// Operand.
    pub value: WireValue,
}

impl Filter {
    /// Create a filter.
    pub fn new(field: FieldPath, op: FilterOp, value: WireValue) -> Self {
        Self { field, op, value }
    }
}

/// Sort key and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Sort key.
    pub field: FieldPath,
    /// Descending when true.
    pub descending: bool,
}

impl OrderSpec {
    /// Ascending order on `field`.
    pub fn ascending(field: impl Into<FieldPath>) -> Self {
        Self { field: field.into(), descending: false }
    }

    /// Descending order on `field`.
    pub fn descending(field: impl Into<FieldPath>) -> Self {
        Self { field: field.into(), descending: true }
    }
}

/// Result-count cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    /// First `n` results in order.
    First(usize),
    /// Last `n` results in order.
    Last(usize),
}

impl Limit {
    /// The cap regardless of which end it applies to.
    pub fn count(self) -> usize {
        match self {
            Limit::First(n) | Limit::Last(n) => n,
        }
    }
}

/// A fully composed, owner-scoped query against one collection.
///
/// Filters are applied in order; the owner filter is always first.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection name.
    pub collection: String,
    /// Constraints, owner filter first.
    pub filters: Vec<Filter>,
    /// The single effective ordering.
    pub order: OrderSpec,
    /// The single effective limit, if any.
    pub limit: Option<Limit>,
    /// Resume strictly after this snapshot in `order`.
    pub start_after: Option<Record>,
}

impl Query {
    /// Resume after the given snapshot.
    #[must_use]
    pub fn start_after(mut self, snapshot: Record) -> Self {
        self.start_after = Some(snapshot);
        self
    }

    /// Replace the effective limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<Limit>) -> Self {
        self.limit = limit;
        self
    }

    /// Page size implied by the limit, if it is a forward limit.
    pub fn page_size(&self) -> Option<usize> {
        match self.limit {
            Some(Limit::First(n)) => Some(n),
            _ => None,
        }
    }
}
