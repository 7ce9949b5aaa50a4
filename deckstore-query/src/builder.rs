//! Translates predicate lists into owner-scoped backend queries.

use deckstore_types::{
    Document, FieldKey, FieldPath, Filter, FilterOp, Limit, OrderSpec, OwnerId, Predicate, Query,
    WireValue,
};

/// Page size injected when the caller supplies no limit.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Composes predicate lists into [`Query`] objects for one collection.
///
/// Every query is owner-scoped: an owner-equality filter is always the first
/// filter, and caller equality predicates on the owner field are discarded.
/// When the caller supplies no `OrderBy`, the default order is injected;
/// when the caller supplies no limit, the default page size is injected.
/// Explicit ordering and limits replace the defaults, last one wins.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    collection: String,
    owner_field: FieldPath,
    default_order: OrderSpec,
    default_limit: usize,
}

impl QueryBuilder {
    /// Create a builder for `collection`, scoping on `owner_field`.
    pub fn new(
        collection: impl Into<String>,
        owner_field: impl Into<FieldPath>,
        default_order: OrderSpec,
    ) -> Self {
        Self {
            collection: collection.into(),
            owner_field: owner_field.into(),
            default_order,
            default_limit: DEFAULT_PAGE_SIZE,
        }
    }

    /// Builder for a document type's collection, owner field, and declared order.
    pub fn for_document<D: Document>() -> Self {
        Self::new(
            D::COLLECTION,
            D::OWNER_FIELD.path(),
            OrderSpec { field: D::ORDER_FIELD.path(), descending: D::ORDER_DESCENDING },
        )
    }

    /// Override the injected page size.
    #[must_use]
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Override the injected order.
    #[must_use]
    pub fn default_order(mut self, order: OrderSpec) -> Self {
        self.default_order = order;
        self
    }

    /// The collection queries target.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The order injected when the caller gives none.
    pub fn order(&self) -> &OrderSpec {
        &self.default_order
    }

    /// The injected page size.
    pub fn page_size(&self) -> usize {
        self.default_limit
    }

    /// Compose a page query: owner filter, caller filters, one order, one limit.
    pub fn build(&self, owner: &OwnerId, predicates: &[Predicate]) -> Query {
        self.compose(owner, predicates, true)
    }

    /// Compose a query without injecting the default limit. An explicit
    /// caller limit is still honored. Used for counting.
    pub fn build_unbounded(&self, owner: &OwnerId, predicates: &[Predicate]) -> Query {
        self.compose(owner, predicates, false)
    }

    fn compose(&self, owner: &OwnerId, predicates: &[Predicate], inject_limit: bool) -> Query {
        let mut filters = Vec::with_capacity(predicates.len() + 1);
        filters.push(Filter::new(
            self.owner_field.clone(),
            FilterOp::Equal,
            WireValue::String(owner.0.clone()),
        ));
        let mut order = None;
        let mut limit = None;

        for predicate in predicates {
            match predicate {
                Predicate::EqualTo(field, _) if *field == self.owner_field => {
                    tracing::warn!(
                        collection = %self.collection,
                        field = %field,
                        "discarding caller owner predicate; queries are always owner-scoped"
                    );
                }
                Predicate::OrderBy { field, descending } => {
                    order = Some(OrderSpec { field: field.clone(), descending: *descending });
                }
                Predicate::Limit(n) => limit = Some(Limit::First(*n)),
                Predicate::LimitToLast(n) => limit = Some(Limit::Last(*n)),
                other => {
                    if let Some(filter) = to_filter(other) {
                        filters.push(filter);
                    }
                }
            }
        }

        let limit = match limit {
            Some(explicit) => Some(explicit),
            None if inject_limit => Some(Limit::First(self.default_limit)),
            None => None,
        };

        Query {
            collection: self.collection.clone(),
            filters,
            order: order.unwrap_or_else(|| self.default_order.clone()),
            limit,
            start_after: None,
        }
    }
}

fn to_filter(predicate: &Predicate) -> Option<Filter> {
    let (field, op, value) = match predicate {
        Predicate::EqualTo(f, v) => (f, FilterOp::Equal, v.clone()),
        Predicate::In(f, vs) => (f, FilterOp::In, WireValue::Array(vs.clone())),
        Predicate::NotIn(f, vs) => (f, FilterOp::NotIn, WireValue::Array(vs.clone())),
        Predicate::ArrayContains(f, v) => (f, FilterOp::ArrayContains, v.clone()),
        Predicate::ArrayContainsAny(f, vs) => {
            (f, FilterOp::ArrayContainsAny, WireValue::Array(vs.clone()))
        }
        Predicate::LessThan(f, v) => (f, FilterOp::LessThan, v.clone()),
        Predicate::GreaterThan(f, v) => (f, FilterOp::GreaterThan, v.clone()),
        Predicate::LessOrEqual(f, v) => (f, FilterOp::LessOrEqual, v.clone()),
        Predicate::GreaterOrEqual(f, v) => (f, FilterOp::GreaterOrEqual, v.clone()),
        Predicate::IsNull(f) => (f, FilterOp::IsNull, WireValue::Null),
        Predicate::IsNotNull(f) => (f, FilterOp::IsNotNull, WireValue::Null),
        Predicate::OrderBy { .. } | Predicate::Limit(_) | Predicate::LimitToLast(_) => return None,
    };
    Some(Filter::new(field.clone(), op, value))
}
