//! The typed predicate vocabulary callers use to describe a query.

use crate::document::{FieldKey, FieldPath};
use crate::wire::{ToWireValue, WireValue};

impl<F: FieldKey> From<F> for FieldPath {
    fn from(field: F) -> Self {
        field.path()
    }
}

/// One atomic query constraint.
///
/// Filters narrow the result set; `OrderBy` and the two limit forms shape
/// it. At most one ordering and one limit take effect per query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field == value`
    EqualTo(FieldPath, WireValue),
    /// `field` is one of `values`.
    In(FieldPath, Vec<WireValue>),
    /// `field` is present and none of `values`.
    NotIn(FieldPath, Vec<WireValue>),
    /// Array `field` contains `value`.
    ArrayContains(FieldPath, WireValue),
    /// Array `field` contains at least one of `values`.
    ArrayContainsAny(FieldPath, Vec<WireValue>),
    /// `field < value`
    LessThan(FieldPath, WireValue),
    /// `field > value`
    GreaterThan(FieldPath, WireValue),
    /// `field <= value`
    LessOrEqual(FieldPath, WireValue),
    /// `field >= value`
    GreaterOrEqual(FieldPath, WireValue),
    /// Sort by `field`.
    OrderBy {
        /// Sort key.
        field: FieldPath,
        /// Descending when true.
        descending: bool,
    },
    /// Keep the first `n` results.
    Limit(usize),
    /// Keep the last `n` results.
    LimitToLast(usize),
    /// `field` is stored as null.
    IsNull(FieldPath),
    /// `field` is stored and not null.
    IsNotNull(FieldPath),
}

impl Predicate {
    /// `field == value`
    pub fn equal_to(field: impl Into<FieldPath>, value: impl ToWireValue) -> Self {
        Self::EqualTo(field.into(), value.to_wire())
    }

    /// `field` is one of `values`.
    pub fn is_in<V: ToWireValue>(
        field: impl Into<FieldPath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In(field.into(), values.into_iter().map(|v| v.to_wire()).collect())
    }

    /// `field` is none of `values`.
    pub fn not_in<V: ToWireValue>(
        field: impl Into<FieldPath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::NotIn(field.into(), values.into_iter().map(|v| v.to_wire()).collect())
    }

    /// Array `field` contains `value`.
    pub fn array_contains(field: impl Into<FieldPath>, value: impl ToWireValue) -> Self {
        Self::ArrayContains(field.into(), value.to_wire())
    }

    /// Array `field` contains any of `values`.
    pub fn array_contains_any<V: ToWireValue>(
        field: impl Into<FieldPath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::ArrayContainsAny(field.into(), values.into_iter().map(|v| v.to_wire()).collect())
    }

    /// `field < value`
    pub fn less_than(field: impl Into<FieldPath>, value: impl ToWireValue) -> Self {
        Self::LessThan(field.into(), value.to_wire())
    }

    /// `field > value`
    pub fn greater_than(field: impl Into<FieldPath>, value: impl ToWireValue) -> Self {
        Self::GreaterThan(field.into(), value.to_wire())
    }

    /// `field <= value`
    pub fn less_or_equal(field: impl Into<FieldPath>, value: impl ToWireValue) -> Self {
        Self::LessOrEqual(field.into(), value.to_wire())
    }

    /// `field >= value`
    pub fn greater_or_equal(field: impl Into<FieldPath>, value: impl ToWireValue) -> Self {
        Self::GreaterOrEqual(field.into(), value.to_wire())
    }

    /// Sort ascending by `field`.
    pub fn order_by(field: impl Into<FieldPath>) -> Self {
        Self::OrderBy { field: field.into(), descending: false }
    }

    /// Sort descending by `field`.
    pub fn order_by_descending(field: impl Into<FieldPath>) -> Self {
        Self::OrderBy { field: field.into(), descending: true }
    }

    /// `field` is null.
    pub fn is_null(field: impl Into<FieldPath>) -> Self {
        Self::IsNull(field.into())
    }

    /// `field` is not null.
    pub fn is_not_null(field: impl Into<FieldPath>) -> Self {
        Self::IsNotNull(field.into())
    }

    /// Whether this is an ordering predicate.
    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::OrderBy { .. })
    }

    /// Whether this is one of the limit predicates.
    pub fn is_limit(&self) -> bool {
        matches!(self, Self::Limit(_) | Self::LimitToLast(_))
    }

    /// The field this predicate filters on, if it is a filter.
    pub fn filter_field(&self) -> Option<&FieldPath> {
        match self {
            Self::EqualTo(f, _)
            | Self::In(f, _)
            | Self::NotIn(f, _)
            | Self::ArrayContains(f, _)
            | Self::ArrayContainsAny(f, _)
            | Self::LessThan(f, _)
            | Self::GreaterThan(f, _)
            | Self::LessOrEqual(f, _)
            | Self::GreaterOrEqual(f, _)
            | Self::IsNull(f)
            | Self::IsNotNull(f) => Some(f),
            Self::OrderBy { .. } | Self::Limit(_) | Self::LimitToLast(_) => None,
        }
    }
}
