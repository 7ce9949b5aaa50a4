//! Query evaluation over in-memory records.
//!
//! Follows the hosted backend's semantics: range filters only match values
//! of the operand's kind, documents missing the order field are excluded,
//! ties in the order field break on document id in the same direction.

use deckstore_types::wire::{compare, same_kind};
use deckstore_types::{
    BackendCode, BackendError, Filter, FilterOp, Limit, OrderSpec, Query, Record, WireValue,
};
use std::cmp::Ordering;

fn equal(a: &WireValue, b: &WireValue) -> bool {
    same_kind(a, b) && compare(a, b) == Ordering::Equal
}

fn operand_list(filter: &Filter) -> &[WireValue] {
    match &filter.value {
        WireValue::Array(values) => values.as_slice(),
        _ => &[],
    }
}

/// Reject queries the hosted backend would refuse.
pub(crate) fn validate(query: &Query, max_membership_values: usize) -> Result<(), BackendError> {
    for filter in &query.filters {
        if matches!(filter.op, FilterOp::In | FilterOp::NotIn | FilterOp::ArrayContainsAny) {
            let WireValue::Array(values) = &filter.value else {
                return Err(BackendError::new(
                    BackendCode::InvalidArgument,
                    format!("{:?} on {} needs an array operand", filter.op, filter.field),
                ));
            };
            if values.is_empty() || values.len() > max_membership_values {
                return Err(BackendError::new(
                    BackendCode::InvalidArgument,
                    format!(
                        "{:?} on {} supports 1..={} values, got {}",
                        filter.op,
                        filter.field,
                        max_membership_values,
                        values.len()
                    ),
                ));
            }
        }
    }
    if query.limit.is_some_and(|limit| limit.count() == 0) {
        return Err(BackendError::new(BackendCode::InvalidArgument, "limit must be positive"));
    }
    Ok(())
}

/// Whether `record` satisfies `filter`.
pub(crate) fn matches(record: &Record, filter: &Filter) -> bool {
    let value = record.value(&filter.field);
    match filter.op {
        FilterOp::Equal => value.is_some_and(|v| equal(&v, &filter.value)),
        FilterOp::In => value.is_some_and(|v| operand_list(filter).iter().any(|o| equal(&v, o))),
        FilterOp::NotIn => value.is_some_and(|v| {
            !v.is_null() && !operand_list(filter).iter().any(|o| equal(&v, o))
        }),
        FilterOp::ArrayContains => match value {
            Some(WireValue::Array(items)) => items.iter().any(|item| equal(item, &filter.value)),
            _ => false,
        },
        FilterOp::ArrayContainsAny => match value {
            Some(WireValue::Array(items)) => items
                .iter()
                .any(|item| operand_list(filter).iter().any(|o| equal(item, o))),
            _ => false,
        },
        FilterOp::LessThan => range(value, &filter.value, |o| o == Ordering::Less),
        FilterOp::GreaterThan => range(value, &filter.value, |o| o == Ordering::Greater),
        FilterOp::LessOrEqual => range(value, &filter.value, |o| o != Ordering::Greater),
        FilterOp::GreaterOrEqual => range(value, &filter.value, |o| o != Ordering::Less),
        FilterOp::IsNull => value.is_some_and(|v| v.is_null()),
        FilterOp::IsNotNull => value.is_some_and(|v| !v.is_null()),
    }
}

fn range(value: Option<WireValue>, operand: &WireValue, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        Some(v) if same_kind(&v, operand) => accept(compare(&v, operand)),
        _ => false,
    }
}

/// Position of `a` relative to `b` under `order`, id as tie-breaker.
pub(crate) fn order_cmp(a: &Record, b: &Record, order: &OrderSpec) -> Ordering {
    let av = a.value(&order.field).unwrap_or(WireValue::Null);
    let bv = b.value(&order.field).unwrap_or(WireValue::Null);
    let ord = compare(&av, &bv).then_with(|| a.id.cmp(&b.id));
    if order.descending { ord.reverse() } else { ord }
}

/// Filter, order, resume after the cursor, and cap.
pub(crate) fn execute<'a>(
    records: impl Iterator<Item = &'a Record>,
    query: &Query,
) -> Vec<Record> {
    let mut matched: Vec<&Record> = records
        .filter(|record| record.value(&query.order.field).is_some())
        .filter(|record| query.filters.iter().all(|f| matches(record, f)))
        .collect();
    matched.sort_by(|a, b| order_cmp(a, b, &query.order));

    if let Some(cursor) = &query.start_after {
        matched.retain(|record| order_cmp(record, cursor, &query.order) == Ordering::Greater);
    }

    let selected: &[&Record] = match query.limit {
        Some(Limit::First(n)) => &matched[..n.min(matched.len())],
        Some(Limit::Last(n)) => &matched[matched.len().saturating_sub(n)..],
        None => &matched,
    };
    selected.iter().map(|record| (*record).clone()).collect()
}
