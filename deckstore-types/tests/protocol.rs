//! Acceptance tests for the protocol crate.
//!
//! Tests cover:
//! - Object safety of the boundary and callback traits
//! - Record serialization
//! - Cross-kind wire ordering
//! - Error classification as a whole table

use std::cmp::Ordering;
use std::sync::Arc;

use deckstore_types::wire::{compare, same_kind};
use deckstore_types::*;
use proptest::prelude::*;
use serde_json::json;

// --- Object safety ---

fn _assert_send_sync<T: Send + Sync + ?Sized>() {}

#[test]
fn remote_store_is_object_safe_send_sync() {
    _assert_send_sync::<Arc<dyn RemoteStore>>();
}

#[test]
fn callbacks_are_object_safe_send_sync() {
    _assert_send_sync::<Arc<dyn PageSource<Record>>>();
    _assert_send_sync::<Arc<dyn SearchSource<Record>>>();
}

// --- Records ---

#[test]
fn record_serializes_with_plain_string_id() {
    let record = Record::new(DocumentId::new("d1"))
        .with("userId", json!("u1"))
        .with("rank", json!(3));
    let encoded = serde_json::to_value(&record).unwrap();
    assert_eq!(encoded, json!({ "id": "d1", "fields": { "rank": 3, "userId": "u1" } }));

    let decoded: Record = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn record_value_resolves_document_id_path() {
    let record = Record::new(DocumentId::new("d1")).with("name", json!("x"));
    assert_eq!(record.value(&FieldPath::document_id()), Some(json!("d1")));
    assert_eq!(record.value(&FieldPath::from("name")), Some(json!("x")));
    assert_eq!(record.value(&FieldPath::from("missing")), None);
}

// --- Ordering ---

#[test]
fn kinds_order_null_bool_number_string_array_map() {
    let ladder = [json!(null), json!(true), json!(-5), json!("a"), json!([1]), json!({ "k": 1 })];
    for pair in ladder.windows(2) {
        assert_eq!(compare(&pair[0], &pair[1]), Ordering::Less, "{pair:?}");
        assert!(!same_kind(&pair[0], &pair[1]));
    }
}

#[test]
fn integers_and_floats_compare_numerically() {
    assert_eq!(compare(&json!(2), &json!(2.5)), Ordering::Less);
    assert_eq!(compare(&json!(3.0), &json!(2)), Ordering::Greater);
    assert_eq!(compare(&json!(-1), &json!(1)), Ordering::Less);
}

fn scalar() -> impl Strategy<Value = WireValue> {
    prop_oneof![
        Just(json!(null)),
        any::<bool>().prop_map(|b| json!(b)),
        any::<i32>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-c]{0,3}".prop_map(|s| json!(s)),
    ]
}

fn value() -> impl Strategy<Value = WireValue> {
    prop_oneof![
        4 => scalar(),
        1 => prop::collection::vec(scalar(), 0..3).prop_map(WireValue::Array),
    ]
}

proptest! {
    #[test]
    fn compare_is_antisymmetric(a in value(), b in value()) {
        prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
    }

    #[test]
    fn compare_is_transitive(a in value(), b in value(), c in value()) {
        if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
            prop_assert_ne!(compare(&a, &c), Ordering::Greater);
        }
    }
}

// --- Errors ---

#[test]
fn every_backend_code_maps_to_one_service_error() {
    use BackendCode::*;
    let table = [
        (PermissionDenied, StoreError::PermissionDenied("m".into())),
        (Unauthenticated, StoreError::PermissionDenied("m".into())),
        (AlreadyExists, StoreError::ValidationConflict("m".into())),
        (InvalidArgument, StoreError::ValidationConflict("m".into())),
        (FailedPrecondition, StoreError::ValidationConflict("m".into())),
        (OutOfRange, StoreError::ValidationConflict("m".into())),
        (NotFound, StoreError::DeleteFailed("m".into())),
        (Unavailable, StoreError::DeleteFailed("m".into())),
        (DeadlineExceeded, StoreError::DeleteFailed("m".into())),
        (Aborted, StoreError::DeleteFailed("m".into())),
        (ResourceExhausted, StoreError::DeleteFailed("m".into())),
        (Cancelled, StoreError::DeleteFailed("m".into())),
        (Unknown, StoreError::SystemError("m".into())),
        (Internal, StoreError::SystemError("m".into())),
        (DataLoss, StoreError::SystemError("m".into())),
        (Unimplemented, StoreError::SystemError("m".into())),
    ];
    for (code, expected) in table {
        let got = StoreError::classify(Operation::Delete, BackendError::new(code, "m"));
        assert_eq!(got, expected, "{code}");
    }
}

#[test]
fn numeric_codes_round_trip_through_names() {
    assert_eq!(BackendCode::from_code(7), BackendCode::PermissionDenied);
    assert_eq!(BackendCode::from_code(14).to_string(), "unavailable");
    assert_eq!(BackendCode::from_code(99), BackendCode::Unknown);
}
