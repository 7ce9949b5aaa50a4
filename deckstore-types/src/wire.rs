//! Wire values and the explicit conversion capability every stored type implements.
//!
//! The backend speaks JSON-shaped values. Domain types never reach it
//! directly: they convert through [`ToWireValue`] / [`FromWireValue`],
//! which are implemented per type (primitives here, enums via
//! [`wire_enum!`](crate::wire_enum)). There is no runtime introspection.

use chrono::{DateTime, TimeZone, Utc};
use std::cmp::Ordering;
use thiserror::Error;

use crate::id::{DocumentId, OwnerId};

/// A primitive value as the backend stores it.
pub type WireValue = serde_json::Value;

/// Errors decoding a wire value back into a domain type.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WireError {
    /// A required field was absent from the stored document.
    #[error("missing field: {0}")]
    Missing(String),

    /// The stored value had the wrong primitive kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The kind the decoder wanted.
        expected: &'static str,
        /// The kind actually stored.
        found: &'static str,
    },

    /// A string did not name any variant of the target enum.
    #[error("unknown {type_name} variant: {value}")]
    UnknownVariant {
        /// Name of the enum being decoded.
        type_name: &'static str,
        /// The unrecognized wire string.
        value: String,
    },

    /// A number did not fit the target type.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// Decoding a specific field failed.
    #[error("field {field}: {source}")]
    Field {
        /// Wire key of the failing field.
        field: String,
        /// The underlying decode error.
        #[source]
        source: Box<WireError>,
    },
}

/// Convert a domain value into its primitive wire representation.
pub trait ToWireValue {
    /// Encode `self` for the backend.
    fn to_wire(&self) -> WireValue;
}

/// Decode a domain value from its primitive wire representation.
pub trait FromWireValue: Sized {
    /// Decode from a stored value.
    fn from_wire(value: &WireValue) -> Result<Self, WireError>;

    /// Value to use when the key is absent from the stored document.
    /// Only optional types accept absence.
    fn from_absent(field: &str) -> Result<Self, WireError> {
        Err(WireError::Missing(field.to_owned()))
    }
}

/// Short name of a value's primitive kind, for error messages.
pub fn kind(value: &WireValue) -> &'static str {
    match value {
        WireValue::Null => "null",
        WireValue::Bool(_) => "bool",
        WireValue::Number(_) => "number",
        WireValue::String(_) => "string",
        WireValue::Array(_) => "array",
        WireValue::Object(_) => "map",
    }
}

fn type_rank(value: &WireValue) -> u8 {
    match value {
        WireValue::Null => 0,
        WireValue::Bool(_) => 1,
        WireValue::Number(_) => 2,
        WireValue::String(_) => 3,
        WireValue::Array(_) => 4,
        WireValue::Object(_) => 5,
    }
}

/// True when both values belong to the same primitive kind.
/// Range predicates only match values of the queried kind.
pub fn same_kind(a: &WireValue, b: &WireValue) -> bool {
    type_rank(a) == type_rank(b)
}

/// Total order over wire values, matching the backend's cross-type ordering:
/// null < bool < number < string < array < map.
pub fn compare(a: &WireValue, b: &WireValue) -> Ordering {
    match (a, b) {
        (WireValue::Null, WireValue::Null) => Ordering::Equal,
        (WireValue::Bool(x), WireValue::Bool(y)) => x.cmp(y),
        (WireValue::Number(x), WireValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        },
        (WireValue::String(x), WireValue::String(y)) => x.cmp(y),
        (WireValue::Array(x), WireValue::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (WireValue::Object(x), WireValue::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
                let ord = lk.cmp(rk).then_with(|| compare(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// ---- Primitive impls --------------------------------------------------------

impl ToWireValue for WireValue {
    fn to_wire(&self) -> WireValue {
        self.clone()
    }
}

impl FromWireValue for WireValue {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        Ok(value.clone())
    }
}

impl ToWireValue for str {
    fn to_wire(&self) -> WireValue {
        WireValue::String(self.to_owned())
    }
}

impl ToWireValue for String {
    fn to_wire(&self) -> WireValue {
        WireValue::String(self.clone())
    }
}

impl FromWireValue for String {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or(WireError::TypeMismatch { expected: "string", found: kind(value) })
    }
}

impl ToWireValue for bool {
    fn to_wire(&self) -> WireValue {
        WireValue::Bool(*self)
    }
}

impl FromWireValue for bool {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        value
            .as_bool()
            .ok_or(WireError::TypeMismatch { expected: "bool", found: kind(value) })
    }
}

impl ToWireValue for i64 {
    fn to_wire(&self) -> WireValue {
        WireValue::from(*self)
    }
}

impl FromWireValue for i64 {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        value
            .as_i64()
            .ok_or(WireError::TypeMismatch { expected: "integer", found: kind(value) })
    }
}

impl ToWireValue for i32 {
    fn to_wire(&self) -> WireValue {
        WireValue::from(*self)
    }
}

impl ToWireValue for usize {
    fn to_wire(&self) -> WireValue {
        WireValue::from(*self)
    }
}

impl ToWireValue for u32 {
    fn to_wire(&self) -> WireValue {
        WireValue::from(*self)
    }
}

impl FromWireValue for u32 {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        let raw = i64::from_wire(value)?;
        u32::try_from(raw).map_err(|_| WireError::OutOfRange(raw.to_string()))
    }
}

impl ToWireValue for f64 {
    fn to_wire(&self) -> WireValue {
        serde_json::Number::from_f64(*self)
            .map(WireValue::Number)
            .unwrap_or(WireValue::Null)
    }
}

impl FromWireValue for f64 {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        value
            .as_f64()
            .ok_or(WireError::TypeMismatch { expected: "number", found: kind(value) })
    }
}

/// Timestamps travel as epoch milliseconds so they order numerically.
impl ToWireValue for DateTime<Utc> {
    fn to_wire(&self) -> WireValue {
        WireValue::from(self.timestamp_millis())
    }
}

impl FromWireValue for DateTime<Utc> {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        let millis = i64::from_wire(value)?;
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| WireError::OutOfRange(millis.to_string()))
    }
}

impl ToWireValue for DocumentId {
    fn to_wire(&self) -> WireValue {
        WireValue::String(self.0.clone())
    }
}

impl FromWireValue for DocumentId {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        String::from_wire(value).map(DocumentId)
    }
}

impl ToWireValue for OwnerId {
    fn to_wire(&self) -> WireValue {
        WireValue::String(self.0.clone())
    }
}

impl FromWireValue for OwnerId {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        String::from_wire(value).map(OwnerId)
    }
}

/// Absent optionals become an explicit null, never an omitted key.
impl<T: ToWireValue> ToWireValue for Option<T> {
    fn to_wire(&self) -> WireValue {
        match self {
            Some(inner) => inner.to_wire(),
            None => WireValue::Null,
        }
    }
}

impl<T: FromWireValue> FromWireValue for Option<T> {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        match value {
            WireValue::Null => Ok(None),
            other => T::from_wire(other).map(Some),
        }
    }

    fn from_absent(_field: &str) -> Result<Self, WireError> {
        Ok(None)
    }
}

impl<T: ToWireValue> ToWireValue for Vec<T> {
    fn to_wire(&self) -> WireValue {
        WireValue::Array(self.iter().map(ToWireValue::to_wire).collect())
    }
}

impl<T: ToWireValue> ToWireValue for [T] {
    fn to_wire(&self) -> WireValue {
        WireValue::Array(self.iter().map(ToWireValue::to_wire).collect())
    }
}

impl<T: FromWireValue> FromWireValue for Vec<T> {
    fn from_wire(value: &WireValue) -> Result<Self, WireError> {
        match value {
            WireValue::Array(items) => items.iter().map(T::from_wire).collect(),
            other => Err(WireError::TypeMismatch { expected: "array", found: kind(other) }),
        }
    }

    fn from_absent(_field: &str) -> Result<Self, WireError> {
        Ok(Vec::new())
    }
}

impl<T: ToWireValue + ?Sized> ToWireValue for &T {
    fn to_wire(&self) -> WireValue {
        (**self).to_wire()
    }
}

/// Implement [`ToWireValue`] and [`FromWireValue`] for a fieldless enum,
/// mapping each variant to a fixed wire string.
///
/// ```
/// use deckstore_types::{wire_enum, ToWireValue};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Shade { Light, Dark }
///
/// wire_enum!(Shade { Light => "light", Dark => "dark" });
///
/// assert_eq!(Shade::Dark.to_wire(), serde_json::json!("dark"));
/// ```
#[macro_export]
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $crate::wire::ToWireValue for $name {
            fn to_wire(&self) -> $crate::wire::WireValue {
                let raw = match self {
                    $(Self::$variant => $wire,)+
                };
                $crate::wire::WireValue::String(raw.to_owned())
            }
        }

        impl $crate::wire::FromWireValue for $name {
            fn from_wire(
                value: &$crate::wire::WireValue,
            ) -> ::std::result::Result<Self, $crate::wire::WireError> {
                match value.as_str() {
                    $(Some($wire) => Ok(Self::$variant),)+
                    Some(other) => Err($crate::wire::WireError::UnknownVariant {
                        type_name: stringify!($name),
                        value: other.to_owned(),
                    }),
                    None => Err($crate::wire::WireError::TypeMismatch {
                        expected: "string",
                        found: $crate::wire::kind(value),
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mood {
        Calm,
        Loud,
    }

    wire_enum!(Mood { Calm => "calm", Loud => "loud" });

    #[test]
    fn none_encodes_as_explicit_null() {
        let absent: Option<String> = None;
        assert_eq!(absent.to_wire(), WireValue::Null);
        assert_eq!(Some("x".to_string()).to_wire(), json!("x"));
    }

    #[test]
    fn optional_accepts_absence_required_does_not() {
        assert_eq!(Option::<String>::from_absent("notes"), Ok(None));
        assert_eq!(
            String::from_absent("name"),
            Err(WireError::Missing("name".into()))
        );
    }

    #[test]
    fn enum_round_trips_through_wire_string() {
        assert_eq!(Mood::Loud.to_wire(), json!("loud"));
        assert_eq!(Mood::from_wire(&json!("calm")), Ok(Mood::Calm));
        assert!(matches!(
            Mood::from_wire(&json!("angry")),
            Err(WireError::UnknownVariant { type_name: "Mood", .. })
        ));
        assert!(matches!(
            Mood::from_wire(&json!(3)),
            Err(WireError::TypeMismatch { expected: "string", found: "number" })
        ));
    }

    #[test]
    fn timestamps_are_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).single().unwrap();
        assert_eq!(at.to_wire(), json!(1_700_000_000_123_i64));
        assert_eq!(DateTime::<Utc>::from_wire(&json!(1_700_000_000_123_i64)), Ok(at));
    }

    #[test]
    fn compare_orders_across_kinds() {
        assert_eq!(compare(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare(&json!(true), &json!(0)), Ordering::Less);
        assert_eq!(compare(&json!(10), &json!("a")), Ordering::Less);
        assert_eq!(compare(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare(&json!(2), &json!(2.5)), Ordering::Less);
        assert_eq!(compare(&json!([1, 2]), &json!([1, 2, 0])), Ordering::Less);
    }

    #[test]
    fn u32_rejects_negative() {
        assert!(matches!(u32::from_wire(&json!(-1)), Err(WireError::OutOfRange(_))));
    }
}
