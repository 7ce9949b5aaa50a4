//! Documents, their explicit field tables, and the backend's record shape.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::id::{DocumentId, OwnerId};
use crate::wire::{FromWireValue, WireError, WireValue};

/// Reserved field path addressing the document identifier itself.
pub const DOCUMENT_ID_FIELD: &str = "__name__";

/// A field name as the backend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldPath(Cow<'static, str>);

impl FieldPath {
    /// A field path from a static wire key.
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    /// The path addressing the document identifier.
    pub const fn document_id() -> Self {
        Self::from_static(DOCUMENT_ID_FIELD)
    }

    /// Borrow the wire key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this path addresses the document identifier.
    pub fn is_document_id(&self) -> bool {
        self.0 == DOCUMENT_ID_FIELD
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for FieldPath {
    fn from(key: &'static str) -> Self {
        Self::from_static(key)
    }
}

impl From<String> for FieldPath {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

/// A closed set of logical fields for one document type, each mapped to a
/// fixed wire key. Implemented by a plain enum per document type.
pub trait FieldKey: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every field, in serialization order.
    const ALL: &'static [Self];

    /// The backend key this field is stored under.
    fn wire_key(self) -> &'static str;

    /// The field as a [`FieldPath`] usable in predicates and updates.
    fn path(self) -> FieldPath {
        FieldPath::from_static(self.wire_key())
    }
}

/// A stored document as the backend returns it: identifier plus field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Document identifier.
    pub id: DocumentId,
    /// Field values keyed by wire key.
    pub fields: BTreeMap<String, WireValue>,
}

impl Record {
    /// Create an empty record for the given identifier.
    pub fn new(id: DocumentId) -> Self {
        Self { id, fields: BTreeMap::new() }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: WireValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Value at `path`, resolving the reserved document-id path.
    pub fn value(&self, path: &FieldPath) -> Option<WireValue> {
        if path.is_document_id() {
            return Some(WireValue::String(self.id.0.clone()));
        }
        self.fields.get(path.as_str()).cloned()
    }

    /// Decode one field. Absent keys are accepted only by optional types.
    pub fn decode<T: FromWireValue>(&self, key: impl FieldKey) -> Result<T, WireError> {
        let wire_key = key.wire_key();
        let decoded = match self.fields.get(wire_key) {
            Some(value) => T::from_wire(value),
            None => T::from_absent(wire_key),
        };
        decoded.map_err(|source| match source {
            WireError::Missing(field) => WireError::Missing(field),
            other => WireError::Field { field: wire_key.to_owned(), source: Box::new(other) },
        })
    }
}

/// Anything addressable by a document identifier.
pub trait Identifiable {
    /// The stable identifier.
    fn id(&self) -> &DocumentId;
}

impl Identifiable for Record {
    fn id(&self) -> &DocumentId {
        &self.id
    }
}

/// A record type the access layer can store, query, and cache.
///
/// Serialization goes through the type's explicit field table
/// ([`Document::Field`]) and per-field encoding ([`Document::field_value`]).
pub trait Document: Identifiable + Clone + Send + Sync + 'static {
    /// The type's field table.
    type Field: FieldKey;

    /// Backend collection name.
    const COLLECTION: &'static str;

    /// Field holding the owner identifier. Every query filters on it.
    const OWNER_FIELD: Self::Field;

    /// Comparable field used as the default query order.
    const ORDER_FIELD: Self::Field;

    /// Whether the default order is descending.
    const ORDER_DESCENDING: bool = false;

    /// The owner identifier, set once at creation.
    fn owner(&self) -> &OwnerId;

    /// Encode one field for the backend.
    fn field_value(&self, field: Self::Field) -> WireValue;

    /// Decode a stored record.
    fn from_record(record: &Record) -> Result<Self, WireError>;

    /// Encode every field in the table. Absent optionals become explicit nulls.
    fn to_record(&self) -> Record {
        let fields = Self::Field::ALL
            .iter()
            .map(|field| (field.wire_key().to_owned(), self.field_value(*field)))
            .collect();
        Record { id: self.id().clone(), fields }
    }
}
