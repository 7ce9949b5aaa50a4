//! Field-level update operations and the backend's partial-update payload.

use std::collections::BTreeMap;

use crate::document::FieldPath;
use crate::wire::{ToWireValue, WireValue};

/// One typed field update. Values are converted to their wire form when
/// the operation is constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    /// Union `values` into array `field`.
    AddToArray(FieldPath, Vec<WireValue>),
    /// Remove every occurrence of `values` from array `field`.
    RemoveFromArray(FieldPath, Vec<WireValue>),
    /// Assign `value` to `field`. `Null` clears the field explicitly.
    SetValue(FieldPath, WireValue),
}

impl UpdateOperation {
    /// Union values into an array field.
    pub fn add_to_array<V: ToWireValue>(
        field: impl Into<FieldPath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::AddToArray(field.into(), values.into_iter().map(|v| v.to_wire()).collect())
    }

    /// Remove values from an array field.
    pub fn remove_from_array<V: ToWireValue>(
        field: impl Into<FieldPath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::RemoveFromArray(field.into(), values.into_iter().map(|v| v.to_wire()).collect())
    }

    /// Assign a value. `None` optionals encode as an explicit null.
    pub fn set(field: impl Into<FieldPath>, value: impl ToWireValue) -> Self {
        Self::SetValue(field.into(), value.to_wire())
    }

    /// Clear a field by writing an explicit null.
    pub fn clear(field: impl Into<FieldPath>) -> Self {
        Self::SetValue(field.into(), WireValue::Null)
    }

    /// The field this operation writes.
    pub fn field(&self) -> &FieldPath {
        match self {
            Self::AddToArray(f, _) | Self::RemoveFromArray(f, _) | Self::SetValue(f, _) => f,
        }
    }
}

/// Backend-native instruction for one field of a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInstruction {
    /// Direct assignment (including explicit null).
    Set(WireValue),
    /// Array-union.
    ArrayUnion(Vec<WireValue>),
    /// Array-removal.
    ArrayRemove(Vec<WireValue>),
}

/// A single atomic partial update, keyed by field name.
///
/// Fields absent from the patch are left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    fields: BTreeMap<FieldPath, FieldInstruction>,
}

impl Patch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an instruction. A later instruction for the same field replaces
    /// the earlier one.
    pub fn insert(&mut self, field: FieldPath, instruction: FieldInstruction) {
        self.fields.insert(field, instruction);
    }

    /// Instruction for `field`, if present.
    pub fn get(&self, field: &str) -> Option<&FieldInstruction> {
        self.fields.iter().find(|(k, _)| k.as_str() == field).map(|(_, v)| v)
    }

    /// Whether the patch writes `field` at all.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Field names present in the patch, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &FieldPath> {
        self.fields.keys()
    }

    /// Iterate instructions in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldInstruction)> {
        self.fields.iter()
    }

    /// Number of fields written.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing is written.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for Patch {
    type Item = (FieldPath, FieldInstruction);
    type IntoIter = std::collections::btree_map::IntoIter<FieldPath, FieldInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
