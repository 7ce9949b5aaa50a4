//! Converts typed update operations into one partial-update payload.

use deckstore_types::{FieldInstruction, Patch, UpdateOperation};

/// Merge `operations` into a single [`Patch`] keyed by field name.
///
/// `AddToArray` becomes an array-union, `RemoveFromArray` an array-removal,
/// `SetValue` a direct assignment. A null value stays in the patch as an
/// explicit assignment: omitting it would mean "leave unchanged". When the
/// same field appears more than once, the last operation wins.
pub fn translate(operations: &[UpdateOperation]) -> Patch {
    let mut patch = Patch::new();
    for operation in operations {
        let (field, instruction) = match operation {
            UpdateOperation::AddToArray(field, values) => {
                (field, FieldInstruction::ArrayUnion(values.clone()))
            }
            UpdateOperation::RemoveFromArray(field, values) => {
                (field, FieldInstruction::ArrayRemove(values.clone()))
            }
            UpdateOperation::SetValue(field, value) => (field, FieldInstruction::Set(value.clone())),
        };
        if patch.contains(field.as_str()) {
            tracing::trace!(field = %field, "update operation replaces earlier one for same field");
        }
        patch.insert(field.clone(), instruction);
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckstore_types::WireValue;
    use serde_json::json;

    #[test]
    fn each_operation_maps_to_its_instruction() {
        let patch = translate(&[
            UpdateOperation::add_to_array("tags", ["new"]),
            UpdateOperation::remove_from_array("cardIds", ["c1", "c2"]),
            UpdateOperation::set("name", "Spanish"),
        ]);
        assert_eq!(patch.len(), 3);
        assert_eq!(patch.get("tags"), Some(&FieldInstruction::ArrayUnion(vec![json!("new")])));
        assert_eq!(
            patch.get("cardIds"),
            Some(&FieldInstruction::ArrayRemove(vec![json!("c1"), json!("c2")]))
        );
        assert_eq!(patch.get("name"), Some(&FieldInstruction::Set(json!("Spanish"))));
    }

    #[test]
    fn cleared_optional_is_present_as_null() {
        let cleared = translate(&[UpdateOperation::set("description", Option::<String>::None)]);
        let untouched = translate(&[UpdateOperation::set("name", "x")]);

        assert_eq!(cleared.get("description"), Some(&FieldInstruction::Set(WireValue::Null)));
        assert!(!untouched.contains("description"));
        let cleared_keys: Vec<_> = cleared.keys().map(|k| k.as_str()).collect();
        let untouched_keys: Vec<_> = untouched.keys().map(|k| k.as_str()).collect();
        assert_ne!(cleared_keys, untouched_keys);
    }

    #[test]
    fn last_writer_wins_per_field() {
        let patch = translate(&[
            UpdateOperation::set("name", "first"),
            UpdateOperation::add_to_array("tags", ["a"]),
            UpdateOperation::set("name", "second"),
        ]);
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.get("name"), Some(&FieldInstruction::Set(json!("second"))));
    }

    #[test]
    fn empty_operation_list_gives_empty_patch() {
        assert!(translate(&[]).is_empty());
    }
}
