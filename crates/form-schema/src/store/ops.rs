use serde::{Deserialize, Serialize};

use super::patch::FieldPatch;
use crate::spec::{Field, FieldType, Schema};

/// One Document Store operation in wire form, e.g.
/// `{"op": "move_child", "parentId": "…", "from": 0, "to": 2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Operation {
    Select {
        #[serde(default)]
        id: Option<String>,
    },
    /// Builds a field with the factory and adds it to the root, or to
    /// `parent` when given.
    Create {
        #[serde(rename = "type")]
        field_type: FieldType,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        parent: Option<String>,
    },
    AddField {
        field: Field,
    },
    AddChild {
        section_id: String,
        field: Field,
    },
    UpdateField {
        id: String,
        patch: FieldPatch,
    },
    RemoveField {
        id: String,
    },
    MoveField {
        from: usize,
        to: usize,
    },
    MoveChild {
        parent_id: String,
        from: usize,
        to: usize,
    },
    Copy {
        id: String,
    },
    Paste {
        #[serde(default)]
        target: Option<String>,
    },
    Undo,
    Redo,
    Import {
        schema: Schema,
    },
}

impl Operation {
    /// Reads either a single operation or a list of them.
    pub fn parse_batch(text: &str) -> Result<Vec<Operation>, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Batch {
            Many(Vec<Operation>),
            One(Operation),
        }
        Ok(match serde_json::from_str(text)? {
            Batch::Many(ops) => ops,
            Batch::One(op) => vec![op],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_uses_op_tag_and_camel_case() {
        let op: Operation =
            serde_json::from_str(r#"{"op": "move_child", "parentId": "s1", "from": 0, "to": 2}"#)
                .unwrap();
        assert_eq!(
            op,
            Operation::MoveChild {
                parent_id: "s1".into(),
                from: 0,
                to: 2
            }
        );
        let create: Operation = serde_json::from_str(r#"{"op": "create", "type": "radio"}"#).unwrap();
        assert!(matches!(
            create,
            Operation::Create {
                field_type: FieldType::Radio,
                label: None,
                parent: None
            }
        ));
    }

    #[test]
    fn batches_accept_one_or_many() {
        assert_eq!(Operation::parse_batch(r#"{"op": "undo"}"#).unwrap(), vec![Operation::Undo]);
        assert_eq!(
            Operation::parse_batch(r#"[{"op": "undo"}, {"op": "redo"}]"#).unwrap(),
            vec![Operation::Undo, Operation::Redo]
        );
    }
}
