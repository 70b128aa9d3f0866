use proptest::prelude::*;
use schemars::schema_for;
use serde_json::{Value, json};

use form_schema::{
    DesignerStore, Field, FieldKind, FieldType, Schema, SelectOption, ValidationRules,
    create_field,
};

fn fixture() -> &'static str {
    include_str!("fixtures/contact_form.json")
}

#[test]
fn fixture_round_trips_through_the_store() {
    let mut store = DesignerStore::default();
    store.import_schema(fixture()).expect("import");
    let exported = store.export_schema().expect("export");

    let mut again = DesignerStore::default();
    again.import_schema(&exported).expect("re-import");
    assert_eq!(again.schema(), store.schema());
    assert_eq!(again.export_schema().unwrap(), exported);
}

#[test]
fn export_shape_is_stable() {
    let mut section = Field::new(
        "s1",
        "contact",
        "Contact",
        FieldKind::Section {
            children: vec![Field::new(
                "c1",
                "channel",
                "Channel",
                FieldKind::Radio {
                    options: vec![SelectOption::new("mail", "Mail")],
                },
            )],
        },
    );
    section.visible_when = Some("optIn".into());
    let mut age = Field::new("n1", "age", "Age", FieldKind::Number);
    age.required = true;
    age.validation = Some(ValidationRules {
        min: Some(18.0),
        max: None,
        regex: None,
    });
    let schema = Schema::with_fields(vec![age, section]);

    insta::assert_json_snapshot!(schema, @r#"
    {
      "version": 1,
      "fields": [
        {
          "id": "n1",
          "key": "age",
          "type": "number",
          "label": "Age",
          "required": true,
          "validation": {
            "min": 18.0
          }
        },
        {
          "id": "s1",
          "key": "contact",
          "type": "section",
          "children": [
            {
              "id": "c1",
              "key": "channel",
              "type": "radio",
              "options": [
                {
                  "value": "mail",
                  "label": "Mail"
                }
              ],
              "label": "Channel"
            }
          ],
          "label": "Contact",
          "visibleWhen": "optIn"
        }
      ]
    }
    "#);
}

#[test]
fn json_schema_describes_the_document() {
    let schema = schema_for!(Schema);
    let value = serde_json::to_value(&schema).expect("schema serializes");
    assert!(value["properties"]["fields"].is_object());
    assert!(value.to_string().contains("visibleWhen"));
}

fn leaf() -> impl Strategy<Value = Field> {
    let types = prop::sample::select(vec![
        FieldType::Text,
        FieldType::Number,
        FieldType::Date,
        FieldType::Checkbox,
        FieldType::Select,
        FieldType::Multiselect,
        FieldType::Radio,
        FieldType::Array,
    ]);
    (
        types,
        "[A-Za-z ]{0,12}",
        any::<bool>(),
        prop::option::of(-1.0e6f64..1.0e6),
        prop::option::of("[a-z]{1,6}"),
        prop::option::of(prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            "[a-z]{0,6}".prop_map(Value::String),
        ]),
    )
        .prop_map(|(field_type, label, required, min, visible, default)| {
            let mut field = create_field(field_type, label);
            field.required = required;
            field.visible_when = visible;
            if let Some(min) = min {
                field.validation = Some(ValidationRules {
                    min: Some(min),
                    ..ValidationRules::default()
                });
                field.default_value = Some(json!(min));
            }
            if default.is_some() {
                field.default_value = default;
            }
            field
        })
}

fn field_tree() -> impl Strategy<Value = Field> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        (prop::collection::vec(inner, 0..4), "[A-Za-z]{1,8}").prop_map(|(children, label)| {
            let mut section = create_field(FieldType::Section, label);
            if let Some(slot) = section.children_mut() {
                *slot = children;
            }
            section
        })
    })
}

proptest! {
    #[test]
    fn export_then_import_is_identity(fields in prop::collection::vec(field_tree(), 0..5)) {
        let schema = Schema::with_fields(fields);
        prop_assume!(schema.check().is_ok());
        let mut store = DesignerStore::default();
        store.replace_schema(schema.clone()).unwrap();
        let text = store.export_schema().unwrap();
        let parsed = Schema::from_json(&text).unwrap();
        prop_assert_eq!(&parsed, &schema);
        let as_value: Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(as_value["version"].as_u64(), Some(1));
    }
}
