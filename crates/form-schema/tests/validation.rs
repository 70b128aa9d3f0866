use serde_json::{Value, json};

use form_schema::{
    ErrorCode, Field, FieldKind, FormPreview, Schema, ValidationRules, Values, apply_computed,
    seed_defaults, validate,
};

fn fixture() -> Schema {
    Schema::from_json(include_str!("fixtures/contact_form.json")).expect("fixture parses")
}

fn ctx(value: Value) -> Values {
    value.as_object().cloned().expect("object context")
}

fn overlay(base: &Values, extra: Value) -> Values {
    let mut values = base.clone();
    values.extend(ctx(extra));
    values
}

#[test]
fn required_text_scenario() {
    let mut name = Field::new("n", "name", "Name", FieldKind::Text);
    name.required = true;
    let schema = Schema::with_fields(vec![name]);

    let report = validate(&schema, &Values::new());
    assert_eq!(report.message("name"), Some("This field is required."));
    assert_eq!(report.error("name").unwrap().code, ErrorCode::Required);
    assert!(report.has_errors());

    let report = validate(&schema, &ctx(json!({"name": "Ava"})));
    assert!(report.checked("name"));
    assert!(report.error("name").is_none());
    assert!(!report.has_errors());

    assert!(validate(&schema, &ctx(json!({"name": "   "}))).has_errors());
}

#[test]
fn range_scenario() {
    let mut age = Field::new("a", "age", "Age", FieldKind::Number);
    age.validation = Some(ValidationRules {
        min: Some(10.0),
        ..ValidationRules::default()
    });
    let schema = Schema::with_fields(vec![age]);

    let report = validate(&schema, &ctx(json!({"age": 5})));
    assert_eq!(report.message("age"), Some("Must be ≥ 10."));
    assert_eq!(report.error("age").unwrap().code, ErrorCode::BelowMinimum);
    assert!(!validate(&schema, &ctx(json!({"age": 12}))).has_errors());
}

#[test]
fn hidden_section_children_are_not_reported() {
    let schema = fixture();
    let values = overlay(&seed_defaults(&schema), json!({"name": "Ava", "terms": true, "topics": ["news"]}));
    let report = validate(&schema, &values);
    assert!(report.error("vat").is_none(), "company section is hidden for basic plan");
    assert!(!report.has_errors(), "{:?}", report.errors().collect::<Vec<_>>());

    let pro = overlay(&values, json!({"plan": "pro"}));
    let report = validate(&schema, &pro);
    assert_eq!(report.error("vat").unwrap().code, ErrorCode::Required);

    let pro = overlay(&pro, json!({"vat": "nl123456789"}));
    assert!(validate(&schema, &pro).error("vat").is_none());
}

#[test]
fn computed_fields_are_never_reported() {
    let schema = fixture();
    let values = overlay(
        &seed_defaults(&schema),
        json!({"name": "Ava", "terms": true, "topics": ["news"], "plan": "pro", "vat": "NL123456789", "total": "garbage"}),
    );
    let report = validate(&schema, &values);
    assert!(report.error("total").is_none());

    let resolved = apply_computed(&schema, &values);
    assert_eq!(resolved["total"], json!(12));
}

#[test]
fn every_type_gets_its_checks() {
    let schema = fixture();
    let values = overlay(
        &seed_defaults(&schema),
        json!({
            "name": "A",
            "age": "old",
            "plan": "gold",
            "topics": ["news", "offers", "events"],
            "start": "2024-13-01",
            "phones": ["+31 20 123 4567", "call me"],
            "terms": false
        }),
    );
    let report = validate(&schema, &values);
    let code = |key: &str| report.error(key).map(|err| err.code);
    assert_eq!(code("name"), Some(ErrorCode::TooShort));
    assert_eq!(code("age"), Some(ErrorCode::InvalidNumber));
    assert_eq!(code("plan"), Some(ErrorCode::UnknownOption));
    assert_eq!(code("topics"), Some(ErrorCode::TooManySelected));
    assert_eq!(report.message("topics"), Some("Select at most 2."));
    assert_eq!(code("start"), Some(ErrorCode::InvalidDate));
    assert_eq!(code("phones[0]"), None);
    assert_eq!(code("phones[1]"), Some(ErrorCode::PatternMismatch));
    assert_eq!(report.error("phones[1]").unwrap().path, "/phones/1");
    assert_eq!(code("terms"), None, "an unticked box is still a value");
}

#[test]
fn section_templates_validate_each_element() {
    let mut email = Field::new("e", "email", "Email", FieldKind::Text);
    email.required = true;
    email.validation = Some(ValidationRules {
        regex: Some("@".into()),
        ..ValidationRules::default()
    });
    let contact = Field::new("c", "contact", "Contact", FieldKind::Section { children: vec![email] });
    let contacts = Field::new("cs", "contacts", "Contacts", FieldKind::Array { of: Box::new(contact) });
    let schema = Schema::with_fields(vec![contacts]);

    let values = ctx(json!({"contacts": [{"email": "a@b.c"}, {"email": ""}, {"email": "nope"}, 7]}));
    let report = validate(&schema, &values);
    assert!(report.error("contacts[0].email").is_none());
    assert_eq!(report.error("contacts[1].email").unwrap().code, ErrorCode::Required);
    assert_eq!(report.error("contacts[2].email").unwrap().path, "/contacts/2/email");
    assert_eq!(report.error("contacts[3]").unwrap().code, ErrorCode::TypeMismatch);
}

#[test]
fn preview_reports_a_submittable_form() {
    let schema = fixture();
    let values = overlay(
        &seed_defaults(&schema),
        json!({"name": "Ava", "terms": true, "topics": ["events"], "start": "2025-01-31"}),
    );
    let preview = FormPreview::build(&schema, &values);
    assert!(preview.is_submittable());
    assert_eq!(preview.values["total"], json!(0));
    assert_eq!(preview.visibility["f-company"], false);
    assert_eq!(preview.visibility["f-vat"], false);
    assert_eq!(preview.visibility["f-name"], true);
}

#[test]
fn template_gate_reads_the_enclosing_values() {
    let mut phone = Field::new("t", "phone", "Phone", FieldKind::Text);
    phone.required = true;
    phone.visible_when = Some("showPhones".into());
    phone.validation = Some(ValidationRules {
        regex: Some("^[0-9 ]+$".into()),
        ..ValidationRules::default()
    });
    let phones = Field::new("p", "phones", "Phones", FieldKind::Array { of: Box::new(phone) });
    let schema = Schema::with_fields(vec![phones]);

    let shown = ctx(json!({"showPhones": true, "phones": ["", "call me", "020 123"]}));
    let preview = FormPreview::build(&schema, &shown);
    assert_eq!(preview.visibility["t"], true);
    assert_eq!(preview.report.error("phones[0]").unwrap().code, ErrorCode::Required);
    assert_eq!(preview.report.error("phones[1]").unwrap().code, ErrorCode::PatternMismatch);
    assert!(preview.report.error("phones[2]").is_none());

    let hidden = ctx(json!({"showPhones": false, "phones": ["", "call me"]}));
    let preview = FormPreview::build(&schema, &hidden);
    assert_eq!(preview.visibility["t"], false);
    assert!(preview.is_submittable());
    assert!(preview.report.checked("phones[1]"));
}

#[test]
fn cleared_optional_inputs_keep_their_rules() {
    let mut tags = Field::new("m", "tags", "Tags", FieldKind::Multiselect { options: Vec::new() });
    tags.validation = Some(ValidationRules {
        min: Some(1.0),
        ..ValidationRules::default()
    });
    let mut nick = Field::new("n", "nick", "Nick", FieldKind::Text);
    nick.validation = Some(ValidationRules {
        min: Some(3.0),
        ..ValidationRules::default()
    });
    let schema = Schema::with_fields(vec![tags, nick]);

    let report = validate(&schema, &ctx(json!({"tags": [], "nick": ""})));
    assert_eq!(report.error("tags").unwrap().code, ErrorCode::TooFewSelected);
    assert_eq!(report.error("nick").unwrap().code, ErrorCode::TooShort);
    assert!(!validate(&schema, &Values::new()).has_errors());
}
