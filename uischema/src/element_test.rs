use super::*;
use serde_json::json;

fn sample() -> UiSchema {
    crate::validate(&json!([
        {"type": "div", "header": "Contact", "children": [
            {"type": "input", "name": "firstName", "placeholder": "Jane"},
            {"type": "input", "name": "email"},
            {"type": "div", "children": [{"type": "input", "name": "email"}]}
        ]},
        {"type": "button", "label": "Send"}
    ]))
    .unwrap()
}

#[test]
fn element_kind_tags_round_trip() {
    for kind in ElementKind::ALL {
        assert_eq!(ElementKind::from_tag(kind.as_str()), Some(kind));
    }
    assert_eq!(ElementKind::from_tag("DIV"), None);
    assert_eq!(ElementKind::from_tag("span"), None);
}

#[test]
fn serialize_omits_absent_optionals() {
    let schema = crate::validate(&json!([{"type": "div"}, {"type": "input", "name": "a"}])).unwrap();
    let value = serde_json::to_value(&schema).unwrap();
    assert_eq!(value, json!([{"type": "div"}, {"type": "input", "name": "a"}]));
}

#[test]
fn serialize_keeps_empty_children() {
    let raw = json!([{"type": "div", "children": []}]);
    let schema = crate::validate(&raw).unwrap();
    assert_eq!(serde_json::to_value(&schema).unwrap(), raw);
}

#[test]
fn deserialize_runs_validator() {
    let err = serde_json::from_str::<UiSchema>(r#"[{"type":"input","name":""}]"#).unwrap_err();
    assert!(err.to_string().contains("0.name: Input name is required"));

    let ok: UiSchema = serde_json::from_str(r#"[{"type":"button","label":"Go"}]"#).unwrap();
    assert_eq!(ok.elements(), &[Element::Button { label: "Go".into() }]);
}

#[test]
fn node_count_includes_nested() {
    assert_eq!(sample().node_count(), 6);
    assert_eq!(sample().len(), 2);
    assert!(!sample().is_empty());
}

#[test]
fn input_names_in_document_order() {
    assert_eq!(sample().input_names(), vec!["firstName", "email", "email"]);
}

#[test]
fn duplicate_input_names_reports_collisions() {
    let form = sample();
    let dups = form.duplicate_input_names();
    assert_eq!(dups.into_iter().collect::<Vec<_>>(), vec!["email"]);
}

#[test]
fn children_empty_for_leaves() {
    let button = Element::Button { label: "x".into() };
    assert!(button.children().is_empty());
    assert_eq!(button.kind(), ElementKind::Button);
}

#[test]
fn named_ui_uses_camel_case_timestamp() {
    let ui = NamedUi {
        name: "contact".into(),
        schema: sample(),
        created_at: Some(time::macros::datetime!(2024-05-01 12:30:00 UTC)),
    };
    let value = serde_json::to_value(&ui).unwrap();
    assert_eq!(value["createdAt"], json!("2024-05-01T12:30:00Z"));
    assert_eq!(value["name"], json!("contact"));

    let restored: NamedUi = serde_json::from_value(value).unwrap();
    assert_eq!(restored, ui);
}

#[test]
fn named_ui_without_timestamp() {
    let restored: NamedUi =
        serde_json::from_value(json!({"name": "x", "schema": [{"type": "button", "label": "b"}]})).unwrap();
    assert!(restored.created_at.is_none());
    let value = serde_json::to_value(&restored).unwrap();
    assert!(value.get("createdAt").is_none());
}
