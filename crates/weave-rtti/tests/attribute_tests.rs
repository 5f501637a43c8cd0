//! Integration tests for attribute storage, fallback and gating

use std::cell::Cell;
use std::rc::Rc;

use weave_rtti::attributes::{GUI_EDITABLE, GUI_VISIBLE};
use weave_rtti::{AttrValue, FactSink, FactTable, ItemId, NativeClass, NativeModel, Repository};

fn repo() -> Repository {
    let model = NativeModel::from_classes([
        NativeClass::new("Shape")
            .field("color", "String")
            .method("draw", &[], "void")
            .method("getColor", &[], "String"),
        NativeClass::new("Circle")
            .extends("Shape")
            .field("radius", "double")
            .method("draw", &[], "void"),
    ]);
    let mut facts = FactTable::new();
    facts.add_accessed_field("Shape", "getColor()", "color");
    Repository::new(model).with_facts(facts)
}

#[test]
fn test_class_attribute_inherited() {
    let mut repo = repo();
    let shape = repo.get_class("Shape").unwrap();
    let circle = repo.get_class("Circle").unwrap();
    repo.set_attribute(shape, "Persistence.TABLE", "shapes");

    assert_eq!(repo.get_attribute(circle, "Persistence.TABLE"), Some(AttrValue::from("shapes")));
    assert!(repo.attributes(circle).get("Persistence.TABLE").is_none());

    repo.set_attribute(circle, "Persistence.TABLE", "circles");
    assert_eq!(repo.get_attribute(circle, "Persistence.TABLE"), Some(AttrValue::from("circles")));
    assert_eq!(repo.get_attribute(shape, "Persistence.TABLE"), Some(AttrValue::from("shapes")));
}

#[test]
fn test_method_attribute_falls_back_to_overridden_method() {
    let mut repo = repo();
    let shape = repo.get_class("Shape").unwrap();
    let circle = repo.get_class("Circle").unwrap();
    let shape_draw = repo.get_method(shape, "draw").unwrap();
    let circle_draw = repo.get_method(circle, "draw").unwrap();
    assert_ne!(shape_draw, circle_draw);

    repo.set_attribute(shape_draw, "Gui.ICON", "pen");
    assert_eq!(repo.get_attribute(circle_draw, "Gui.ICON"), Some(AttrValue::from("pen")));
}

#[test]
fn test_inherited_field_attribute() {
    let mut repo = repo();
    let shape = repo.get_class("Shape").unwrap();
    let circle = repo.get_class("Circle").unwrap();
    let shape_color = repo.get_field(shape, "color").unwrap();
    let circle_color = repo.get_field(circle, "color").unwrap();

    repo.set_attribute(shape_color, "Gui.LABEL", "Colour");
    assert_eq!(repo.get_attribute(circle_color, "Gui.LABEL"), Some(AttrValue::from("Colour")));
}

#[test]
fn test_owner_gating() {
    let mut repo = repo();
    let shape = repo.get_class("Shape").unwrap();

    repo.set_current_owner(Some("gui"));
    repo.set_attribute(shape, GUI_VISIBLE, true);
    repo.set_current_owner(None);
    assert_eq!(repo.attribute_owner(GUI_VISIBLE), Some("gui"));

    assert_eq!(repo.get_attribute(shape, GUI_VISIBLE), None);
    assert_eq!(repo.get_attribute_always(shape, GUI_VISIBLE), Some(AttrValue::Bool(true)));

    repo.register_owner("gui");
    assert!(repo.get_boolean(shape, GUI_VISIBLE, false));
    repo.unregister_owner("gui");
    assert!(!repo.get_boolean(shape, GUI_VISIBLE, false));
}

#[test]
fn test_access_controller_sees_gated_names_only() {
    let mut repo = repo();
    let shape = repo.get_class("Shape").unwrap();
    repo.set_attribute(shape, GUI_EDITABLE, true);
    repo.set_attribute(shape, "Gui.LABEL", "Shape");

    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    repo.register_access_controller(move |_item: ItemId, _name: &str, _value: Option<AttrValue>| {
        seen.set(seen.get() + 1);
        Some(AttrValue::Bool(false))
    });

    assert_eq!(repo.get_attribute(shape, GUI_EDITABLE), Some(AttrValue::Bool(false)));
    assert_eq!(repo.get_attribute(shape, "Gui.LABEL"), Some(AttrValue::from("Shape")));
    assert_eq!(calls.get(), 1);

    repo.clear_access_controller();
    assert_eq!(repo.get_attribute(shape, GUI_EDITABLE), Some(AttrValue::Bool(true)));
}

#[test]
fn test_empty_attribute_name_ignored() {
    let mut repo = repo();
    let shape = repo.get_class("Shape").unwrap();
    repo.set_attribute(shape, "", true);
    assert!(repo.attributes(shape).is_empty());
}

#[test]
fn test_item_class_redirect() {
    let mut repo = repo();
    let shape = repo.get_class("Shape").unwrap();
    let circle = repo.get_class("Circle").unwrap();
    let radius = repo.get_field(circle, "radius").unwrap();

    repo.set_attribute(shape, "Gui.FORMAT", "compact");
    repo.set_item_class(radius, shape);
    assert_eq!(repo.item_class(radius), Some(ItemId::Class(shape)));
    assert_eq!(repo.get_attribute(radius, "Gui.FORMAT"), Some(AttrValue::from("compact")));

    let removed = repo.unset_attribute(shape, "Gui.FORMAT");
    assert_eq!(removed, Some(AttrValue::from("compact")));
    assert_eq!(repo.get_attribute(radius, "Gui.FORMAT"), None);
}
