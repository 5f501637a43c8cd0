//! Integration tests for descriptor construction
//!
//! Checks the structural properties every built repository satisfies,
//! over a small banking model.

use weave_rtti::{FactSink, FactTable, NativeClass, NativeModel, Repository, RttiError};

fn bank_model() -> NativeModel {
    NativeModel::from_classes([
        NativeClass::new("Account")
            .field("number", "int")
            .field("balance", "double")
            .field("owner", "Customer")
            .field("bank", "Bank")
            .method("getBalance", &[], "double")
            .method("setBalance", &["double"], "void")
            .method("getNumber", &[], "int")
            .method("getOwner", &[], "Customer")
            .method("setOwner", &["Customer"], "void")
            .method("foo", &[], "void")
            .method("foo", &["int"], "void")
            .constructor(&[])
            .constructor(&["int"]),
        NativeClass::new("Customer")
            .field("name", "String")
            .method("getName", &[], "String")
            .method("setName", &["String"], "void"),
        NativeClass::new("Bank")
            .field("name", "String")
            .field("accounts", "Map")
            .field("customers", "Customer[]")
            .method("addAccount", &["Account"], "void")
            .method("removeAccount", &["Account"], "void")
            .method("getName", &[], "String"),
    ])
}

fn bank_facts() -> FactTable {
    let mut facts = FactTable::new();
    facts.add_accessed_field("Account", "getBalance()", "balance");
    facts.add_set_field("Account", "setBalance(double)", "balance");
    facts.add_accessed_field("Account", "getNumber()", "number");
    facts.add_returned_field("Account", "getOwner()", "owner");
    facts.set_is_getter("Account", "getOwner()", true);
    facts.add_set_field("Account", "setOwner(Customer)", "owner");
    facts.add_returned_field("Customer", "getName()", "name");
    facts.add_set_field("Customer", "setName(String)", "name");
    facts.add_added_collection("Bank", "addAccount(Account)", "accounts");
    facts.add_removed_collection("Bank", "removeAccount(Account)", "accounts");
    facts.add_accessed_field("Bank", "getName()", "name");
    facts
}

fn bank() -> Repository {
    Repository::new(bank_model()).with_facts(bank_facts())
}

#[test]
fn test_bank_accounts_adder_and_component_type() {
    let mut repo = bank();
    let bank = repo.get_class("Bank").unwrap();
    let accounts = repo.get_collection(bank, "accounts").unwrap();

    let adder = repo.adder(accounts).unwrap().unwrap();
    assert_eq!(repo.method(adder).name(), "addAccount");
    let remover = repo.remover(accounts).unwrap().unwrap();
    assert_eq!(repo.method(remover).name(), "removeAccount");

    let component = repo.component_type(accounts).unwrap().unwrap();
    assert_eq!(repo.class(component).name(), "Account");
    assert!(repo.field(accounts).collection().unwrap().is_map());
}

#[test]
fn test_getter_bound_by_naming_convention() {
    let mut repo = bank();
    let account = repo.get_class("Account").unwrap();
    let balance = repo.get_field(account, "balance").unwrap();
    let getter = repo.field_getter(balance).unwrap().unwrap();
    assert_eq!(repo.method(getter).name(), "getBalance");
}

#[test]
fn test_overload_ambiguity() {
    let mut repo = bank();
    let account = repo.get_class("Account").unwrap();

    let err = repo.get_method(account, "foo").unwrap_err();
    match err {
        RttiError::AmbiguousMethodName { method, candidates, .. } => {
            assert_eq!(method, "foo");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(repo.has_method(account, "foo"));

    let foo_int = repo.get_method(account, "foo(int)").unwrap();
    assert_eq!(repo.method(foo_int).params().len(), 1);
    assert_eq!(repo.method(foo_int).params()[0].name(), "int");
    assert_eq!(repo.get_methods(account, "foo").unwrap().len(), 2);
}

#[test]
fn test_field_name_round_trip() {
    let mut repo = bank();
    for name in ["Account", "Customer", "Bank"] {
        let class = repo.get_class(name).unwrap();
        for field in repo.get_fields(class).unwrap() {
            let field_name = repo.field(field).name().to_string();
            assert_eq!(repo.get_field(class, &field_name).unwrap(), field);
        }
    }
}

#[test]
fn test_setters_are_consistent() {
    let mut repo = bank();
    repo.build_all().unwrap();
    let mut checked = 0;
    for class in repo.get_classes() {
        for setter in repo.all_setters(class).unwrap() {
            let field = repo.method(setter).set_field().unwrap();
            assert_eq!(repo.field_setter(field).unwrap(), Some(setter));
            checked += 1;
        }
    }
    assert!(checked >= 3);
}

#[test]
fn test_single_parameter_adder_fixes_component_type() {
    let mut repo = bank();
    repo.build_all().unwrap();
    for class in repo.get_classes() {
        for collection in repo.collections(class).unwrap() {
            let Some(adder) = repo.adder(collection).unwrap() else {
                continue;
            };
            if repo.method(adder).parameter_count() != 1 {
                continue;
            }
            let expected = repo.parameter_type_item(adder, 0).unwrap();
            assert_eq!(repo.component_type(collection).unwrap(), Some(expected));
        }
    }
}

#[test]
fn test_build_is_idempotent() {
    let mut repo = bank();
    let account = repo.get_class("Account").unwrap();
    repo.build_field_info(account).unwrap();
    let counts = repo.member_counts(account).unwrap();
    let balance = repo.get_field(account, "balance").unwrap();
    let accessing = repo.field(balance).accessing_methods().to_vec();
    let writing = repo.field(balance).writing_methods().to_vec();

    repo.build_field_info(account).unwrap();
    assert_eq!(repo.member_counts(account).unwrap(), counts);
    assert_eq!(repo.field(balance).accessing_methods(), accessing.as_slice());
    assert_eq!(repo.field(balance).writing_methods(), writing.as_slice());
}

#[test]
fn test_calls_super_propagates_to_subclass_collection() {
    let model = NativeModel::from_classes([
        NativeClass::new("Item"),
        NativeClass::new("A")
            .field("items", "List")
            .method("addItem", &["Item"], "void"),
        NativeClass::new("B")
            .extends("A")
            .method("addItem", &["Item"], "void"),
    ]);
    let mut facts = FactTable::new();
    facts.add_added_collection("A", "addItem(Item)", "items");
    facts.set_call_super("B", "addItem(Item)");
    let mut repo = Repository::new(model).with_facts(facts);

    let a = repo.get_class("A").unwrap();
    let b = repo.get_class("B").unwrap();
    let b_add = repo.get_method(b, "addItem").unwrap();
    assert!(repo.method(b_add).is_adder());

    let added = repo.method(b_add).added_collection().unwrap();
    assert_eq!(repo.field(added).class(), b);
    assert_ne!(added, repo.get_field(a, "items").unwrap());
}

#[test]
fn test_array_collection_and_references() {
    let mut repo = bank();
    let bank = repo.get_class("Bank").unwrap();
    let customers = repo.get_collection(bank, "customers").unwrap();
    assert!(repo.field(customers).collection().unwrap().is_array());
    let component = repo.component_type(customers).unwrap().unwrap();
    assert_eq!(repo.class(component).name(), "Customer");

    let account = repo.get_class("Account").unwrap();
    let references = repo.references(account).unwrap();
    let names: Vec<&str> = references.iter().map(|f| repo.field(*f).name()).collect();
    assert!(names.contains(&"owner"));
    assert!(names.contains(&"bank"));
    assert!(!names.contains(&"balance"));
}

#[test]
fn test_expression_field_setter_follows_path() {
    let mut repo = bank();
    let account = repo.get_class("Account").unwrap();
    let owner_name = repo.get_field(account, "owner.name").unwrap();
    assert!(repo.field(owner_name).is_expression());
    assert_eq!(repo.field_type(owner_name).name(), "String");

    let setter = repo.field_setter(owner_name).unwrap().unwrap();
    assert_eq!(repo.method(setter).name(), "setName");

    let owner = repo.get_field(account, "owner").unwrap();
    assert!(repo.starts_with(owner_name, owner));
}

#[test]
fn test_conflicting_accessor_facts_keep_both_sides_consistent() {
    let model = NativeModel::from_classes([NativeClass::new("Gauge")
        .field("level", "int")
        .method("getLevel", &[], "int")
        .method("readLevel", &[], "int")
        .method("setLevel", &["int"], "void")
        .method("resetLevel", &["int"], "void")]);
    let mut facts = FactTable::new();
    for getter in ["getLevel()", "readLevel()"] {
        facts.add_returned_field("Gauge", getter, "level");
        facts.set_is_getter("Gauge", getter, true);
    }
    for setter in ["setLevel(int)", "resetLevel(int)"] {
        facts.add_set_field("Gauge", setter, "level");
    }
    let mut repo = Repository::new(model).with_facts(facts);
    repo.build_all().unwrap();

    let gauge = repo.get_class("Gauge").unwrap();
    let setters = repo.all_setters(gauge).unwrap();
    assert_eq!(setters.len(), 1);
    for setter in setters {
        let field = repo.method(setter).set_field().unwrap();
        assert_eq!(repo.field_setter(field).unwrap(), Some(setter));
    }
    let getters = repo.all_getters(gauge).unwrap();
    assert_eq!(getters.len(), 1);
    for getter in getters {
        let field = repo.method(getter).returned_field().unwrap();
        assert_eq!(repo.field_getter(field).unwrap(), Some(getter));
    }
    assert!(repo
        .diagnostics()
        .iter()
        .any(|d| d.subject == "Gauge.level" && d.message.starts_with("overriding setter")));
}
