//! `weave inspect`: dump the metadata of one class.

use termcolor::ColorChoice;
use weave_rtti::{FieldId, MethodId, Repository};

use crate::commands::load_repository;
use crate::output::StyledOutput;
use crate::Sources;

pub fn execute(sources: &Sources, class_name: &str, color: ColorChoice) -> anyhow::Result<()> {
    let mut repo = load_repository(sources)?;
    let mut out = StyledOutput::new(color);
    let lines = describe(&mut repo, class_name)?;

    out.heading(&lines.title);
    for (section, entries) in [("Fields", &lines.fields), ("Methods", &lines.methods)] {
        out.newline();
        out.heading(section);
        if entries.is_empty() {
            out.plain("  (none)");
            out.newline();
        }
        for (name, detail) in entries {
            out.plain("  ");
            out.info(name);
            if !detail.is_empty() {
                out.plain(&format!("  {}", detail));
            }
            out.newline();
        }
    }
    out.flush();
    Ok(())
}

struct ClassListing {
    title: String,
    fields: Vec<(String, String)>,
    methods: Vec<(String, String)>,
}

fn describe(repo: &mut Repository, class_name: &str) -> anyhow::Result<ClassListing> {
    let class = repo.get_class(class_name)?;
    let mut title = repo.class(class).name().to_string();
    if let Some(parent) = repo.class(class).superclass() {
        title.push_str(&format!(" extends {}", repo.class(parent).name()));
    }
    if repo.class(class).is_interface() {
        title.push_str(" (interface)");
    }

    let mut fields = Vec::new();
    for field in repo.get_fields(class)? {
        let detail = field_detail(repo, field)?;
        fields.push((repo.field(field).name().to_string(), detail));
    }

    let mut methods = Vec::new();
    let mut ids = repo.all_methods(class)?;
    ids.extend(repo.get_constructors(class));
    for method in ids {
        methods.push((repo.method(method).full_name().to_string(), method_tags(repo, method)));
    }
    Ok(ClassListing { title, fields, methods })
}

fn field_detail(repo: &mut Repository, field: FieldId) -> anyhow::Result<String> {
    let mut parts = vec![repo.field_type(field).to_string()];
    if let Some(info) = repo.field(field).collection() {
        parts.push(info.kind().to_string());
    } else if repo.is_reference(field) {
        parts.push("reference".to_string());
    }
    if repo.field(field).is_calculated() {
        parts.push("calculated".to_string());
    }
    let mut accessors = vec![("getter", repo.field_getter(field)?), ("setter", repo.field_setter(field)?)];
    if repo.field(field).is_collection() {
        accessors.push(("adder", repo.adder(field)?));
        accessors.push(("remover", repo.remover(field)?));
    }
    for (label, method) in accessors {
        if let Some(method) = method {
            parts.push(format!("{}={}", label, repo.method(method).name()));
        }
    }
    if repo.field(field).is_collection() {
        if let Some(component) = repo.component_type(field)? {
            parts.push(format!("of {}", repo.class(component).name()));
        }
    }
    Ok(parts.join(" "))
}

fn method_tags(repo: &Repository, method: MethodId) -> String {
    let m = repo.method(method);
    let mut tags = Vec::new();
    if m.is_constructor() {
        tags.push("constructor");
    }
    if m.is_mixin() {
        tags.push("mixin");
    }
    if m.is_static() {
        tags.push("static");
    }
    for (flag, tag) in [
        (m.is_getter(), "getter"),
        (m.is_setter(), "setter"),
        (m.is_adder(), "adder"),
        (m.is_remover(), "remover"),
        (m.is_modifier(), "modifier"),
        (m.is_accessor(), "accessor"),
    ] {
        if flag {
            tags.push(tag);
        }
    }
    tags.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn test_describe_bank() {
        let dir = tempfile::tempdir().unwrap();
        let sources = fixtures::write_sources(dir.path());
        let mut repo = load_repository(&sources).unwrap();
        let listing = describe(&mut repo, "Bank").unwrap();
        assert_eq!(listing.title, "Bank");

        let accounts = listing.fields.iter().find(|(name, _)| name == "accounts").unwrap();
        assert!(accounts.1.contains("adder=addAccount"));
        assert!(accounts.1.contains("of Account"));

        let name = listing.fields.iter().find(|(name, _)| name == "name").unwrap();
        assert!(name.1.contains("getter=getName"));
        assert!(name.1.contains("setter=setName"));

        let add = listing.methods.iter().find(|(name, _)| name == "addAccount(Account)").unwrap();
        assert!(add.1.contains("adder"));
    }

    #[test]
    fn test_describe_unknown_class() {
        let dir = tempfile::tempdir().unwrap();
        let sources = fixtures::write_sources(dir.path());
        let mut repo = load_repository(&sources).unwrap();
        assert!(describe(&mut repo, "Vault").is_err());
    }
}
