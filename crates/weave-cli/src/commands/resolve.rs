//! `weave resolve`: resolve a member of a class.

use weave_rtti::{MemberId, Repository};

use crate::commands::load_repository;
use crate::Sources;

pub fn execute(sources: &Sources, class_name: &str, member: &str) -> anyhow::Result<()> {
    let mut repo = load_repository(sources)?;
    println!("{}", resolve(&mut repo, class_name, member)?);
    Ok(())
}

fn resolve(repo: &mut Repository, class_name: &str, member: &str) -> anyhow::Result<String> {
    let class = repo.get_class(class_name)?;
    let line = match repo.get_member(class, member)? {
        MemberId::Field(field) => {
            let descriptor = repo.field(field);
            let kind = if descriptor.is_expression() {
                "expression field"
            } else if descriptor.is_calculated() {
                "calculated field"
            } else if descriptor.is_collection() {
                "collection"
            } else {
                "field"
            };
            format!("{} {}: {}", kind, repo.field_long_name(field), repo.field_type(field))
        }
        MemberId::Method(method) => {
            let kind = if repo.method(method).is_constructor() { "constructor" } else { "method" };
            format!("{} {} -> {}", kind, repo.method_long_name(method), repo.method(method).return_type())
        }
    };
    Ok(line)
}
