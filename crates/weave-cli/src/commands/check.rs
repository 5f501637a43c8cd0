//! `weave check`: build every class and report diagnostics.

use serde::Serialize;
use termcolor::ColorChoice;
use weave_rtti::{Diagnostic, Repository};

use crate::commands::load_repository;
use crate::output::StyledOutput;
use crate::Sources;

#[derive(Debug, Serialize)]
struct Summary {
    classes: usize,
    fields: usize,
    methods: usize,
    diagnostics: Vec<Diagnostic>,
}

pub fn execute(sources: &Sources, json: bool, color: ColorChoice) -> anyhow::Result<()> {
    let mut repo = load_repository(sources)?;
    let summary = summarize(&mut repo)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let mut out = StyledOutput::new(color);
    for diagnostic in &summary.diagnostics {
        out.warning("warning");
        out.plain(&format!(": {}: {}", diagnostic.subject, diagnostic.message));
        out.newline();
    }
    let status = format!(
        "{} classes, {} fields, {} methods, {} warnings",
        summary.classes,
        summary.fields,
        summary.methods,
        summary.diagnostics.len()
    );
    if summary.diagnostics.is_empty() {
        out.success(&status);
    } else {
        out.warning(&status);
    }
    out.newline();
    out.flush();
    Ok(())
}

fn summarize(repo: &mut Repository) -> anyhow::Result<Summary> {
    let names: Vec<String> = repo.model().class_names().map(str::to_string).collect();
    for name in &names {
        repo.get_class(name)?;
    }
    repo.build_all()?;

    let classes = repo.get_classes();
    let mut fields = 0;
    let mut methods = 0;
    for class in &classes {
        fields += repo.get_fields(*class)?.len();
        methods += repo.all_methods(*class)?.len();
    }
    Ok(Summary {
        classes: classes.len(),
        fields,
        methods,
        diagnostics: repo.diagnostics().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn test_summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        let sources = fixtures::write_sources(dir.path());
        let mut repo = load_repository(&sources).unwrap();
        let summary = summarize(&mut repo).unwrap();
        assert!(summary.classes >= 2);
        assert!(summary.fields >= 3);
        assert!(summary.methods >= 4);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["diagnostics"].is_array());
    }

    #[test]
    fn test_missing_component_type_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.toml");
        std::fs::write(&model, "[[classes]]\nname = \"Bag\"\nfields = [{ name = \"items\", type = \"List\" }]\n").unwrap();
        let sources = Sources {
            model,
            facts: None,
            config: None,
        };
        let mut repo = load_repository(&sources).unwrap();
        let bag = repo.get_class("Bag").unwrap();
        let items = repo.get_collection(bag, "items").unwrap();
        assert_eq!(repo.component_type(items).unwrap(), None);
        let summary = summarize(&mut repo).unwrap();
        assert!(summary.diagnostics.iter().any(|d| d.subject == "Bag.items"));
    }
}
