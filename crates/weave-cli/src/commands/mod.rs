//! Subcommand implementations

pub mod check;
pub mod classes;
pub mod inspect;
pub mod resolve;

use anyhow::Context;
use tracing::info;
use weave_rtti::{FactTable, NativeModel, Repository, RttiConfig};

use crate::Sources;

/// Build a repository from the input files and replay the configured
/// declarations
pub fn load_repository(sources: &Sources) -> anyhow::Result<Repository> {
    let model = NativeModel::from_file(&sources.model)
        .with_context(|| format!("failed to load model {}", sources.model.display()))?;
    let facts = match &sources.facts {
        Some(path) => FactTable::from_file(path)
            .with_context(|| format!("failed to load facts {}", path.display()))?,
        None => FactTable::new(),
    };
    let config = match &sources.config {
        Some(path) => RttiConfig::from_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => RttiConfig::default(),
    };
    info!(classes = model.len(), "model loaded");

    let mut repo = Repository::new(model).with_facts(facts).with_config(&config);
    repo.apply_declarations(&config.declare)
        .context("failed to apply declarations")?;
    Ok(repo)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_repository() {
        let dir = tempfile::tempdir().unwrap();
        let sources = fixtures::write_sources(dir.path());
        let mut repo = load_repository(&sources).unwrap();
        let bank = repo.get_class("Bank").unwrap();
        let accounts = repo.get_collection(bank, "accounts").unwrap();
        let adder = repo.adder(accounts).unwrap().unwrap();
        assert_eq!(repo.method(adder).name(), "addAccount");
    }

    #[test]
    fn test_missing_model_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let sources = Sources {
            model: dir.path().join("absent.toml"),
            facts: None,
            config: None,
        };
        let err = load_repository(&sources).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
