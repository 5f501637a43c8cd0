//! `weave classes`: list the classes of a model.

use std::path::Path;

use anyhow::Context;
use termcolor::ColorChoice;
use weave_rtti::NativeModel;

use crate::output::StyledOutput;

pub fn execute(model_path: &Path, color: ColorChoice) -> anyhow::Result<()> {
    let model = NativeModel::from_file(model_path)
        .with_context(|| format!("failed to load model {}", model_path.display()))?;
    let mut out = StyledOutput::new(color);
    for (name, detail) in class_lines(&model) {
        out.info(&name);
        if !detail.is_empty() {
            out.plain(&format!("  {}", detail));
        }
        out.newline();
    }
    out.flush();
    Ok(())
}

fn class_lines(model: &NativeModel) -> Vec<(String, String)> {
    let mut names: Vec<&str> = model.class_names().collect();
    names.sort_unstable();
    names
        .into_iter()
        .filter_map(|name| model.get(name))
        .map(|class| {
            let detail = if class.interface {
                "interface".to_string()
            } else {
                match class.superclass_name() {
                    Some(parent) => format!("extends {}", parent),
                    None => String::new(),
                }
            };
            (class.name.clone(), detail)
        })
        .collect()
}
