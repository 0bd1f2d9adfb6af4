use std::path::PathBuf;

use anyhow::{Result, bail};
use dialoguer::{Confirm, Input};
use tracing::info;

use crate::config::{AppConfig, CONFIG_FILE_NAME, Manifest, ProjectRoot};

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Skip the prompt and use this name.
    pub name: Option<String>,
    /// Overwrite an existing config without asking.
    pub force: bool,
}

/// Write `<root>/appcycle.json`, returning its path.
pub fn run_init(root: &ProjectRoot, options: InitOptions) -> Result<PathBuf> {
    let path = root.join(CONFIG_FILE_NAME);
    if path.exists() && !options.force {
        if options.name.is_some() {
            bail!("{} already exists; pass --force to overwrite", path.display());
        }
        let overwrite = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            bail!("left existing {} untouched", path.display());
        }
    }

    let app_name = match options.name {
        Some(name) => name,
        None => prompt_app_name(root)?,
    };
    let app_name = app_name.trim().to_string();
    if app_name.is_empty() {
        bail!("application name must not be empty");
    }

    AppConfig::new(app_name.clone()).save(&path)?;
    info!(path = %path.display(), app = %app_name, "wrote project config");
    Ok(path)
}

fn prompt_app_name(root: &ProjectRoot) -> Result<String> {
    let suggestion = Manifest::load(root)
        .ok()
        .and_then(|manifest| manifest.product_name().map(str::to_string));
    let mut input = Input::<String>::new().with_prompt("Application name");
    if let Some(name) = suggestion {
        input = input.default(name);
    }
    Ok(input.interact_text()?)
}
