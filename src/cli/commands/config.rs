//! Config command - inspect configuration.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::error::SpoleError;

pub fn run_config(action: &ConfigAction, settings: Settings) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)
                .map_err(|e| SpoleError::Config(e.to_string()))?;
            Output::header("Current Configuration");
            println!();
            println!("{}", content);
        }
        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }

    Ok(())
}
