//! Configuration command.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::error::{KinoError, Result};

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)
                .map_err(|e| KinoError::Config(e.to_string()))?;
            Output::header("Configuration");
            println!("{}", content);
        }
        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }
    Ok(())
}
