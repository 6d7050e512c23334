use crate::core::config::{Config, API_KEY_ENV_VARS};
use crate::core::i18n::{Labels, Locale};
use anyhow::{anyhow, Result};
use inquire::{Confirm, Password, PasswordDisplayMode, Select};

/// Fills in what the config cannot do without: an API key and a valid
/// display language. Offers to persist the answers to `config.yml`.
pub fn run_setup(config: &mut Config) -> Result<()> {
    let mut needs_save = false;
    let labels = setup_labels(config);

    if !config.has_api_key() {
        println!("{} {}", labels.api_key_missing, API_KEY_ENV_VARS.join(" / "));
        let key = Password::new(labels.api_key_prompt)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;
        let key = normalize_key(&key).ok_or_else(|| anyhow!(labels.api_key_required))?;
        config.api_key = Some(key);
        needs_save = true;
    }

    if config.locale().is_err() {
        log::warn!("Unsupported language '{}' in config", config.language);
        let locale = Select::new(labels.interface_language, Locale::ALL.to_vec()).prompt()?;
        config.language = locale.code().to_string();
        needs_save = true;
    }

    if needs_save
        && Confirm::new(setup_labels(config).save_settings)
            .with_default(true)
            .prompt()?
    {
        config.save()?;
        println!("{}", setup_labels(config).settings_saved);
    }

    config.ensure_directories()?;
    Ok(())
}

/// Prompts follow the configured language, English when it is unknown.
fn setup_labels(config: &Config) -> &'static Labels {
    config.locale().unwrap_or_default().labels()
}

fn normalize_key(input: &str) -> Option<String> {
    let key = input.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
