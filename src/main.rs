use anyhow::Result;
use paranoia_scenario::core::config::Config;
use paranoia_scenario::core::io::{NativeStorage, Storage};
use paranoia_scenario::services::generation::GenerationClient;
use paranoia_scenario::services::{llm, setup};
use paranoia_scenario::ui;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!("Please fix or remove 'config.yml' and try again.");
            return Err(e);
        }
    };

    setup::run_setup(&mut config)?;

    let service = llm::create_service(&config)?;
    let client = GenerationClient::from_config(service, &config);
    let storage: Arc<dyn Storage> = Arc::new(NativeStorage::new());

    ui::run(&config, client, storage).await
}
