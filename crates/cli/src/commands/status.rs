//! `nightjar status`: show configuration and service reachability.

use nightjar_config::AppConfig;
use nightjar_core::network::Reachability;
use nightjar_providers::HttpReachability;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let probe = HttpReachability::new(
        config.provider.base_url.clone(),
        config.provider.reachability_timeout(),
    );
    let reachable = probe.is_reachable().await;

    println!("Nightjar Status");
    println!("===============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Model:        {}", config.provider.model);
    println!("  Endpoint:     {}", config.provider.base_url);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Reachable:    {}", if reachable { "yes" } else { "no" });
    println!("  Budget:       {} tokens", config.budget.max_prompt_tokens);
    println!(
        "  Timeout:      {}s ({} polls)",
        config.polling.timeout_ceiling().as_secs(),
        config.polling.max_attempts
    );
    println!(
        "  Usage log:    {}",
        if config.telemetry.enabled { "enabled" } else { "disabled" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, using defaults");
    }

    Ok(())
}
