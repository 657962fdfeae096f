//! `nightjar config`: configuration management commands.

use nightjar_config::AppConfig;

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   Config parsed successfully");

    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (set NIGHTJAR_API_KEY or REPLICATE_API_TOKEN)");
    }
    if config.polling.timeout_ceiling().as_secs() > 120 {
        warnings.push("Polling may wait more than two minutes per request");
    }
    if config.budget.max_prompt_tokens < 500 {
        warnings.push("Token budget below 500 leaves little room for history");
    }

    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Endpoint:  {}", config.provider.predictions_url());
    println!("   Budget:    {} tokens", config.budget.max_prompt_tokens);
    println!(
        "   Polling:   {} attempts every {} ms",
        config.polling.max_attempts, config.polling.poll_delay_ms
    );
    println!("   Artifacts: {} cached", config.artifacts.capacity);

    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
}
