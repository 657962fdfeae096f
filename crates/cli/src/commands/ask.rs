//! `nightjar ask`: single-message or interactive mode.

use nightjar_agent::{
    ContextBudgetBuilder, HybridOrchestrator, KeywordRecommender, Reply, ReplySource,
};
use nightjar_config::AppConfig;
use nightjar_core::message::ConversationTurn;
use nightjar_core::network::{Reachability, StaticReachability};
use nightjar_memory::InMemoryConversationStore;
use nightjar_providers::{HttpReachability, PredictionJobClient, RetryPolicy};
use nightjar_telemetry::UsageTracker;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    message: Option<String>,
    context: String,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !offline && !config.has_api_key() {
        eprintln!("  No API key configured, answering with local recommendations only.");
        eprintln!(
            "  Set NIGHTJAR_API_KEY or add api_key to {}",
            AppConfig::config_dir().join("config.toml").display()
        );
    }
    let offline = offline || !config.has_api_key();

    let store = Arc::new(InMemoryConversationStore::new(
        config.budget.max_turns_in_memory,
        config.budget.retention_days,
    ));
    let usage = Arc::new(UsageTracker::new(config.telemetry.usage_retention_days));

    let client = Arc::new(PredictionJobClient::new(
        &config.provider,
        config.api_key.clone().unwrap_or_default(),
        config.polling.clone(),
    ));
    let reachability: Arc<dyn Reachability> = if offline {
        Arc::new(StaticReachability(false))
    } else {
        Arc::new(HttpReachability::new(
            config.provider.base_url.clone(),
            config.provider.reachability_timeout(),
        ))
    };

    let builder = ContextBudgetBuilder::new(store.clone(), config.budget.clone());
    let mut orchestrator = HybridOrchestrator::new(
        client,
        builder,
        reachability,
        Arc::new(KeywordRecommender::new()),
    )
    .with_params(config.model.to_params())
    .with_policy(RetryPolicy::from_config(&config.polling));
    if config.telemetry.enabled {
        orchestrator = orchestrator.with_usage(usage.clone());
    }

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = orchestrator.respond_detailed(&msg, &context).await;
        eprint!("\r              \r");
        print_reply(&reply);
    } else {
        println!();
        println!("  Nightjar, interactive mode");
        println!("  Model:     {}", config.provider.model);
        println!("  Budget:    {} tokens", config.budget.max_prompt_tokens);
        println!("  Remote:    {}", if offline { "off" } else { "on" });
        println!();
        println!("  Describe how you feel and press Enter.");
        println!("  Type 'exit' or Ctrl+D to quit.");
        println!();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("  You > ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "exit" || line == "quit" {
                break;
            }

            let reply = orchestrator.respond_detailed(line, &context).await;
            print_reply(&reply);

            store.push(ConversationTurn::user(line)).await;
            store.push(ConversationTurn::assistant(reply.text.clone())).await;
        }
    }

    if config.telemetry.enabled {
        let today = usage.today();
        eprintln!(
            "  Usage today: {} tokens in {} requests",
            today.total_tokens(),
            today.requests
        );
    }

    Ok(())
}

fn print_reply(reply: &Reply) {
    match reply.source {
        ReplySource::Remote => println!("  Nightjar > {}", reply.text),
        ReplySource::Local { reason } => {
            println!("  Nightjar > {}", reply.text);
            println!("             (local suggestion: {reason:?})");
        }
    }
}
