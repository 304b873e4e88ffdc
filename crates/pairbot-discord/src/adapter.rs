use std::sync::Arc;
use std::time::Duration;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tracing::{error, info, warn};

use pairbot_core::config::DiscordConfig;
use pairbot_engine::AppState;

use crate::error::DiscordError;
use crate::handler::PairbotHandler;

/// Discord gateway adapter.
///
/// Wraps a serenity `Client` and drives the event loop until the process
/// exits, reconnecting whenever the gateway drops.
pub struct DiscordAdapter {
    app: Arc<AppState>,
    config: DiscordConfig,
}

impl DiscordAdapter {
    pub fn new(config: &DiscordConfig, app: Arc<AppState>) -> Result<Self, DiscordError> {
        if config.bot_token.trim().is_empty() {
            return Err(DiscordError::NoToken);
        }
        Ok(Self {
            app,
            config: config.clone(),
        })
    }

    /// Connect to Discord and keep reconnecting whenever the gateway drops.
    ///
    /// Never returns; runs for the lifetime of the process.
    pub async fn run(self) {
        // Slash commands arrive as interactions, which need no privileged intents.
        let intents = GatewayIntents::GUILDS;

        loop {
            let mut client = loop {
                match self.build_client(intents).await {
                    Ok(c) => break c,
                    Err(e) => {
                        error!("Discord: connect failed ({e}), retrying in 30s");
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            };

            info!("Discord: gateway connecting");
            if let Err(e) = client.start().await {
                warn!("Discord: gateway error ({e}), reconnecting in 5s");
            } else {
                info!("Discord: gateway stopped cleanly, reconnecting in 5s");
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    async fn build_client(&self, intents: GatewayIntents) -> Result<Client, DiscordError> {
        let handler = PairbotHandler {
            app: Arc::clone(&self.app),
            config: self.config.clone(),
        };

        Ok(Client::builder(&self.config.bot_token, intents)
            .event_handler(handler)
            .await?)
    }
}
