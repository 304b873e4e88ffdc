use std::sync::Arc;

use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::prelude::{Context, EventHandler};
use tracing::info;

use pairbot_core::config::DiscordConfig;
use pairbot_engine::AppState;

/// Serenity event handler wired to the pairing engine.
pub struct PairbotHandler {
    pub app: Arc<AppState>,
    pub config: DiscordConfig,
}

#[async_trait]
impl EventHandler for PairbotHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(name = %ready.user.name, guilds = ready.guilds.len(), "Discord bot connected");

        if !self.config.guild_commands {
            crate::commands::register_commands(&ctx, None).await;
        }
    }

    /// Fires for every guild on connect and whenever the bot joins a new one.
    async fn guild_create(&self, ctx: Context, guild: Guild, _is_new: Option<bool>) {
        if self.config.guild_commands {
            crate::commands::register_commands(&ctx, Some(guild.id)).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            crate::commands::handle_interaction(&self.app, &ctx, &command).await;
        }
    }
}
