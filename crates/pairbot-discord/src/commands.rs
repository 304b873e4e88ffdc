//! Discord slash commands, generated from the engine's command registry.
//!
//! Registration happens from the event handler. Every invocation is deferred
//! ephemerally, run through [`pairbot_engine::dispatch`], and answered by
//! editing the deferred response.

use std::sync::Arc;

use chrono::Utc;
use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::model::application::{
    Command, CommandDataOptionValue, CommandInteraction, CommandOptionType,
};
use serenity::model::id::GuildId;
use serenity::model::Permissions;
use serenity::prelude::Context;
use tracing::{info, warn};

use pairbot_core::{ChannelId, Timeblock, UserId};
use pairbot_engine::commands::{CommandSpec, OptionKind, OptionSpec};
use pairbot_engine::{dispatch, AppState, CommandArgs, CommandContext, COMMANDS};

use crate::send::fit_message;

fn build_option(spec: &OptionSpec) -> CreateCommandOption {
    let kind = match spec.kind {
        OptionKind::Timeblock | OptionKind::HumanDate => CommandOptionType::String,
        OptionKind::User => CommandOptionType::User,
    };
    let mut option =
        CreateCommandOption::new(kind, spec.name, spec.description).required(spec.required);
    if spec.kind == OptionKind::Timeblock {
        for block in Timeblock::ALL {
            option = option.add_string_choice(block.name(), block.name());
        }
    }
    option
}

fn build_command(spec: &CommandSpec) -> CreateCommand {
    let mut command = CreateCommand::new(spec.name)
        .description(spec.description)
        .dm_permission(false);
    if spec.admin_only {
        command = command.default_member_permissions(Permissions::ADMINISTRATOR);
    }
    for option in spec.options {
        command = command.add_option(build_option(option));
    }
    command
}

/// Register the command set for one guild, or globally when `guild_id` is `None`.
pub async fn register_commands(ctx: &Context, guild_id: Option<GuildId>) {
    let commands: Vec<CreateCommand> = COMMANDS.iter().map(build_command).collect();

    match guild_id {
        Some(gid) => match gid.set_commands(&ctx.http, commands).await {
            Ok(cmds) => info!(guild = %gid, count = cmds.len(), "registered guild slash commands"),
            Err(e) => warn!(guild = %gid, error = %e, "failed to register guild commands"),
        },
        None => match Command::set_global_commands(&ctx.http, commands).await {
            Ok(cmds) => info!(count = cmds.len(), "registered global slash commands"),
            Err(e) => warn!(error = %e, "failed to register global slash commands"),
        },
    }
}

/// Pull the typed options out of an interaction.
fn parse_args(command: &CommandInteraction) -> Result<CommandArgs, String> {
    let mut args = CommandArgs::default();
    for option in &command.data.options {
        match (option.name.as_str(), &option.value) {
            ("timeblock", CommandDataOptionValue::String(s)) => {
                args.timeblock = Some(s.parse::<Timeblock>()?);
            }
            ("human_date", CommandDataOptionValue::String(s)) => {
                args.human_date = Some(s.clone());
            }
            ("user", CommandDataOptionValue::User(id)) => {
                args.user = Some(UserId(id.get()));
            }
            (name, _) => return Err(format!("Unexpected option `{name}`.")),
        }
    }
    Ok(args)
}

/// Handle one slash-command interaction end to end.
pub async fn handle_interaction(app: &Arc<AppState>, ctx: &Context, command: &CommandInteraction) {
    let Some(guild_id) = command.guild_id else {
        respond_ephemeral(ctx, command, "Pairbot commands only work inside a server.").await;
        return;
    };

    let args = match parse_args(command) {
        Ok(args) => args,
        Err(msg) => {
            respond_ephemeral(ctx, command, &msg).await;
            return;
        }
    };

    let member = command.member.as_deref();
    let cmd_ctx = CommandContext {
        guild_id: pairbot_core::GuildId(guild_id.get()),
        channel_id: ChannelId(command.channel_id.get()),
        user_id: UserId(command.user.id.get()),
        user_name: member
            .map(|m| m.display_name().to_string())
            .unwrap_or_else(|| command.user.name.clone()),
        is_admin: member
            .and_then(|m| m.permissions)
            .is_some_and(|p| p.administrator()),
        today: Utc::now().date_naive(),
    };

    // Defer first: /rematch can outlast the interaction deadline.
    if let Err(e) = command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(true)),
        )
        .await
    {
        warn!(command = %command.data.name, error = %e, "could not defer interaction");
        return;
    }

    let reply = dispatch(app, &cmd_ctx, &command.data.name, &args).await;

    let content = fit_message(&reply);
    if let Err(e) = command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await
    {
        warn!(command = %command.data.name, error = %e, "could not send command reply");
    }
}

/// Send an ephemeral response to a slash command (only visible to the invoker).
async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) {
    let _ = command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await;
}
