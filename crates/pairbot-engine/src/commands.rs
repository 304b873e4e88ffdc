//! Slash-command registry and the middleware every command runs through.
//!
//! [`COMMANDS`] is the single source of truth: the platform adapter builds its
//! command definitions from it and routes invocations back through
//! [`dispatch`], which checks permissions, logs, and turns errors into the
//! one ephemeral reply each command produces.

use chrono::NaiveDate;
use futures_util::future::BoxFuture;
use pairbot_core::{
    ChannelId, GuildId, PairbotError, Result, Timeblock, TimeblockSelection, UserId,
};
use pairbot_store::PairingKind;
use tracing::{error, info};

use crate::app::AppState;
use crate::exceptions::{format_date, Unskipped};
use crate::matching::{next_date_for, MatchingResult};
use crate::messenger::Member;

/// Reply for errors the user cannot act on. Details go to the log.
pub const GENERIC_APOLOGY: &str = "Pairbot broke somehow! :v";

/// Who invoked a command, where, and when.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub user_name: String,
    /// Whether the invoker holds the guild's administrator permission.
    pub is_admin: bool,
    /// The current UTC date.
    pub today: NaiveDate,
}

/// Parsed command options. Unused options stay `None`.
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    pub timeblock: Option<Timeblock>,
    pub human_date: Option<String>,
    pub user: Option<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// One of the eight timeblock names, offered as fixed choices.
    Timeblock,
    /// Free text handed to the date parser.
    HumanDate,
    /// A guild member.
    User,
}

#[derive(Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
}

pub type Handler =
    for<'a> fn(&'a AppState, &'a CommandContext, &'a CommandArgs) -> BoxFuture<'a, Result<String>>;

pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub admin_only: bool,
    pub options: &'static [OptionSpec],
    pub handler: Handler,
}

const TIMEBLOCK_OPTION: OptionSpec = OptionSpec {
    name: "timeblock",
    description: "Choose WEEK to get a partner for the whole week (pairs announced Monday UTC).",
    kind: OptionKind::Timeblock,
    required: false,
};

const DATE_OPTION: OptionSpec = OptionSpec {
    name: "human_date",
    description: "A human-readable date like \"tomorrow\" or \"January 1\".",
    kind: OptionKind::HumanDate,
    required: false,
};

const USER_OPTION: OptionSpec = OptionSpec {
    name: "user",
    description: "The member to pair with.",
    kind: OptionKind::User,
    required: true,
};

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "subscribe",
        description: "Subscribe to pair programming (every day if no timeblock specified).",
        admin_only: false,
        options: &[TIMEBLOCK_OPTION],
        handler: |app, ctx, args| Box::pin(subscribe(app, ctx, args)),
    },
    CommandSpec {
        name: "unsubscribe",
        description: "Unsubscribe from pair programming (every day if no timeblock specified).",
        admin_only: false,
        options: &[TIMEBLOCK_OPTION],
        handler: |app, ctx, args| Box::pin(unsubscribe(app, ctx, args)),
    },
    CommandSpec {
        name: "skip",
        description: "Mark yourself as unavailable for pair programming on a future date.",
        admin_only: false,
        options: &[DATE_OPTION],
        handler: |app, ctx, args| Box::pin(skip(app, ctx, args)),
    },
    CommandSpec {
        name: "unskip",
        description: "Unskip a skipped pairing session.",
        admin_only: false,
        options: &[DATE_OPTION],
        handler: |app, ctx, args| Box::pin(unskip(app, ctx, args)),
    },
    CommandSpec {
        name: "viewschedule",
        description: "View your pair programming schedule.",
        admin_only: false,
        options: &[],
        handler: |app, ctx, args| Box::pin(view_schedule(app, ctx, args)),
    },
    CommandSpec {
        name: "pairwith",
        description: "Start a pairing session with another channel member.",
        admin_only: false,
        options: &[USER_OPTION],
        handler: |app, ctx, args| Box::pin(pair_with(app, ctx, args)),
    },
    CommandSpec {
        name: "addpairbot",
        description: "Add Pairbot to the current channel.",
        admin_only: true,
        options: &[],
        handler: |app, ctx, args| Box::pin(add_pairbot(app, ctx, args)),
    },
    CommandSpec {
        name: "removepairbot",
        description: "Remove Pairbot from the current channel.",
        admin_only: true,
        options: &[],
        handler: |app, ctx, args| Box::pin(remove_pairbot(app, ctx, args)),
    },
    CommandSpec {
        name: "rematch",
        description: "Run matching in this channel now (today's timeblocks if none specified).",
        admin_only: true,
        options: &[TIMEBLOCK_OPTION],
        handler: |app, ctx, args| Box::pin(rematch(app, ctx, args)),
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Run a command and produce its reply text.
///
/// User-facing errors are shown verbatim; anything else is logged and
/// replaced with [`GENERIC_APOLOGY`].
pub async fn dispatch(app: &AppState, ctx: &CommandContext, name: &str, args: &CommandArgs) -> String {
    info!(
        guild = %ctx.guild_id,
        channel = %ctx.channel_id,
        user = %ctx.user_id,
        command = name,
        ?args,
        "executing slash command"
    );

    let result = match find_command(name) {
        None => Err(PairbotError::NotFound(format!("Unknown command /{name}."))),
        Some(spec) if spec.admin_only && !ctx.is_admin => Err(PairbotError::PermissionDenied(
            format!("You need the administrator permission to use /{name}."),
        )),
        Some(spec) => (spec.handler)(app, ctx, args).await,
    };

    match result {
        Ok(reply) => reply,
        Err(e) if e.is_user_facing() => {
            info!(command = name, code = e.code(), reason = %e, "command rejected");
            e.to_string()
        }
        Err(e) => {
            error!(
                guild = %ctx.guild_id,
                channel = %ctx.channel_id,
                user = %ctx.user_id,
                command = name,
                code = e.code(),
                error = %e,
                "command failed"
            );
            GENERIC_APOLOGY.to_string()
        }
    }
}

fn require_active(app: &AppState, ctx: &CommandContext) -> Result<()> {
    if app.store.channel(ctx.channel_id)?.is_none() {
        return Err(PairbotError::NotFound(
            "Pairbot is not active in this channel.".to_string(),
        ));
    }
    Ok(())
}

fn channel_mention(id: ChannelId) -> String {
    format!("<#{id}>")
}

async fn subscribe(app: &AppState, ctx: &CommandContext, args: &CommandArgs) -> Result<String> {
    require_active(app, ctx)?;
    let selection = TimeblockSelection::from(args.timeblock);
    let channel = channel_mention(ctx.channel_id);
    let change = app
        .store
        .subscribe(ctx.channel_id, ctx.user_id, &selection.blocks())?;

    if !change.changed() {
        return Err(PairbotError::Duplicate(match selection {
            TimeblockSelection::One(t) => {
                format!("You are already subscribed to pair programming on {t} in {channel}.")
            }
            TimeblockSelection::EveryDay => {
                format!("You are already subscribed to daily pair programming in {channel}.")
            }
        }));
    }

    let what = match selection {
        TimeblockSelection::One(t) => format!("pair programming on {t}"),
        TimeblockSelection::EveryDay => "daily pair programming".to_string(),
    };
    Ok(format!(
        "Successfully subscribed to {what} in {channel}. Your schedule is now `{}`.",
        change.after.render()
    ))
}

async fn unsubscribe(app: &AppState, ctx: &CommandContext, args: &CommandArgs) -> Result<String> {
    require_active(app, ctx)?;
    let selection = TimeblockSelection::from(args.timeblock);
    let channel = channel_mention(ctx.channel_id);
    let change = app
        .store
        .unsubscribe(ctx.channel_id, ctx.user_id, &selection.blocks())?;

    if !change.changed() {
        return Err(PairbotError::NoSubscription(match selection {
            TimeblockSelection::One(t) => {
                format!("You are not subscribed to pair programming on {t} in {channel}.")
            }
            TimeblockSelection::EveryDay => {
                format!("You are not subscribed to daily pair programming in {channel}.")
            }
        }));
    }

    let what = match selection {
        TimeblockSelection::One(t) => format!("pair programming on {t}"),
        TimeblockSelection::EveryDay => "daily pair programming".to_string(),
    };
    let rest = if change.after.is_empty() {
        "You have no remaining subscriptions here.".to_string()
    } else {
        format!("Your schedule is now `{}`.", change.after.render())
    };
    Ok(format!("Successfully unsubscribed from {what} in {channel}. {rest}"))
}

async fn skip(app: &AppState, ctx: &CommandContext, args: &CommandArgs) -> Result<String> {
    require_active(app, ctx)?;
    let date = app.exceptions.resolve_effective_date(
        ctx.channel_id,
        ctx.user_id,
        args.human_date.as_deref(),
        ctx.today,
    )?;
    app.exceptions
        .skip(ctx.channel_id, ctx.user_id, date, ctx.today)?;
    Ok(format!(
        "Successfully skipped pair programming on {}.",
        format_date(date)
    ))
}

async fn unskip(app: &AppState, ctx: &CommandContext, args: &CommandArgs) -> Result<String> {
    require_active(app, ctx)?;
    let date = app.exceptions.resolve_unskip_date(
        ctx.channel_id,
        ctx.user_id,
        args.human_date.as_deref(),
        ctx.today,
    )?;
    let reply = match app
        .exceptions
        .unskip(ctx.channel_id, ctx.user_id, date, ctx.today)?
    {
        Unskipped::SkipRemoved => "Successfully unskipped pair programming on",
        Unskipped::ForcedAvailable => "You will be included in pairing on",
    };
    Ok(format!("{reply} {}.", format_date(date)))
}

async fn view_schedule(app: &AppState, ctx: &CommandContext, _args: &CommandArgs) -> Result<String> {
    require_active(app, ctx)?;
    let schedules = app.store.schedules_for_user(ctx.guild_id, ctx.user_id)?;
    if schedules.is_empty() {
        return Ok("You are not subscribed to pair programming in any channel.".to_string());
    }
    let skips = app.store.upcoming_exceptions(ctx.user_id, ctx.today)?;

    let describe = |channel: ChannelId, rendered: String| {
        let skipped: Vec<String> = skips
            .iter()
            .filter(|e| e.channel_id == channel && !e.available)
            .map(|e| e.date.format("%a %b %d").to_string())
            .collect();
        if skipped.is_empty() {
            rendered
        } else {
            format!("{rendered} (skipping {})", skipped.join(", "))
        }
    };

    if let [(channel, availability)] = schedules.as_slice() {
        let days = if availability.is_every_day() {
            availability.render()
        } else {
            format!("on {}", availability.render())
        };
        return Ok(format!(
            "You are subscribed to pair programming in {} {}.",
            channel_mention(*channel),
            describe(*channel, days)
        ));
    }

    let mut out = String::from("You are subscribed to pair programming in the following channels:\n");
    for (channel, availability) in &schedules {
        out.push_str(&format!(
            "* {}: {}\n",
            channel_mention(*channel),
            describe(*channel, availability.render())
        ));
    }
    Ok(out)
}

async fn pair_with(app: &AppState, ctx: &CommandContext, args: &CommandArgs) -> Result<String> {
    let target = args
        .user
        .ok_or_else(|| PairbotError::InvalidInput("Choose a member to pair with.".to_string()))?;
    if target == ctx.user_id {
        return Err(PairbotError::InvalidInput(
            "You cannot pair with yourself.".to_string(),
        ));
    }
    require_active(app, ctx)?;

    let me = app
        .messenger
        .resolve_member(ctx.guild_id, ctx.user_id)
        .await?
        .unwrap_or_else(|| Member {
            id: ctx.user_id,
            display_name: ctx.user_name.clone(),
        });
    let them = app
        .messenger
        .resolve_member(ctx.guild_id, target)
        .await?
        .ok_or_else(|| {
            PairbotError::NotFound(format!("{} is not a member of this server.", target.mention()))
        })?;

    let text = format!(
        "{} has started a pairing session with you, {}. Happy pairing! :computer:",
        me.id.mention(),
        them.id.mention()
    );
    app.matching
        .open_group(ctx.channel_id, PairingKind::AdHoc, &[me, them], &text)
        .await?;
    Ok(format!(
        "Successfully created pairing thread with {}",
        target.mention()
    ))
}

async fn add_pairbot(app: &AppState, ctx: &CommandContext, _args: &CommandArgs) -> Result<String> {
    let channel = channel_mention(ctx.channel_id);
    if !app.store.activate_channel(ctx.guild_id, ctx.channel_id)? {
        return Err(PairbotError::Duplicate(format!(
            "Pairbot is already added to {channel}."
        )));
    }
    Ok(format!("Added Pairbot to {channel}."))
}

async fn remove_pairbot(app: &AppState, ctx: &CommandContext, _args: &CommandArgs) -> Result<String> {
    let channel = channel_mention(ctx.channel_id);
    if !app.store.deactivate_channel(ctx.channel_id)? {
        return Err(PairbotError::NotFound(format!(
            "Pairbot is not added to {channel}."
        )));
    }
    Ok(format!("Removed Pairbot from {channel}."))
}

async fn rematch(app: &AppState, ctx: &CommandContext, args: &CommandArgs) -> Result<String> {
    let record = app.store.channel(ctx.channel_id)?.ok_or_else(|| {
        PairbotError::NotFound("Pairbot is not active in this channel.".to_string())
    })?;

    let results = match args.timeblock {
        Some(block) => {
            let date = next_date_for(block, ctx.today).unwrap_or(ctx.today);
            vec![(block, app.matching.run_matching(&record, block, date).await)]
        }
        None => app.matching.run_for_date(&record, ctx.today).await,
    };

    let lines: Vec<String> = results
        .iter()
        .map(|(block, result)| match result {
            MatchingResult::Underfilled { candidates } => {
                format!("{block}: not enough members available ({candidates}).")
            }
            MatchingResult::Matched {
                group_count,
                user_count,
                failed_groups: 0,
            } => format!("{block}: matched {user_count} members into {group_count} groups."),
            MatchingResult::Matched {
                group_count,
                user_count,
                failed_groups,
            } => format!(
                "{block}: matched {user_count} members into {group_count} groups; \
                 {failed_groups} could not be opened."
            ),
            MatchingResult::Failed { .. } => format!("{block}: matching failed, see the bot log."),
        })
        .collect();
    Ok(lines.join("\n"))
}
