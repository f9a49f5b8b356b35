//! Moderation Bot Example
//!
//! A demonstration of slashbind handlers with typed options, injected
//! context and permission gates. Interaction payloads are replayed from
//! disk and the requests the bot would send to Discord are logged instead
//! of being sent.
//!
//! # Commands
//!
//! ```text
//! /mod ban <target: member> [reason: string]   BAN_MEMBERS, servers only
//! /roll [sides: integer]
//! /info
//! /remind <seconds: integer> <text: string>    deferred reply
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package moderation-bot
//! cargo run --package moderation-bot -- demos/moderation_bot/payloads/ban.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::FutureExt;
use slashbind::discord::{
    ApiRequest, DiscordPlatform, Guild, InteractionCallback, InteractionEvent, Member, SendFn,
    User,
};
use slashbind::prelude::*;
use slashbind::runtime::load_config_from_file;
use tracing::{error, info};

const SAMPLES: &[(&str, &str)] = &[
    ("ban", include_str!("../payloads/ban.json")),
    ("ban_denied", include_str!("../payloads/ban_denied.json")),
    ("roll", include_str!("../payloads/roll.json")),
    ("info", include_str!("../payloads/info.json")),
    ("remind", include_str!("../payloads/remind.json")),
];

#[derive(Debug, Parser)]
#[command(about = "Replays Discord interactions through slashbind")]
struct Args {
    /// Interaction payloads to replay. The bundled samples run when empty.
    payloads: Vec<PathBuf>,

    /// Configuration file. Defaults to the usual search paths.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application id used to build webhook URLs.
    #[arg(long, default_value_t = 1_000_000_000_000_000_000)]
    application_id: u64,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Bans a member. The gate has already checked BAN_MEMBERS.
async fn ban(target: Member, reason: Option<String>, moderator: User) -> String {
    let target_name = target.display_name().to_string();
    let mention = target.user.map(|user| user.mention()).unwrap_or(target_name);
    format!(
        "🔨 {} banned {} ({})",
        moderator.display_name(),
        mention,
        reason.as_deref().unwrap_or("no reason given")
    )
}

/// Rolls a die. The interaction id stands in for a random source.
async fn roll(sides: Option<i32>, event: InteractionEvent) -> String {
    let sides = sides.unwrap_or(6).max(2);
    let rolled = event.id % sides as u64 + 1;
    format!("🎲 d{sides} → {rolled}")
}

async fn info(user: User, member: Option<Member>, guild: Option<Guild>) -> Embed {
    let mut embed = Embed::new()
        .title(user.display_name().to_string())
        .field("Id", user.id.to_string(), true);
    match (guild, member) {
        (Some(guild), Some(member)) => {
            embed = embed
                .description(format!("Member of {guild}"))
                .field("Roles", member.roles.len().to_string(), true);
        }
        _ => embed = embed.description("Talking in direct messages"),
    }
    embed
}

/// Replies after a delay. The wait stops if the invocation is cancelled.
async fn remind(seconds: i64, text: String, user: User) -> Deferred<String> {
    let delay = Duration::from_secs(seconds.clamp(0, 10) as u64);
    Deferred::new(async move {
        tokio::time::sleep(delay).await;
        format!("⏰ {}: {text}", user.mention())
    })
}

// ============================================================================
// Setup
// ============================================================================

fn register_commands(engine: &mut Engine) -> Result<()> {
    let moderation = CommandGroup::new("mod").require(Permission::BanMembers);

    engine.register(
        CommandSpec::new("ban")
            .description("Ban a member")
            .within(&moderation)
            .option::<Member>("target")
            .option::<Option<String>>("reason")
            .context::<User>()
            .visible_in([InteractionContext::Guild]),
        ban,
    )?;
    engine.register(
        CommandSpec::new("roll")
            .description("Roll a die")
            .option::<Option<i32>>("sides")
            .context::<InteractionEvent>(),
        roll,
    )?;
    engine.register(
        CommandSpec::new("info")
            .description("Show who you are")
            .context::<User>()
            .context::<Option<Member>>()
            .context::<Option<Guild>>(),
        info,
    )?;
    engine.register(
        CommandSpec::new("remind")
            .description("Remind yourself later")
            .option::<i64>("seconds")
            .option::<String>("text")
            .context::<User>(),
        remind,
    )?;
    Ok(())
}

/// Logs requests instead of sending them.
fn logging_transport() -> SendFn {
    Arc::new(|request: ApiRequest| {
        async move {
            info!(
                method = ?request.method,
                url = %request.url,
                body = %request.body,
                "Would send request"
            );
            Ok(())
        }
        .boxed()
    })
}

async fn read_payloads(paths: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if paths.is_empty() {
        return Ok(SAMPLES
            .iter()
            .map(|(name, json)| (name.to_string(), json.to_string()))
            .collect());
    }
    let mut payloads = Vec::with_capacity(paths.len());
    for path in paths {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        payloads.push((path.display().to_string(), json));
    }
    Ok(payloads)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };
    init_from_config(&config.logging);

    let platform = DiscordPlatform::builder(args.application_id).build();
    let mut engine = Engine::builder(config).platform(&platform)?.build()?;
    register_commands(&mut engine)?;
    info!(commands = engine.commands().count(), "Commands registered");

    let responder = InteractionCallback::new(platform.client().clone(), logging_transport());
    for (name, json) in read_payloads(&args.payloads).await? {
        let event = match InteractionEvent::parse(&json) {
            Ok(event) => event,
            Err(e) => {
                error!(payload = %name, error = %e, "Invalid interaction payload");
                continue;
            }
        };
        info!(payload = %name, command = %event.command_name(), "Replaying interaction");
        if let Err(e) = engine.respond(event.into_invocation(), &responder).await {
            error!(payload = %name, error = %e, "Failed to respond");
        }
    }

    Ok(())
}
