use ::serenity::all::CreateEmbed;
use poise::CreateReply;
use std::time::Duration;
use tracing::info;

use crate::utils::database::GuildSettings;
use crate::{CommandResult, Context};

const MIN_VOTE_TIMEOUT: u64 = 5;
const MAX_VOTE_TIMEOUT: u64 = 300;

fn settings_embed(settings: &GuildSettings) -> CreateEmbed {
    CreateEmbed::new()
        .title("⚙️ Server Settings")
        .field("DJ role", format!("`{}`", settings.dj_role), true)
        .field(
            "Vote ratio",
            format!("`{:.0}%`", settings.vote_ratio * 100.0),
            true,
        )
        .field(
            "Vote timeout",
            format!("`{}s`", settings.vote_timeout.as_secs()),
            true,
        )
        .field(
            "Default volume",
            format!("`{}%`", settings.default_volume),
            true,
        )
        .color(0x00ff00)
}

fn invalid(description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description)
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Load, modify and store the guild's settings, then show the result.
async fn update(ctx: Context<'_>, apply: impl FnOnce(&mut GuildSettings)) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let mut settings = ctx.data().settings(guild_id);
    apply(&mut settings);
    ctx.data().database.save_settings(guild_id, &settings)?;
    info!(
        "{} updated settings for guild {}: {:?}",
        ctx.author().name,
        guild_id,
        settings
    );

    ctx.send(CreateReply::default().embed(settings_embed(&settings)))
        .await?;
    Ok(())
}

/// View or change this server's bot settings
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    subcommands("show", "djrole", "voteratio", "votetimeout", "volume"),
    subcommand_required,
    category = "Admin"
)]
pub async fn settings(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Show the current settings
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let settings = ctx.data().settings(guild_id);
    ctx.send(CreateReply::default().embed(settings_embed(&settings)))
        .await?;
    Ok(())
}

/// Set the name of the role allowed to use DJ commands
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn djrole(
    ctx: Context<'_>,
    #[description = "Role name"] name: String,
) -> CommandResult {
    let name = name.trim().to_string();
    if name.is_empty() {
        ctx.send(invalid("The role name cannot be empty")).await?;
        return Ok(());
    }
    update(ctx, |settings| settings.dj_role = name).await
}

/// Set the share of listeners that must agree for a vote to pass
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn voteratio(
    ctx: Context<'_>,
    #[description = "Ratio between 0.01 and 1.0"] ratio: f64,
) -> CommandResult {
    if !(ratio > 0.0 && ratio <= 1.0) {
        ctx.send(invalid("The ratio must be greater than 0 and at most 1"))
            .await?;
        return Ok(());
    }
    update(ctx, |settings| settings.vote_ratio = ratio).await
}

/// Set how long votes stay open
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn votetimeout(
    ctx: Context<'_>,
    #[description = "Seconds"]
    #[min = 5]
    #[max = 300]
    seconds: u64,
) -> CommandResult {
    if !(MIN_VOTE_TIMEOUT..=MAX_VOTE_TIMEOUT).contains(&seconds) {
        ctx.send(invalid(format!(
            "The timeout must be between {} and {} seconds",
            MIN_VOTE_TIMEOUT, MAX_VOTE_TIMEOUT
        )))
        .await?;
        return Ok(());
    }
    update(ctx, |settings| {
        settings.vote_timeout = Duration::from_secs(seconds)
    })
    .await
}

/// Set the volume new players start with
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume in percent"] level: u8,
) -> CommandResult {
    let max = ctx.data().config.max_volume;
    if level > max {
        ctx.send(invalid(format!("The volume must be between 0 and {}", max)))
            .await?;
        return Ok(());
    }
    update(ctx, |settings| settings.default_volume = level).await
}
