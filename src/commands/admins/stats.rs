use ::serenity::all::{CreateEmbed, CreateEmbedFooter};
use poise::CreateReply;
use thousands::Separable;
use tracing::info;

use crate::utils::database::GuildStats;
use crate::{CommandResult, Context};

fn stats_embed(guild_name: &str, stats: &GuildStats) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("📊 Statistics for {}", guild_name))
        .field(
            "Messages deleted",
            format!("`{}`", stats.messages_deleted.separate_with_commas()),
            true,
        )
        .field(
            "Reactions removed",
            format!("`{}`", stats.reactions_deleted.separate_with_commas()),
            true,
        )
        .field(
            "Tracks played",
            format!("`{}`", stats.tracks_played.separate_with_commas()),
            true,
        )
        .footer(CreateEmbedFooter::new(format!(
            "Counting since {}",
            stats.since.format("%Y-%m-%d %H:%M UTC")
        )))
        .color(0x00ff00)
}

/// Show this server's activity counters
#[poise::command(slash_command, prefix_command, guild_only, category = "Admin")]
pub async fn stats(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let guild_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| guild_id.to_string());

    let reply = match ctx.data().database.find_stats(guild_id)? {
        Some(stats) => CreateReply::default().embed(stats_embed(&guild_name, &stats)),
        None => CreateReply::default().embed(
            CreateEmbed::new()
                .title(format!("📊 Statistics for {}", guild_name))
                .description("Nothing has been recorded yet")
                .color(0x00ff00),
        ),
    };

    ctx.send(reply).await?;
    Ok(())
}

/// Reset this server's activity counters
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    category = "Admin"
)]
pub async fn resetstats(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    ctx.data().database.reset_stats(guild_id)?;
    info!("{} reset statistics for guild {}", ctx.author().name, guild_id);

    ctx.send(
        CreateReply::default().embed(
            CreateEmbed::new()
                .title("📊 Statistics Reset")
                .description("All counters are back to zero")
                .color(0x00ff00),
        ),
    )
    .await?;
    Ok(())
}
