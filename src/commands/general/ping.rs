use ::serenity::all::CreateEmbed;
use poise::{CreateReply, serenity_prelude as serenity};
use std::time::Duration;

use crate::{CommandResult, Context};

/// Ping the bot to check its latency
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn ping(ctx: Context<'_>) -> CommandResult {
    let latency = get_shard_latency(&ctx).await;

    let latency = match latency {
        Some(latency) => format!("{} ms", latency.as_millis()),
        // The first heartbeat has not been acknowledged yet.
        None => "measuring…".to_string(),
    };

    let embed = CreateEmbed::new()
        .title("Pong!")
        .field("API Latency", latency, false)
        .color(0x00ff00);

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}

async fn get_shard_latency(ctx: &Context<'_>) -> Option<Duration> {
    let shard_manager = ctx.framework().shard_manager();

    let runners = shard_manager.runners.lock().await;

    // Each shard is backed by a runner; look up the one this command arrived on.
    let runner = runners.get(&serenity::ShardId(ctx.serenity_context().shard_id.0))?;

    runner.latency
}
