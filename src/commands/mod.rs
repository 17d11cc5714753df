//! This module aggregates all the command modules for the bot.

use poise::{CreateReply, FrameworkError, serenity_prelude as serenity};
use serenity::all::CreateEmbed;
use tracing::{error, warn};

use crate::{Data, Error};

/// Guild administration commands (statistics, settings).
pub mod admins;
/// General purpose commands (e.g., ping, help).
pub mod general;

/// Commands related to music playback (requires the `music` feature).
#[cfg(feature = "music")]
pub mod music;

fn error_reply(description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description)
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Framework-wide error handler: log unexpected failures and tell the user something broke.
pub async fn on_error(error: FrameworkError<'_, Data, Error>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            error!(
                "Command '{}' failed for {}: {}",
                ctx.command().qualified_name,
                ctx.author().name,
                error
            );
            if let Err(e) = ctx
                .send(error_reply(
                    "Something went wrong while running that command",
                ))
                .await
            {
                warn!("Failed to report command error: {}", e);
            }
        }
        // Checks that fail without an error have already replied.
        FrameworkError::CommandCheckFailed { error: None, .. } => {}
        FrameworkError::MissingUserPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let missing = missing_permissions
                .map(|perms| perms.to_string())
                .unwrap_or_else(|| "the required permissions".to_string());
            if let Err(e) = ctx
                .send(error_reply(format!("You need {} to use this command", missing)))
                .await
            {
                warn!("Failed to report missing permissions: {}", e);
            }
        }
        FrameworkError::GuildOnly { ctx, .. } => {
            if let Err(e) = ctx
                .send(error_reply("This command only works inside a server"))
                .await
            {
                warn!("Failed to report guild-only command: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
