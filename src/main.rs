use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cadence::commands::{self, admins, general};
use cadence::utils::{config::BotConfig, database::Database};
use cadence::{Data, Error, events};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cadence=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = BotConfig::load()?;
    let token = BotConfig::discord_token()?;
    let database = Database::open(&config.database_path)?;

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    // Create a vector to hold our commands
    let mut commands = vec![
        // Default commands
        general::register(),
        general::help(),
        // General commands
        general::ping::ping(),
        // Guild administration
        admins::stats::stats(),
        admins::stats::resetstats(),
        admins::settings::settings(),
    ];

    // Handle Music feature
    #[cfg(feature = "music")]
    commands.extend(commands::music::commands());

    let prefix = config.prefix.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            on_error: |error| Box::pin(commands::on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data::new(config, database))
            })
        });

    let client_builder = ClientBuilder::new(token, intents).framework(framework.build());

    // Create and run client
    if let Err(e) = build_and_start_client(client_builder).await {
        error!("Client stopped with an error: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn build_and_start_client(client_builder: ClientBuilder) -> Result<(), Error> {
    #[cfg(feature = "music")]
    {
        use songbird::SerenityInit;

        let mut client = client_builder.register_songbird().await?;
        client.start().await.map_err(Into::into)
    }

    #[cfg(not(feature = "music"))]
    {
        let mut client = client_builder.await?;
        client.start().await.map_err(Into::into)
    }
}
