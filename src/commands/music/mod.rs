pub(crate) mod dj;
pub(crate) mod leave;
pub(crate) mod modes;
pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod queue;
pub(crate) mod radio;
pub(crate) mod remove;
pub(crate) mod skip;
pub(crate) mod stop;
pub(crate) mod vote;
pub(crate) mod volume;

pub mod utils;

use crate::{CommandResult, Context, Data, Error};
use poise::CreateReply;
use tracing::debug;
use utils::embedded_messages;
use utils::music_manager::MusicResult;

/// Every music command, in the order they show up in `/help`.
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        play::play(),
        pause::pause(),
        pause::resume(),
        skip::skip(),
        queue::queue(),
        queue::nowplaying(),
        modes::repeat(),
        modes::clearrepeat(),
        modes::loop_track(),
        volume::volume(),
        leave::leave(),
        // DJ only
        dj::join(),
        stop::stop(),
        dj::clearqueue(),
        dj::shuffle(),
        skip::skipto(),
        dj::move_track(),
        remove::remove(),
        remove::removeuser(),
        modes::infinite(),
        volume::resetvolume(),
        // Votes
        vote::voteskip(),
        vote::voteshuffle(),
        vote::voteclear(),
        vote::votestop(),
        radio::radio(),
    ]
}

/// Send the reply a music operation produced, or explain why it failed.
async fn respond(ctx: Context<'_>, result: MusicResult<CreateReply>) -> CommandResult {
    let reply = match result {
        Ok(reply) => reply,
        Err(err) => {
            debug!(
                "'{}' rejected for {}: {}",
                ctx.command().qualified_name,
                ctx.author().name,
                err
            );
            embedded_messages::error(err)
        }
    };
    ctx.send(reply).await?;
    Ok(())
}
