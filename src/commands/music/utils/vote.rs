//! Reaction-based votes among the listeners in the bot's voice channel.

use futures::StreamExt;
use poise::serenity_prelude as serenity;
use serenity::all::{ReactionCollector, ReactionType};
use serenity::model::id::UserId;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

use crate::{Context, Error};

use super::embedded_messages;

pub const APPROVE_EMOJI: &str = "✅";
pub const REJECT_EMOJI: &str = "❌";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Pending,
    Passed,
    Failed,
}

/// Running count of a vote among a fixed set of eligible users.
#[derive(Debug, Clone)]
pub struct VoteTally {
    eligible: HashSet<UserId>,
    ratio: f64,
    yes: HashSet<UserId>,
    no: HashSet<UserId>,
}

impl VoteTally {
    pub fn new(eligible: impl IntoIterator<Item = UserId>, ratio: f64) -> Self {
        Self {
            eligible: eligible.into_iter().collect(),
            ratio,
            yes: HashSet::new(),
            no: HashSet::new(),
        }
    }

    /// Yes votes needed to pass. Never less than one.
    pub fn required(&self) -> usize {
        let needed = (self.eligible.len() as f64 * self.ratio).ceil() as usize;
        needed.max(1)
    }

    /// Record a vote. Returns false for users who may not vote. Voting again switches sides.
    pub fn cast(&mut self, user: UserId, approve: bool) -> bool {
        if !self.eligible.contains(&user) {
            return false;
        }
        if approve {
            self.no.remove(&user);
            self.yes.insert(user);
        } else {
            self.yes.remove(&user);
            self.no.insert(user);
        }
        true
    }

    pub fn eligible(&self) -> usize {
        self.eligible.len()
    }

    pub fn yes(&self) -> usize {
        self.yes.len()
    }

    pub fn no(&self) -> usize {
        self.no.len()
    }

    pub fn outcome(&self) -> VoteOutcome {
        let required = self.required();
        if self.yes.len() >= required {
            return VoteOutcome::Passed;
        }
        let undecided = self.eligible.len() - self.yes.len() - self.no.len();
        if self.yes.len() + undecided < required {
            return VoteOutcome::Failed;
        }
        VoteOutcome::Pending
    }
}

/// Which side a reaction votes for, if it is one of the vote emojis.
fn vote_choice(emoji: &ReactionType) -> Option<bool> {
    match emoji {
        ReactionType::Unicode(emoji) if emoji == APPROVE_EMOJI => Some(true),
        ReactionType::Unicode(emoji) if emoji == REJECT_EMOJI => Some(false),
        _ => None,
    }
}

/// Post a vote message and collect reactions until the outcome is decided or `timeout` passes.
/// A vote still pending at the timeout fails.
pub async fn run_vote(
    ctx: Context<'_>,
    action: &str,
    eligible: Vec<UserId>,
    ratio: f64,
    timeout: Duration,
) -> Result<VoteOutcome, Error> {
    let mut tally = VoteTally::new(eligible, ratio);
    info!(
        "Starting vote '{}' requiring {} of {} listeners",
        action,
        tally.required(),
        tally.eligible()
    );

    // The initiator counts as a yes vote.
    tally.cast(ctx.author().id, true);
    if tally.outcome() == VoteOutcome::Passed {
        return Ok(VoteOutcome::Passed);
    }

    let reply = ctx
        .send(embedded_messages::vote_started(action, &tally, timeout))
        .await?;
    let message = reply.message().await?;

    // Collecting starts before the bot's own reactions go up.
    let mut reactions = ReactionCollector::new(ctx.serenity_context())
        .message_id(message.id)
        .timeout(timeout)
        .stream();

    message
        .react(ctx, ReactionType::Unicode(APPROVE_EMOJI.to_string()))
        .await?;
    message
        .react(ctx, ReactionType::Unicode(REJECT_EMOJI.to_string()))
        .await?;

    while let Some(reaction) = reactions.next().await {
        let Some(user_id) = reaction.user_id else {
            continue;
        };
        let Some(approve) = vote_choice(&reaction.emoji) else {
            continue;
        };

        if tally.cast(user_id, approve) {
            debug!(
                "Vote '{}': {} yes / {} no (need {})",
                action,
                tally.yes(),
                tally.no(),
                tally.required()
            );
        }

        if tally.outcome() != VoteOutcome::Pending {
            break;
        }
    }

    let outcome = match tally.outcome() {
        VoteOutcome::Pending => VoteOutcome::Failed,
        decided => decided,
    };
    info!("Vote '{}' finished: {:?}", action, outcome);

    ctx.send(embedded_messages::vote_finished(action, &tally, outcome))
        .await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn users(ids: impl IntoIterator<Item = u64>) -> Vec<UserId> {
        ids.into_iter().map(UserId::new).collect()
    }

    #[test_case(4, 0.5, 2 ; "half of four")]
    #[test_case(3, 0.5, 2 ; "half of three rounds up")]
    #[test_case(5, 1.0, 5 ; "unanimous")]
    #[test_case(0, 0.5, 1 ; "nobody eligible still needs one")]
    #[test_case(10, 0.01, 1 ; "tiny ratio")]
    fn required_votes(eligible: u64, ratio: f64, expected: usize) {
        let tally = VoteTally::new(users(1..=eligible), ratio);
        assert_eq!(tally.required(), expected);
    }

    #[test]
    fn passes_once_threshold_reached() {
        let mut tally = VoteTally::new(users(1..=4), 0.5);
        tally.cast(UserId::new(1), true);
        assert_eq!(tally.outcome(), VoteOutcome::Pending);

        tally.cast(UserId::new(2), true);
        assert_eq!(tally.outcome(), VoteOutcome::Passed);
    }

    #[test]
    fn ineligible_votes_are_ignored() {
        let mut tally = VoteTally::new(users(1..=2), 1.0);
        assert!(!tally.cast(UserId::new(99), true));
        assert_eq!(tally.yes(), 0);
    }

    #[test]
    fn switching_sides_moves_the_vote() {
        let mut tally = VoteTally::new(users(1..=3), 0.5);
        tally.cast(UserId::new(1), false);
        tally.cast(UserId::new(1), true);

        assert_eq!((tally.yes(), tally.no()), (1, 0));
    }

    #[test]
    fn fails_once_no_votes_block_the_threshold() {
        let mut tally = VoteTally::new(users(1..=4), 0.75);
        tally.cast(UserId::new(1), true);
        tally.cast(UserId::new(2), false);
        assert_eq!(tally.outcome(), VoteOutcome::Pending);

        tally.cast(UserId::new(3), false);
        assert_eq!(tally.outcome(), VoteOutcome::Failed);
    }

    #[test]
    fn fails_when_threshold_is_out_of_reach() {
        let tally = VoteTally::new(Vec::new(), 0.5);
        assert_eq!(tally.outcome(), VoteOutcome::Failed);
    }

    #[test_case(APPROVE_EMOJI, Some(true) ; "approve")]
    #[test_case(REJECT_EMOJI, Some(false) ; "reject")]
    #[test_case("🎵", None ; "other emoji")]
    fn reaction_maps_to_vote(emoji: &str, expected: Option<bool>) {
        assert_eq!(vote_choice(&ReactionType::Unicode(emoji.to_string())), expected);
    }

    #[test]
    fn bot_reactions_do_not_count() {
        let bot = UserId::new(1000);
        let mut tally = VoteTally::new(users(1..=2), 1.0);
        tally.cast(UserId::new(1), true);

        assert!(!tally.cast(bot, true));
        assert!(!tally.cast(bot, false));
        assert_eq!((tally.yes(), tally.no()), (1, 0));
        assert_eq!(tally.outcome(), VoteOutcome::Pending);
    }
}
