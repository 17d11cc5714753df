use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use cadence::commands::music::utils::inactivity::{IdleReason, InactivityMonitor};
use cadence::commands::music::utils::music_manager::MusicError;
use cadence::commands::music::utils::scheduler::{Scheduler, SchedulerKind};
use cadence::commands::music::utils::vote::{VoteOutcome, VoteTally};
use cadence::utils::config::{BotConfig, InactivityConfig};
use poise::serenity_prelude::{GuildId, UserId};
use pretty_assertions::assert_eq;

use crate::common::fixtures::{ALICE, BOB, SAMPLE_CONFIG, SAMPLE_GUILD_ID, track};

fn titles(scheduler: &Scheduler) -> Vec<String> {
    scheduler
        .queue()
        .expect("queue mode")
        .upcoming()
        .map(|track| track.metadata.title.clone())
        .collect()
}

#[test]
fn a_listening_session() {
    crate::test_utils::init();
    let config = BotConfig::from_json(SAMPLE_CONFIG).expect("sample config is valid");
    let mut scheduler = Scheduler::default();

    let queue = scheduler.queue_mut().unwrap();
    queue.push(track("one", ALICE), config.max_queue_len).unwrap();
    queue.push(track("two", BOB), config.max_queue_len).unwrap();
    queue.push(track("three", ALICE), config.max_queue_len).unwrap();
    assert_matches!(
        queue.push(track("four", BOB), config.max_queue_len),
        Err(MusicError::QueueFull(3))
    );

    // First track starts and gets repeated once
    assert_eq!(scheduler.advance().unwrap().metadata.title, "one");
    scheduler.queue_mut().unwrap().set_repeat(1).unwrap();
    assert_eq!(scheduler.advance().unwrap().metadata.title, "one");
    assert_eq!(scheduler.advance().unwrap().metadata.title, "two");

    // Alice leaves, her remaining track goes with her
    let removed = scheduler
        .queue_mut()
        .unwrap()
        .remove_by_requester(UserId::new(ALICE));
    assert_eq!(removed, 1);
    assert!(titles(&scheduler).is_empty());

    assert_eq!(scheduler.advance(), None);
    assert_eq!(scheduler.queue().unwrap().current(), None);
}

#[test]
fn infinite_playlist_cycles_through_skip_to() {
    let mut scheduler = Scheduler::default();
    let queue = scheduler.queue_mut().unwrap();
    for title in ["a", "b", "c", "d"] {
        queue.push(track(title, ALICE), 10).unwrap();
    }
    queue.toggle_infinite();

    assert_eq!(scheduler.advance().unwrap().metadata.title, "a");
    let target = scheduler.queue_mut().unwrap().skip_to(2).unwrap().clone();
    assert_eq!(target.metadata.title, "c");
    assert_eq!(titles(&scheduler), ["c", "d", "a", "b"]);

    assert_eq!(scheduler.advance().unwrap().metadata.title, "c");
    assert_eq!(titles(&scheduler), ["d", "a", "b"]);
}

#[test]
fn radio_replaces_an_idle_queue() {
    let config = BotConfig::from_json(SAMPLE_CONFIG).expect("sample config is valid");
    let station = config.station("jazz").cloned().unwrap();
    let mut scheduler = Scheduler::default();
    scheduler.queue_mut().unwrap().push(track("waiting", BOB), 10).unwrap();

    scheduler.start_radio(station.clone()).unwrap();
    assert_eq!(scheduler.kind(), SchedulerKind::Radio);
    assert_matches!(scheduler.queue_mut(), Err(MusicError::RadioActive));

    assert_eq!(scheduler.stop_radio(), Some(station));
    assert!(scheduler.is_queue());
    // The queue comes back empty
    assert!(titles(&scheduler).is_empty());
}

#[test]
fn vote_passes_with_majority_of_listeners() {
    let listeners = [ALICE, BOB, 3, 4, 5].map(UserId::new);
    let mut tally = VoteTally::new(listeners, 0.5);
    assert_eq!(tally.required(), 3);

    tally.cast(UserId::new(ALICE), true);
    tally.cast(UserId::new(BOB), true);
    assert_eq!(tally.outcome(), VoteOutcome::Pending);

    // Outsiders do not count
    assert!(!tally.cast(UserId::new(99), true));
    assert_eq!(tally.outcome(), VoteOutcome::Pending);

    tally.cast(UserId::new(3), true);
    assert_eq!(tally.outcome(), VoteOutcome::Passed);
}

#[test]
fn idle_guilds_expire_by_reason() {
    let config = InactivityConfig {
        idle_timeout: Duration::from_secs(300),
        alone_timeout: Duration::from_secs(60),
        poll_interval: Duration::from_secs(10),
    };
    let monitor = InactivityMonitor::default();
    let paused = GuildId::new(SAMPLE_GUILD_ID);
    let deserted = GuildId::new(SAMPLE_GUILD_ID + 1);

    monitor.mark_idle(paused, IdleReason::NotPlaying);
    monitor.mark_idle(deserted, IdleReason::Alone);

    let soon = Instant::now() + Duration::from_secs(120);
    assert_eq!(monitor.expired(soon, &config), vec![(deserted, IdleReason::Alone)]);

    let later = Instant::now() + Duration::from_secs(600);
    let mut expired = monitor.expired(later, &config);
    expired.sort_by_key(|(guild, _)| *guild);
    assert_eq!(
        expired,
        vec![(paused, IdleReason::NotPlaying), (deserted, IdleReason::Alone)]
    );

    monitor.mark_active(paused);
    assert_eq!(monitor.reason(paused), None);
}
