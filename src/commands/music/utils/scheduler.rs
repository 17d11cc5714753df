//! Playback schedulers. A guild is either working through a track queue or streaming a
//! radio station; [`Scheduler`] holds whichever one is active.

use rand::seq::SliceRandom;
use serenity::model::id::UserId;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};

use super::audio_sources::QueuedTrack;
use super::music_manager::{MusicError, MusicResult};
use crate::utils::config::RadioStation;

/// Upper bound for `/repeat`.
pub const MAX_REPEATS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Queue,
    Radio,
}

#[derive(Debug)]
pub enum Scheduler {
    Queue(QueueScheduler),
    Radio(RadioScheduler),
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::Queue(QueueScheduler::default())
    }
}

impl Scheduler {
    pub fn kind(&self) -> SchedulerKind {
        match self {
            Scheduler::Queue(_) => SchedulerKind::Queue,
            Scheduler::Radio(_) => SchedulerKind::Radio,
        }
    }

    pub fn is_queue(&self) -> bool {
        matches!(self, Scheduler::Queue(_))
    }

    pub fn is_radio(&self) -> bool {
        self.kind() == SchedulerKind::Radio
    }

    pub fn queue(&self) -> MusicResult<&QueueScheduler> {
        match self {
            Scheduler::Queue(queue) => Ok(queue),
            Scheduler::Radio(_) => Err(MusicError::RadioActive),
        }
    }

    pub fn queue_mut(&mut self) -> MusicResult<&mut QueueScheduler> {
        match self {
            Scheduler::Queue(queue) => Ok(queue),
            Scheduler::Radio(_) => Err(MusicError::RadioActive),
        }
    }

    pub fn station(&self) -> Option<&RadioStation> {
        match self {
            Scheduler::Radio(radio) => Some(radio.station()),
            Scheduler::Queue(_) => None,
        }
    }

    /// Decide what plays after the current audio ends. Radio streams never advance.
    pub fn advance(&mut self) -> Option<QueuedTrack> {
        match self {
            Scheduler::Queue(queue) => queue.advance(),
            Scheduler::Radio(_) => None,
        }
    }

    /// Advance until `open` accepts a track. Each track it rejects is skipped and tried at
    /// most once; when none is left to try the last error is returned.
    pub fn advance_playable<T>(
        &mut self,
        mut open: impl FnMut(&QueuedTrack) -> MusicResult<T>,
    ) -> MusicResult<Option<(QueuedTrack, T)>> {
        let mut attempts = self
            .queue()
            .map(|queue| queue.len() + usize::from(queue.current().is_some()))
            .unwrap_or(0);

        loop {
            let Some(next) = self.advance() else {
                return Ok(None);
            };
            match open(&next) {
                Ok(opened) => return Ok(Some((next, opened))),
                Err(e) => {
                    warn!("Skipping '{}': {}", next.metadata.title, e);
                    if let Ok(queue) = self.queue_mut() {
                        queue.skip();
                    }
                    attempts = attempts.saturating_sub(1);
                    if attempts == 0 {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Switch to radio mode. Refused while the queue has a track playing.
    pub fn start_radio(&mut self, station: RadioStation) -> MusicResult<()> {
        if let Scheduler::Queue(queue) = self {
            if queue.current().is_some() {
                return Err(MusicError::QueueActive);
            }
        }
        debug!("Switching scheduler to radio station '{}'", station.slug);
        *self = Scheduler::Radio(RadioScheduler::new(station));
        Ok(())
    }

    /// Leave radio mode, returning the station that was playing.
    pub fn stop_radio(&mut self) -> Option<RadioStation> {
        match std::mem::take(self) {
            Scheduler::Radio(radio) => Some(radio.station),
            queue => {
                *self = queue;
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RadioScheduler {
    station: RadioStation,
}

impl RadioScheduler {
    pub fn new(station: RadioStation) -> Self {
        Self { station }
    }

    pub fn station(&self) -> &RadioStation {
        &self.station
    }
}

/// Queue of upcoming tracks plus the repeat/loop/infinite playlist modes.
#[derive(Debug, Default)]
pub struct QueueScheduler {
    upcoming: VecDeque<QueuedTrack>,
    current: Option<QueuedTrack>,
    repeats_left: u32,
    looped: bool,
    infinite: bool,
}

impl QueueScheduler {
    /// Append a track, returning its 1-based position among upcoming tracks.
    pub fn push(&mut self, track: QueuedTrack, max_len: usize) -> MusicResult<usize> {
        if self.upcoming.len() >= max_len {
            return Err(MusicError::QueueFull(max_len));
        }
        self.upcoming.push_back(track);
        Ok(self.upcoming.len())
    }

    /// Move to the next track. The current track's loop wins over its repeat count, which
    /// wins over the infinite playlist, which wins over simply popping the front.
    pub fn advance(&mut self) -> Option<QueuedTrack> {
        if let Some(current) = &self.current {
            if self.looped {
                return Some(current.clone());
            }
            if self.repeats_left > 0 {
                self.repeats_left -= 1;
                return Some(current.clone());
            }
        }

        let finished = self.current.take();
        if self.infinite {
            if let Some(finished) = finished {
                self.upcoming.push_back(finished);
            }
        }

        self.current = self.upcoming.pop_front();
        self.current.clone()
    }

    /// Forget the current track's loop and repeat so the next `advance` moves on.
    pub fn skip(&mut self) -> Option<&QueuedTrack> {
        self.looped = false;
        self.repeats_left = 0;
        self.current.as_ref()
    }

    /// Arrange for the track at `position` (1-based) to play after the current one ends.
    /// Tracks in between are dropped, or rotated to the back with the infinite playlist on.
    pub fn skip_to(&mut self, position: usize) -> MusicResult<&QueuedTrack> {
        let index = self.index_of(position)?;
        self.skip();

        let passed: Vec<QueuedTrack> = self.upcoming.drain(..index).collect();
        if self.infinite {
            if let Some(current) = self.current.take() {
                self.upcoming.push_back(current);
            }
            self.upcoming.extend(passed);
        }

        self.upcoming
            .front()
            .ok_or(MusicError::InvalidPosition { position, len: 0 })
    }

    pub fn shuffle(&mut self) {
        self.upcoming.make_contiguous().shuffle(&mut rand::rng());
    }

    /// Drop every upcoming track, keeping the current one. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.upcoming.len();
        self.upcoming.clear();
        removed
    }

    /// Drop everything, including the current track and all playback modes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn remove(&mut self, position: usize) -> MusicResult<QueuedTrack> {
        let index = self.index_of(position)?;
        self.upcoming
            .remove(index)
            .ok_or(MusicError::InvalidPosition {
                position,
                len: self.upcoming.len(),
            })
    }

    pub fn move_track(&mut self, from: usize, to: usize) -> MusicResult<&QueuedTrack> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        let track = self
            .upcoming
            .remove(from_index)
            .ok_or(MusicError::InvalidPosition {
                position: from,
                len: self.upcoming.len(),
            })?;
        self.upcoming.insert(to_index, track);
        self.upcoming
            .get(to_index)
            .ok_or(MusicError::InvalidPosition {
                position: to,
                len: self.upcoming.len(),
            })
    }

    /// Remove every upcoming track requested by `user`. Returns how many were removed.
    pub fn remove_by_requester(&mut self, user: UserId) -> usize {
        let before = self.upcoming.len();
        self.upcoming.retain(|track| track.requester != user);
        before - self.upcoming.len()
    }

    pub fn set_repeat(&mut self, times: u32) -> MusicResult<()> {
        if self.current.is_none() {
            return Err(MusicError::NothingPlaying);
        }
        if !(1..=MAX_REPEATS).contains(&times) {
            return Err(MusicError::InvalidRepeat { max: MAX_REPEATS });
        }
        self.repeats_left = times;
        Ok(())
    }

    pub fn clear_repeat(&mut self) -> u32 {
        std::mem::take(&mut self.repeats_left)
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.looped = !self.looped;
        self.looped
    }

    pub fn toggle_infinite(&mut self) -> bool {
        self.infinite = !self.infinite;
        self.infinite
    }

    pub fn repeats_left(&self) -> u32 {
        self.repeats_left
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn current(&self) -> Option<&QueuedTrack> {
        self.current.as_ref()
    }

    pub fn upcoming(&self) -> impl ExactSizeIterator<Item = &QueuedTrack> {
        self.upcoming.iter()
    }

    pub fn len(&self) -> usize {
        self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty()
    }

    /// Sum of the known durations of upcoming tracks.
    pub fn total_duration(&self) -> Duration {
        self.upcoming
            .iter()
            .filter_map(|track| track.metadata.duration)
            .sum()
    }

    fn index_of(&self, position: usize) -> MusicResult<usize> {
        if position == 0 || position > self.upcoming.len() {
            return Err(MusicError::InvalidPosition {
                position,
                len: self.upcoming.len(),
            });
        }
        Ok(position - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::music::utils::audio_sources::TrackMetadata;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    const MAX: usize = 100;

    fn track(title: &str, requester: u64) -> QueuedTrack {
        QueuedTrack::new(
            TrackMetadata {
                title: title.to_string(),
                url: Some(format!("https://youtu.be/{}", title)),
                duration: Some(Duration::from_secs(60)),
                ..Default::default()
            },
            UserId::new(requester),
        )
    }

    fn titles(queue: &QueueScheduler) -> Vec<String> {
        queue
            .upcoming()
            .map(|track| track.metadata.title.clone())
            .collect()
    }

    fn current_title(queue: &QueueScheduler) -> Option<String> {
        queue.current().map(|track| track.metadata.title.clone())
    }

    #[fixture]
    fn queue() -> QueueScheduler {
        let mut queue = QueueScheduler::default();
        for (i, title) in ["a", "b", "c", "d"].into_iter().enumerate() {
            queue.push(track(title, (i % 2 + 1) as u64), MAX).unwrap();
        }
        queue
    }

    #[rstest]
    fn advance_pops_in_order(mut queue: QueueScheduler) {
        let played: Vec<String> = std::iter::from_fn(|| queue.advance())
            .map(|track| track.metadata.title)
            .collect();

        assert_eq!(played, vec!["a", "b", "c", "d"]);
        assert!(queue.current().is_none());
    }

    #[rstest]
    fn repeat_replays_current_then_moves_on(mut queue: QueueScheduler) {
        queue.advance();
        queue.set_repeat(2).unwrap();

        assert_eq!(queue.advance().unwrap().metadata.title, "a");
        assert_eq!(queue.advance().unwrap().metadata.title, "a");
        assert_eq!(queue.advance().unwrap().metadata.title, "b");
        assert_eq!(queue.repeats_left(), 0);
    }

    #[rstest]
    fn loop_wins_over_repeat_until_skipped(mut queue: QueueScheduler) {
        queue.advance();
        queue.set_repeat(1).unwrap();
        assert!(queue.toggle_loop());

        for _ in 0..5 {
            assert_eq!(queue.advance().unwrap().metadata.title, "a");
        }
        assert_eq!(queue.repeats_left(), 1);

        queue.skip();
        assert_eq!(queue.advance().unwrap().metadata.title, "b");
        assert!(!queue.is_looped());
    }

    #[rstest]
    fn infinite_playlist_recycles_finished_tracks(mut queue: QueueScheduler) {
        queue.toggle_infinite();
        let played: Vec<String> = (0..6)
            .filter_map(|_| queue.advance())
            .map(|track| track.metadata.title)
            .collect();

        assert_eq!(played, vec!["a", "b", "c", "d", "a", "b"]);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn infinite_playlist_with_single_track_replays_it() {
        let mut queue = QueueScheduler::default();
        queue.push(track("solo", 1), MAX).unwrap();
        queue.toggle_infinite();

        assert_eq!(queue.advance().unwrap().metadata.title, "solo");
        assert_eq!(queue.advance().unwrap().metadata.title, "solo");
    }

    #[rstest]
    fn skip_to_drops_tracks_in_between(mut queue: QueueScheduler) {
        queue.advance();
        let target = queue.skip_to(3).unwrap().metadata.title.clone();

        assert_eq!(target, "d");
        assert_eq!(queue.advance().unwrap().metadata.title, "d");
        assert!(queue.is_empty());
    }

    #[rstest]
    fn skip_to_rotates_with_infinite_playlist(mut queue: QueueScheduler) {
        queue.advance();
        queue.toggle_infinite();
        queue.skip_to(2).unwrap();

        assert_eq!(current_title(&queue), None);
        assert_eq!(titles(&queue), vec!["c", "d", "a", "b"]);
        assert_eq!(queue.advance().unwrap().metadata.title, "c");
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    fn positions_are_validated(mut queue: QueueScheduler, #[case] position: usize) {
        assert_matches!(
            queue.remove(position),
            Err(MusicError::InvalidPosition { len: 4, .. })
        );
        assert_matches!(queue.skip_to(position), Err(MusicError::InvalidPosition { .. }));
    }

    #[rstest]
    fn move_track_reorders(mut queue: QueueScheduler) {
        let moved = queue.move_track(4, 1).unwrap().metadata.title.clone();

        assert_eq!(moved, "d");
        assert_eq!(titles(&queue), vec!["d", "a", "b", "c"]);
    }

    #[rstest]
    fn remove_by_requester_keeps_others(mut queue: QueueScheduler) {
        assert_eq!(queue.remove_by_requester(UserId::new(1)), 2);
        assert_eq!(titles(&queue), vec!["b", "d"]);
    }

    #[rstest]
    fn clear_keeps_current(mut queue: QueueScheduler) {
        queue.advance();
        assert_eq!(queue.clear(), 3);
        assert_eq!(current_title(&queue).as_deref(), Some("a"));

        queue.reset();
        assert!(queue.current().is_none());
    }

    #[rstest]
    fn shuffle_keeps_every_track(mut queue: QueueScheduler) {
        queue.shuffle();
        let mut shuffled = titles(&queue);
        shuffled.sort();
        assert_eq!(shuffled, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn push_respects_capacity() {
        let mut queue = QueueScheduler::default();
        assert_eq!(queue.push(track("a", 1), 2).unwrap(), 1);
        assert_eq!(queue.push(track("b", 1), 2).unwrap(), 2);
        assert_matches!(queue.push(track("c", 1), 2), Err(MusicError::QueueFull(2)));
    }

    #[rstest]
    fn repeat_requires_current_and_range(mut queue: QueueScheduler) {
        assert_matches!(queue.set_repeat(1), Err(MusicError::NothingPlaying));
        queue.advance();
        assert_matches!(queue.set_repeat(0), Err(MusicError::InvalidRepeat { .. }));
        assert_matches!(
            queue.set_repeat(MAX_REPEATS + 1),
            Err(MusicError::InvalidRepeat { .. })
        );
        queue.set_repeat(3).unwrap();
        assert_eq!(queue.clear_repeat(), 3);
    }

    #[rstest]
    fn total_duration_sums_upcoming(queue: QueueScheduler) {
        assert_eq!(queue.total_duration(), Duration::from_secs(240));
    }

    fn station() -> RadioStation {
        RadioStation {
            slug: "jazz".to_string(),
            name: "Jazz".to_string(),
            stream_url: "https://example.com/jazz".to_string(),
            website: None,
        }
    }

    #[test]
    fn radio_refused_while_queue_plays() {
        let mut scheduler = Scheduler::default();
        scheduler.queue_mut().unwrap().push(track("a", 1), MAX).unwrap();
        scheduler.advance();

        assert_matches!(scheduler.start_radio(station()), Err(MusicError::QueueActive));
        assert_eq!(scheduler.kind(), SchedulerKind::Queue);
    }

    #[test]
    fn radio_switches_and_blocks_queue() {
        let mut scheduler = Scheduler::default();
        scheduler.start_radio(station()).unwrap();

        assert!(scheduler.is_radio());
        assert_eq!(scheduler.station().map(|s| s.slug.as_str()), Some("jazz"));
        assert_matches!(scheduler.queue(), Err(MusicError::RadioActive));
        assert!(scheduler.advance().is_none());

        assert_eq!(scheduler.stop_radio().map(|s| s.slug), Some("jazz".to_string()));
        assert_eq!(scheduler.kind(), SchedulerKind::Queue);
        assert!(scheduler.queue().unwrap().is_empty());
    }

    #[test]
    fn stop_radio_on_queue_is_noop() {
        let mut scheduler = Scheduler::default();
        scheduler.queue_mut().unwrap().push(track("a", 1), MAX).unwrap();

        assert!(scheduler.stop_radio().is_none());
        assert_eq!(scheduler.queue().unwrap().len(), 1);
    }

    fn open_unless_broken(track: &QueuedTrack) -> MusicResult<String> {
        if track.metadata.title.starts_with("broken") {
            Err(MusicError::AudioSourceError(track.metadata.title.clone()))
        } else {
            Ok(track.metadata.title.clone())
        }
    }

    #[test]
    fn advance_playable_skips_broken_track() {
        let mut scheduler = Scheduler::default();
        let queue = scheduler.queue_mut().unwrap();
        queue.push(track("broken", 1), MAX).unwrap();
        queue.push(track("good", 1), MAX).unwrap();

        let (next, opened) = scheduler
            .advance_playable(open_unless_broken)
            .unwrap()
            .unwrap();

        assert_eq!(next.metadata.title, "good");
        assert_eq!(opened, "good");
        assert!(scheduler.queue().unwrap().is_empty());
    }

    #[test]
    fn advance_playable_drops_loop_of_broken_track() {
        let mut scheduler = Scheduler::default();
        let queue = scheduler.queue_mut().unwrap();
        queue.push(track("broken", 1), MAX).unwrap();
        queue.push(track("good", 1), MAX).unwrap();
        queue.advance();
        queue.toggle_loop();

        let (next, _) = scheduler
            .advance_playable(open_unless_broken)
            .unwrap()
            .unwrap();

        assert_eq!(next.metadata.title, "good");
        assert!(!scheduler.queue().unwrap().is_looped());
    }

    #[test]
    fn advance_playable_tries_each_broken_track_once() {
        let mut scheduler = Scheduler::default();
        let queue = scheduler.queue_mut().unwrap();
        for title in ["broken-a", "broken-b", "broken-c"] {
            queue.push(track(title, 1), MAX).unwrap();
        }
        queue.toggle_infinite();

        let mut tried = Vec::new();
        let result = scheduler.advance_playable(|track| {
            tried.push(track.metadata.title.clone());
            open_unless_broken(track)
        });

        assert_matches!(result, Err(MusicError::AudioSourceError(_)));
        assert_eq!(tried, vec!["broken-a", "broken-b", "broken-c"]);
    }

    #[test]
    fn advance_playable_on_empty_queue_is_none() {
        let mut scheduler = Scheduler::default();
        let mut opened = false;

        let result = scheduler.advance_playable(|_| {
            opened = true;
            Ok(())
        });

        assert_matches!(result, Ok(None));
        assert!(!opened);
    }
}
