//! The dynamic ranking animation.
//!
//! `RankAnimator` never sleeps or spawns. Its owner feeds it the current
//! time through [`RankAnimator::poll`], and the animator advances at most
//! one frame per poll when its deadline has passed. The only tick source
//! is the `ticker` field, so starting twice replaces the deadline instead
//! of adding a second timer.
//!
//! Two flags are kept apart:
//! - `playing`: the user pressed play and has not paused
//! - `ticker`: a deadline is armed right now
//!
//! Hovering the chart disarms the ticker but leaves `playing` alone, so
//! moving the pointer away resumes only what the user had running.

use aqv_data::ranking::RankSnapshot;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticker {
    next: Duration,
}

#[derive(Debug, Clone)]
pub struct RankAnimator {
    snapshots: Vec<RankSnapshot>,
    current: usize,
    interval: Duration,
    ticker: Option<Ticker>,
    playing: bool,
    hovered: bool,
}

impl RankAnimator {
    pub fn new(interval: Duration) -> Self {
        Self {
            snapshots: Vec::new(),
            current: 0,
            interval,
            ticker: None,
            playing: false,
            hovered: false,
        }
    }

    pub fn snapshots(&self) -> &[RankSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the visible frame.
    pub fn index(&self) -> usize {
        self.current
    }

    /// The visible frame; `None` when there are no snapshots.
    pub fn current_frame(&self) -> Option<&RankSnapshot> {
        self.snapshots.get(self.current)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A deadline is armed.
    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// The user intends the animation to play.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Arm the tick source, replacing any existing one.
    pub fn start(&mut self, now: Duration) {
        if self.ticker.is_some() {
            log::debug!("[AQV] animator: restarting tick source");
        }
        self.ticker = Some(Ticker {
            next: now + self.interval,
        });
    }

    /// Cancel the tick source. No-op when idle.
    pub fn stop(&mut self) {
        self.ticker = None;
    }

    /// Play button: record the intent and start ticking unless hovered.
    pub fn play(&mut self, now: Duration) {
        self.playing = true;
        if !self.hovered {
            self.start(now);
        }
    }

    /// Pause button: stop and drop the intent.
    pub fn pause(&mut self) {
        self.playing = false;
        self.stop();
    }

    pub fn toggle(&mut self, now: Duration) {
        if self.playing {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Stop and rewind to the first frame.
    pub fn reset(&mut self) {
        self.pause();
        self.current = 0;
    }

    /// Change the frame interval, restarting the deadline if running.
    pub fn set_interval(&mut self, now: Duration, interval: Duration) {
        self.interval = interval;
        if self.is_running() {
            self.start(now);
        }
    }

    /// Replace the snapshots after a region, pollutant, order or top-N
    /// change. The index rewinds to 0; a running animation keeps running
    /// from the new first frame.
    pub fn reconfigure(&mut self, now: Duration, snapshots: Vec<RankSnapshot>) {
        log::debug!("[AQV] animator: reconfigured with {} frames", snapshots.len());
        self.snapshots = snapshots;
        self.current = 0;
        if self.is_running() {
            self.start(now);
        }
    }

    pub fn pointer_enter(&mut self) {
        self.hovered = true;
        self.stop();
    }

    pub fn pointer_leave(&mut self, now: Duration) {
        self.hovered = false;
        if self.playing && !self.is_running() {
            self.start(now);
        }
    }

    /// Advance one frame, wrapping at the end.
    pub fn tick(&mut self) -> Option<&RankSnapshot> {
        if self.snapshots.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.snapshots.len();
        self.snapshots.get(self.current)
    }

    /// Advance when the deadline has passed. Returns the new frame index.
    ///
    /// A poll that arrives more than one interval late still advances only
    /// once; the next deadline is then measured from `now`.
    pub fn poll(&mut self, now: Duration) -> Option<usize> {
        let ticker = self.ticker.as_mut()?;
        if now < ticker.next {
            return None;
        }
        ticker.next += self.interval;
        if ticker.next <= now {
            ticker.next = now + self.interval;
        }
        self.tick()?;
        log::debug!("[AQV] animator: frame {}/{}", self.current + 1, self.snapshots.len());
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqv_data::ranking::RankEntry;

    fn frames(n: usize) -> Vec<RankSnapshot> {
        (0..n)
            .map(|i| RankSnapshot {
                label: format!("2025-{:02}", i + 1),
                entries: vec![RankEntry {
                    city: "沈阳".to_string(),
                    value: i as f64,
                    rank: 1,
                }],
            })
            .collect()
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn animator(n: usize) -> RankAnimator {
        let mut a = RankAnimator::new(ms(1000));
        a.reconfigure(ms(0), frames(n));
        a
    }

    fn count_ticks(a: &mut RankAnimator, until: u64) -> usize {
        (0..=until).filter(|t| a.poll(ms(*t)).is_some()).count()
    }

    #[test]
    fn test_restart_keeps_single_tick_source() {
        let mut a = animator(12);
        a.start(ms(0));
        a.start(ms(0));
        assert_eq!(count_ticks(&mut a, 10_000), 10);

        let mut b = animator(12);
        b.start(ms(0));
        b.start(ms(500));
        assert_eq!(count_ticks(&mut b, 10_000), 9);
    }

    #[test]
    fn test_tick_wraps_around() {
        let mut a = animator(3);
        assert_eq!(a.tick().unwrap().label, "2025-02");
        a.tick();
        assert_eq!(a.tick().unwrap().label, "2025-01");
        assert_eq!(a.index(), 0);
    }

    #[test]
    fn test_empty_snapshots_never_advance() {
        let mut a = animator(0);
        a.play(ms(0));
        assert!(a.tick().is_none());
        assert_eq!(count_ticks(&mut a, 3000), 0);
        assert!(a.current_frame().is_none());
    }

    #[test]
    fn test_late_poll_advances_once() {
        let mut a = animator(12);
        a.start(ms(0));
        assert_eq!(a.poll(ms(5500)), Some(1));
        assert_eq!(a.poll(ms(5600)), None);
        assert_eq!(a.poll(ms(6500)), Some(2));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut a = animator(4);
        a.stop();
        a.start(ms(0));
        a.stop();
        a.stop();
        assert!(!a.is_running());
        assert_eq!(count_ticks(&mut a, 5000), 0);
    }

    #[test]
    fn test_hover_pauses_and_resumes_only_with_intent() {
        let mut a = animator(12);
        a.play(ms(0));
        a.pointer_enter();
        assert!(!a.is_running());
        assert!(a.is_playing());
        a.pointer_leave(ms(100));
        assert!(a.is_running());
        assert_eq!(a.poll(ms(1100)), Some(1));

        let mut idle = animator(12);
        idle.pointer_enter();
        idle.pointer_leave(ms(0));
        assert!(!idle.is_running());
    }

    #[test]
    fn test_play_while_hovered_waits_for_pointer_leave() {
        let mut a = animator(12);
        a.pointer_enter();
        a.play(ms(0));
        assert!(!a.is_running());
        a.pointer_leave(ms(10));
        assert!(a.is_running());
    }

    #[test]
    fn test_reset_rewinds_and_stops() {
        let mut a = animator(12);
        a.play(ms(0));
        a.poll(ms(1000));
        a.poll(ms(2000));
        assert_eq!(a.index(), 2);
        a.reset();
        assert_eq!(a.index(), 0);
        assert!(!a.is_playing());
        assert!(!a.is_running());
    }

    #[test]
    fn test_speed_change_restarts_running_timer() {
        let mut a = animator(12);
        a.play(ms(0));
        a.set_interval(ms(500), ms(3000));
        assert_eq!(a.poll(ms(1000)), None);
        assert_eq!(a.poll(ms(3500)), Some(1));

        let mut idle = animator(12);
        idle.set_interval(ms(0), ms(3000));
        assert!(!idle.is_running());
        assert_eq!(idle.interval(), ms(3000));
    }

    #[test]
    fn test_reconfigure_resets_index_and_keeps_playing() {
        let mut a = animator(12);
        a.play(ms(0));
        a.poll(ms(1000));
        a.reconfigure(ms(1200), frames(5));
        assert_eq!(a.index(), 0);
        assert_eq!(a.len(), 5);
        assert!(a.is_running());
        assert_eq!(a.poll(ms(2000)), None);
        assert_eq!(a.poll(ms(2200)), Some(1));
    }

    #[test]
    fn test_toggle() {
        let mut a = animator(2);
        a.toggle(ms(0));
        assert!(a.is_playing() && a.is_running());
        a.toggle(ms(10));
        assert!(!a.is_playing() && !a.is_running());
    }
}
