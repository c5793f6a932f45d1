//! Banner carousel state.
//!
//! Time is fed in through [`Carousel::tick`] rather than read from a
//! clock, so the same machine drives a terminal walk-through, a GUI
//! frame loop, or a test.

use std::ops::Range;
use std::time::Duration;

use crate::config::CarouselConfig;

/// Which way the last slide change moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Still,
    Forward,
    Backward,
}

impl Direction {
    pub fn as_i8(&self) -> i8 {
        match self {
            Self::Still => 0,
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Carousel<T> {
    items: Vec<T>,
    index: usize,
    direction: Direction,
    playing: bool,
    elapsed: Duration,
    interval: Duration,
    drag_threshold: f32,
    max_dots: usize,
    /// Pointer x where the current drag started.
    drag_start: Option<f32>,
}

impl<T> Carousel<T> {
    pub fn new(items: Vec<T>, config: &CarouselConfig) -> Self {
        Self {
            items,
            index: 0,
            direction: Direction::Still,
            playing: true,
            elapsed: Duration::ZERO,
            interval: Duration::from_secs(config.auto_advance_secs),
            drag_threshold: config.drag_threshold.abs(),
            max_dots: config.max_dots,
            drag_start: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.index)
    }

    /// Indices that get a pager dot.
    pub fn dots(&self) -> Range<usize> {
        0..self.items.len().min(self.max_dots)
    }

    // ── Navigation ──────────────────────────────────────────────

    pub fn next(&mut self) {
        if self.step_forward() {
            self.elapsed = Duration::ZERO;
        }
    }

    pub fn prev(&mut self) {
        if self.is_empty() {
            return;
        }
        self.index = if self.index == 0 {
            self.items.len() - 1
        } else {
            self.index - 1
        };
        self.direction = Direction::Backward;
        self.elapsed = Duration::ZERO;
    }

    /// Jump to a slide. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        self.direction = if index > self.index {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.index = index;
        self.elapsed = Duration::ZERO;
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    /// Advance the auto-play clock, returning how many slides it moved.
    pub fn tick(&mut self, dt: Duration) -> usize {
        if !self.playing || self.is_empty() || self.interval.is_zero() {
            return 0;
        }
        self.elapsed += dt;
        let mut advanced = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.step_forward();
            advanced += 1;
        }
        advanced
    }

    fn step_forward(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.index = (self.index + 1) % self.items.len();
        self.direction = Direction::Forward;
        true
    }

    // ── Dragging ────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f32) {
        self.drag_start = Some(x);
    }

    /// Follow the pointer. Crossing the threshold flips one slide and
    /// ends the drag; the returned direction says which way.
    pub fn pointer_move(&mut self, x: f32) -> Option<Direction> {
        let start = self.drag_start?;
        let flipped = self.flip_for(x - start);
        if flipped.is_some() {
            self.drag_start = None;
        }
        flipped
    }

    pub fn pointer_up(&mut self) {
        self.drag_start = None;
    }

    pub fn pointer_leave(&mut self) {
        self.drag_start = None;
    }

    /// Apply a released swipe gesture's total horizontal offset.
    pub fn drag_end(&mut self, offset: f32) -> Option<Direction> {
        self.drag_start = None;
        self.flip_for(offset)
    }

    fn flip_for(&mut self, walk: f32) -> Option<Direction> {
        if walk > self.drag_threshold {
            self.prev();
            Some(Direction::Backward)
        } else if walk < -self.drag_threshold {
            self.next();
            Some(Direction::Forward)
        } else {
            None
        }
    }

    /// Swap in a new item list, keeping the index in range.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.index >= self.items.len() {
            self.index = self.items.len().saturating_sub(1);
        }
        self.drag_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(n: usize) -> Carousel<usize> {
        Carousel::new((0..n).collect(), &CarouselConfig::default())
    }

    const INTERVAL: Duration = Duration::from_secs(30);

    #[test]
    fn test_next_and_prev_wrap() {
        let mut c = carousel(3);
        assert_eq!(c.direction(), Direction::Still);
        c.next();
        c.next();
        assert_eq!(c.index(), 2);
        c.next();
        assert_eq!(c.index(), 0);
        assert_eq!(c.direction(), Direction::Forward);

        c.prev();
        assert_eq!(c.index(), 2);
        assert_eq!(c.direction(), Direction::Backward);
        assert_eq!(c.direction().as_i8(), -1);
    }

    #[test]
    fn test_empty_carousel_is_inert() {
        let mut c = carousel(0);
        c.next();
        c.prev();
        c.select(0);
        assert_eq!(c.tick(INTERVAL * 3), 0);
        assert_eq!(c.pointer_move(10.0), None);
        assert!(c.current().is_none());
        assert_eq!(c.dots(), 0..0);
    }

    #[test]
    fn test_select_sets_direction() {
        let mut c = carousel(5);
        c.select(3);
        assert_eq!(c.index(), 3);
        assert_eq!(c.direction(), Direction::Forward);
        c.select(1);
        assert_eq!(c.direction(), Direction::Backward);
        c.select(1);
        assert_eq!(c.direction(), Direction::Backward);

        c.select(9);
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn test_tick_auto_advances() {
        let mut c = carousel(3);
        assert_eq!(c.tick(Duration::from_secs(29)), 0);
        assert_eq!(c.tick(Duration::from_secs(1)), 1);
        assert_eq!(c.index(), 1);

        assert_eq!(c.tick(INTERVAL * 2 + Duration::from_secs(5)), 2);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_manual_navigation_resets_timer() {
        let mut c = carousel(3);
        c.tick(Duration::from_secs(25));
        c.next();
        assert_eq!(c.tick(Duration::from_secs(25)), 0);
        assert_eq!(c.index(), 1);
        assert_eq!(c.tick(Duration::from_secs(5)), 1);
        assert_eq!(c.index(), 2);
    }

    #[test]
    fn test_paused_does_not_advance() {
        let mut c = carousel(3);
        c.toggle_play();
        assert!(!c.is_playing());
        assert_eq!(c.tick(INTERVAL * 4), 0);
        assert_eq!(c.index(), 0);

        c.toggle_play();
        assert_eq!(c.tick(INTERVAL), 1);
    }

    #[test]
    fn test_zero_interval_never_advances() {
        let config = CarouselConfig {
            auto_advance_secs: 0,
            ..Default::default()
        };
        let mut c = Carousel::new(vec![1, 2], &config);
        assert_eq!(c.tick(Duration::from_secs(100)), 0);
    }

    #[test]
    fn test_drag_past_threshold_flips_once() {
        let mut c = carousel(4);
        c.pointer_down(100.0);
        assert_eq!(c.pointer_move(130.0), None);
        assert!(c.is_dragging());

        // Dragging right goes back.
        assert_eq!(c.pointer_move(151.0), Some(Direction::Backward));
        assert_eq!(c.index(), 3);
        assert!(!c.is_dragging());

        // The drag ended; further moves do nothing.
        assert_eq!(c.pointer_move(300.0), None);
        assert_eq!(c.index(), 3);
    }

    #[test]
    fn test_drag_left_goes_forward() {
        let mut c = carousel(4);
        c.pointer_down(200.0);
        assert_eq!(c.pointer_move(120.0), Some(Direction::Forward));
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut c = carousel(4);
        assert_eq!(c.pointer_move(500.0), None);
        c.pointer_down(0.0);
        c.pointer_leave();
        assert_eq!(c.pointer_move(500.0), None);
        c.pointer_down(0.0);
        c.pointer_up();
        assert_eq!(c.pointer_move(-500.0), None);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_drag_end_uses_threshold() {
        let mut c = carousel(4);
        assert_eq!(c.drag_end(50.0), None);
        assert_eq!(c.drag_end(-50.5), Some(Direction::Forward));
        assert_eq!(c.index(), 1);
        assert_eq!(c.drag_end(80.0), Some(Direction::Backward));
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_replace_items_clamps_index() {
        let mut c = carousel(5);
        c.select(4);
        c.replace_items(vec![10, 20]);
        assert_eq!(c.index(), 1);
        assert_eq!(c.current(), Some(&20));

        c.replace_items(Vec::new());
        assert_eq!(c.index(), 0);
        assert!(c.current().is_none());
    }

    #[test]
    fn test_dots_capped() {
        assert_eq!(carousel(3).dots(), 0..3);
        assert_eq!(carousel(12).dots(), 0..5);
    }
}
