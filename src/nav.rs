use std::{
    ops::Range,
    time::{Duration, Instant},
};

pub const DEFAULT_VISIBLE_ROWS: usize = 25;
pub const DEFAULT_REPEAT_DELAY_MS: u64 = 300;
pub const DEFAULT_REPEAT_RATE_MS: u64 = 30;

pub const MOD_COLUMN: usize = 0;
pub const RATING_COLUMN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn delta(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Where a held direction came from. A release only clears a hold started
/// by the same source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Keyboard,
    Hat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Press(Direction, Source),
    Release(Direction, Source),
    /// One move with no hold, for terminals that never report key release.
    Step(Direction),
    Column(usize),
    Page(isize),
    Home,
    End,
    Activate,
    Hat { x: i8, y: i8 },
    Button(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Launch(usize),
    CycleRating(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub delay: Duration,
    pub rate: Duration,
}

impl RepeatTiming {
    pub fn from_millis(delay_ms: u64, rate_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            rate: Duration::from_millis(rate_ms),
        }
    }
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self::from_millis(DEFAULT_REPEAT_DELAY_MS, DEFAULT_REPEAT_RATE_MS)
    }
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    direction: Direction,
    source: Source,
    since: Instant,
    last_repeat: Instant,
}

/// Selection and scroll state for the two-column mod list.
///
/// Invariant: `scroll_offset <= selected_row < scroll_offset + visible_rows`
/// whenever the list is non-empty.
#[derive(Debug, Clone)]
pub struct Navigator {
    len: usize,
    selected_row: usize,
    selected_col: usize,
    scroll_offset: usize,
    visible_rows: usize,
    timing: RepeatTiming,
    held: Option<Hold>,
}

impl Navigator {
    pub fn new(len: usize, initial_row: usize, visible_rows: usize, timing: RepeatTiming) -> Self {
        let visible_rows = visible_rows.max(1);
        let selected_row = initial_row.min(len.saturating_sub(1));
        let mut nav = Self {
            len,
            selected_row,
            selected_col: MOD_COLUMN,
            scroll_offset: (selected_row + 1).saturating_sub(visible_rows),
            visible_rows,
            timing,
            held: None,
        };
        nav.clamp_scroll();
        nav
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn selected_col(&self) -> usize {
        self.selected_col
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    #[allow(dead_code)]
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.scroll_offset + self.visible_rows).min(self.len);
        self.scroll_offset..end
    }

    #[allow(dead_code)]
    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn set_visible_rows(&mut self, rows: usize) {
        let rows = rows.max(1);
        if rows == self.visible_rows {
            return;
        }
        self.visible_rows = rows;
        self.clamp_scroll();
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.len == 0 {
            return;
        }
        let last = self.len as isize - 1;
        let target = (self.selected_row as isize).saturating_add(delta).clamp(0, last);
        self.selected_row = target as usize;
        self.clamp_scroll();
    }

    pub fn page(&mut self, pages: isize) {
        self.move_by(pages.saturating_mul(self.visible_rows as isize));
    }

    pub fn home(&mut self) {
        self.move_by(isize::MIN);
    }

    pub fn end(&mut self) {
        self.move_by(isize::MAX);
    }

    pub fn set_column(&mut self, col: usize) {
        self.selected_col = col.min(RATING_COLUMN);
    }

    pub fn activate(&self) -> Option<Action> {
        if self.len == 0 {
            return None;
        }
        Some(if self.selected_col == MOD_COLUMN {
            Action::Launch(self.selected_row)
        } else {
            Action::CycleRating(self.selected_row)
        })
    }

    pub fn press(&mut self, direction: Direction, source: Source, now: Instant) {
        self.move_by(direction.delta());
        self.held = Some(Hold {
            direction,
            source,
            since: now,
            last_repeat: now,
        });
    }

    pub fn release(&mut self, direction: Direction, source: Source) {
        if let Some(hold) = self.held {
            if hold.source == source && hold.direction == direction {
                self.held = None;
            }
        }
    }

    fn release_source(&mut self, source: Source) {
        if self.held.is_some_and(|hold| hold.source == source) {
            self.held = None;
        }
    }

    /// Repeats the held direction once the delay has passed, at most one
    /// step per call.
    pub fn tick(&mut self, now: Instant) {
        let Some(mut hold) = self.held else {
            return;
        };
        if now.saturating_duration_since(hold.since) < self.timing.delay {
            return;
        }
        if now.saturating_duration_since(hold.last_repeat) < self.timing.rate {
            return;
        }
        self.move_by(hold.direction.delta());
        hold.last_repeat = now;
        self.held = Some(hold);
    }

    pub fn handle(&mut self, input: Input, now: Instant) -> Option<Action> {
        match input {
            Input::Press(direction, source) => self.press(direction, source, now),
            Input::Release(direction, source) => self.release(direction, source),
            Input::Step(direction) => self.move_by(direction.delta()),
            Input::Column(col) => self.set_column(col),
            Input::Page(pages) => self.page(pages),
            Input::Home => self.home(),
            Input::End => self.end(),
            Input::Activate => return self.activate(),
            Input::Hat { x, y } => self.handle_hat(x, y, now),
            Input::Button(button) => return self.handle_button(button),
        }
        None
    }

    fn handle_hat(&mut self, x: i8, y: i8, now: Instant) {
        let direction = match y.signum() {
            1 => Some(Direction::Up),
            -1 => Some(Direction::Down),
            _ => None,
        };
        match direction {
            Some(direction) => {
                let already_held = self
                    .held
                    .is_some_and(|hold| hold.source == Source::Hat && hold.direction == direction);
                if !already_held {
                    self.press(direction, Source::Hat, now);
                }
            }
            None => self.release_source(Source::Hat),
        }
        match x.signum() {
            -1 => self.set_column(MOD_COLUMN),
            1 => self.set_column(RATING_COLUMN),
            _ => {}
        }
    }

    fn handle_button(&mut self, button: u8) -> Option<Action> {
        match button {
            0 => return self.activate(),
            4 => self.page(-1),
            5 => self.page(1),
            _ => {}
        }
        None
    }

    fn clamp_scroll(&mut self) {
        if self.selected_row < self.scroll_offset {
            self.scroll_offset = self.selected_row;
        } else if self.selected_row >= self.scroll_offset + self.visible_rows {
            self.scroll_offset = self.selected_row + 1 - self.visible_rows;
        }
        self.scroll_offset = self
            .scroll_offset
            .min(self.len.saturating_sub(self.visible_rows));
    }
}
