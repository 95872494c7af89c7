//! Date adapter - the calendar capability the widget depends on
//!
//! The widget never talks to a date library directly. Everything it needs
//! (the current time, text formatting and parsing, locale labels) goes
//! through [`DateAdapter`], so a host can swap in its own locale data or a
//! pinned clock.

use chrono::NaiveDateTime;

use crate::format::{ParseError, Pattern};
use crate::locale::Locale;

/// Calendar capability interface
pub trait DateAdapter: Send + Sync {
    /// Current local date-time
    fn now(&self) -> NaiveDateTime;

    /// Locale labels used for formatting and rendering
    fn locale(&self) -> &Locale;

    /// Format `value` with a moment-style pattern
    fn format(&self, value: &NaiveDateTime, pattern: &str) -> String {
        Pattern::compile(pattern).format(value, self.locale())
    }

    /// Parse `text` strictly against a moment-style pattern
    fn parse_strict(&self, text: &str, pattern: &str) -> Result<NaiveDateTime, ParseError> {
        Pattern::compile(pattern).parse_strict(text, self.locale(), &self.now())
    }

    /// Twelve month labels, January first
    fn month_names(&self) -> Vec<String> {
        self.locale().months.clone()
    }

    /// Seven short weekday labels, Sunday first
    fn weekday_names_short(&self) -> Vec<String> {
        self.locale().weekdays_short.clone()
    }

    /// First day of the week, 0 = Sunday
    fn first_day_of_week(&self) -> u8 {
        self.locale().first_day_of_week
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Clock {
    System,
    Fixed(NaiveDateTime),
}

/// Default adapter backed by `chrono`
#[derive(Clone, Debug)]
pub struct ChronoAdapter {
    locale: Locale,
    clock: Clock,
}

impl ChronoAdapter {
    /// English locale, system clock
    pub fn new() -> Self {
        Self {
            locale: Locale::english(),
            clock: Clock::System,
        }
    }

    /// English locale with a pinned clock
    pub fn fixed(now: NaiveDateTime) -> Self {
        Self {
            locale: Locale::english(),
            clock: Clock::Fixed(now),
        }
    }

    /// Replace the locale
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

impl Default for ChronoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DateAdapter for ChronoAdapter {
    fn now(&self) -> NaiveDateTime {
        match self.clock {
            Clock::System => chrono::Local::now().naive_local(),
            Clock::Fixed(now) => now,
        }
    }

    fn locale(&self) -> &Locale {
        &self.locale
    }
}
