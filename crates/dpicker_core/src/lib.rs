//! dpicker core
//!
//! Foundational pieces shared by the virtual tree and the widget crates:
//!
//! - **Date adapter**: the calendar capability interface and a `chrono` backed default
//! - **Formats**: moment-style patterns (`DD/MM/YYYY`) with strict parsing
//! - **Calendar arithmetic**: clamped field setters and granular comparisons
//! - **Events**: event type and key code constants
//!
//! # Example
//!
//! ```rust
//! use dpicker_core::{ChronoAdapter, DateAdapter};
//!
//! let adapter = ChronoAdapter::new();
//! let value = adapter.parse_strict("31/12/2020", "DD/MM/YYYY").unwrap();
//! assert_eq!(adapter.format(&value, "YYYY-MM-DD"), "2020-12-31");
//! ```

pub mod adapter;
pub mod calendar;
pub mod events;
pub mod format;
pub mod locale;

pub use adapter::{ChronoAdapter, DateAdapter};
pub use calendar::Granularity;
pub use events::{event_name, event_type_from_name, event_types, key_codes, EventType, KeyCode};
pub use format::{ParseError, Pattern, Token};
pub use locale::Locale;

// Re-export so downstream crates name the same date type
pub use chrono::{NaiveDate, NaiveDateTime};
