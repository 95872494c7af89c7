//! Moment-style date patterns
//!
//! Patterns such as `DD/MM/YYYY` or `YYYY-MM-DD HH:mm` are compiled into a
//! token list once and can then both format and strictly parse values.
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `YYYY` / `YY` | four / two digit year |
//! | `MMMM` / `MMM` | full / short month name |
//! | `MM` / `M` | month number, padded / unpadded |
//! | `DD` / `D` | day of month, padded / unpadded |
//! | `HH` / `H` | 24 hour clock, padded / unpadded |
//! | `hh` / `h` | 12 hour clock, padded / unpadded |
//! | `mm` / `m` | minutes |
//! | `ss` / `s` | seconds |
//! | `A` / `a` | `AM`/`PM`, `am`/`pm` |
//!
//! Text inside `[...]` and any other character is copied literally.
//!
//! # Example
//!
//! ```rust
//! use dpicker_core::format::Pattern;
//! use dpicker_core::locale::Locale;
//! use chrono::NaiveDate;
//!
//! let pattern = Pattern::compile("DD/MM/YYYY");
//! let locale = Locale::english();
//! let now = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!
//! let value = pattern.parse_strict("31/12/2020", &locale, &now).unwrap();
//! assert_eq!(pattern.format(&value, &locale), "31/12/2020");
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

use crate::locale::Locale;

/// Errors produced by strict parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing to parse
    #[error("input is empty")]
    Empty,

    /// Input ended before the pattern was complete
    #[error("input ended while expecting {0}")]
    UnexpectedEnd(&'static str),

    /// Input did not match a literal or a numeric field
    #[error("expected {expected} at offset {offset}")]
    Mismatch { expected: String, offset: usize },

    /// A numeric field was out of its allowed range
    #[error("invalid {field}: {value}")]
    InvalidNumber { field: &'static str, value: u32 },

    /// The pattern was satisfied but input remained
    #[error("unexpected trailing input at offset {0}")]
    TrailingInput(usize),

    /// All fields parsed but do not name a calendar date
    #[error("{year:04}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// No month name matched
    #[error("unknown month name at offset {0}")]
    UnknownMonth(usize),
}

/// A single pattern element
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Year4,
    Year2,
    MonthName,
    MonthShort,
    Month2,
    Month,
    Day2,
    Day,
    Hour24Pad,
    Hour24,
    Hour12Pad,
    Hour12,
    Minute2,
    Minute,
    Second2,
    Second,
    MeridiemUpper,
    MeridiemLower,
    Literal(String),
}

/// Longest tokens first so `MMMM` wins over `MM`.
const TOKEN_TABLE: &[(&str, Token)] = &[
    ("YYYY", Token::Year4),
    ("YY", Token::Year2),
    ("MMMM", Token::MonthName),
    ("MMM", Token::MonthShort),
    ("MM", Token::Month2),
    ("M", Token::Month),
    ("DD", Token::Day2),
    ("D", Token::Day),
    ("HH", Token::Hour24Pad),
    ("H", Token::Hour24),
    ("hh", Token::Hour12Pad),
    ("h", Token::Hour12),
    ("mm", Token::Minute2),
    ("m", Token::Minute),
    ("ss", Token::Second2),
    ("s", Token::Second),
    ("A", Token::MeridiemUpper),
    ("a", Token::MeridiemLower),
];

/// A compiled moment-style pattern
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: SmallVec<[Token; 8]>,
}

impl Pattern {
    /// Compile a pattern. Compilation never fails: unknown characters are literals.
    pub fn compile(source: &str) -> Self {
        let mut tokens: SmallVec<[Token; 8]> = SmallVec::new();
        let mut rest = source;

        while !rest.is_empty() {
            if let Some(escaped) = rest.strip_prefix('[') {
                let (literal, remainder) = match escaped.find(']') {
                    Some(end) => (&escaped[..end], &escaped[end + 1..]),
                    None => (escaped, ""),
                };
                push_literal(&mut tokens, literal);
                rest = remainder;
                continue;
            }

            if let Some((text, token)) = TOKEN_TABLE.iter().find(|(text, _)| rest.starts_with(text))
            {
                tokens.push(token.clone());
                rest = &rest[text.len()..];
                continue;
            }

            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                push_literal(&mut tokens, c.encode_utf8(&mut [0; 4]));
            }
            rest = chars.as_str();
        }

        trace!(pattern = source, tokens = tokens.len(), "compiled date pattern");
        Self {
            source: source.to_string(),
            tokens,
        }
    }

    /// The pattern text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled tokens
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether the pattern carries any time-of-day field
    pub fn has_time(&self) -> bool {
        self.tokens.iter().any(|t| {
            matches!(
                t,
                Token::Hour24Pad
                    | Token::Hour24
                    | Token::Hour12Pad
                    | Token::Hour12
                    | Token::Minute2
                    | Token::Minute
            )
        })
    }

    /// Render `value` with this pattern.
    pub fn format(&self, value: &NaiveDateTime, locale: &Locale) -> String {
        let mut out = String::with_capacity(self.source.len() + 4);
        let month0 = value.month0() as usize;
        let hour12 = match value.hour() % 12 {
            0 => 12,
            h => h,
        };

        for token in &self.tokens {
            match token {
                Token::Year4 => out.push_str(&format!("{:04}", value.year())),
                Token::Year2 => out.push_str(&format!("{:02}", value.year().rem_euclid(100))),
                Token::MonthName => out.push_str(label(&locale.months, month0)),
                Token::MonthShort => out.push_str(label(&locale.months_short, month0)),
                Token::Month2 => out.push_str(&format!("{:02}", value.month())),
                Token::Month => out.push_str(&value.month().to_string()),
                Token::Day2 => out.push_str(&format!("{:02}", value.day())),
                Token::Day => out.push_str(&value.day().to_string()),
                Token::Hour24Pad => out.push_str(&format!("{:02}", value.hour())),
                Token::Hour24 => out.push_str(&value.hour().to_string()),
                Token::Hour12Pad => out.push_str(&format!("{:02}", hour12)),
                Token::Hour12 => out.push_str(&hour12.to_string()),
                Token::Minute2 => out.push_str(&format!("{:02}", value.minute())),
                Token::Minute => out.push_str(&value.minute().to_string()),
                Token::Second2 => out.push_str(&format!("{:02}", value.second())),
                Token::Second => out.push_str(&value.second().to_string()),
                Token::MeridiemUpper => out.push_str(if value.hour() < 12 { "AM" } else { "PM" }),
                Token::MeridiemLower => out.push_str(if value.hour() < 12 { "am" } else { "pm" }),
                Token::Literal(text) => out.push_str(text),
            }
        }

        out
    }

    /// Parse `input` strictly against this pattern.
    ///
    /// Every literal must match, padded fields need their exact width and the
    /// whole input must be consumed. Date fields missing from the pattern are
    /// taken from `now` when they are larger than the first parsed field and
    /// default to their minimum otherwise.
    pub fn parse_strict(
        &self,
        input: &str,
        locale: &Locale,
        now: &NaiveDateTime,
    ) -> Result<NaiveDateTime, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut cursor = Cursor { input, offset: 0 };
        let mut fields = Fields::default();

        for token in &self.tokens {
            match token {
                Token::Year4 => fields.year = Some(cursor.digits(4, 4, "year")? as i32),
                Token::Year2 => {
                    let yy = cursor.digits(2, 2, "year")? as i32;
                    fields.year = Some(if yy > 68 { 1900 + yy } else { 2000 + yy });
                }
                Token::MonthName => fields.month = Some(cursor.month_name(&locale.months)?),
                Token::MonthShort => fields.month = Some(cursor.month_name(&locale.months_short)?),
                Token::Month2 => fields.month = Some(cursor.digits(2, 2, "month")?),
                Token::Month => fields.month = Some(cursor.digits(1, 2, "month")?),
                Token::Day2 => fields.day = Some(cursor.digits(2, 2, "day")?),
                Token::Day => fields.day = Some(cursor.digits(1, 2, "day")?),
                Token::Hour24Pad => fields.hour = Some(cursor.digits(2, 2, "hour")?),
                Token::Hour24 => fields.hour = Some(cursor.digits(1, 2, "hour")?),
                Token::Hour12Pad => {
                    fields.hour = Some(cursor.digits(2, 2, "hour")?);
                    fields.twelve_hour = true;
                }
                Token::Hour12 => {
                    fields.hour = Some(cursor.digits(1, 2, "hour")?);
                    fields.twelve_hour = true;
                }
                Token::Minute2 => fields.minute = Some(cursor.digits(2, 2, "minute")?),
                Token::Minute => fields.minute = Some(cursor.digits(1, 2, "minute")?),
                Token::Second2 => fields.second = Some(cursor.digits(2, 2, "second")?),
                Token::Second => fields.second = Some(cursor.digits(1, 2, "second")?),
                Token::MeridiemUpper | Token::MeridiemLower => {
                    fields.pm = Some(cursor.meridiem()?);
                }
                Token::Literal(text) => cursor.literal(text)?,
            }
        }

        if cursor.offset < input.len() {
            return Err(ParseError::TrailingInput(cursor.offset));
        }

        fields.resolve(now)
    }
}

fn push_literal(tokens: &mut SmallVec<[Token; 8]>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Literal(existing)) = tokens.last_mut() {
        existing.push_str(text);
    } else {
        tokens.push(Token::Literal(text.to_string()));
    }
}

fn label(labels: &[String], index: usize) -> &str {
    labels.get(index).map(String::as_str).unwrap_or("")
}

struct Cursor<'a> {
    input: &'a str,
    offset: usize,
}

impl Cursor<'_> {
    fn rest(&self) -> &str {
        &self.input[self.offset..]
    }

    fn digits(&mut self, min: usize, max: usize, field: &'static str) -> Result<u32, ParseError> {
        let rest = self.rest();
        if rest.is_empty() {
            return Err(ParseError::UnexpectedEnd(field));
        }

        let count = rest
            .bytes()
            .take(max)
            .take_while(|b| b.is_ascii_digit())
            .count();
        if count < min {
            return Err(ParseError::Mismatch {
                expected: format!("{min} digit {field}"),
                offset: self.offset,
            });
        }

        let value = rest[..count]
            .parse::<u32>()
            .map_err(|_| ParseError::Mismatch {
                expected: field.to_string(),
                offset: self.offset,
            })?;
        self.offset += count;
        Ok(value)
    }

    fn literal(&mut self, text: &str) -> Result<(), ParseError> {
        if self.rest().starts_with(text) {
            self.offset += text.len();
            return Ok(());
        }
        if self.rest().is_empty() {
            return Err(ParseError::UnexpectedEnd("literal"));
        }
        Err(ParseError::Mismatch {
            expected: format!("{text:?}"),
            offset: self.offset,
        })
    }

    fn month_name(&mut self, names: &[String]) -> Result<u32, ParseError> {
        let rest = self.rest();
        let found = names
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                !name.is_empty()
                    && rest
                        .get(..name.len())
                        .is_some_and(|head| head.eq_ignore_ascii_case(name))
            })
            .max_by_key(|(_, name)| name.len());

        match found {
            Some((index, name)) => {
                self.offset += name.len();
                Ok(index as u32 + 1)
            }
            None => Err(ParseError::UnknownMonth(self.offset)),
        }
    }

    fn meridiem(&mut self) -> Result<bool, ParseError> {
        let head = self.rest().get(..2).unwrap_or("");
        let pm = if head.eq_ignore_ascii_case("am") {
            false
        } else if head.eq_ignore_ascii_case("pm") {
            true
        } else {
            return Err(ParseError::Mismatch {
                expected: "AM or PM".to_string(),
                offset: self.offset,
            });
        };
        self.offset += 2;
        Ok(pm)
    }
}

#[derive(Default)]
struct Fields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    twelve_hour: bool,
    pm: Option<bool>,
}

impl Fields {
    fn resolve(self, now: &NaiveDateTime) -> Result<NaiveDateTime, ParseError> {
        // Units above the largest parsed one come from `now`, the rest from their minimum.
        let (year, month, day) = match (self.year, self.month, self.day) {
            (Some(y), m, d) => (y, m.unwrap_or(1), d.unwrap_or(1)),
            (None, Some(m), d) => (now.year(), m, d.unwrap_or(1)),
            (None, None, Some(d)) => (now.year(), now.month(), d),
            (None, None, None) => (now.year(), now.month(), now.day()),
        };

        let hour = match (self.hour, self.twelve_hour) {
            (Some(h), true) => {
                if !(1..=12).contains(&h) {
                    return Err(ParseError::InvalidNumber {
                        field: "hour",
                        value: h,
                    });
                }
                match (h, self.pm.unwrap_or(false)) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                }
            }
            (Some(h), false) => {
                if h > 23 {
                    return Err(ParseError::InvalidNumber {
                        field: "hour",
                        value: h,
                    });
                }
                h
            }
            (None, _) => 0,
        };
        let minute = self.minute.unwrap_or(0);
        if minute > 59 {
            return Err(ParseError::InvalidNumber {
                field: "minute",
                value: minute,
            });
        }
        let second = self.second.unwrap_or(0);
        if second > 59 {
            return Err(ParseError::InvalidNumber {
                field: "second",
                value: second,
            });
        }

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .ok_or(ParseError::InvalidDate { year, month, day })
    }
}
