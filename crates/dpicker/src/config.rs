//! Date picker configuration
//!
//! Options come from three places, merged per widget at construction:
//!
//! 1. built-in defaults (resolved against the adapter's clock and locale)
//! 2. attributes harvested off an `input` element the picker is mounted on
//! 3. explicit [`DatePickerOptions`], which always win
//!
//! Options can be built in code or loaded from TOML:
//!
//! ```toml
//! model = "2020-06-15"
//! min = "2020-01-01"
//! max = "2020-12-31"
//! format = "DD/MM/YYYY"
//! hide_on_day_click = false
//! order = ["years", "months", "days"]
//!
//! # extension keys
//! meridiem = true
//! step = 15
//! ```

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// Initial value of the picker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelOption {
    /// Start without a value
    Empty,
    /// Start on this date
    Date(NaiveDateTime),
}

/// Explicit construction options; unset fields fall back to attributes,
/// then to defaults
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatePickerOptions {
    /// Initial value; `""` or `null` starts empty
    #[serde(deserialize_with = "deserialize_model")]
    pub model: Option<ModelOption>,
    /// Start empty regardless of `model`
    pub empty: Option<bool>,
    #[serde(deserialize_with = "deserialize_date")]
    pub min: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_date")]
    pub max: Option<NaiveDateTime>,
    /// Moment-style pattern (`DD/MM/YYYY`)
    pub format: Option<String>,
    /// Twelve month labels
    pub months: Option<Vec<String>>,
    /// Seven weekday labels, Sunday first
    pub days: Option<Vec<String>>,
    /// 0 = Sunday
    pub first_day_of_week: Option<u8>,
    pub display: Option<bool>,
    pub hide_on_day_click: Option<bool>,
    pub hide_on_enter: Option<bool>,
    pub hide_on_outside_click: Option<bool>,
    pub sibling_month_day_click: Option<bool>,
    pub input_id: Option<String>,
    pub input_name: Option<String>,
    /// Slot names in render order
    pub order: Option<Vec<String>>,
    /// Enable time selection
    pub time: Option<bool>,
    /// Extension keys (`meridiem`, `step`, ...)
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl DatePickerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load options from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    pub fn model(mut self, value: NaiveDateTime) -> Self {
        self.model = Some(ModelOption::Date(value));
        self
    }

    /// Start without a value
    pub fn empty_model(mut self) -> Self {
        self.model = Some(ModelOption::Empty);
        self
    }

    pub fn min(mut self, min: NaiveDateTime) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: NaiveDateTime) -> Self {
        self.max = Some(max);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn months(mut self, months: Vec<String>) -> Self {
        self.months = Some(months);
        self
    }

    pub fn days(mut self, days: Vec<String>) -> Self {
        self.days = Some(days);
        self
    }

    pub fn first_day_of_week(mut self, day: u8) -> Self {
        self.first_day_of_week = Some(day);
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = Some(display);
        self
    }

    pub fn hide_on_day_click(mut self, hide: bool) -> Self {
        self.hide_on_day_click = Some(hide);
        self
    }

    pub fn hide_on_enter(mut self, hide: bool) -> Self {
        self.hide_on_enter = Some(hide);
        self
    }

    pub fn hide_on_outside_click(mut self, hide: bool) -> Self {
        self.hide_on_outside_click = Some(hide);
        self
    }

    pub fn sibling_month_day_click(mut self, enabled: bool) -> Self {
        self.sibling_month_day_click = Some(enabled);
        self
    }

    pub fn input_id(mut self, id: impl Into<String>) -> Self {
        self.input_id = Some(id.into());
        self
    }

    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = Some(name.into());
        self
    }

    pub fn order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    pub fn time(mut self, enabled: bool) -> Self {
        self.time = Some(enabled);
        self
    }

    /// Set an extension key
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Attributes harvested off the `input` element a picker is mounted on.
///
/// Values are kept raw; dates are parsed once the effective format is known.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeOverrides {
    pub value: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub format: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    /// `type=datetime` enables time selection
    pub time: Option<bool>,
}

impl AttributeOverrides {
    /// Pick the known attributes out of an element's attribute list
    pub fn harvest(attributes: &IndexMap<String, String>) -> Self {
        let get = |name: &str| attributes.get(name).cloned();
        Self {
            value: get("value"),
            min: get("min").filter(|v| !v.is_empty()),
            max: get("max").filter(|v| !v.is_empty()),
            format: get("format").filter(|v| !v.is_empty()),
            id: get("id").filter(|v| !v.is_empty()),
            name: get("name").filter(|v| !v.is_empty()),
            time: attributes.get("type").and_then(|t| match t.as_str() {
                "datetime" | "datetime-local" => Some(true),
                "date" => Some(false),
                _ => None,
            }),
        }
    }
}

// =============================================================================
// Date parsing
// =============================================================================

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD HH:MM[:SS]`
pub fn parse_option_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_option_date(&text)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{text}`")))
}

fn deserialize_model<'de, D>(deserializer: D) -> std::result::Result<Option<ModelOption>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Some(ModelOption::Empty)),
        Some(text) if text.trim().is_empty() => Ok(Some(ModelOption::Empty)),
        Some(text) => parse_option_date(&text)
            .map(|date| Some(ModelOption::Date(date)))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{text}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatePickerError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_option_date_formats() {
        assert_eq!(parse_option_date("2020-06-15"), Some(date(2020, 6, 15)));
        assert_eq!(
            parse_option_date("2020-06-15T10:30"),
            date(2020, 6, 15).date().and_hms_opt(10, 30, 0)
        );
        assert_eq!(
            parse_option_date("2020-06-15 10:30:05"),
            date(2020, 6, 15).date().and_hms_opt(10, 30, 5)
        );
        assert_eq!(parse_option_date("15/06/2020"), None);
    }

    #[test]
    fn test_from_toml() {
        let options = DatePickerOptions::from_toml_str(
            r#"
            model = "2020-06-15"
            min = "2020-01-01"
            max = "2020-12-31"
            hide_on_day_click = false
            order = ["years", "months", "days"]
            meridiem = true
            step = 15
            "#,
        )
        .unwrap();

        assert_eq!(options.model, Some(ModelOption::Date(date(2020, 6, 15))));
        assert_eq!(options.min, Some(date(2020, 1, 1)));
        assert_eq!(options.max, Some(date(2020, 12, 31)));
        assert_eq!(options.hide_on_day_click, Some(false));
        assert_eq!(options.hide_on_enter, None);
        assert_eq!(
            options.order.as_deref(),
            Some(&["years".to_string(), "months".to_string(), "days".to_string()][..])
        );
        assert_eq!(options.extra.get("meridiem"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(options.extra.get("step").and_then(|v| v.as_u64()), Some(15));
    }

    #[test]
    fn test_empty_model_from_toml() {
        let options = DatePickerOptions::from_toml_str(r#"model = """#).unwrap();
        assert_eq!(options.model, Some(ModelOption::Empty));

        let options = DatePickerOptions::from_toml_str("").unwrap();
        assert_eq!(options.model, None);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DatePickerOptions::from_toml_str(r#"min = "yesterday""#).unwrap_err();
        assert!(matches!(err, DatePickerError::Config(_)));
    }

    #[test]
    fn test_from_json() {
        let options: DatePickerOptions =
            serde_json::from_str(r#"{"model": null, "time": true, "step": 5}"#).unwrap();
        assert_eq!(options.model, Some(ModelOption::Empty));
        assert_eq!(options.time, Some(true));
        assert_eq!(options.extra.get("step").and_then(|v| v.as_u64()), Some(5));
    }

    #[test]
    fn test_builder_methods() {
        let options = DatePickerOptions::new()
            .model(date(2020, 6, 15))
            .order(["days"])
            .extra("step", 30);

        assert_eq!(options.model, Some(ModelOption::Date(date(2020, 6, 15))));
        assert_eq!(options.order, Some(vec!["days".to_string()]));
        assert_eq!(options.extra.get("step").and_then(|v| v.as_u64()), Some(30));
    }

    #[test]
    fn test_harvest_attributes() {
        let mut attributes = IndexMap::new();
        attributes.insert("value".to_string(), "31/12/2020".to_string());
        attributes.insert("type".to_string(), "datetime".to_string());
        attributes.insert("min".to_string(), String::new());
        attributes.insert("name".to_string(), "birthday".to_string());

        let harvested = AttributeOverrides::harvest(&attributes);
        assert_eq!(harvested.value.as_deref(), Some("31/12/2020"));
        assert_eq!(harvested.min, None);
        assert_eq!(harvested.name.as_deref(), Some("birthday"));
        assert_eq!(harvested.time, Some(true));
    }
}
