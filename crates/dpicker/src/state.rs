//! Picker state and validity check
//!
//! One [`PickerState`] exists per widget. It is resolved once from defaults,
//! input attributes and explicit options, then mutated in place by event
//! handlers for the widget's lifetime.

use chrono::{NaiveDate, NaiveDateTime};
use dpicker_core::calendar::{self, Granularity};
use dpicker_core::DateAdapter;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::config::{AttributeOverrides, DatePickerOptions, ModelOption};

/// Default moment-style format
pub const DEFAULT_FORMAT: &str = "DD/MM/YYYY";

/// Default input name
pub const DEFAULT_INPUT_NAME: &str = "dpicker-input";

/// Default slot order
pub const DEFAULT_ORDER: [&str; 4] = ["months", "years", "time", "days"];

/// All widget configuration and transient state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PickerState {
    /// Calendar cursor; meaningful only while `empty` is false
    pub value: NaiveDateTime,
    pub empty: bool,
    /// `value` lies in `[min, max]`
    pub valid: bool,
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,
    /// Moment-style pattern used by the input field
    pub format: String,
    /// Twelve month labels
    pub months: Vec<String>,
    /// Seven weekday labels, Sunday first
    pub days: Vec<String>,
    /// 0 = Sunday
    pub first_day_of_week: u8,
    /// Popup visible
    pub display: bool,
    /// Slot names in render order
    pub order: Vec<String>,
    pub hide_on_day_click: bool,
    pub hide_on_enter: bool,
    pub hide_on_outside_click: bool,
    pub sibling_month_day_click: bool,
    /// Time selection enabled; range checks run at minute granularity
    pub time: bool,
    pub input_id: String,
    pub input_name: String,
    pub container_id: String,
    /// Extension-contributed keys
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl PickerState {
    /// Defaults resolved against the adapter's clock and locale
    pub fn defaults(adapter: &dyn DateAdapter) -> Self {
        let now = adapter.now();
        let min = NaiveDate::from_ymd_opt(1986, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(now);
        let max = calendar::with_month(&calendar::add_years(&now, 1), 12);

        Self {
            value: now,
            empty: false,
            valid: true,
            min,
            max,
            format: DEFAULT_FORMAT.to_string(),
            months: adapter.month_names(),
            days: adapter.weekday_names_short(),
            first_day_of_week: adapter.first_day_of_week(),
            display: false,
            order: DEFAULT_ORDER.iter().map(|s| s.to_string()).collect(),
            hide_on_day_click: true,
            hide_on_enter: true,
            hide_on_outside_click: true,
            sibling_month_day_click: false,
            time: false,
            input_id: String::new(),
            input_name: DEFAULT_INPUT_NAME.to_string(),
            container_id: String::new(),
            extensions: IndexMap::new(),
        }
    }

    /// Resolve the initial state: defaults ← attributes ← options
    pub fn resolve(
        adapter: &dyn DateAdapter,
        attributes: &AttributeOverrides,
        options: &DatePickerOptions,
    ) -> Self {
        let mut state = Self::defaults(adapter);

        // Dates in attributes are written in the effective format
        state.format = options
            .format
            .clone()
            .or_else(|| attributes.format.clone())
            .unwrap_or(state.format);

        state.apply_attributes(adapter, attributes);
        state.apply_options(options);
        state
    }

    fn apply_attributes(&mut self, adapter: &dyn DateAdapter, attributes: &AttributeOverrides) {
        let parse = |name: &str, text: &str| match adapter.parse_strict(text, &self.format) {
            Ok(date) => Some(date),
            Err(err) => {
                debug!(attribute = name, text, %err, "ignoring unparseable attribute");
                None
            }
        };

        let value = match attributes.value.as_deref() {
            Some(text) if text.trim().is_empty() => Some(None),
            Some(text) => parse("value", text).map(Some),
            None => None,
        };
        let min = attributes.min.as_deref().and_then(|t| parse("min", t));
        let max = attributes.max.as_deref().and_then(|t| parse("max", t));

        match value {
            Some(Some(date)) => self.value = date,
            Some(None) => self.empty = true,
            None => {}
        }
        if let Some(min) = min {
            self.min = min;
        }
        if let Some(max) = max {
            self.max = max;
        }
        if let Some(id) = &attributes.id {
            self.input_id = id.clone();
        }
        if let Some(name) = &attributes.name {
            self.input_name = name.clone();
        }
        if let Some(time) = attributes.time {
            self.time = time;
        }
    }

    fn apply_options(&mut self, options: &DatePickerOptions) {
        match options.model {
            Some(ModelOption::Date(date)) => {
                self.value = date;
                self.empty = false;
            }
            Some(ModelOption::Empty) => self.empty = true,
            None => {}
        }

        fn set<T: Clone>(target: &mut T, source: &Option<T>) {
            if let Some(value) = source {
                *target = value.clone();
            }
        }

        set(&mut self.empty, &options.empty);
        set(&mut self.min, &options.min);
        set(&mut self.max, &options.max);
        set(&mut self.months, &options.months);
        set(&mut self.days, &options.days);
        set(&mut self.display, &options.display);
        set(&mut self.hide_on_day_click, &options.hide_on_day_click);
        set(&mut self.hide_on_enter, &options.hide_on_enter);
        set(&mut self.hide_on_outside_click, &options.hide_on_outside_click);
        set(&mut self.sibling_month_day_click, &options.sibling_month_day_click);
        set(&mut self.input_id, &options.input_id);
        set(&mut self.input_name, &options.input_name);
        set(&mut self.order, &options.order);
        set(&mut self.time, &options.time);

        if let Some(day) = options.first_day_of_week {
            self.first_day_of_week = day % 7;
        }
    }

    /// Check a candidate value and record the outcome in `valid`.
    ///
    /// `None` stands for text that did not parse: `valid` becomes false and
    /// the caller must not commit. A parsed date always returns true, even
    /// when it falls outside `[min, max]`; only `valid` tells the two apart.
    pub fn check_validity(&mut self, candidate: Option<&NaiveDateTime>) -> bool {
        let Some(candidate) = candidate else {
            self.valid = false;
            return false;
        };
        self.valid = calendar::in_range(candidate, &self.min, &self.max, self.granularity());
        true
    }

    /// Re-run the validity check on the current value
    pub fn revalidate(&mut self) {
        let value = self.value;
        self.check_validity(Some(&value));
    }

    /// Range check precision
    pub fn granularity(&self) -> Granularity {
        if self.time {
            Granularity::Minute
        } else {
            Granularity::Day
        }
    }

    /// `min` is after `max`
    pub fn range_inverted(&self) -> bool {
        calendar::is_after(&self.min, &self.max, self.granularity())
    }

    /// The value, or `None` while empty
    pub fn model(&self) -> Option<NaiveDateTime> {
        (!self.empty).then_some(self.value)
    }

    /// Text shown in the input field
    pub fn input_text(&self, adapter: &dyn DateAdapter) -> String {
        if self.empty {
            String::new()
        } else {
            adapter.format(&self.value, &self.format)
        }
    }

    // =========================================================================
    // Extension keys
    // =========================================================================

    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.get(key)
    }

    pub fn extension_bool(&self, key: &str) -> Option<bool> {
        self.extensions.get(key).and_then(serde_json::Value::as_bool)
    }

    pub fn extension_u64(&self, key: &str) -> Option<u64> {
        self.extensions.get(key).and_then(serde_json::Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpicker_core::ChronoAdapter;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn adapter() -> ChronoAdapter {
        ChronoAdapter::fixed(at(2020, 6, 15, 12, 0))
    }

    fn ranged() -> PickerState {
        let options = DatePickerOptions::new()
            .min(at(2020, 1, 1, 0, 0))
            .max(at(2020, 12, 31, 0, 0));
        PickerState::resolve(&adapter(), &AttributeOverrides::default(), &options)
    }

    #[test]
    fn test_defaults() {
        let state = PickerState::defaults(&adapter());
        assert_eq!(state.value, at(2020, 6, 15, 12, 0));
        assert_eq!(state.min, at(1986, 1, 1, 0, 0));
        assert_eq!(state.max, at(2021, 12, 15, 12, 0));
        assert_eq!(state.format, "DD/MM/YYYY");
        assert_eq!(state.months.len(), 12);
        assert_eq!(state.days.len(), 7);
        assert_eq!(state.order, vec!["months", "years", "time", "days"]);
        assert!(state.hide_on_day_click && state.hide_on_enter && state.hide_on_outside_click);
        assert!(!state.sibling_month_day_click);
        assert!(!state.display && !state.empty && !state.time);
        assert_eq!(state.input_name, "dpicker-input");
    }

    #[test]
    fn test_in_range_is_valid() {
        let mut state = ranged();
        for candidate in [
            at(2020, 1, 1, 0, 0),
            at(2020, 6, 15, 23, 59),
            at(2020, 12, 31, 18, 0),
        ] {
            state.valid = false;
            assert!(state.check_validity(Some(&candidate)));
            assert!(state.valid, "{candidate} should be valid");
        }
    }

    #[test]
    fn test_out_of_range_returns_true_but_invalid() {
        let mut state = ranged();
        for candidate in [at(2019, 12, 31, 23, 59), at(2021, 1, 1, 0, 0)] {
            assert!(state.check_validity(Some(&candidate)));
            assert!(!state.valid, "{candidate} should be out of range");
        }
    }

    #[test]
    fn test_unparseable_is_invalid() {
        let mut state = ranged();
        let before = state.value;
        assert!(!state.check_validity(None));
        assert!(!state.valid);
        assert_eq!(state.value, before);
    }

    #[test]
    fn test_minute_granularity_with_time() {
        let mut state = ranged();
        state.min = at(2020, 6, 15, 10, 30);
        assert!(state.check_validity(Some(&at(2020, 6, 15, 10, 0))));
        assert!(state.valid);

        state.time = true;
        state.check_validity(Some(&at(2020, 6, 15, 10, 0)));
        assert!(!state.valid);
        state.check_validity(Some(&at(2020, 6, 15, 10, 30)));
        assert!(state.valid);
    }

    #[test]
    fn test_attributes_use_effective_format() {
        let attributes = AttributeOverrides {
            value: Some("31/12/2020".into()),
            min: Some("01/01/2020".into()),
            max: Some("not a date".into()),
            id: Some("birthday".into()),
            ..Default::default()
        };
        let state = PickerState::resolve(&adapter(), &attributes, &DatePickerOptions::new());

        assert_eq!(state.value.date(), NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
        assert_eq!(state.min, at(2020, 1, 1, 0, 0));
        assert_eq!(state.max, at(2021, 12, 15, 12, 0));
        assert_eq!(state.input_id, "birthday");
        assert!(!state.empty);
    }

    #[test]
    fn test_options_win_over_attributes() {
        let attributes = AttributeOverrides {
            value: Some(String::new()),
            format: Some("YYYY-MM-DD".into()),
            name: Some("from-attribute".into()),
            ..Default::default()
        };
        let options = DatePickerOptions::new()
            .model(at(2020, 3, 1, 0, 0))
            .input_name("from-options");
        let state = PickerState::resolve(&adapter(), &attributes, &options);

        assert!(!state.empty);
        assert_eq!(state.value, at(2020, 3, 1, 0, 0));
        assert_eq!(state.format, "YYYY-MM-DD");
        assert_eq!(state.input_name, "from-options");
    }

    #[test]
    fn test_empty_value_attribute() {
        let attributes = AttributeOverrides {
            value: Some(String::new()),
            ..Default::default()
        };
        let state = PickerState::resolve(&adapter(), &attributes, &DatePickerOptions::new());
        assert!(state.empty);
        assert_eq!(state.model(), None);
        assert_eq!(state.input_text(&adapter()), "");
    }

    #[test]
    fn test_range_inverted() {
        let mut state = ranged();
        assert!(!state.range_inverted());
        state.min = at(2021, 1, 1, 0, 0);
        assert!(state.range_inverted());
    }
}
