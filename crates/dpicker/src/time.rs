//! Time selection module
//!
//! Adds an hours/minutes (and optional AM/PM) selector in the `time` slot
//! and switches range checks to minute granularity.
//!
//! Extension keys:
//! - `meridiem` (bool): 12-hour clock with an AM/PM selector
//! - `step` (minutes): only multiples of `step` are offered
//! - `concat_hours_and_minutes` (bool): a single `HH:mm` selector instead
//!   of separate hours and minutes
//!
//! Both can also come from the input's `time-format` and `step` attributes.

use std::rc::Rc;

use chrono::{NaiveDateTime, Timelike};
use dpicker_core::calendar;
use dpicker_core::{DateAdapter, Pattern};
use dpicker_vdom::{h, EventContext, VNode};
use indexmap::IndexMap;
use tracing::debug;

use crate::config::AttributeOverrides;
use crate::module::{Extensions, Handler, Module, SlotBuilder};
use crate::picker::DatePicker;
use crate::state::PickerState;

pub const SLOT_TIME: &str = "time";

pub const HOURS_CHANGE: &str = "hoursChange";
pub const MINUTES_CHANGE: &str = "minutesChange";
pub const MERIDIEM_CHANGE: &str = "meridiemChange";
pub const TIME_CHANGE: &str = "timeChange";

pub const MERIDIEM: &str = "meridiem";
pub const STEP: &str = "step";
pub const CONCAT_HOURS_AND_MINUTES: &str = "concat_hours_and_minutes";

const AM: &str = "AM";
const PM: &str = "PM";

/// Hours, minutes and meridiem selectors
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeModule;

impl TimeModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for TimeModule {
    fn name(&self) -> &str {
        "time"
    }

    fn events(&self) -> Vec<(String, Handler)> {
        vec![
            (HOURS_CHANGE.to_string(), Rc::new(hours_change) as Handler),
            (MINUTES_CHANGE.to_string(), Rc::new(minutes_change) as Handler),
            (MERIDIEM_CHANGE.to_string(), Rc::new(meridiem_change) as Handler),
            (TIME_CHANGE.to_string(), Rc::new(time_change) as Handler),
        ]
    }

    fn slots(&self) -> Vec<(String, SlotBuilder)> {
        let builder: SlotBuilder =
            Rc::new(|state: &PickerState, _: &dyn DateAdapter| render_time(state));
        vec![(SLOT_TIME.to_string(), builder)]
    }

    fn defaults(&self, extensions: &mut Extensions) {
        extensions.insert(MERIDIEM.to_string(), false.into());
        extensions.insert(STEP.to_string(), 1.into());
        extensions.insert(CONCAT_HOURS_AND_MINUTES.to_string(), false.into());
    }

    fn parse_attributes(
        &self,
        attributes: &IndexMap<String, String>,
        extensions: &mut Extensions,
        _overrides: &mut AttributeOverrides,
    ) {
        if let Some(step) = attributes.get(STEP) {
            match step.trim().parse::<u64>() {
                Ok(step) if step > 0 => {
                    extensions.insert(STEP.to_string(), step.into());
                }
                _ => debug!(%step, "ignoring step attribute"),
            }
        }
        if let Some(format) = attributes.get("time-format") {
            extensions.insert(MERIDIEM.to_string(), format.contains("12").into());
        }
    }

    fn initialize(&self, picker: &mut DatePicker) {
        let state = picker.state_mut();
        state.time = true;
        if !Pattern::compile(&state.format).has_time() {
            let suffix = if meridiem(state) { " hh:mm A" } else { " HH:mm" };
            state.format.push_str(suffix);
        }
    }
}

fn meridiem(state: &PickerState) -> bool {
    state.extension_bool(MERIDIEM).unwrap_or(false)
}

fn concat(state: &PickerState) -> bool {
    state.extension_bool(CONCAT_HOURS_AND_MINUTES).unwrap_or(false)
}

fn step(state: &PickerState) -> u32 {
    state
        .extension_u64(STEP)
        .and_then(|s| u32::try_from(s).ok())
        .filter(|&s| s > 0 && s < 60)
        .unwrap_or(1)
}

fn is_pm(value: &NaiveDateTime) -> bool {
    value.hour() >= 12
}

/// Label of a 24-hour value on a 12-hour clock
fn hour12(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// Hours offered for the current value, as 24-hour values.
///
/// On a 12-hour clock only the current half of the day is offered, 12
/// first. On `min`'s (`max`'s) day, hours before (after) it are dropped.
pub fn available_hours(state: &PickerState) -> Vec<u32> {
    let hours: Vec<u32> = if meridiem(state) {
        let base = if is_pm(&state.value) { 12 } else { 0 };
        (0..12).map(|h| base + h).collect()
    } else {
        (0..24).collect()
    };
    let (low, high) = hour_bounds(state);
    hours.into_iter().filter(|h| (low..=high).contains(h)).collect()
}

fn hour_bounds(state: &PickerState) -> (u32, u32) {
    let low = if on_same_day(&state.value, &state.min) {
        state.min.hour()
    } else {
        0
    };
    let high = if on_same_day(&state.value, &state.max) {
        state.max.hour()
    } else {
        23
    };
    (low, high)
}

/// Minutes offered for the current value: multiples of `step`, clamped on
/// the boundary hour of `min`'s and `max`'s day
pub fn available_minutes(state: &PickerState) -> Vec<u32> {
    minutes_for_hour(state, state.value.hour())
}

/// `HH:mm` pairs offered by the combined selector
pub fn available_times(state: &PickerState) -> Vec<(u32, u32)> {
    available_hours(state)
        .into_iter()
        .flat_map(|hour| {
            minutes_for_hour(state, hour)
                .into_iter()
                .map(move |minute| (hour, minute))
        })
        .collect()
}

fn minutes_for_hour(state: &PickerState, hour: u32) -> Vec<u32> {
    let step = step(state);
    let low = if on_same_day(&state.value, &state.min) && hour == state.min.hour() {
        state.min.minute()
    } else {
        0
    };
    let high = if on_same_day(&state.value, &state.max) && hour == state.max.hour() {
        state.max.minute()
    } else {
        59
    };
    (0..60)
        .step_by(step as usize)
        .filter(|m| (low..=high).contains(m))
        .collect()
}

fn on_same_day(a: &NaiveDateTime, b: &NaiveDateTime) -> bool {
    calendar::is_same(a, b, calendar::Granularity::Day)
}

/// The `time` slot; `None` unless time selection is enabled
pub fn render_time(state: &PickerState) -> Option<VNode> {
    if !state.time {
        return None;
    }
    let meridiem = meridiem(state);
    let step = step(state);
    let hour = state.value.hour();
    let minute = state.value.minute() / step * step;

    let current = if is_pm(&state.value) { PM } else { AM };
    let meridiem_select: Option<VNode> = meridiem.then(|| {
        h("select")
            .attr("name", "dpicker-meridiem")
            .attr("aria-label", "AM/PM")
            .on_change(MERIDIEM_CHANGE)
            .children([AM, PM].into_iter().map(|value| {
                h("option")
                    .key(value)
                    .attr("value", value)
                    .attr_if(value == current, "selected", "selected")
                    .text(value)
            }))
            .into()
    });

    if concat(state) {
        let times = h("select")
            .attr("name", "dpicker-time")
            .attr("aria-label", "Time")
            .on_change(TIME_CHANGE)
            .children(available_times(state).into_iter().map(|(at_hour, at_minute)| {
                let value = format!("{at_hour:02}:{at_minute:02}");
                let label = if meridiem { hour12(at_hour) } else { at_hour };
                h("option")
                    .key(value.clone())
                    .attr("value", value)
                    .attr_if(at_hour == hour && at_minute == minute, "selected", "selected")
                    .text(format!("{label:02}:{at_minute:02}"))
            }));
        return Some(
            h("span")
                .class("dpicker-time")
                .child(times)
                .maybe_child(meridiem_select)
                .into(),
        );
    }

    let hours = h("select")
        .attr("name", "dpicker-hours")
        .attr("aria-label", "Hours")
        .on_change(HOURS_CHANGE)
        .children(available_hours(state).into_iter().map(|value| {
            let label = if meridiem { hour12(value) } else { value };
            h("option")
                .key(value.to_string())
                .attr("value", label.to_string())
                .attr_if(value == hour, "selected", "selected")
                .text(format!("{label:02}"))
        }));

    let minutes = h("select")
        .attr("name", "dpicker-minutes")
        .attr("aria-label", "Minutes")
        .on_change(MINUTES_CHANGE)
        .children(available_minutes(state).into_iter().map(|value| {
            h("option")
                .key(value.to_string())
                .attr("value", value.to_string())
                .attr_if(value == minute, "selected", "selected")
                .text(format!("{value:02}"))
        }));

    Some(
        h("span")
            .class("dpicker-time")
            .child(hours)
            .child(minutes)
            .maybe_child(meridiem_select)
            .into(),
    )
}

// =============================================================================
// Handlers
// =============================================================================

fn hours_change(picker: &mut DatePicker, ctx: &EventContext) {
    let Some(selected) = selected_number(ctx, HOURS_CHANGE) else {
        return;
    };
    let state = picker.state_mut();
    let hour = if meridiem(state) {
        let base = selected % 12;
        if is_pm(&state.value) {
            base + 12
        } else {
            base
        }
    } else {
        selected
    };
    if hour > 23 {
        debug!(hour, "ignoring out of range hour");
        return;
    }
    let value = calendar::with_hour(&picker.state().value, hour);
    commit(picker, value, HOURS_CHANGE, ctx);
}

fn minutes_change(picker: &mut DatePicker, ctx: &EventContext) {
    let Some(minute) = selected_number(ctx, MINUTES_CHANGE).filter(|m| *m < 60) else {
        return;
    };
    let value = calendar::with_minute(&picker.state().value, minute);
    commit(picker, value, MINUTES_CHANGE, ctx);
}

fn time_change(picker: &mut DatePicker, ctx: &EventContext) {
    let parsed = ctx.target_value.as_deref().and_then(|text| {
        let (hour, minute) = text.trim().split_once(':')?;
        Some((hour.parse::<u32>().ok()?, minute.parse::<u32>().ok()?))
    });
    let Some((hour, minute)) = parsed.filter(|&(hour, minute)| hour < 24 && minute < 60) else {
        debug!(value = ?ctx.target_value, "ignoring unparseable time");
        return;
    };
    let value = calendar::with_hour(&picker.state().value, hour);
    commit(picker, calendar::with_minute(&value, minute), TIME_CHANGE, ctx);
}

fn meridiem_change(picker: &mut DatePicker, ctx: &EventContext) {
    let value = picker.state().value;
    let hour = value.hour();
    let hour = match ctx.target_value.as_deref() {
        Some(AM) => hour % 12,
        Some(PM) => hour % 12 + 12,
        other => {
            debug!(?other, "ignoring unknown meridiem");
            return;
        }
    };
    commit(picker, calendar::with_hour(&value, hour), MERIDIEM_CHANGE, ctx);
}

fn commit(picker: &mut DatePicker, value: NaiveDateTime, name: &str, ctx: &EventContext) {
    let state = picker.state_mut();
    state.value = value;
    state.empty = false;
    state.revalidate();

    picker.redraw();
    picker.notify(true, name, Some(&ctx.event));
}

fn selected_number(ctx: &EventContext, handler: &str) -> Option<u32> {
    let text = ctx.target_value.as_deref()?;
    match text.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(handler, text, "ignoring unparseable option");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatePickerOptions;
    use chrono::NaiveDate;
    use dpicker_core::{event_types, ChronoAdapter};
    use dpicker_vdom::{Document, DomEvent, NodeId, SharedDocument};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn state(value: NaiveDateTime, min: NaiveDateTime) -> PickerState {
        let adapter = ChronoAdapter::fixed(at(2020, 6, 15, 12, 0));
        let options = DatePickerOptions::new().model(value).min(min).time(true);
        let mut state = PickerState::resolve(&adapter, &AttributeOverrides::default(), &options);
        TimeModule.defaults(&mut state.extensions);
        state
    }

    fn mounted(options: DatePickerOptions) -> (SharedDocument, DatePicker) {
        let doc = Document::new().into_shared();
        let body = doc.borrow().body();
        let picker = DatePicker::builder()
            .options(options)
            .adapter(ChronoAdapter::fixed(at(2020, 6, 15, 12, 0)))
            .module(TimeModule::new())
            .mount(&doc, body)
            .unwrap();
        (doc, picker)
    }

    fn select(doc: &SharedDocument, picker: &DatePicker, name: &str) -> Option<NodeId> {
        let d = doc.borrow();
        d.query_all_tag(picker.root(), "select")
            .into_iter()
            .find(|&n| d.attribute(n, "name") == Some(name))
    }

    #[test]
    fn test_hidden_without_time() {
        let mut s = state(at(2020, 6, 15, 10, 0), at(2020, 1, 1, 0, 0));
        s.time = false;
        assert!(render_time(&s).is_none());
    }

    #[test]
    fn test_full_day_when_unconstrained() {
        let s = state(at(2020, 6, 15, 10, 7), at(2020, 1, 1, 0, 0));
        assert_eq!(available_hours(&s), (0..24).collect::<Vec<_>>());
        assert_eq!(available_minutes(&s).len(), 60);
    }

    #[test]
    fn test_min_day_filters_earlier_times() {
        let s = state(at(2020, 6, 15, 10, 0), at(2020, 6, 15, 10, 30));
        assert_eq!(available_hours(&s), (10..24).collect::<Vec<_>>());
        assert_eq!(available_minutes(&s), (30..60).collect::<Vec<_>>());

        let later = state(at(2020, 6, 15, 11, 0), at(2020, 6, 15, 10, 30));
        assert_eq!(available_minutes(&later).len(), 60);
    }

    #[test]
    fn test_step_and_meridiem() {
        let mut s = state(at(2020, 6, 15, 14, 20), at(2020, 1, 1, 0, 0));
        s.extensions.insert(STEP.into(), 15.into());
        s.extensions.insert(MERIDIEM.into(), true.into());

        assert_eq!(available_minutes(&s), vec![0, 15, 30, 45]);
        assert_eq!(available_hours(&s), (12..24).collect::<Vec<_>>());

        let tree = render_time(&s).unwrap();
        let selected: Vec<&str> = tree
            .find_all(&|e| e.attribute("selected").is_some())
            .iter()
            .filter_map(|e| e.attribute("value"))
            .collect();
        assert_eq!(selected, vec!["2", "15", "PM"]);
        let first_hour = tree.find(&|e| e.tag == "option").unwrap();
        assert_eq!(first_hour.attribute("value"), Some("12"));
    }

    #[test]
    fn test_attributes_feed_extensions() {
        let mut attributes = IndexMap::new();
        attributes.insert("step".to_string(), "5".to_string());
        attributes.insert("time-format".to_string(), "12".to_string());
        let mut extensions = Extensions::new();
        TimeModule.defaults(&mut extensions);
        TimeModule.parse_attributes(&attributes, &mut extensions, &mut AttributeOverrides::default());

        assert_eq!(extensions.get(STEP), Some(&serde_json::Value::from(5)));
        assert_eq!(extensions.get(MERIDIEM), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_initialize_extends_format() {
        let (_, picker) = mounted(DatePickerOptions::new().model(at(2020, 6, 15, 9, 5)));
        assert!(picker.state().time);
        assert_eq!(picker.format(), "DD/MM/YYYY HH:mm");
        assert_eq!(picker.input(), "15/06/2020 09:05");

        let (_, picker) = mounted(
            DatePickerOptions::new()
                .model(at(2020, 6, 15, 21, 5))
                .extra(MERIDIEM, true),
        );
        assert_eq!(picker.format(), "DD/MM/YYYY hh:mm A");
        assert_eq!(picker.input(), "15/06/2020 09:05 PM");
    }

    #[test]
    fn test_selectors_update_value() {
        let (doc, mut picker) = mounted(
            DatePickerOptions::new()
                .model(at(2020, 6, 15, 9, 5))
                .extra(MERIDIEM, true),
        );

        let hours = select(&doc, &picker, "dpicker-hours").unwrap();
        doc.borrow_mut().set_value(hours, "12");
        picker.handle_event(&DomEvent::new(event_types::CHANGE, hours));
        assert_eq!(picker.value(), Some(at(2020, 6, 15, 0, 5)));

        let meridiem = select(&doc, &picker, "dpicker-meridiem").unwrap();
        doc.borrow_mut().set_value(meridiem, "PM");
        picker.handle_event(&DomEvent::new(event_types::CHANGE, meridiem));
        assert_eq!(picker.value(), Some(at(2020, 6, 15, 12, 5)));

        let minutes = select(&doc, &picker, "dpicker-minutes").unwrap();
        doc.borrow_mut().set_value(minutes, "45");
        picker.handle_event(&DomEvent::new(event_types::CHANGE, minutes));
        assert_eq!(picker.value(), Some(at(2020, 6, 15, 12, 45)));
        assert_eq!(picker.input(), "15/06/2020 12:45 PM");
    }

    #[test]
    fn test_minute_granularity_validity() {
        let (doc, mut picker) = mounted(
            DatePickerOptions::new()
                .model(at(2020, 6, 15, 10, 45))
                .min(at(2020, 6, 15, 10, 30)),
        );
        assert!(picker.valid());

        let minutes = select(&doc, &picker, "dpicker-minutes").unwrap();
        doc.borrow_mut().set_value(minutes, "10");
        picker.handle_event(&DomEvent::new(event_types::CHANGE, minutes));
        assert!(!picker.valid());
    }

    #[test]
    fn test_combined_selector_offers_bounded_steps() {
        let mut s = state(at(2020, 6, 15, 10, 40), at(2020, 6, 15, 10, 30));
        s.extensions.insert(STEP.into(), 15.into());
        s.extensions.insert(CONCAT_HOURS_AND_MINUTES.into(), true.into());

        let times = available_times(&s);
        assert_eq!(&times[..3], &[(10, 30), (10, 45), (11, 0)]);
        assert_eq!(times.last(), Some(&(23, 45)));

        let tree = render_time(&s).unwrap();
        assert!(tree.find(&|e| e.attribute("name") == Some("dpicker-hours")).is_none());
        assert!(tree.find(&|e| e.attribute("name") == Some("dpicker-minutes")).is_none());
        let selected = tree.find(&|e| e.attribute("selected").is_some()).unwrap();
        assert_eq!(selected.attribute("value"), Some("10:30"));
    }

    #[test]
    fn test_combined_selector_sets_hour_and_minute() {
        let (doc, mut picker) = mounted(
            DatePickerOptions::new()
                .model(at(2020, 6, 15, 9, 5))
                .extra(CONCAT_HOURS_AND_MINUTES, true)
                .extra(STEP, 15),
        );
        assert!(select(&doc, &picker, "dpicker-hours").is_none());

        let time = select(&doc, &picker, "dpicker-time").unwrap();
        doc.borrow_mut().set_value(time, "17:45");
        picker.handle_event(&DomEvent::new(event_types::CHANGE, time));
        assert_eq!(picker.value(), Some(at(2020, 6, 15, 17, 45)));
        assert_eq!(picker.input(), "15/06/2020 17:45");

        doc.borrow_mut().set_value(time, "25:00");
        picker.handle_event(&DomEvent::new(event_types::CHANGE, time));
        assert_eq!(picker.value(), Some(at(2020, 6, 15, 17, 45)));
    }
}
