//! Built-in event handlers
//!
//! Each handler translates one event into a state mutation, then redraws and
//! notifies the host. Handlers whose precondition does not hold return
//! without touching state and without notifying.

use std::rc::Rc;

use dpicker_core::calendar;
use dpicker_core::key_codes;
use dpicker_vdom::EventContext;
use tracing::debug;

use crate::module::Handler;
use crate::picker::DatePicker;

pub const INPUT_CHANGE: &str = "inputChange";
pub const INPUT_FOCUS: &str = "inputFocus";
pub const INPUT_BLUR: &str = "inputBlur";
pub const HIDE: &str = "hide";
pub const YEAR_CHANGE: &str = "yearChange";
pub const MONTH_CHANGE: &str = "monthChange";
pub const DAY_CLICK: &str = "dayClick";
pub const PREVIOUS_MONTH_DAY_CLICK: &str = "previousMonthDayClick";
pub const NEXT_MONTH_DAY_CLICK: &str = "nextMonthDayClick";
pub const DAY_KEY_DOWN: &str = "dayKeyDown";
pub const KEY_DOWN: &str = "keyDown";

/// The built-in handler table
pub fn builtin() -> Vec<(&'static str, Handler)> {
    vec![
        (INPUT_CHANGE, Rc::new(input_change) as Handler),
        (INPUT_FOCUS, Rc::new(input_focus) as Handler),
        (INPUT_BLUR, Rc::new(input_blur) as Handler),
        (HIDE, Rc::new(hide) as Handler),
        (YEAR_CHANGE, Rc::new(year_change) as Handler),
        (MONTH_CHANGE, Rc::new(month_change) as Handler),
        (DAY_CLICK, Rc::new(day_click) as Handler),
        (PREVIOUS_MONTH_DAY_CLICK, Rc::new(previous_month_day_click) as Handler),
        (NEXT_MONTH_DAY_CLICK, Rc::new(next_month_day_click) as Handler),
        (DAY_KEY_DOWN, Rc::new(day_key_down) as Handler),
        (KEY_DOWN, Rc::new(key_down) as Handler),
    ]
}

/// Commit typed text
pub fn input_change(picker: &mut DatePicker, ctx: &EventContext) {
    let text = ctx.target_value.clone().unwrap_or_default();

    if text.is_empty() {
        picker.state_mut().empty = true;
    } else {
        let parsed = match picker.adapter().parse_strict(&text, &picker.state().format) {
            Ok(date) => Some(date),
            Err(err) => {
                debug!(%text, %err, "keeping previous value");
                None
            }
        };
        let state = picker.state_mut();
        if state.check_validity(parsed.as_ref()) {
            if let Some(date) = parsed {
                state.value = date;
            }
        }
        state.empty = false;
    }

    picker.redraw();
    picker.notify(true, INPUT_CHANGE, Some(&ctx.event));
}

/// Show the popup and select the input text
pub fn input_focus(picker: &mut DatePicker, ctx: &EventContext) {
    picker.state_mut().display = true;
    picker.document().borrow_mut().select_text(ctx.target());

    picker.redraw();
    picker.notify(false, INPUT_FOCUS, Some(&ctx.event));
}

/// Hide the popup when focus leaves the widget
pub fn input_blur(picker: &mut DatePicker, ctx: &EventContext) {
    if !picker.state().display {
        return;
    }
    let node = ctx.related_target().unwrap_or_else(|| ctx.target());
    if picker.is_inside_container(node) {
        return;
    }

    picker.state_mut().display = false;
    picker.redraw();
    picker.notify(false, INPUT_BLUR, Some(&ctx.event));
}

/// Hide the popup on a click outside the widget
pub fn hide(picker: &mut DatePicker, ctx: &EventContext) {
    if !picker.state().display || !picker.state().hide_on_outside_click {
        return;
    }
    if picker.is_inside_container(ctx.target()) {
        return;
    }

    picker.state_mut().display = false;
    picker.redraw();
    picker.notify(false, HIDE, Some(&ctx.event));
}

/// Year selector changed
pub fn year_change(picker: &mut DatePicker, ctx: &EventContext) {
    let Some(year) = parse_target::<i32>(ctx, YEAR_CHANGE) else {
        return;
    };

    let state = picker.state_mut();
    state.empty = false;
    state.value = calendar::with_year(&state.value, year);
    state.revalidate();

    picker.redraw();
    picker.notify(true, YEAR_CHANGE, Some(&ctx.event));
}

/// Month selector changed; option values are 1-based
pub fn month_change(picker: &mut DatePicker, ctx: &EventContext) {
    let Some(month) = parse_target::<u32>(ctx, MONTH_CHANGE).filter(|m| (1..=12).contains(m))
    else {
        return;
    };

    let state = picker.state_mut();
    state.empty = false;
    state.value = calendar::with_month(&state.value, month);
    state.revalidate();

    picker.redraw();
    picker.notify(true, MONTH_CHANGE, Some(&ctx.event));
}

/// Day of the displayed month clicked
pub fn day_click(picker: &mut DatePicker, ctx: &EventContext) {
    select_day(picker, ctx, DAY_CLICK, 0);
}

/// Trailing day of the previous month clicked
pub fn previous_month_day_click(picker: &mut DatePicker, ctx: &EventContext) {
    if !picker.state().sibling_month_day_click {
        return;
    }
    select_day(picker, ctx, PREVIOUS_MONTH_DAY_CLICK, -1);
}

/// Leading day of the next month clicked
pub fn next_month_day_click(picker: &mut DatePicker, ctx: &EventContext) {
    if !picker.state().sibling_month_day_click {
        return;
    }
    select_day(picker, ctx, NEXT_MONTH_DAY_CLICK, 1);
}

/// Keyboard on a day button; modules may take over
pub fn day_key_down(_picker: &mut DatePicker, _ctx: &EventContext) {}

/// Enter or Escape inside the widget closes the popup
pub fn key_down(picker: &mut DatePicker, ctx: &EventContext) {
    if !picker.state().hide_on_enter {
        return;
    }
    if !matches!(ctx.key_code(), key_codes::ENTER | key_codes::ESCAPE) {
        return;
    }

    if let Some(input) = picker.input_node() {
        picker.document().borrow_mut().blur(input);
    }
    picker.state_mut().display = false;
    picker.redraw();
    picker.notify(false, KEY_DOWN, Some(&ctx.event));
}

fn select_day(picker: &mut DatePicker, ctx: &EventContext, name: &str, month_delta: i32) {
    let Some(day) = parse_target::<u32>(ctx, name) else {
        return;
    };
    let value = picker.state().value;
    let shifted = calendar::add_months(&value, month_delta);
    let Some(date) = calendar::with_day(&shifted, day) else {
        debug!(day, handler = name, "day does not exist in target month");
        return;
    };

    ctx.prevent_default();
    ctx.stop_propagation();

    let state = picker.state_mut();
    state.value = date;
    state.empty = false;
    if state.hide_on_day_click {
        state.display = false;
    }
    state.revalidate();

    picker.redraw();
    picker.notify(true, name, Some(&ctx.event));
}

fn parse_target<T: std::str::FromStr>(ctx: &EventContext, handler: &str) -> Option<T> {
    let text = ctx.target_value.as_deref()?.trim();
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(handler, text, "ignoring unparseable target value");
            None
        }
    }
}
