//! View builder
//!
//! Pure functions from picker state to a virtual tree. Bindings are handler
//! names, so the same state always yields an equal tree with an equal hash.
//!
//! ```text
//! div.dpicker
//!   input#<input-id>[type=text]
//!   div.dpicker-container.dpicker-[visible|invisible]
//!     select[name=dpicker-month]      (slot "months")
//!     select[name=dpicker-year]       (slot "years")
//!     ...                             (module slots, e.g. "time")
//!     table                           (slot "days")
//!       tr > th * 7
//!       tr > td.dpicker-[active|inactive] > button|span
//! ```

use chrono::{Datelike, NaiveDate};
use dpicker_core::calendar;
use dpicker_core::DateAdapter;
use dpicker_vdom::{h, VElement, VNode};

use crate::handlers;
use crate::module::Composition;
use crate::state::PickerState;

pub const CLASS_ROOT: &str = "dpicker";
pub const CLASS_CONTAINER: &str = "dpicker-container";
pub const CLASS_VISIBLE: &str = "dpicker-visible";
pub const CLASS_INVISIBLE: &str = "dpicker-invisible";
pub const CLASS_INVALID: &str = "dpicker-invalid";
pub const CLASS_ACTIVE: &str = "dpicker-active";
pub const CLASS_INACTIVE: &str = "dpicker-inactive";
pub const CLASS_CURRENT: &str = "dpicker-current";

pub const SLOT_YEARS: &str = "years";
pub const SLOT_MONTHS: &str = "months";
pub const SLOT_DAYS: &str = "days";

/// Build the whole widget tree
pub fn render(state: &PickerState, adapter: &dyn DateAdapter, composition: &Composition) -> VNode {
    h("div")
        .class(CLASS_ROOT)
        .child(render_input(state, adapter))
        .child(render_popup(state, render_slots(state, adapter, composition)))
        .into()
}

/// The text input
pub fn render_input(state: &PickerState, adapter: &dyn DateAdapter) -> VNode {
    h("input")
        .id(&state.input_id)
        .attr("type", "text")
        .attr("name", &state.input_name)
        .attr("value", state.input_text(adapter))
        .attr("min", adapter.format(&state.min, &state.format))
        .attr("max", adapter.format(&state.max, &state.format))
        .attr("format", &state.format)
        .attr("aria-invalid", (!state.valid).to_string())
        .attr("aria-haspopup", "true")
        .class_if(!state.valid, CLASS_INVALID)
        .on_change(handlers::INPUT_CHANGE)
        .on_focus(handlers::INPUT_FOCUS)
        .on_blur(handlers::INPUT_BLUR)
        .into()
}

/// The popup holding the slots
pub fn render_popup(state: &PickerState, slots: Vec<VNode>) -> VNode {
    h("div")
        .class(CLASS_CONTAINER)
        .class(if state.display { CLASS_VISIBLE } else { CLASS_INVISIBLE })
        .attr("aria-hidden", (!state.display).to_string())
        .children(slots)
        .into()
}

/// Slots in `order`; unknown names and empty slots are skipped
pub fn render_slots(
    state: &PickerState,
    adapter: &dyn DateAdapter,
    composition: &Composition,
) -> Vec<VNode> {
    state
        .order
        .iter()
        .filter_map(|name| match name.as_str() {
            SLOT_YEARS => render_years(state),
            SLOT_MONTHS => render_months(state),
            SLOT_DAYS => render_days(state),
            other => composition
                .slot(other)
                .and_then(|builder| builder(state, adapter)),
        })
        .collect()
}

/// Year selector, newest first
pub fn render_years(state: &PickerState) -> Option<VNode> {
    let current = state.value.year();
    let years = (state.min.year()..=state.max.year()).rev();

    Some(
        h("select")
            .attr("name", "dpicker-year")
            .attr("aria-label", "Year")
            .on_change(handlers::YEAR_CHANGE)
            .children(years.map(|year| {
                h("option")
                    .key(year.to_string())
                    .attr("value", year.to_string())
                    .attr_if(year == current, "selected", "selected")
                    .text(year.to_string())
            }))
            .into(),
    )
}

/// Months selectable in the current year
pub fn visible_months(state: &PickerState) -> Vec<u32> {
    let year = state.value.year();
    (1..=12u32)
        .filter(|&m| state.max.year() != year || m <= state.max.month())
        .filter(|&m| state.min.year() != year || m >= state.min.month())
        .collect()
}

/// Month selector; option values are 1-based
pub fn render_months(state: &PickerState) -> Option<VNode> {
    let current = state.value.month();

    Some(
        h("select")
            .attr("name", "dpicker-month")
            .attr("aria-label", "Month")
            .on_change(handlers::MONTH_CHANGE)
            .children(visible_months(state).into_iter().map(|month| {
                let label = state
                    .months
                    .get(month as usize - 1)
                    .cloned()
                    .unwrap_or_else(|| month.to_string());
                h("option")
                    .key(month.to_string())
                    .attr("value", month.to_string())
                    .attr_if(month == current, "selected", "selected")
                    .text(label)
            }))
            .into(),
    )
}

// =============================================================================
// Day grid
// =============================================================================

/// Month a grid cell belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellMonth {
    Previous,
    Current,
    Next,
}

/// One cell of the day grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub month: CellMonth,
    /// Selectable
    pub active: bool,
    /// Carries the selection marker
    pub current: bool,
}

impl DayCell {
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Handler bound to the cell's button
    pub fn click_handler(&self) -> &'static str {
        match self.month {
            CellMonth::Previous => handlers::PREVIOUS_MONTH_DAY_CLICK,
            CellMonth::Current => handlers::DAY_CLICK,
            CellMonth::Next => handlers::NEXT_MONTH_DAY_CLICK,
        }
    }
}

/// Weekday headers and rows of seven cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<DayCell>>,
}

impl DayGrid {
    pub fn compute(state: &PickerState) -> Self {
        let first_day = state.first_day_of_week as u32 % 7;
        let first = calendar::first_of_month(&state.value);
        let days_in_month = calendar::days_in_month(first.year(), first.month());
        let lead = (calendar::weekday_from_sunday(&first) + 7 - first_day) % 7;
        let row_count = (lead + days_in_month).div_ceil(7);

        let headers = (0..7)
            .map(|i| {
                state
                    .days
                    .get(((first_day + i) % 7) as usize)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        let min = state.min.date();
        let max = state.max.date();
        let selected = state.value.day();

        let rows = (0..row_count)
            .map(|row| {
                (0..7)
                    .map(|col| {
                        let offset = (row * 7 + col) as i64 - lead as i64;
                        let date = first + chrono::Duration::days(offset);
                        let month = if offset < 0 {
                            CellMonth::Previous
                        } else if offset >= days_in_month as i64 {
                            CellMonth::Next
                        } else {
                            CellMonth::Current
                        };
                        let active = (month == CellMonth::Current || state.sibling_month_day_click)
                            && date >= min
                            && date <= max;
                        DayCell {
                            date,
                            month,
                            active,
                            current: month == CellMonth::Current && date.day() == selected,
                        }
                    })
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    /// Number of cells
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn cells(&self) -> impl Iterator<Item = &DayCell> {
        self.rows.iter().flatten()
    }
}

/// Day table
pub fn render_days(state: &PickerState) -> Option<VNode> {
    let grid = DayGrid::compute(state);

    let header = h("tr").children(grid.headers.iter().map(|label| h("th").text(label.as_str())));
    let rows = grid
        .rows
        .iter()
        .map(|row| h("tr").children(row.iter().map(render_cell)));

    Some(h("table").child(header).children(rows).into())
}

fn render_cell(cell: &DayCell) -> VElement {
    let day = cell.day().to_string();
    let content = if cell.active {
        h("button")
            .attr("type", "button")
            .attr("value", &day)
            .attr("aria-label", format!("Day {day}"))
            .on_click(cell.click_handler())
            .on_key_down(handlers::DAY_KEY_DOWN)
    } else {
        h("span")
    };
    let content = content
        .class_if(cell.current, CLASS_CURRENT)
        .attr_if(cell.current, "aria-current", "date")
        .text(day);

    h("td")
        .class(if cell.active { CLASS_ACTIVE } else { CLASS_INACTIVE })
        .child(content)
}
