//! Arrow key navigation between day buttons
//!
//! Takes over `dayKeyDown`: left/right move to the previous/next active day
//! in reading order, up/down to the nearest active day in the same column.
//! All four directions wrap around the grid.

use std::rc::Rc;

use dpicker_core::key_codes;
use dpicker_vdom::{Document, EventContext, NodeId};

use crate::handlers::DAY_KEY_DOWN;
use crate::module::{Handler, Module};
use crate::picker::DatePicker;
use crate::view::CLASS_ACTIVE;

/// Moves focus across the day grid with the arrow keys
#[derive(Clone, Copy, Debug, Default)]
pub struct ArrowNavigation;

impl ArrowNavigation {
    pub fn new() -> Self {
        Self
    }
}

impl Module for ArrowNavigation {
    fn name(&self) -> &str {
        "arrow-navigation"
    }

    fn events(&self) -> Vec<(String, Handler)> {
        vec![(DAY_KEY_DOWN.to_string(), Rc::new(day_key_down) as Handler)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    fn from_key(key: u32) -> Option<Self> {
        match key {
            key_codes::ARROW_LEFT => Some(Direction::Left),
            key_codes::ARROW_UP => Some(Direction::Up),
            key_codes::ARROW_RIGHT => Some(Direction::Right),
            key_codes::ARROW_DOWN => Some(Direction::Down),
            _ => None,
        }
    }
}

fn day_key_down(picker: &mut DatePicker, ctx: &EventContext) {
    let Some(direction) = Direction::from_key(ctx.key_code()) else {
        return;
    };
    ctx.prevent_default();

    let document = picker.document();
    let mut doc = document.borrow_mut();
    if let Some(next) = DayCells::around(&doc, ctx.target()).and_then(|c| c.step(direction)) {
        doc.focus(next);
    }
}

/// Day table of the focused button, `None` for a cell without a button
struct DayCells {
    /// Per body row, the button of each cell
    rows: Vec<Vec<Option<NodeId>>>,
    row: usize,
    column: usize,
}

impl DayCells {
    fn around(doc: &Document, button: NodeId) -> Option<Self> {
        let td = doc.parent(button)?;
        let tr = doc.parent(td)?;
        let table = doc.parent(tr)?;

        let rows: Vec<Vec<Option<NodeId>>> = doc
            .children(table)
            .iter()
            .filter(|&&row| doc.children(row).iter().any(|&c| doc.tag(c) == Some("td")))
            .map(|&row| {
                doc.children(row)
                    .iter()
                    .map(|&cell| {
                        doc.has_class(cell, CLASS_ACTIVE)
                            .then(|| doc.query_tag(cell, "button"))
                            .flatten()
                    })
                    .collect()
            })
            .collect();

        let row = rows.iter().position(|r| r.contains(&Some(button)))?;
        let column = rows[row].iter().position(|&c| c == Some(button))?;
        Some(Self { rows, row, column })
    }

    fn step(&self, direction: Direction) -> Option<NodeId> {
        match direction {
            Direction::Left | Direction::Right => {
                let buttons: Vec<NodeId> = self.rows.iter().flatten().flatten().copied().collect();
                let current = self.rows[self.row][self.column]?;
                let index = buttons.iter().position(|&b| b == current)?;
                let n = buttons.len();
                let next = if direction == Direction::Left {
                    (index + n - 1) % n
                } else {
                    (index + 1) % n
                };
                buttons.get(next).copied()
            }
            Direction::Up | Direction::Down => {
                let n = self.rows.len();
                (1..=n).find_map(|offset| {
                    let row = if direction == Direction::Up {
                        (self.row + n * offset - offset) % n
                    } else {
                        (self.row + offset) % n
                    };
                    self.rows[row].get(self.column).copied().flatten()
                })
            }
        }
    }
}
