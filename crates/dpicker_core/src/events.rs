//! Event type and key code constants
//!
//! Event types are small integers so handler bindings can be hashed and
//! compared cheaply when trees are diffed.

/// Identifies a kind of DOM event
pub type EventType = u32;

/// Numeric key code as reported by `keydown`
pub type KeyCode = u32;

/// Known event types
pub mod event_types {
    use super::EventType;

    pub const CLICK: EventType = 1;
    pub const CHANGE: EventType = 2;
    pub const FOCUS: EventType = 3;
    pub const BLUR: EventType = 4;
    pub const KEY_DOWN: EventType = 5;
    pub const TOUCH_END: EventType = 6;
}

/// Key codes the widget reacts to
pub mod key_codes {
    use super::KeyCode;

    pub const ENTER: KeyCode = 13;
    pub const ESCAPE: KeyCode = 27;
    pub const ARROW_LEFT: KeyCode = 37;
    pub const ARROW_UP: KeyCode = 38;
    pub const ARROW_RIGHT: KeyCode = 39;
    pub const ARROW_DOWN: KeyCode = 40;
}

/// DOM name of an event type, `"unknown"` for unregistered values
pub fn event_name(event_type: EventType) -> &'static str {
    match event_type {
        event_types::CLICK => "click",
        event_types::CHANGE => "change",
        event_types::FOCUS => "focus",
        event_types::BLUR => "blur",
        event_types::KEY_DOWN => "keydown",
        event_types::TOUCH_END => "touchend",
        _ => "unknown",
    }
}

/// Reverse of [`event_name`]
pub fn event_type_from_name(name: &str) -> Option<EventType> {
    match name {
        "click" => Some(event_types::CLICK),
        "change" => Some(event_types::CHANGE),
        "focus" => Some(event_types::FOCUS),
        "blur" => Some(event_types::BLUR),
        "keydown" => Some(event_types::KEY_DOWN),
        "touchend" => Some(event_types::TOUCH_END),
        _ => None,
    }
}
