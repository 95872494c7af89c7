//! Simulated Session Demo
//!
//! Mounts a picker on an `<input>` inside a form, then replays a short user
//! session: focus, pick a month, pick a day, type a date, press Escape.
//! The document is printed as HTML after each step.
//!
//! Run with: RUST_LOG=dpicker=debug cargo run -p dpicker --example simulate

use dpicker::prelude::*;
use dpicker_vdom::to_html;

const OPTIONS: &str = r#"
min = "2020-01-01"
max = "2021-12-31"
first_day_of_week = 1
meridiem = false
step = 15
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let doc = Document::new().into_shared();
    let input = {
        let mut d = doc.borrow_mut();
        let body = d.body();
        let form = d.create_element("form");
        d.append_child(body, form);
        let input = d.create_element("input");
        d.set_attribute(input, "type", "datetime");
        d.set_attribute(input, "value", "15/06/2020 10:30");
        d.set_attribute(input, "format", "DD/MM/YYYY HH:mm");
        d.append_child(form, input);
        input
    };

    let mut picker = DatePicker::builder()
        .options(DatePickerOptions::from_toml_str(OPTIONS)?)
        .module(TimeModule::new())
        .module(ArrowNavigation::new())
        .on_change(|state, event| {
            println!(
                "  -> {} (model changed: {}) value={:?} valid={}",
                event.name,
                event.model_changed,
                state.model(),
                state.valid
            );
        })
        .mount(&doc, input)?;

    let show = |title: &str, picker: &DatePicker| {
        println!("\n== {title}");
        println!("{}", to_html(&doc.borrow(), picker.root()));
    };
    show("mounted", &picker);

    let Some(input) = picker.input_node() else {
        return Ok(());
    };
    picker.handle_event(&DomEvent::new(event_types::FOCUS, input));
    show("focused", &picker);

    let month = {
        let d = doc.borrow();
        d.query_all_tag(picker.root(), "select")
            .into_iter()
            .find(|&s| d.attribute(s, "name") == Some("dpicker-month"))
    };
    if let Some(month) = month {
        doc.borrow_mut().set_value(month, "9");
        picker.handle_event(&DomEvent::new(event_types::CHANGE, month));
    }

    let day = {
        let d = doc.borrow();
        d.query_all_tag(picker.root(), "button")
            .into_iter()
            .find(|&b| d.attribute(b, "value") == Some("21"))
    };
    if let Some(day) = day {
        picker.handle_event(&DomEvent::new(event_types::CLICK, day));
    }
    show("picked 21 September", &picker);

    doc.borrow_mut().set_value(input, "01/01/2019 08:00");
    picker.handle_event(&DomEvent::new(event_types::CHANGE, input));
    println!("\ntyped an out of range date, valid = {}", picker.valid());

    picker.handle_event(&DomEvent::new(event_types::FOCUS, input));
    picker.handle_event(
        &DomEvent::new(event_types::KEY_DOWN, input).with_key_code(key_codes::ESCAPE),
    );
    show("escaped", &picker);

    picker.release_listeners();
    Ok(())
}
