use std::{
    collections::HashMap,
    io::{self, Write},
    sync::{Mutex, MutexGuard},
};

use skycast_core::{
    Element, HourlyRow, Surface,
    surface::RowCondition,
};

#[derive(Debug, Default)]
struct Screen {
    texts: HashMap<Element, String>,
    rows: Vec<HourlyRow>,
    location_visible: bool,
}

type Sink = Box<dyn Write + Send>;

/// Prints the results panel to `out` once a lookup completes and banners to `err`.
pub struct TerminalSurface {
    screen: Mutex<Screen>,
    out: Mutex<Sink>,
    err: Mutex<Sink>,
}

impl TerminalSurface {
    pub fn stdio() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(out: Sink, err: Sink) -> Self {
        Self { screen: Mutex::new(Screen::default()), out: Mutex::new(out), err: Mutex::new(err) }
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_to(sink: &Mutex<Sink>, text: &str) {
        let mut sink = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = sink.write_all(text.as_bytes()).and_then(|_| sink.flush()) {
            log::warn!("failed to write to terminal: {err}");
        }
    }

    fn panel(screen: &Screen) -> String {
        let text = |element: Element| screen.texts.get(&element).map(String::as_str).unwrap_or("");
        let mut panel = String::new();

        if screen.location_visible {
            panel.push_str(&format!("Location:     {}\n", text(Element::Location)));
        }
        panel.push_str(&format!("Coordinates:  {}\n", text(Element::Coordinates)));
        panel.push_str(&format!("Current temp: {}\n", text(Element::CurrentTemp)));

        if !screen.rows.is_empty() {
            panel.push_str("\nHourly forecast:\n");
            for row in &screen.rows {
                panel.push_str(&format!("  {:<18} {:>8}", row.time, row.temperature));
                if let Some(RowCondition { text, .. }) = &row.condition {
                    panel.push_str(&format!("  {text}"));
                }
                panel.push('\n');
            }
        }

        panel
    }
}

impl Surface for TerminalSurface {
    fn set_text(&self, element: Element, text: &str) {
        self.screen().texts.insert(element, text.to_string());
    }

    fn set_visible(&self, element: Element, visible: bool) {
        match (element, visible) {
            (Element::Results, true) => {
                let panel = Self::panel(&self.screen());
                Self::write_to(&self.out, &panel);
            }
            (Element::Loading, true) => Self::write_to(&self.err, "Fetching weather data...\n"),
            (Element::Error, true) => {
                let message = self.screen().texts.get(&Element::Error).cloned().unwrap_or_default();
                Self::write_to(&self.err, &format!("error: {message}\n"));
            }
            (Element::Error, false) => log::trace!("error banner dismissed"),
            (Element::Location, shown) => self.screen().location_visible = shown,
            _ => {}
        }
    }

    fn set_enabled(&self, enabled: bool) {
        log::trace!("lookup trigger enabled: {enabled}");
    }

    fn clear_rows(&self) {
        self.screen().rows.clear();
    }

    fn append_row(&self, row: HourlyRow) {
        self.screen().rows.push(row);
    }
}
