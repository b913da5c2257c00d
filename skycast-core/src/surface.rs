//! Display abstraction written to by the renderer and the presenter.
//!
//! A surface is write-only from the lookup pipeline's point of view: nothing is
//! ever read back from it to make decisions.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

/// Named output slots of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Coordinates,
    CurrentTemp,
    Location,
    /// Panel holding everything a successful lookup renders.
    Results,
    Loading,
    Error,
}

/// One rendered hourly forecast line.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRow {
    pub time: String,
    pub temperature: String,
    pub condition: Option<RowCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowCondition {
    pub text: String,
    pub icon_url: String,
}

pub trait Surface: Send + Sync {
    fn set_text(&self, element: Element, text: &str);

    fn set_visible(&self, element: Element, visible: bool);

    /// Enable or disable the control that triggers a lookup.
    fn set_enabled(&self, enabled: bool);

    fn clear_rows(&self);

    fn append_row(&self, row: HourlyRow);
}

/// Every write a [`MemorySurface`] received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Text(Element, String),
    Visible(Element, bool),
    Enabled(bool),
    ClearRows,
    AppendRow(HourlyRow),
}

#[derive(Debug, Default)]
struct MemoryState {
    texts: HashMap<Element, String>,
    visible: HashSet<Element>,
    disabled: bool,
    rows: Vec<HourlyRow>,
    events: Vec<SurfaceEvent>,
}

/// Headless surface that keeps the current state plus a log of writes.
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<MemoryState>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn text(&self, element: Element) -> Option<String> {
        self.lock().texts.get(&element).cloned()
    }

    pub fn is_visible(&self, element: Element) -> bool {
        self.lock().visible.contains(&element)
    }

    pub fn is_enabled(&self) -> bool {
        !self.lock().disabled
    }

    pub fn rows(&self) -> Vec<HourlyRow> {
        self.lock().rows.clone()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }
}

impl Surface for MemorySurface {
    fn set_text(&self, element: Element, text: &str) {
        let mut state = self.lock();
        state.texts.insert(element, text.to_string());
        state.events.push(SurfaceEvent::Text(element, text.to_string()));
    }

    fn set_visible(&self, element: Element, visible: bool) {
        let mut state = self.lock();
        if visible {
            state.visible.insert(element);
        } else {
            state.visible.remove(&element);
        }
        state.events.push(SurfaceEvent::Visible(element, visible));
    }

    fn set_enabled(&self, enabled: bool) {
        let mut state = self.lock();
        state.disabled = !enabled;
        state.events.push(SurfaceEvent::Enabled(enabled));
    }

    fn clear_rows(&self) {
        let mut state = self.lock();
        state.rows.clear();
        state.events.push(SurfaceEvent::ClearRows);
    }

    fn append_row(&self, row: HourlyRow) {
        let mut state = self.lock();
        state.rows.push(row.clone());
        state.events.push(SurfaceEvent::AppendRow(row));
    }
}
