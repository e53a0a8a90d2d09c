//! Page selection state driven by clicks, modifier keys and free-text ranges.

use std::collections::BTreeSet;

use crate::page_range;

/// Keys whose state changes how a click is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Shift,
    Ctrl,
    A,
}

impl Key {
    /// Parse a key name as typed by a user ("shift", "ctrl", "control", "a").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "shift" => Some(Key::Shift),
            "ctrl" | "control" => Some(Key::Ctrl),
            "a" => Some(Key::A),
            _ => None,
        }
    }
}

/// Which modifier keys are currently held down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub a: bool,
}

impl Modifiers {
    pub fn key_down(&mut self, key: Key) {
        self.set(key, true);
    }

    pub fn key_up(&mut self, key: Key) {
        self.set(key, false);
    }

    fn set(&mut self, key: Key, down: bool) {
        match key {
            Key::Shift => self.shift = down,
            Key::Ctrl => self.ctrl = down,
            Key::A => self.a = down,
        }
    }

    /// Both ctrl and "a" are held.
    pub fn select_all_chord(&self) -> bool {
        self.ctrl && self.a
    }
}

/// The set of selected pages plus the anchor used for shift-click ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: BTreeSet<u32>,
    anchor: Option<u32>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a click on `page`.
    ///
    /// With shift held and an anchor present, every page between the anchor
    /// and `page` is added and the anchor stays where it was. Otherwise the
    /// page is toggled and becomes the new anchor.
    pub fn toggle_page(&mut self, page: u32, modifiers: Modifiers) -> &BTreeSet<u32> {
        self.toggle_page_within(page, modifiers, u32::MAX)
    }

    /// Like [`toggle_page`](Self::toggle_page), but a shift range never adds
    /// pages above `last_page`.
    pub fn toggle_page_within(
        &mut self,
        page: u32,
        modifiers: Modifiers,
        last_page: u32,
    ) -> &BTreeSet<u32> {
        match self.anchor {
            Some(anchor) if modifiers.shift => {
                let (start, end) = (anchor.min(page), anchor.max(page).min(last_page));
                self.selected.extend(start..=end);
            }
            _ => {
                if !self.selected.remove(&page) {
                    self.selected.insert(page);
                }
                self.anchor = Some(page);
            }
        }
        &self.selected
    }

    /// Replace the selection with every page from 1 to `total_pages`.
    pub fn select_all(&mut self, total_pages: u32) -> &BTreeSet<u32> {
        self.selected = (1..=total_pages).collect();
        &self.selected
    }

    /// Replace the selection with the pages named by a range string.
    pub fn set_from_text(&mut self, text: &str) -> &BTreeSet<u32> {
        self.selected = page_range::decode(text);
        self.anchor = self.selected.last().copied();
        &self.selected
    }

    pub fn current_range_text(&self) -> String {
        page_range::encode(&self.selected)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    pub fn selected(&self) -> &BTreeSet<u32> {
        &self.selected
    }

    /// Selected pages in ascending order.
    pub fn pages(&self) -> Vec<u32> {
        self.selected.iter().copied().collect()
    }

    pub fn anchor(&self) -> Option<u32> {
        self.anchor
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
