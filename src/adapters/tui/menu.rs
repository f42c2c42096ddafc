//! Wallet Menu
//!
//! The dropdown that lists connectors (or the account and "Disconnect").
//! While it is open exactly one mouse-down listener is registered so a click
//! outside the menu closes it; every way of closing detaches it again.

use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Mouse-down listeners of the dashboard
///
/// Each listener may carry the screen region it belongs to; `outside` reports
/// the listeners a click did not land in.
#[derive(Debug, Default)]
pub struct MouseDownListeners {
    next_id: u64,
    entries: Vec<(ListenerId, Option<Rect>)>,
}

impl MouseDownListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, None));
        id
    }

    /// Remove a listener; false if it was not attached
    pub fn detach(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn set_region(&mut self, id: ListenerId, region: Rect) {
        if let Some(entry) = self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            entry.1 = Some(region);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Listeners whose region does not contain the click
    pub fn outside(&self, column: u16, row: u16) -> Vec<ListenerId> {
        self.entries
            .iter()
            .filter(|(_, region)| !region.is_some_and(|r| contains(r, column, row)))
            .map(|(id, _)| *id)
            .collect()
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

/// Dropdown state
#[derive(Debug, Default)]
pub struct WalletMenu {
    listener: Option<ListenerId>,
    selected: usize,
}

impl WalletMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.listener.is_some()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn open(&mut self, listeners: &mut MouseDownListeners) {
        if self.listener.is_none() {
            self.listener = Some(listeners.attach());
            self.selected = 0;
        }
    }

    pub fn close(&mut self, listeners: &mut MouseDownListeners) {
        if let Some(id) = self.listener.take() {
            listeners.detach(id);
        }
    }

    pub fn toggle(&mut self, listeners: &mut MouseDownListeners) {
        if self.is_open() {
            self.close(listeners);
        } else {
            self.open(listeners);
        }
    }

    /// Component teardown
    pub fn unmount(&mut self, listeners: &mut MouseDownListeners) {
        self.close(listeners);
    }

    /// Record where the menu is drawn
    pub fn set_area(&self, listeners: &mut MouseDownListeners, area: Rect) {
        if let Some(id) = self.listener {
            listeners.set_region(id, area);
        }
    }

    /// Close on a click outside the menu; returns true if it closed
    pub fn on_mouse_down(&mut self, listeners: &mut MouseDownListeners, column: u16, row: u16) -> bool {
        match self.listener {
            Some(id) if listeners.outside(column, row).contains(&id) => {
                self.close(listeners);
                true
            }
            _ => false,
        }
    }

    pub fn select_next(&mut self, item_count: usize) {
        if item_count > 0 {
            self.selected = (self.selected + 1) % item_count;
        }
    }

    pub fn select_previous(&mut self, item_count: usize) {
        if item_count > 0 {
            self.selected = (self.selected + item_count - 1) % item_count;
        }
    }
}
