use std::sync::Arc;

use serde::Serialize;

use crate::callbacks::*;

/// What the browser view displays.
#[derive(uniffi::Enum, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "surface", rename_all = "snake_case")]
pub enum Surface {
    /// The bundled welcome page, shown while no session data exists.
    Entry,
    /// The hosted application.
    Target { url: String },
}

/// Where the shell starts, derived from the persisted cookie set.
#[derive(uniffi::Enum, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryPoint {
    Welcome,
    Target,
}

#[derive(Clone, Default)]
struct HandlerInternal(pub Option<Arc<dyn NavEventHandler>>);

impl std::fmt::Debug for HandlerInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_some() {
            write!(f, "Handler Active")?;
        } else {
            write!(f, "No Handler Present")?;
        };
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error, uniffi::Error)]
pub enum NavigationError {
    #[error("Navigation was prevented by a user handler")]
    PreventedByHandler,
}

/// Oldest entries are dropped once the history grows past this.
pub const MAX_HISTORY: usize = 64;

/// The navigation context.
/// Tracks which surfaces have been shown, in order.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    /// The last [MAX_HISTORY] shown surfaces, the last one is current
    history: Vec<NavHistoryEntry>,
    /// monotonically increasing ID for `NavHistoryEntry`
    id_source: HistoryId,
    /// user provided callback
    navigation_event_handler: HandlerInternal,
}

impl Navigator {
    /// Move to `surface`, returning the id of the new current entry.
    /// Showing the current surface again is reported as a reload and keeps the
    /// entry id.
    pub fn navigate(&mut self, surface: Surface) -> Result<HistoryId, NavigationError> {
        let current = self.current();

        if let Some(current) = current.filter(|entry| entry.surface == surface) {
            let event = NavEvent {
                event: NavEventType::Reload,
                from: Some(current.clone()),
                to: current.clone(),
            };
            return match self.handle_event(event) {
                HandlerResponse::Default => Ok(current.id),
                HandlerResponse::PreventDefault => Err(NavigationError::PreventedByHandler),
            };
        }

        let next_dest = self.speculative_next_dest(surface);
        let next_id = next_dest.id;
        let event = NavEvent {
            event: NavEventType::Push,
            from: self.current(),
            to: next_dest.clone(),
        };

        match self.handle_event(event) {
            HandlerResponse::Default => {}
            HandlerResponse::PreventDefault => return Err(NavigationError::PreventedByHandler),
        };

        self.push_entry(next_dest);
        Ok(next_id)
    }

    pub fn current(&self) -> Option<NavHistoryEntry> {
        self.history.last().cloned()
    }

    // Returns all of the tracked history entries by cloning them, oldest first.
    pub fn entries(&self) -> Vec<NavHistoryEntry> {
        self.history.clone()
    }

    pub fn set_event_handler(&mut self, handler: Arc<dyn NavEventHandler>) {
        self.navigation_event_handler.0 = Some(handler)
    }

    fn handle_event(&self, event: NavEvent) -> HandlerResponse {
        if let Some(handler) = self.navigation_event_handler.0.as_ref() {
            handler.handle_event(event)
        } else {
            HandlerResponse::Default
        }
    }

    fn push_entry(&mut self, history_entry: NavHistoryEntry) {
        self.id_source += 1;
        self.history.push(history_entry);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }

    /// create a new destination if one would be added to history, this includes
    /// the next unique ID that would be issued.
    fn speculative_next_dest(&self, surface: Surface) -> NavHistoryEntry {
        NavHistoryEntry::new(self.id_source + 1, surface)
    }
}
