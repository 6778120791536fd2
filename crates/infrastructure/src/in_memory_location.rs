use std::sync::{Mutex, PoisonError};

use opshub_application::LocationPort;

/// History-backed [`LocationPort`] for terminal front-ends and tests.
///
/// The last entry is the current location.
#[derive(Debug)]
pub struct InMemoryLocation {
    entries: Mutex<Vec<String>>,
}

impl InMemoryLocation {
    /// Creates a location whose only entry is `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            entries: Mutex::new(vec![query.trim().trim_start_matches('?').to_owned()]),
        }
    }

    /// Returns every history entry, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the current entry, like a browser's back button.
    ///
    /// Returns the new current query, or `None` when there is nothing to go back to.
    pub fn back(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() < 2 {
            return None;
        }

        entries.pop();
        entries.last().cloned()
    }
}

impl Default for InMemoryLocation {
    fn default() -> Self {
        Self::new("")
    }
}

impl LocationPort for InMemoryLocation {
    fn current_query(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn replace_query(&self, query: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.last_mut() {
            Some(current) => query.clone_into(current),
            None => entries.push(query.to_owned()),
        }
    }

    fn push_query(&self, query: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_owned());
    }
}
