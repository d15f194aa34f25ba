//! Single active-annotation selection

use tracing::debug;

/// The one active annotation for the mounted room, if any
///
/// Ids are not validated: callers only ever toggle ids taken from the
/// annotation registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    active: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id`, or deselect it when it is already active
    pub fn toggle(&mut self, id: &str) {
        if self.is_active(id) {
            debug!("Annotation '{}' closed", id);
            self.active = None;
        } else {
            debug!("Annotation '{}' opened (was {:?})", id, self.active);
            self.active = Some(id.to_string());
        }
    }

    /// Deselect unconditionally; returns whether anything was selected
    pub fn clear(&mut self) -> bool {
        match self.active.take() {
            Some(id) => {
                debug!("Annotation '{}' cleared", id);
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.as_deref() == Some(id)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_toggle_wins() {
        let mut selection = Selection::new();

        selection.toggle("irlo");
        selection.toggle("tv");

        assert_eq!(selection.active(), Some("tv"));
        assert!(selection.is_active("tv"));
        assert!(!selection.is_active("irlo"));
    }

    #[test]
    fn test_toggle_same_id_twice_deselects() {
        let mut selection = Selection::new();

        selection.toggle("tv");
        assert_eq!(selection.active(), Some("tv"));

        selection.toggle("tv");
        assert_eq!(selection.active(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut selection = Selection::new();
        assert!(!selection.clear());
        assert_eq!(selection, Selection::new());

        selection.toggle("desk");
        assert!(selection.clear());
        assert!(!selection.clear());
        assert_eq!(selection.active(), None);
    }

    #[test]
    fn test_unknown_ids_accepted() {
        let mut selection = Selection::new();
        selection.toggle("not-in-registry");
        assert!(selection.is_active("not-in-registry"));
    }

    #[test]
    fn test_click_scenario() {
        let mut selection = Selection::new();

        // Click "tv": opens
        selection.toggle("tv");
        assert_eq!(selection.active(), Some("tv"));

        // Click "tv" again: closes
        selection.toggle("tv");
        assert_eq!(selection.active(), None);

        // Click "irlo" then "tv": only the last stays open
        selection.toggle("irlo");
        selection.toggle("tv");
        assert_eq!(selection.active(), Some("tv"));

        // Background click closes it
        assert!(selection.clear());
        assert_eq!(selection.active(), None);
    }
}
