//! Hotspot annotations and tooltip visibility

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ConfigError;

/// Hyperlink rendered below an annotation's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadLink {
    pub label: String,
    pub url: String,
}

/// Display content of a hotspot tooltip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Text lines, an empty line renders as a paragraph gap
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub links: Vec<PayloadLink>,
}

impl Payload {
    /// First non-empty line, used as the tooltip heading
    pub fn title(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
    }
}

/// A clickable scene object with an informational annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    /// Stable identifier compared against the active selection
    pub id: String,
    /// Id of the room object the hotspot is attached to
    pub object: String,
    /// Marker position relative to the object
    pub marker_offset: [f32; 3],
    /// Tooltip anchor relative to the object
    pub anchor_offset: [f32; 3],
    pub payload: Payload,
}

/// Render branch for a single hotspot tooltip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipView<'a> {
    Visible(&'a Payload),
    Hidden,
}

impl<'a> TooltipView<'a> {
    pub fn is_visible(&self) -> bool {
        matches!(self, TooltipView::Visible(_))
    }
}

impl Hotspot {
    /// Derive this hotspot's tooltip branch from the active annotation id
    pub fn view(&self, active: Option<&str>) -> TooltipView<'_> {
        match active {
            Some(id) if id == self.id => TooltipView::Visible(&self.payload),
            _ => TooltipView::Hidden,
        }
    }
}

/// Static list of hotspots, created once when the room is composed
#[derive(Debug, Clone, Default)]
pub struct AnnotationRegistry {
    hotspots: Vec<Hotspot>,
    index: HashMap<String, usize>,
}

impl AnnotationRegistry {
    /// Build a registry, rejecting duplicate ids
    pub fn new(hotspots: Vec<Hotspot>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(hotspots.len());
        for (i, hotspot) in hotspots.iter().enumerate() {
            if index.insert(hotspot.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateHotspot(hotspot.id.clone()));
            }
        }
        Ok(Self { hotspots, index })
    }

    pub fn get(&self, id: &str) -> Option<&Hotspot> {
        self.index.get(id).map(|&i| &self.hotspots[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.iter()
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot(id: &str) -> Hotspot {
        Hotspot {
            id: id.to_string(),
            object: format!("{id}_object"),
            marker_offset: [0.0, 0.5, 0.0],
            anchor_offset: [0.0, 1.0, 0.0],
            payload: Payload {
                lines: vec![String::new(), format!("{id} title"), "details".to_string()],
                links: Vec::new(),
            },
        }
    }

    #[test]
    fn test_view_matches_only_own_id() {
        let tv = hotspot("tv");

        assert_eq!(tv.view(Some("tv")), TooltipView::Visible(&tv.payload));
        assert_eq!(tv.view(Some("irlo")), TooltipView::Hidden);
        assert_eq!(tv.view(None), TooltipView::Hidden);
    }

    #[test]
    fn test_only_active_hotspot_is_visible() {
        let registry =
            AnnotationRegistry::new(vec![hotspot("tv"), hotspot("irlo"), hotspot("desk")]).unwrap();

        let visible: Vec<&str> = registry
            .iter()
            .filter(|h| h.view(Some("irlo")).is_visible())
            .map(|h| h.id.as_str())
            .collect();
        assert_eq!(visible, vec!["irlo"]);

        assert!(registry.iter().all(|h| !h.view(None).is_visible()));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = AnnotationRegistry::new(vec![hotspot("tv"), hotspot("tv")]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateHotspot(id) if id == "tv"));
    }

    #[test]
    fn test_payload_title_skips_blank_lines() {
        let h = hotspot("catan");
        assert_eq!(h.payload.title(), Some("catan title"));
        assert_eq!(Payload::default().title(), None);
    }
}
