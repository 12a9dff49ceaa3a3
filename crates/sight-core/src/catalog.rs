//! Known real-world object heights used for monocular depth estimation.

use std::collections::HashMap;

/// Label → physical height (meters) lookup, built once per session.
///
/// The guidance engine estimates target depth from the apparent bounding-box
/// size, which only works for object classes with a known physical height.
/// Unknown labels yield `None` and the observation carries no depth.
#[derive(Clone, Debug)]
pub struct ItemCatalog {
    heights: HashMap<String, f32>,
}

impl ItemCatalog {
    /// Catalog seeded with the stock grocery/object classes.
    pub fn with_defaults() -> Self {
        let mut heights = HashMap::new();
        for (label, height) in [
            ("cell phone", 0.16),
            ("bottle", 0.30),
            ("cup", 0.10),
            ("deo", 0.14),
            ("tv", 0.33),
            ("banana", 0.21),
            ("orange", 0.095),
            ("QR_CODE", 0.12),
        ] {
            heights.insert(label.to_string(), height);
        }
        ItemCatalog { heights }
    }

    /// Empty catalog; useful when every class comes from configuration.
    pub fn empty() -> Self {
        ItemCatalog {
            heights: HashMap::new(),
        }
    }

    /// Register or override a class height. Non-positive heights are ignored.
    pub fn insert(&mut self, label: &str, height_m: f32) {
        if height_m > 0.0 {
            self.heights.insert(label.to_string(), height_m);
        } else {
            log::warn!("ignoring non-positive height {height_m} for label {label:?}");
        }
    }

    /// Physical height in meters for a detector label.
    pub fn height_m(&self, label: &str) -> Option<f32> {
        self.heights.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_stock_classes() {
        let catalog = ItemCatalog::with_defaults();
        assert_eq!(catalog.height_m("bottle"), Some(0.30));
        assert_eq!(catalog.height_m("orange"), Some(0.095));
        assert_eq!(catalog.height_m("spaceship"), None);
    }

    #[test]
    fn custom_entries_override_defaults() {
        let mut catalog = ItemCatalog::with_defaults();
        catalog.insert("bottle", 0.5);
        assert_eq!(catalog.height_m("bottle"), Some(0.5));
        catalog.insert("bad", -1.0);
        assert_eq!(catalog.height_m("bad"), None);
    }
}
