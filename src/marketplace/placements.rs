//! Catalog of ad placements products can target

use crate::sync::RwLockExt;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// A named slot on the page where ads render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub name: String,
}

impl Placement {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Known placements, in registration order
pub struct PlacementCatalog {
    placements: RwLock<Vec<Placement>>,
}

impl PlacementCatalog {
    /// An empty catalog
    #[must_use]
    pub fn empty() -> Self {
        Self {
            placements: RwLock::new(Vec::new()),
        }
    }

    /// Register a placement, replacing one with the same id
    pub fn register(&self, placement: Placement) {
        let mut placements = self.placements.write_recovered();
        match placements.iter_mut().find(|p| p.id == placement.id) {
            Some(existing) => *existing = placement,
            None => placements.push(placement),
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.placements.read_recovered().iter().any(|p| p.id == id)
    }

    /// Display name of `id`
    #[must_use]
    pub fn name(&self, id: &str) -> Option<String> {
        self.placements
            .read_recovered()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
    }

    #[must_use]
    pub fn list(&self) -> Vec<Placement> {
        self.placements.read_recovered().clone()
    }

    /// Product title for a set of placements: `"Ad – Below Header, Sidebar"`
    #[must_use]
    pub fn title_for(&self, placement_ids: &[String]) -> String {
        let names: Vec<String> = placement_ids
            .iter()
            .filter_map(|id| self.name(id))
            .collect();
        if names.is_empty() {
            "Ad".to_string()
        } else {
            format!("Ad \u{2013} {}", names.join(", "))
        }
    }
}

impl Default for PlacementCatalog {
    fn default() -> Self {
        let catalog = Self::empty();
        for (id, name) in [
            ("global_above_header", "Above Header"),
            ("global_below_header", "Below Header"),
            ("global_above_footer", "Above Footer"),
            ("sticky", "Mobile Sticky"),
            ("sidebar", "Sidebar"),
        ] {
            catalog.register(Placement::new(id, name));
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = PlacementCatalog::default();
        assert!(catalog.contains("global_below_header"));
        assert_eq!(catalog.name("sticky").as_deref(), Some("Mobile Sticky"));
        assert_eq!(catalog.list().len(), 5);
    }

    #[test]
    fn test_title_for() {
        let catalog = PlacementCatalog::default();
        assert_eq!(
            catalog.title_for(&["global_below_header".to_string()]),
            "Ad – Below Header"
        );
        assert_eq!(
            catalog.title_for(&["global_above_header".to_string(), "sidebar".to_string()]),
            "Ad – Above Header, Sidebar"
        );
        assert_eq!(catalog.title_for(&[]), "Ad");
    }

    #[test]
    fn test_register_replaces() {
        let catalog = PlacementCatalog::empty();
        catalog.register(Placement::new("in_article", "In Article"));
        catalog.register(Placement::new("in_article", "Inline"));
        assert_eq!(catalog.list(), vec![Placement::new("in_article", "Inline")]);
    }
}
