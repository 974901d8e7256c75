use arena_core::ItemKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::events::LiveEvent;

/// A sellable venue position. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub item_id: String,
    pub category: String,
    pub price_reference: String,
    pub kind: ItemKind,
}

/// One priced category and the item numbers that belong to it, as written
/// in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    pub price_reference: String,
    pub numbers: Vec<String>,
}

/// Static item and event tables, indexed by item number for O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct InventoryCatalog {
    items: HashMap<(ItemKind, String), CatalogItem>,
    categories: Vec<(ItemKind, String)>,
    events: Vec<LiveEvent>,
}

impl InventoryCatalog {
    pub fn new(
        suites: &[CategoryDefinition],
        tables: &[CategoryDefinition],
        events: Vec<LiveEvent>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for (kind, definitions) in [(ItemKind::Suite, suites), (ItemKind::Table, tables)] {
            for definition in definitions {
                catalog.add_category(kind, definition)?;
            }
        }

        for event in events {
            if catalog.events.iter().any(|e| e.id == event.id) {
                return Err(CatalogError::InvalidDefinition(format!("duplicate event '{}'", event.id)));
            }
            catalog.events.push(event);
        }

        Ok(catalog)
    }

    fn add_category(&mut self, kind: ItemKind, definition: &CategoryDefinition) -> Result<(), CatalogError> {
        let name = definition.name.trim();
        let price_reference = definition.price_reference.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidDefinition(format!("{} category without a name", kind)));
        }
        if price_reference.is_empty() {
            return Err(CatalogError::InvalidDefinition(format!("category '{}' has no price reference", name)));
        }

        for number in &definition.numbers {
            let item_id = number.trim().to_string();
            let key = (kind, item_id.clone());
            if let Some(existing) = self.items.get(&key) {
                return Err(CatalogError::DuplicateItem {
                    kind,
                    item_id,
                    first: existing.category.clone(),
                    second: name.to_string(),
                });
            }
            self.items.insert(key, CatalogItem {
                item_id,
                category: name.to_string(),
                price_reference: price_reference.to_string(),
                kind,
            });
        }

        self.categories.push((kind, name.to_string()));
        Ok(())
    }

    pub fn lookup(&self, kind: ItemKind, item_id: &str) -> Result<&CatalogItem, CatalogError> {
        self.items
            .get(&(kind, item_id.trim().to_string()))
            .ok_or_else(|| CatalogError::NotFound { kind, item_id: item_id.to_string() })
    }

    /// Reverse lookup: does `item_id` belong to `category`?
    pub fn belongs_to(&self, kind: ItemKind, item_id: &str, category: &str) -> bool {
        self.lookup(kind, item_id)
            .map(|item| item.category == category.trim())
            .unwrap_or(false)
    }

    pub fn categories(&self, kind: ItemKind) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }

    pub fn event(&self, event_id: &str) -> Result<&LiveEvent, CatalogError> {
        self.events
            .iter()
            .find(|e| e.id == event_id.trim())
            .ok_or_else(|| CatalogError::UnknownEvent(event_id.to_string()))
    }

    pub fn events(&self) -> &[LiveEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{kind} {item_id} not found in catalog")]
    NotFound { kind: ItemKind, item_id: String },

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("{kind} {item_id} listed in both '{first}' and '{second}'")]
    DuplicateItem {
        kind: ItemKind,
        item_id: String,
        first: String,
        second: String,
    },

    #[error("Invalid catalog definition: {0}")]
    InvalidDefinition(String),
}
