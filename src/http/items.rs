//! Item records and the in-memory catalog behind `/v1/items`.

use serde::{Deserialize, Serialize};

/// A catalog entry as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub cost: String,
    pub description: String,
}

/// Read-only item store.
#[derive(Debug, Clone)]
pub struct ItemCatalog {
    items: Vec<Item>,
}

impl ItemCatalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        let seed = [
            ("notebook", "4.50", "A5 dotted notebook, 120 pages"),
            ("pen", "1.20", "Black gel pen"),
            ("stapler", "9.99", "Full strip desktop stapler"),
        ];

        Self::new(
            seed.into_iter()
                .map(|(name, cost, description)| Item {
                    name: name.to_string(),
                    cost: cost.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        )
    }
}
