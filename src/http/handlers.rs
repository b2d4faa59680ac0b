//! Route handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::http::items::{Item, ItemCatalog};

/// `GET /`
pub async fn index() -> &'static str {
    "Site is up"
}

/// `GET /v1/items`
pub async fn list_items(State(catalog): State<Arc<ItemCatalog>>) -> Json<Vec<Item>> {
    let items = catalog.items().to_vec();
    tracing::debug!(count = items.len(), "Listing items");
    Json(items)
}
