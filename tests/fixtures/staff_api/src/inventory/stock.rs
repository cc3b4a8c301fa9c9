use serde::Serialize;

/// A stocked item
#[derive(Debug, Serialize)]
pub struct Item {
    pub sku: String,
    pub count: u32,
}
