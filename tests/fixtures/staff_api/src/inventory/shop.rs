use serde::Serialize;

/// An item for sale
#[derive(Debug, Serialize)]
pub struct Item {
    pub sku: String,
    #[schema(minimum = 0.01)]
    pub price: f64,
}
