//! Product drafts and records.
//!
//! Products belong to a store within a team. Price and stock arrive as
//! raw form strings and are parsed during validation.

use backend::StoredRecord;
use common::RecordId;
use serde::{Deserialize, Serialize};

use crate::file::FileUpload;
use crate::validation::{
    DraftError, ValidationError, parse_non_negative, parse_non_negative_int, require_known_id,
    require_min_len, require_unique_keys,
};

/// A custom key/value identifier attached to a product (barcode, SKU,
/// supplier code, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub key: String,
    pub value: String,
}

/// Form input for creating a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    /// Raw form value, parsed as a non-negative decimal.
    pub price: String,
    /// Raw form value, parsed as a non-negative integer.
    pub stock: String,
    /// Must be one of the team's stores.
    pub store_id: RecordId,
    pub identifiers: Vec<Identifier>,
    pub media: Option<FileUpload>,
}

impl ProductDraft {
    /// Validates every field against the team's known stores.
    /// Runs before any write.
    pub fn validate(&self, known_store_ids: &[RecordId]) -> Result<(), DraftError> {
        require_min_len("name", &self.name, 3)?;
        require_min_len("description", &self.description, 5)?;
        self.parsed_price()?;
        self.parsed_stock()?;
        require_known_id("store_id", self.store_id, known_store_ids)?;
        require_unique_keys(self.identifiers.iter().map(|i| i.key.as_str()))?;
        if let Some(media) = &self.media {
            media.validate()?;
        }
        Ok(())
    }

    /// Parses the price field.
    pub fn parsed_price(&self) -> Result<f64, ValidationError> {
        parse_non_negative("price", &self.price)
    }

    /// Parses the stock field.
    pub fn parsed_stock(&self) -> Result<u32, ValidationError> {
        parse_non_negative_int("stock", &self.stock)
    }

    /// The parent row to insert into `products`.
    ///
    /// Fails only if the numeric fields do not parse; `validate` has
    /// normally caught that already.
    pub fn parent_row(&self, team_id: RecordId) -> Result<serde_json::Value, ValidationError> {
        Ok(serde_json::json!({
            "team_id": team_id,
            "store_id": self.store_id,
            "name": self.name,
            "description": self.description,
            "price": self.parsed_price()?,
            "stock": self.parsed_stock()?,
            "media": null,
        }))
    }

    /// One row per identifier, minus the product foreign key.
    pub fn identifier_rows(&self) -> Vec<serde_json::Value> {
        self.identifiers
            .iter()
            .map(|i| serde_json::json!({ "key": i.key, "value": i.value }))
            .collect()
    }
}

#[derive(Deserialize)]
struct ProductFields {
    team_id: RecordId,
    store_id: RecordId,
    name: String,
    description: String,
    price: f64,
    stock: u32,
    media: Option<String>,
}

/// A product row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: RecordId,
    pub team_id: RecordId,
    pub store_id: RecordId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: u32,
    pub media: Option<String>,
}

impl ProductRecord {
    /// Parses a stored row into a typed record.
    pub fn from_stored(record: &StoredRecord) -> Result<Self, serde_json::Error> {
        let fields: ProductFields = serde_json::from_value(record.payload.clone())?;
        Ok(Self {
            id: record.id,
            team_id: fields.team_id,
            store_id: fields.store_id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            stock: fields.stock,
            media: fields.media,
        })
    }
}
