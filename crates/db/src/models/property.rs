//! Property listing model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use inmo_core::property::cover_image;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `properties` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Property {
    pub id: DbId,
    pub agent_id: DbId,
    pub title: String,
    pub description: Option<String>,
    /// Whole currency units.
    pub price: i64,
    pub currency: String,
    pub location: String,
    pub property_type: String,
    pub operation: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_m2: Option<f64>,
    pub images: Vec<String>,
    pub status: String,
    pub is_promoted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Listing as returned by the API: the row plus its cover image.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyResponse {
    #[serde(flatten)]
    pub property: Property,
    pub cover_image: String,
}

impl From<Property> for PropertyResponse {
    fn from(property: Property) -> Self {
        let cover_image = cover_image(&property.images).to_string();
        Self {
            property,
            cover_image,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateProperty {
    pub agent_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub currency: String,
    pub location: String,
    pub property_type: String,
    pub operation: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_m2: Option<f64>,
    pub images: Vec<String>,
}

/// Partial edit of a listing. Status and promotion have dedicated
/// operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProperty {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub operation: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_m2: Option<f64>,
}

/// Filters for the public search. `patterns` are `ILIKE` patterns that
/// must each match the title, location, description or property type.
#[derive(Debug, Clone, Default)]
pub struct PropertySearch {
    pub patterns: Vec<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    pub operation: Option<String>,
    pub property_type: Option<String>,
}

/// Listing counts per status for one agent.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct StatusCounts {
    pub active: i64,
    pub paused: i64,
    pub sold: i64,
    pub rented: i64,
}

/// Result of a write that puts a listing into `active` under the agent's
/// listing cap.
#[derive(Debug, Clone, PartialEq)]
pub enum CappedWrite<T> {
    Written(T),
    /// The agent already had `active` listings, at or over the cap.
    LimitReached { active: i64 },
    /// The agent profile or the listing does not exist.
    Missing,
}
