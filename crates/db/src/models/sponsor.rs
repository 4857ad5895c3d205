use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `sponsors` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: DbId,
    pub name: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSponsor {
    pub name: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSponsor {
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}
