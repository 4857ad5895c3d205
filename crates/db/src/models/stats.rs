use serde::Serialize;
use sqlx::FromRow;

/// Platform-wide counts for the admin dashboard.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct PlatformStats {
    pub clients: i64,
    pub agents: i64,
    pub admins: i64,
    pub active_properties: i64,
    pub paused_properties: i64,
    pub sold_properties: i64,
    pub rented_properties: i64,
    pub pending_registrations: i64,
    pub active_sponsors: i64,
}
