//! Row models and DTOs, one module per table (or closely related group).

pub mod favorite;
pub mod message;
pub mod notification;
pub mod phone_verification;
pub mod profile;
pub mod property;
pub mod registration;
pub mod session;
pub mod sponsor;
pub mod stats;
pub mod subscription;
pub mod tier;
pub mod tier_assignment;
pub mod user;
