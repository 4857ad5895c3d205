//! Domain rules for the Inmo real-estate marketplace.
//!
//! This crate is free of I/O: it holds constants, validation helpers, the
//! subscription gate, the session state machine, and the other pure rules
//! that the database and API layers build on.

pub mod change_feed;
pub mod error;
pub mod links;
pub mod otp;
pub mod profile;
pub mod property;
pub mod registration;
pub mod roles;
pub mod seo;
pub mod session;
pub mod sponsor;
pub mod subscription_gate;
pub mod tier;
pub mod types;
