//! Authentication and authorization extractors.
//!
//! - [`auth::Session`] -- the signed-in profile, re-read on every request.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireAgent`] -- requires an agent profile (admins pass too).

pub mod auth;
pub mod rbac;
