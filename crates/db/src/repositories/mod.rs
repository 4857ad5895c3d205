//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod favorite_repo;
pub mod message_repo;
pub mod notification_repo;
pub mod phone_verification_repo;
pub mod profile_repo;
pub mod property_repo;
pub mod registration_repo;
pub mod session_repo;
pub mod sponsor_repo;
pub mod stats_repo;
pub mod subscription_repo;
pub mod tier_assignment_repo;
pub mod tier_repo;
pub mod user_repo;

pub use favorite_repo::FavoriteRepo;
pub use message_repo::MessageRepo;
pub use notification_repo::NotificationRepo;
pub use phone_verification_repo::PhoneVerificationRepo;
pub use profile_repo::ProfileRepo;
pub use property_repo::PropertyRepo;
pub use registration_repo::RegistrationRepo;
pub use session_repo::SessionRepo;
pub use sponsor_repo::SponsorRepo;
pub use stats_repo::StatsRepo;
pub use subscription_repo::SubscriptionRepo;
pub use tier_assignment_repo::TierAssignmentRepo;
pub use tier_repo::TierRepo;
pub use user_repo::UserRepo;
