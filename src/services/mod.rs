pub mod username;

pub mod profile_service;
pub mod profile_service_impl;
pub use profile_service::{ProfileError, ProfileOutcome, ProfileService};
pub use profile_service_impl::SeaOrmProfileService;
