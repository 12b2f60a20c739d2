use rand::Rng;

/// Inclusive range of the numeric suffix appended to generated usernames.
pub const SUFFIX_RANGE: std::ops::RangeInclusive<u32> = 1000..=9999;

/// Builds `lowercase(first_name + NNNN)` with a suffix drawn from `rng`.
///
/// Collisions between people sharing a first name are possible; nothing here
/// checks the store.
pub fn generate_username<R: Rng>(first_name: &str, rng: &mut R) -> String {
    let suffix = rng.random_range(SUFFIX_RANGE);
    format!("{first_name}{suffix}").to_lowercase()
}

#[must_use]
pub fn random_username(first_name: &str) -> String {
    generate_username(first_name, &mut rand::rng())
}
