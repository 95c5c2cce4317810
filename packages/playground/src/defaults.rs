//! Buffer contents a fresh session starts with.

/// The Star Wars schema
pub const DEFAULT_SCHEMA: &str = include_str!("defaults/star_wars.graphql");

/// `CharacterData` with one argument, spread twice by `UserProfile`
pub const DEFAULT_OPERATION: &str = include_str!("defaults/user_profile.graphql");
