use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{DietaryPreferences, Profile};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Unknown preference {0:?}")]
    UnknownPreference(String),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Cleans user input before it is stored.
pub fn normalize_profile(mut profile: Profile) -> Result<Profile, ProfileError> {
    profile.full_name = profile
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    profile.email = match profile.email.map(|e| e.trim().to_lowercase()) {
        Some(e) if e.is_empty() => None,
        Some(e) if !is_valid_email(&e) => return Err(ProfileError::InvalidEmail),
        other => other,
    };

    let mut seen = HashSet::new();
    profile.allergens = profile
        .allergens
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty() && seen.insert(a.to_lowercase()))
        .collect();

    Ok(profile)
}

pub fn toggle_preference(
    prefs: &mut DietaryPreferences,
    name: &str,
) -> Result<bool, ProfileError> {
    let flag = match name {
        "vegetarian" => &mut prefs.vegetarian,
        "vegan" => &mut prefs.vegan,
        "gluten_free" | "gluten-free" | "glutenFree" => &mut prefs.gluten_free,
        other => return Err(ProfileError::UnknownPreference(other.to_string())),
    };
    *flag = !*flag;
    Ok(*flag)
}
