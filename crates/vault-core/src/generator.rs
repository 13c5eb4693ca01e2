//! Password generator used to fill the password field of the edit form.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MIN_LENGTH: usize = 5;
pub const MAX_LENGTH: usize = 128;

const LOWERCASE: &str = "abcdefghijkmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ";
const NUMBERS: &str = "23456789";
const SPECIAL: &str = "!@#$%^&*";
const AMBIGUOUS_LOWERCASE: &str = "l";
const AMBIGUOUS_UPPERCASE: &str = "IO";
const AMBIGUOUS_NUMBERS: &str = "01";

/// Character set and length rules for generated passwords
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PasswordOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub numbers: bool,
    pub special: bool,
    /// Minimum count of digits when `numbers` is enabled
    pub min_numbers: usize,
    /// Minimum count of special characters when `special` is enabled
    pub min_special: usize,
    /// Leave out look-alike characters such as `l`, `1`, `O` and `0`
    pub avoid_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 14,
            uppercase: true,
            lowercase: true,
            numbers: true,
            special: false,
            min_numbers: 1,
            min_special: 1,
            avoid_ambiguous: false,
        }
    }
}

impl PasswordOptions {
    fn pools(&self) -> Vec<(String, usize)> {
        let pool = |base: &str, ambiguous: &str| {
            if self.avoid_ambiguous {
                base.to_string()
            } else {
                format!("{base}{ambiguous}")
            }
        };

        let mut pools = Vec::new();
        if self.lowercase {
            pools.push((pool(LOWERCASE, AMBIGUOUS_LOWERCASE), 1));
        }
        if self.uppercase {
            pools.push((pool(UPPERCASE, AMBIGUOUS_UPPERCASE), 1));
        }
        if self.numbers {
            pools.push((pool(NUMBERS, AMBIGUOUS_NUMBERS), self.min_numbers.max(1)));
        }
        if self.special {
            pools.push((SPECIAL.to_string(), self.min_special.max(1)));
        }
        pools
    }
}

/// Generate a random password.
///
/// Every enabled character set contributes at least one character (or its
/// configured minimum); remaining positions draw from all enabled sets.
pub fn generate_password(options: &PasswordOptions) -> Result<String> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&options.length) {
        return Err(Error::InvalidInput(format!(
            "Password length must be between {MIN_LENGTH} and {MAX_LENGTH}"
        )));
    }

    let pools = options
        .pools()
        .into_iter()
        .map(|(chars, minimum)| (chars.chars().collect::<Vec<_>>(), minimum))
        .collect::<Vec<_>>();
    if pools.is_empty() {
        return Err(Error::InvalidInput(
            "At least one character set must be enabled".to_string(),
        ));
    }

    let required = pools.iter().map(|(_, minimum)| minimum).sum::<usize>();
    if required > options.length {
        return Err(Error::InvalidInput(format!(
            "Password length {} is too short for the required characters ({required})",
            options.length
        )));
    }

    let mut rng = OsRng;
    let mut password = Vec::with_capacity(options.length);
    for (chars, minimum) in &pools {
        for _ in 0..*minimum {
            password.push(chars[rng.gen_range(0..chars.len())]);
        }
    }

    let all = pools
        .iter()
        .flat_map(|(chars, _)| chars.iter().copied())
        .collect::<Vec<_>>();
    while password.len() < options.length {
        password.push(all[rng.gen_range(0..all.len())]);
    }

    password.shuffle(&mut rng);
    Ok(password.into_iter().collect())
}
