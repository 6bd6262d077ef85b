//! Naming convention for cluster, application and namespace names
//!
//! A valid name consists of lowercase ASCII letters, digits and hyphens,
//! starts with a letter and does not end with a hyphen.

use std::fmt;

/// Why a name was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameViolation {
    Empty,
    InvalidCharacter(char),
    FirstCharNotLetter(char),
    TrailingHyphen,
}

impl fmt::Display for NameViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("name must not be empty"),
            Self::InvalidCharacter(c) => write!(
                f,
                "only lowercase letters, numbers, and hyphens are allowed (found '{}')",
                c
            ),
            Self::FirstCharNotLetter(c) => {
                write!(f, "first char must be a lowercase letter (found '{}')", c)
            }
            Self::TrailingHyphen => f.write_str("last char must be lowercase letter or number"),
        }
    }
}

impl std::error::Error for NameViolation {}

/// Check `name` against the naming convention
pub fn validate_name(name: &str) -> Result<(), NameViolation> {
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(NameViolation::InvalidCharacter(c));
    }

    let (Some(first), Some(last)) = (name.chars().next(), name.chars().last()) else {
        return Err(NameViolation::Empty);
    };
    if !first.is_ascii_lowercase() {
        return Err(NameViolation::FirstCharNotLetter(first));
    }
    if last == '-' {
        return Err(NameViolation::TrailingHyphen);
    }
    Ok(())
}
