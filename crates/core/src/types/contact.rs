//! Checkout contact email.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reasons a checkout email is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactEmailError {
    #[error("email is required")]
    Missing,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must look like name@domain.tld")]
    Malformed,
}

/// An email address entered on the checkout form.
///
/// Surrounding whitespace is trimmed. The address needs a non-empty local
/// part, exactly one `@`, and a domain containing a dot that neither starts
/// nor ends the domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize a checkout email.
    ///
    /// # Errors
    ///
    /// Returns [`ContactEmailError`] when the input is blank, too long or
    /// structurally invalid.
    pub fn parse(input: &str) -> Result<Self, ContactEmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ContactEmailError::Missing);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(ContactEmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = trimmed
            .split_once('@')
            .ok_or(ContactEmailError::Malformed)?;
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || trimmed.chars().any(char::is_whitespace) {
            return Err(ContactEmailError::Malformed);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// The address as entered (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
