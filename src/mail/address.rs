//! Mailbox address parsing and generation.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::{Result, TempMailError};

/// Maximum length of the local part (RFC 5321).
pub const MAX_LOCAL_PART_LENGTH: usize = 64;

/// A normalized `local@domain` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    local: String,
    domain: String,
}

impl Address {
    /// Parse and normalize an address.
    ///
    /// The address is trimmed and lowercased. The local part may contain
    /// ASCII letters, digits, `.`, `_`, `+` and `-`, and may not start or end
    /// with a dot.
    pub fn parse(input: &str) -> Result<Self> {
        let normalized = input.trim().to_lowercase();
        let (local, domain) = normalized
            .split_once('@')
            .ok_or_else(|| TempMailError::Validation(format!("missing '@' in {input:?}")))?;

        if domain.contains('@') {
            return Err(TempMailError::Validation(format!(
                "more than one '@' in {input:?}"
            )));
        }
        validate_local_part(local)?;
        if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
            return Err(TempMailError::Validation(format!(
                "malformed domain in {input:?}"
            )));
        }
        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(TempMailError::Validation(format!(
                "malformed domain in {input:?}"
            )));
        }

        Ok(Self {
            local: local.to_string(),
            domain: domain.to_string(),
        })
    }

    /// Build an address from parts.
    pub fn from_parts(local: &str, domain: &str) -> Result<Self> {
        Self::parse(&format!("{local}@{domain}"))
    }

    /// Local part.
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Domain part.
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

fn validate_local_part(local: &str) -> Result<()> {
    if local.is_empty() {
        return Err(TempMailError::Validation("local part is empty".to_string()));
    }
    if local.len() > MAX_LOCAL_PART_LENGTH {
        return Err(TempMailError::Validation(format!(
            "local part exceeds {MAX_LOCAL_PART_LENGTH} characters"
        )));
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err(TempMailError::Validation(
            "local part has a misplaced dot".to_string(),
        ));
    }
    if let Some(c) = local
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')))
    {
        return Err(TempMailError::Validation(format!(
            "local part contains invalid character {c:?}"
        )));
    }
    Ok(())
}

/// Generate a random lowercase alphanumeric local part.
pub fn generate_local_part(len: usize) -> String {
    let len = len.clamp(1, MAX_LOCAL_PART_LENGTH);
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let addr = Address::parse("  John.Doe@Hide-Mail.ORG ").unwrap();
        assert_eq!(addr.local(), "john.doe");
        assert_eq!(addr.domain(), "hide-mail.org");
        assert_eq!(addr.to_string(), "john.doe@hide-mail.org");
    }

    #[test]
    fn test_parse_allows_plus_and_dash() {
        assert!(Address::parse("a+tag_x-y@private-mail.org").is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "",
            "nobody",
            "@hide-mail.org",
            "user@",
            "a@b@hide-mail.org",
            ".user@hide-mail.org",
            "user.@hide-mail.org",
            "us..er@hide-mail.org",
            "us er@hide-mail.org",
            "user:x@hide-mail.org",
            "user@.hide-mail.org",
            "user@hide mail.org",
        ] {
            assert!(
                matches!(Address::parse(input), Err(TempMailError::Validation(_))),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_long_local_part() {
        let local = "a".repeat(MAX_LOCAL_PART_LENGTH + 1);
        assert!(Address::from_parts(&local, "hide-mail.org").is_err());

        let local = "a".repeat(MAX_LOCAL_PART_LENGTH);
        assert!(Address::from_parts(&local, "hide-mail.org").is_ok());
    }

    #[test]
    fn test_generate_local_part() {
        let local = generate_local_part(10);
        assert_eq!(local.len(), 10);
        assert!(local
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(Address::from_parts(&local, "hide-mail.org").is_ok());
    }

    #[test]
    fn test_generate_local_part_clamps_length() {
        assert_eq!(generate_local_part(0).len(), 1);
        assert_eq!(generate_local_part(500).len(), MAX_LOCAL_PART_LENGTH);
    }
}
