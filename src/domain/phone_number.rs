use std::fmt;

/// Canonical user identifier: `whatsapp:+<digits>`.
///
/// Inbound webhooks and operator input arrive in several shapes
/// (`+919876543210`, `919876543210`, `whatsapp:+91...`, `00 91...`); every
/// variant normalizes to one canonical string so the same person always maps
/// to the same account row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("whatsapp:") {
            return Self(trimmed.to_string());
        }

        let compact: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();

        let digits: String = if let Some(rest) = compact.strip_prefix('+') {
            rest.chars().filter(|c| c.is_ascii_digit()).collect()
        } else if let Some(rest) = compact.strip_prefix("00") {
            rest.chars().filter(|c| c.is_ascii_digit()).collect()
        } else {
            compact.chars().filter(|c| c.is_ascii_digit()).collect()
        };

        Self(format!("whatsapp:+{}", digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rehydrate a value already stored in canonical form.
    pub fn from_canonical(stored: String) -> Self {
        Self(stored)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
