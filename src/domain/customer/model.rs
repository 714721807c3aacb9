//! Customer / vehicle domain types and input normalization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

pub const PLATE_MIN_LEN: usize = 5;
pub const PLATE_MAX_LEN: usize = 20;
pub const DOCUMENT_MIN_LEN: usize = 8;
pub const DOCUMENT_MAX_LEN: usize = 20;

/// Identity document presented at entry or exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document type code, e.g. `DNI`, `CE`, `RUC`, `PASSPORT`
    pub doc_type: String,
    pub number: String,
}

impl DocumentRef {
    /// Build a normalized document reference: type uppercased, both
    /// parts trimmed.
    pub fn new(doc_type: &str, number: &str) -> Result<Self, DomainError> {
        let doc_type = doc_type.trim().to_uppercase();
        let number = number.trim().to_string();

        if doc_type.is_empty() {
            return Err(DomainError::Validation("document type is required".into()));
        }
        let len = number.chars().count();
        if !(DOCUMENT_MIN_LEN..=DOCUMENT_MAX_LEN).contains(&len) {
            return Err(DomainError::Validation(format!(
                "document number must have between {} and {} characters",
                DOCUMENT_MIN_LEN, DOCUMENT_MAX_LEN
            )));
        }
        Ok(Self { doc_type, number })
    }

    /// A document as shown at the gate: trimmed and uppercased, not
    /// validated. Anything that differs from the entry document,
    /// malformed or not, must reach the comparison.
    pub fn presented(doc_type: &str, number: &str) -> Self {
        Self {
            doc_type: doc_type.trim().to_uppercase(),
            number: number.trim().to_string(),
        }
    }

    /// Exact comparison used by the exit security gate.
    pub fn matches(&self, other: &DocumentRef) -> bool {
        self.doc_type == other.doc_type && self.number == other.number
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.doc_type, self.number)
    }
}

/// Trim and uppercase a plate, then check length and alphabet
/// (`A-Z`, `0-9`, `-`).
pub fn normalize_plate(plate: &str) -> Result<String, DomainError> {
    let plate = plate.trim().to_uppercase();
    let len = plate.chars().count();
    if !(PLATE_MIN_LEN..=PLATE_MAX_LEN).contains(&len) {
        return Err(DomainError::Validation(format!(
            "plate must have between {} and {} characters",
            PLATE_MIN_LEN, PLATE_MAX_LEN
        )));
    }
    if !plate
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(DomainError::Validation(
            "plate may only contain letters, digits and dashes".into(),
        ));
    }
    Ok(plate)
}

/// Optional contact details captured at entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactInfo {
    /// Normalize raw input: the full name is split at the first space,
    /// email lowercased, blanks dropped.
    pub fn from_raw(
        full_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Self {
        let (first_name, last_name) = match non_blank(full_name) {
            Some(name) => match name.split_once(char::is_whitespace) {
                Some((first, rest)) => (Some(first.to_string()), non_blank(Some(rest))),
                None => (Some(name), None),
            },
            None => (None, None),
        };
        Self {
            first_name,
            last_name,
            email: non_blank(email).map(|e| e.to_lowercase()),
            phone: non_blank(phone),
        }
    }

    /// Phone may hold digits, `+`, `-`, spaces and parentheses; email
    /// needs an `@` with text on both sides.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(phone) = &self.phone {
            if !phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
            {
                return Err(DomainError::Validation(format!("invalid phone '{}'", phone)));
            }
        }
        if let Some(email) = &self.email {
            let valid = match email.split_once('@') {
                Some((user, host)) => !user.is_empty() && host.contains('.'),
                None => false,
            };
            if !valid {
                return Err(DomainError::Validation(format!("invalid email '{}'", email)));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub id: i32,
    pub document: DocumentRef,
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> Option<String> {
        match (&self.contact.first_name, &self.contact.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: i32,
    pub plate_number: String,
    pub created_at: DateTime<Utc>,
}

// ── Tests ──────────────────────────────────────────────────────
