//! # Field Rules
//!
//! Checks that run before any write. The schema repeats the critical ones
//! (NOT NULL, CHECK, UNIQUE, foreign keys) so a bypassed check still fails.
//!
//! | Field            | Rule                                   |
//! |------------------|----------------------------------------|
//! | names            | non-blank, at most 100 chars           |
//! | NFC / RFID ids   | non-blank, at most 50 chars            |
//! | email            | one `@`, dotted domain, no whitespace  |
//! | price            | 0 ..= 99 999 999.99                    |
//! | quantity         | at least 1                             |
//! | ids              | UUID                                   |
//!
//! ## Usage
//! ```rust
//! use almacen_core::validation::{validate_tag_id, validate_email};
//!
//! assert!(validate_tag_id("04:A3:2B:1C").is_ok());
//! assert!(validate_email("ana@example.com").is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_PRICE_CENTS, MAX_TAG_FIELD_LEN};

pub type ValidationResult<T> = Result<T, ValidationError>;

// ---- text ----

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }

    Ok(())
}

/// Validates a category, product or user name.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_required_text(field, name, MAX_NAME_LEN)
}

/// Validates a physical tag identifier (RFID or NFC).
///
/// ```rust
/// use almacen_core::validation::validate_tag_id;
///
/// assert!(validate_tag_id("E2000017221101441890").is_ok());
/// assert!(validate_tag_id("").is_err());
/// assert!(validate_tag_id(&"A".repeat(51)).is_err());
/// ```
pub fn validate_tag_id(tag_id: &str) -> ValidationResult<()> {
    validate_required_text("tag_id", tag_id, MAX_TAG_FIELD_LEN)
}

/// Validates an NFC tag status (required).
pub fn validate_status(status: &str) -> ValidationResult<()> {
    validate_required_text("status", status, MAX_TAG_FIELD_LEN)
}

/// Validates an optional short tag field (RFID device id, RFID status).
pub fn validate_optional_tag_field(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_TAG_FIELD_LEN => {
            Err(ValidationError::too_long(field, MAX_TAG_FIELD_LEN))
        }
        _ => Ok(()),
    }
}

/// Email shape check, no deliverability.
///
/// - Exactly one `@`, non-empty local part
/// - Domain has a dot that is neither first nor last
/// - No whitespace, at most 254 characters
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > 254 {
        return Err(ValidationError::too_long("email", 254));
    }

    let invalid = || ValidationError::invalid_format("email", "must be a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rfind('.') {
        Some(dot) if dot > 0 && dot < domain.len() - 1 => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validates a password. Stored opaque; only presence and length are checked.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(ValidationError::too_long("password", MAX_PASSWORD_LEN));
    }

    Ok(())
}

// ---- numbers ----

/// Non-negative, fits ten digits with two decimals.
///
/// ```rust
/// use almacen_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a movement quantity: at least one unit.
///
/// Stricter than a plain integer column on purpose. The schema repeats the
/// rule as `CHECK (quantity > 0)`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    Ok(())
}

// ---- ids ----

/// Foreign-key fields must hold a UUID.
///
/// ```rust
/// use almacen_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))?;

    Ok(())
}
