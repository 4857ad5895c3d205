//! Profile field rules and privacy masking.

use crate::error::CoreError;
use crate::links::phone_digits;

pub const MAX_BIO_LENGTH: usize = 2_000;

/// Contact details as stored, before privacy flags are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
}

/// Privacy switches chosen by the profile owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivacyFlags {
    pub show_email: bool,
    pub show_phone: bool,
}

/// Strip the contact fields the owner chose to hide.
///
/// The WhatsApp number counts as a phone number.
pub fn apply_privacy(contact: ContactFields, flags: PrivacyFlags) -> ContactFields {
    ContactFields {
        email: contact.email.filter(|_| flags.show_email),
        phone: contact.phone.filter(|_| flags.show_phone),
        whatsapp: contact.whatsapp.filter(|_| flags.show_phone),
    }
}

/// Validate an optional phone-like field, normalizing blank to `None`.
pub fn normalize_phone(field: &str, value: Option<String>) -> Result<Option<String>, CoreError> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => {
            phone_digits(&v).map_err(|_| {
                CoreError::Validation(format!("{field} must contain between 8 and 15 digits"))
            })?;
            Ok(Some(v))
        }
    }
}

pub fn validate_bio(bio: Option<&str>) -> Result<(), CoreError> {
    if bio.is_some_and(|b| b.chars().count() > MAX_BIO_LENGTH) {
        return Err(CoreError::Validation(format!(
            "bio exceeds maximum length of {MAX_BIO_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactFields {
        ContactFields {
            email: Some("agente@example.com".into()),
            phone: Some("+502 5555 1234".into()),
            whatsapp: Some("+502 5555 1234".into()),
        }
    }

    #[test]
    fn hidden_fields_removed() {
        let masked = apply_privacy(
            contact(),
            PrivacyFlags {
                show_email: false,
                show_phone: true,
            },
        );
        assert_eq!(masked.email, None);
        assert!(masked.phone.is_some());
        assert!(masked.whatsapp.is_some());

        let masked = apply_privacy(
            contact(),
            PrivacyFlags {
                show_email: true,
                show_phone: false,
            },
        );
        assert!(masked.email.is_some());
        assert_eq!(masked.phone, None);
        assert_eq!(masked.whatsapp, None);
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("phone", Some("  ".into())).unwrap(), None);
        assert!(normalize_phone("phone", Some("12".into())).is_err());
        assert_eq!(
            normalize_phone("phone", Some(" 5555-1234 ".into())).unwrap(),
            Some("5555-1234".into())
        );
    }

    #[test]
    fn long_bio_rejected() {
        assert!(validate_bio(Some(&"a".repeat(2_001))).is_err());
        assert!(validate_bio(None).is_ok());
    }
}
