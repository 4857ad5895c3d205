//! Outbound link construction.
//!
//! The marketplace never talks to messaging or payment providers itself; it
//! only builds the URLs a browser follows (WhatsApp chat, e-mail client,
//! PayPal.me, Binance Pay, or an externally hosted payment page).

use serde::Serialize;
use url::Url;

use crate::error::CoreError;
use crate::sponsor::validate_http_url;
use crate::tier::format_cents;

/// Currency used for plan payments.
pub const PAYMENT_CURRENCY: &str = "USD";

/// Currency used on Binance Pay.
pub const BINANCE_CURRENCY: &str = "USDT";

/// A link offered to the client, labelled by provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundLink {
    pub provider: &'static str,
    pub url: String,
}

/// Keep only the digits of a phone number, validating E.164 length.
pub fn phone_digits(phone: &str) -> Result<String, CoreError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if !(8..=15).contains(&digits.len()) {
        return Err(CoreError::Validation(format!(
            "Phone number '{phone}' must contain between 8 and 15 digits"
        )));
    }
    Ok(digits)
}

/// `https://wa.me/<digits>?text=<message>`
pub fn whatsapp_link(phone: &str, message: &str) -> Result<OutboundLink, CoreError> {
    let digits = phone_digits(phone)?;
    let mut url = format!("https://wa.me/{digits}");
    if !message.trim().is_empty() {
        url.push_str("?text=");
        url.push_str(&urlencoding::encode(message.trim()));
    }
    Ok(OutboundLink {
        provider: "whatsapp",
        url,
    })
}

/// `mailto:<address>?subject=..&body=..` with RFC 6068 percent-encoding.
pub fn mailto_link(address: &str, subject: &str, body: &str) -> Result<OutboundLink, CoreError> {
    let address = address.trim();
    let valid = address
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(CoreError::Validation(format!(
            "'{address}' is not a valid e-mail address"
        )));
    }

    let mut params = Vec::new();
    if !subject.is_empty() {
        params.push(format!("subject={}", urlencoding::encode(subject)));
    }
    if !body.is_empty() {
        params.push(format!("body={}", urlencoding::encode(body)));
    }

    let mut url = format!("mailto:{address}");
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    Ok(OutboundLink {
        provider: "email",
        url,
    })
}

/// `https://paypal.me/<handle>/<amount>USD`
pub fn paypal_link(handle: &str, amount_cents: i64) -> Result<OutboundLink, CoreError> {
    let handle = handle.trim().trim_start_matches('@');
    if handle.is_empty() || !handle.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::Validation(format!(
            "Invalid PayPal.me handle '{handle}'"
        )));
    }
    ensure_positive(amount_cents)?;
    Ok(OutboundLink {
        provider: "paypal",
        url: format!(
            "https://paypal.me/{handle}/{}{PAYMENT_CURRENCY}",
            format_cents(amount_cents)
        ),
    })
}

/// Binance Pay link carrying the merchant pay id, amount and currency.
pub fn binance_pay_link(pay_id: &str, amount_cents: i64) -> Result<OutboundLink, CoreError> {
    let pay_id = pay_id.trim();
    if pay_id.is_empty() || !pay_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "Invalid Binance Pay ID '{pay_id}'"
        )));
    }
    ensure_positive(amount_cents)?;
    let mut url = Url::parse("https://app.binance.com/payment/secpay")
        .map_err(|e| CoreError::Internal(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("payId", pay_id)
        .append_pair("amount", &format_cents(amount_cents))
        .append_pair("currency", BINANCE_CURRENCY);
    Ok(OutboundLink {
        provider: "binance",
        url: url.into(),
    })
}

/// Pass-through for a payment page hosted by a third party.
pub fn external_payment_link(url: &str) -> Result<OutboundLink, CoreError> {
    validate_http_url("payment_url", url)?;
    Ok(OutboundLink {
        provider: "external",
        url: url.to_string(),
    })
}

fn ensure_positive(amount_cents: i64) -> Result<(), CoreError> {
    if amount_cents <= 0 {
        return Err(CoreError::Validation("Payment amount must be positive".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_strips_formatting_and_encodes_text() {
        let link = whatsapp_link("+502 5555-1234", "Hola, me interesa Zona 14").unwrap();
        assert_eq!(
            link.url,
            "https://wa.me/50255551234?text=Hola%2C%20me%20interesa%20Zona%2014"
        );
    }

    #[test]
    fn whatsapp_without_text_has_no_query() {
        let link = whatsapp_link("50255551234", "  ").unwrap();
        assert_eq!(link.url, "https://wa.me/50255551234");
    }

    #[test]
    fn short_phone_rejected() {
        assert!(whatsapp_link("1234", "hi").is_err());
    }

    #[test]
    fn mailto_uses_percent_twenty() {
        let link = mailto_link("agente@example.com", "Casa en venta", "").unwrap();
        assert_eq!(link.url, "mailto:agente@example.com?subject=Casa%20en%20venta");
        assert!(mailto_link("not-an-address", "", "").is_err());
    }

    #[test]
    fn paypal_amount_formatted() {
        let link = paypal_link("@InmoGT", 2_999).unwrap();
        assert_eq!(link.url, "https://paypal.me/InmoGT/29.99USD");
        assert!(paypal_link("bad handle", 100).is_err());
        assert!(paypal_link("InmoGT", 0).is_err());
    }

    #[test]
    fn binance_link_carries_query() {
        let link = binance_pay_link("123456789", 10_000).unwrap();
        assert_eq!(
            link.url,
            "https://app.binance.com/payment/secpay?payId=123456789&amount=100.00&currency=USDT"
        );
        assert!(binance_pay_link("abc", 10_000).is_err());
    }

    #[test]
    fn external_links_must_be_http() {
        assert!(external_payment_link("https://pay.example.com/x").is_ok());
        assert!(external_payment_link("javascript:void(0)").is_err());
    }
}
