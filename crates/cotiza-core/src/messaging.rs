//! # Messaging Handoff
//!
//! Builds a pre-filled WhatsApp deep link for a saved quote. Nothing is
//! sent; the link is handed to whatever opens URLs.
//!
//! ```text
//!  client phone ──► digits only ──► ≥ 10 digits? ──no──► InvalidPhone
//!                                        │
//!                                       yes
//!                                        │
//!                       starts with country code? ──no──► prefix it
//!                                        │
//!  message text ──► urlencoding ──► https://wa.me/<number>?text=<encoded>
//! ```

use std::fmt::Write as _;

use crate::error::{CoreError, CoreResult};
use crate::types::{BusinessProfile, DeliveryZone, Quote, QuoteLineView};

/// Minimum digits in a usable client phone.
pub const MIN_PHONE_DIGITS: usize = 10;

const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Normalizes a client phone into an international number without `+`.
///
/// ## Example
/// ```rust
/// use cotiza_core::messaging::normalize_phone;
///
/// assert_eq!(normalize_phone("300 123-4567", "57").unwrap(), "573001234567");
/// assert_eq!(normalize_phone("+57 300 123 4567", "57").unwrap(), "573001234567");
/// assert!(normalize_phone("12345", "57").is_err());
/// ```
pub fn normalize_phone(raw: &str, country_code: &str) -> CoreResult<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return Err(CoreError::InvalidPhone {
            reason: "client has no phone number".to_string(),
        });
    }
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(CoreError::InvalidPhone {
            reason: format!(
                "'{}' has {} digits, at least {} are needed",
                raw.trim(),
                digits.len(),
                MIN_PHONE_DIGITS
            ),
        });
    }

    if digits.starts_with(country_code) {
        Ok(digits)
    } else {
        Ok(format!("{}{}", country_code, digits))
    }
}

/// The message body sent to the client.
pub fn quote_message(
    quote: &Quote,
    number: &str,
    lines: &[QuoteLineView],
    zone: Option<&DeliveryZone>,
    business: &BusinessProfile,
) -> String {
    let mut msg = String::new();
    // Writing to a String cannot fail.
    let _ = write_message(&mut msg, quote, number, lines, zone, business);
    msg
}

fn write_message(
    msg: &mut String,
    quote: &Quote,
    number: &str,
    lines: &[QuoteLineView],
    zone: Option<&DeliveryZone>,
    business: &BusinessProfile,
) -> std::fmt::Result {
    writeln!(msg, "¡Hola {}! 👋", quote.client_name)?;
    writeln!(msg)?;
    writeln!(
        msg,
        "Te envío la cotización #{} con el detalle de los productos:",
        number
    )?;
    writeln!(msg)?;
    for line in lines {
        writeln!(
            msg,
            "• {} - Cantidad: {} - {}",
            line.product_name,
            line.quantity,
            line.line_subtotal()
        )?;
    }
    writeln!(msg)?;
    if let (Some(_), Some(zone)) = (&quote.delivery_zone_id, zone) {
        writeln!(
            msg,
            "• Envío a domicilio - {}: {}",
            zone.neighborhood,
            zone.fee()
        )?;
    }
    writeln!(msg, "💰 *TOTAL: {}*", quote.total())?;
    writeln!(msg)?;
    writeln!(
        msg,
        "Esta cotización es válida por {} días.",
        quote.validity_days
    )?;
    writeln!(msg)?;
    writeln!(
        msg,
        "¿Te gustaría proceder con esta compra? Estoy aquí para ayudarte con cualquier pregunta. 😊"
    )?;
    writeln!(msg)?;
    writeln!(msg, "📍 {}", business.name)?;
    writeln!(msg, "{}", business.address)?;
    write!(msg, "📱 Tel: {}", business.phone)?;
    Ok(())
}

/// Deep link with the quote summary pre-filled.
///
/// Fails with [`CoreError::InvalidPhone`] when the quote's client phone is
/// missing or too short.
pub fn whatsapp_link(
    quote: &Quote,
    number: &str,
    lines: &[QuoteLineView],
    zone: Option<&DeliveryZone>,
    business: &BusinessProfile,
) -> CoreResult<String> {
    let phone = normalize_phone(&quote.client_phone, &business.country_code)?;
    let message = quote_message(quote, number, lines, zone, business);
    Ok(format!(
        "{}/{}?text={}",
        WHATSAPP_BASE_URL,
        phone,
        urlencoding::encode(&message)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Rate;
    use crate::types::QuoteStatus;
    use chrono::Utc;

    fn business() -> BusinessProfile {
        BusinessProfile {
            name: "Suministros del Caribe".to_string(),
            address: "Calle 22 # 4-15".to_string(),
            phone: "3001112233".to_string(),
            country_code: "57".to_string(),
        }
    }

    fn quote(phone: &str, zone_id: Option<&str>) -> Quote {
        let now = Utc::now();
        Quote {
            id: "q1".to_string(),
            seller_id: "s1".to_string(),
            client_id: Some("c1".to_string()),
            client_name: "Juan Pérez".to_string(),
            client_tax_id: String::new(),
            client_phone: phone.to_string(),
            client_email: String::new(),
            client_address: String::new(),
            client_city: String::new(),
            status: QuoteStatus::Pending,
            validity_days: 5,
            seller_name: String::new(),
            notes: String::new(),
            discount_percent: Rate::zero(),
            tax_percent: Rate::zero(),
            breakdown_shown: false,
            retefuente_percent: Rate::zero(),
            reteiva_percent: Rate::zero(),
            ica_percent: Rate::zero(),
            reteica_percent: Rate::zero(),
            delivery_zone_id: zone_id.map(str::to_string),
            subtotal: 200_000,
            tax_base: 200_000,
            tax_amount: 0,
            discount_amount: 0,
            delivery_amount: 12_000,
            service_amount: 0,
            retefuente_amount: 0,
            reteiva_amount: 0,
            ica_amount: 0,
            reteica_amount: 0,
            total: 214_200,
            created_at: now,
            updated_at: now,
        }
    }

    fn lines() -> Vec<QuoteLineView> {
        vec![QuoteLineView {
            product_id: "p1".to_string(),
            product_name: "Taladro percutor".to_string(),
            product_reference: "TAL-10".to_string(),
            image_url: None,
            quantity: 2,
            unit_price: 100_000,
            line_subtotal: 200_000,
        }]
    }

    fn zone() -> DeliveryZone {
        DeliveryZone {
            id: "z1".to_string(),
            neighborhood: "Rodadero".to_string(),
            price: 12_000,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_phone_rules() {
        assert_eq!(normalize_phone("3001234567", "57").unwrap(), "573001234567");
        assert_eq!(normalize_phone("573001234567", "57").unwrap(), "573001234567");
        assert!(matches!(
            normalize_phone("", "57"),
            Err(CoreError::InvalidPhone { .. })
        ));
        assert!(matches!(
            normalize_phone("300-12-34", "57"),
            Err(CoreError::InvalidPhone { .. })
        ));
    }

    #[test]
    fn test_message_contents() {
        let z = zone();
        let msg = quote_message(&quote("3001234567", Some("z1")), "JP-3001", &lines(), Some(&z), &business());

        assert!(msg.starts_with("¡Hola Juan Pérez! 👋"));
        assert!(msg.contains("cotización #JP-3001"));
        assert!(msg.contains("• Taladro percutor - Cantidad: 2 - $200.000"));
        assert!(msg.contains("• Envío a domicilio - Rodadero: $12.000"));
        assert!(msg.contains("💰 *TOTAL: $214.200*"));
        assert!(msg.contains("válida por 5 días"));
        assert!(msg.ends_with("📱 Tel: 3001112233"));
    }

    #[test]
    fn test_message_without_delivery() {
        let z = zone();
        // Zone passed but the quote carries no zone id: no delivery line.
        let msg = quote_message(&quote("3001234567", None), "JP-3001", &lines(), Some(&z), &business());
        assert!(!msg.contains("Envío a domicilio"));
    }

    #[test]
    fn test_whatsapp_link() {
        let link = whatsapp_link(&quote("(300) 123 4567", None), "JP-3001", &lines(), None, &business())
            .unwrap();

        assert!(link.starts_with("https://wa.me/573001234567?text="));
        let encoded = link.split("?text=").nth(1).unwrap();
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('\n'));
        let decoded = urlencoding::decode(encoded).unwrap();
        assert!(decoded.contains("💰 *TOTAL: $214.200*"));
    }

    #[test]
    fn test_whatsapp_link_rejects_short_phone() {
        let err = whatsapp_link(&quote("12345", None), "X", &lines(), None, &business()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPhone { .. }));
    }
}
