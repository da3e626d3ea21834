//! # Quote Document
//!
//! The printable breakdown of a saved quote.
//!
//! ## Recomputed Tax Split
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The document does NOT reuse the stored tax fields.                     │
//! │                                                                         │
//! │  tax% > 0 ──► base = round(subtotal ÷ (1 + tax%/100))                   │
//! │               iva  = round(subtotal − base)                             │
//! │               (whatever mode the quote was priced with)                 │
//! │                                                                         │
//! │  discount% > 0 ──► round(subtotal × discount%/100)                      │
//! │  zone attached ──► delivery line at the zone's fee                      │
//! │  stored percent > 0 AND stored amount > 0 ──► withholding line          │
//! │                                                                         │
//! │  TOTAL is always the stored total.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A quote priced with tax added on top therefore prints a split that does
//! not add up to its total. That is how printed quotes have always looked
//! and it is pinned by a test.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use ts_rs::TS;

use crate::money::{round_half_up, Money, Rate};
use crate::tax::inclusive_base;
use crate::types::{BusinessProfile, DeliveryZone, Quote, QuoteLineView, QuoteStatus};
use crate::withholding::WithholdingKind;

// =============================================================================
// Document Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentClient {
    pub name: String,
    pub phone: String,
    pub tax_id: String,
    pub email: String,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentLine {
    pub product_id: String,
    pub name: String,
    pub reference: String,
    pub image_url: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentDelivery {
    pub neighborhood: String,
    pub fee: Money,
}

/// Base and IVA printed above the gross subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxSplit {
    pub tax_percent: Rate,
    pub base: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentDiscount {
    pub percent: Rate,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentWithholding {
    pub kind: WithholdingKind,
    pub percent: Rate,
    pub amount: Money,
}

/// Everything a renderer needs, already computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteDocument {
    pub quote_id: String,
    pub number: String,
    /// `dd/mm/yyyy`
    pub date: String,
    pub status: QuoteStatus,
    pub validity_days: i64,
    pub client: DocumentClient,
    pub lines: Vec<DocumentLine>,
    pub delivery: Option<DocumentDelivery>,
    pub subtotal: Money,
    pub tax_split: Option<TaxSplit>,
    pub discount: Option<DocumentDiscount>,
    pub service: Option<Money>,
    pub withholdings: Vec<DocumentWithholding>,
    pub total: Money,
    pub seller_name: Option<String>,
    pub notes: Option<String>,
}

impl QuoteDocument {
    /// Builds the document for a stored quote.
    ///
    /// `number` is the display number from [`crate::numbering::quote_number`].
    pub fn from_quote(
        quote: &Quote,
        number: impl Into<String>,
        lines: &[QuoteLineView],
        zone: Option<&DeliveryZone>,
    ) -> Self {
        let subtotal = quote.subtotal();
        let gross = subtotal.to_decimal();

        let tax_split = (!quote.tax_percent.is_zero()).then(|| {
            let base = round_half_up(inclusive_base(gross, quote.tax_percent));
            TaxSplit {
                tax_percent: quote.tax_percent,
                base,
                tax: subtotal - base,
            }
        });

        let discount = (!quote.discount_percent.is_zero()).then(|| DocumentDiscount {
            percent: quote.discount_percent,
            amount: round_half_up(quote.discount_percent.of(gross)),
        });

        let delivery = match (&quote.delivery_zone_id, zone) {
            (Some(_), Some(zone)) => Some(DocumentDelivery {
                neighborhood: zone.neighborhood.clone(),
                fee: zone.fee(),
            }),
            _ => None,
        };

        let withholdings = WithholdingKind::ALL
            .iter()
            .filter_map(|kind| {
                let percent = quote.withholding_percent(*kind);
                let amount = quote.withholding_amount(*kind);
                (!percent.is_zero() && amount.is_positive()).then_some(DocumentWithholding {
                    kind: *kind,
                    percent,
                    amount,
                })
            })
            .collect();

        let non_empty = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        QuoteDocument {
            quote_id: quote.id.clone(),
            number: number.into(),
            date: quote.created_at.format("%d/%m/%Y").to_string(),
            status: quote.status,
            validity_days: quote.validity_days,
            client: DocumentClient {
                name: quote.client_name.clone(),
                phone: quote.client_phone.clone(),
                tax_id: quote.client_tax_id.clone(),
                email: quote.client_email.clone(),
                address: quote.client_address.clone(),
                city: quote.client_city.clone(),
            },
            lines: lines
                .iter()
                .map(|line| DocumentLine {
                    product_id: line.product_id.clone(),
                    name: line.product_name.clone(),
                    reference: line.product_reference.clone(),
                    image_url: line.image_url.clone(),
                    quantity: line.quantity,
                    unit_price: Money::from_units(line.unit_price),
                    line_total: line.line_subtotal(),
                })
                .collect(),
            delivery,
            subtotal,
            tax_split,
            discount,
            service: (quote.service_amount > 0).then(|| Money::from_units(quote.service_amount)),
            withholdings,
            total: quote.total(),
            seller_name: non_empty(&quote.seller_name),
            notes: non_empty(&quote.notes),
        }
    }

    /// Lines with a picture to fetch.
    pub fn image_urls(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| {
            line.image_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .map(|url| (line.product_id.as_str(), url))
        })
    }

    /// Plain-text rendering, one section per block of the printed quote.
    pub fn render_text(&self, business: &BusinessProfile) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_text(&mut out, business);
        out
    }

    fn write_text(&self, out: &mut String, business: &BusinessProfile) -> std::fmt::Result {
        writeln!(out, "{}", business.name.to_uppercase())?;
        writeln!(out, "{}", business.address)?;
        writeln!(out)?;
        writeln!(out, "COTIZACIÓN #{}    Fecha: {}", self.number, self.date)?;
        writeln!(out)?;

        writeln!(out, "INFORMACIÓN DEL CLIENTE")?;
        writeln!(out, "{}", self.client.name)?;
        let phone = if self.client.phone.trim().is_empty() {
            "N/A"
        } else {
            self.client.phone.as_str()
        };
        writeln!(out, "Teléfono: {}", phone)?;
        if !self.client.tax_id.trim().is_empty() {
            writeln!(out, "NIT: {}", self.client.tax_id)?;
        }
        if !self.client.email.trim().is_empty() {
            writeln!(out, "Email: {}", self.client.email)?;
        }
        writeln!(out)?;

        writeln!(out, "INFORMACIÓN DE LA COTIZACIÓN")?;
        writeln!(out, "Validez: {} días", self.validity_days)?;
        writeln!(out, "Estado: {}", status_label(self.status))?;
        writeln!(out)?;

        writeln!(out, "PRODUCTOS")?;
        for line in &self.lines {
            writeln!(
                out,
                "{} ({}) | Cant. {} | {} | {}",
                line.name, line.reference, line.quantity, line.unit_price, line.line_total
            )?;
        }
        if let Some(delivery) = &self.delivery {
            writeln!(
                out,
                "Envío a Domicilio - {} | Cant. 1 | {} | {}",
                delivery.neighborhood, delivery.fee, delivery.fee
            )?;
        }
        writeln!(out)?;

        match &self.tax_split {
            Some(split) => {
                writeln!(out, "Subtotal (Base): {}", split.base)?;
                writeln!(out, "IVA ({}): {}", split.tax_percent, split.tax)?;
                writeln!(out, "Subtotal (con IVA): {}", self.subtotal)?;
            }
            None => writeln!(out, "Subtotal: {}", self.subtotal)?,
        }
        if let Some(discount) = &self.discount {
            writeln!(out, "Descuento ({}): -{}", discount.percent, discount.amount)?;
        }
        if let Some(delivery) = &self.delivery {
            writeln!(out, "Envío a domicilio: +{}", delivery.fee)?;
        }
        if let Some(service) = &self.service {
            writeln!(out, "Servicio de taller: +{}", service)?;
        }
        if !self.withholdings.is_empty() {
            writeln!(out, "Retenciones:")?;
            for w in &self.withholdings {
                writeln!(out, "  {} ({}): -{}", w.kind.label(), w.percent, w.amount)?;
            }
        }
        writeln!(out, "TOTAL A PAGAR: {}", self.total)?;

        if let Some(seller) = &self.seller_name {
            writeln!(out)?;
            writeln!(out, "Vendedor: {}", seller)?;
        }
        if let Some(notes) = &self.notes {
            writeln!(out)?;
            writeln!(out, "OBSERVACIONES:")?;
            writeln!(out, "{}", notes)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", business.name)?;
        writeln!(out, "Tel: {}", business.phone)?;
        write!(out, "Cotización #{}", self.number)?;
        Ok(())
    }
}

/// Status as printed on documents.
pub const fn status_label(status: QuoteStatus) -> &'static str {
    match status {
        QuoteStatus::Pending => "Pendiente",
        QuoteStatus::Accepted => "Aceptada",
        QuoteStatus::Rejected => "Rechazada",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::QuoteDraft;
    use crate::totals::NegativeTotalPolicy;
    use crate::types::{Client, Product, Session};
    use chrono::Utc;

    fn business() -> BusinessProfile {
        BusinessProfile {
            name: "Suministros del Caribe".to_string(),
            address: "Calle 22 # 4-15, Santa Marta".to_string(),
            phone: "3001112233".to_string(),
            country_code: "57".to_string(),
        }
    }

    fn saved_quote(tax: &str, breakdown: bool) -> (Quote, Vec<QuoteLineView>) {
        let mut draft = QuoteDraft::new();
        let product = Product {
            id: "p1".to_string(),
            reference: "TAL-10".to_string(),
            name: "Taladro percutor".to_string(),
            brand: Some("Bosch".to_string()),
            sale_price: 100_000,
            stock: 3,
            image_url: Some("https://img.example/taladro.jpg".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        draft.add_product(&product);
        draft.add_product(&product);
        draft.select_client(Client {
            id: "c1".to_string(),
            seller_id: "s1".to_string(),
            name: "Juan Pérez".to_string(),
            phone: None,
            tax_id: None,
            email: None,
            address: None,
            city: None,
            created_at: Utc::now(),
        });
        draft.set_discount_percent(Rate::percent("10").unwrap());
        draft.set_tax_percent(Rate::percent(tax).unwrap());
        draft.set_breakdown_shown(breakdown);

        let session = Session {
            user_id: "u1".to_string(),
            seller_id: "s1".to_string(),
            display_name: "Laura".to_string(),
        };
        let plan = draft
            .begin_submit(&session, NegativeTotalPolicy::Allow, Utc::now())
            .unwrap();

        let lines = vec![QuoteLineView {
            product_id: "p1".to_string(),
            product_name: "Taladro percutor".to_string(),
            product_reference: "TAL-10".to_string(),
            image_url: product.image_url.clone(),
            quantity: 2,
            unit_price: 100_000,
            line_subtotal: 200_000,
        }];
        (plan.quote, lines)
    }

    #[test]
    fn test_exclusive_quote_prints_inclusive_split() {
        let (quote, lines) = saved_quote("19", false);
        assert_eq!(quote.total, 214_200);

        let doc = QuoteDocument::from_quote(&quote, "JP-3001", &lines, None);
        let split = doc.tax_split.unwrap();

        // Split recomputed as if prices included IVA; total stays as stored.
        assert_eq!(split.base.units(), 168_067);
        assert_eq!(split.tax.units(), 31_933);
        assert_eq!(doc.total.units(), 214_200);
        assert_eq!(doc.discount.unwrap().amount.units(), 20_000);
    }

    #[test]
    fn test_inclusive_quote_split_matches_stored_fields() {
        let (quote, lines) = saved_quote("19", true);
        let doc = QuoteDocument::from_quote(&quote, "JP-3001", &lines, None);
        let split = doc.tax_split.unwrap();

        assert_eq!(split.base.units(), quote.tax_base);
        assert_eq!(split.tax.units(), quote.tax_amount);
    }

    #[test]
    fn test_no_tax_no_split() {
        let (quote, lines) = saved_quote("0", false);
        let doc = QuoteDocument::from_quote(&quote, "JP-3001", &lines, None);
        assert!(doc.tax_split.is_none());
        assert!(doc.withholdings.is_empty());
        assert!(doc.delivery.is_none());

        let text = doc.render_text(&business());
        assert!(text.contains("Subtotal: $200.000"));
        assert!(text.contains("Teléfono: N/A"));
        assert!(!text.contains("Subtotal (Base)"));
    }

    #[test]
    fn test_render_text_sections() {
        let (quote, lines) = saved_quote("19", false);
        let doc = QuoteDocument::from_quote(&quote, "JP-3001", &lines, None);
        let text = doc.render_text(&business());

        assert!(text.starts_with("SUMINISTROS DEL CARIBE"));
        assert!(text.contains("COTIZACIÓN #JP-3001"));
        assert!(text.contains("Taladro percutor (TAL-10) | Cant. 2 | $100.000 | $200.000"));
        assert!(text.contains("IVA (19%): $31.933"));
        assert!(text.contains("Descuento (10%): -$20.000"));
        assert!(text.contains("TOTAL A PAGAR: $214.200"));
        assert!(text.contains("Vendedor: Laura"));
        assert!(text.contains("Estado: Pendiente"));
    }

    #[test]
    fn test_image_urls() {
        let (quote, lines) = saved_quote("0", false);
        let doc = QuoteDocument::from_quote(&quote, "X", &lines, None);
        let urls: Vec<_> = doc.image_urls().collect();
        assert_eq!(urls, vec![("p1", "https://img.example/taladro.jpg")]);
    }
}
