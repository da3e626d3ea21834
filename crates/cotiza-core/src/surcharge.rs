//! # Surcharges
//!
//! Flat fees added on top of the discounted subtotal: a delivery fee picked
//! from a delivery zone, and a workshop service fee typed by the seller.
//!
//! ```text
//!   DeliverySelection                       ServiceCharge
//!   ─────────────────                       ─────────────
//!   included? ──no──► 0                     included? ──no──► 0
//!       │                                       │
//!      yes                                     yes
//!       │                                       │
//!   zone picked? ──no──► 0 (submit blocked)    price (submit blocked if ≤ 0)
//!       │                                       │
//!   zone.price                                  └─► companion WorkshopTicket
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{parse_amount_input, Money};
use crate::types::{DeliveryZone, ServiceType, TicketStatus, WorkshopTicket};
use crate::DEFAULT_SERVICE_DESCRIPTION;

// =============================================================================
// Delivery
// =============================================================================

/// The delivery toggle and the zone pinned to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliverySelection {
    included: bool,
    zone: Option<DeliveryZone>,
}

impl DeliverySelection {
    /// Turns delivery on or off. Turning it off also forgets the zone.
    pub fn set_included(&mut self, included: bool) {
        self.included = included;
        if !included {
            self.zone = None;
        }
    }

    /// Pins a zone; its fee applies until the selection is cleared.
    pub fn select_zone(&mut self, zone: DeliveryZone) {
        self.included = true;
        self.zone = Some(zone);
    }

    pub fn clear_zone(&mut self) {
        self.zone = None;
    }

    pub fn is_included(&self) -> bool {
        self.included
    }

    pub fn zone(&self) -> Option<&DeliveryZone> {
        self.zone.as_ref()
    }

    /// Included but nothing picked yet.
    pub fn is_missing_zone(&self) -> bool {
        self.included && self.zone.is_none()
    }

    /// The fee to charge.
    ///
    /// ## Example
    /// ```rust
    /// # use chrono::Utc;
    /// use cotiza_core::surcharge::DeliverySelection;
    /// use cotiza_core::types::DeliveryZone;
    ///
    /// # let zone = DeliveryZone { id: "z1".into(), neighborhood: "Laureles".into(),
    /// #     price: 12_000, created_at: Utc::now() };
    /// let mut delivery = DeliverySelection::default();
    /// delivery.select_zone(zone);
    /// assert_eq!(delivery.amount().units(), 12_000);
    ///
    /// delivery.set_included(false);
    /// assert_eq!(delivery.amount().units(), 0);
    /// assert!(delivery.zone().is_none());
    /// ```
    pub fn amount(&self) -> Money {
        match (&self.zone, self.included) {
            (Some(zone), true) => zone.fee().max(Money::zero()),
            _ => Money::zero(),
        }
    }

    /// Id persisted on the quote, present only while delivery is charged.
    pub fn zone_id(&self) -> Option<String> {
        if self.included {
            self.zone.as_ref().map(|zone| zone.id.clone())
        } else {
            None
        }
    }
}

// =============================================================================
// Workshop Service
// =============================================================================

/// The workshop service toggle, its price and the ticket details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceCharge {
    pub included: bool,
    pub price: Money,
    pub service_type: ServiceType,
    pub description: String,
    /// Set once a companion ticket exists for this quote, so saving again
    /// does not create a second one.
    pub ticket_already_created: bool,
}

impl ServiceCharge {
    /// A service restored from a saved quote. Its ticket was created with
    /// the original save.
    pub fn restored(price: Money) -> Self {
        ServiceCharge {
            included: price.is_positive(),
            price,
            ticket_already_created: price.is_positive(),
            ..Default::default()
        }
    }

    pub fn set_price_input(&mut self, input: &str) {
        self.price = parse_amount_input(input);
    }

    pub fn amount(&self) -> Money {
        if self.included {
            self.price.max(Money::zero())
        } else {
            Money::zero()
        }
    }

    /// Included without a positive price.
    pub fn is_missing_price(&self) -> bool {
        self.included && !self.price.is_positive()
    }

    fn description_or_default(&self) -> String {
        let trimmed = self.description.trim();
        if trimmed.is_empty() {
            DEFAULT_SERVICE_DESCRIPTION.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Builds the companion ticket for a quote, when one is due.
    ///
    /// Returns `None` when the service is off, has no price, or a ticket was
    /// already created for this quote.
    pub fn companion_ticket(
        &self,
        seller_id: &str,
        quote_id: &str,
        client_name: &str,
        client_phone: &str,
        now: DateTime<Utc>,
    ) -> Option<WorkshopTicket> {
        if !self.included || self.ticket_already_created || !self.price.is_positive() {
            return None;
        }

        let client_name = if client_name.trim().is_empty() {
            "Cliente"
        } else {
            client_name
        };

        Some(WorkshopTicket {
            id: uuid::Uuid::new_v4().to_string(),
            seller_id: seller_id.to_string(),
            quote_id: Some(quote_id.to_string()),
            client_name: client_name.to_string(),
            client_phone: client_phone.to_string(),
            service_type: self.service_type,
            description: self.description_or_default(),
            status: TicketStatus::Received,
            estimated_price: self.amount().units(),
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(price: i64) -> DeliveryZone {
        DeliveryZone {
            id: "zone-1".to_string(),
            neighborhood: "El Poblado".to_string(),
            price,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_delivery_requires_zone() {
        let mut delivery = DeliverySelection::default();
        delivery.set_included(true);
        assert!(delivery.is_missing_zone());
        assert_eq!(delivery.amount(), Money::zero());

        delivery.select_zone(zone(8_000));
        assert!(!delivery.is_missing_zone());
        assert_eq!(delivery.amount().units(), 8_000);
        assert_eq!(delivery.zone_id().as_deref(), Some("zone-1"));
    }

    #[test]
    fn test_unchecking_delivery_clears_zone() {
        let mut delivery = DeliverySelection::default();
        delivery.select_zone(zone(15_000));
        delivery.set_included(false);

        assert_eq!(delivery.amount(), Money::zero());
        assert!(delivery.zone().is_none());
        assert!(delivery.zone_id().is_none());

        // Turning it back on does not resurrect the old zone.
        delivery.set_included(true);
        assert_eq!(delivery.amount(), Money::zero());
    }

    #[test]
    fn test_service_amount_and_missing_price() {
        let mut service = ServiceCharge::default();
        assert_eq!(service.amount(), Money::zero());

        service.included = true;
        assert!(service.is_missing_price());

        service.set_price_input("80000");
        assert!(!service.is_missing_price());
        assert_eq!(service.amount().units(), 80_000);
    }

    #[test]
    fn test_companion_ticket_fields() {
        let service = ServiceCharge {
            included: true,
            price: Money::from_units(60_000),
            service_type: ServiceType::Repair,
            description: "   ".to_string(),
            ticket_already_created: false,
        };

        let ticket = service
            .companion_ticket("seller-1", "quote-1", "", "3001234567", Utc::now())
            .unwrap();

        assert_eq!(ticket.quote_id.as_deref(), Some("quote-1"));
        assert_eq!(ticket.client_name, "Cliente");
        assert_eq!(ticket.service_type, ServiceType::Repair);
        assert_eq!(ticket.description, DEFAULT_SERVICE_DESCRIPTION);
        assert_eq!(ticket.status, TicketStatus::Received);
        assert_eq!(ticket.estimated_price, 60_000);
    }

    #[test]
    fn test_restored_service_skips_ticket() {
        let service = ServiceCharge::restored(Money::from_units(60_000));
        assert!(service.included);
        assert_eq!(service.amount().units(), 60_000);
        assert!(service
            .companion_ticket("s", "q", "Ana", "", Utc::now())
            .is_none());

        let none = ServiceCharge::restored(Money::zero());
        assert!(!none.included);
    }
}
