//! # Cart
//!
//! The line-item aggregator behind a quote draft.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item(product)        present? ──yes──► quantity += 1               │
//! │                                    └─no───► push {sale_price, qty 1}   │
//! │                                                                         │
//! │  set_quantity(id, q)      q ≤ 0 ──► line removed                        │
//! │                           q > 0 ──► quantity = q                        │
//! │                                                                         │
//! │  set_unit_price(id, p)    p < 0 ──► 0                                   │
//! │                                                                         │
//! │  subtotal()               Σ quantity × unit_price                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines keep a name/reference/image snapshot so the draft can be shown and
//! rendered without going back to the catalog.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{parse_amount_input, Money};
use crate::types::{Product, QuoteLineRecord, QuoteLineView};

// =============================================================================
// Line Item
// =============================================================================

/// One product line in a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,
    pub reference: String,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    /// Always ≥ 1 while the line is in the cart.
    pub quantity: i64,
}

impl LineItem {
    fn from_product(product: &Product) -> Self {
        LineItem {
            product_id: product.id.clone(),
            reference: product.reference.clone(),
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            unit_price: product.price().max(Money::zero()),
            quantity: 1,
        }
    }

    #[inline]
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

impl From<QuoteLineView> for LineItem {
    fn from(view: QuoteLineView) -> Self {
        LineItem {
            product_id: view.product_id,
            reference: view.product_reference,
            name: view.product_name,
            image_url: view.image_url,
            unit_price: Money::from_units(view.unit_price),
            quantity: view.quantity,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Ordered collection of line items, one line per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from saved line rows, dropping any row with a
    /// non-positive quantity.
    pub fn from_lines(lines: impl IntoIterator<Item = QuoteLineView>) -> Self {
        Cart {
            items: lines
                .into_iter()
                .filter(|line| line.quantity > 0)
                .map(LineItem::from)
                .collect(),
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    fn get_mut(&mut self, product_id: &str) -> CoreResult<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| CoreError::ItemNotInCart(product_id.to_string()))
    }

    /// Adds one unit of a product.
    ///
    /// ## Example
    /// ```rust
    /// # use chrono::Utc;
    /// # use cotiza_core::types::Product;
    /// use cotiza_core::cart::Cart;
    ///
    /// # let product = Product {
    /// #     id: "p1".into(), reference: "FLT-01".into(), name: "Filtro".into(),
    /// #     brand: None, sale_price: 100_000, stock: 4, image_url: None,
    /// #     created_at: Utc::now(), updated_at: Utc::now(),
    /// # };
    /// let mut cart = Cart::new();
    /// cart.add_item(&product);
    /// cart.add_item(&product);
    ///
    /// assert_eq!(cart.len(), 1);
    /// assert_eq!(cart.items()[0].quantity, 2);
    /// assert_eq!(cart.subtotal().units(), 200_000);
    /// ```
    pub fn add_item(&mut self, product: &Product) {
        match self.items.iter_mut().find(|item| item.product_id == product.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(LineItem::from_product(product)),
        }
    }

    /// Sets the quantity of a line. Zero or below removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(product_id).map(|_| ());
        }
        self.get_mut(product_id)?.quantity = quantity;
        Ok(())
    }

    /// Overwrites a line's unit price. Negative prices become zero.
    pub fn set_unit_price(&mut self, product_id: &str, price: Money) -> CoreResult<()> {
        self.get_mut(product_id)?.unit_price = price.max(Money::zero());
        Ok(())
    }

    /// Overwrites a line's unit price from free-text input.
    pub fn set_unit_price_input(&mut self, product_id: &str, input: &str) -> CoreResult<()> {
        self.set_unit_price(product_id, parse_amount_input(input))
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<LineItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| CoreError::ItemNotInCart(product_id.to_string()))?;
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Σ quantity × unit_price over every line.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_subtotal).sum()
    }

    /// Line rows to persist for `quote_id`, in cart order.
    pub fn line_records(&self, quote_id: &str) -> Vec<QuoteLineRecord> {
        self.items
            .iter()
            .map(|item| QuoteLineRecord {
                quote_id: quote_id.to_string(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price.units(),
                line_subtotal: item.line_subtotal().units(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            reference: format!("REF-{}", id),
            name: format!("Producto {}", id),
            brand: None,
            sale_price: price,
            stock: 10,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_item_increments_existing_line() {
        let mut cart = Cart::new();
        let a = product("a", 100_000);
        let b = product("b", 25_000);

        cart.add_item(&a);
        cart.add_item(&b);
        cart.add_item(&a);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get("a").unwrap().quantity, 2);
        assert_eq!(cart.get("b").unwrap().quantity, 1);
        assert_eq!(cart.subtotal().units(), 225_000);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", 1_000));
        cart.add_item(&product("b", 2_000));

        cart.set_quantity("a", 5).unwrap();
        assert_eq!(cart.subtotal().units(), 7_000);

        cart.set_quantity("a", 0).unwrap();
        assert!(cart.get("a").is_none());

        cart.set_quantity("b", -3).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::zero());
    }

    #[test]
    fn test_set_quantity_unknown_product() {
        let mut cart = Cart::new();
        let err = cart.set_quantity("missing", 2).unwrap_err();
        assert!(matches!(err, CoreError::ItemNotInCart(id) if id == "missing"));
    }

    #[test]
    fn test_set_unit_price_coerces_bad_input() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", 50_000));

        cart.set_unit_price("a", Money::from_units(-10)).unwrap();
        assert_eq!(cart.get("a").unwrap().unit_price, Money::zero());

        cart.set_unit_price_input("a", "42000").unwrap();
        assert_eq!(cart.get("a").unwrap().unit_price.units(), 42_000);

        cart.set_unit_price_input("a", "no es precio").unwrap();
        assert_eq!(cart.get("a").unwrap().unit_price, Money::zero());
    }

    #[test]
    fn test_line_records_freeze_subtotals() {
        let mut cart = Cart::new();
        let a = product("a", 100_000);
        cart.add_item(&a);
        cart.add_item(&a);

        let records = cart.line_records("q1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quote_id, "q1");
        assert_eq!(records[0].quantity, 2);
        assert_eq!(records[0].unit_price, 100_000);
        assert_eq!(records[0].line_subtotal, 200_000);
    }

    #[test]
    fn test_from_lines_skips_empty_rows() {
        let rows = vec![
            QuoteLineView {
                product_id: "a".into(),
                product_name: "A".into(),
                product_reference: "RA".into(),
                image_url: None,
                quantity: 3,
                unit_price: 10,
                line_subtotal: 30,
            },
            QuoteLineView {
                product_id: "b".into(),
                product_name: "B".into(),
                product_reference: "RB".into(),
                image_url: None,
                quantity: 0,
                unit_price: 10,
                line_subtotal: 0,
            },
        ];
        let cart = Cart::from_lines(rows);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.subtotal().units(), 30);
    }
}
