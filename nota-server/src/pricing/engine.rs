//! Item Resale Price Calculator
//!
//! Computes the derived per-item quantities:
//! - raw cost per unit
//! - cost after the optional absolute discount
//! - marked-up per-unit sale price (or the manual override)
//! - cash-rounded sale price
//!
//! Every displayed number is traceable to exactly one of these outputs;
//! there is no second formula anywhere else.
//!
//! The calculation runs on `f64`: `units = 0` yields non-finite per-unit
//! values ("not yet computable") instead of an error, and `Decimal` has no
//! representation for those. Precise 2-decimal rounding happens at the
//! display/storage boundary (`shared::util`).

use serde::Serialize;
use shared::models::item::{Item, RoundingDirection};

/// All derived monetary quantities for one item.
///
/// Values are in the same currency unit as `Item::price`. With `units = 0`
/// the per-unit fields are non-finite and serialize as JSON null; callers
/// treat that as "pending", never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPricing {
    /// Raw cost per unit: `price / units`
    pub unit_price: f64,
    /// Total cost after the absolute discount (when discounts apply)
    pub price_discounted: f64,
    /// Discounted cost per unit
    pub unit_price_discounted: f64,
    /// Per-unit sale price: discounted unit cost marked up by the profit
    /// margin, or the manual override when that switch is on
    pub unit_final_price: f64,
    /// Sale price snapped to the cash step (equals `unit_final_price` when
    /// rounding is off)
    pub unit_final_price_rounded: f64,
}

impl ItemPricing {
    /// Whether every derived value is finite. False while `units = 0`.
    pub fn is_computable(&self) -> bool {
        self.unit_price.is_finite()
            && self.price_discounted.is_finite()
            && self.unit_price_discounted.is_finite()
            && self.unit_final_price.is_finite()
            && self.unit_final_price_rounded.is_finite()
    }
}

/// Derive all monetary quantities from the item's current field values.
///
/// Total over its domain: degenerate input produces NaN/Infinity, never a
/// panic or an error.
pub fn calculate_item_pricing(item: &Item) -> ItemPricing {
    let units = item.units as f64;

    let unit_price = item.price / units;

    let price_discounted = item.price
        - if item.apply_discounts {
            item.discount
        } else {
            0.0
        };
    let unit_price_discounted = price_discounted / units;

    let unit_final_price = if item.use_custom_final_price {
        item.custom_final_price
    } else {
        unit_price_discounted * (1.0 + item.profit_margin / 100.0)
    };

    let unit_final_price_rounded = if item.use_rounding {
        round_to_step(unit_final_price, item.rounding_steps, item.rounding_direction)
    } else {
        unit_final_price
    };

    ItemPricing {
        unit_price,
        price_discounted,
        unit_price_discounted,
        unit_final_price,
        unit_final_price_rounded,
    }
}

/// Snap a currency value to a step of `steps` cents.
///
/// Works in the cents domain: `up` takes the ceiling of `cents / steps`,
/// `down` the floor; the `Nearest` fallback rounds to the closest step.
/// Non-finite input passes through unchanged.
pub fn round_to_step(value: f64, steps: u32, direction: RoundingDirection) -> f64 {
    let cents = value * 100.0;
    let steps = steps as f64;

    let snapped = match direction {
        RoundingDirection::Up => (cents / steps).ceil() * steps,
        RoundingDirection::Down => (cents / steps).floor() * steps,
        RoundingDirection::Nearest => (cents / steps).round() * steps,
    };

    snapped / 100.0
}
