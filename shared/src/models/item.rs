//! One receipt line with its user-adjustable pricing parameters

use serde::{Deserialize, Serialize};

use super::note::ScrapItem;

/// Profit margin (percent) applied to freshly scraped items.
pub const DEFAULT_PROFIT_MARGIN: f64 = 30.0;

/// Cash-friendly rounding granularities, in cents.
pub const ROUNDING_STEPS: [u32; 2] = [5, 10];

/// Whether `steps` is one of the supported rounding granularities.
pub fn is_valid_rounding_step(steps: u32) -> bool {
    ROUNDING_STEPS.contains(&steps)
}

/// Direction used when snapping a final price to a rounding step.
///
/// Only `Up` and `Down` are accepted as input; `Nearest` exists so that
/// records carrying an out-of-domain direction value still deserialize, and
/// such values fall back to nearest-rounding instead of failing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RoundingDirection {
    #[default]
    Up,
    Down,
    Nearest,
}

impl From<String> for RoundingDirection {
    fn from(value: String) -> Self {
        match value.as_str() {
            "up" => Self::Up,
            "down" => Self::Down,
            _ => Self::Nearest,
        }
    }
}

/// One receipt line.
///
/// `price` is the total cost for all `units`, not the per-unit cost. The
/// pricing fields past `price` are user-editable; the trailing block carries
/// `#[serde(default)]` because records written before those parameters
/// existed omit them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Display label, immutable after scrape
    pub name: String,
    /// Quantity purchased
    pub units: u32,
    /// Total cost for all units
    pub price: f64,
    /// Profit margin percentage (30 means 30%)
    pub profit_margin: f64,
    /// Whether `discount` is subtracted from `price` before the margin
    pub apply_discounts: bool,
    /// Absolute discount amount (currency)
    pub discount: f64,
    /// Discount as a percentage of `price`, kept in sync with `discount`
    pub discount_perc: f64,
    /// Manual per-unit price override switch
    #[serde(default)]
    pub use_custom_final_price: bool,
    /// Manually entered per-unit price, applied only while the switch is on
    #[serde(default)]
    pub custom_final_price: f64,
    /// Whether the final per-unit price is snapped to a cash step
    #[serde(default = "default_use_rounding")]
    pub use_rounding: bool,
    /// Rounding granularity in cents (5 or 10)
    #[serde(default = "default_rounding_steps")]
    pub rounding_steps: u32,
    /// Rounding direction
    #[serde(default)]
    pub rounding_direction: RoundingDirection,
}

fn default_use_rounding() -> bool {
    true
}

fn default_rounding_steps() -> u32 {
    5
}

impl Item {
    /// Build an item from a scraped receipt line with all pricing
    /// parameters at their defaults.
    pub fn from_scrap(scrap: &ScrapItem) -> Self {
        Self {
            name: scrap.name.clone(),
            units: scrap.units,
            price: scrap.price,
            profit_margin: DEFAULT_PROFIT_MARGIN,
            apply_discounts: false,
            discount: 0.0,
            discount_perc: 0.0,
            use_custom_final_price: false,
            custom_final_price: 0.0,
            use_rounding: default_use_rounding(),
            rounding_steps: default_rounding_steps(),
            rounding_direction: RoundingDirection::default(),
        }
    }

    /// Merge a partial edit into this item, field by field.
    pub fn apply_patch(&mut self, patch: &ItemPatch) {
        if let Some(units) = patch.units {
            self.units = units;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(margin) = patch.profit_margin {
            self.profit_margin = margin;
        }
        if let Some(apply) = patch.apply_discounts {
            self.apply_discounts = apply;
        }
        if let Some(discount) = patch.discount {
            self.discount = discount;
        }
        if let Some(perc) = patch.discount_perc {
            self.discount_perc = perc;
        }
        if let Some(use_custom) = patch.use_custom_final_price {
            self.use_custom_final_price = use_custom;
        }
        if let Some(custom) = patch.custom_final_price {
            self.custom_final_price = custom;
        }
        if let Some(use_rounding) = patch.use_rounding {
            self.use_rounding = use_rounding;
        }
        if let Some(steps) = patch.rounding_steps {
            self.rounding_steps = steps;
        }
        if let Some(direction) = patch.rounding_direction {
            self.rounding_direction = direction;
        }
    }
}

/// Partial item update: only the fields changed by one edit operation.
///
/// The edit session emits these and the note owner merges them by index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_discounts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_perc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_custom_final_price: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_final_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_rounding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounding_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounding_direction: Option<RoundingDirection>,
}

impl ItemPatch {
    /// True when no field changed (the edit was a no-op or was rejected).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrap(name: &str, units: u32, price: f64) -> ScrapItem {
        ScrapItem {
            name: name.to_string(),
            units,
            price,
        }
    }

    #[test]
    fn test_from_scrap_defaults() {
        let item = Item::from_scrap(&scrap("Arroz 5kg", 2, 45.90));

        assert_eq!(item.name, "Arroz 5kg");
        assert_eq!(item.units, 2);
        assert_eq!(item.price, 45.90);
        assert_eq!(item.profit_margin, 30.0);
        assert!(!item.apply_discounts);
        assert_eq!(item.discount, 0.0);
        assert_eq!(item.discount_perc, 0.0);
        assert!(!item.use_custom_final_price);
        assert!(item.use_rounding);
        assert_eq!(item.rounding_steps, 5);
        assert_eq!(item.rounding_direction, RoundingDirection::Up);
    }

    #[test]
    fn test_deserialize_legacy_record_without_optional_fields() {
        // Records written before the override/rounding parameters existed
        let json = r#"{
            "name": "Feijão",
            "units": 1,
            "price": 8.5,
            "profitMargin": 25,
            "applyDiscounts": false,
            "discount": 0,
            "discountPerc": 0
        }"#;

        let item: Item = serde_json::from_str(json).unwrap();
        assert!(!item.use_custom_final_price);
        assert_eq!(item.custom_final_price, 0.0);
        assert!(item.use_rounding);
        assert_eq!(item.rounding_steps, 5);
        assert_eq!(item.rounding_direction, RoundingDirection::Up);
    }

    #[test]
    fn test_unknown_rounding_direction_falls_back_to_nearest() {
        let json = r#"{
            "name": "X", "units": 1, "price": 1.0,
            "profitMargin": 30, "applyDiscounts": false,
            "discount": 0, "discountPerc": 0,
            "roundingDirection": "sideways"
        }"#;

        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.rounding_direction, RoundingDirection::Nearest);
    }

    #[test]
    fn test_serde_round_trip_uses_camel_case() {
        let item = Item::from_scrap(&scrap("Café", 3, 29.97));
        let value = serde_json::to_value(&item).unwrap();

        assert!(value.get("profitMargin").is_some());
        assert!(value.get("applyDiscounts").is_some());
        assert!(value.get("useCustomFinalPrice").is_some());
        assert_eq!(value["roundingDirection"], "up");

        let back: Item = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_apply_patch_merges_only_present_fields() {
        let mut item = Item::from_scrap(&scrap("Leite", 6, 30.0));
        let patch = ItemPatch {
            discount: Some(3.0),
            discount_perc: Some(10.0),
            ..Default::default()
        };

        item.apply_patch(&patch);

        assert_eq!(item.discount, 3.0);
        assert_eq!(item.discount_perc, 10.0);
        // untouched fields keep their values
        assert_eq!(item.units, 6);
        assert_eq!(item.profit_margin, 30.0);
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(ItemPatch::default().is_empty());
        let patch = ItemPatch {
            price: Some(1.0),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_valid_rounding_steps() {
        assert!(is_valid_rounding_step(5));
        assert!(is_valid_rounding_step(10));
        assert!(!is_valid_rounding_step(0));
        assert!(!is_valid_rounding_step(25));
    }
}
