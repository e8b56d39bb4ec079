//! Item Edit Session
//!
//! Owns one item's editable parameter state, applies one edit at a time and
//! reports the resulting partial patch so the note owner can merge it by
//! index. Keeps the absolute discount and the percentage discount
//! synchronized: whichever side the user touched last is authoritative and
//! the other side is recomputed, guarded by a directional tag so the pair
//! never feeds back into itself.

use serde::{Deserialize, Serialize};
use shared::models::item::{Item, ItemPatch, RoundingDirection, is_valid_rounding_step};
use shared::util::parse_loose_number;

use crate::pricing::{ItemPricing, calculate_item_pricing};

/// Which side of the discount pair the user edited last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LastChanged {
    #[default]
    None,
    Discount,
    DiscountPerc,
}

/// One edit operation against a single item.
///
/// Currency inputs arrive in minor units (cents), the way currency-entry
/// fields deliver them; unit counts arrive as the raw field text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ItemEdit {
    SetUnits { text: String },
    SetPrice { cents: i64 },
    SetProfitMargin { percent: f64 },
    SetDiscount { cents: i64 },
    SetDiscountPercent { percent: f64 },
    ToggleApplyDiscounts,
    SetCustomFinalPrice { cents: i64 },
    ToggleCustomFinalPrice,
    ToggleRounding,
    SetRoundingSteps { steps: u32 },
    SetRoundingDirection { direction: RoundingDirection },
}

/// Interactive per-item state holder.
///
/// While the manual final price is active, edits to the margin, discount and
/// rounding parameters are rejected outright (empty patch) instead of being
/// silently accepted but unused. Those controls are not live.
#[derive(Debug, Clone)]
pub struct ItemEditSession {
    item: Item,
    /// Raw text of the units field as last typed
    units_text: String,
    last_changed: LastChanged,
    pricing: ItemPricing,
}

impl ItemEditSession {
    pub fn new(item: Item) -> Self {
        let pricing = calculate_item_pricing(&item);
        let units_text = item.units.to_string();
        Self {
            item,
            units_text,
            last_changed: LastChanged::None,
            pricing,
        }
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn pricing(&self) -> ItemPricing {
        self.pricing
    }

    pub fn units_text(&self) -> &str {
        &self.units_text
    }

    /// Apply one edit, returning the fields it changed.
    ///
    /// A rejected or no-op edit returns an empty patch and leaves the
    /// session untouched.
    pub fn apply(&mut self, edit: &ItemEdit) -> ItemPatch {
        let mut patch = ItemPatch::default();
        let locked = self.item.use_custom_final_price;

        match edit {
            ItemEdit::SetUnits { text } => {
                self.units_text = text.clone();
                let units = parse_loose_number(text).floor().max(0.0) as u32;
                self.item.units = units;
                patch.units = Some(units);
            }
            ItemEdit::SetPrice { cents } => {
                self.item.price = *cents as f64 / 100.0;
                patch.price = Some(self.item.price);
                self.sync_discount_pair(&mut patch);
            }
            ItemEdit::SetProfitMargin { percent } => {
                if locked {
                    return patch;
                }
                self.item.profit_margin = *percent;
                patch.profit_margin = Some(*percent);
            }
            ItemEdit::SetDiscount { cents } => {
                if locked {
                    return patch;
                }
                self.item.discount = *cents as f64 / 100.0;
                self.last_changed = LastChanged::Discount;
                patch.discount = Some(self.item.discount);
                self.sync_discount_pair(&mut patch);
            }
            ItemEdit::SetDiscountPercent { percent } => {
                if locked {
                    return patch;
                }
                self.item.discount_perc = *percent;
                self.last_changed = LastChanged::DiscountPerc;
                patch.discount_perc = Some(*percent);
                self.sync_discount_pair(&mut patch);
            }
            ItemEdit::ToggleApplyDiscounts => {
                if locked {
                    return patch;
                }
                self.item.apply_discounts = !self.item.apply_discounts;
                patch.apply_discounts = Some(self.item.apply_discounts);
            }
            ItemEdit::SetCustomFinalPrice { cents } => {
                self.item.custom_final_price = *cents as f64 / 100.0;
                patch.custom_final_price = Some(self.item.custom_final_price);
            }
            ItemEdit::ToggleCustomFinalPrice => {
                if !self.item.use_custom_final_price {
                    // capture the price currently on display as the seed
                    let seed = if self.item.use_rounding {
                        self.pricing.unit_final_price_rounded
                    } else {
                        self.pricing.unit_final_price
                    };
                    let seed = if seed.is_finite() { seed } else { 0.0 };
                    self.item.custom_final_price = seed;
                    patch.custom_final_price = Some(seed);
                }
                self.item.use_custom_final_price = !self.item.use_custom_final_price;
                patch.use_custom_final_price = Some(self.item.use_custom_final_price);
            }
            ItemEdit::ToggleRounding => {
                if locked {
                    return patch;
                }
                self.item.use_rounding = !self.item.use_rounding;
                patch.use_rounding = Some(self.item.use_rounding);
            }
            ItemEdit::SetRoundingSteps { steps } => {
                if locked || !is_valid_rounding_step(*steps) {
                    return patch;
                }
                self.item.rounding_steps = *steps;
                patch.rounding_steps = Some(*steps);
            }
            ItemEdit::SetRoundingDirection { direction } => {
                if locked {
                    return patch;
                }
                self.item.rounding_direction = *direction;
                patch.rounding_direction = Some(*direction);
            }
        }

        self.pricing = calculate_item_pricing(&self.item);
        patch
    }

    /// Recompute the derived side of the discount pair.
    ///
    /// Only the direction named by the tag fires, so an edit to one side can
    /// never trigger a recomputation of itself through the other.
    fn sync_discount_pair(&mut self, patch: &mut ItemPatch) {
        match self.last_changed {
            LastChanged::Discount => {
                let perc = if self.item.price > 0.0 && self.item.discount > 0.0 {
                    self.item.discount / self.item.price * 100.0
                } else {
                    0.0
                };
                if perc != self.item.discount_perc {
                    self.item.discount_perc = perc;
                    patch.discount_perc = Some(perc);
                }
            }
            LastChanged::DiscountPerc => {
                let discount = if self.item.price > 0.0 && self.item.discount_perc > 0.0 {
                    self.item.price * self.item.discount_perc / 100.0
                } else {
                    0.0
                };
                if discount != self.item.discount {
                    self.item.discount = discount;
                    patch.discount = Some(discount);
                }
            }
            LastChanged::None => {}
        }
    }
}
