//! Notes API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::notes::session::ItemEdit;
use crate::pricing::ItemPricing;
use crate::utils::{AppError, AppResult};
use shared::models::item::{Item, ItemPatch, RoundingDirection, is_valid_rounding_step};
use shared::models::note::{Note, ScrapData};
use shared::util::format_brl;

/// POST /api/notes/import request body: the scraped payload plus the
/// scanned url it came from.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub url: String,
    #[serde(flatten)]
    pub scrap: ScrapData,
}

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    pub url: String,
}

/// BRL-formatted strings for every derived quantity. Values that are not
/// computable yet (zero units) render as `R$ 0,00`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPrices {
    pub unit_price: String,
    pub price_discounted: String,
    pub unit_price_discounted: String,
    pub unit_final_price: String,
    pub unit_final_price_rounded: String,
}

impl DisplayPrices {
    fn new(pricing: &ItemPricing) -> Self {
        Self {
            unit_price: format_brl(pricing.unit_price),
            price_discounted: format_brl(pricing.price_discounted),
            unit_price_discounted: format_brl(pricing.unit_price_discounted),
            unit_final_price: format_brl(pricing.unit_final_price),
            unit_final_price_rounded: format_brl(pricing.unit_final_price_rounded),
        }
    }
}

/// One item with its derived pricing. Non-finite pricing values serialize
/// as null ("pending"); the display block already falls back to zero.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub item: Item,
    pub pricing: ItemPricing,
    pub display: DisplayPrices,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub name: String,
    pub date: String,
    pub total_price: String,
    pub url: String,
    pub has_unsaved_changes: bool,
    pub items: Vec<ItemView>,
}

impl NoteView {
    fn new(note: Note, pricing: Vec<ItemPricing>, has_unsaved_changes: bool) -> Self {
        let items = note
            .items
            .into_iter()
            .zip(pricing)
            .map(|(item, pricing)| ItemView {
                display: DisplayPrices::new(&pricing),
                pricing,
                item,
            })
            .collect();

        Self {
            name: note.name,
            date: note.date,
            total_price: note.total_price,
            url: note.url,
            has_unsaved_changes,
            items,
        }
    }
}

/// Result of one applied edit: the updated item plus the patch that was
/// merged into the note (empty when the edit was rejected).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub item: Item,
    pub pricing: ItemPricing,
    pub display: DisplayPrices,
    pub patch: ItemPatch,
}

fn current_view(state: &ServerState) -> AppResult<NoteView> {
    let (note, pricing) = state
        .notes
        .current_with_pricing()
        .ok_or_else(|| AppError::not_found("No note is currently open"))?;
    Ok(NoteView::new(
        note,
        pricing,
        state.notes.has_unsaved_remote_changes(),
    ))
}

/// Boundary validation for edit payloads: the session itself never errors,
/// but requests carrying out-of-domain values deserve a 400 instead of a
/// silent no-op.
fn validate_edit(edit: &ItemEdit) -> AppResult<()> {
    match edit {
        ItemEdit::SetPrice { cents }
        | ItemEdit::SetDiscount { cents }
        | ItemEdit::SetCustomFinalPrice { cents } => {
            if *cents < 0 {
                return Err(AppError::validation("Amount must be non-negative"));
            }
        }
        ItemEdit::SetProfitMargin { percent } | ItemEdit::SetDiscountPercent { percent } => {
            if !percent.is_finite() {
                return Err(AppError::validation("Percentage must be a finite number"));
            }
        }
        ItemEdit::SetRoundingSteps { steps } => {
            if !is_valid_rounding_step(*steps) {
                return Err(AppError::validation("Rounding step must be 5 or 10 cents"));
            }
        }
        ItemEdit::SetRoundingDirection { direction } => {
            if *direction == RoundingDirection::Nearest {
                return Err(AppError::validation("Rounding direction must be up or down"));
            }
        }
        _ => {}
    }
    Ok(())
}

/// GET /api/notes - all stored notes, ordered by receipt date
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Note>>> {
    let notes = state.notes.list_notes()?;
    Ok(Json(notes))
}

/// POST /api/notes/import - turn a scraped receipt into the working note
pub async fn import(
    State(state): State<ServerState>,
    Json(payload): Json<ImportRequest>,
) -> AppResult<Json<NoteView>> {
    state.notes.import_scrap(&payload.url, &payload.scrap)?;
    Ok(Json(current_view(&state)?))
}

/// POST /api/notes/open - re-open a stored note
pub async fn open(
    State(state): State<ServerState>,
    Json(payload): Json<OpenRequest>,
) -> AppResult<Json<NoteView>> {
    state.notes.open_saved(&payload.url)?;
    Ok(Json(current_view(&state)?))
}

/// GET /api/notes/current - the working note with derived pricing
pub async fn current(State(state): State<ServerState>) -> AppResult<Json<NoteView>> {
    Ok(Json(current_view(&state)?))
}

/// POST /api/notes/current/items/:index/edits - apply one edit operation
pub async fn edit_item(
    State(state): State<ServerState>,
    Path(index): Path<usize>,
    Json(edit): Json<ItemEdit>,
) -> AppResult<Json<EditResponse>> {
    validate_edit(&edit)?;

    let outcome = state.notes.edit_item(index, &edit)?;
    Ok(Json(EditResponse {
        display: DisplayPrices::new(&outcome.pricing),
        item: outcome.item,
        pricing: outcome.pricing,
        patch: outcome.patch,
    }))
}

/// POST /api/notes/current/save-remote - push the working note to the
/// remote store. At most one save is in flight; failures are recoverable
/// and the unsaved flag stays set for a manual retry.
pub async fn save_remote(State(state): State<ServerState>) -> AppResult<Json<bool>> {
    let remote = state.remote_store()?;
    state.notes.save_remote(remote).await?;
    Ok(Json(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_edit_rejects_out_of_domain_values() {
        assert!(validate_edit(&ItemEdit::SetPrice { cents: -1 }).is_err());
        assert!(validate_edit(&ItemEdit::SetDiscount { cents: -100 }).is_err());
        assert!(
            validate_edit(&ItemEdit::SetProfitMargin {
                percent: f64::INFINITY
            })
            .is_err()
        );
        assert!(validate_edit(&ItemEdit::SetRoundingSteps { steps: 7 }).is_err());
        assert!(
            validate_edit(&ItemEdit::SetRoundingDirection {
                direction: RoundingDirection::Nearest
            })
            .is_err()
        );
    }

    #[test]
    fn test_validate_edit_accepts_domain_values() {
        assert!(validate_edit(&ItemEdit::SetPrice { cents: 0 }).is_ok());
        assert!(validate_edit(&ItemEdit::SetDiscount { cents: 1000 }).is_ok());
        assert!(validate_edit(&ItemEdit::SetProfitMargin { percent: 30.0 }).is_ok());
        assert!(validate_edit(&ItemEdit::SetRoundingSteps { steps: 10 }).is_ok());
        assert!(validate_edit(&ItemEdit::ToggleRounding).is_ok());
        assert!(
            validate_edit(&ItemEdit::SetUnits {
                text: "abc".to_string()
            })
            .is_ok()
        );
    }
}
