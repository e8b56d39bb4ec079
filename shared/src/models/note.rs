//! One persisted receipt plus its computed pricing for all items

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::item::Item;

/// Raw receipt line as scraped from the government portal page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapItem {
    pub name: String,
    pub units: u32,
    /// Total cost for all units
    pub price: f64,
}

/// Payload produced by the page-scraping collaborator.
///
/// `date` arrives as a `DD/MM/YYYY` display string and `totalPrice` as the
/// portal's own formatted text; both are stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapData {
    pub items: Vec<ScrapItem>,
    pub name: String,
    pub date: String,
    pub total_price: String,
}

/// One receipt with its pricing work, keyed by the scanned URL.
///
/// Re-scanning the same receipt replaces the stored record in place (both
/// locally and remotely); items are only ever mutated through edit patches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub items: Vec<Item>,
    /// Supplier name
    pub name: String,
    /// Receipt date, `DD/MM/YYYY`
    pub date: String,
    /// Receipt total as displayed by the portal
    pub total_price: String,
    /// Source URL, the natural key for persistence
    pub url: String,
}

impl Note {
    /// Build a note from a scraped payload, defaulting every pricing field.
    pub fn from_scrap(url: impl Into<String>, scrap: &ScrapData) -> Self {
        Self {
            items: scrap.items.iter().map(Item::from_scrap).collect(),
            name: scrap.name.clone(),
            date: scrap.date.clone(),
            total_price: scrap.total_price.clone(),
            url: url.into(),
        }
    }

    /// Parse the receipt date for list ordering. `None` when the portal
    /// produced something unexpected; such notes sort first.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%d/%m/%Y").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrap_data() -> ScrapData {
        ScrapData {
            items: vec![
                ScrapItem {
                    name: "Arroz".to_string(),
                    units: 2,
                    price: 45.90,
                },
                ScrapItem {
                    name: "Feijão".to_string(),
                    units: 1,
                    price: 8.50,
                },
            ],
            name: "Mercado Central".to_string(),
            date: "05/08/2026".to_string(),
            total_price: "54,40".to_string(),
        }
    }

    #[test]
    fn test_from_scrap_builds_defaulted_items() {
        let note = Note::from_scrap("https://sefaz.example/nfce?p=1", &scrap_data());

        assert_eq!(note.items.len(), 2);
        assert_eq!(note.name, "Mercado Central");
        assert_eq!(note.date, "05/08/2026");
        assert_eq!(note.total_price, "54,40");
        assert_eq!(note.url, "https://sefaz.example/nfce?p=1");
        assert_eq!(note.items[0].profit_margin, 30.0);
        assert!(!note.items[1].apply_discounts);
    }

    #[test]
    fn test_parsed_date_is_day_month_year() {
        let mut note = Note::from_scrap("u", &scrap_data());
        note.date = "02/01/2026".to_string();

        let date = note.parsed_date().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    }

    #[test]
    fn test_parsed_date_rejects_garbage() {
        let mut note = Note::from_scrap("u", &scrap_data());
        note.date = "não informada".to_string();
        assert!(note.parsed_date().is_none());

        note.date = "31/13/2026".to_string();
        assert!(note.parsed_date().is_none());
    }

    #[test]
    fn test_date_ordering_across_year_boundary() {
        let mut a = Note::from_scrap("a", &scrap_data());
        a.date = "31/12/2025".to_string();
        let mut b = Note::from_scrap("b", &scrap_data());
        b.date = "01/01/2026".to_string();

        assert!(a.parsed_date().unwrap() < b.parsed_date().unwrap());
    }

    #[test]
    fn test_note_wire_format() {
        let note = Note::from_scrap("url-1", &scrap_data());
        let value = serde_json::to_value(&note).unwrap();

        assert!(value.get("totalPrice").is_some());
        assert!(value.get("items").unwrap().is_array());

        let back: Note = serde_json::from_value(value).unwrap();
        assert_eq!(back, note);
    }
}
