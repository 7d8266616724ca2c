//! Outfits, the wear calendar and wear statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::wardrobe::ClothingItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct OutfitCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Outfit {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "clothingItems", default)]
    pub clothing_items: Vec<ClothingItem>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub categories: Vec<OutfitCategory>,
}

impl Outfit {
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Outfit #{}", self.id),
        }
    }

    /// Items of this outfit currently in the laundry
    pub fn items_in_laundry(&self) -> impl Iterator<Item = &ClothingItem> {
        self.clothing_items.iter().filter(|i| i.in_laundry)
    }
}

/// Body of `POST /api/outfits/create`
#[derive(Debug, Clone, Serialize)]
pub struct NewOutfit {
    pub name: String,
    #[serde(rename = "creatorId")]
    pub creator_id: i64,
    pub visible: bool,
    /// Clothing item ids
    pub items: Vec<i64>,
}

/// Body of `POST /api/logged-outfits`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoggedOutfit {
    pub outfit_id: i64,
    pub date: NaiveDate,
    pub user_id: i64,
}

/// An outfit marked as worn on a given day
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedOutfit {
    pub id: i64,
    pub outfit: Option<Outfit>,
    pub date: NaiveDate,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitUsage {
    pub outfit: Outfit,
    pub usage_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItemUsage {
    pub item: ClothingItem,
    pub usage_count: u64,
}

/// Body of `PUT /api/outfits/{id}/categories`; an empty list clears them
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub category_ids: Vec<i64>,
}

/// What to generate outfits for
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitRequest {
    pub user_id: i64,
    /// Dress code, e.g. "Smart Casual"
    pub context: String,
    pub season: String,
    pub include_headwear: bool,
    pub include_outerwear: bool,
    /// 1 or 2
    pub topwear_layers: u8,
    pub prefer_full_bodywear: bool,
}

/// One generated outfit: a clothing item id per slot, and how well it scored
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitSuggestion {
    pub top1_id: Option<i64>,
    pub top2_id: Option<i64>,
    pub bottom_id: Option<i64>,
    pub footwear_id: Option<i64>,
    pub outerwear_id: Option<i64>,
    pub headwear_id: Option<i64>,
    pub full_bodywear_id: Option<i64>,
    #[serde(default)]
    pub score: f64,
}

impl OutfitSuggestion {
    /// Ids of the filled slots, head to toe
    pub fn item_ids(&self) -> Vec<i64> {
        [
            self.headwear_id,
            self.outerwear_id,
            self.top1_id,
            self.top2_id,
            self.full_bodywear_id,
            self.bottom_id,
            self.footwear_id,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
