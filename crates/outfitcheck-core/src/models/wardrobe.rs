//! Wardrobe models: clothing items and their categories.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ClothingCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: i64,
    pub category: Option<ClothingCategory>,
    pub base_color: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    #[serde(default)]
    pub care_symbols: Vec<String>,
    pub article_type: Option<String>,
    pub season: Option<String>,
    pub usage: Option<String>,
    #[serde(default)]
    pub in_laundry: bool,
}

impl ClothingItem {
    /// Short label for lists, e.g. "Navy Jeans (Levi's)"
    pub fn label(&self) -> String {
        let kind = self
            .article_type
            .as_deref()
            .or_else(|| self.category.as_ref().map(|c| c.name.as_str()))
            .unwrap_or("Item");

        let mut label = match self.base_color.as_deref() {
            Some(color) if !color.is_empty() => format!("{} {}", color, kind),
            _ => kind.to_string(),
        };
        if let Some(brand) = self.brand.as_deref().filter(|b| !b.is_empty()) {
            label.push_str(&format!(" ({})", brand));
        }
        label
    }
}

/// Body of `POST /api/clothing/add`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClothingItem {
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub base_color: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub care_symbols: Vec<String>,
    pub article_type: Option<String>,
    pub season: Option<String>,
    pub usage: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastUsed {
    pub last_used: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorInfo {
    pub hex: String,
    pub name: String,
}

/// What the backend's vision pipeline made of an uploaded photo
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    pub file_name: String,
    pub suggested_category: Option<String>,
    #[serde(default)]
    pub top_colors: Vec<ColorInfo>,
    pub brand: Option<String>,
    pub sub_category: Option<String>,
    pub article_type: Option<String>,
    pub base_colour: Option<String>,
    pub season: Option<String>,
    pub usage: Option<String>,
}

/// Body of the care-label analysis call: the photo as a data URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelAnalysisRequest {
    pub image_base64: String,
}

/// Care symbols recognised on a label photo
#[derive(Debug, Clone, Deserialize)]
pub struct LabelAnalysis {
    #[serde(default)]
    pub symbols: Vec<String>,
}
