//! Backend routes, relative to the configured base URL.

use chrono::NaiveDate;

pub const LOGIN: &str = "/users/login";
pub const REGISTER: &str = "/users/register";

/// Requests whose URL contains one of these never carry credentials
pub const UNAUTHENTICATED: [&str; 2] = [LOGIN, REGISTER];

pub fn user_profile(id: i64) -> String {
    format!("/users/profile/{}", id)
}

pub fn is_following(other: i64) -> String {
    format!("/api/users/{}/is-following", other)
}

pub fn follow(other: i64) -> String {
    format!("/api/users/{}/follow", other)
}

pub fn unfollow(other: i64) -> String {
    format!("/api/users/{}/unfollow", other)
}

// ===== Wardrobe =====

pub const CLOTHING_CATEGORIES: &str = "/api/categories/all";
pub const ADD_CLOTHING: &str = "/api/clothing/add";
pub const UPLOAD_CLOTHING_IMAGE: &str = "/api/clothing/upload-temp-image";
pub const CLOTHING_BY_IDS: &str = "/api/clothing/by-ids";

pub fn clothing_by_user(user_id: i64) -> String {
    format!("/api/clothing/user/{}", user_id)
}

pub fn clothing_item(id: i64) -> String {
    format!("/api/clothing/{}", id)
}

pub fn toggle_laundry(id: i64) -> String {
    format!("/api/clothing/{}/toggle-laundry", id)
}

pub fn last_used(id: i64) -> String {
    format!("/api/clothing/{}/last-used", id)
}

pub const ANALYZE_LABEL: &str = "/api/openai/analyze-label";

// ===== Outfits =====

pub const CREATE_OUTFIT: &str = "/api/outfits/create";
pub const OUTFIT_CATEGORIES: &str = "/api/outfit-categories";

pub fn outfits_by_user(user_id: i64) -> String {
    format!("/api/outfits/user/{}", user_id)
}

pub fn outfit(id: i64) -> String {
    format!("/api/outfits/{}", id)
}

pub fn toggle_outfit_visibility(id: i64) -> String {
    format!("/api/outfits/{}/toggle-visibility", id)
}

pub fn outfit_categories_of(id: i64) -> String {
    format!("/api/outfits/{}/categories", id)
}

pub fn outfits_containing_item(item_id: i64) -> String {
    format!("/api/outfits/clothing-items/{}/outfits", item_id)
}

// ===== Wear calendar =====

pub const LOG_OUTFIT: &str = "/api/logged-outfits";
pub const LOGGED_BY_USER_AND_DATE: &str = "/api/logged-outfits/by-user-and-date";

pub fn logged_outfits_by_user(user_id: i64) -> String {
    format!("/api/logged-outfits/by-user/{}", user_id)
}

pub fn delete_logged_outfit(user_id: i64, date: NaiveDate) -> String {
    format!("/api/logged-outfits/{}/{}", user_id, date.format("%Y-%m-%d"))
}

pub fn most_worn_outfits(user_id: i64) -> String {
    format!("/api/logged-outfits/most-worn-outfits/{}", user_id)
}

pub fn most_used_items(user_id: i64) -> String {
    format!("/api/logged-outfits/most-used-items/{}", user_id)
}

pub fn neglected_items(user_id: i64) -> String {
    format!("/api/logged-outfits/neglected-items/{}", user_id)
}

// ===== Recommendations =====

pub const GENERATE_OUTFITS: &str = "/api/recommendations/generate";

// ===== Feed =====

pub const POSTS: &str = "/api/posts";

pub fn toggle_like(post_id: i64) -> String {
    format!("/api/posts/{}/like", post_id)
}

pub fn post(id: i64) -> String {
    format!("/api/posts/{}", id)
}
