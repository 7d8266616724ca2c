//! Data models for OutfitCheck entities.
//!
//! These mirror the backend's JSON payloads:
//!
//! - `UserProfile`, `NewUser`, `LoginRequest`: accounts and authentication
//! - `ClothingItem`, `ClothingCategory`, `NewClothingItem`: the wardrobe
//! - `Outfit`, `NewOutfit`, `LoggedOutfit`: outfits and the wear calendar
//! - `OutfitUsage`, `ClothingItemUsage`: wear statistics
//! - `OutfitRequest`, `OutfitSuggestion`: outfit generation
//! - `Post`, `NewPost`: the social feed

pub mod outfit;
pub mod post;
pub mod user;
pub mod wardrobe;

pub use outfit::{
    CategoryUpdate, ClothingItemUsage, LoggedOutfit, NewLoggedOutfit, NewOutfit, Outfit,
    OutfitCategory, OutfitRequest, OutfitSuggestion, OutfitUsage,
};
pub use post::{NewPost, Post};
pub use user::{FollowStatus, LoginRequest, LoginResponse, NewUser, UserProfile};
pub use wardrobe::{
    ClothingCategory, ClothingItem, ColorInfo, ImageAnalysis, LabelAnalysis, LabelAnalysisRequest,
    LastUsed, NewClothingItem,
};
