//! API client for the OutfitCheck REST backend.
//!
//! Every call is built as a `reqwest::Request`, handed to the
//! `RequestPipeline` for credentials, sent, and on failure handed back to
//! the pipeline before the error reaches the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use reqwest::{header, multipart, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::endpoints;
use super::pipeline::{LogoutHandler, RequestPipeline};
use super::ApiError;
use crate::auth::TokenVault;
use crate::models::{
    CategoryUpdate, ClothingCategory, ClothingItem, ClothingItemUsage, FollowStatus,
    ImageAnalysis, LabelAnalysis, LabelAnalysisRequest, LastUsed, LoggedOutfit, LoginRequest,
    LoginResponse, NewClothingItem, NewLoggedOutfit, NewOutfit, NewPost, NewUser, Outfit,
    OutfitCategory, OutfitRequest, OutfitSuggestion, OutfitUsage, Post, UserProfile,
};

/// HTTP request timeout in seconds.
/// Image uploads go through the backend's vision pipeline, which is slow.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the OutfitCheck backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and all clones share one pipeline.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    pipeline: Arc<RequestPipeline>,
}

impl ApiClient {
    /// Create a client for `base_url` reading credentials from `vault`
    pub fn new(base_url: impl Into<String>, vault: TokenVault) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            pipeline: Arc::new(RequestPipeline::new(vault)),
        })
    }

    /// Route 401 responses to `handler` (normally the session store)
    pub fn with_logout_handler(self, handler: Arc<dyn LogoutHandler>) -> Self {
        self.pipeline.set_logout_handler(handler);
        self
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build()?;
        self.pipeline.before_request(&mut request).await;

        let url = request.url().to_string();
        debug!(method = %request.method(), url = %url, "Sending request");

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                return Err(self
                    .pipeline
                    .on_response_error(&url, ApiError::NetworkError(e))
                    .await)
            }
        };

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(url = %url, status = %status, "Request failed");
        Err(self
            .pipeline
            .on_response_error(&url, ApiError::from_status(status, &body))
            .await)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.client.get(self.url(path))).await?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(self.client.post(self.url(path)).json(body)).await?;
        Self::parse(response).await
    }

    /// Send and discard whatever body comes back
    async fn send_ignoring_body(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await?;
        Ok(())
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(self.client.put(self.url(path)).json(body)).await?;
        Self::parse(response).await
    }

    // ===== Authentication =====

    /// Exchange credentials for a bearer token. The token is returned, not
    /// stored; pass it to `SessionStore::login`.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post(endpoints::LOGIN, &body).await?;
        Ok(response.token)
    }

    pub async fn register(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        self.post(endpoints::REGISTER, user).await
    }

    // ===== Users =====

    pub async fn user_profile(&self, id: i64) -> Result<UserProfile, ApiError> {
        self.get(&endpoints::user_profile(id)).await
    }

    pub async fn is_following(&self, current_user: i64, other: i64) -> Result<bool, ApiError> {
        let builder = self
            .client
            .get(self.url(&endpoints::is_following(other)))
            .query(&[("currentUserId", current_user)]);
        let status: FollowStatus = Self::parse(self.send(builder).await?).await?;
        Ok(status.following)
    }

    pub async fn follow(&self, current_user: i64, other: i64) -> Result<(), ApiError> {
        let builder = self
            .client
            .post(self.url(&endpoints::follow(other)))
            .query(&[("currentUserId", current_user)]);
        self.send_ignoring_body(builder).await
    }

    pub async fn unfollow(&self, current_user: i64, other: i64) -> Result<(), ApiError> {
        let builder = self
            .client
            .post(self.url(&endpoints::unfollow(other)))
            .query(&[("currentUserId", current_user)]);
        self.send_ignoring_body(builder).await
    }

    // ===== Wardrobe =====

    pub async fn categories(&self) -> Result<Vec<ClothingCategory>, ApiError> {
        self.get(endpoints::CLOTHING_CATEGORIES).await
    }

    pub async fn clothing_items(&self, user_id: i64) -> Result<Vec<ClothingItem>, ApiError> {
        self.get(&endpoints::clothing_by_user(user_id)).await
    }

    pub async fn clothing_item(&self, id: i64) -> Result<ClothingItem, ApiError> {
        self.get(&endpoints::clothing_item(id)).await
    }

    pub async fn clothing_items_by_ids(&self, ids: &[i64]) -> Result<Vec<ClothingItem>, ApiError> {
        // The backend answers 400 to an empty id list
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.post(endpoints::CLOTHING_BY_IDS, ids).await
    }

    pub async fn add_clothing_item(&self, item: &NewClothingItem) -> Result<ClothingItem, ApiError> {
        self.post(endpoints::ADD_CLOTHING, item).await
    }

    pub async fn delete_clothing_item(&self, id: i64) -> Result<(), ApiError> {
        self.send_ignoring_body(self.client.delete(self.url(&endpoints::clothing_item(id))))
            .await
    }

    /// Flip the item's laundry flag; returns the updated item
    pub async fn toggle_laundry(&self, id: i64) -> Result<ClothingItem, ApiError> {
        let response = self
            .send(self.client.patch(self.url(&endpoints::toggle_laundry(id))))
            .await?;
        Self::parse(response).await
    }

    pub async fn last_used(&self, id: i64) -> Result<Option<NaiveDate>, ApiError> {
        let last: LastUsed = self.get(&endpoints::last_used(id)).await?;
        Ok(last.last_used)
    }

    /// Upload a photo for analysis before the item is saved
    pub async fn upload_clothing_image(&self, path: &Path) -> Result<ImageAnalysis, ApiError> {
        let form = multipart::Form::new().part("file", image_part(path).await?);
        let response = self
            .send(self.client.post(self.url(endpoints::UPLOAD_CLOTHING_IMAGE)).multipart(form))
            .await?;
        Self::parse(response).await
    }

    /// Read the care symbols off a photo of a garment's label
    pub async fn analyze_label(&self, path: &Path) -> Result<Vec<String>, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let mime = image_mime(path).unwrap_or_else(|| "image/jpeg".to_string());
        let body = LabelAnalysisRequest {
            image_base64: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        };
        let analysis: LabelAnalysis = self.post(endpoints::ANALYZE_LABEL, &body).await?;
        Ok(analysis.symbols)
    }

    // ===== Outfits =====

    pub async fn outfits(&self, user_id: i64) -> Result<Vec<Outfit>, ApiError> {
        self.get(&endpoints::outfits_by_user(user_id)).await
    }

    pub async fn outfit(&self, id: i64) -> Result<Outfit, ApiError> {
        self.get(&endpoints::outfit(id)).await
    }

    pub async fn create_outfit(&self, outfit: &NewOutfit) -> Result<Outfit, ApiError> {
        self.post(endpoints::CREATE_OUTFIT, outfit).await
    }

    pub async fn delete_outfit(&self, id: i64) -> Result<(), ApiError> {
        self.send_ignoring_body(self.client.delete(self.url(&endpoints::outfit(id))))
            .await
    }

    pub async fn toggle_outfit_visibility(&self, id: i64) -> Result<Outfit, ApiError> {
        let response = self
            .send(self.client.put(self.url(&endpoints::toggle_outfit_visibility(id))))
            .await?;
        Self::parse(response).await
    }

    /// Replace the outfit's categories; an empty slice clears them
    pub async fn update_outfit_categories(
        &self,
        id: i64,
        category_ids: &[i64],
    ) -> Result<Outfit, ApiError> {
        let body = CategoryUpdate {
            category_ids: category_ids.to_vec(),
        };
        self.put(&endpoints::outfit_categories_of(id), &body).await
    }

    pub async fn outfits_containing_item(&self, item_id: i64) -> Result<Vec<Outfit>, ApiError> {
        self.get(&endpoints::outfits_containing_item(item_id)).await
    }

    pub async fn outfit_categories(&self) -> Result<Vec<OutfitCategory>, ApiError> {
        self.get(endpoints::OUTFIT_CATEGORIES).await
    }

    // ===== Wear calendar =====

    pub async fn log_outfit(&self, entry: &NewLoggedOutfit) -> Result<LoggedOutfit, ApiError> {
        self.post(endpoints::LOG_OUTFIT, entry).await
    }

    /// Items of the outfit logged for `date`, or `None` if nothing was worn
    pub async fn outfit_worn_on(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Vec<ClothingItem>>, ApiError> {
        let builder = self
            .client
            .get(self.url(endpoints::LOGGED_BY_USER_AND_DATE))
            .query(&[
                ("userId", user_id.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ]);
        match self.send(builder).await {
            Ok(response) => Self::parse(response).await.map(Some),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn logged_outfits(&self, user_id: i64) -> Result<Vec<LoggedOutfit>, ApiError> {
        self.get(&endpoints::logged_outfits_by_user(user_id)).await
    }

    pub async fn delete_logged_outfit(&self, user_id: i64, date: NaiveDate) -> Result<(), ApiError> {
        let url = self.url(&endpoints::delete_logged_outfit(user_id, date));
        self.send_ignoring_body(self.client.delete(url)).await
    }

    pub async fn most_worn_outfits(&self, user_id: i64) -> Result<Vec<OutfitUsage>, ApiError> {
        self.get(&endpoints::most_worn_outfits(user_id)).await
    }

    pub async fn most_used_items(&self, user_id: i64) -> Result<Vec<ClothingItemUsage>, ApiError> {
        self.get(&endpoints::most_used_items(user_id)).await
    }

    pub async fn neglected_items(&self, user_id: i64) -> Result<Vec<ClothingItem>, ApiError> {
        self.get(&endpoints::neglected_items(user_id)).await
    }

    // ===== Recommendations =====

    /// Ask the backend to assemble outfits from the user's wardrobe.
    /// An empty list means nothing matched.
    pub async fn generate_outfits(
        &self,
        request: &OutfitRequest,
    ) -> Result<Vec<OutfitSuggestion>, ApiError> {
        let response = self
            .send(self.client.post(self.url(endpoints::GENERATE_OUTFITS)).json(request))
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        Self::parse(response).await
    }

    // ===== Feed =====

    /// All posts, with like state from `viewer`'s point of view
    pub async fn posts(&self, viewer: i64) -> Result<Vec<Post>, ApiError> {
        let builder = self
            .client
            .get(self.url(endpoints::POSTS))
            .query(&[("currentUserId", viewer)]);
        Self::parse(self.send(builder).await?).await
    }

    /// Share an outfit with a photo
    pub async fn create_post(&self, post: &NewPost, image: &Path) -> Result<Post, ApiError> {
        let form = multipart::Form::new()
            .text("userId", post.user_id.to_string())
            .text("outfitId", post.outfit_id.to_string())
            .text("caption", post.caption.clone())
            .text("hashtags", post.hashtag_field())
            .part("image", image_part(image).await?);
        let response = self
            .send(self.client.post(self.url(endpoints::POSTS)).multipart(form))
            .await?;
        Self::parse(response).await
    }

    pub async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<(), ApiError> {
        let builder = self
            .client
            .post(self.url(&endpoints::toggle_like(post_id)))
            .query(&[("userId", user_id)]);
        self.send_ignoring_body(builder).await
    }

    pub async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<(), ApiError> {
        let builder = self
            .client
            .delete(self.url(&endpoints::post(post_id)))
            .query(&[("userId", user_id)]);
        self.send_ignoring_body(builder).await
    }
}

/// `image/<ext>` from the file extension
fn image_mime(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| format!("image/{}", ext.to_ascii_lowercase()))
}

/// Read an image off disk into a named multipart file part
async fn image_part(path: &Path) -> Result<multipart::Part, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let mut part = multipart::Part::bytes(bytes).file_name(file_name);
    if let Some(mime) = image_mime(path) {
        part = part.mime_str(&mime)?;
    }
    Ok(part)
}
