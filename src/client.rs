//! Typed client for the JSON API, for frontends and scripts.
//!
//! Every non-2xx response becomes [`ClientError::Api`] carrying the server's
//! `message` when the body has one.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    auth::Session,
    error::ErrorBody,
    models::{BookingRow, MediaKind, MediaRow, Role, ReviewRow},
    services::{
        artists::{ArtistDetail, ArtistSummary, CreatedArtist},
        availability::MonthView,
        bookings::BookingView,
        moderation::{FlaggedContent, ModerationResult},
        reviews::ReviewView,
        users::CurrentUser,
    },
    storage::UploadTicket,
};

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";
const FALLBACK_MESSAGE: &str = "API request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message} ({status})")]
    Api { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http: reqwest::Client::new(),
        }
    }

    /// Reads `PUBLIC_API_URL`, falling back to the local dev server.
    pub fn from_env() -> Self {
        let base_url = std::env::var("PUBLIC_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| FALLBACK_MESSAGE.to_string());
            return Err(ClientError::Api { status, message });
        }
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    async fn delete<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(self.request(Method::DELETE, path).json(body)).await
    }

    pub async fn send_otp(&self, phone: &str) -> ClientResult<Value> {
        self.post("/auth/send-otp", &json!({ "phone": phone })).await
    }

    /// Verifies the code and keeps the issued token for later calls.
    pub async fn verify_otp(&mut self, phone: &str, otp: &str, role: Option<Role>) -> ClientResult<Session> {
        let session: Session = self
            .post("/auth/verify-otp", &json!({ "phone": phone, "otp": otp, "role": role }))
            .await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn me(&self) -> ClientResult<CurrentUser> {
        self.get("/auth/me").await
    }

    pub async fn update_me(&self, name: Option<&str>, email: Option<&str>) -> ClientResult<CurrentUser> {
        self.patch("/auth/me", &json!({ "name": name, "email": email })).await
    }

    pub async fn artists(
        &self,
        art_form: Option<&str>,
        city: Option<&str>,
        search: Option<&str>,
    ) -> ClientResult<Vec<ArtistSummary>> {
        let params = [("artForm", art_form), ("city", city), ("search", search)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect::<Vec<_>>();
        self.send(self.request(Method::GET, "/artists").query(&params)).await
    }

    pub async fn artist(&self, id: &str) -> ClientResult<ArtistDetail> {
        self.get(&format!("/artists/{id}")).await
    }

    /// Creates the caller's profile and switches to the returned token.
    pub async fn create_artist(&mut self, profile: &Value) -> ClientResult<CreatedArtist> {
        let created: CreatedArtist = self.post("/artists", profile).await?;
        self.token = Some(created.token.clone());
        Ok(created)
    }

    pub async fn update_artist(&self, id: &str, changes: &Value) -> ClientResult<Value> {
        self.patch(&format!("/artists/{id}"), changes).await
    }

    pub async fn create_booking(&self, booking: &Value) -> ClientResult<BookingRow> {
        self.post("/bookings", booking).await
    }

    pub async fn my_bookings(&self) -> ClientResult<Vec<BookingView>> {
        self.get("/bookings/my").await
    }

    pub async fn artist_bookings(&self) -> ClientResult<Vec<BookingView>> {
        self.get("/bookings/artist").await
    }

    pub async fn booking(&self, id: &str) -> ClientResult<BookingView> {
        self.get(&format!("/bookings/{id}")).await
    }

    /// `action` is one of `accept`, `decline`, `complete`, `cancel`.
    pub async fn transition_booking(&self, id: &str, action: &str) -> ClientResult<BookingRow> {
        self.patch(&format!("/bookings/{id}/{action}"), &json!({})).await
    }

    pub async fn block_dates(&self, dates: &[&str]) -> ClientResult<Value> {
        self.post("/availability", &json!({ "dates": dates })).await
    }

    pub async fn unblock_dates(&self, dates: &[&str]) -> ClientResult<Value> {
        self.delete("/availability", &json!({ "dates": dates })).await
    }

    pub async fn availability(&self, artist_profile_id: &str, year: i32, month: u32) -> ClientResult<MonthView> {
        self.get(&format!(
            "/availability/{artist_profile_id}?year={year}&month={month}"
        ))
        .await
    }

    pub async fn create_review(
        &self,
        booking_id: &str,
        rating: i64,
        comment: Option<&str>,
    ) -> ClientResult<ReviewRow> {
        self.post(
            "/reviews",
            &json!({ "bookingId": booking_id, "rating": rating, "comment": comment }),
        )
        .await
    }

    pub async fn artist_reviews(&self, artist_profile_id: &str) -> ClientResult<Vec<ReviewView>> {
        self.get(&format!("/reviews/artist/{artist_profile_id}")).await
    }

    pub async fn upload_url(&self, filename: &str, content_type: &str) -> ClientResult<UploadTicket> {
        self.post(
            "/media/upload-url",
            &json!({ "filename": filename, "contentType": content_type }),
        )
        .await
    }

    pub async fn add_media(&self, kind: MediaKind, url: &str, caption: Option<&str>) -> ClientResult<MediaRow> {
        self.post("/media", &json!({ "type": kind, "url": url, "caption": caption }))
            .await
    }

    pub async fn remove_media(&self, id: &str) -> ClientResult<MediaRow> {
        self.send(self.request(Method::DELETE, &format!("/media/{id}")))
            .await
    }

    pub async fn reorder_media(&self, ordered_ids: &[&str]) -> ClientResult<Vec<MediaRow>> {
        self.patch("/media/reorder", &json!({ "orderedIds": ordered_ids }))
            .await
    }

    pub async fn artist_media(&self, artist_profile_id: &str) -> ClientResult<Vec<MediaRow>> {
        self.get(&format!("/media/artist/{artist_profile_id}")).await
    }

    pub async fn flagged_content(&self) -> ClientResult<FlaggedContent> {
        self.get("/admin/moderation").await
    }

    /// `target` is `media` or `reviews`; `action` is `flag`, `unflag` or `remove`.
    pub async fn moderate(
        &self,
        target: &str,
        id: &str,
        action: &str,
        reason: Option<&str>,
    ) -> ClientResult<ModerationResult> {
        self.patch(
            &format!("/admin/moderation/{target}/{id}/{action}"),
            &json!({ "reason": reason }),
        )
        .await
    }
}
