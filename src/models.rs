use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Artist,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Artist => "ARTIST",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CLIENT" => Ok(Role::Client),
            "ARTIST" => Ok(Role::Artist),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Requested,
    Accepted,
    Declined,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Requested,
        BookingStatus::Accepted,
        BookingStatus::Declined,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "REQUESTED",
            BookingStatus::Accepted => "ACCEPTED",
            BookingStatus::Declined => "DECLINED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| format!("Invalid booking status: {value}"))
    }
}

/// Edges of the booking state machine. Creation is not a transition; every
/// booking starts out `REQUESTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Decline,
    Complete,
    Cancel,
}

impl Transition {
    pub fn sources(&self) -> &'static [BookingStatus] {
        match self {
            Transition::Accept | Transition::Decline => &[BookingStatus::Requested],
            Transition::Complete => &[BookingStatus::Accepted],
            Transition::Cancel => &[BookingStatus::Requested, BookingStatus::Accepted],
        }
    }

    pub fn target(&self) -> BookingStatus {
        match self {
            Transition::Accept => BookingStatus::Accepted,
            Transition::Decline => BookingStatus::Declined,
            Transition::Complete => BookingStatus::Completed,
            Transition::Cancel => BookingStatus::Cancelled,
        }
    }

    pub fn allows(&self, from: BookingStatus) -> bool {
        self.sources().contains(&from)
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Accept => "accepted",
            Transition::Decline => "declined",
            Transition::Complete => "completed",
            Transition::Cancel => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Photo,
    VideoLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    NotSubmitted,
    Pending,
    Verified,
}

/// Flag and soft-delete state shared by every moderatable entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Moderation {
    pub flagged_at: Option<String>,
    pub flag_reason: Option<String>,
    pub removed_at: Option<String>,
}

impl Moderation {
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: String,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArtFormRow {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub region: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArtistProfileRow {
    pub id: String,
    pub user_id: String,
    pub group_name: String,
    pub description: Option<String>,
    pub base_price: i64,
    pub price_unit: String,
    pub group_size: Option<i64>,
    #[sqlx(json)]
    pub service_areas: Vec<String>,
    #[sqlx(json)]
    pub languages: Vec<String>,
    pub experience: Option<i64>,
    pub based_in: String,
    pub is_approved: bool,
    pub is_active: bool,
    pub kyc_status: KycStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRow {
    pub id: String,
    pub artist_profile_id: String,
    pub date: String,
    pub is_blocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingRow {
    pub id: String,
    pub client_id: String,
    pub artist_profile_id: String,
    pub event_date: String,
    pub event_time: Option<String>,
    pub event_type: String,
    pub event_location: String,
    pub venue_address: Option<String>,
    pub duration: Option<i64>,
    pub message: Option<String>,
    pub status: BookingStatus,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub id: String,
    pub booking_id: String,
    pub client_id: String,
    pub artist_profile_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub moderation: Moderation,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MediaRow {
    pub id: String,
    pub artist_profile_id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub caption: Option<String>,
    pub sort_order: i64,
    pub created_at: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub moderation: Moderation,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    pub kind: String,
    pub message: String,
    pub created_at: String,
    pub user_id: Option<String>,
    pub subject_id: Option<String>,
}
