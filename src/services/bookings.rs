use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    auth::AuthUser,
    db::{log_activity, new_id, now},
    error::{AppError, AppResult},
    models::{ArtistProfileRow, BookingRow, BookingStatus, Role, Transition},
    notify::{NewBookingNotice, Notifier, StatusNotice},
    services::{artists, availability},
};

const BOOKING_COLUMNS: &str = "b.id, b.client_id, b.artist_profile_id, b.event_date, b.event_time, \
    b.event_type, b.event_location, b.venue_address, b.duration, b.message, b.status, \
    b.created_at, b.updated_at, b.completed_at, b.cancelled_at";

#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub artist_profile_id: String,
    pub event_date: NaiveDate,
    pub event_time: Option<String>,
    pub event_type: String,
    pub event_location: String,
    pub venue_address: Option<String>,
    pub duration: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: BookingRow,
    pub client_name: String,
    pub artist_name: String,
}

#[derive(sqlx::FromRow)]
struct Contact {
    name: String,
    phone: String,
    email: Option<String>,
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<BookingRow>> {
    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

async fn require(pool: &SqlitePool, id: &str) -> AppResult<BookingRow> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))
}

async fn owner_of(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<String> {
    sqlx::query_scalar::<_, String>("SELECT user_id FROM artist_profiles WHERE id = ?")
        .bind(artist_profile_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))
}

pub async fn create(
    pool: &SqlitePool,
    notifier: &Arc<Notifier>,
    client_id: &str,
    input: CreateBooking,
) -> AppResult<BookingRow> {
    let artist = artists::find_by_id(pool, &input.artist_profile_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))?;

    let event_date = input.event_date.to_string();
    // Check-then-insert is not atomic; the artist's accept step resolves
    // competing requests for the same date.
    if availability::is_blocked(pool, &artist.id, &event_date).await? {
        return Err(AppError::bad_request(
            "Artist is not available on the selected date",
        ));
    }

    let id = new_id();
    let timestamp = now();
    sqlx::query(
        r#"INSERT INTO bookings
           (id, client_id, artist_profile_id, event_date, event_time, event_type,
            event_location, venue_address, duration, message, status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(client_id)
    .bind(&artist.id)
    .bind(&event_date)
    .bind(&input.event_time)
    .bind(&input.event_type)
    .bind(&input.event_location)
    .bind(&input.venue_address)
    .bind(input.duration)
    .bind(&input.message)
    .bind(BookingStatus::Requested)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await?;

    log_activity(
        pool,
        "booking_requested",
        &format!("Booking requested with {} for {event_date}", artist.group_name),
        Some(client_id),
        Some(&id),
    )
    .await;

    if notifier.enabled() {
        let notice = new_booking_notice(pool, &artist, client_id, &input, &event_date).await;
        match notice {
            Ok(notice) => notifier.spawn(notice.render()),
            Err(err) => log::warn!("Skipping new-booking notice for {id}: {err}"),
        }
    }

    require(pool, &id).await
}

/// Fetches one booking for a participant; admins see everything.
pub async fn get_authorized(pool: &SqlitePool, id: &str, caller: &AuthUser) -> AppResult<BookingView> {
    let booking = view(pool, id).await?;
    if caller.is_admin() || booking.booking.client_id == caller.id {
        return Ok(booking);
    }
    if owner_of(pool, &booking.booking.artist_profile_id).await? == caller.id {
        return Ok(booking);
    }
    Err(AppError::forbidden("You do not have access to this booking"))
}

pub async fn list_for_client(pool: &SqlitePool, client_id: &str) -> AppResult<Vec<BookingView>> {
    let rows = sqlx::query_as::<_, BookingView>(&format!(
        r#"SELECT {BOOKING_COLUMNS}, u.name AS client_name, p.group_name AS artist_name
           FROM bookings b
           JOIN users u ON u.id = b.client_id
           JOIN artist_profiles p ON p.id = b.artist_profile_id
           WHERE b.client_id = ?
           ORDER BY b.event_date DESC"#
    ))
    .bind(client_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_for_artist(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<BookingView>> {
    let profile = artists::profile_for_user(pool, user_id).await?;
    let rows = sqlx::query_as::<_, BookingView>(&format!(
        r#"SELECT {BOOKING_COLUMNS}, u.name AS client_name, p.group_name AS artist_name
           FROM bookings b
           JOIN users u ON u.id = b.client_id
           JOIN artist_profiles p ON p.id = b.artist_profile_id
           WHERE b.artist_profile_id = ?
           ORDER BY b.created_at DESC"#
    ))
    .bind(&profile.id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_all(
    pool: &SqlitePool,
    status: Option<BookingStatus>,
) -> AppResult<Vec<BookingView>> {
    let rows = sqlx::query_as::<_, BookingView>(&format!(
        r#"SELECT {BOOKING_COLUMNS}, u.name AS client_name, p.group_name AS artist_name
           FROM bookings b
           JOIN users u ON u.id = b.client_id
           JOIN artist_profiles p ON p.id = b.artist_profile_id
           WHERE ?1 IS NULL OR b.status = ?1
           ORDER BY b.created_at DESC"#
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn view(pool: &SqlitePool, id: &str) -> AppResult<BookingView> {
    sqlx::query_as::<_, BookingView>(&format!(
        r#"SELECT {BOOKING_COLUMNS}, u.name AS client_name, p.group_name AS artist_name
           FROM bookings b
           JOIN users u ON u.id = b.client_id
           JOIN artist_profiles p ON p.id = b.artist_profile_id
           WHERE b.id = ?"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Booking not found"))
}

pub async fn accept(
    pool: &SqlitePool,
    notifier: &Arc<Notifier>,
    id: &str,
    caller: &AuthUser,
) -> AppResult<BookingRow> {
    transition(pool, notifier, id, caller, Transition::Accept).await
}

pub async fn decline(
    pool: &SqlitePool,
    notifier: &Arc<Notifier>,
    id: &str,
    caller: &AuthUser,
) -> AppResult<BookingRow> {
    transition(pool, notifier, id, caller, Transition::Decline).await
}

pub async fn complete(
    pool: &SqlitePool,
    notifier: &Arc<Notifier>,
    id: &str,
    caller: &AuthUser,
) -> AppResult<BookingRow> {
    transition(pool, notifier, id, caller, Transition::Complete).await
}

pub async fn cancel(
    pool: &SqlitePool,
    notifier: &Arc<Notifier>,
    id: &str,
    caller: &AuthUser,
) -> AppResult<BookingRow> {
    transition(pool, notifier, id, caller, Transition::Cancel).await
}

fn may_perform(transition: Transition, caller: &AuthUser, is_owner: bool, is_client: bool) -> bool {
    match transition {
        Transition::Accept | Transition::Decline => is_owner,
        Transition::Complete => is_owner || caller.role == Role::Admin,
        Transition::Cancel => is_owner || is_client || caller.role == Role::Admin,
    }
}

fn status_error(transition: Transition) -> AppError {
    let allowed = transition
        .sources()
        .iter()
        .map(BookingStatus::as_str)
        .collect::<Vec<_>>()
        .join(" or ");
    AppError::bad_request(format!(
        "Booking can only be {} when in {allowed} status",
        transition.verb()
    ))
}

async fn transition(
    pool: &SqlitePool,
    notifier: &Arc<Notifier>,
    id: &str,
    caller: &AuthUser,
    transition: Transition,
) -> AppResult<BookingRow> {
    let booking = require(pool, id).await?;
    let artist = artists::find_by_id(pool, &booking.artist_profile_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))?;

    let is_owner = artist.user_id == caller.id;
    let is_client = booking.client_id == caller.id;
    if !may_perform(transition, caller, is_owner, is_client) {
        return Err(AppError::forbidden(format!(
            "You are not allowed to mark this booking {}",
            transition.verb()
        )));
    }
    if !transition.allows(booking.status) {
        return Err(status_error(transition));
    }

    let target = transition.target();
    let timestamp = now();
    // Conditional on the status just read, so a racing transition loses.
    let updated = sqlx::query(
        r#"UPDATE bookings
           SET status = ?,
               updated_at = ?,
               completed_at = CASE WHEN ? = 'COMPLETED' THEN ? ELSE completed_at END,
               cancelled_at = CASE WHEN ? = 'CANCELLED' THEN ? ELSE cancelled_at END
           WHERE id = ? AND status = ?"#,
    )
    .bind(target)
    .bind(&timestamp)
    .bind(target)
    .bind(&timestamp)
    .bind(target)
    .bind(&timestamp)
    .bind(id)
    .bind(booking.status)
    .execute(pool)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(status_error(transition));
    }

    match (transition, booking.status) {
        (Transition::Accept, _) => {
            // The accept stands even when the calendar write fails.
            if let Err(err) =
                availability::block_date(pool, &artist.id, &booking.event_date).await
            {
                log::error!("Failed to block {} for booking {id}: {err}", booking.event_date);
            }
        }
        (Transition::Cancel, BookingStatus::Accepted) => {
            if let Err(err) =
                availability::unblock_date(pool, &artist.id, &booking.event_date).await
            {
                log::error!("Failed to unblock {} for booking {id}: {err}", booking.event_date);
            }
        }
        _ => {}
    }

    log_activity(
        pool,
        &format!("booking_{}", transition.verb()),
        &format!(
            "Booking {id} with {} {} ({} -> {target})",
            artist.group_name,
            transition.verb(),
            booking.status
        ),
        Some(&caller.id),
        Some(id),
    )
    .await;

    if matches!(transition, Transition::Accept | Transition::Decline) && notifier.enabled() {
        match contact(pool, &booking.client_id).await {
            Ok(client) => notifier.spawn(
                StatusNotice {
                    client_phone: client.phone,
                    client_email: client.email,
                    client_name: display_name(client.name, "there"),
                    artist_name: artist.group_name.clone(),
                    status: target.to_string(),
                    event_date: booking.event_date.clone(),
                }
                .render(),
            ),
            Err(err) => log::warn!("Skipping status notice for booking {id}: {err}"),
        }
    }

    require(pool, id).await
}

async fn new_booking_notice(
    pool: &SqlitePool,
    artist: &ArtistProfileRow,
    client_id: &str,
    input: &CreateBooking,
    event_date: &str,
) -> AppResult<NewBookingNotice> {
    let owner = contact(pool, &artist.user_id).await?;
    let client = contact(pool, client_id).await?;
    Ok(NewBookingNotice {
        artist_phone: owner.phone,
        artist_email: owner.email,
        artist_name: artist.group_name.clone(),
        client_name: display_name(client.name, "Client"),
        event_type: input.event_type.clone(),
        event_date: event_date.to_string(),
        event_location: input.event_location.clone(),
    })
}

async fn contact(pool: &SqlitePool, user_id: &str) -> AppResult<Contact> {
    sqlx::query_as::<_, Contact>("SELECT name, phone, email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

fn display_name(name: String, fallback: &str) -> String {
    if name.trim().is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: "u1".into(),
            role,
        }
    }

    #[test]
    fn only_the_owning_artist_accepts_or_declines() {
        let admin = caller(Role::Admin);
        assert!(!may_perform(Transition::Accept, &admin, false, false));
        assert!(!may_perform(Transition::Decline, &caller(Role::Client), false, true));
        assert!(may_perform(Transition::Accept, &caller(Role::Artist), true, false));
    }

    #[test]
    fn admins_complete_and_cancel() {
        let admin = caller(Role::Admin);
        assert!(may_perform(Transition::Complete, &admin, false, false));
        assert!(may_perform(Transition::Cancel, &admin, false, false));
        assert!(!may_perform(Transition::Complete, &caller(Role::Client), false, true));
        assert!(may_perform(Transition::Cancel, &caller(Role::Client), false, true));
    }

    #[test]
    fn status_errors_name_the_allowed_sources() {
        let AppError::BadRequest(message) = status_error(Transition::Cancel) else {
            panic!("expected BadRequest");
        };
        assert_eq!(
            message,
            "Booking can only be cancelled when in REQUESTED or ACCEPTED status"
        );
    }
}
