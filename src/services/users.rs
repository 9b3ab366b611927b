use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    db::{new_id, now},
    error::{AppError, AppResult},
    models::{ArtistProfileRow, Role, UserRow},
    services::artists,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: UserRow,
    pub artist_profile: Option<ArtistProfileRow>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, phone, name, email, role, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> AppResult<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, phone, name, email, role, created_at FROM users WHERE phone = ?",
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn create(pool: &SqlitePool, phone: &str, role: Role) -> AppResult<UserRow> {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO users (id, phone, name, email, role, created_at)
           VALUES (?, ?, '', NULL, ?, ?)"#,
    )
    .bind(&id)
    .bind(phone)
    .bind(role)
    .bind(now())
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {id} vanished after insert")))
}

/// Promotes a client to `role`; admins and existing artists keep their role.
pub async fn promote(tx: &mut Transaction<'_, Sqlite>, user_id: &str, role: Role) -> AppResult<()> {
    sqlx::query("UPDATE users SET role = ? WHERE id = ? AND role = ?")
        .bind(role)
        .bind(user_id)
        .bind(Role::Client)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn current_user(pool: &SqlitePool, user_id: &str) -> AppResult<CurrentUser> {
    let user = find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;
    let artist_profile = artists::find_by_user(pool, user_id).await?;
    Ok(CurrentUser {
        user,
        artist_profile,
    })
}

pub async fn update(pool: &SqlitePool, user_id: &str, update: UserUpdate) -> AppResult<CurrentUser> {
    sqlx::query(
        r#"UPDATE users
           SET name = COALESCE(?, name),
               email = COALESCE(?, email)
           WHERE id = ?"#,
    )
    .bind(update.name)
    .bind(update.email)
    .bind(user_id)
    .execute(pool)
    .await?;

    current_user(pool, user_id).await
}
