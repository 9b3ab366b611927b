pub mod admin;
pub mod art_forms;
pub mod artists;
pub mod availability;
pub mod bookings;
pub mod media;
pub mod moderation;
pub mod reviews;
pub mod users;
