pub mod auth;
pub mod bookmarks;
pub mod health;
pub mod ratings;
pub mod recommend;
pub mod tags;
