//! blogdesk - moderation panel backend for submitted blog posts
//!
//! Admins sign in with a token or cookie, then review, search, approve,
//! reject, edit and comment on blogs stored in SQLite or MySQL.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
