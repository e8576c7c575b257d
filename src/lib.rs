//! Directorio - community directory of local businesses and culture
//!
//! Members list and review businesses, share stories, recipes and popular
//! knowledge, and propose cultural events. Everything a member submits waits
//! for an administrator in the moderation console.

pub mod api;
pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
