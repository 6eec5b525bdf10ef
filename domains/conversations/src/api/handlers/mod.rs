//! HTTP handlers for the Conversations domain

pub mod messages;
pub mod sessions;
pub mod threads;
pub mod uploads;
