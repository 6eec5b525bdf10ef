//! API endpoint integration tests
//!
//! Drives the composed router end to end: sessions, threads, text
//! submissions, uploads and the durable chat log.

#![allow(dead_code)]

mod common;
mod conversations;
mod uploads;
