//! # Library Storage Module
//!
//! Owns the discovery database and provides repository patterns for data
//! access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and migrations
//! - Models for tracks, artists and discovery requests
//! - Repositories with pool-level queries for callers outside a transaction
//!   and connection-level functions for work that must share one
//!
//! Functions that take `&mut SqliteConnection` are meant to be called with a
//! transaction (`&mut *tx`). They never commit on their own.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{Artist, DiscoveryRequest, NewDiscoveryRequest, Track};
