//! Core domain types
//!
//! This module contains the core domain structures used across Lathe services.
//! These types represent the fundamental business entities owned by the
//! resource factories and observed by the orchestrators.

pub mod build;
pub mod job;
pub mod permission;
pub mod pipeline;
pub mod secret;
pub mod user;
