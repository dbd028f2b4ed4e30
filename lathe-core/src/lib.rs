//! Lathe Core
//!
//! Core types and abstractions for the Lathe CI/CD API.
//!
//! This crate contains:
//! - Domain types: Core business entities (Pipeline, Job, Build, User, Secret)
//! - DTOs: Request payloads and response views exchanged over the API
//! - SCM URL handling: canonical repository locators
//! - Badges: build status to badge color mapping

pub mod badge;
pub mod domain;
pub mod dto;
pub mod scm_url;
