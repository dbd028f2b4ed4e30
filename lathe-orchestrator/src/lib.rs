//! Lathe orchestrator
//!
//! HTTP service that turns API requests into store lookups, SCM permission
//! checks and resource mutations for pipelines, jobs, builds and secrets.

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod scm;
pub mod service;

#[cfg(test)]
mod testing;
