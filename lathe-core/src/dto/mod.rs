//! Data Transfer Objects
//!
//! Request payloads accepted by the API, response views returned by it, and
//! the creation payloads handed to the resource factories.

pub mod build;
pub mod list;
pub mod pipeline;
pub mod secret;
