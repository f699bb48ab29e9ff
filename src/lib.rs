//! tool-scout - batched tool-catalogue scraping and weekly caching.
//!
//! Core library exposing the scrape pipeline, the batch cache and the HTTP
//! surface used by the `tool-scout` binary.

pub mod cache;
pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod registry;
pub mod repository;
pub mod schema;
pub mod scrape;
pub mod server;
pub mod services;
pub mod supplier;
