//! Service layer for tool-scout business logic.
//!
//! The dispatcher turns a scrape request into a response and is shared by
//! the HTTP server and the CLI.

pub mod dispatch;
pub mod responses;

pub use dispatch::{DispatchError, Dispatcher};
pub use responses::{
    BatchParam, CachedResponse, FreshResponse, HardFailure, MergeResponse, ScrapeRequest,
    ScrapeResponse, SoftFailureResponse,
};
