//! Lightweight (non-browser) retrieval

pub mod http_client;
pub mod session;

pub use http_client::{HttpFetcher, HttpPage, ReqwestFetcher};
pub use session::SessionState;
