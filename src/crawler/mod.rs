//! Catalog crawling
//!
//! This module contains the crawl orchestration, including:
//! - Server resolution from connection strings
//! - Per-level fan-out of folder, service and layer probes
//! - Order-preserving counting joins over each level
//! - Best-effort cancellation

mod coordinator;
mod fan_in;

pub use coordinator::CatalogCrawler;
pub use fan_in::{LevelJoin, SlotHandle};
