//! Data model for catalog discovery
//!
//! - [`Resource`]: the uniform record for any discoverable catalog node
//! - [`Filter`]: inclusion flags applied while crawling
//! - [`ServerInfo`]: cached per-host metadata
//! - [`wire`]: JSON shapes returned by the REST endpoints

mod filter;
mod resource;
mod server_info;
pub mod wire;

pub use filter::Filter;
pub use resource::{Resource, ResourceNode, ResourceType};
pub use server_info::{AuthenticationInfo, ServerInfo};
