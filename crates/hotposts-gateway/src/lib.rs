pub mod client;
pub mod error;

pub use client::{GatewayClient, UpstreamResponse};
pub use error::GatewayError;
