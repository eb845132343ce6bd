//! HTTP client for the edge gateway.

pub mod client;

pub use client::{GatewayClient, ProxiedResponse, SdkError};
