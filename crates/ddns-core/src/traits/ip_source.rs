// # IP Source Trait
//
// Defines the interface for discovering the machine's current public IP.
//
// ## Implementations
//
// - HTTP lookup (ipify): `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("Public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP source implementations
///
/// The engine calls [`IpSource::current`] exactly once per run, before any
/// DNS work. The returned address is shared read-only by every upsert.
///
/// Any error returned here is fatal for the run: no DNS records are read or
/// written when the current IP is unknown.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current public IP address
    /// - `Err(Error)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
