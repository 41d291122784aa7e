// # Aircraft Feed Trait
//
// Defines the interface for fetching the current aircraft list.
//
// ## Implementations
//
// - Virtual Radar Server: `godar-feed-vrs` crate
//
// ## Usage
//
// ```rust,ignore
// use godar_core::AircraftFeed;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let feed = /* AircraftFeed implementation */;
//
//     let list = feed.fetch().await?;
//     println!("{} aircraft", list.aircraft.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::aircraft::AircraftList;
use crate::config::GodarConfig;

/// Trait for aircraft feed implementations
///
/// A feed owns everything about talking to the remote server: authentication,
/// session handling, filter parameters and decoding. The monitor only sees a
/// decoded [`AircraftList`] or an error.
///
/// # Contract
///
/// - One call to `fetch()` is one poll. Implementations may retry
///   internally (session expiry, transient failures) but must eventually
///   return.
/// - Errors are returned, never swallowed: a failed fetch aborts the current
///   poll cycle and nothing else.
/// - Implementations must not touch tracking state or send notifications.
#[async_trait]
pub trait AircraftFeed: Send + Sync {
    /// Fetch the current aircraft list
    ///
    /// # Returns
    ///
    /// - `Ok(AircraftList)`: The decoded list for this poll
    /// - `Err(Error)`: Transport, authentication, HTTP or decode failure
    async fn fetch(&self) -> Result<AircraftList, crate::Error>;

    /// Name of the feed implementation (for logging)
    fn feed_name(&self) -> &'static str;
}

/// Helper trait for constructing feeds from configuration
pub trait AircraftFeedFactory: Send + Sync {
    /// Create an AircraftFeed instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: The full godar configuration (server, filters, location)
    ///
    /// # Returns
    ///
    /// A boxed AircraftFeed trait object
    fn create(&self, config: &GodarConfig) -> Result<Box<dyn AircraftFeed>, crate::Error>;
}
