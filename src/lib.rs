//! LinkTracker - A client-side shortlink attribution and event tracking SDK
//!
//! This library detects app installs and opens originating from shortlinks,
//! attributes them through an ordered fallback chain (stored referrer,
//! platform attribution, advertising identifier, device fingerprinting),
//! and reports structured events to a remote collection endpoint.
//!
//! # Architecture
//! - `shortlink`: Shortlink classification and token extraction
//! - `attribution`: Install referrer resolution (ordered fallback chain)
//! - `events`: Event construction, enrichment and dispatch
//! - `network`: HTTP transport to the collection endpoints
//! - `storage`: Durable key/value persistence and the failed-event queue
//! - `session`: Orchestrator, deep link handling and host callbacks
//! - `device`: Device capability providers for enrichment and fingerprinting
//! - `config`: SDK configuration
//! - `system`: Logging initialization
//!
//! # Usage
//! The host builds one [`session::TrackingSession`] at its composition root
//! and passes the handle to every call site:
//!
//! ```no_run
//! use linktracker::{SdkConfig, SessionBuilder};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SdkConfig::new("project-id", "project-token", "tryinhouse.com")?;
//! let session = SessionBuilder::new(config)
//!     .with_callback(|tag, body| println!("{}: {}", tag, body))
//!     .initialize()?;
//!
//! session.handle_app_launch(None).await;
//! session.track_app_open(None).await;
//! # Ok(())
//! # }
//! ```

pub mod attribution;
pub mod config;
pub mod device;
pub mod errors;
pub mod events;
pub mod models;
pub mod network;
pub mod session;
pub mod shortlink;
pub mod storage;
pub mod system;

pub use config::SdkConfig;
pub use errors::{Result, TrackerError};
pub use models::{Event, InstallData};
pub use session::{SessionBuilder, SessionState, TrackingSession};
pub use shortlink::ShortLinkDetector;
