//! portprobe - concurrent TCP port probing
//!
//! Two kinds of checks share one dispatcher:
//! - address targets (`"localhost:8080"`, `"http://site.com"`) are probed
//!   with an outbound TCP connect bounded by a timeout;
//! - port targets (`5000`) are probed by binding the port on the local
//!   primary address, reporting whether someone else already holds it.
//!
//! ```no_run
//! use portprobe::{ProbeConfig, ProbeEngine, Target};
//!
//! # async fn run() -> portprobe::Result<()> {
//! let engine = ProbeEngine::new(ProbeConfig::default())?;
//! let results = engine
//!     .probe_many(&[Target::address("localhost:5432"), Target::port(8080)])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod scanner;
pub mod target;

// Re-export commonly used types
pub use config::ProbeConfig;
pub use error::{ProbeError, ProbeResult};
pub use network::{PortStatus, ProbeKind};
pub use scanner::{probe_many, probe_one, ProbeCallback, ProbeEngine, ProbeReport};
pub use target::{Endpoint, Target};

pub type Result<T> = std::result::Result<T, ProbeError>;
