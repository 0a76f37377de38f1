//! Crosscast - one message, every platform
//!
//! This library renders an author's message for each social platform
//! (person-tag resolution, Unicode styling, limit-aware chunking, rich-text
//! facets) and publishes it as a reply-chained thread to Bluesky, Twitter,
//! and LinkedIn.

pub mod chunker;
pub mod composer;
pub mod config;
pub mod delay;
pub mod dispatcher;
pub mod error;
pub mod facets;
pub mod logging;
pub mod mentions;
pub mod platforms;
pub mod publisher;
pub mod styling;
pub mod types;

// Re-export commonly used types
pub use composer::compose;
pub use config::Config;
pub use dispatcher::{DispatchOutcome, DispatchReport, MultiPlatformDispatcher};
pub use error::{ConfigError, CrosscastError, PlatformError, Result};
pub use facets::{extract_facets, Facet, FacetFeature, HandleResolver};
pub use platforms::{create_platforms, Credentials, Platform};
pub use publisher::{ThreadOutcome, ThreadPublisher};
pub use types::{Chunk, Message, PersonDirectory, PersonMapping, PlatformKind, PostRef, PublishResult};
