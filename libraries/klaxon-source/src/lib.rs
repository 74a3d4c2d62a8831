//! Klaxon - Sound Source Resolution
//!
//! Materializes a configured sound location into a source the playback layer
//! can open.
//!
//! - `http`/`https` locations are fetched in full and kept in a temporary
//!   in-memory buffer ([`BufferRegistry`])
//! - bundled asset paths, `data:` and `builtin:` references are used directly
//! - resolving the location that was requested last is a no-op
//! - results of superseded requests are discarded, never applied
//!
//! # Example
//!
//! ```ignore
//! use klaxon_source::{AudioSourceResolver, HttpFetcher, Resolution};
//! use std::sync::Arc;
//!
//! let resolver = AudioSourceResolver::new(Arc::new(HttpFetcher::new()?));
//! match resolver.resolve("https://example.com/alarm.mp3").await? {
//!     Resolution::Ready(source) => println!("ready: {:?}", source.playable),
//!     Resolution::Unchanged | Resolution::Superseded => {}
//! }
//! ```

mod buffer;
mod error;
mod fetch;
mod location;
mod resolver;

pub use buffer::{BufferRegistry, BufferUrl};
pub use error::{Result, SourceError};
pub use fetch::{Fetcher, HttpFetcher};
pub use location::{SourceLocation, BUILTIN_SCHEME, DATA_SCHEME};
pub use resolver::{
    AudioSourceResolver, PlayableSource, ResolveRequest, ResolvedSource, Resolution,
};
