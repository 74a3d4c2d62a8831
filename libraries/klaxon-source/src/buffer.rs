//! Temporary in-memory buffers for fetched sounds.
//!
//! A fetched sound is registered here and handed to the playback layer under a
//! locally addressable `buffer:<id>` reference. The reference stays valid until
//! it is revoked; the resolver revokes it as soon as a newer source supersedes it
//! or when it is torn down.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Locally addressable reference to a registered buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferUrl(Uuid);

impl BufferUrl {
    /// Parse a `buffer:<uuid>` reference.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.strip_prefix("buffer:")
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(BufferUrl)
    }
}

impl fmt::Display for BufferUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer:{}", self.0)
    }
}

/// Shared table of live buffers. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct BufferRegistry {
    buffers: Arc<Mutex<HashMap<BufferUrl, Bytes>>>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return the reference under which they are reachable.
    pub fn register(&self, bytes: Bytes) -> BufferUrl {
        let url = BufferUrl(Uuid::new_v4());
        debug!(buffer = %url, size = bytes.len(), "Registered audio buffer");
        self.buffers.lock().insert(url.clone(), bytes);
        url
    }

    /// Look up a live buffer.
    pub fn get(&self, url: &BufferUrl) -> Option<Bytes> {
        self.buffers.lock().get(url).cloned()
    }

    /// Release a buffer. Returns `false` if it was already released.
    pub fn revoke(&self, url: &BufferUrl) -> bool {
        let removed = self.buffers.lock().remove(url).is_some();
        if removed {
            debug!(buffer = %url, "Revoked audio buffer");
        }
        removed
    }

    /// Number of buffers that have not been revoked yet.
    pub fn live_count(&self) -> usize {
        self.buffers.lock().len()
    }
}
