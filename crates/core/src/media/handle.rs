//! Releasable references to published frames.
//!
//! A [`DisplayHandle`] is what the display layer holds on to: a short URI
//! that resolves to the frame bytes through the [`HandleStore`] that issued
//! it, much like a browser object URL. The store owns the bytes; releasing
//! the handle (explicitly or by dropping it) revokes the URI and frees them.
//!
//! ## Lifecycle
//!
//! ```text
//! publish      -> issued (resolvable)
//! superseded   -> UI drops/releases old handle -> revoked
//! teardown     -> HandleStore::release_all     -> every handle revoked
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::media::frame::Frame;

/// URI scheme prefix of issued handles.
pub const HANDLE_SCHEME: &str = "frame:";

struct Entry {
    media_type: String,
    bytes: Arc<[u8]>,
}

struct StoreInner {
    tag: String,
    next_id: AtomicU64,
    entries: RwLock<HashMap<String, Entry>>,
}

/// Thread-safe registry of live display handles for one camera session.
///
/// Cloning is cheap and every clone refers to the same registry.
#[derive(Clone)]
pub struct HandleStore {
    inner: Arc<StoreInner>,
}

impl HandleStore {
    /// Create a store whose URIs are namespaced by `tag`.
    pub fn new(tag: &str) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tag: tag.to_string(),
                next_id: AtomicU64::new(0),
                entries: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a store with a random 32-bit tag.
    pub fn with_random_tag() -> Self {
        Self::new(&format!("{:08X}", rand::random::<u32>()))
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Register `frame` and return the handle that owns its registration.
    pub fn issue(&self, frame: Frame, media_type: &str) -> DisplayHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let uri = format!("{}{}/{:016X}", HANDLE_SCHEME, self.inner.tag, id);
        let bytes: Arc<[u8]> = frame.data.into();

        self.inner.entries.write().insert(
            uri.clone(),
            Entry {
                media_type: media_type.to_string(),
                bytes,
            },
        );

        tracing::trace!(uri = %uri, seq = frame.seq, "display handle issued");

        DisplayHandle {
            uri,
            seq: frame.seq,
            store: self.clone(),
        }
    }

    /// Look up the bytes behind a URI, if it has not been released.
    pub fn resolve(&self, uri: &str) -> Option<Arc<[u8]>> {
        self.inner
            .entries
            .read()
            .get(uri)
            .map(|entry| entry.bytes.clone())
    }

    /// Revoke a URI. Returns whether it was still live.
    pub fn release(&self, uri: &str) -> bool {
        let removed = self.inner.entries.write().remove(uri).is_some();
        if removed {
            tracing::trace!(uri, "display handle released");
        }
        removed
    }

    /// Revoke every outstanding URI (session teardown).
    pub fn release_all(&self) -> usize {
        let mut entries = self.inner.entries.write();
        let released = entries.len();
        entries.clear();
        if released > 0 {
            tracing::debug!(tag = %self.inner.tag, released, "released outstanding display handles");
        }
        released
    }

    /// Number of handles issued and not yet released.
    pub fn outstanding(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Total bytes held by outstanding handles.
    pub fn outstanding_bytes(&self) -> usize {
        self.inner
            .entries
            .read()
            .values()
            .map(|entry| entry.bytes.len())
            .sum()
    }

    fn media_type(&self, uri: &str) -> Option<String> {
        self.inner
            .entries
            .read()
            .get(uri)
            .map(|entry| entry.media_type.clone())
    }
}

impl fmt::Debug for HandleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleStore")
            .field("tag", &self.inner.tag)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// An opaque, releasable reference to one published frame.
///
/// Dropping the handle releases it. Hold on to the current handle for as
/// long as its frame is on screen and drop it once a newer one replaces it.
pub struct DisplayHandle {
    uri: String,
    seq: u64,
    store: HandleStore,
}

impl DisplayHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Sequence number of the frame within its stream.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The frame bytes, or `None` once the handle has been revoked by a
    /// session teardown.
    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        self.store.resolve(&self.uri)
    }

    pub fn media_type(&self) -> Option<String> {
        self.store.media_type(&self.uri)
    }

    pub fn is_live(&self) -> bool {
        self.bytes().is_some()
    }

    /// Release explicitly. Equivalent to dropping the handle.
    pub fn release(self) {}
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        self.store.release(&self.uri);
    }
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayHandle")
            .field("uri", &self.uri)
            .field("seq", &self.seq)
            .finish()
    }
}
