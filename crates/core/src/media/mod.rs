//! Camera frames: from multipart bytes to displayable handles.
//!
//! ```text
//! ByteSource ──▶ FrameDemuxer ──▶ Frame ──▶ FramePublisher ──▶ DisplayHandle ──▶ FrameObserver
//!                (multipart)               (publisher)        (handle)
//! ```
//!
//! - [`multipart`]: boundary scanning and part extraction.
//! - [`frame`]: the [`Frame`] type and part-header parsing.
//! - [`handle`]: releasable [`DisplayHandle`]s backed by a [`HandleStore`].
//! - [`publisher`]: delivery to the display layer through a [`FrameObserver`].

pub mod frame;
pub mod handle;
pub mod multipart;
pub mod publisher;

pub use frame::{DEFAULT_MEDIA_TYPE, Frame, PartHeaders};
pub use handle::{DisplayHandle, HandleStore};
pub use multipart::{DemuxStats, FrameDemuxer, StreamEnd};
pub use publisher::{FnObserver, FrameObserver, FramePublisher};
