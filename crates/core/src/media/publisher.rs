use std::sync::mpsc::Sender;

use crate::error::{Result, TeleopError};
use crate::media::frame::Frame;
use crate::media::handle::{DisplayHandle, HandleStore};

/// Receiver of published frames (the display layer).
///
/// Called once per frame, in publication order, on the camera thread.
/// Implementations must hand the handle off quickly; anything slow belongs
/// on the other side of a channel.
pub trait FrameObserver: Send {
    /// Take ownership of a new handle. The observer is responsible for
    /// dropping superseded handles.
    fn on_frame(&mut self, handle: DisplayHandle) -> Result<()>;
}

/// Deliver handles over an unbounded channel.
///
/// Fails with [`TeleopError::ObserverGone`] once the receiver is dropped.
impl FrameObserver for Sender<DisplayHandle> {
    fn on_frame(&mut self, handle: DisplayHandle) -> Result<()> {
        self.send(handle).map_err(|_| TeleopError::ObserverGone)
    }
}

/// Adapts a closure into a [`FrameObserver`].
pub struct FnObserver<F>(pub F);

impl<F> FrameObserver for FnObserver<F>
where
    F: FnMut(DisplayHandle) + Send,
{
    fn on_frame(&mut self, handle: DisplayHandle) -> Result<()> {
        (self.0)(handle);
        Ok(())
    }
}

/// Turns finalized frames into display handles and notifies one observer.
///
/// The publisher keeps no reference to a handle after delivery; the
/// [`HandleStore`] tracks what is still outstanding.
pub struct FramePublisher {
    store: HandleStore,
    observer: Box<dyn FrameObserver>,
    published: u64,
}

impl FramePublisher {
    pub fn new(store: HandleStore, observer: Box<dyn FrameObserver>) -> Self {
        Self {
            store,
            observer,
            published: 0,
        }
    }

    /// Publish `frame` as `media_type`, falling back to the frame's own
    /// content type and then `image/jpeg`.
    pub fn publish(&mut self, frame: Frame, media_type: Option<&str>) -> Result<()> {
        let media_type = media_type.unwrap_or(frame.media_type()).to_string();
        let handle = self.store.issue(frame, &media_type);
        self.observer.on_frame(handle)?;
        self.published += 1;
        Ok(())
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn store(&self) -> &HandleStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn frame(seq: u64, content_type: Option<&str>) -> Frame {
        Frame {
            seq,
            content_type: content_type.map(str::to_string),
            data: vec![seq as u8; 4],
        }
    }

    #[test]
    fn delivers_in_order_over_channel() {
        let (tx, rx) = mpsc::channel();
        let store = HandleStore::new("T");
        let mut publisher = FramePublisher::new(store.clone(), Box::new(tx));

        for seq in 1..=3 {
            publisher.publish(frame(seq, None), None).unwrap();
        }

        let seqs: Vec<u64> = rx.try_iter().map(|h| h.seq()).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(publisher.published(), 3);
        // Handles were dropped by the collect above.
        assert_eq!(store.outstanding(), 0);
    }

    #[test]
    fn media_type_precedence() {
        let (tx, rx) = mpsc::channel();
        let mut publisher = FramePublisher::new(HandleStore::new("T"), Box::new(tx));

        publisher.publish(frame(1, Some("image/png")), None).unwrap();
        publisher.publish(frame(2, Some("image/png")), Some("image/webp")).unwrap();
        publisher.publish(frame(3, None), None).unwrap();

        let types: Vec<Option<String>> = rx.try_iter().map(|h| h.media_type()).collect();
        assert_eq!(
            types,
            vec![
                Some("image/png".to_string()),
                Some("image/webp".to_string()),
                Some("image/jpeg".to_string()),
            ]
        );
    }

    #[test]
    fn stale_handles_stay_until_observer_drops_them() {
        let store = HandleStore::new("T");
        let mut current: Option<DisplayHandle> = None;
        let mut publisher = FramePublisher::new(
            store.clone(),
            Box::new(FnObserver(move |handle| {
                current.replace(handle);
            })),
        );

        publisher.publish(frame(1, None), None).unwrap();
        publisher.publish(frame(2, None), None).unwrap();
        // The observer kept only the newest handle.
        assert_eq!(store.outstanding(), 1);
    }

    #[test]
    fn hung_up_observer_is_an_error() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let store = HandleStore::new("T");
        let mut publisher = FramePublisher::new(store.clone(), Box::new(tx));
        assert!(matches!(
            publisher.publish(frame(1, None), None),
            Err(TeleopError::ObserverGone)
        ));
        assert_eq!(store.outstanding(), 0);
    }
}
