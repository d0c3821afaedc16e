//! Depth-1 latest-frame cell with per-consumer freshness cursors.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::device::Frame;

struct Slot {
    frame: Option<Frame>,
    /// Publish counter. A tap whose cursor trails this has a fresh frame.
    seq: u64,
    /// Latest publish not yet taken by any tap.
    untaken: bool,
}

/// Single-slot frame store written by the capture loop.
///
/// Deliberately depth 1, never a queue: consumers see the most recent
/// frame or nothing. Each consumer reads through its own [`FrameTap`],
/// so one publish fans out to every tap and a slow reader cannot starve
/// a fast one.
pub struct FrameBuffer {
    slot: Mutex<Slot>,
    fresh: Notify,
}

impl FrameBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot {
                frame: None,
                seq: 0,
                untaken: false,
            }),
            fresh: Notify::new(),
        })
    }

    /// Overwrite the slot and wake every waiting tap.
    pub fn publish(&self, frame: Frame) {
        {
            let mut slot = self.slot.lock().unwrap();
            slot.frame = Some(frame);
            slot.seq += 1;
            slot.untaken = true;
        }
        self.fresh.notify_waiters();
    }

    /// True while the latest publish has been taken by no tap. The
    /// capture loop skips capture while this holds.
    pub fn pending(&self) -> bool {
        self.slot.lock().unwrap().untaken
    }

    /// Register a new consumer cursor. Only publishes after this call
    /// are fresh for the returned tap.
    pub fn tap(self: &Arc<Self>) -> FrameTap {
        let seen = self.slot.lock().unwrap().seq;
        FrameTap {
            buffer: Arc::clone(self),
            seen,
        }
    }
}

/// One consumer's view of the frame buffer.
pub struct FrameTap {
    buffer: Arc<FrameBuffer>,
    seen: u64,
}

impl FrameTap {
    /// Take the latest frame if this tap has not seen it yet.
    pub fn take_if_fresh(&mut self) -> Option<Frame> {
        let mut slot = self.buffer.slot.lock().unwrap();
        if slot.seq == self.seen {
            return None;
        }
        self.seen = slot.seq;
        slot.untaken = false;
        slot.frame.clone()
    }

    /// Suspend until a frame this tap has not seen is available, then
    /// take it.
    ///
    /// The `Notified` future is created before the freshness check, so a
    /// publish racing with the check still wakes this tap.
    pub async fn next(&mut self) -> Frame {
        let buffer = Arc::clone(&self.buffer);
        loop {
            let notified = buffer.fresh.notified();
            if let Some(frame) = self.take_if_fresh() {
                return frame;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{FrameMetadata, PixelFormat};
    use bytes::Bytes;
    use std::time::Instant;

    fn test_frame(sequence: u64) -> Frame {
        Frame {
            data: Bytes::from_static(&[0u8; 12]),
            meta: Arc::new(FrameMetadata {
                sequence,
                width: 2,
                height: 2,
                format: PixelFormat::Rgb24,
            }),
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn take_requires_publish_between_returns() {
        let buffer = FrameBuffer::new();
        let mut tap = buffer.tap();

        assert!(tap.take_if_fresh().is_none());

        buffer.publish(test_frame(1));
        assert!(tap.take_if_fresh().is_some());
        assert!(tap.take_if_fresh().is_none());

        buffer.publish(test_frame(2));
        assert!(tap.take_if_fresh().is_some());
    }

    #[test]
    fn pending_clears_on_first_take() {
        let buffer = FrameBuffer::new();
        let mut a = buffer.tap();
        let mut b = buffer.tap();

        assert!(!buffer.pending());
        buffer.publish(test_frame(1));
        assert!(buffer.pending());

        assert!(a.take_if_fresh().is_some());
        assert!(!buffer.pending());

        // The second tap still sees the frame as fresh for itself.
        assert!(b.take_if_fresh().is_some());
    }

    #[test]
    fn slow_consumer_sees_latest_only() {
        let buffer = FrameBuffer::new();
        let mut tap = buffer.tap();

        for seq in 1..=3 {
            buffer.publish(test_frame(seq));
        }

        let frame = tap.take_if_fresh().expect("fresh frame");
        assert_eq!(frame.meta.sequence, 3);
        assert!(tap.take_if_fresh().is_none(), "no backlog behind the slot");
    }

    #[test]
    fn new_tap_ignores_prior_publishes() {
        let buffer = FrameBuffer::new();
        buffer.publish(test_frame(1));

        let mut tap = buffer.tap();
        assert!(tap.take_if_fresh().is_none());

        buffer.publish(test_frame(2));
        assert_eq!(tap.take_if_fresh().unwrap().meta.sequence, 2);
    }

    #[tokio::test]
    async fn next_wakes_on_publish() {
        let buffer = FrameBuffer::new();
        let mut tap = buffer.tap();

        let publisher = {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                buffer.publish(test_frame(7));
            })
        };

        let frame = tap.next().await;
        assert_eq!(frame.meta.sequence, 7);
        publisher.await.unwrap();
    }
}
