// Frame bus - bounded, lossy fan-out of camera frames to independent consumers
//
// Every subscriber gets its own bounded queue. `put` never waits: when a
// subscriber's queue is full the new frame is dropped for that subscriber
// only, so a slow detector degrades to a lower frame rate instead of stalling
// the camera. Closing the bus lets consumers drain what is buffered and stop.

use crate::core::shutdown::ShutdownSignal;
use crate::models::capture::Frame;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

struct Slot {
    queue: Mutex<VecDeque<Arc<Frame>>>,
    ready: Notify,
    dropped: AtomicU64,
    closed: AtomicBool,
}

/// Counters for diagnosing a slow consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameBusStats {
    pub published: u64,
    pub dropped: u64,
}

pub struct FrameBus {
    capacity: usize,
    poll_interval: Duration,
    subscribers: RwLock<Vec<Arc<Slot>>>,
    published: AtomicU64,
    dropped: AtomicU64,
    closed: AtomicBool,
}

impl FrameBus {
    pub fn new(capacity: usize, poll_interval: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            poll_interval,
            subscribers: RwLock::new(Vec::new()),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a consumer. It only sees frames put after this call.
    pub fn subscribe(&self) -> FrameReceiver {
        let slot = Arc::new(Slot {
            queue: Mutex::new(VecDeque::with_capacity(self.capacity)),
            ready: Notify::new(),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(self.is_closed()),
        });
        self.subscribers.write().push(slot.clone());

        FrameReceiver {
            slot,
            poll_interval: self.poll_interval,
        }
    }

    /// Offer a frame to every subscriber without blocking. Returns how many
    /// subscribers accepted it.
    pub fn put(&self, frame: Frame) -> usize {
        if self.is_closed() {
            return 0;
        }
        let frame = Arc::new(frame);
        let mut accepted = 0;

        for slot in self.subscribers.read().iter() {
            let mut queue = slot.queue.lock();
            if queue.len() >= self.capacity {
                slot.dropped.fetch_add(1, Ordering::Relaxed);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            queue.push_back(frame.clone());
            drop(queue);

            slot.ready.notify_one();
            accepted += 1;
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        accepted
    }

    /// No more frames will be published. Buffered frames stay readable.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for slot in self.subscribers.read().iter() {
            slot.closed.store(true, Ordering::Release);
            slot.ready.notify_one();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn stats(&self) -> FrameBusStats {
        FrameBusStats {
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// One consumer's end of the bus
pub struct FrameReceiver {
    slot: Arc<Slot>,
    poll_interval: Duration,
}

impl FrameReceiver {
    /// Oldest buffered frame, if any
    pub fn try_take(&self) -> Option<Arc<Frame>> {
        self.slot.queue.lock().pop_front()
    }

    /// Wait for the next frame. Returns `None` once shutdown is observed, or
    /// once the bus is closed and this queue is drained.
    pub async fn next(&self, shutdown: &ShutdownSignal) -> Option<Arc<Frame>> {
        loop {
            if shutdown.is_triggered() {
                return None;
            }

            let ready = self.slot.ready.notified();
            if let Some(frame) = self.try_take() {
                return Some(frame);
            }
            if self.slot.closed.load(Ordering::Acquire) {
                // A put may have landed between the take and the flag
                return self.try_take();
            }

            tokio::select! {
                _ = ready => {}
                _ = shutdown.wait() => return None,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slot.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames this consumer missed because its queue was full
    pub fn dropped(&self) -> u64 {
        self.slot.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn bus(capacity: usize) -> FrameBus {
        FrameBus::new(capacity, Duration::from_millis(5))
    }

    #[test]
    fn test_put_drops_newest_when_full() {
        let bus = bus(5);
        let rx = bus.subscribe();

        for seq in 0..8 {
            bus.put(Frame::empty(seq));
        }

        assert_eq!(rx.len(), 5);
        assert_eq!(rx.dropped(), 3);
        assert_eq!(bus.stats(), FrameBusStats { published: 8, dropped: 3 });

        // Oldest frames survive, in order
        let order: Vec<u64> = std::iter::from_fn(|| rx.try_take()).map(|f| f.sequence).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert!(rx.try_take().is_none());
    }

    #[test]
    fn test_put_without_subscribers_never_blocks() {
        let bus = bus(1);
        let start = Instant::now();
        for seq in 0..10_000 {
            assert_eq!(bus.put(Frame::empty(seq)), 0);
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_every_subscriber_sees_each_frame() {
        let bus = bus(5);
        let motion = bus.subscribe();
        let gaze = bus.subscribe();

        assert_eq!(bus.put(Frame::empty(7)), 2);

        assert_eq!(motion.try_take().unwrap().sequence, 7);
        assert_eq!(gaze.try_take().unwrap().sequence, 7);
    }

    #[test]
    fn test_slow_subscriber_does_not_starve_fast_one() {
        let bus = bus(2);
        let slow = bus.subscribe();
        let fast = bus.subscribe();

        for seq in 0..4 {
            bus.put(Frame::empty(seq));
            assert_eq!(fast.try_take().unwrap().sequence, seq);
        }

        assert_eq!(slow.len(), 2);
        assert_eq!(slow.dropped(), 2);
        assert_eq!(fast.dropped(), 0);
    }

    #[tokio::test]
    async fn test_next_wakes_on_put() {
        let bus = Arc::new(FrameBus::new(5, Duration::from_secs(10)));
        let rx = bus.subscribe();
        let shutdown = ShutdownSignal::new();

        let producer = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.put(Frame::empty(42));
        });

        let frame = tokio::time::timeout(Duration::from_secs(1), rx.next(&shutdown))
            .await
            .expect("put should wake the receiver");
        assert_eq!(frame.unwrap().sequence, 42);
    }

    #[tokio::test]
    async fn test_next_returns_none_on_shutdown() {
        let bus = bus(5);
        let rx = bus.subscribe();
        let shutdown = ShutdownSignal::new();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let frame = tokio::time::timeout(Duration::from_secs(1), rx.next(&shutdown))
            .await
            .expect("shutdown should release the receiver");
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let bus = bus(5);
        let rx = bus.subscribe();
        let shutdown = ShutdownSignal::new();

        bus.put(Frame::empty(1));
        bus.close();
        assert_eq!(bus.put(Frame::empty(2)), 0);

        assert_eq!(rx.next(&shutdown).await.unwrap().sequence, 1);
        assert!(rx.next(&shutdown).await.is_none());
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_receiver() {
        let bus = Arc::new(FrameBus::new(5, Duration::from_secs(10)));
        let rx = bus.subscribe();
        let shutdown = ShutdownSignal::new();

        let closer = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            closer.close();
        });

        let frame = tokio::time::timeout(Duration::from_secs(1), rx.next(&shutdown))
            .await
            .expect("close should release the receiver");
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn test_next_prefers_shutdown_over_buffered_frames() {
        let bus = bus(5);
        let rx = bus.subscribe();
        let shutdown = ShutdownSignal::new();

        bus.put(Frame::empty(1));
        shutdown.trigger();

        assert!(rx.next(&shutdown).await.is_none());
        assert_eq!(rx.len(), 1);
    }
}
