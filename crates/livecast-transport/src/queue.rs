//! Blocking FIFO of packets between producers and the writer thread.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::packet::RtmpPacket;

struct QueueInner {
    packets: VecDeque<RtmpPacket>,
    closed: bool,
}

/// Unbounded blocking packet queue.
///
/// Strictly FIFO; the producer is responsible for enqueueing sequence
/// headers ahead of media. Created open, closed by `close()` during
/// teardown and reopened by `open()` when a new session starts.
pub struct PacketQueue {
    inner: Mutex<QueueInner>,
    available: Condvar,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                packets: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Push a packet and wake one waiting consumer.
    ///
    /// Returns false (dropping the packet) when the queue is closed.
    pub fn enqueue(&self, packet: RtmpPacket) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            warn!(
                packet_type = ?packet.packet_type,
                len = packet.len(),
                "dropping packet enqueued on closed queue"
            );
            return false;
        }
        inner.packets.push_back(packet);
        self.available.notify_one();
        true
    }

    /// Pop the head, blocking while the queue is open and empty.
    ///
    /// Returns `None` once the queue has been closed and drained.
    pub fn dequeue_blocking(&self) -> Option<RtmpPacket> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(packet) = inner.packets.pop_front() {
                return Some(packet);
            }
            if inner.closed {
                return None;
            }
            self.available.wait(&mut inner);
        }
    }

    /// Mark the queue closed and wake every waiter.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        self.available.notify_all();
    }

    /// Reopen a closed queue for a new session.
    pub fn open(&self) {
        self.inner.lock().closed = false;
    }

    /// Drop every queued packet.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.packets.len();
        inner.packets.clear();
        if dropped > 0 {
            debug!(dropped, "cleared packet queue");
        }
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.inner.lock().packets.len()
    }

    /// True when no packets are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::packet::PacketType;

    fn packet(tag: u8) -> RtmpPacket {
        RtmpPacket::new(
            Bytes::copy_from_slice(&[tag]),
            PacketType::Video,
            0,
            0x04,
        )
    }

    #[test]
    fn test_fifo_order() {
        let queue = PacketQueue::new();
        queue.enqueue(packet(1));
        queue.enqueue(packet(2));
        queue.enqueue(packet(3));

        assert_eq!(queue.dequeue_blocking().unwrap().body[0], 1);
        assert_eq!(queue.dequeue_blocking().unwrap().body[0], 2);
        assert_eq!(queue.dequeue_blocking().unwrap().body[0], 3);
    }

    #[test]
    fn test_dequeue_blocks_until_enqueue() {
        let queue = Arc::new(PacketQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue_blocking())
        };

        thread::sleep(Duration::from_millis(50));
        queue.enqueue(packet(7));

        let received = consumer.join().unwrap().unwrap();
        assert_eq!(received.body[0], 7);
    }

    #[test]
    fn test_close_wakes_waiters_with_none() {
        let queue = Arc::new(PacketQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue_blocking())
        };

        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert!(consumer.join().unwrap().is_none());
    }

    #[test]
    fn test_close_drains_before_none() {
        let queue = PacketQueue::new();
        queue.enqueue(packet(1));
        queue.close();

        // A queued packet is still delivered after close.
        assert!(queue.dequeue_blocking().is_some());
        assert!(queue.dequeue_blocking().is_none());
    }

    #[test]
    fn test_enqueue_on_closed_queue_drops() {
        let queue = PacketQueue::new();
        queue.close();
        assert!(!queue.enqueue(packet(1)));
        assert!(queue.is_empty());

        queue.open();
        assert!(queue.enqueue(packet(2)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_empties_queue() {
        let queue = PacketQueue::new();
        queue.enqueue(packet(1));
        queue.enqueue(packet(2));
        queue.clear();
        assert!(queue.is_empty());
    }
}
