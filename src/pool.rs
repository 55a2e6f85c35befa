//! Fixed packet-buffer arena and its ownership queues.
//!
//! The arena holds `N` buffers of `SIZE` bytes, allocated once and reused
//! forever. Every buffer is owned by exactly one of:
//!
//! ```text
//!   free ──acquire_free()──> in flight ──push_ready()──> ready
//!    ▲                          │                          │
//!    └──release_free_*()────────┘<────────pop_ready()──────┘
//!                               │                          ▲
//!                               └──hold_back()──> holdback ┘ restore_holdback()
//! ```
//!
//! Queues are doubly linked lists of arena indices, so insertion and removal
//! at either end are O(1) and need no allocation. A buffer that has been
//! removed from a queue is represented by a [`PacketHandle`], which cannot be
//! copied or cloned: putting it back into any queue consumes it.
//!
//! Conservation holds at every observation point:
//! `free + ready + holdback + in_flight == N`.

/// Identifies one of the pool's queues.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum QueueKind {
    /// Unused buffers available to ingestion.
    Free,
    /// Validated inbound packets awaiting correlation or dispatch.
    Ready,
    /// Unrelated packets set aside while a request waits.
    Holdback,
}

/// Exclusive ownership of one arena buffer while it sits outside every queue.
///
/// A handle is only valid for the pool that issued it. Passing it to another
/// pool, or returning it after [`PacketPool::reset`], is a logic error and may
/// panic.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a packet handle must be returned to a queue or the buffer leaks"]
pub struct PacketHandle {
    index: usize,
}

impl PacketHandle {
    /// Position of the buffer in the arena.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A fixed-capacity byte buffer tagged with the number of valid bytes.
#[derive(Debug)]
pub struct PacketBuffer<const SIZE: usize> {
    data: [u8; SIZE],
    len: usize,
}

impl<const SIZE: usize> PacketBuffer<SIZE> {
    const fn new() -> Self {
        Self {
            data: [0; SIZE],
            len: 0,
        }
    }

    /// The valid bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of valid bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whole backing storage, for the bus to fill.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Marks the first `len` bytes as valid, clamped to the capacity.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(SIZE);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
struct IndexQueue {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl IndexQueue {
    fn insert_head(&mut self, links: &mut [Link], idx: usize) {
        links[idx] = Link {
            prev: None,
            next: self.head,
        };
        match self.head {
            Some(h) => links[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
    }

    fn insert_tail(&mut self, links: &mut [Link], idx: usize) {
        links[idx] = Link {
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(t) => links[t].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    fn remove_head(&mut self, links: &mut [Link]) -> Option<usize> {
        let idx = self.head?;
        self.head = links[idx].next;
        match self.head {
            Some(h) => links[h].prev = None,
            None => self.tail = None,
        }
        links[idx] = Link::default();
        self.len -= 1;
        Some(idx)
    }

    fn remove_tail(&mut self, links: &mut [Link]) -> Option<usize> {
        let idx = self.tail?;
        self.tail = links[idx].prev;
        match self.tail {
            Some(t) => links[t].next = None,
            None => self.head = None,
        }
        links[idx] = Link::default();
        self.len -= 1;
        Some(idx)
    }
}

/// The buffer arena plus its free, ready and holdback queues.
#[derive(Debug)]
pub struct PacketPool<const N: usize, const SIZE: usize> {
    buffers: [PacketBuffer<SIZE>; N],
    links: [Link; N],
    free: IndexQueue,
    ready: IndexQueue,
    holdback: IndexQueue,
    in_flight: usize,
}

impl<const N: usize, const SIZE: usize> Default for PacketPool<N, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const SIZE: usize> PacketPool<N, SIZE> {
    /// Creates the arena with all `N` buffers in the free pool, in index order.
    pub fn new() -> Self {
        let mut pool = Self {
            buffers: [const { PacketBuffer::new() }; N],
            links: [Link::default(); N],
            free: IndexQueue::default(),
            ready: IndexQueue::default(),
            holdback: IndexQueue::default(),
            in_flight: 0,
        };
        pool.reset();
        pool
    }

    /// Returns every buffer to the free pool, discarding queued packets.
    ///
    /// Handles obtained before the reset must not be returned afterwards.
    pub fn reset(&mut self) {
        self.free = IndexQueue::default();
        self.ready = IndexQueue::default();
        self.holdback = IndexQueue::default();
        self.in_flight = 0;
        for idx in 0..N {
            self.buffers[idx].set_len(0);
            self.free.insert_tail(&mut self.links, idx);
        }
    }

    /// Total number of buffers in the arena.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of buffers currently in `kind`.
    pub fn len(&self, kind: QueueKind) -> usize {
        match kind {
            QueueKind::Free => self.free.len,
            QueueKind::Ready => self.ready.len,
            QueueKind::Holdback => self.holdback.len,
        }
    }

    /// Whether `kind` holds no buffers.
    pub fn is_empty(&self, kind: QueueKind) -> bool {
        self.len(kind) == 0
    }

    /// Number of buffers outside every queue.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Removes one buffer from the head of the free pool; `None` when the pool is empty.
    pub fn acquire_free(&mut self) -> Option<PacketHandle> {
        self.remove_head(QueueKind::Free)
    }

    /// Returns a buffer to the head of the free pool, for immediate reuse.
    pub fn release_free_head(&mut self, handle: PacketHandle) {
        self.insert_head(QueueKind::Free, handle);
    }

    /// Returns a buffer to the tail of the free pool.
    pub fn release_free_tail(&mut self, handle: PacketHandle) {
        self.insert_tail(QueueKind::Free, handle);
    }

    /// Appends a validated packet to the ready queue, preserving arrival order.
    pub fn push_ready(&mut self, handle: PacketHandle) {
        self.insert_tail(QueueKind::Ready, handle);
    }

    /// Removes the oldest packet from the ready queue.
    pub fn pop_ready(&mut self) -> Option<PacketHandle> {
        self.remove_head(QueueKind::Ready)
    }

    /// Sets an unrelated packet aside at the tail of the holdback queue.
    pub fn hold_back(&mut self, handle: PacketHandle) {
        self.insert_tail(QueueKind::Holdback, handle);
    }

    /// Moves the whole holdback queue onto the head of the ready queue.
    ///
    /// Held packets end up ahead of anything that arrived meanwhile, in their
    /// original relative order. Returns the number of packets moved.
    pub fn restore_holdback(&mut self) -> usize {
        let mut moved = 0;
        while let Some(idx) = self.holdback.remove_tail(&mut self.links) {
            self.ready.insert_head(&mut self.links, idx);
            moved += 1;
        }
        self.check_conservation();
        moved
    }

    /// Moves the oldest ready packets to the free pool tail until at least
    /// `threshold` buffers are free or the ready queue is empty.
    ///
    /// Returns the number of packets dropped.
    pub fn reclaim_ready(&mut self, threshold: usize) -> usize {
        let mut dropped = 0;
        while self.free.len < threshold {
            match self.ready.remove_head(&mut self.links) {
                Some(idx) => self.free.insert_tail(&mut self.links, idx),
                None => break,
            }
            dropped += 1;
        }
        self.check_conservation();
        dropped
    }

    fn insert_head(&mut self, kind: QueueKind, handle: PacketHandle) {
        let (queue, links) = self.parts(kind);
        queue.insert_head(links, handle.index);
        self.in_flight -= 1;
        self.check_conservation();
    }

    fn insert_tail(&mut self, kind: QueueKind, handle: PacketHandle) {
        let (queue, links) = self.parts(kind);
        queue.insert_tail(links, handle.index);
        self.in_flight -= 1;
        self.check_conservation();
    }

    fn remove_head(&mut self, kind: QueueKind) -> Option<PacketHandle> {
        let (queue, links) = self.parts(kind);
        let index = queue.remove_head(links)?;
        self.in_flight += 1;
        self.check_conservation();
        Some(PacketHandle { index })
    }

    /// The buffer behind `handle`.
    pub fn buffer(&self, handle: &PacketHandle) -> &PacketBuffer<SIZE> {
        &self.buffers[handle.index]
    }

    /// The buffer behind `handle`, for filling.
    pub fn buffer_mut(&mut self, handle: &PacketHandle) -> &mut PacketBuffer<SIZE> {
        &mut self.buffers[handle.index]
    }

    /// Bytes of the oldest ready packet, without removing it.
    pub fn peek_ready(&self) -> Option<&[u8]> {
        self.ready.head.map(|idx| self.buffers[idx].bytes())
    }

    fn parts(&mut self, kind: QueueKind) -> (&mut IndexQueue, &mut [Link]) {
        let queue = match kind {
            QueueKind::Free => &mut self.free,
            QueueKind::Ready => &mut self.ready,
            QueueKind::Holdback => &mut self.holdback,
        };
        (queue, &mut self.links)
    }

    fn check_conservation(&self) {
        debug_assert_eq!(
            self.free.len + self.ready.len + self.holdback.len + self.in_flight,
            N
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(pool: &mut PacketPool<5, 8>, byte: u8) -> PacketHandle {
        let handle = pool.acquire_free().unwrap();
        let buf = pool.buffer_mut(&handle);
        buf.storage_mut()[0] = byte;
        buf.set_len(1);
        handle
    }

    fn ready_bytes(pool: &mut PacketPool<5, 8>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(handle) = pool.pop_ready() {
            out.push(pool.buffer(&handle).bytes()[0]);
            pool.release_free_tail(handle);
        }
        out
    }

    fn total(pool: &PacketPool<5, 8>) -> usize {
        pool.len(QueueKind::Free)
            + pool.len(QueueKind::Ready)
            + pool.len(QueueKind::Holdback)
            + pool.in_flight()
    }

    #[test]
    fn test_pool_initialization() {
        let pool: PacketPool<5, 8> = PacketPool::new();
        assert_eq!(pool.capacity(), 5);
        assert_eq!(pool.len(QueueKind::Free), 5);
        assert!(pool.is_empty(QueueKind::Ready));
        assert!(pool.is_empty(QueueKind::Holdback));
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn test_acquire_until_empty() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        let mut handles = Vec::new();
        while let Some(handle) = pool.acquire_free() {
            handles.push(handle);
        }
        assert_eq!(handles.len(), 5);
        assert_eq!(handles[0].index(), 0);
        assert_eq!(handles[4].index(), 4);
        assert_eq!(pool.in_flight(), 5);
        assert!(pool.acquire_free().is_none());
        for handle in handles {
            pool.release_free_tail(handle);
        }
        assert_eq!(pool.len(QueueKind::Free), 5);
        assert_eq!(total(&pool), 5);
    }

    #[test]
    fn test_release_to_head_is_reused_first() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        let first = pool.acquire_free().unwrap();
        let second = pool.acquire_free().unwrap();
        let index = second.index();
        pool.release_free_tail(first);
        pool.release_free_head(second);
        assert_eq!(pool.acquire_free().unwrap().index(), index);
    }

    #[test]
    fn test_ready_queue_is_fifo() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        for byte in [1, 2, 3] {
            let handle = fill(&mut pool, byte);
            pool.push_ready(handle);
        }
        assert_eq!(pool.peek_ready(), Some(&[1u8][..]));
        assert_eq!(ready_bytes(&mut pool), [1u8, 2, 3]);
        assert_eq!(total(&pool), 5);
    }

    #[test]
    fn test_restore_holdback_goes_ahead_of_newer_arrivals() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        for byte in [1, 2, 3] {
            let handle = fill(&mut pool, byte);
            pool.push_ready(handle);
        }
        // A waiting request sets the first two aside.
        for _ in 0..2 {
            let handle = pool.pop_ready().unwrap();
            pool.hold_back(handle);
        }
        let late = fill(&mut pool, 4);
        pool.push_ready(late);
        assert_eq!(pool.len(QueueKind::Holdback), 2);
        assert_eq!(total(&pool), 5);

        assert_eq!(pool.restore_holdback(), 2);
        assert!(pool.is_empty(QueueKind::Holdback));
        assert_eq!(ready_bytes(&mut pool), [1u8, 2, 3, 4]);
    }

    #[test]
    fn test_reclaim_drops_oldest_until_threshold() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        for byte in [1, 2, 3, 4, 5] {
            let handle = fill(&mut pool, byte);
            pool.push_ready(handle);
        }
        assert_eq!(pool.len(QueueKind::Free), 0);
        assert_eq!(pool.reclaim_ready(2), 2);
        assert_eq!(pool.len(QueueKind::Free), 2);
        assert_eq!(ready_bytes(&mut pool), [3u8, 4, 5]);
    }

    #[test]
    fn test_reclaim_stops_when_ready_is_empty() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        let held: Vec<_> = (0..5).map(|_| pool.acquire_free().unwrap()).collect();
        assert_eq!(pool.reclaim_ready(2), 0);
        for handle in held {
            pool.release_free_head(handle);
        }
        assert_eq!(total(&pool), 5);
    }

    #[test]
    fn test_named_moves_only_touch_their_queue() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        let first = fill(&mut pool, 1);
        let second = fill(&mut pool, 2);
        pool.hold_back(first);
        pool.insert_head(QueueKind::Holdback, second);
        assert_eq!(pool.len(QueueKind::Holdback), 2);
        assert!(pool.is_empty(QueueKind::Ready));

        let head = pool.remove_head(QueueKind::Holdback).unwrap();
        assert_eq!(pool.buffer(&head).bytes(), &[2]);
        pool.release_free_tail(head);
        assert_eq!(pool.restore_holdback(), 1);
        assert_eq!(ready_bytes(&mut pool), [1u8]);
        assert_eq!(total(&pool), 5);
    }

    #[test]
    fn test_set_len_clamps_to_capacity() {
        let mut pool: PacketPool<1, 4> = PacketPool::new();
        let handle = pool.acquire_free().unwrap();
        pool.buffer_mut(&handle).set_len(10);
        assert_eq!(pool.buffer(&handle).len(), 4);
        pool.release_free_head(handle);
    }

    #[test]
    fn test_reset_returns_everything_to_free() {
        let mut pool: PacketPool<5, 8> = PacketPool::new();
        let handle = fill(&mut pool, 9);
        pool.push_ready(handle);
        pool.reset();
        assert_eq!(pool.len(QueueKind::Free), 5);
        assert!(pool.is_empty(QueueKind::Ready));
        assert_eq!(pool.in_flight(), 0);
    }
}
