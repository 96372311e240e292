//! Reusable working buffers for the live scan loop
//!
//! A live session grabs a full-resolution frame every tick. Holding on to the
//! frame and luma allocations between ticks keeps the loop from allocating
//! tens of megabytes per second on a 1080p+ feed.

/// Frame and luma scratch buffers owned by one live session
pub struct BufferPool {
    frame_buffer: Vec<u8>,
    luma_buffer: Vec<u8>,
    stats: AllocationStats,
}

impl BufferPool {
    /// Create a new pool sized for 1080p RGBA frames
    pub fn new() -> Self {
        Self::with_capacity(1920 * 1080)
    }

    /// Create a pool with room for `pixels` pixels before growing
    pub fn with_capacity(pixels: usize) -> Self {
        Self {
            frame_buffer: Vec::with_capacity(pixels * 4),
            luma_buffer: Vec::with_capacity(pixels),
            stats: AllocationStats::default(),
        }
    }

    /// Take the frame buffer out of the pool, emptied but with its capacity.
    ///
    /// Hand it back with [`BufferPool::restore_frame_buffer`] once the frame
    /// has been scanned.
    pub fn take_frame_buffer(&mut self) -> Vec<u8> {
        let mut buf = std::mem::take(&mut self.frame_buffer);
        buf.clear();
        buf
    }

    /// Return a frame buffer taken with [`BufferPool::take_frame_buffer`]
    pub fn restore_frame_buffer(&mut self, buf: Vec<u8>) {
        if buf.capacity() >= self.frame_buffer.capacity() {
            self.frame_buffer = buf;
        }
    }

    /// Note that a frame was read into the pooled buffer.
    ///
    /// `capacity_before` is the buffer capacity handed out by
    /// [`BufferPool::take_frame_buffer`]; growth past it counts as an allocation.
    pub fn record_frame(&mut self, capacity_before: usize, buf: &[u8]) {
        if buf.len() <= capacity_before {
            self.stats.record_frame_reuse(buf.len());
        } else {
            self.stats.record_frame_allocation();
        }
    }

    /// Scratch buffer for luma conversion
    pub fn luma_buffer(&mut self) -> &mut Vec<u8> {
        &mut self.luma_buffer
    }

    /// Current frame buffer capacity in bytes
    pub fn frame_capacity(&self) -> usize {
        self.frame_buffer.capacity()
    }

    /// Allocation counters
    pub fn stats(&self) -> &AllocationStats {
        &self.stats
    }

    /// Drop buffer contents (keeps capacity)
    pub fn clear(&mut self) {
        self.frame_buffer.clear();
        self.luma_buffer.clear();
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for monitoring allocation patterns
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AllocationStats {
    /// Frames that fit into the existing buffer
    pub frame_reuses: usize,
    /// Frames that forced the buffer to grow
    pub frame_allocations: usize,
    /// Bytes written without a fresh allocation
    pub total_bytes_reused: usize,
}

impl AllocationStats {
    fn record_frame_reuse(&mut self, bytes: usize) {
        self.frame_reuses += 1;
        self.total_bytes_reused += bytes;
    }

    fn record_frame_allocation(&mut self) {
        self.frame_allocations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_round_trip_keeps_capacity() {
        let mut pool = BufferPool::with_capacity(100);
        let before = pool.frame_capacity();
        assert!(before >= 400);

        let mut buf = pool.take_frame_buffer();
        let cap = buf.capacity();
        buf.resize(400, 7);
        pool.record_frame(cap, &buf);
        pool.restore_frame_buffer(buf);

        let buf = pool.take_frame_buffer();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= before);
        assert_eq!(pool.stats().frame_reuses, 1);
        assert_eq!(pool.stats().total_bytes_reused, 400);
    }

    #[test]
    fn test_growth_is_counted() {
        let mut pool = BufferPool::with_capacity(10);
        let mut buf = pool.take_frame_buffer();
        let cap = buf.capacity();
        buf.resize(1000, 0);
        pool.record_frame(cap, &buf);
        pool.restore_frame_buffer(buf);

        assert_eq!(pool.stats().frame_allocations, 1);
        assert!(pool.frame_capacity() >= 1000);
    }
}
