//! Receive buffer: ring buffer of decoded [`Duration`] edges plus the
//! pending-pulse/pending-space lazy-coalescing discipline shared by the
//! decoder.
//!
//! Grounded in `receive.h` (`struct rbuf`, `RBUF_SIZE`) and `receive.c`'s
//! `clear_rec_buffer`/`rec_buffer_rewind`/`rec_buffer_clear`.

use crate::duration::{Duration, Edge};

/// Matches the original's fixed `RBUF_SIZE` ring buffer capacity.
pub const RING_CAPACITY: usize = 2560;

/// A ring-buffered stream of decoded edges, read by the decoder one
/// [`Duration`] at a time via [`ReceiveBuffer::next`], with
/// [`ReceiveBuffer::rewind`] letting the decoder retry a partial match
/// from the start of the current frame.
#[derive(Debug)]
pub struct ReceiveBuffer {
    ring: Vec<Duration>,
    head: usize,
    tail: usize,
    rewind_mark: usize,
    pending_pulse: u32,
    pending_space: u32,
    is_biphase: bool,
    at_eof: bool,
    too_long: bool,
    terminal: Option<Edge>,
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        ReceiveBuffer::new()
    }
}

impl ReceiveBuffer {
    pub fn new() -> Self {
        ReceiveBuffer {
            ring: Vec::with_capacity(RING_CAPACITY),
            head: 0,
            tail: 0,
            rewind_mark: 0,
            pending_pulse: 0,
            pending_space: 0,
            is_biphase: false,
            at_eof: false,
            too_long: false,
            terminal: None,
        }
    }

    /// Drop all buffered edges and pending state; a fresh sync point.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.head = 0;
        self.tail = 0;
        self.rewind_mark = 0;
        self.pending_pulse = 0;
        self.pending_space = 0;
        self.is_biphase = false;
        self.at_eof = false;
        self.too_long = false;
        self.terminal = None;
    }

    /// Mark the current read position as the rewind target.
    pub fn mark(&mut self) {
        self.rewind_mark = self.head;
    }

    /// Reset the read cursor back to the last [`mark`](Self::mark), without
    /// discarding buffered edges, so a failed decode attempt can retry
    /// against the same raw data under a different family.
    pub fn rewind(&mut self) {
        self.head = self.rewind_mark;
        self.at_eof = false;
    }

    pub fn is_biphase(&self) -> bool {
        self.is_biphase
    }

    pub fn set_biphase(&mut self, biphase: bool) {
        self.is_biphase = biphase;
    }

    pub fn too_long(&self) -> bool {
        self.too_long
    }

    pub fn at_eof(&self) -> bool {
        self.at_eof
    }

    /// Append a pulse duration, coalescing with any pending pulse rather
    /// than pushing a new edge (consecutive same-polarity edges from the
    /// driver are summed, matching `pending_pulse`/`sync`).
    pub fn push_pulse(&mut self, magnitude: u32) {
        self.flush_pending_space();
        self.pending_pulse = self.pending_pulse.saturating_add(magnitude);
        self.terminal = None;
    }

    /// Append a space duration, coalescing with any pending space.
    pub fn push_space(&mut self, magnitude: u32) {
        self.flush_pending_pulse();
        self.pending_space = self.pending_space.saturating_add(magnitude);
        self.terminal = None;
    }

    /// Record a driver-reported terminal condition (`Timeout`/`Overflow`/
    /// `EndOfStream`/`Frequency`) observed alongside the buffered edges,
    /// without storing it as pulse/space data. Cleared as soon as more
    /// real data arrives, since new data means the stream hasn't ended.
    pub fn note_terminal(&mut self, edge: Edge) {
        self.terminal = Some(edge);
    }

    /// The last driver-reported terminal condition, if one is still in
    /// effect (no pulse/space data has arrived since).
    pub fn terminal(&self) -> Option<Edge> {
        self.terminal
    }

    fn flush_pending_pulse(&mut self) {
        if self.pending_pulse > 0 {
            self.store(Duration::pulse(self.pending_pulse));
            self.pending_pulse = 0;
        }
    }

    fn flush_pending_space(&mut self) {
        if self.pending_space > 0 {
            self.store(Duration::space(self.pending_space));
            self.pending_space = 0;
        }
    }

    /// Flush any pending coalesced edge, marking this the end of a frame.
    pub fn flush(&mut self) {
        self.flush_pending_pulse();
        self.flush_pending_space();
    }

    fn store(&mut self, d: Duration) {
        if self.ring.len() < RING_CAPACITY {
            self.ring.push(d);
        } else {
            if !self.too_long {
                log::trace!("receive buffer overflowed its {RING_CAPACITY}-edge ring, oldest edges are being overwritten");
            }
            self.too_long = true;
            let slot = self.tail % RING_CAPACITY;
            self.ring[slot] = d;
        }
        self.tail += 1;
    }

    /// Read the next edge, flushing pending state first. Returns `None`
    /// once the cursor has caught up with the tail and no more edges have
    /// been pushed. A driver-reported terminal condition
    /// (`Edge::Timeout`/`Overflow`/`EndOfStream`) is never stored in the
    /// ring; it is tracked separately, see [`note_terminal`](Self::note_terminal).
    pub fn next(&mut self) -> Option<Duration> {
        self.flush();
        if self.head >= self.tail {
            self.at_eof = true;
            return None;
        }
        let slot = self.head % RING_CAPACITY;
        self.head += 1;
        Some(self.ring[slot])
    }

    /// Push `n` positions worth of edges back onto the read cursor so a
    /// partially-consumed frame can be reconsidered by another branch of
    /// the decoder (a narrower cousin of [`rewind`](Self::rewind): `n`
    /// positions rather than all the way back to the mark).
    pub fn unget(&mut self, n: usize) {
        self.head = self.head.saturating_sub(n);
        self.at_eof = false;
    }

    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    /// True if there is nothing left to read: no flushed edges ahead of
    /// the cursor, and no pending coalesced pulse/space waiting to be
    /// flushed either. A pending edge is real, not-yet-finalized data, so
    /// it counts as "not empty" even though [`len`](Self::len) doesn't
    /// see it yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.pending_pulse == 0 && self.pending_space == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_consecutive_pulses() {
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(100);
        buf.push_pulse(50);
        buf.push_space(200);
        assert_eq!(buf.next(), Some(Duration::pulse(150)));
        assert_eq!(buf.next(), Some(Duration::space(200)));
        assert_eq!(buf.next(), None);
    }

    #[test]
    fn rewind_replays_from_mark() {
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(100);
        buf.push_space(200);
        buf.flush();
        buf.mark();
        assert_eq!(buf.next(), Some(Duration::pulse(100)));
        assert_eq!(buf.next(), Some(Duration::space(200)));
        buf.rewind();
        assert_eq!(buf.next(), Some(Duration::pulse(100)));
    }

    #[test]
    fn unget_backs_up_n_positions() {
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(10);
        buf.push_space(20);
        buf.push_pulse(30);
        buf.flush();
        let _ = buf.next();
        let _ = buf.next();
        buf.unget(2);
        assert_eq!(buf.next(), Some(Duration::pulse(10)));
    }

    #[test]
    fn clear_resets_everything() {
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(10);
        buf.flush();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.next(), None);
    }

    #[test]
    fn exhausting_the_buffer_sets_at_eof() {
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(10);
        buf.flush();
        let _ = buf.next();
        assert!(!buf.at_eof());
        let _ = buf.next();
        assert!(buf.at_eof());
    }

    #[test]
    fn note_terminal_is_recalled_until_more_data_arrives() {
        let mut buf = ReceiveBuffer::new();
        assert_eq!(buf.terminal(), None);
        buf.note_terminal(Edge::Timeout);
        assert_eq!(buf.terminal(), Some(Edge::Timeout));
        buf.push_pulse(10);
        assert_eq!(buf.terminal(), None, "new data clears a stale terminal marker");
    }
}
