//! Fixed-capacity byte ring buffer.
//!
//! Positions are plain indices in `0..N` advanced modulo `N`; nothing relies
//! on integer overflow. The number of queued bytes always satisfies
//! `0 <= len <= N`.

/// Capacity of the inbound and outbound frame buffers.
pub const BUFFER_SIZE: usize = 256;

/// Ring buffer used for both directions of the serial link.
pub type FrameBuffer = RingBuffer<BUFFER_SIZE>;

/// Circular FIFO of `N` bytes.
///
/// # Example
///
/// ```
/// use bincom_core::RingBuffer;
///
/// let mut ring = RingBuffer::<4>::new();
/// ring.push(1).unwrap();
/// ring.push(2).unwrap();
/// assert_eq!(ring.pop(), Some(1));
/// assert_eq!(ring.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    /// Index of the oldest queued byte.
    read: usize,
    /// Number of queued bytes.
    len: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    const NONZERO: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NONZERO;
        Self {
            buf: [0; N],
            read: 0,
            len: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Number of bytes that can still be pushed.
    #[inline]
    #[must_use]
    pub const fn free(&self) -> usize {
        N - self.len
    }

    /// Index of the next byte [`pop`](Self::pop) returns.
    #[inline]
    #[must_use]
    pub const fn read_position(&self) -> usize {
        self.read
    }

    /// Index the next pushed byte lands on.
    #[inline]
    #[must_use]
    pub const fn write_position(&self) -> usize {
        (self.read + self.len) % N
    }

    /// Append a byte, handing it back if the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(byte)` when no space is left; the buffer is unchanged.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Result<(), u8> {
        if self.is_full() {
            return Err(byte);
        }
        let at = self.write_position();
        self.buf[at] = byte;
        self.len += 1;
        Ok(())
    }

    /// Append all of `bytes`, or nothing if they do not fit.
    ///
    /// # Errors
    ///
    /// Returns the number of free bytes when `bytes` is longer.
    pub fn try_extend(&mut self, bytes: &[u8]) -> Result<(), usize> {
        if bytes.len() > self.free() {
            return Err(self.free());
        }
        for &byte in bytes {
            let at = self.write_position();
            self.buf[at] = byte;
            self.len += 1;
        }
        Ok(())
    }

    /// Remove and return the oldest byte.
    #[inline]
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.read];
        self.read = (self.read + 1) % N;
        self.len -= 1;
        Some(byte)
    }

    /// Queued byte `offset` places after the oldest one.
    #[inline]
    #[must_use]
    pub fn peek(&self, offset: usize) -> Option<u8> {
        if offset < self.len {
            Some(self.buf[(self.read + offset) % N])
        } else {
            None
        }
    }

    /// Byte stored at absolute `position` (taken modulo `N`), queued or not.
    #[inline]
    #[must_use]
    pub const fn get(&self, position: usize) -> u8 {
        self.buf[position % N]
    }

    /// Drop up to `n` of the oldest bytes, returning how many were dropped.
    pub fn discard(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        self.read = (self.read + n) % N;
        self.len -= n;
        n
    }

    /// Drop every queued byte; the read position catches up with the write
    /// position.
    pub fn clear(&mut self) {
        self.read = self.write_position();
        self.len = 0;
    }

    /// Iterate over queued bytes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len).map(move |i| self.buf[(self.read + i) % N])
    }
}
