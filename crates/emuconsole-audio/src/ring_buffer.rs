use crate::error::AudioError;

/// Fixed-capacity byte ring shared by the emulation thread (producer) and the
/// device callback (consumer).
///
/// Every committed byte is stored twice, at `p` and `p + capacity`, so the
/// writable head and the readable tail are always a single contiguous slice
/// even when they wrap around the end of the ring.
///
/// The ring never grows: pushes that do not fit are the caller's to drop.
pub struct RingBuffer {
    // 2 * capacity bytes, second half mirrors the first.
    data: Box<[u8]>,
    mask: usize,
    read: usize,
    fill: usize,
}

impl RingBuffer {
    /// Allocate a ring of `capacity` bytes. `capacity` must be a non-zero
    /// power of two.
    pub fn new(capacity: usize) -> Result<Self, AudioError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(AudioError::InvalidConfig(format!(
                "ring buffer capacity {capacity} is not a power of two"
            )));
        }

        let bytes = capacity
            .checked_mul(2)
            .ok_or(AudioError::Allocation { bytes: usize::MAX })?;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| AudioError::Allocation { bytes })?;
        data.resize(bytes, 0);

        Ok(Self {
            data: data.into_boxed_slice(),
            mask: capacity - 1,
            read: 0,
            fill: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Bytes committed and not yet consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.fill
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fill == 0
    }

    /// Bytes a producer may still write.
    #[inline]
    pub fn free(&self) -> usize {
        self.capacity() - self.fill
    }

    #[inline]
    fn write_index(&self) -> usize {
        (self.read + self.fill) & self.mask
    }

    /// Writable region of exactly [`free`](Self::free) bytes.
    ///
    /// Writing into it changes nothing until [`produce`](Self::produce)
    /// commits the bytes.
    pub fn head(&mut self) -> &mut [u8] {
        let start = self.write_index();
        let end = start + self.free();
        &mut self.data[start..end]
    }

    /// Commit `n` bytes previously written through [`head`](Self::head).
    pub fn produce(&mut self, n: usize) {
        assert!(
            n <= self.free(),
            "produce({n}) exceeds free space ({})",
            self.free()
        );

        let cap = self.capacity();
        let start = self.write_index();
        let end = start + n;
        if end <= cap {
            self.data.copy_within(start..end, start + cap);
        } else {
            self.data.copy_within(start..cap, start + cap);
            self.data.copy_within(cap..end, 0);
        }
        self.fill += n;
    }

    /// Readable run of exactly [`len`](Self::len) bytes, oldest first.
    pub fn tail(&self) -> &[u8] {
        &self.data[self.read..self.read + self.fill]
    }

    /// Retire `n` bytes from the front of the tail.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.fill, "consume({n}) exceeds fill ({})", self.fill);
        self.read = (self.read + n) & self.mask;
        self.fill -= n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(rb: &mut RingBuffer, bytes: &[u8]) {
        rb.head()[..bytes.len()].copy_from_slice(bytes);
        rb.produce(bytes.len());
    }

    #[test]
    fn rejects_non_power_of_two_capacity() {
        assert!(matches!(
            RingBuffer::new(24),
            Err(AudioError::InvalidConfig(_))
        ));
        assert!(matches!(
            RingBuffer::new(0),
            Err(AudioError::InvalidConfig(_))
        ));
    }

    #[test]
    fn head_reports_free_space_without_committing() {
        let mut rb = RingBuffer::new(16).unwrap();
        assert_eq!(rb.head().len(), 16);
        rb.head()[0] = 0xAA;
        assert!(rb.is_empty());
        assert_eq!(rb.tail().len(), 0);
    }

    #[test]
    fn produce_and_consume_track_fill() {
        let mut rb = RingBuffer::new(16).unwrap();
        push(&mut rb, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(rb.len(), 6);
        assert_eq!(rb.free(), 10);
        assert_eq!(rb.tail(), &[1, 2, 3, 4, 5, 6]);

        rb.consume(4);
        assert_eq!(rb.tail(), &[5, 6]);
        assert_eq!(rb.free(), 14);
    }

    #[test]
    fn tail_is_contiguous_across_wraparound() {
        let mut rb = RingBuffer::new(8).unwrap();
        push(&mut rb, &[0, 1, 2, 3, 4, 5]);
        rb.consume(5);
        // Write index is at 6: this push wraps past the end of the ring.
        push(&mut rb, &[6, 7, 8, 9, 10]);
        assert_eq!(rb.len(), 6);
        assert_eq!(rb.tail(), &[5, 6, 7, 8, 9, 10]);

        rb.consume(3);
        push(&mut rb, &[11, 12, 13, 14, 15]);
        assert_eq!(rb.tail(), &[8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(rb.free(), 0);
        assert!(rb.head().is_empty());
    }

    #[test]
    fn fill_stays_within_bounds_over_long_sequences() {
        let mut rb = RingBuffer::new(64).unwrap();
        let mut next = 0u8;
        let mut expected = std::collections::VecDeque::new();
        for step in 0..2000usize {
            let want = (step * 7) % 23;
            let n = want.min(rb.free());
            let chunk: Vec<u8> = (0..n)
                .map(|_| {
                    next = next.wrapping_add(1);
                    next
                })
                .collect();
            push(&mut rb, &chunk);
            expected.extend(chunk);

            let take = ((step * 5) % 19).min(rb.len());
            let want: Vec<u8> = expected.range(..take).copied().collect();
            assert_eq!(rb.tail()[..take].to_vec(), want);
            rb.consume(take);
            expected.drain(..take);

            assert!(rb.len() <= rb.capacity());
            assert_eq!(rb.len(), expected.len());
        }
    }

    #[test]
    #[should_panic]
    fn produce_past_free_space_panics() {
        let mut rb = RingBuffer::new(4).unwrap();
        rb.produce(5);
    }
}
