/// Fixed-capacity sliding history. Index 0 is the most recent sample; pushing
/// a new sample evicts the oldest one. Slots that were never written hold the
/// zero value given at construction.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    head: usize,
    n_pushed: usize,
}

/// Body velocity `[6]` per convolution step
pub type VelocityHistory = RingBuffer<[f64; 6]>;

/// Wave elevation per heading bucket `[n_heading]` per convolution step
pub type WaveAmplitudeHistory = RingBuffer<Vec<f64>>;

impl<T: Clone> RingBuffer<T> {
    /// # Panics
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize, zero: T) -> Self {
        assert!(capacity > 0, "history capacity must be positive");
        RingBuffer {
            data: vec![zero; capacity],
            head: 0,
            n_pushed: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of samples pushed since construction
    pub fn n_pushed(&self) -> usize {
        self.n_pushed
    }

    /// True once every slot holds a pushed sample
    pub fn is_full(&self) -> bool {
        self.n_pushed >= self.data.len()
    }

    /// Move the front back one slot, evicting the oldest sample, and return
    /// the new front slot to be filled in place.
    pub fn advance(&mut self) -> &mut T {
        let n = self.data.len();
        self.head = (self.head + n - 1) % n;
        self.n_pushed += 1;
        &mut self.data[self.head]
    }

    pub fn push(&mut self, value: T) {
        *self.advance() = value;
    }

    /// Sample `k` steps in the past
    #[inline]
    pub fn get(&self, k: usize) -> &T {
        &self.data[(self.head + k) % self.data.len()]
    }

    /// Most recent sample, for re-evaluating the current step in place
    pub fn front_mut(&mut self) -> &mut T {
        &mut self.data[self.head]
    }

    /// Samples from newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data[self.head..]
            .iter()
            .chain(self.data[..self.head].iter())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_push_and_evict() {
        let mut h = RingBuffer::new(3, 0);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![0, 0, 0]);

        h.push(1);
        h.push(2);
        assert!(!h.is_full());
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![2, 1, 0]);

        h.push(3);
        h.push(4);
        assert!(h.is_full());
        assert_eq!(h.n_pushed(), 4);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![4, 3, 2]);
        assert_eq!(*h.get(0), 4);
        assert_eq!(*h.get(2), 2);
    }

    #[test]
    fn test_advance_overwrites_in_place() {
        let mut h: WaveAmplitudeHistory = RingBuffer::new(2, vec![0.; 3]);
        h.advance().copy_from_slice(&[1., 2., 3.]);
        h.advance()[1] = 5.;
        // Slot was never written, still zero apart from the update
        assert_eq!(h.get(0), &vec![0., 5., 0.]);
        assert_eq!(h.get(1), &vec![1., 2., 3.]);
        // Oldest slot is reused
        h.advance().fill(7.);
        assert_eq!(h.get(0), &vec![7.; 3]);
        assert_eq!(h.get(1), &vec![0., 5., 0.]);
    }
}
