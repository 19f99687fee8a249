use std::ops::Deref;

/// Fixed-size sliding window over the newest capture samples. The audio
/// callback pushes blocks in; the analyzer reads the whole window each tick.
#[derive(Debug, Clone)]
pub struct SampleRing(Vec<f32>);

impl SampleRing {
    pub fn new(sz: usize) -> SampleRing {
        SampleRing(vec![0.0; sz])
    }

    /// Append a block, discarding the oldest samples to stay at size.
    pub fn push(&mut self, data: &[f32]) {
        let dlen = data.len();
        let blen = self.0.len();

        if dlen >= blen {
            self.0.copy_from_slice(&data[dlen - blen..]);
        } else {
            self.0.copy_within(dlen.., 0);
            self.0[blen - dlen..].copy_from_slice(data);
        }
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn resize(&mut self, newsz: usize) {
        self.0.resize(newsz, 0.0);
    }
}

impl Deref for SampleRing {
    type Target = [f32];
    fn deref(&self) -> &[f32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_push_shifts_older_samples_down() {
        let mut ring = SampleRing::new(4);
        ring.push(&[1.0, 2.0]);
        ring.push(&[3.0]);
        assert_eq!(&ring[..], &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn oversized_push_keeps_only_the_tail() {
        let mut ring = SampleRing::new(3);
        ring.push(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(&ring[..], &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn exact_push_replaces_everything() {
        let mut ring = SampleRing::new(2);
        ring.push(&[7.0, 8.0]);
        assert_eq!(&ring[..], &[7.0, 8.0]);
    }

    #[test]
    fn resize_changes_capacity() {
        let mut ring = SampleRing::new(2);
        ring.push(&[1.0, 2.0]);
        ring.resize(4);
        assert_eq!(ring.size(), 4);
        ring.resize(1);
        assert_eq!(ring.size(), 1);
    }
}
