use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::window::{Window, WindowFn};

/// Magnitudes below this map to byte 0, above MAX_DB to byte 255.
pub const MIN_DB: f32 = -100.0;
pub const MAX_DB: f32 = -30.0;

/// Windowed forward FFT producing byte magnitudes for the first half of the
/// spectrum. Owns every size-derived buffer so a window resize can swap them
/// all at once; nothing here may read a stale-sized buffer afterwards.
pub struct Analyzer {
    planner: FftPlanner<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    buf: Vec<Complex<f32>>,
    window: Box<dyn Window>,
    window_fn: WindowFn,
    smoothing: f32,
    smoothed: Vec<f32>,
    frame: Vec<u8>,
}

impl Analyzer {
    pub fn new(size: usize, window_fn: WindowFn, smoothing: f32) -> Analyzer {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex { re: 0.0, im: 0.0 }; fft.get_inplace_scratch_len()];
        Analyzer {
            planner,
            fft,
            scratch,
            buf: vec![Complex { re: 0.0, im: 0.0 }; size],
            window: window_fn(size),
            window_fn,
            smoothing,
            smoothed: vec![0.0; size / 2],
            frame: vec![0; size / 2],
        }
    }

    pub fn window_size(&self) -> usize {
        self.buf.len()
    }

    pub fn bin_count(&self) -> usize {
        self.window_size() / 2
    }

    /// Swap every buffer over to a new window size. No-op on equal size, so
    /// smoothing state survives redundant calls.
    pub fn set_window_size(&mut self, size: usize) {
        if size == self.window_size() {
            return;
        }
        self.fft = self.planner.plan_fft_forward(size);
        self.scratch
            .resize(self.fft.get_inplace_scratch_len(), Complex { re: 0.0, im: 0.0 });
        self.buf = vec![Complex { re: 0.0, im: 0.0 }; size];
        self.window = (self.window_fn)(size);
        self.smoothed = vec![0.0; size / 2];
        self.frame = vec![0; size / 2];
    }

    /// Analyze one full window of samples. The returned frame is overwritten
    /// on the next call; its length is the current bin count.
    pub fn process(&mut self, samples: &[f32]) -> &[u8] {
        debug_assert_eq!(samples.len(), self.window.size());

        for ((pt, &samp), &wv) in self
            .buf
            .iter_mut()
            .zip(samples)
            .zip(self.window.shape())
        {
            *pt = Complex { re: samp * wv, im: 0.0 };
        }
        self.fft.process_with_scratch(&mut self.buf, &mut self.scratch);

        // Real input, so only the first half of the spectrum is useful
        let norm = 1.0 / self.window_size() as f32;
        let tau = self.smoothing;
        for (i, slot) in self.frame.iter_mut().enumerate() {
            let mag = self.buf[i].norm() * norm;
            let smoothed = tau * self.smoothed[i] + (1.0 - tau) * mag;
            self.smoothed[i] = smoothed;
            *slot = byte_from_db(20.0 * smoothed.max(f32::MIN_POSITIVE).log10());
        }
        &self.frame
    }
}

fn byte_from_db(db: f32) -> u8 {
    let unit = (db - MIN_DB) / (MAX_DB - MIN_DB);
    (unit.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window;
    use std::f32::consts::PI;

    fn tone(size: usize, bin: usize) -> Vec<f32> {
        (0..size)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn silence_maps_to_zero_everywhere() {
        let mut an = Analyzer::new(1024, window::new_blackman, 0.0);
        let frame = an.process(&vec![0.0; 1024]);
        assert_eq!(frame.len(), 512);
        assert!(frame.iter().all(|&m| m == 0));
    }

    #[test]
    fn tone_peaks_at_its_own_bin() {
        let mut an = Analyzer::new(1024, window::new_blackman, 0.0);
        let frame = an.process(&tone(1024, 32));
        assert_eq!(frame[32], 255);
        // Blackman confines an exact-bin tone to a few neighbors
        assert_eq!(frame[64], 0);
        assert_eq!(frame[400], 0);
    }

    #[test]
    fn resize_changes_the_bin_count() {
        let mut an = Analyzer::new(1024, window::new_blackman, 0.0);
        an.set_window_size(4096);
        assert_eq!(an.window_size(), 4096);
        assert_eq!(an.bin_count(), 2048);
        let frame = an.process(&vec![0.0; 4096]);
        assert_eq!(frame.len(), 2048);
    }

    #[test]
    fn same_size_resize_preserves_smoothing_state() {
        let mut an = Analyzer::new(1024, window::new_blackman, 0.9);
        an.process(&tone(1024, 32));
        an.set_window_size(1024);
        let frame = an.process(&vec![0.0; 1024]);
        assert!(frame[32] > 0, "state was dropped by a no-op resize");
    }

    #[test]
    fn real_resize_discards_smoothing_state() {
        let mut an = Analyzer::new(1024, window::new_blackman, 0.9);
        an.process(&tone(1024, 32));
        an.set_window_size(2048);
        let frame = an.process(&vec![0.0; 2048]);
        assert!(frame.iter().all(|&m| m == 0));
    }
}
