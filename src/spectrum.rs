use anyhow::Result;
use portaudio::PortAudio;

use crate::analyzer::Analyzer;
use crate::capture::{self, Capture, CaptureOptions};
use crate::window::WindowFn;

/// Hard ceiling on the analysis window.
pub const MAX_WINDOW: usize = 32_768;
/// Window size used until the first resolution adaptation.
pub const INITIAL_WINDOW: usize = 16_384;

/// Analysis window for a target pixel height. One doubling covers the
/// halving into bins, four more zoom the waterfall in on the low end of
/// the spectrum, so bins comfortably exceed the height until the clamp.
pub fn window_size_for(height: u32) -> usize {
    let exp = (height.max(1) as f64).log2().round() as u32 + 5;
    (1usize << exp).min(MAX_WINDOW)
}

/// Owns the capture device and the analyzer, and keeps the analysis window
/// tracking the requested display resolution.
pub struct SpectrumSource {
    capture: Capture,
    analyzer: Analyzer,
    input: Vec<f32>,
    muted: bool,
}

impl SpectrumSource {
    /// Acquire the capture device and stand up the analysis pipeline.
    /// Failure here is terminal for the session; there is no retry path.
    pub fn initialize(pa: &PortAudio, opts: &CaptureOptions, window_fn: WindowFn) -> Result<SpectrumSource> {
        let capture = capture::open(pa, opts, INITIAL_WINDOW)?;
        Ok(SpectrumSource {
            capture,
            analyzer: Analyzer::new(INITIAL_WINDOW, window_fn, 0.0),
            input: Vec::with_capacity(MAX_WINDOW),
            muted: true,
        })
    }

    /// Track a new target resolution. No-op unless the derived window size
    /// actually changes; on change the sample ring and every analyzer buffer
    /// are reallocated before the next pull.
    pub fn set_target_resolution(&mut self, height: u32) {
        let want = window_size_for(height);
        if want == self.analyzer.window_size() {
            return;
        }
        let prev = self.analyzer.window_size();
        self.capture
            .samples
            .lock()
            .expect("locking sample ring")
            .resize(want);
        self.analyzer.set_window_size(want);
        log::debug!(
            "analysis window {} -> {} ({} bins)",
            prev,
            want,
            self.analyzer.bin_count()
        );
    }

    /// Produce the current magnitude frame. Its length is the bin count of
    /// the window size in effect right now; callers re-derive the bin count
    /// from the slice, never from an earlier pull.
    pub fn pull(&mut self) -> &[u8] {
        let _g = hprof::enter("SpectrumSource::pull");
        {
            let ring = self.capture.samples.lock().expect("locking sample ring");
            self.input.clear();
            self.input.extend_from_slice(&ring);
        }
        self.analyzer.process(&self.input)
    }

    /// Gate the audible loopback path. Analysis is unaffected. Redundant
    /// calls with an unchanged value write nothing through.
    pub fn set_mute(&mut self, muted: bool) {
        if muted == self.muted {
            return;
        }
        self.muted = muted;
        self.capture.set_gain(!muted);
        log::debug!("loopback {}", if muted { "muted" } else { "live" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_matches_the_height_formula() {
        // round(log2(480)) = 9, 2^14
        assert_eq!(window_size_for(480), 16_384);
        // round(log2(600)) = 9, 2^14
        assert_eq!(window_size_for(600), 16_384);
        // round(log2(1024)) = 10, 2^15: at the clamp without clamping
        assert_eq!(window_size_for(1024), 32_768);
        // computed 2^21, clamped
        assert_eq!(window_size_for(70_000), MAX_WINDOW);
        assert_eq!(window_size_for(1), 32);
        // degenerate height behaves like 1
        assert_eq!(window_size_for(0), 32);
    }

    #[test]
    fn window_size_is_a_nondecreasing_power_of_two() {
        let mut last = 0;
        for h in 1..=10_000 {
            let w = window_size_for(h);
            assert!(w.is_power_of_two(), "not a power of two at {}", h);
            assert!(w <= MAX_WINDOW);
            assert!(w >= last, "shrank between {} and {}", h - 1, h);
            last = w;
        }
    }
}
