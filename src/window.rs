use std::collections::HashMap;
use std::f32::consts::PI;

pub trait Window {
    fn size(&self) -> usize;
    fn shape(&self) -> &[f32];
}

pub type WindowFn = fn(usize) -> Box<dyn Window>;

pub struct GenericWindow(Vec<f32>);

impl Window for GenericWindow {
    fn size(&self) -> usize {
        self.0.len()
    }
    fn shape(&self) -> &[f32] {
        &self.0
    }
}

pub fn new_rect(sz: usize) -> Box<dyn Window> {
    Box::new(GenericWindow(vec![1.0f32; sz]))
}

pub fn new_hann(sz: usize) -> Box<dyn Window> {
    let denom = sz.saturating_sub(1).max(1) as f32;
    Box::new(GenericWindow(
        (0..sz)
            .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / denom).cos()))
            .collect(),
    ))
}

pub fn new_blackman(sz: usize) -> Box<dyn Window> {
    let denom = sz.saturating_sub(1).max(1) as f32;
    Box::new(GenericWindow(
        (0..sz)
            .map(|n| {
                let x = 2.0 * PI * n as f32 / denom;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect(),
    ))
}

pub fn windows() -> HashMap<String, WindowFn> {
    let mut map: HashMap<String, WindowFn> = HashMap::new();
    map.insert("rect".into(), new_rect);
    map.insert("hann".into(), new_hann);
    map.insert("blackman".into(), new_blackman);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_all_ones() {
        let win = new_rect(16);
        assert_eq!(win.size(), 16);
        assert!(win.shape().iter().all(|&w| w == 1.0));
    }

    #[test]
    fn hann_is_zero_at_edges_and_one_at_center() {
        let win = new_hann(1024);
        let shape = win.shape();
        assert!((shape[0] - 0.0).abs() < 0.01);
        assert!((shape[1023] - 0.0).abs() < 0.01);
        assert!((shape[512] - 1.0).abs() < 0.01);
    }

    #[test]
    fn blackman_is_near_zero_at_edges_and_one_at_center() {
        let win = new_blackman(1024);
        let shape = win.shape();
        assert!(shape[0].abs() < 0.01);
        assert!(shape[1023].abs() < 0.01);
        assert!((shape[512] - 1.0).abs() < 0.01);
    }

    #[test]
    fn registry_knows_every_window() {
        let map = windows();
        for name in ["rect", "hann", "blackman"] {
            assert!(map.contains_key(name), "missing {}", name);
        }
    }
}
