pub mod waterfall;

use crate::heatmap::Rgba;

/// Per-tick input to a view. `column` is None while the spectrum source is
/// not ready; views still service resizes and present in that state.
pub struct Info<'i> {
    pub column: Option<&'i [Rgba]>,
}

pub trait View {
    fn render(&mut self, info: &Info);
    fn requested_height(&self) -> u32 {
        0
    }
}
