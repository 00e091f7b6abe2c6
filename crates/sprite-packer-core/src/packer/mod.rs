use crate::error::Result;
use crate::model::{Page, Rect};
use crate::settings::Settings;

pub mod grid;
pub mod maxrects;
pub mod search;

pub use grid::GridPacker;
pub use maxrects::{MaxRects, MaxRectsHeuristic, MaxRectsPacker, Placement};

/// A packer lays out every rect of one scale variant onto an ordered list of pages.
///
/// Implementations must ensure no two padded boxes on a page overlap, never rotate
/// a rect whose `can_rotate` is false, and return every input rect on exactly one
/// page. Rects arrive with `width`/`height` already including padding.
pub trait Packer {
    fn pack(&mut self, rects: Vec<Rect>) -> Result<Vec<Page>>;
}

/// Builds the packer selected by `settings.grid`, validating the settings.
pub fn packer_for(settings: &Settings) -> Result<Box<dyn Packer + Send>> {
    if settings.grid {
        Ok(Box::new(GridPacker::new(settings.clone())?))
    } else {
        Ok(Box::new(MaxRectsPacker::new(settings.clone())?))
    }
}

/// Orders rects by name for deterministic descriptor output.
pub(crate) fn sort_by_name(rects: &mut [Rect]) {
    rects.sort_by(|a, b| a.name.cmp(&b.name));
}
