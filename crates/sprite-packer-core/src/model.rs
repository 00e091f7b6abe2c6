use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Axis-aligned area in page space (pixels, bottom-left origin).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Bounds {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive top edge (`y + h`).
    pub fn top(&self) -> u32 {
        self.y + self.h
    }
    /// Returns true if `other` lies fully inside `self`.
    pub fn contains(&self, other: &Bounds) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }
    /// Separating-axis test; touching edges do not intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.x >= self.right()
            || other.right() <= self.x
            || other.y >= self.top()
            || other.top() <= self.y)
    }
}

/// A duplicate image that shares the placement of another rect.
///
/// Carries everything that can differ between two images with identical pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alias {
    pub name: String,
    pub index: i32,
    pub splits: Option<[i32; 4]>,
    pub pads: Option<[i32; 4]>,
    pub offset_x: u32,
    pub offset_y: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl From<&Rect> for Alias {
    fn from(rect: &Rect) -> Self {
        Self {
            name: rect.name.clone(),
            index: rect.index,
            splits: rect.splits,
            pads: rect.pads,
            offset_x: rect.offset_x,
            offset_y: rect.offset_y,
            original_width: rect.original_width,
            original_height: rect.original_height,
        }
    }
}

/// A rectangle to be placed on a page, plus its placement once packed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rect {
    pub name: String,
    /// Frame index split off the name, `-1` when unindexed.
    pub index: i32,
    /// Trim offset from the top-left of the original image.
    pub offset_x: u32,
    pub offset_y: u32,
    /// Size after trimming.
    pub region_width: u32,
    pub region_height: u32,
    /// Size before trimming.
    pub original_width: u32,
    pub original_height: u32,
    /// Page position of the padded box, bottom-left origin.
    pub x: u32,
    pub y: u32,
    /// Portion of the page taken by this rect, including padding.
    /// After packing these are the placed (possibly rotated) dimensions.
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
    pub can_rotate: bool,
    /// Nine-patch stretch region: left, right, top, bottom.
    pub splits: Option<[i32; 4]>,
    /// Nine-patch content padding: left, right, top, bottom.
    pub pads: Option<[i32; 4]>,
    pub aliases: BTreeSet<Alias>,
    /// Trimmed RGBA pixels, kept for the compositor.
    #[serde(skip)]
    pub image: Option<RgbaImage>,
}

impl Rect {
    /// Layout-only rect of the given region size, no trim and no padding yet.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            index: -1,
            offset_x: 0,
            offset_y: 0,
            region_width: width,
            region_height: height,
            original_width: width,
            original_height: height,
            x: 0,
            y: 0,
            width,
            height,
            rotated: false,
            can_rotate: true,
            splits: None,
            pads: None,
            aliases: BTreeSet::new(),
            image: None,
        }
    }

    /// Rect for the `width`x`height` region of `source` at (`left`, `top`).
    pub(crate) fn from_region(
        source: &RgbaImage,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let image = image::imageops::crop_imm(source, left, top, width, height).to_image();
        Self {
            offset_x: left,
            offset_y: top,
            original_width: source.width(),
            original_height: source.height(),
            image: Some(image),
            ..Self::new(String::new(), width, height)
        }
    }

    /// Sets the packing size to the region size plus right/top padding.
    pub fn pad(mut self, padding_x: u32, padding_y: u32) -> Self {
        self.width = self.region_width + padding_x;
        self.height = self.region_height + padding_y;
        self
    }

    /// The padded box occupied on the page.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    /// Content size in placed orientation.
    pub fn placed_region_size(&self) -> (u32, u32) {
        if self.rotated {
            (self.region_height, self.region_width)
        } else {
            (self.region_width, self.region_height)
        }
    }
}

/// A single packed texture page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Rects placed on this page, sorted by name.
    pub output_rects: Vec<Rect>,
    /// Rects that did not fit; they seed the next page.
    pub remaining_rects: Vec<Rect>,
    /// Used area over page area, in `[0, 1]`.
    pub occupancy: f32,
    /// Offset of the packed content inside the final image (edge padding).
    pub x: u32,
    pub y: u32,
    /// Tight bounding box of placed content.
    pub width: u32,
    pub height: u32,
    /// Final image size, set by [`crate::layout::finish_page`].
    pub image_width: u32,
    pub image_height: u32,
}
