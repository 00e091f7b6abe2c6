//! Core library for packing sprites into texture pages.
//!
//! - Processing: `ImageProcessor` trims whitespace, parses nine-patch borders,
//!   scales and deduplicates images into `Rect`s
//! - Packing: `GridPacker` (uniform cells) and `MaxRectsPacker` (BSSF/BLSF/BAF/BL/CP
//!   with a smallest-page binary search, multi-page)
//! - Layout: `pack_images` runs the pipeline for every configured scale
//! - Export: `page_regions` / `to_json` produce descriptor records
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use sprite_packer_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let inputs = vec![
//!     InputImage::new("hero", ImageReader::open("hero.png")?.decode()?),
//!     InputImage::new("button.9", ImageReader::open("button.9.png")?.decode()?),
//! ];
//! let settings = Settings::builder().with_max_dimensions(1024, 1024).rotation(true).build();
//! for atlas in pack_images(&inputs, &settings)? {
//!     println!("scale {}: {} pages", atlas.scale, atlas.pages.len());
//! }
//! # Ok(()) }
//! ```

pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod packer;
pub mod processor;
pub mod settings;

pub use error::*;
pub use export::*;
pub use layout::*;
pub use model::*;
pub use packer::*;
pub use processor::*;
pub use settings::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::error::{Result, SpritePackerError};
    pub use crate::export::{AtlasRegion, page_regions, to_json};
    pub use crate::layout::{InputImage, ScaledAtlas, finish_page, pack_images, pack_rects};
    pub use crate::model::{Alias, Bounds, Page, Rect};
    pub use crate::packer::{
        GridPacker, MaxRects, MaxRectsHeuristic, MaxRectsPacker, Packer, packer_for,
    };
    pub use crate::processor::ImageProcessor;
    pub use crate::settings::{Resampling, Settings, SettingsBuilder};
}
