use image::DynamicImage;
use tracing::{info, instrument};

use crate::error::Result;
use crate::model::{Page, Rect};
use crate::packer::packer_for;
use crate::packer::search::round_up4;
use crate::processor::ImageProcessor;
use crate::settings::Settings;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// In-memory image to pack (name without file extension + decoded image).
/// Names ending in `.9` are nine-patches.
#[derive(Debug, Clone)]
pub struct InputImage {
    pub name: String,
    pub image: DynamicImage,
}

impl InputImage {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

/// Pages produced for one entry of `Settings::scale`.
#[derive(Debug, Clone)]
pub struct ScaledAtlas {
    pub scale: f32,
    pub pages: Vec<Page>,
}

/// Applies edge padding and size rounding to a packed page, filling
/// `image_width`/`image_height`.
pub fn finish_page(page: &mut Page, settings: &Settings) {
    let mut width = page.width;
    let mut height = page.height;
    if settings.edge_padding {
        let (mut edge_x, mut edge_y) = (settings.padding_x, settings.padding_y);
        if settings.duplicate_padding {
            edge_x /= 2;
            edge_y /= 2;
        }
        page.x = edge_x;
        page.y = edge_y;
        width += edge_x * 2;
        height += edge_y * 2;
    }
    if settings.pot {
        width = width.next_power_of_two();
        height = height.next_power_of_two();
    }
    if settings.multiple_of_four {
        width = round_up4(width);
        height = round_up4(height);
    }
    page.image_width = width.max(settings.min_width);
    page.image_height = height.max(settings.min_height);
}

/// Packs already prepared rects (`width`/`height` including padding) and
/// finishes every page.
#[instrument(skip_all, fields(rects = rects.len()))]
pub fn pack_rects(rects: Vec<Rect>, settings: &Settings) -> Result<Vec<Page>> {
    let mut packer = packer_for(settings)?;
    let mut pages = packer.pack(rects)?;
    for page in &mut pages {
        finish_page(page, settings);
    }
    Ok(pages)
}

/// Runs the whole pipeline once per configured scale: process every image,
/// pack the resulting rects and finish the pages.
///
/// Scale variants share nothing; with the `parallel` feature and
/// `settings.parallel` they are processed concurrently.
#[instrument(skip_all, fields(images = images.len()))]
pub fn pack_images(images: &[InputImage], settings: &Settings) -> Result<Vec<ScaledAtlas>> {
    settings.validate()?;

    #[cfg(feature = "parallel")]
    {
        if settings.parallel {
            return (0..settings.scale.len())
                .into_par_iter()
                .map(|i| pack_scale(images, settings, i))
                .collect();
        }
    }

    (0..settings.scale.len())
        .map(|i| pack_scale(images, settings, i))
        .collect()
}

fn pack_scale(images: &[InputImage], settings: &Settings, scale_index: usize) -> Result<ScaledAtlas> {
    let scale = settings.scale[scale_index];
    let mut processor = ImageProcessor::new(settings.clone());
    processor.set_scale(scale, settings.resampling_for(scale_index));
    for input in images {
        processor.add_image(&input.image, &input.name)?;
    }
    let pages = pack_rects(processor.into_rects(), settings)?;
    info!(scale, pages = pages.len(), "packed scale");
    Ok(ScaledAtlas { scale, pages })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_padding_then_rounding() {
        let settings = Settings::default();
        let mut page = Page {
            width: 100,
            height: 20,
            ..Default::default()
        };
        finish_page(&mut page, &settings);
        assert_eq!((page.x, page.y), (2, 2));
        assert_eq!((page.image_width, page.image_height), (128, 32));
    }

    #[test]
    fn duplicate_padding_halves_edge() {
        let settings = Settings::builder()
            .pot(false)
            .multiple_of_four(true)
            .padding(4, 4)
            .duplicate_padding(true)
            .with_min_dimensions(1, 1)
            .build();
        let mut page = Page {
            width: 9,
            height: 3,
            ..Default::default()
        };
        finish_page(&mut page, &settings);
        assert_eq!((page.x, page.y), (2, 2));
        assert_eq!((page.image_width, page.image_height), (16, 8));
    }

    #[test]
    fn min_size_clamps() {
        let settings = Settings::builder().pot(false).edge_padding(false).build();
        let mut page = Page {
            width: 5,
            height: 40,
            ..Default::default()
        };
        finish_page(&mut page, &settings);
        assert_eq!((page.image_width, page.image_height), (16, 40));
    }
}
