//! Turns source images into packable rects.
//!
//! Each image goes through nine-patch parsing (names ending in `.9`), scaling,
//! whitespace trimming, index extraction and optional content deduplication.

use image::imageops;
use image::{DynamicImage, RgbaImage};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::error::{Result, SpritePackerError};
use crate::model::{Alias, Rect};
use crate::settings::{Resampling, Settings};

const NINE_PATCH_SUFFIX: &str = ".9";

/// Accumulates the rects for one scale variant.
pub struct ImageProcessor {
    settings: Settings,
    scale: f32,
    resampling: Resampling,
    rects: Vec<Rect>,
    hashes: HashMap<[u8; 20], usize>,
    most_recent_alias: Option<usize>,
}

impl ImageProcessor {
    pub fn new(settings: Settings) -> Self {
        let resampling = settings.resampling_for(0);
        Self {
            settings,
            scale: 1.0,
            resampling,
            rects: Vec::new(),
            hashes: HashMap::new(),
            most_recent_alias: None,
        }
    }

    pub fn set_scale(&mut self, scale: f32, resampling: Resampling) {
        self.scale = scale;
        self.resampling = resampling;
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn into_rects(self) -> Vec<Rect> {
        self.rects
    }

    pub fn clear(&mut self) {
        self.rects.clear();
        self.hashes.clear();
        self.most_recent_alias = None;
    }

    /// Processes one image. Returns the new rect, or `None` when the image was
    /// blank and ignored or became an alias of an earlier image.
    pub fn add_image(&mut self, image: &DynamicImage, name: &str) -> Result<Option<&Rect>> {
        let Some(rect) = self.process_image(image, name)? else {
            info!("Ignoring blank input image: {name}");
            return Ok(None);
        };

        if self.settings.alias {
            let digest = content_hash(rect.image.as_ref());
            if let Some(&existing) = self.hashes.get(&digest) {
                let target = &mut self.rects[existing];
                info!("{} (alias of {})", rect.name, target.name);
                target.aliases.insert(Alias::from(&rect));
                self.most_recent_alias = Some(existing);
                return Ok(None);
            }
            self.hashes.insert(digest, self.rects.len());
        }

        self.rects.push(rect);
        Ok(self.rects.last())
    }

    /// Adds animation frames, each with its delay in seconds.
    ///
    /// Frames are named `<name>_<n>`. A frame whose delay spans several ticks of
    /// the common delay is repeated as aliases with consecutive indexes. Blank
    /// frames are kept so frame numbering stays intact. Returns the common delay.
    #[instrument(skip_all, fields(name = name, frames = frames.len()))]
    pub fn add_frames_with_delays(
        &mut self,
        name: &str,
        frames: &[(DynamicImage, f32)],
    ) -> Result<f32> {
        let delays: Vec<f32> = frames.iter().map(|(_, delay)| *delay).collect();
        let delay = float_gcd(&delays, self.settings.max_animation_delay_error);
        info!("Animation \"{name}\" uses delay of {delay}");

        let ignore_blank_images = self.settings.ignore_blank_images;
        let use_indexes = self.settings.use_indexes;
        self.settings.ignore_blank_images = false;
        self.settings.use_indexes = true;

        let result = self.add_frames(name, frames, delay);

        self.settings.ignore_blank_images = ignore_blank_images;
        self.settings.use_indexes = use_indexes;
        self.most_recent_alias = None;
        result.map(|()| delay)
    }

    fn add_frames(&mut self, name: &str, frames: &[(DynamicImage, f32)], delay: f32) -> Result<()> {
        let mut frame_index: i32 = -1;
        for (image, frame_delay) in frames {
            let mut count = if delay > 0.0 {
                (frame_delay / delay).round() as i64
            } else {
                1
            };
            frame_index += 1;
            let added = self
                .add_image(image, &format!("{name}_{frame_index}"))?
                .is_some();
            count -= 1;

            let target = if added {
                Some(self.rects.len() - 1)
            } else {
                self.most_recent_alias
            };
            let Some(target) = target else {
                continue;
            };
            while count > 0 {
                frame_index += 1;
                let rect = &mut self.rects[target];
                let mut alias = Alias::from(&*rect);
                alias.name = name.trim_end_matches(NINE_PATCH_SUFFIX).to_string();
                alias.index = frame_index;
                rect.aliases.insert(alias);
                count -= 1;
            }
        }
        Ok(())
    }

    fn process_image(&self, image: &DynamicImage, name: &str) -> Result<Option<Rect>> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SpritePackerError::InvalidScale(self.scale));
        }
        let source = image.to_rgba8();

        let (name, mut rect) = match name.strip_suffix(NINE_PATCH_SUFFIX) {
            Some(name) => {
                let (width, height) = source.dimensions();
                if width < 3 || height < 3 {
                    return Err(SpritePackerError::NinePatchTooSmall {
                        name: name.to_string(),
                        width,
                        height,
                    });
                }
                let splits = nine_patch_splits(&source, name)?;
                let pads = nine_patch_pads(&source, name, splits)?;
                let content = imageops::crop_imm(&source, 1, 1, width - 2, height - 2).to_image();
                let content = self.scaled(content);
                let mut rect = Rect::from_region(&content, 0, 0, content.width(), content.height());
                rect.splits = splits.map(|s| self.scale_insets(s));
                rect.pads = pads.map(|p| self.scale_insets(p));
                // Stretch regions only make sense upright.
                rect.can_rotate = false;
                (name, rect)
            }
            None => {
                let scaled = self.scaled(source);
                match self.strip_whitespace(&scaled) {
                    Some(rect) => (name, rect),
                    None => return Ok(None),
                }
            }
        };

        let (name, index) = match self.settings.use_indexes.then(|| split_index(name)).flatten() {
            Some((base, index)) => (base, index),
            None => (name, -1),
        };
        rect.name = name.to_string();
        rect.index = index;
        Ok(Some(rect.pad(self.settings.padding_x, self.settings.padding_y)))
    }

    fn scaled(&self, image: RgbaImage) -> RgbaImage {
        if self.scale == 1.0 {
            return image;
        }
        let width = ((image.width() as f32 * self.scale).round() as u32).max(1);
        let height = ((image.height() as f32 * self.scale).round() as u32).max(1);
        debug!(width, height, scale = self.scale, "resizing");
        imageops::resize(&image, width, height, self.resampling.filter())
    }

    fn scale_insets(&self, insets: [i32; 4]) -> [i32; 4] {
        if self.scale == 1.0 {
            return insets;
        }
        // -1 marks an axis without pads and is kept as is.
        insets.map(|v| {
            if v < 0 {
                v
            } else {
                (v as f32 * self.scale).round() as i32
            }
        })
    }

    /// Trims transparent columns (`strip_whitespace_x`) and rows
    /// (`strip_whitespace_y`). `None` means the image is blank and ignored.
    fn strip_whitespace(&self, source: &RgbaImage) -> Option<Rect> {
        let s = &self.settings;
        let (width, height) = source.dimensions();
        if !s.strip_whitespace_x && !s.strip_whitespace_y {
            return Some(Rect::from_region(source, 0, 0, width, height));
        }

        let visible = |x: u32, y: u32| source.get_pixel(x, y)[3] > s.alpha_threshold;
        let (mut top, mut bottom) = (0, height);
        let (mut left, mut right) = (0, width);
        if s.strip_whitespace_y {
            while top < bottom && !(0..width).any(|x| visible(x, top)) {
                top += 1;
            }
            while bottom > top && !(0..width).any(|x| visible(x, bottom - 1)) {
                bottom -= 1;
            }
        }
        if s.strip_whitespace_x {
            while left < right && !(top..bottom).any(|y| visible(left, y)) {
                left += 1;
            }
            while right > left && !(top..bottom).any(|y| visible(right - 1, y)) {
                right -= 1;
            }
        }

        if right <= left || bottom <= top {
            if s.ignore_blank_images {
                return None;
            }
            let mut placeholder = Rect::new(String::new(), 1, 1);
            placeholder.image = Some(RgbaImage::new(1, 1));
            return Some(placeholder);
        }

        // Keep one pixel of edge content for padding duplication.
        if s.duplicate_padding {
            if s.strip_whitespace_x {
                left = left.saturating_sub(1);
                right = (right + 1).min(width);
            }
            if s.strip_whitespace_y {
                top = top.saturating_sub(1);
                bottom = (bottom + 1).min(height);
            }
        }

        Some(Rect::from_region(
            source,
            left,
            top,
            right - left,
            bottom - top,
        ))
    }
}

/// Splits a trailing `_<digits>` off `name`.
fn split_index(name: &str) -> Option<(&str, i32)> {
    let (base, digits) = name.rsplit_once('_')?;
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, digits.parse().ok()?))
}

/// SHA-1 over the pixels as big-endian ARGB words, then width and height.
fn content_hash(image: Option<&RgbaImage>) -> [u8; 20] {
    let mut hasher = Sha1::new();
    let (mut width, mut height) = (0, 0);
    if let Some(image) = image {
        for pixel in image.pixels() {
            let [r, g, b, a] = pixel.0;
            hasher.update([a, r, g, b]);
        }
        (width, height) = image.dimensions();
    }
    hasher.update(width.to_be_bytes());
    hasher.update(height.to_be_bytes());
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Walks the border from (`x`, `y`) along one axis. Looking for a start, returns
/// the first opaque pixel; looking for an end, the first transparent one.
/// Returns 0 when nothing is found, since 0 lies in the stripped border.
fn split_point(
    image: &RgbaImage,
    name: &str,
    x: u32,
    y: u32,
    start: bool,
    x_axis: bool,
) -> Result<u32> {
    let (mut next, end) = if x_axis {
        (x, image.width())
    } else {
        (y, image.height())
    };
    while next < end {
        let (px, py) = if x_axis { (next, y) } else { (x, next) };
        let rgba = image.get_pixel(px, py).0;
        let valid = if start {
            if rgba[3] == 255 {
                return Ok(next);
            }
            rgba[3] == 0
        } else {
            if rgba[3] == 0 {
                return Ok(next);
            }
            rgba == [0, 0, 0, 255]
        };
        if !valid {
            return Err(SpritePackerError::InvalidNinePatch {
                name: name.to_string(),
                x: px,
                y: py,
                rgba,
            });
        }
        next += 1;
    }
    Ok(0)
}

/// A run reaching the corner ends at the corner.
fn run_end(end: u32, len: u32) -> u32 {
    if end == 0 { len - 1 } else { end }
}

/// Start/end markers converted to insets from either side of the content.
fn insets(start: u32, end: u32, len: u32) -> (i32, i32) {
    (start as i32 - 1, len as i32 - 2 - (end as i32 - 1))
}

/// Stretch region from the top row and left column.
fn nine_patch_splits(image: &RgbaImage, name: &str) -> Result<Option<[i32; 4]>> {
    let (width, height) = image.dimensions();
    let start_x = split_point(image, name, 1, 0, true, true)?;
    let start_y = split_point(image, name, 0, 1, true, false)?;
    let end_x = match start_x {
        0 => 0,
        s => run_end(split_point(image, name, s, 0, false, true)?, width),
    };
    let end_y = match start_y {
        0 => 0,
        s => run_end(split_point(image, name, 0, s, false, false)?, height),
    };
    // validates the rest of each border line
    split_point(image, name, end_x + 1, 0, true, true)?;
    split_point(image, name, 0, end_y + 1, true, false)?;

    if start_x == 0 && start_y == 0 {
        return Ok(None);
    }
    // An axis without markers stretches fully.
    let (left, right) = match start_x {
        0 => (0, 0),
        s => insets(s, end_x, width),
    };
    let (top, bottom) = match start_y {
        0 => (0, 0),
        s => insets(s, end_y, height),
    };
    Ok(Some([left, right, top, bottom]))
}

/// Content padding from the bottom row and right column. Dropped when equal to
/// the splits.
fn nine_patch_pads(
    image: &RgbaImage,
    name: &str,
    splits: Option<[i32; 4]>,
) -> Result<Option<[i32; 4]>> {
    let (width, height) = image.dimensions();
    let (bottom_row, right_column) = (height - 1, width - 1);
    let start_x = split_point(image, name, 1, bottom_row, true, true)?;
    let start_y = split_point(image, name, right_column, 1, true, false)?;
    let end_x = match start_x {
        0 => 0,
        s => run_end(split_point(image, name, s + 1, bottom_row, false, true)?, width),
    };
    let end_y = match start_y {
        0 => 0,
        s => run_end(split_point(image, name, right_column, s + 1, false, false)?, height),
    };
    split_point(image, name, end_x + 1, bottom_row, true, true)?;
    split_point(image, name, right_column, end_y + 1, true, false)?;

    if start_x == 0 && start_y == 0 {
        return Ok(None);
    }
    let (left, right) = match start_x {
        0 => (-1, -1),
        s => insets(s, end_x, width),
    };
    let (top, bottom) = match start_y {
        0 => (-1, -1),
        s => insets(s, end_y, height),
    };
    let pads = [left, right, top, bottom];
    if splits == Some(pads) {
        return Ok(None);
    }
    Ok(Some(pads))
}

/// Largest delay that divides every delay to within `max_error`.
fn float_gcd(values: &[f32], max_error: f32) -> f32 {
    let tolerance = max_error.max(f32::EPSILON);
    let gcd = |mut a: f32, mut b: f32| {
        while b > tolerance {
            (a, b) = (b, a % b);
            // a remainder close to b divides it as well
            if a - b <= tolerance {
                b = 0.0;
            }
        }
        a
    };
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .reduce(gcd)
        .unwrap_or(0.0)
}
