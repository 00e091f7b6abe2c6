use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, SpritePackerError};

/// Resampling filter used when a scale variant is not `1.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    Nearest,
    Bilinear,
    Bicubic,
}

impl Resampling {
    pub fn filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::Bicubic => FilterType::CatmullRom,
        }
    }
}

impl FromStr for Resampling {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            _ => Err(()),
        }
    }
}

/// Packing settings shared by the image processor and both packers.
///
/// Padding is applied to the right/top of every rect; `edge_padding` additionally
/// reserves it around the page border.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Round page dimensions up to a power of two.
    pub pot: bool,
    /// Round page dimensions up to a multiple of four.
    pub multiple_of_four: bool,
    pub padding_x: u32,
    pub padding_y: u32,
    /// Reserve padding along the page edges as well as between rects.
    pub edge_padding: bool,
    /// Padding is later filled with copies of edge pixels instead of transparency.
    pub duplicate_padding: bool,
    /// Allow 90° rotation of rects that permit it.
    pub rotation: bool,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Force square pages.
    pub square: bool,
    /// Trim fully transparent columns (left/right).
    pub strip_whitespace_x: bool,
    /// Trim fully transparent rows (top/bottom).
    pub strip_whitespace_y: bool,
    /// Pixels with alpha at or below this value count as whitespace.
    pub alpha_threshold: u8,
    /// Collapse images with identical pixels into one rect plus aliases.
    pub alias: bool,
    pub ignore_blank_images: bool,
    /// Greedy single-pass placement instead of the exhaustive best-rect search.
    pub fast: bool,
    /// Split a trailing `_<digits>` off image names into the rect index.
    pub use_indexes: bool,
    /// Use the uniform grid packer instead of MaxRects.
    pub grid: bool,
    /// Output scale variants, each packed independently.
    pub scale: Vec<f32>,
    /// Resampling filter per scale variant; missing entries use bicubic.
    pub scale_resampling: Vec<Resampling>,
    /// Tolerance (seconds) when computing a common delay for animation frames.
    pub max_animation_delay_error: f32,
    /// Pack scale variants concurrently (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pot: true,
            multiple_of_four: false,
            padding_x: 2,
            padding_y: 2,
            edge_padding: true,
            duplicate_padding: false,
            rotation: false,
            min_width: 16,
            min_height: 16,
            max_width: 1024,
            max_height: 1024,
            square: false,
            strip_whitespace_x: false,
            strip_whitespace_y: false,
            alpha_threshold: 0,
            alias: true,
            ignore_blank_images: true,
            fast: false,
            use_indexes: true,
            grid: false,
            scale: vec![1.0],
            scale_resampling: vec![Resampling::Bicubic],
            max_animation_delay_error: 0.1,
            parallel: false,
        }
    }
}

impl Settings {
    /// Validates the settings.
    ///
    /// Returns an error if:
    /// - a maximum dimension is zero
    /// - `pot` is set and a maximum dimension is not a power of two
    /// - `multiple_of_four` is set and a maximum dimension is not a multiple of four
    /// - a minimum dimension exceeds its maximum
    /// - edge padding would leave no usable space
    /// - the scale list is empty, or holds a non-finite or non-positive value
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(SpritePackerError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        if self.pot {
            if !self.max_width.is_power_of_two() {
                return Err(SpritePackerError::InvalidConfig(format!(
                    "If pot is true, max_width must be a power of two: {}",
                    self.max_width
                )));
            }
            if !self.max_height.is_power_of_two() {
                return Err(SpritePackerError::InvalidConfig(format!(
                    "If pot is true, max_height must be a power of two: {}",
                    self.max_height
                )));
            }
        }

        if self.multiple_of_four && (self.max_width % 4 != 0 || self.max_height % 4 != 0) {
            return Err(SpritePackerError::InvalidConfig(format!(
                "If multiple_of_four is true, max dimensions must be multiples of four: {}x{}",
                self.max_width, self.max_height
            )));
        }

        if self.min_width > self.max_width {
            return Err(SpritePackerError::InvalidConfig(format!(
                "Page min width cannot be higher than max width: {} > {}",
                self.min_width, self.max_width
            )));
        }
        if self.min_height > self.max_height {
            return Err(SpritePackerError::InvalidConfig(format!(
                "Page min height cannot be higher than max height: {} > {}",
                self.min_height, self.max_height
            )));
        }

        if self.edge_padding {
            let (edge_x, edge_y) = self.edge_reserve();
            if edge_x >= self.max_width || edge_y >= self.max_height {
                return Err(SpritePackerError::InvalidConfig(format!(
                    "edge padding ({}, {}) leaves no usable space in {}x{}",
                    self.padding_x, self.padding_y, self.max_width, self.max_height
                )));
            }
        }

        if self.scale.is_empty() {
            return Err(SpritePackerError::InvalidConfig(
                "at least one scale is required".into(),
            ));
        }
        if let Some(&bad) = self.scale.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(SpritePackerError::InvalidScale(bad));
        }
        if self.scale_resampling.len() > self.scale.len() {
            return Err(SpritePackerError::InvalidConfig(format!(
                "scale_resampling has {} entries but only {} scales are configured",
                self.scale_resampling.len(),
                self.scale.len()
            )));
        }

        Ok(())
    }

    /// Space taken from the maximum page size by edge padding, per axis.
    pub(crate) fn edge_reserve(&self) -> (u32, u32) {
        if !self.edge_padding {
            return (0, 0);
        }
        if self.duplicate_padding {
            (self.padding_x, self.padding_y)
        } else {
            (self.padding_x * 2, self.padding_y * 2)
        }
    }

    pub fn resampling_for(&self, scale_index: usize) -> Resampling {
        self.scale_resampling
            .get(scale_index)
            .copied()
            .unwrap_or(Resampling::Bicubic)
    }

    /// Create a fluent builder for `Settings`.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }
}

/// Builder for `Settings` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.settings.max_width = w;
        self.settings.max_height = h;
        self
    }
    pub fn with_min_dimensions(mut self, w: u32, h: u32) -> Self {
        self.settings.min_width = w;
        self.settings.min_height = h;
        self
    }
    pub fn padding(mut self, x: u32, y: u32) -> Self {
        self.settings.padding_x = x;
        self.settings.padding_y = y;
        self
    }
    pub fn edge_padding(mut self, v: bool) -> Self {
        self.settings.edge_padding = v;
        self
    }
    pub fn duplicate_padding(mut self, v: bool) -> Self {
        self.settings.duplicate_padding = v;
        self
    }
    pub fn rotation(mut self, v: bool) -> Self {
        self.settings.rotation = v;
        self
    }
    pub fn pot(mut self, v: bool) -> Self {
        self.settings.pot = v;
        self
    }
    pub fn multiple_of_four(mut self, v: bool) -> Self {
        self.settings.multiple_of_four = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.settings.square = v;
        self
    }
    pub fn fast(mut self, v: bool) -> Self {
        self.settings.fast = v;
        self
    }
    pub fn strip_whitespace(mut self, x: bool, y: bool) -> Self {
        self.settings.strip_whitespace_x = x;
        self.settings.strip_whitespace_y = y;
        self
    }
    pub fn alpha_threshold(mut self, v: u8) -> Self {
        self.settings.alpha_threshold = v;
        self
    }
    pub fn alias(mut self, v: bool) -> Self {
        self.settings.alias = v;
        self
    }
    pub fn ignore_blank_images(mut self, v: bool) -> Self {
        self.settings.ignore_blank_images = v;
        self
    }
    pub fn use_indexes(mut self, v: bool) -> Self {
        self.settings.use_indexes = v;
        self
    }
    pub fn grid(mut self, v: bool) -> Self {
        self.settings.grid = v;
        self
    }
    pub fn scales(mut self, scale: Vec<f32>, resampling: Vec<Resampling>) -> Self {
        self.settings.scale = scale;
        self.settings.scale_resampling = resampling;
        self
    }
    pub fn max_animation_delay_error(mut self, v: f32) -> Self {
        self.settings.max_animation_delay_error = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.settings.parallel = v;
        self
    }
    pub fn build(self) -> Settings {
        self.settings
    }
}
