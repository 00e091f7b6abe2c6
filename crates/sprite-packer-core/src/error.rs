use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpritePackerError {
    #[error("Invalid page dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid settings: {0}")]
    InvalidConfig(String),
    #[error("Scale must be finite and greater than zero: {0}")]
    InvalidScale(f32),
    #[error(
        "Invalid {name} ninepatch split pixel at {x}, {y}, rgba: {}, {}, {}, {}",
        rgba[0], rgba[1], rgba[2], rgba[3]
    )]
    InvalidNinePatch {
        name: String,
        x: u32,
        y: u32,
        rgba: [u8; 4],
    },
    #[error("Ninepatch {name} is too small to hold a split border: {width}x{height}")]
    NinePatchTooSmall { name: String, width: u32, height: u32 },
    #[error("Image does not fit within {limit}: {name} {width}x{height}")]
    ImageTooLarge {
        name: String,
        width: u32,
        height: u32,
        limit: String,
    },
    #[error("No rectangle could be placed on a maximum size page")]
    OutOfSpace,
}

pub type Result<T> = std::result::Result<T, SpritePackerError>;
