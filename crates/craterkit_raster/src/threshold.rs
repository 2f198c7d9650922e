//! Building rasters from images
//!
//! Terrain and sprite masks start life as RGBA images. A pixel is solid when
//! a per-channel test passes, usually "alpha above half" or "channel equals a
//! sentinel color".

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::BitRaster;

/// Alpha values strictly above this are treated as solid by [`BitRaster::from_alpha`]
pub const ALPHA_THRESHOLD: u8 = 128;

/// Color channel of an RGBA pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    #[inline]
    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

impl BitRaster {
    /// Build a raster by testing one channel of every pixel
    pub fn from_image(image: &RgbaImage, channel: Channel, predicate: impl Fn(u8) -> bool) -> Self {
        let index = channel.index();
        BitRaster::from_fn(image.width() as usize, image.height() as usize, |x, y| {
            predicate(image.get_pixel(x as u32, y as u32)[index])
        })
    }

    /// Solid wherever alpha exceeds [`ALPHA_THRESHOLD`]
    pub fn from_alpha(image: &RgbaImage) -> Self {
        Self::from_image(image, Channel::Alpha, |alpha| alpha > ALPHA_THRESHOLD)
    }

    /// Solid wherever `channel` equals `key` exactly
    pub fn from_color_key(image: &RgbaImage, channel: Channel, key: u8) -> Self {
        Self::from_image(image, channel, |value| value == key)
    }
}
