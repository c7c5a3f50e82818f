//! Shared test utilities for the headshot test suite.
//!
//! Builds small in-memory images so unit tests never need fixture files.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let image = split_image(40, 20, [0, 0, 0, 255], [255, 255, 255, 255]);
//! let upload = png_upload("me.png", &image);
//! ```

use crate::imaging::RasterImage;
use crate::upload::Upload;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Image filled with one color.
pub fn solid_image(width: u32, height: u32, color: [u8; 4]) -> RasterImage {
    RasterImage::new(RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
}

/// Image whose left half (`x < width / 2`) is `left` and the rest `right`.
pub fn split_image(width: u32, height: u32, left: [u8; 4], right: [u8; 4]) -> RasterImage {
    let pixels = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 { Rgba(left) } else { Rgba(right) }
    });
    RasterImage::new(pixels).unwrap()
}

/// PNG-encode an image.
pub fn png_bytes(image: &RasterImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .pixels()
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// A valid PNG upload of `image`.
pub fn png_upload(name: &str, image: &RasterImage) -> Upload {
    Upload::new(name, "image/png", png_bytes(image))
}
