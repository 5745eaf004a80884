//! Pixel data produced by the engine and the display surface it is transferred into.
//!
//! - [`PixelBuffer`]: one frame of packed `0x00RRGGBB` pixels, written by the engine
//! - [`Surface`]: the display-side memory with its own pitch and [`ColorFormat`]
//!
//! [`Surface::bulk_write`] picks the cheapest transfer the geometry allows: a straight
//! word copy, row-by-row copies through [`crate::copy`], or a per-pixel conversion.

pub mod format;
pub mod pixel_buffer;
pub mod surface;

pub use format::ColorFormat;
pub use pixel_buffer::PixelBuffer;
pub use surface::Surface;
