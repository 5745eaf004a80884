use core::slice;

use crate::{
    copy::{copy, copy_words},
    error::Error,
    video::{ColorFormat, PixelBuffer},
};

/// Display-side pixel memory with an explicit row pitch and pixel format.
///
/// Storage is a word array, so the start is 4-byte aligned and the byte length is
/// padded up to a whole word. Row copies through [`crate::copy::copy`] may therefore
/// read and write back the half-word neighbours of a row.
#[derive(Debug, Clone)]
pub struct Surface {
    width: usize,
    height: usize,
    pitch: usize,
    format: ColorFormat,
    words: Box<[u32]>,
}

impl Surface {
    /// Creates a surface with tightly packed rows.
    pub fn new(width: usize, height: usize, format: ColorFormat) -> Result<Self, Error> {
        Self::with_pitch(width, height, width * format.bytes_per_pixel(), format)
    }

    /// Creates a surface whose rows are `pitch` bytes apart.
    pub fn with_pitch(
        width: usize,
        height: usize,
        pitch: usize,
        format: ColorFormat,
    ) -> Result<Self, Error> {
        let bytes_per_pixel = format.bytes_per_pixel();
        if width == 0 || height == 0 || pitch < width * bytes_per_pixel {
            return Err(Error::SurfaceGeometry {
                width,
                height,
                pitch,
                bytes_per_pixel,
            });
        }
        let words = (pitch * height).div_ceil(4);
        Ok(Self {
            width,
            height,
            pitch,
            format,
            words: vec![0; words].into_boxed_slice(),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row, including padding.
    #[inline]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// Size of the visible area in bytes (`pitch * height`).
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.pitch * self.height
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        // SAFETY: `words` covers at least `len_bytes` bytes and u8 has no alignment needs.
        unsafe { slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len_bytes()) }
    }

    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len_bytes();
        // SAFETY: as in `bytes`, with exclusive access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), len) }
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.pitch;
        &self.bytes()[start..start + self.width * self.format.bytes_per_pixel()]
    }

    /// Writes a single pixel at `(x, y)`, packed according to the surface format.
    ///
    /// # Panics
    ///
    /// When `(x, y)` lies outside the visible area, row padding included.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        self.check_bounds(x, y);
        let format = self.format;
        let idx = y * self.pitch + x * format.bytes_per_pixel();
        format.encode(color, &mut self.bytes_mut()[idx..]);
    }

    /// Reads the pixel at `(x, y)` back as `0x00RRGGBB`.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.check_bounds(x, y);
        let idx = y * self.pitch + x * self.format.bytes_per_pixel();
        self.format.decode(&self.bytes()[idx..])
    }

    #[inline]
    fn check_bounds(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} surface",
            self.width,
            self.height
        );
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Transfers a whole frame into the surface.
    ///
    /// - tightly packed 32-bit surface: one word copy of the full frame
    /// - padded 32-bit surface: one [`copy`] per row
    /// - 16/24-bit surface: per-pixel conversion
    ///
    /// Padding bytes between rows are never modified.
    pub fn bulk_write(&mut self, frame: &PixelBuffer) -> Result<(), Error> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::BufferSizeMismatch {
                width: self.width,
                height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        match self.format {
            ColorFormat::Xrgb8888 if self.pitch == self.width * 4 => {
                let count = frame.len();
                copy_words(&mut self.words[..count], frame.pixels());
            }
            ColorFormat::Xrgb8888 => {
                let row_bytes = self.width * 4;
                let base = self.words.as_mut_ptr().cast::<u8>();
                for y in 0..self.height {
                    let src = frame.row(y);
                    // SAFETY: the row lies inside `words`, which starts word-aligned and
                    // ends on a word boundary, so the half-word neighbours `copy` may touch
                    // are in bounds. `frame` is a separate allocation.
                    unsafe { copy(base.add(y * self.pitch), src.as_ptr().cast::<u8>(), row_bytes) };
                }
            }
            format => {
                let bpp = format.bytes_per_pixel();
                let pitch = self.pitch;
                let bytes = self.bytes_mut();
                for y in 0..frame.height() {
                    let row = &mut bytes[y * pitch..];
                    for (x, &color) in frame.row(y).iter().enumerate() {
                        format.encode(color, &mut row[x * bpp..]);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> PixelBuffer {
        let mut frame = PixelBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                frame.set(x, y, ((x * 13) as u32 & 0xFF) << 16 | ((y * 29) as u32 & 0xFF) << 8 | 0x40);
            }
        }
        frame
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(Surface::new(0, 10, ColorFormat::Rgb565).is_err());
        assert!(Surface::with_pitch(10, 10, 19, ColorFormat::Rgb565).is_err());
        assert!(Surface::with_pitch(10, 10, 20, ColorFormat::Rgb565).is_ok());
    }

    #[test]
    fn packed_xrgb_surface_matches_frame() {
        let frame = gradient(17, 9);
        let mut surface = Surface::new(17, 9, ColorFormat::Xrgb8888).expect("geometry");
        surface.bulk_write(&frame).expect("same size");
        for y in 0..9 {
            for x in 0..17 {
                assert_eq!(surface.pixel(x, y), frame.get(x, y));
            }
        }
    }

    #[test]
    fn padded_rows_leave_padding_untouched() {
        // An odd pitch forces every other row onto an unaligned start.
        for pitch in [17 * 4 + 1, 17 * 4 + 2, 17 * 4 + 4, 17 * 4 + 7] {
            let frame = gradient(17, 6);
            let mut surface =
                Surface::with_pitch(17, 6, pitch, ColorFormat::Xrgb8888).expect("geometry");
            surface.bytes_mut().fill(0xEE);
            surface.bulk_write(&frame).expect("same size");
            for y in 0..6 {
                let row = &surface.bytes()[y * pitch..];
                for x in 0..17 {
                    let px = [row[x * 4], row[x * 4 + 1], row[x * 4 + 2], row[x * 4 + 3]];
                    assert_eq!(u32::from_ne_bytes(px), frame.get(x, y), "pitch={pitch}");
                }
                assert!(
                    row[17 * 4..pitch].iter().all(|&b| b == 0xEE),
                    "padding changed (pitch={pitch}, row {y})"
                );
            }
        }
    }

    #[test]
    fn narrow_formats_go_through_per_pixel_stores() {
        let frame = gradient(8, 4);
        for format in [ColorFormat::Rgb555, ColorFormat::Rgb565, ColorFormat::Rgb888] {
            let mut via_bulk = Surface::with_pitch(8, 4, 32, format).expect("geometry");
            let mut via_pixel = via_bulk.clone();
            via_bulk.bulk_write(&frame).expect("same size");
            for y in 0..4 {
                for x in 0..8 {
                    via_pixel.set_pixel(x, y, frame.get(x, y));
                }
            }
            assert_eq!(via_bulk.bytes(), via_pixel.bytes(), "{format:?}");
        }
    }

    #[test]
    #[should_panic(expected = "outside 8x4 surface")]
    fn set_pixel_refuses_row_padding() {
        let mut surface = Surface::with_pitch(8, 4, 48, ColorFormat::Xrgb8888).expect("geometry");
        // Column 8 still fits inside the 48-byte pitch.
        surface.set_pixel(8, 0, 0x00_FF_FF_FF);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let mut surface = Surface::new(4, 4, ColorFormat::Xrgb8888).expect("geometry");
        let err = surface.bulk_write(&PixelBuffer::new(4, 3)).unwrap_err();
        assert_eq!(
            err,
            Error::BufferSizeMismatch {
                width: 4,
                height: 4,
                actual_width: 4,
                actual_height: 3,
            }
        );
    }
}
