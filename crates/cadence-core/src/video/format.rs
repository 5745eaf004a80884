/// Describes how a `0x00RRGGBB` color is packed into surface memory.
///
/// The format controls both the number of bytes per pixel and the channel layout
/// when writing color values into a [`Surface`](super::Surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// 16-bit packed RGB using 5 bits per channel (0RRRRRGGGGGBBBBB).
    Rgb555,
    /// 16-bit packed RGB using 5/6/5 bits (RRRRRGGGGGGBBBBB).
    Rgb565,
    /// Packed 24-bit RGB, stored blue first (B, G, R in memory).
    Rgb888,
    /// 32-bit native-endian `0x00RRGGBB` words; the top byte is ignored.
    Xrgb8888,
}

impl ColorFormat {
    /// Returns the number of bytes used to represent a single pixel in this format.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorFormat::Rgb555 | ColorFormat::Rgb565 => 2,
            ColorFormat::Rgb888 => 3,
            ColorFormat::Xrgb8888 => 4,
        }
    }

    /// Store `color` at the start of `dst`, which must hold at least
    /// [`bytes_per_pixel`](Self::bytes_per_pixel) bytes.
    #[inline]
    pub fn encode(self, color: u32, dst: &mut [u8]) {
        let [b, g, r, _] = color.to_le_bytes();
        match self {
            ColorFormat::Rgb555 => {
                // 5 bits per channel: use high bits of 8-bit channels
                let packed = ((r as u16) >> 3) << 10 | ((g as u16) >> 3) << 5 | (b as u16) >> 3;
                dst[..2].copy_from_slice(&packed.to_ne_bytes());
            }
            ColorFormat::Rgb565 => {
                let packed = ((r as u16) >> 3) << 11 | ((g as u16) >> 2) << 5 | (b as u16) >> 3;
                dst[..2].copy_from_slice(&packed.to_ne_bytes());
            }
            ColorFormat::Rgb888 => {
                dst[0] = b;
                dst[1] = g;
                dst[2] = r;
            }
            ColorFormat::Xrgb8888 => {
                dst[..4].copy_from_slice(&(color & 0x00FF_FFFF).to_ne_bytes());
            }
        }
    }

    /// Read a pixel back as `0x00RRGGBB`. Channels narrower than 8 bits are widened
    /// by replicating their high bits.
    #[inline]
    pub fn decode(self, src: &[u8]) -> u32 {
        let (r, g, b) = match self {
            ColorFormat::Rgb555 => {
                let v = u16::from_ne_bytes([src[0], src[1]]);
                (
                    widen5((v >> 10) & 0x1F),
                    widen5((v >> 5) & 0x1F),
                    widen5(v & 0x1F),
                )
            }
            ColorFormat::Rgb565 => {
                let v = u16::from_ne_bytes([src[0], src[1]]);
                (
                    widen5((v >> 11) & 0x1F),
                    widen6((v >> 5) & 0x3F),
                    widen5(v & 0x1F),
                )
            }
            ColorFormat::Rgb888 => (src[2], src[1], src[0]),
            ColorFormat::Xrgb8888 => {
                let v = u32::from_ne_bytes([src[0], src[1], src[2], src[3]]);
                return v & 0x00FF_FFFF;
            }
        };
        u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)
    }
}

#[inline]
fn widen5(v: u16) -> u8 {
    ((v << 3) | (v >> 2)) as u8
}

#[inline]
fn widen6(v: u16) -> u8 {
    ((v << 2) | (v >> 4)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_survive_every_format() {
        let formats = [
            ColorFormat::Rgb555,
            ColorFormat::Rgb565,
            ColorFormat::Rgb888,
            ColorFormat::Xrgb8888,
        ];
        for format in formats {
            for color in [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0x00FF_FFFF, 0] {
                let mut px = [0u8; 4];
                format.encode(color, &mut px);
                assert_eq!(format.decode(&px), color, "{format:?} {color:#08x}");
            }
        }
    }

    #[test]
    fn rgb565_bit_layout() {
        let mut px = [0u8; 2];
        ColorFormat::Rgb565.encode(0x00F8_FC00, &mut px);
        assert_eq!(u16::from_ne_bytes(px), 0xFFE0);
        ColorFormat::Rgb555.encode(0x0000_00F8, &mut px);
        assert_eq!(u16::from_ne_bytes(px), 0x001F);
    }

    #[test]
    fn rgb888_is_stored_blue_first() {
        let mut px = [0u8; 3];
        ColorFormat::Rgb888.encode(0x0012_3456, &mut px);
        assert_eq!(px, [0x56, 0x34, 0x12]);
    }

    #[test]
    fn xrgb_ignores_the_top_byte() {
        let mut px = [0u8; 4];
        ColorFormat::Xrgb8888.encode(0xAB12_3456, &mut px);
        assert_eq!(ColorFormat::Xrgb8888.decode(&px), 0x0012_3456);
    }
}
