use std::{fs, path::Path};

use thiserror::Error;

pub const PALETTE_ENTRIES: usize = 64;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("failed to load palette: {path}: {error}")]
    Load { path: String, error: std::io::Error },
    #[error("palette files must be 192 or 256 bytes (got {actual})")]
    InvalidSize { actual: usize },
}

/// 64-entry color table, `0x00RRGGBB` per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [u32; PALETTE_ENTRIES],
}

impl Palette {
    /// Parse a raw palette blob: 64 RGB triples (192 bytes) or 64 RGBA quads
    /// (256 bytes, alpha ignored).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PaletteError> {
        let stride = match bytes.len() {
            192 => 3,
            256 => 4,
            actual => return Err(PaletteError::InvalidSize { actual }),
        };
        let mut colors = [0; PALETTE_ENTRIES];
        for (color, entry) in colors.iter_mut().zip(bytes.chunks_exact(stride)) {
            *color = (u32::from(entry[0]) << 16) | (u32::from(entry[1]) << 8) | u32::from(entry[2]);
        }
        Ok(Self { colors })
    }

    pub fn load(path: &Path) -> Result<Self, PaletteError> {
        let bytes = fs::read(path).map_err(|error| PaletteError::Load {
            path: path.display().to_string(),
            error,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Color for `index`; only the low six bits are used.
    #[inline]
    pub fn color(&self, index: u8) -> u32 {
        self.colors[usize::from(index) % PALETTE_ENTRIES]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS,
        }
    }
}

#[rustfmt::skip]
const DEFAULT_COLORS: [u32; PALETTE_ENTRIES] = [
    0x7C7C7C, 0x0000FC, 0x0000BC, 0x4428BC, 0x940084, 0xA80020, 0xA81000, 0x881400,
    0x503000, 0x007800, 0x006800, 0x005800, 0x004058, 0x000000, 0x000000, 0x000000,
    0xBCBCBC, 0x0078F8, 0x0058F8, 0x6844FC, 0xD800CC, 0xE40058, 0xF83800, 0xE45C10,
    0xAC7C00, 0x00B800, 0x00A800, 0x00A844, 0x008888, 0x000000, 0x000000, 0x000000,
    0xF8F8F8, 0x3CBCFC, 0x6888FC, 0x9878F8, 0xF878F8, 0xF85898, 0xF87858, 0xFCA044,
    0xF8B800, 0xB8F818, 0x58D854, 0x58F898, 0x00E8D8, 0x787878, 0x000000, 0x000000,
    0xFCFCFC, 0xA4E4FC, 0xB8B8F8, 0xD8B8F8, 0xF8B8F8, 0xF8A4C0, 0xF0D0B0, 0xFCE0A8,
    0xF8D878, 0xD8F878, 0xB8F8B8, 0xB8F8D8, 0x00FCFC, 0xF8D8F8, 0x000000, 0x000000,
];
