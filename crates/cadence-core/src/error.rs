use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("frame rate must be a positive, finite number of frames per second (got {fps})")]
    InvalidFrameRate { fps: f64 },

    #[error("frame duration must be non-zero")]
    ZeroFrameDuration,

    #[error(
        "invalid surface geometry: {width}x{height} with pitch {pitch} bytes \
         ({bytes_per_pixel} bytes per pixel)"
    )]
    SurfaceGeometry {
        width: usize,
        height: usize,
        pitch: usize,
        bytes_per_pixel: usize,
    },

    #[error("pixel buffer is {actual_width}x{actual_height}, surface expects {width}x{height}")]
    BufferSizeMismatch {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
}
