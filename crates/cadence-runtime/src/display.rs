use thiserror::Error;

use cadence_core::video::Surface;

#[derive(Error, Debug)]
#[error("{message}")]
pub struct DisplayError {
    message: String,
}

impl DisplayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where transferred frames are shown.
///
/// `present` is called on the loop thread once per frame, after that frame's
/// transfer into `surface` has completed.
pub trait Display {
    fn present(&mut self, surface: &Surface) -> Result<(), DisplayError>;
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn present(&mut self, surface: &Surface) -> Result<(), DisplayError> {
        (**self).present(surface)
    }
}

/// Display with no output device. Counts frames and can keep a copy of the last one.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    presented: u64,
    keep_last: bool,
    last: Option<Surface>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a copy of every presented surface, replacing the previous one.
    pub fn keeping_last_frame() -> Self {
        Self {
            keep_last: true,
            ..Self::default()
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&Surface> {
        self.last.as_ref()
    }
}

impl Display for HeadlessDisplay {
    fn present(&mut self, surface: &Surface) -> Result<(), DisplayError> {
        self.presented += 1;
        if self.keep_last {
            match &mut self.last {
                Some(last) if same_geometry(last, surface) => {
                    last.bytes_mut().copy_from_slice(surface.bytes());
                }
                slot => *slot = Some(surface.clone()),
            }
        }
        Ok(())
    }
}

fn same_geometry(a: &Surface, b: &Surface) -> bool {
    a.width() == b.width()
        && a.height() == b.height()
        && a.pitch() == b.pitch()
        && a.format() == b.format()
}

#[cfg(test)]
mod tests {
    use cadence_core::video::ColorFormat;

    use super::*;

    #[test]
    fn keeps_a_copy_of_the_latest_frame() {
        let mut display = HeadlessDisplay::keeping_last_frame();
        let mut surface = Surface::new(4, 2, ColorFormat::Xrgb8888).expect("geometry");

        surface.set_pixel(1, 1, 0x00_12_34_56);
        display.present(&surface).expect("present");
        surface.set_pixel(1, 1, 0x00_65_43_21);
        display.present(&surface).expect("present");

        assert_eq!(display.presented(), 2);
        let last = display.last_frame().expect("kept");
        assert_eq!(last.pixel(1, 1), 0x00_65_43_21);
    }

    #[test]
    fn plain_headless_display_only_counts() {
        let mut display = HeadlessDisplay::new();
        let surface = Surface::new(2, 2, ColorFormat::Rgb565).expect("geometry");
        display.present(&surface).expect("present");
        assert_eq!(display.presented(), 1);
        assert!(display.last_frame().is_none());
    }
}
