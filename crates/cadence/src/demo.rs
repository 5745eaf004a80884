//! A small engine that gives the loop something to drive: a scrolling tile field
//! derived from the ROM image, a cursor moved by the d-pad and a tone gated by A.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use cadence_core::{
    controller::{Button, ControllerState},
    video::PixelBuffer,
};
use cadence_runtime::{AudioSource, Engine};

use crate::palette::Palette;

const TILE: usize = 8;
const CURSOR_SPEED: usize = 2;
const CURSOR_COLOR: u8 = 0x30;
const TONE_HZ: u32 = 440;
const TONE_AMPLITUDE: i8 = 24;

/// Tile pattern used when no ROM image is configured.
pub fn builtin_rom() -> Vec<u8> {
    (0..1024u32).map(|i| (i.wrapping_mul(37) ^ (i >> 3)) as u8).collect()
}

pub struct DemoEngine {
    rom: Vec<u8>,
    palette: Palette,
    width: usize,
    height: usize,
    scroll: usize,
    cursor: (usize, usize),
    paused: bool,
    start_held: bool,
    tone: Arc<AtomicBool>,
    tone_source: Option<ToneSource>,
}

impl DemoEngine {
    pub fn new(rom: Vec<u8>, palette: Palette, width: usize, height: usize) -> Self {
        let rom = if rom.is_empty() { builtin_rom() } else { rom };
        let tone = Arc::new(AtomicBool::new(false));
        Self {
            rom,
            palette,
            width,
            height,
            scroll: 0,
            cursor: (width / 2, height / 2),
            paused: false,
            start_held: false,
            tone: tone.clone(),
            tone_source: Some(ToneSource::new(tone)),
        }
    }

    fn tile_color(&self, x: usize, y: usize) -> u32 {
        let columns = self.width.div_ceil(TILE) + 1;
        let tx = (x + self.scroll) / TILE;
        let ty = y / TILE;
        let byte = self.rom[(ty * columns + tx) % self.rom.len()];
        self.palette.color(byte)
    }
}

impl Engine for DemoEngine {
    fn reset(&mut self) {
        self.scroll = 0;
        self.cursor = (self.width / 2, self.height / 2);
        self.paused = false;
        self.tone.store(false, Ordering::Relaxed);
    }

    fn update(&mut self, controller: &ControllerState) {
        let start = controller.start();
        if start && !self.start_held {
            self.paused = !self.paused;
        }
        self.start_held = start;

        self.tone
            .store(!self.paused && controller.a(), Ordering::Relaxed);
        if self.paused {
            return;
        }

        let step = if controller.is_pressed(Button::B) { 2 } else { 1 };
        self.scroll = self.scroll.wrapping_add(step);

        let (mut x, mut y) = self.cursor;
        let max_x = self.width.saturating_sub(TILE);
        let max_y = self.height.saturating_sub(TILE);
        if controller.left() {
            x = x.saturating_sub(CURSOR_SPEED);
        }
        if controller.right() {
            x = (x + CURSOR_SPEED).min(max_x);
        }
        if controller.up() {
            y = y.saturating_sub(CURSOR_SPEED);
        }
        if controller.down() {
            y = (y + CURSOR_SPEED).min(max_y);
        }
        self.cursor = (x, y);
    }

    fn render(&mut self, pixels: &mut PixelBuffer) {
        let (cx, cy) = self.cursor;
        let cursor = self.palette.color(CURSOR_COLOR);
        for y in 0..pixels.height() {
            for x in 0..pixels.width() {
                let in_cursor = (cx..cx + TILE).contains(&x) && (cy..cy + TILE).contains(&y);
                let color = if in_cursor {
                    cursor
                } else {
                    self.tile_color(x, y)
                };
                pixels.set(x, y, color);
            }
        }
    }

    fn take_audio_source(&mut self) -> Option<Box<dyn AudioSource>> {
        self.tone_source
            .take()
            .map(|source| Box::new(source) as Box<dyn AudioSource>)
    }
}

/// Square wave while the gate is open, silence otherwise.
pub struct ToneSource {
    gate: Arc<AtomicBool>,
    sample_rate: u32,
    phase: u32,
}

impl ToneSource {
    fn new(gate: Arc<AtomicBool>) -> Self {
        Self {
            gate,
            sample_rate: 22_050,
            phase: 0,
        }
    }
}

impl AudioSource for ToneSource {
    fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.phase = 0;
    }

    fn fill(&mut self, out: &mut [i8]) {
        if !self.gate.load(Ordering::Relaxed) {
            out.fill(0);
            return;
        }
        let period = (self.sample_rate / TONE_HZ).max(2);
        for sample in out {
            *sample = if self.phase < period / 2 {
                TONE_AMPLITUDE
            } else {
                -TONE_AMPLITUDE
            };
            self.phase = (self.phase + 1) % period;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DemoEngine {
        DemoEngine::new(Vec::new(), Palette::default(), 64, 48)
    }

    #[test]
    fn renders_every_pixel_and_the_cursor() {
        let mut engine = engine();
        let mut pixels = PixelBuffer::new(64, 48);
        pixels.fill(0xFF00_0000);
        engine.render(&mut pixels);

        assert!(pixels.pixels().iter().all(|&p| p <= 0x00FF_FFFF));
        let (cx, cy) = engine.cursor;
        assert_eq!(pixels.get(cx, cy), Palette::default().color(CURSOR_COLOR));
    }

    #[test]
    fn dpad_moves_cursor_within_bounds() {
        let mut engine = engine();
        let mut pad = ControllerState::new();
        pad.set_button(Button::Right, true);
        for _ in 0..100 {
            engine.update(&pad);
        }
        assert_eq!(engine.cursor.0, 64 - TILE);

        pad.set_button(Button::Right, false);
        pad.set_button(Button::Up, true);
        for _ in 0..100 {
            engine.update(&pad);
        }
        assert_eq!(engine.cursor.1, 0);
    }

    #[test]
    fn start_toggles_pause_on_press_only() {
        let mut engine = engine();
        let mut pad = ControllerState::new();
        pad.set_button(Button::Start, true);
        engine.update(&pad);
        engine.update(&pad);
        assert!(engine.paused);
        let scroll = engine.scroll;

        pad.set_button(Button::Start, false);
        engine.update(&pad);
        assert_eq!(engine.scroll, scroll);

        pad.set_button(Button::Start, true);
        engine.update(&pad);
        assert!(!engine.paused);
    }

    #[test]
    fn reset_restores_the_initial_view() {
        let mut engine = engine();
        let mut pad = ControllerState::new();
        pad.set_button(Button::Left, true);
        for _ in 0..10 {
            engine.update(&pad);
        }
        engine.reset();
        assert_eq!(engine.scroll, 0);
        assert_eq!(engine.cursor, (32, 24));
    }

    #[test]
    fn tone_follows_the_a_button() {
        let mut engine = engine();
        let mut source = engine.take_audio_source().expect("tone source");
        assert!(engine.take_audio_source().is_none());
        source.prepare(22_050);

        let mut out = [1i8; 64];
        source.fill(&mut out);
        assert!(out.iter().all(|&s| s == 0));

        let mut pad = ControllerState::new();
        pad.set_button(Button::A, true);
        engine.update(&pad);
        source.fill(&mut out);
        assert!(out.contains(&TONE_AMPLITUDE));
        assert!(out.contains(&-TONE_AMPLITUDE));
    }
}
