//! SDL2 window, keyboard input and present.

use anyhow::{Result, anyhow};
use sdl2::{
    EventPump,
    event::Event,
    keyboard::Keycode,
    pixels::PixelFormatEnum,
    render::{Texture, WindowCanvas},
};

use cadence_core::{
    input::{InputSnapshot, InputSource, host_key},
    video::{ColorFormat, Surface},
};
use cadence_runtime::{Display, DisplayError, LoopStats, Runner};

use crate::{config::Configuration, demo::DemoEngine};

/// Host keys are reported in the handheld's bit layout so the same key map serves
/// every backend. Escape and R reach the loop as ZR (quit) and ZL (reset).
fn map_key(key: Keycode) -> u32 {
    match key {
        Keycode::Z => host_key::A,
        Keycode::X => host_key::B,
        Keycode::Return => host_key::START,
        Keycode::RShift | Keycode::LCtrl | Keycode::RCtrl => host_key::SELECT,
        Keycode::Up => host_key::DUP,
        Keycode::Down => host_key::DDOWN,
        Keycode::Left => host_key::DLEFT,
        Keycode::Right => host_key::DRIGHT,
        Keycode::A => host_key::L,
        Keycode::S => host_key::R,
        Keycode::Q => host_key::X,
        Keycode::W => host_key::Y,
        Keycode::R => host_key::ZL,
        Keycode::Escape => host_key::ZR,
        _ => 0,
    }
}

struct SdlInput {
    events: EventPump,
}

impl InputSource for SdlInput {
    fn scan(&mut self) -> InputSnapshot {
        let mut snapshot = InputSnapshot::default();
        for event in self.events.poll_iter() {
            match event {
                Event::Quit { .. } => snapshot.quit_requested = true,
                Event::KeyDown {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => snapshot.pressed |= map_key(key),
                Event::KeyUp {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => snapshot.released |= map_key(key),
                _ => {}
            }
        }
        snapshot
    }
}

struct SdlDisplay<'a> {
    canvas: WindowCanvas,
    texture: Texture<'a>,
}

impl Display for SdlDisplay<'_> {
    fn present(&mut self, surface: &Surface) -> Result<(), DisplayError> {
        self.texture
            .update(None, surface.bytes(), surface.pitch())
            .map_err(|e| DisplayError::new(format!("uploading frame to texture: {e}")))?;
        self.canvas.clear();
        self.canvas
            .copy(&self.texture, None, None)
            .map_err(|e| DisplayError::new(format!("copying texture to canvas: {e}")))?;
        self.canvas.present();
        Ok(())
    }
}

pub fn run(config: &Configuration, engine: DemoEngine, frames: Option<u64>) -> Result<LoopStats> {
    let width = u32::try_from(config.width)?;
    let height = u32::try_from(config.height)?;

    let sdl = sdl2::init().map_err(|e| anyhow!("initializing SDL2: {e}"))?;
    let video = sdl
        .video()
        .map_err(|e| anyhow!("initializing video subsystem: {e}"))?;
    let window = video
        .window(
            "Cadence",
            width * config.render_scale,
            height * config.render_scale,
        )
        .position_centered()
        .resizable()
        .build()
        .map_err(|e| anyhow!("creating SDL2 window: {e}"))?;

    let mut canvas = window.into_canvas().accelerated();
    if config.vsync {
        canvas = canvas.present_vsync();
    }
    let canvas = canvas
        .build()
        .map_err(|e| anyhow!("creating renderer: {e}"))?;
    let texture_creator = canvas.texture_creator();
    let texture = texture_creator
        // RGB888 is a native-endian 0x00RRGGBB word, the surface's Xrgb8888 layout.
        .create_texture_streaming(PixelFormatEnum::RGB888, width, height)
        .map_err(|e| anyhow!("allocating texture: {e}"))?;

    let events = sdl
        .event_pump()
        .map_err(|e| anyhow!("creating event pump: {e}"))?;

    let surface = Surface::new(config.width, config.height, ColorFormat::Xrgb8888)?;
    let mut runner = Runner::new(
        config.runtime_config(frames),
        engine,
        SdlInput { events },
        SdlDisplay { canvas, texture },
        surface,
    )?;
    Ok(runner.run()?)
}
