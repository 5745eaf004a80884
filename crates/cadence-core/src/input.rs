//! Once-per-frame input sampling.
//!
//! The host input subsystem is polled exactly once per frame. It reports two
//! disjoint-by-convention bitmasks, "became pressed" and "became released", in
//! its own physical key layout. [`InputSampler`] maps those edges onto the
//! abstract [`ControllerState`] through a [`KeyMap`]; buttons absent from both
//! masks keep their previous state.
//!
//! If a snapshot reports both edges for the same key, the press is applied first
//! and the release second, so the button ends the frame released.

use std::collections::VecDeque;

use bitflags::bitflags;

use crate::controller::{Button, ControllerState};

/// Physical key bits of the handheld input subsystem.
pub mod host_key {
    pub const A: u32 = 1 << 0;
    pub const B: u32 = 1 << 1;
    pub const SELECT: u32 = 1 << 2;
    pub const START: u32 = 1 << 3;
    pub const DRIGHT: u32 = 1 << 4;
    pub const DLEFT: u32 = 1 << 5;
    pub const DUP: u32 = 1 << 6;
    pub const DDOWN: u32 = 1 << 7;
    pub const R: u32 = 1 << 8;
    pub const L: u32 = 1 << 9;
    pub const X: u32 = 1 << 10;
    pub const Y: u32 = 1 << 11;
    pub const ZL: u32 = 1 << 14;
    pub const ZR: u32 = 1 << 15;
    pub const TOUCH: u32 = 1 << 20;
}

/// One poll of the host input subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    /// Keys that went down since the previous poll.
    pub pressed: u32,
    /// Keys that went up since the previous poll.
    pub released: u32,
    /// The host asked the application to close (window close, power button, ...).
    pub quit_requested: bool,
}

impl InputSnapshot {
    pub fn pressed(keys: u32) -> Self {
        Self {
            pressed: keys,
            ..Self::default()
        }
    }

    pub fn released(keys: u32) -> Self {
        Self {
            released: keys,
            ..Self::default()
        }
    }

    pub fn quit() -> Self {
        Self {
            quit_requested: true,
            ..Self::default()
        }
    }
}

/// A polling input backend.
pub trait InputSource {
    /// Capture the edges observed since the previous call.
    fn scan(&mut self) -> InputSnapshot;
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn scan(&mut self) -> InputSnapshot {
        (**self).scan()
    }
}

bitflags! {
    /// Loop-level actions bound to host keys instead of controller buttons.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SystemActions: u8 {
        const QUIT = 1 << 0;
        const RESET = 1 << 1;
    }
}

/// What a host key drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Button(Button),
    System(SystemActions),
}

/// Host key → abstract binding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    entries: Vec<(u32, Binding)>,
}

impl KeyMap {
    /// An empty map; every key is ignored.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds every bit of `keys` to `binding`, replacing earlier bindings of the same bits.
    pub fn bind(mut self, keys: u32, binding: Binding) -> Self {
        self.entries.retain_mut(|(mask, _)| {
            *mask &= !keys;
            *mask != 0
        });
        if keys != 0 {
            self.entries.push((keys, binding));
        }
        self
    }

    pub fn bind_button(self, keys: u32, button: Button) -> Self {
        self.bind(keys, Binding::Button(button))
    }

    pub fn bind_system(self, keys: u32, action: SystemActions) -> Self {
        self.bind(keys, Binding::System(action))
    }

    pub fn binding(&self, key: u32) -> Option<Binding> {
        self.entries
            .iter()
            .find(|(mask, _)| mask & key != 0)
            .map(|&(_, binding)| binding)
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, Binding)> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for KeyMap {
    /// The handheld's native layout: face buttons, d-pad and shoulders map to their
    /// namesakes. No system actions are bound.
    fn default() -> Self {
        Self::empty()
            .bind_button(host_key::A, Button::A)
            .bind_button(host_key::B, Button::B)
            .bind_button(host_key::SELECT, Button::Select)
            .bind_button(host_key::START, Button::Start)
            .bind_button(host_key::DRIGHT, Button::Right)
            .bind_button(host_key::DLEFT, Button::Left)
            .bind_button(host_key::DUP, Button::Up)
            .bind_button(host_key::DDOWN, Button::Down)
            .bind_button(host_key::L, Button::L)
            .bind_button(host_key::R, Button::R)
            .bind_button(host_key::X, Button::X)
            .bind_button(host_key::Y, Button::Y)
    }
}

/// Applies one snapshot to `state` and returns the system actions whose keys went down.
pub fn apply_snapshot(
    map: &KeyMap,
    snapshot: InputSnapshot,
    state: &mut ControllerState,
) -> SystemActions {
    let mut actions = SystemActions::empty();
    if snapshot.quit_requested {
        actions |= SystemActions::QUIT;
    }

    for (mask, binding) in map.entries() {
        let down = snapshot.pressed & mask != 0;
        let up = snapshot.released & mask != 0;
        match binding {
            Binding::Button(button) => {
                if down {
                    state.set_button(button, true);
                }
                if up {
                    state.set_button(button, false);
                }
            }
            Binding::System(action) => {
                if down {
                    actions |= action;
                }
            }
        }
    }

    actions
}

/// Polls an [`InputSource`] and folds its edges into a [`ControllerState`].
pub struct InputSampler<S> {
    source: S,
    map: KeyMap,
}

impl<S: InputSource> InputSampler<S> {
    pub fn new(source: S, map: KeyMap) -> Self {
        Self { source, map }
    }

    /// Poll once and apply the edges. Call exactly once per frame.
    pub fn sample(&mut self, state: &mut ControllerState) -> SystemActions {
        let snapshot = self.source.scan();
        apply_snapshot(&self.map, snapshot, state)
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.map
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// Derives edges from a level-triggered key mask for backends that only report
/// which keys are currently held.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    previous: u32,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current held mask, get back the edges since the last call.
    pub fn update(&mut self, held: u32) -> InputSnapshot {
        let changed = held ^ self.previous;
        self.previous = held;
        InputSnapshot {
            pressed: changed & held,
            released: changed & !held,
            quit_requested: false,
        }
    }
}

/// Input source that never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInput;

impl InputSource for NullInput {
    fn scan(&mut self) -> InputSnapshot {
        InputSnapshot::default()
    }
}

/// Replays a fixed sequence of snapshots, then reports nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputSnapshot>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, snapshot: InputSnapshot) {
        self.frames.push_back(snapshot);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn scan(&mut self) -> InputSnapshot {
        self.frames.pop_front().unwrap_or_default()
    }
}
