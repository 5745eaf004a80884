//! Abstract controller state handed to the simulation engine.
//!
//! The loop is the only writer; the engine receives a shared reference once per
//! frame.

use bitflags::bitflags;

/// Abstract controller buttons, independent of the host's physical layout.
///
/// The eight face/d-pad buttons mirror a classic pad; `L`, `R`, `X` and `Y` are the
/// optional shoulder/auxiliary buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
    L,
    R,
    X,
    Y,
}

impl Button {
    pub const ALL: [Button; 12] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::L,
        Button::R,
        Button::X,
        Button::Y,
    ];

    #[inline]
    pub const fn mask(self) -> Buttons {
        match self {
            Button::A => Buttons::A,
            Button::B => Buttons::B,
            Button::Select => Buttons::SELECT,
            Button::Start => Buttons::START,
            Button::Up => Buttons::UP,
            Button::Down => Buttons::DOWN,
            Button::Left => Buttons::LEFT,
            Button::Right => Buttons::RIGHT,
            Button::L => Buttons::L,
            Button::R => Buttons::R,
            Button::X => Buttons::X,
            Button::Y => Buttons::Y,
        }
    }
}

bitflags! {
    /// Bit layout backing [`ControllerState`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u16 {
        const A = 1 << 0;
        const B = 1 << 1;
        const SELECT = 1 << 2;
        const START = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const LEFT = 1 << 6;
        const RIGHT = 1 << 7;
        const L = 1 << 8;
        const R = 1 << 9;
        const X = 1 << 10;
        const Y = 1 << 11;
    }
}

/// Held/not-held state of every abstract button.
///
/// A button reads as pressed from the frame its press edge is applied until the
/// frame its release edge is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    held: Buttons,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update a button's pressed state.
    #[inline]
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.held.set(button.mask(), pressed);
    }

    #[inline]
    pub fn is_pressed(&self, button: Button) -> bool {
        self.held.contains(button.mask())
    }

    /// Raw bitmask of held buttons.
    #[inline]
    pub fn buttons(&self) -> Buttons {
        self.held
    }

    /// Releases every button, e.g. after an engine reset.
    pub fn clear(&mut self) {
        self.held = Buttons::empty();
    }

    pub fn a(&self) -> bool {
        self.is_pressed(Button::A)
    }

    pub fn b(&self) -> bool {
        self.is_pressed(Button::B)
    }

    pub fn select(&self) -> bool {
        self.is_pressed(Button::Select)
    }

    pub fn start(&self) -> bool {
        self.is_pressed(Button::Start)
    }

    pub fn up(&self) -> bool {
        self.is_pressed(Button::Up)
    }

    pub fn down(&self) -> bool {
        self.is_pressed(Button::Down)
    }

    pub fn left(&self) -> bool {
        self.is_pressed(Button::Left)
    }

    pub fn right(&self) -> bool {
        self.is_pressed(Button::Right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_buttons() {
        let mut pad = ControllerState::new();
        pad.set_button(Button::A, true);
        pad.set_button(Button::Left, true);
        assert!(pad.a());
        assert!(pad.left());
        assert!(!pad.b());
        assert_eq!(pad.buttons(), Buttons::A | Buttons::LEFT);

        pad.set_button(Button::A, false);
        assert!(!pad.a());
        assert!(pad.left());

        pad.clear();
        assert_eq!(pad.buttons(), Buttons::empty());
    }

    #[test]
    fn every_button_has_a_distinct_bit() {
        let all = Button::ALL
            .iter()
            .fold(Buttons::empty(), |acc, b| acc | b.mask());
        assert_eq!(all.bits().count_ones() as usize, Button::ALL.len());
    }
}
