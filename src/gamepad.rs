//! Joystick input through SDL2, enabled with the `gamepad` feature.
//!
//! Hat motion is reported the way the list expects it: `y = 1` is up,
//! `x = 1` is right.

use crate::nav::Input;
use anyhow::Result;

#[cfg(feature = "gamepad")]
pub use sdl_backend::Gamepad;

#[cfg(not(feature = "gamepad"))]
pub use disabled::Gamepad;

#[cfg(feature = "gamepad")]
mod sdl_backend {
    use super::*;
    use anyhow::anyhow;
    use sdl2::{event::Event, joystick::HatState};

    pub struct Gamepad {
        _sdl: sdl2::Sdl,
        _subsystem: sdl2::JoystickSubsystem,
        joystick: sdl2::joystick::Joystick,
        events: sdl2::EventPump,
    }

    impl Gamepad {
        /// Opens the first joystick, or returns `None` when none is plugged in.
        pub fn open() -> Result<Option<Self>> {
            let sdl = sdl2::init().map_err(|err| anyhow!("init SDL: {err}"))?;
            let subsystem = sdl
                .joystick()
                .map_err(|err| anyhow!("init joystick subsystem: {err}"))?;
            let count = subsystem
                .num_joysticks()
                .map_err(|err| anyhow!("count joysticks: {err}"))?;
            if count == 0 {
                return Ok(None);
            }
            let joystick = subsystem
                .open(0)
                .map_err(|err| anyhow!("open joystick 0: {err}"))?;
            let events = sdl
                .event_pump()
                .map_err(|err| anyhow!("open SDL event pump: {err}"))?;
            Ok(Some(Self {
                _sdl: sdl,
                _subsystem: subsystem,
                joystick,
                events,
            }))
        }

        pub fn name(&self) -> String {
            self.joystick.name()
        }

        pub fn poll(&mut self) -> Vec<Input> {
            self.events
                .poll_iter()
                .filter_map(|event| match event {
                    Event::JoyHatMotion { state, .. } => {
                        let (x, y) = hat_vector(state);
                        Some(Input::Hat { x, y })
                    }
                    Event::JoyButtonDown { button_idx, .. } => Some(Input::Button(button_idx)),
                    _ => None,
                })
                .collect()
        }
    }

    pub(super) fn hat_vector(state: HatState) -> (i8, i8) {
        match state {
            HatState::Centered => (0, 0),
            HatState::Up => (0, 1),
            HatState::Down => (0, -1),
            HatState::Left => (-1, 0),
            HatState::Right => (1, 0),
            HatState::LeftUp => (-1, 1),
            HatState::LeftDown => (-1, -1),
            HatState::RightUp => (1, 1),
            HatState::RightDown => (1, -1),
        }
    }

}

#[cfg(not(feature = "gamepad"))]
mod disabled {
    use super::*;

    /// Built without joystick support; never constructed.
    pub enum Gamepad {}

    impl Gamepad {
        pub fn open() -> Result<Option<Self>> {
            Ok(None)
        }

        pub fn name(&self) -> String {
            match *self {}
        }

        pub fn poll(&mut self) -> Vec<Input> {
            match *self {}
        }
    }
}
