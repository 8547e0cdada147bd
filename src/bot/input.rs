//! Mouse input for playing moves.
//!
//! The game only reacts to hardware-level input, so clicks are sent with
//! `SendInput` using absolute screen coordinates. This moves the real cursor.

use anyhow::Result;

/// Moves the pointer and clicks.
pub trait Actuator {
    /// Moves the pointer to an absolute screen position.
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    /// Presses and releases the primary button at the current position.
    fn click(&mut self) -> Result<()>;
}

#[cfg(windows)]
pub use platform::{escape_pressed, SendInputActuator};

#[cfg(windows)]
mod platform {
    use anyhow::{anyhow, Result};
    use std::time::Duration;

    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE,
        MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEINPUT, MOUSE_EVENT_FLAGS,
        VK_ESCAPE,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    use super::Actuator;

    /// Pause between button down and up.
    const CLICK_HOLD: Duration = Duration::from_millis(30);

    /// Clicks through `SendInput`.
    #[derive(Default)]
    pub struct SendInputActuator {
        /// Last position in normalized 0-65535 coordinates
        position: (i32, i32),
    }

    impl SendInputActuator {
        pub fn new() -> Self {
            Self::default()
        }

        fn send(&self, flags: MOUSE_EVENT_FLAGS) -> Result<()> {
            let (dx, dy) = self.position;
            let input = INPUT {
                r#type: INPUT_MOUSE,
                Anonymous: INPUT_0 {
                    mi: MOUSEINPUT {
                        dx,
                        dy,
                        dwFlags: flags | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
                        ..Default::default()
                    },
                },
            };

            let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
            if sent != 1 {
                return Err(anyhow!("SendInput rejected mouse event {:?}", flags));
            }
            Ok(())
        }
    }

    impl Actuator for SendInputActuator {
        fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
            let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
            let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
            if screen_width <= 0 || screen_height <= 0 {
                return Err(anyhow!("Failed to read screen size"));
            }

            // Normalize to 0-65535 range (required by MOUSEEVENTF_ABSOLUTE)
            let norm_x = ((x as i64 * 65535) / screen_width as i64) as i32;
            let norm_y = ((y as i64 * 65535) / screen_height as i64) as i32;
            self.position = (norm_x, norm_y);

            self.send(MOUSE_EVENT_FLAGS(0))
        }

        fn click(&mut self) -> Result<()> {
            self.send(MOUSEEVENTF_LEFTDOWN)?;
            std::thread::sleep(CLICK_HOLD);
            self.send(MOUSEEVENTF_LEFTUP)
        }
    }

    /// Returns true while the Escape key is held down.
    pub fn escape_pressed() -> bool {
        let state = unsafe { GetAsyncKeyState(VK_ESCAPE.0 as i32) };
        (state as u16 & 0x8000) != 0
    }
}
