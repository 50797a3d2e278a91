//! Pointer input for camera parallax.
//!
//! The backdrop only cares where the pointer is, relative to the window.
//! [`Input`] folds mouse and touch events into one normalized position
//! (`[0, 1]²`, origin top-left). For touch, the first finger down is
//! followed until it lifts, the way a page reads `touches[0]`.
//!
//! ```ignore
//! input.handle_event(&event);
//! if let Some(pointer) = input.take_pointer() {
//!     render_loop.set_pointer(pointer);
//! }
//! ```

use glam::Vec2;
use winit::event::{Touch, TouchPhase, WindowEvent};

/// Tracks the latest pointer position over the window.
#[derive(Debug, Default)]
pub struct Input {
    /// Last pointer position in physical pixels.
    position: Option<Vec2>,
    /// Touch currently steering the pointer.
    active_touch: Option<u64>,
    /// Set when the position changed since the last `take_pointer`.
    moved: bool,

    // Window size for normalization
    window_size: (u32, u32),
}

impl Input {
    /// Create a new input tracker.
    pub fn new() -> Self {
        Self {
            window_size: (800, 600),
            ..Default::default()
        }
    }

    /// Update window size for normalization.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Pointer position in pixels, if the pointer has been seen.
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Pointer position normalized to the window.
    pub fn normalized(&self) -> Option<Vec2> {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return None;
        }
        self.position
            .map(|p| p / Vec2::new(w as f32, h as f32))
    }

    /// Normalized position if it changed since the last call.
    pub fn take_pointer(&mut self) -> Option<Vec2> {
        if !std::mem::take(&mut self.moved) {
            return None;
        }
        self.normalized()
    }

    /// Process a winit window event. Returns `true` if the pointer moved.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(position.x as f32, position.y as f32);
                true
            }
            WindowEvent::Touch(Touch {
                id, phase, location, ..
            }) => self.touch(*id, *phase, location.x as f32, location.y as f32),
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
                false
            }
            _ => false,
        }
    }

    pub(crate) fn pointer_moved(&mut self, x: f32, y: f32) {
        self.position = Some(Vec2::new(x, y));
        self.moved = true;
    }

    pub(crate) fn touch(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) -> bool {
        match phase {
            TouchPhase::Started => {
                if self.active_touch.is_some() {
                    return false;
                }
                self.active_touch = Some(id);
            }
            TouchPhase::Moved => {
                if self.active_touch != Some(id) {
                    return false;
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.active_touch == Some(id) {
                    self.active_touch = None;
                }
                return false;
            }
        }
        self.pointer_moved(x, y);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_pointer() {
        let mut input = Input::new();
        input.set_window_size(800, 600);
        assert!(input.take_pointer().is_none());

        input.pointer_moved(400.0, 150.0);
        let p = input.take_pointer().unwrap();
        assert!((p.x - 0.5).abs() < 1e-6);
        assert!((p.y - 0.25).abs() < 1e-6);

        // Consumed until the next move
        assert!(input.take_pointer().is_none());
        assert_eq!(input.normalized(), Some(p));
    }

    #[test]
    fn test_first_touch_wins() {
        let mut input = Input::new();
        input.set_window_size(100, 100);

        assert!(input.touch(1, TouchPhase::Started, 10.0, 10.0));
        assert!(!input.touch(2, TouchPhase::Started, 90.0, 90.0));
        assert!(!input.touch(2, TouchPhase::Moved, 80.0, 80.0));
        assert!(input.touch(1, TouchPhase::Moved, 20.0, 30.0));
        assert_eq!(input.position(), Some(Vec2::new(20.0, 30.0)));

        assert!(!input.touch(1, TouchPhase::Ended, 20.0, 30.0));
        assert!(input.touch(2, TouchPhase::Started, 50.0, 50.0));
    }

    #[test]
    fn test_zero_window_has_no_pointer() {
        let mut input = Input::new();
        input.set_window_size(0, 0);
        input.pointer_moved(1.0, 1.0);
        assert!(input.normalized().is_none());
    }
}
