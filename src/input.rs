//! Translation of SDL events into the renderer's input events.
//!
//! Touch fingers map one to one onto motion pointers. The left mouse button stands in for a
//! single finger on desktop, and the wheel dollies directly.

use meshview_core::gesture::{InputEvent, KeyAction, KeyEvent, MotionAction, MotionEvent, Pointer};
use sdl2::{event::Event, keyboard::Scancode, mouse::MouseButton};

/// Wheel notches to dolly amount.
const WHEEL_DOLLY: f32 = 0.05;

/// Pointer id used for the mouse, outside the range SDL hands out for fingers.
const MOUSE_POINTER: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Input(InputEvent),
    Dolly(f32),
}

/// Keeps the set of fingers currently down so every motion event carries all of them.
#[derive(Debug, Default)]
pub struct InputTranslator {
    fingers: Vec<Pointer>,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates one SDL event for a window of `size` pixels.
    pub fn translate(&mut self, event: &Event, size: (u32, u32)) -> Option<Action> {
        let (width, height) = (size.0 as f32, size.1 as f32);
        match *event {
            Event::Quit { .. } => Some(Action::Quit),
            Event::KeyDown {
                scancode: Some(Scancode::Escape),
                ..
            } => Some(Action::Quit),
            Event::KeyDown {
                scancode: Some(scancode),
                repeat,
                ..
            } => Some(key(
                scancode,
                if repeat {
                    KeyAction::Multiple
                } else {
                    KeyAction::Down
                },
            )),
            Event::KeyUp {
                scancode: Some(scancode),
                ..
            } => Some(key(scancode, KeyAction::Up)),

            Event::FingerDown { finger_id, x, y, .. } => {
                let pointer = Pointer::new(finger_id, x * width, y * height);
                self.fingers.retain(|p| p.id != finger_id);
                self.fingers.push(pointer);
                let action = if self.fingers.len() == 1 {
                    MotionAction::Down
                } else {
                    MotionAction::PointerDown
                };
                Some(self.motion(action, finger_id))
            }
            Event::FingerMotion { finger_id, x, y, .. } => {
                let finger = self.fingers.iter_mut().find(|p| p.id == finger_id)?;
                finger.x = x * width;
                finger.y = y * height;
                Some(self.motion(MotionAction::Move, finger_id))
            }
            Event::FingerUp { finger_id, x, y, .. } => {
                if let Some(finger) = self.fingers.iter_mut().find(|p| p.id == finger_id) {
                    finger.x = x * width;
                    finger.y = y * height;
                } else {
                    return None;
                }
                let action = if self.fingers.len() == 1 {
                    MotionAction::Up
                } else {
                    MotionAction::PointerUp
                };
                let event = self.motion(action, finger_id);
                self.fingers.retain(|p| p.id != finger_id);
                Some(event)
            }

            Event::MouseButtonDown {
                mouse_btn: MouseButton::Left,
                x,
                y,
                ..
            } => Some(mouse(MotionAction::Down, x, y)),
            Event::MouseMotion {
                ref mousestate, x, y, ..
            } if mousestate.left() => Some(mouse(MotionAction::Move, x, y)),
            Event::MouseButtonUp {
                mouse_btn: MouseButton::Left,
                x,
                y,
                ..
            } => Some(mouse(MotionAction::Up, x, y)),
            Event::MouseWheel { y, .. } if y != 0 => Some(Action::Dolly(y as f32 * WHEEL_DOLLY)),

            _ => None,
        }
    }

    fn motion(&self, action: MotionAction, finger_id: i64) -> Action {
        Action::Input(InputEvent::Motion(MotionEvent {
            action,
            pointer_index: self
                .fingers
                .iter()
                .position(|p| p.id == finger_id)
                .unwrap_or(0),
            pointers: self.fingers.clone(),
        }))
    }
}

fn key(scancode: Scancode, action: KeyAction) -> Action {
    Action::Input(InputEvent::Key(KeyEvent {
        key_code: scancode as i32,
        action,
    }))
}

fn mouse(action: MotionAction, x: i32, y: i32) -> Action {
    Action::Input(InputEvent::Motion(MotionEvent::new(
        action,
        vec![Pointer::new(MOUSE_POINTER, x as f32, y as f32)],
    )))
}

#[cfg(test)]
mod tests {
    use sdl2::{
        keyboard::Mod,
        mouse::{MouseState, MouseWheelDirection},
    };

    use super::*;

    const SIZE: (u32, u32) = (200, 100);

    fn down(finger_id: i64, x: f32, y: f32) -> Event {
        Event::FingerDown {
            timestamp: 0,
            touch_id: 0,
            finger_id,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            pressure: 1.0,
        }
    }

    fn moved(finger_id: i64, x: f32, y: f32) -> Event {
        Event::FingerMotion {
            timestamp: 0,
            touch_id: 0,
            finger_id,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            pressure: 1.0,
        }
    }

    fn up(finger_id: i64, x: f32, y: f32) -> Event {
        Event::FingerUp {
            timestamp: 0,
            touch_id: 0,
            finger_id,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            pressure: 1.0,
        }
    }

    fn motion(action: Option<Action>) -> MotionEvent {
        match action {
            Some(Action::Input(InputEvent::Motion(event))) => event,
            other => panic!("expected a motion event, got {other:?}"),
        }
    }

    #[test]
    fn fingers_become_pixel_pointers() {
        let mut input = InputTranslator::new();
        let event = motion(input.translate(&down(7, 0.5, 0.5), SIZE));
        assert_eq!(event.action, MotionAction::Down);
        assert_eq!(event.pointers, [Pointer::new(7, 100.0, 50.0)]);
    }

    #[test]
    fn second_finger_is_a_pointer_down_and_moves_report_both() {
        let mut input = InputTranslator::new();
        input.translate(&down(1, 0.1, 0.1), SIZE);
        let event = motion(input.translate(&down(2, 0.9, 0.9), SIZE));
        assert_eq!(event.action, MotionAction::PointerDown);
        assert_eq!(event.pointer_index, 1);

        let event = motion(input.translate(&moved(2, 0.8, 0.9), SIZE));
        assert_eq!(event.action, MotionAction::Move);
        assert_eq!(event.pointers.len(), 2);
        assert_eq!(event.pointers[0].id, 1);
        assert!((event.pointers[1].x - 160.0).abs() < 1e-4);

        let event = motion(input.translate(&up(1, 0.1, 0.1), SIZE));
        assert_eq!(event.action, MotionAction::PointerUp);
        assert_eq!(event.pointer_index, 0);
        let event = motion(input.translate(&up(2, 0.8, 0.9), SIZE));
        assert_eq!(event.action, MotionAction::Up);
        assert_eq!(event.pointers.len(), 1);
    }

    #[test]
    fn unknown_fingers_are_ignored() {
        let mut input = InputTranslator::new();
        assert_eq!(input.translate(&moved(3, 0.5, 0.5), SIZE), None);
        assert_eq!(input.translate(&up(3, 0.5, 0.5), SIZE), None);
    }

    #[test]
    fn keys_use_scancodes_and_quit_ends_the_loop() {
        let mut input = InputTranslator::new();
        assert_eq!(
            key(Scancode::A, KeyAction::Multiple),
            Action::Input(InputEvent::Key(KeyEvent {
                key_code: Scancode::A as i32,
                action: KeyAction::Multiple,
            }))
        );
        assert_eq!(
            input.translate(&Event::Quit { timestamp: 0 }, SIZE),
            Some(Action::Quit)
        );
    }

    fn mouse_motion(buttons: u32, x: i32, y: i32) -> Event {
        Event::MouseMotion {
            timestamp: 0,
            window_id: 0,
            which: 0,
            mousestate: MouseState::from_sdl_state(buttons),
            x,
            y,
            xrel: 0,
            yrel: 0,
        }
    }

    fn wheel(y: i32) -> Event {
        Event::MouseWheel {
            timestamp: 0,
            window_id: 0,
            which: 0,
            x: 0,
            y,
            direction: MouseWheelDirection::Normal,
            precise_x: 0.0,
            precise_y: y as f32,
            mouse_x: 0,
            mouse_y: 0,
        }
    }

    #[test]
    fn left_drag_is_a_single_mouse_pointer() {
        let mut input = InputTranslator::new();
        let press = Event::MouseButtonDown {
            timestamp: 0,
            window_id: 0,
            which: 0,
            mouse_btn: MouseButton::Left,
            clicks: 1,
            x: 30,
            y: 40,
        };

        let event = motion(input.translate(&press, SIZE));
        assert_eq!(event.action, MotionAction::Down);
        assert_eq!(event.pointers, [Pointer::new(MOUSE_POINTER, 30.0, 40.0)]);

        // SDL_BUTTON_LMASK
        let event = motion(input.translate(&mouse_motion(1, 35, 42), SIZE));
        assert_eq!(event.action, MotionAction::Move);
        assert_eq!(event.pointers, [Pointer::new(MOUSE_POINTER, 35.0, 42.0)]);

        assert_eq!(input.translate(&mouse_motion(0, 50, 50), SIZE), None);
    }

    #[test]
    fn wheel_dollies() {
        let mut input = InputTranslator::new();
        match input.translate(&wheel(2), SIZE) {
            Some(Action::Dolly(amount)) => assert!((amount - 0.1).abs() < 1e-6),
            other => panic!("expected a dolly, got {other:?}"),
        }
        assert_eq!(input.translate(&wheel(0), SIZE), None);
    }

    #[test]
    fn escape_quits() {
        let mut input = InputTranslator::new();
        let escape = Event::KeyDown {
            timestamp: 0,
            window_id: 0,
            keycode: None,
            scancode: Some(Scancode::Escape),
            keymod: Mod::NOMOD,
            repeat: false,
        };
        assert_eq!(input.translate(&escape, SIZE), Some(Action::Quit));
    }
}
