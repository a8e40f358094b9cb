//! Pointer and key input, and the decoding of pointer motion into camera gestures.
//!
//! One pointer dragging orbits the camera by its pixel delta. Two pointers either pan (their
//! separation stays put while they move) or dolly (the separation changes), measured in
//! viewport-normalized units so the feel does not depend on screen resolution.

use glam::Vec2;

use crate::camera::Camera;

/// Pinch changes smaller than this, in normalized units, are treated as a two-finger pan.
pub const PAN_THRESHOLD: f32 = 0.001;

/// One pointer of a motion event, in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub id: i64,
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub fn new(id: i64, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionAction {
    Down,
    PointerDown,
    Up,
    PointerUp,
    Cancel,
    Move,
    /// An action code the decoder does not handle.
    Other(i32),
}

/// A pointer event with a snapshot of every active pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionEvent {
    pub action: MotionAction,
    /// Index into `pointers` of the pointer that caused a down or up action.
    pub pointer_index: usize,
    pub pointers: Vec<Pointer>,
}

impl MotionEvent {
    pub fn new(action: MotionAction, pointers: Vec<Pointer>) -> Self {
        Self {
            action,
            pointer_index: 0,
            pointers,
        }
    }

    fn acting_pointer(&self) -> Option<&Pointer> {
        self.pointers
            .get(self.pointer_index)
            .or_else(|| self.pointers.first())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
    Multiple,
    Other(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: i32,
    pub action: KeyAction,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Motion(MotionEvent),
    Key(KeyEvent),
}

/// A camera manipulation decoded from input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraGesture {
    /// Orbit by a pixel delta.
    Orbit { dx: f32, dy: f32 },
    /// Pan by a normalized delta of the first pointer.
    Pan { dx: f32, dy: f32 },
    /// Dolly by the normalized change in pointer separation.
    Dolly(f32),
}

impl CameraGesture {
    pub fn apply(self, camera: &mut Camera) {
        match self {
            CameraGesture::Orbit { dx, dy } => camera.on_move(dx, dy),
            CameraGesture::Pan { dx, dy } => {
                camera.move_left(dx);
                camera.move_up(-dy);
            }
            CameraGesture::Dolly(amount) => camera.move_forward(amount),
        }
    }
}

/// Tracks pointer state between motion events.
#[derive(Clone, Debug, Default)]
pub struct GestureTracker {
    last: Vec2,
    moving: bool,
    initial_distance: f32,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pointer is currently down.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Normalized pointer separation seen on the previous two-pointer move, `0` when no
    /// pinch is in progress.
    pub fn initial_distance(&self) -> f32 {
        self.initial_distance
    }

    /// Decodes one event against a viewport of `size` pixels.
    pub fn handle(&mut self, event: &InputEvent, size: (u32, u32)) -> Option<CameraGesture> {
        match event {
            InputEvent::Motion(motion) => self.handle_motion(motion, size),
            InputEvent::Key(key) => {
                match key.action {
                    KeyAction::Down => log::debug!("Key {} down", key.key_code),
                    KeyAction::Up => log::debug!("Key {} up", key.key_code),
                    KeyAction::Multiple => log::debug!("Key {} multiple", key.key_code),
                    KeyAction::Other(action) => {
                        log::warn!("Unknown key action {action} for key {}", key.key_code)
                    }
                }
                None
            }
        }
    }

    fn handle_motion(&mut self, event: &MotionEvent, size: (u32, u32)) -> Option<CameraGesture> {
        let Some(pointer) = event.acting_pointer() else {
            log::trace!("Motion event without pointers");
            return None;
        };
        let position = pointer.position();

        match event.action {
            MotionAction::Down | MotionAction::PointerDown => {
                log::trace!("Pointer {} down at {position}", pointer.id);
                self.last = position;
                self.moving = true;
                None
            }
            MotionAction::Up | MotionAction::PointerUp | MotionAction::Cancel => {
                log::trace!("Pointer {} up at {position}", pointer.id);
                self.moving = false;
                self.initial_distance = 0.0;
                None
            }
            MotionAction::Move => {
                let gesture = match event.pointers.as_slice() {
                    [single] => {
                        let delta = single.position() - self.last;
                        Some(CameraGesture::Orbit {
                            dx: delta.x,
                            dy: delta.y,
                        })
                    }
                    [first, second] => self.pinch(first, second, size),
                    _ => None,
                };
                self.last = event.pointers[0].position();
                gesture
            }
            MotionAction::Other(action) => {
                log::warn!("Unknown motion event action {action}");
                None
            }
        }
    }

    fn pinch(&mut self, first: &Pointer, second: &Pointer, size: (u32, u32)) -> Option<CameraGesture> {
        let viewport = Vec2::new(size.0.max(1) as f32, size.1.max(1) as f32);
        let current = ((second.position() - first.position()) / viewport).length();
        let moved = current - self.initial_distance;
        let pinching = self.initial_distance.abs() > 0.0;

        let gesture = if moved.abs() < PAN_THRESHOLD && pinching {
            let delta = (first.position() - self.last) / viewport;
            Some(CameraGesture::Pan {
                dx: delta.x,
                dy: delta.y,
            })
        } else if pinching {
            Some(CameraGesture::Dolly(moved))
        } else {
            None
        };
        self.initial_distance = current;
        gesture
    }
}
