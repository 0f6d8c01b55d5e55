use glam::Vec2;
use solidview_common::SurfaceId;

/// Pointer drag sample on a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    pub target: SurfaceId,
    /// Whether the pointer is currently pressed.
    pub down: bool,
    /// Number of simultaneous contact points (1 for a mouse).
    pub touches: u8,
    /// Displacement since the previous sample, in pixels.
    pub delta: Vec2,
}

/// Two-finger pinch sample. `delta.x` is the change of finger distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEvent {
    pub target: SurfaceId,
    pub touches: u8,
    pub delta: Vec2,
}

/// Scroll wheel sample. Positive `delta.y` scrolls down (away from the user).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub target: SurfaceId,
    pub delta: Vec2,
}

/// Key identity used for modifier matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Key {
    #[default]
    Shift,
    Control,
    Alt,
    Meta,
    Character(char),
}

/// A normalized input event as emitted by a host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Drag(DragEvent),
    Pinch(PinchEvent),
    Wheel(WheelEvent),
    KeyDown(Key),
    KeyUp(Key),
}

impl InputEvent {
    /// Surface the event is scoped to. Key events are global.
    pub fn target(&self) -> Option<SurfaceId> {
        match self {
            Self::Drag(e) => Some(e.target),
            Self::Pinch(e) => Some(e.target),
            Self::Wheel(e) => Some(e.target),
            Self::KeyDown(_) | Self::KeyUp(_) => None,
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, Self::KeyDown(_) | Self::KeyUp(_))
    }
}
