use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// RGBA color with components in `0.0..=1.0`.
pub type Rgba = [f32; 4];

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of an output surface attached to a viewer.
///
/// The store only ever holds this id; the surface itself belongs to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// Allocate a fresh, process-unique id.
    pub fn new() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Pixel dimensions of a surface or viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are non-zero.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height. Degenerate sizes report 1.0.
    pub fn aspect(&self) -> f32 {
        if self.is_positive() {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }
}

/// Two-valued state of a pointer button or modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ButtonState {
    #[default]
    Up,
    Down,
}

impl ButtonState {
    pub fn is_down(self) -> bool {
        self == Self::Down
    }

    pub fn from_pressed(pressed: bool) -> Self {
        if pressed { Self::Down } else { Self::Up }
    }
}
