use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use solidview_common::Size;

pub const DEFAULT_FOV: f32 = std::f32::consts::FRAC_PI_4;
pub const DEFAULT_NEAR: f32 = 1.0;
pub const DEFAULT_FAR: f32 = 18_000.0;
pub const DEFAULT_POSITION: Vec3 = Vec3::new(450.0, 550.0, 700.0);

/// Kind of projection. Only perspective is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Perspective,
}

/// Viewport rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn sanitized(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
            ..self
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        }
    }
}

/// Perspective camera with derived projection and view matrices.
///
/// Fields are only reachable through [`defaults`] and [`update`], so the
/// matrices can never go stale relative to the parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    projection: Projection,
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov: f32,
    near: f32,
    far: f32,
    viewport: Viewport,
    projection_matrix: Mat4,
    view_matrix: Mat4,
}

impl CameraState {
    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Vertical field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Camera-local up axis, orthogonal to `forward` and `right`.
    pub fn up_axis(&self) -> Vec3 {
        self.right().cross(self.forward())
    }
}

impl Default for CameraState {
    fn default() -> Self {
        defaults()
    }
}

/// Partial camera update. `None` keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraPatch {
    pub position: Option<Vec3>,
    pub target: Option<Vec3>,
    pub up: Option<Vec3>,
    pub fov: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
    pub viewport: Option<Viewport>,
}

impl CameraPatch {
    pub fn position(position: Vec3) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn viewport(viewport: Viewport) -> Self {
        Self {
            viewport: Some(viewport),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Standard perspective camera: 45 degree field of view, Z up, looking at the
/// origin.
pub fn defaults() -> CameraState {
    derive(CameraState {
        projection: Projection::Perspective,
        position: DEFAULT_POSITION,
        target: Vec3::ZERO,
        up: Vec3::Z,
        fov: DEFAULT_FOV,
        near: DEFAULT_NEAR,
        far: DEFAULT_FAR,
        viewport: Viewport::default(),
        projection_matrix: Mat4::IDENTITY,
        view_matrix: Mat4::IDENTITY,
    })
}

/// Merge `patch` into `state` and re-derive both matrices.
pub fn update(state: &CameraState, patch: &CameraPatch) -> CameraState {
    let merged = CameraState {
        position: finite_or(patch.position, state.position),
        target: finite_or(patch.target, state.target),
        up: patch
            .up
            .map(Vec3::normalize_or_zero)
            .filter(|u| *u != Vec3::ZERO)
            .unwrap_or(state.up),
        fov: patch
            .fov
            .filter(|f| f.is_finite() && *f > 0.0 && *f < std::f32::consts::PI)
            .unwrap_or(state.fov),
        near: patch
            .near
            .filter(|n| n.is_finite() && *n > 0.0)
            .unwrap_or(state.near),
        far: patch.far.filter(|f| f.is_finite()).unwrap_or(state.far),
        viewport: patch.viewport.unwrap_or(state.viewport),
        ..*state
    };
    derive(merged)
}

/// Resize the viewport and projection to `size`.
///
/// Returns the state unchanged when the size already matches the viewport or
/// has a zero dimension, so repeated calls with the same size are free.
pub fn set_projection(state: &CameraState, size: Size) -> CameraState {
    if !needs_projection(state, size) {
        return *state;
    }
    tracing::debug!(width = size.width, height = size.height, "camera projection resized");
    update(state, &CameraPatch::viewport(Viewport::from_size(size)))
}

/// Whether [`set_projection`] with `size` would change anything.
pub fn needs_projection(state: &CameraState, size: Size) -> bool {
    size.is_positive() && state.viewport.size() != size
}

fn finite_or(value: Option<Vec3>, fallback: Vec3) -> Vec3 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

fn derive(mut state: CameraState) -> CameraState {
    state.viewport = state.viewport.sanitized();
    if state.far <= state.near {
        state.far = state.near * 2.0;
    }
    let mut up = state.up.normalize_or(Vec3::Z);
    // A camera sitting on its target has no view direction.
    if state.position.distance_squared(state.target) < f32::EPSILON {
        state.position = state.target + up * state.near;
    }
    // Looking straight along the up axis leaves the roll undefined.
    let forward = (state.target - state.position).normalize_or_zero();
    if forward.cross(up).length_squared() < 1e-8 {
        up = if up.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
    }
    let aspect = state.viewport.size().aspect();
    state.projection_matrix = Mat4::perspective_rh(state.fov, aspect, state.near, state.far);
    state.view_matrix = Mat4::look_at_rh(state.position, state.target, up);
    state
}
