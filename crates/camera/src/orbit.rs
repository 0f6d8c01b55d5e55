//! Orbit controls: a camera parameterized by a look-at target, a distance and
//! two spherical angles.
//!
//! `theta` is the azimuth in the XY plane measured from +X, `phi` the polar
//! angle measured from +Z. The camera sits at
//! `target + radius * (sin phi cos theta, sin phi sin theta, cos phi)`.

use crate::perspective::{CameraPatch, CameraState};
use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_4, PI};

pub const DEFAULT_RADIUS: f32 = 100.0;
pub const DEFAULT_THETA: f32 = -FRAC_PI_4;
/// Polar angle of the (1, -1, 1) diagonal.
pub const DEFAULT_PHI: f32 = 0.955_316_6;
pub const DEFAULT_PAN_SPEED: f32 = 0.75;
pub const DEFAULT_ROTATE_SPEED: f32 = 0.002;
pub const DEFAULT_ZOOM_SPEED: f32 = 0.03;
pub const MIN_DISTANCE: f32 = 1.0;
pub const MAX_DISTANCE: f32 = 10_000.0;
/// Keeps the camera off the poles, where the view basis degenerates.
pub const MIN_PHI: f32 = 0.01;
pub const MAX_PHI: f32 = PI - 0.01;

/// Orbit parameters plus speeds and bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlsState {
    pub target: Vec3,
    pub theta: f32,
    pub phi: f32,
    pub radius: f32,
    pub pan_speed: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_phi: f32,
    pub max_phi: f32,
}

impl Default for ControlsState {
    fn default() -> Self {
        defaults()
    }
}

impl ControlsState {
    /// Controls that reproduce a camera placed at `position` looking at
    /// `target`, keeping speeds and bounds from `base`.
    pub fn aimed_at(position: Vec3, target: Vec3, base: &ControlsState) -> Self {
        let offset = position - target;
        let radius = offset.length();
        let (theta, phi) = if radius > f32::EPSILON {
            (
                offset.y.atan2(offset.x),
                (offset.z / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (base.theta, base.phi)
        };
        Self {
            target,
            theta,
            phi,
            radius,
            ..*base
        }
        .clamped()
    }

    /// Merge a partial update, keeping current values for `None` fields and
    /// ignoring non-finite values.
    pub fn merge(&self, patch: &ControlsPatch) -> Self {
        let pick = |value: Option<f32>, current: f32| {
            value.filter(|v| v.is_finite()).unwrap_or(current)
        };
        Self {
            target: patch
                .target
                .filter(|t| t.is_finite())
                .unwrap_or(self.target),
            theta: pick(patch.theta, self.theta),
            phi: pick(patch.phi, self.phi),
            radius: pick(patch.radius, self.radius),
            pan_speed: pick(patch.pan_speed, self.pan_speed),
            rotate_speed: pick(patch.rotate_speed, self.rotate_speed),
            zoom_speed: pick(patch.zoom_speed, self.zoom_speed),
            ..*self
        }
    }

    /// Radius and phi saturated to their bounds.
    pub fn clamped(self) -> Self {
        let (min_d, max_d) = ordered(self.min_distance, self.max_distance);
        let (min_phi, max_phi) = ordered(self.min_phi, self.max_phi);
        Self {
            radius: self.radius.clamp(min_d, max_d),
            phi: self.phi.clamp(min_phi, max_phi),
            ..self
        }
    }

    /// Offset of the camera from the target.
    pub fn offset(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.radius * Vec3::new(sin_phi * cos_theta, sin_phi * sin_theta, cos_phi)
    }

    pub fn eye_position(&self) -> Vec3 {
        self.target + self.offset()
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Partial controls update. `None` keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlsPatch {
    pub target: Option<Vec3>,
    pub theta: Option<f32>,
    pub phi: Option<f32>,
    pub radius: Option<f32>,
    pub pan_speed: Option<f32>,
    pub rotate_speed: Option<f32>,
    pub zoom_speed: Option<f32>,
}

impl From<ControlsState> for ControlsPatch {
    fn from(c: ControlsState) -> Self {
        Self {
            target: Some(c.target),
            theta: Some(c.theta),
            phi: Some(c.phi),
            radius: Some(c.radius),
            pan_speed: Some(c.pan_speed),
            rotate_speed: Some(c.rotate_speed),
            zoom_speed: Some(c.zoom_speed),
        }
    }
}

/// Inputs to one orbit operation.
#[derive(Debug, Clone, Copy)]
pub struct OrbitContext<'a> {
    pub controls: &'a ControlsState,
    pub camera: &'a CameraState,
    pub speed: f32,
}

impl<'a> OrbitContext<'a> {
    pub fn new(controls: &'a ControlsState, camera: &'a CameraState, speed: f32) -> Self {
        Self {
            controls,
            camera,
            speed,
        }
    }
}

/// Result of an orbit operation: new controls and the camera fields they
/// dictate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitUpdate {
    pub controls: ControlsState,
    pub camera: CameraPatch,
}

impl OrbitUpdate {
    fn from_controls(controls: ControlsState) -> Self {
        Self {
            camera: CameraPatch {
                position: Some(controls.eye_position()),
                target: Some(controls.target),
                ..CameraPatch::default()
            },
            controls,
        }
    }
}

pub fn defaults() -> ControlsState {
    ControlsState {
        target: Vec3::ZERO,
        theta: DEFAULT_THETA,
        phi: DEFAULT_PHI,
        radius: DEFAULT_RADIUS,
        pan_speed: DEFAULT_PAN_SPEED,
        rotate_speed: DEFAULT_ROTATE_SPEED,
        zoom_speed: DEFAULT_ZOOM_SPEED,
        min_distance: MIN_DISTANCE,
        max_distance: MAX_DISTANCE,
        min_phi: MIN_PHI,
        max_phi: MAX_PHI,
    }
}

/// Translate target and camera together along the camera's right/up axes.
///
/// One unit of delta moves the scene by roughly one pixel at the target
/// distance, times `speed`.
pub fn pan(ctx: OrbitContext<'_>, delta: Vec2) -> OrbitUpdate {
    let OrbitContext {
        controls,
        camera,
        speed,
    } = ctx;
    if !delta.is_finite() || !speed.is_finite() {
        tracing::warn!(?delta, "ignoring non-finite pan input");
        return update(controls, camera);
    }

    let height = camera.viewport().height.max(1) as f32;
    let world_per_pixel = 2.0 * controls.radius * (camera.fov() * 0.5).tan() / height;
    let offset =
        (camera.right() * delta.x + camera.up_axis() * delta.y) * speed * world_per_pixel;

    let moved = ControlsState {
        target: controls.target + offset,
        ..*controls
    };
    let mut result = OrbitUpdate::from_controls(moved.clamped());
    result.camera.position = Some(camera.position() + offset);
    result
}

/// Orbit around the target. Phi saturates at its bounds and never wraps.
pub fn rotate(ctx: OrbitContext<'_>, delta: Vec2) -> OrbitUpdate {
    let OrbitContext {
        controls,
        camera,
        speed,
    } = ctx;
    if !delta.is_finite() || !speed.is_finite() {
        tracing::warn!(?delta, "ignoring non-finite rotate input");
        return update(controls, camera);
    }

    let rotated = ControlsState {
        theta: controls.theta + delta.x * speed,
        phi: controls.phi - delta.y * speed,
        ..*controls
    };
    OrbitUpdate::from_controls(rotated.clamped())
}

/// Move toward or away from the target, clamped to the distance bounds.
pub fn zoom(ctx: OrbitContext<'_>, delta: f32) -> OrbitUpdate {
    let OrbitContext {
        controls,
        camera,
        speed,
    } = ctx;
    if !delta.is_finite() || !speed.is_finite() {
        tracing::warn!(delta, "ignoring non-finite zoom input");
        return update(controls, camera);
    }

    let zoomed = ControlsState {
        radius: controls.radius + delta * speed,
        ..*controls
    };
    OrbitUpdate::from_controls(zoomed.clamped())
}

/// Recompute the camera placement from `controls` without applying input.
pub fn update(controls: &ControlsState, _camera: &CameraState) -> OrbitUpdate {
    OrbitUpdate::from_controls(controls.clamped())
}
