use glam::Vec2;
use solidview_camera::{CameraPatch, CameraState, ControlsPatch, ControlsState, orbit, perspective};
use solidview_common::{ButtonState, SurfaceId};

/// Pointer button and modifier key states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub pointer: ButtonState,
    pub modifier: ButtonState,
}

/// Handle of a prepared render function, bound to the surface it was
/// prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle {
    pub id: u64,
    pub surface: SurfaceId,
}

/// Everything that can change the viewer state.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    /// Merge camera fields and re-derive the matrices.
    SetCamera(CameraPatch),
    /// Merge controls fields and re-place the camera accordingly.
    SetControls(ControlsPatch),
    /// Attach (or detach) the output surface.
    SetElement(Option<SurfaceId>),
    SetInputs(InputState),
    SetPanDelta(Vec2),
    SetRotateDelta(Vec2),
    SetZoomDelta(f32),
    /// Attach (or drop) the prepared render function.
    SetRender(Option<RenderHandle>),
}

/// The viewer state snapshot.
///
/// Deltas hold input that has not been applied yet; they go back to zero as
/// soon as they are consumed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewerState {
    pub camera: Option<CameraState>,
    pub controls: Option<ControlsState>,
    pub element: Option<SurfaceId>,
    pub inputs: InputState,
    pub pan_delta: Vec2,
    pub rotate_delta: Vec2,
    pub zoom_delta: f32,
    pub render: Option<RenderHandle>,
}

impl ViewerState {
    /// State at mount: camera and controls present and consistent with each
    /// other, no surface, no pending input.
    pub fn mounted(camera: CameraState, controls: ControlsState) -> Self {
        let placed = orbit::update(&controls, &camera);
        Self {
            camera: Some(perspective::update(&camera, &placed.camera)),
            controls: Some(placed.controls),
            ..Self::default()
        }
    }

    /// Whether any delta is waiting to be applied.
    pub fn has_pending_input(&self) -> bool {
        self.pan_delta != Vec2::ZERO || self.rotate_delta != Vec2::ZERO || self.zoom_delta != 0.0
    }
}

/// Apply one action and return the next state.
pub fn transition(state: ViewerState, action: ViewerAction) -> ViewerState {
    match action {
        ViewerAction::SetCamera(patch) => {
            let Some(camera) = state.camera.as_ref() else {
                return state;
            };
            let camera = perspective::update(camera, &patch);
            ViewerState {
                camera: Some(camera),
                ..state
            }
        }
        ViewerAction::SetControls(patch) => {
            let (Some(controls), Some(camera)) = (state.controls.as_ref(), state.camera.as_ref())
            else {
                return state;
            };
            let merged = controls.merge(&patch);
            let updated = orbit::update(&merged, camera);
            let camera = perspective::update(camera, &updated.camera);
            tracing::trace!(
                theta = updated.controls.theta,
                phi = updated.controls.phi,
                radius = updated.controls.radius,
                "controls updated"
            );
            ViewerState {
                camera: Some(camera),
                controls: Some(updated.controls),
                ..state
            }
        }
        ViewerAction::SetElement(element) => ViewerState { element, ..state },
        ViewerAction::SetInputs(inputs) => ViewerState { inputs, ..state },
        ViewerAction::SetPanDelta(pan_delta) => ViewerState { pan_delta, ..state },
        ViewerAction::SetRotateDelta(rotate_delta) => ViewerState {
            rotate_delta,
            ..state
        },
        ViewerAction::SetZoomDelta(zoom_delta) => ViewerState { zoom_delta, ..state },
        ViewerAction::SetRender(render) => ViewerState { render, ..state },
    }
}

/// Owner of the viewer state. `dispatch` takes `&mut self`, so transitions
/// can never interleave.
#[derive(Debug, Default)]
pub struct ViewerStore {
    state: ViewerState,
    dispatched: u64,
}

impl ViewerStore {
    pub fn new(state: ViewerState) -> Self {
        Self {
            state,
            dispatched: 0,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// Apply `action`. Returns true when the state changed.
    pub fn dispatch(&mut self, action: ViewerAction) -> bool {
        let next = transition(self.state.clone(), action);
        self.dispatched += 1;
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }

    /// Number of actions dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use solidview_camera::Viewport;
    use solidview_common::Size;

    fn mounted() -> ViewerState {
        ViewerState::mounted(perspective::defaults(), orbit::defaults())
    }

    #[test]
    fn mounted_camera_matches_controls() {
        let s = mounted();
        let controls = s.controls.unwrap();
        assert_eq!(s.camera.unwrap().position(), controls.eye_position());
        assert!(!s.has_pending_input());
    }

    #[test]
    fn set_camera_without_camera_is_noop() {
        let s = ViewerState::default();
        let next = transition(
            s.clone(),
            ViewerAction::SetCamera(CameraPatch::position(Vec3::ONE)),
        );
        assert_eq!(next, s);
    }

    #[test]
    fn set_controls_without_camera_is_noop() {
        let s = ViewerState {
            controls: Some(orbit::defaults()),
            ..ViewerState::default()
        };
        let next = transition(
            s.clone(),
            ViewerAction::SetControls(ControlsPatch {
                radius: Some(5.0),
                ..ControlsPatch::default()
            }),
        );
        assert_eq!(next, s);
    }

    #[test]
    fn set_camera_rederives_matrices() {
        let s = mounted();
        let next = transition(
            s.clone(),
            ViewerAction::SetCamera(CameraPatch::viewport(Viewport::from_size(Size::new(
                640, 480,
            )))),
        );
        let cam = next.camera.unwrap();
        assert_eq!(cam.viewport().size(), Size::new(640, 480));
        assert_ne!(cam.projection_matrix(), s.camera.unwrap().projection_matrix());
    }

    #[test]
    fn set_controls_moves_camera() {
        let s = mounted();
        let next = transition(
            s.clone(),
            ViewerAction::SetControls(ControlsPatch {
                radius: Some(20.0),
                ..ControlsPatch::default()
            }),
        );
        let controls = next.controls.unwrap();
        assert_eq!(controls.radius, 20.0);
        assert_eq!(next.camera.unwrap().position(), controls.eye_position());
    }

    #[test]
    fn set_controls_clamps_out_of_bounds_radius() {
        let next = transition(
            mounted(),
            ViewerAction::SetControls(ControlsPatch {
                radius: Some(1e9),
                ..ControlsPatch::default()
            }),
        );
        assert_eq!(next.controls.unwrap().radius, orbit::MAX_DISTANCE);
    }

    #[test]
    fn field_replacements() {
        let id = SurfaceId::new();
        let handle = RenderHandle { id: 1, surface: id };
        let mut s = mounted();
        s = transition(s, ViewerAction::SetElement(Some(id)));
        s = transition(s, ViewerAction::SetRender(Some(handle)));
        s = transition(s, ViewerAction::SetPanDelta(Vec2::new(1.0, 2.0)));
        s = transition(s, ViewerAction::SetRotateDelta(Vec2::new(3.0, 4.0)));
        s = transition(s, ViewerAction::SetZoomDelta(5.0));
        s = transition(
            s,
            ViewerAction::SetInputs(InputState {
                pointer: ButtonState::Down,
                modifier: ButtonState::Up,
            }),
        );
        assert_eq!(s.element, Some(id));
        assert_eq!(s.render, Some(handle));
        assert_eq!(s.pan_delta, Vec2::new(1.0, 2.0));
        assert_eq!(s.rotate_delta, Vec2::new(3.0, 4.0));
        assert_eq!(s.zoom_delta, 5.0);
        assert!(s.inputs.pointer.is_down());
        assert!(s.has_pending_input());
    }

    #[test]
    fn store_reports_changes() {
        let mut store = ViewerStore::new(mounted());
        assert!(store.dispatch(ViewerAction::SetZoomDelta(2.0)));
        assert!(!store.dispatch(ViewerAction::SetZoomDelta(2.0)));
        assert_eq!(store.dispatched(), 2);
        assert_eq!(store.state().zoom_delta, 2.0);
    }
}
