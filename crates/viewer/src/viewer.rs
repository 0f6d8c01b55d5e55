use crate::config::ViewerProps;
use crate::scheduler::{FrameHost, FrameRequest, FrameScheduler, FrameTime};
use glam::Vec2;
use solidview_camera::{
    CameraPatch, CameraState, ControlsPatch, ControlsState, OrbitContext, OrbitUpdate, Viewport,
    orbit, perspective,
};
use solidview_common::{Size, Solid, SurfaceId};
use solidview_input::{EventHub, GestureAdapter, GestureBinding};
use solidview_kernel::{RenderHandle, ViewerAction, ViewerState, ViewerStore};
use solidview_render::{
    Entity, EntityConverter, OutputSurface, RenderContent, RenderFn, SolidConverter,
    SurfaceOptions, build_entities, prepare_render,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

/// One viewer instance bound to at most one host surface.
///
/// The host drives it: input goes through the [`EventHub`] passed at mount,
/// [`pump`](Self::pump) applies queued input and redraws in static mode, and
/// [`on_frame`](Self::on_frame) answers frame callbacks in animated mode.
/// Animation needs a host registered with
/// [`set_frame_host`](Self::set_frame_host); without one every mode draws
/// statically. Dropping the viewer cancels its pending frame request.
pub struct Viewer<S: OutputSurface> {
    props: ViewerProps,
    store: ViewerStore,
    solids: Vec<Solid>,
    entities: Vec<Entity>,
    converter: Box<dyn EntityConverter>,

    surface: Option<Weak<RefCell<S>>>,
    render_fn: Option<RenderFn<S>>,
    next_handle_id: u64,
    /// Last size asked of the current surface.
    requested_size: Option<Size>,

    actions: Receiver<ViewerAction>,
    dispatch: Sender<ViewerAction>,
    hub: Option<EventHub>,
    binding: Option<GestureBinding>,

    frames: Option<Rc<RefCell<dyn FrameHost>>>,
    scheduler: FrameScheduler,
    /// Bumped whenever the render handle or the content changes.
    loop_generation: u64,
    dirty: bool,
}

impl<S: OutputSurface> Viewer<S> {
    /// A viewer with no input binding. Actions can still be queued through
    /// [`dispatcher`](Self::dispatcher).
    pub fn new(props: ViewerProps) -> Self {
        let camera = perspective::update(
            &perspective::defaults(),
            &CameraPatch::position(props.viewer.initial_position),
        );
        let base = ControlsState {
            pan_speed: props.viewer.pan_speed,
            rotate_speed: props.viewer.rotate_speed,
            zoom_speed: props.viewer.zoom_speed,
            ..orbit::defaults()
        };
        let controls = ControlsState::aimed_at(camera.position(), camera.target(), &base);
        let converter: Box<dyn EntityConverter> = Box::new(SolidConverter);
        let entities = build_entities(&props.scene, &[], converter.as_ref());
        let (dispatch, actions) = mpsc::channel();

        tracing::info!(
            animate = props.animate,
            width = props.size().width,
            height = props.size().height,
            "viewer mounted"
        );
        Self {
            store: ViewerStore::new(ViewerState::mounted(camera, controls)),
            props,
            solids: Vec::new(),
            entities,
            converter,
            surface: None,
            render_fn: None,
            next_handle_id: 1,
            requested_size: None,
            actions,
            dispatch,
            hub: None,
            binding: None,
            frames: None,
            scheduler: FrameScheduler::new(),
            loop_generation: 0,
            dirty: true,
        }
    }

    /// A viewer listening to gestures emitted on `hub`.
    pub fn mount(props: ViewerProps, hub: &EventHub) -> Self {
        let mut viewer = Self::new(props);
        viewer.bind_input(hub);
        viewer
    }

    /// Replace the entity converter used for solids.
    pub fn with_converter(mut self, converter: impl EntityConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self.rebuild_entities();
        self
    }

    /// Register the host's frame-timing primitive. A loop running on a
    /// previous host is cancelled there first.
    pub fn set_frame_host(&mut self, host: Rc<RefCell<dyn FrameHost>>) {
        self.with_frame_host(|scheduler, host| scheduler.cancel(host));
        self.frames = Some(host);
    }

    /// (Re)subscribe the gesture adapter to `hub`. Any previous binding is
    /// released first.
    pub fn bind_input(&mut self, hub: &EventHub) {
        self.binding = None;
        let mut adapter = GestureAdapter::new(self.props.modifier_key.into());
        adapter.set_target(self.store.state().element);
        let inputs = adapter.inputs();
        self.binding = Some(adapter.bind(hub, self.dispatch.clone()));
        self.hub = Some(hub.clone());
        self.apply(ViewerAction::SetInputs(inputs));
    }

    /// Queue for actions applied on the next [`pump`](Self::pump).
    pub fn dispatcher(&self) -> Sender<ViewerAction> {
        self.dispatch.clone()
    }

    pub fn state(&self) -> &ViewerState {
        self.store.state()
    }

    pub fn camera(&self) -> Option<&CameraState> {
        self.store.state().camera.as_ref()
    }

    pub fn controls(&self) -> Option<&ControlsState> {
        self.store.state().controls.as_ref()
    }

    pub fn render_handle(&self) -> Option<RenderHandle> {
        self.store.state().render
    }

    pub fn props(&self) -> &ViewerProps {
        &self.props
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Actions applied to the store since mount, including no-op ones.
    pub fn dispatched_actions(&self) -> u64 {
        self.store.dispatched()
    }

    pub fn is_animating(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Attach the host surface. A previous surface and its render handle are
    /// dropped. Returns the id pointer events must target.
    pub fn attach_surface(&mut self, surface: &Rc<RefCell<S>>) -> SurfaceId {
        let id = SurfaceId::new();
        self.surface = Some(Rc::downgrade(surface));
        self.render_fn = None;
        self.requested_size = None;
        self.apply(ViewerAction::SetRender(None));
        self.apply(ViewerAction::SetElement(Some(id)));
        if let Some(binding) = &self.binding {
            binding.set_target(Some(id));
        }
        tracing::debug!(surface = id.0, "surface attached");
        self.run_effects();
        id
    }

    pub fn detach_surface(&mut self) {
        self.surface = None;
        self.render_fn = None;
        self.requested_size = None;
        self.apply(ViewerAction::SetRender(None));
        self.apply(ViewerAction::SetElement(None));
        if let Some(binding) = &self.binding {
            binding.set_target(None);
        }
        tracing::debug!("surface detached");
    }

    /// Replace the displayed solids. Equal content is ignored.
    pub fn set_solids(&mut self, solids: Vec<Solid>) {
        if solids == self.solids {
            return;
        }
        self.solids = solids;
        self.rebuild_entities();
    }

    /// Replace the configuration, rebuilding only what changed.
    pub fn set_props(&mut self, props: ViewerProps) {
        if props == self.props {
            return;
        }
        let old = std::mem::replace(&mut self.props, props);

        if old.scene != self.props.scene {
            self.rebuild_entities();
        }
        if old.viewer.pan_speed != self.props.viewer.pan_speed
            || old.viewer.rotate_speed != self.props.viewer.rotate_speed
            || old.viewer.zoom_speed != self.props.viewer.zoom_speed
        {
            self.apply(ViewerAction::SetControls(ControlsPatch {
                pan_speed: Some(self.props.viewer.pan_speed),
                rotate_speed: Some(self.props.viewer.rotate_speed),
                zoom_speed: Some(self.props.viewer.zoom_speed),
                ..ControlsPatch::default()
            }));
        }
        if old.size() != self.props.size() {
            self.requested_size = None;
        }
        if old.modifier_key != self.props.modifier_key {
            if let Some(hub) = self.hub.clone() {
                self.bind_input(&hub);
            }
        }
        self.dirty = true;
        tracing::debug!("viewer props updated");
    }

    /// Apply queued actions, run their effects, and redraw or (re)schedule
    /// the animation loop. Returns true when a static frame was drawn.
    pub fn pump(&mut self, now: Instant) -> bool {
        self.run_effects();
        while let Ok(action) = self.actions.try_recv() {
            self.apply(action);
            self.run_effects();
        }

        let animated = self.props.animate && self.frames.is_some();
        let running = animated && self.render_fn.is_some();
        let generation = self.loop_generation;
        self.with_frame_host(|scheduler, host| scheduler.sync(running, generation, now, host));
        if animated || !self.dirty {
            return false;
        }
        let drawn = self.render_now();
        if drawn {
            self.dirty = false;
        }
        drawn
    }

    /// Host frame callback. Draws and schedules the next frame when `request`
    /// belongs to the running loop.
    pub fn on_frame(&mut self, request: FrameRequest, now: Instant) -> Option<FrameTime> {
        let time = self
            .with_frame_host(|scheduler, host| scheduler.on_frame(request, now, host))
            .flatten()?;
        self.render_now();
        Some(time)
    }

    /// Draw one frame with the current state. Returns false without a
    /// prepared render function or a camera.
    pub fn render_now(&self) -> bool {
        let (Some(render_fn), Some(camera)) = (&self.render_fn, self.camera()) else {
            return false;
        };
        render_fn.render(&RenderContent {
            camera,
            entities: &self.entities,
            rendering: &self.props.scene.rendering,
        })
    }

    /// Stop the animation loop and release input subscriptions.
    pub fn unmount(mut self) {
        self.with_frame_host(|scheduler, host| scheduler.cancel(host));
        self.binding = None;
        tracing::info!("viewer unmounted");
    }

    fn with_frame_host<R>(
        &mut self,
        f: impl FnOnce(&mut FrameScheduler, &mut dyn FrameHost) -> R,
    ) -> Option<R> {
        let host = self.frames.clone()?;
        let Ok(mut guard) = host.try_borrow_mut() else {
            tracing::warn!("frame host busy, scheduling skipped");
            return None;
        };
        Some(f(&mut self.scheduler, &mut *guard))
    }

    fn apply(&mut self, action: ViewerAction) {
        let marks_dirty = matches!(
            action,
            ViewerAction::SetCamera(_)
                | ViewerAction::SetControls(_)
                | ViewerAction::SetElement(_)
                | ViewerAction::SetRender(_)
        );
        if self.store.dispatch(action) && marks_dirty {
            self.dirty = true;
        }
    }

    fn rebuild_entities(&mut self) {
        self.entities = build_entities(&self.props.scene, &self.solids, self.converter.as_ref());
        self.loop_generation += 1;
        self.dirty = true;
    }

    fn live_surface(&self) -> Option<Rc<RefCell<S>>> {
        self.surface.as_ref().and_then(Weak::upgrade)
    }

    /// Effects in dependency order: surface size, projection, render
    /// preparation, then pan, rotate, zoom.
    fn run_effects(&mut self) {
        self.sync_surface_size();
        self.sync_projection();
        self.prepare_render_fn();
        self.apply_pan();
        self.apply_rotate();
        self.apply_zoom();
    }

    fn sync_surface_size(&mut self) {
        let Some(surface) = self.live_surface() else {
            return;
        };
        let wanted = self.props.size();
        if self.requested_size == Some(wanted) {
            return;
        }
        let Ok(mut surface) = surface.try_borrow_mut() else {
            return;
        };
        if surface.pixel_size() != wanted {
            surface.request_size(wanted);
            tracing::debug!(width = wanted.width, height = wanted.height, "surface size requested");
        }
        self.requested_size = Some(wanted);
    }

    fn sync_projection(&mut self) {
        let size = self.props.size();
        let needed = self
            .camera()
            .is_some_and(|camera| perspective::needs_projection(camera, size));
        if needed {
            self.apply(ViewerAction::SetCamera(CameraPatch::viewport(
                Viewport::from_size(size),
            )));
        }
    }

    fn prepare_render_fn(&mut self) {
        if self.render_fn.is_some() || self.camera().is_none() {
            return;
        }
        let (Some(surface), Some(surface_id)) = (self.surface.clone(), self.state().element)
        else {
            return;
        };
        let Some(render_fn) = prepare_render(SurfaceOptions {
            surface,
            surface_id,
            handle_id: self.next_handle_id,
        }) else {
            return;
        };
        self.next_handle_id += 1;
        let handle = render_fn.handle();
        self.render_fn = Some(render_fn);
        self.loop_generation += 1;
        self.apply(ViewerAction::SetRender(Some(handle)));
    }

    fn orbit_context(&self) -> Option<(ControlsState, CameraState)> {
        Some((*self.controls()?, *self.camera()?))
    }

    fn apply_orbit(&mut self, update: OrbitUpdate, consumed: ViewerAction) {
        self.apply(ViewerAction::SetControls(update.controls.into()));
        self.apply(ViewerAction::SetCamera(update.camera));
        self.apply(consumed);
    }

    fn apply_pan(&mut self) {
        let delta = self.state().pan_delta;
        if delta == Vec2::ZERO {
            return;
        }
        let Some((controls, camera)) = self.orbit_context() else {
            return;
        };
        let update = orbit::pan(
            OrbitContext::new(&controls, &camera, controls.pan_speed),
            delta,
        );
        self.apply_orbit(update, ViewerAction::SetPanDelta(Vec2::ZERO));
    }

    fn apply_rotate(&mut self) {
        let delta = self.state().rotate_delta;
        if delta == Vec2::ZERO {
            return;
        }
        let Some((controls, camera)) = self.orbit_context() else {
            return;
        };
        let update = orbit::rotate(
            OrbitContext::new(&controls, &camera, controls.rotate_speed),
            delta,
        );
        self.apply_orbit(update, ViewerAction::SetRotateDelta(Vec2::ZERO));
    }

    fn apply_zoom(&mut self) {
        let delta = self.state().zoom_delta;
        if delta == 0.0 {
            return;
        }
        if !delta.is_finite() {
            tracing::warn!(delta, "non-finite zoom delta dropped");
            self.apply(ViewerAction::SetZoomDelta(0.0));
            return;
        }
        let Some((controls, camera)) = self.orbit_context() else {
            return;
        };
        let update = orbit::zoom(
            OrbitContext::new(&controls, &camera, controls.zoom_speed),
            delta,
        );
        self.apply_orbit(update, ViewerAction::SetZoomDelta(0.0));
    }
}

impl<S: OutputSurface> Drop for Viewer<S> {
    fn drop(&mut self) {
        self.with_frame_host(|scheduler, host| scheduler.cancel(host));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModifierKey;
    use solidview_render::RecordingSurface;

    #[test]
    fn mount_places_camera_at_initial_position() {
        let viewer: Viewer<RecordingSurface> = Viewer::new(ViewerProps::default());
        let camera = viewer.camera().unwrap();
        assert!((camera.position() - glam::Vec3::new(50.0, -50.0, 50.0)).length() < 1e-3);
        assert_eq!(camera.target(), glam::Vec3::ZERO);
        let controls = viewer.controls().unwrap();
        assert!((controls.radius - 50.0 * 3.0_f32.sqrt()).abs() < 1e-2);
        assert!(viewer.render_handle().is_none());
        assert_eq!(viewer.entities().len(), 2);
    }

    #[test]
    fn pump_without_surface_resizes_projection_only() {
        let mut viewer: Viewer<RecordingSurface> = Viewer::new(ViewerProps::default());
        assert!(!viewer.pump(Instant::now()));
        assert_eq!(
            viewer.camera().unwrap().viewport().size(),
            Size::new(480, 480)
        );
    }

    #[test]
    fn dispatcher_actions_apply_on_pump() {
        let mut viewer: Viewer<RecordingSurface> = Viewer::new(ViewerProps::default());
        let before = viewer.controls().unwrap().radius;
        viewer
            .dispatcher()
            .send(ViewerAction::SetZoomDelta(100.0))
            .unwrap();
        viewer.pump(Instant::now());
        let after = viewer.controls().unwrap().radius;
        assert!((after - (before + 3.0)).abs() < 1e-3);
        assert_eq!(viewer.state().zoom_delta, 0.0);
    }

    #[test]
    fn non_finite_zoom_is_dropped() {
        let mut viewer: Viewer<RecordingSurface> = Viewer::new(ViewerProps::default());
        let before = *viewer.controls().unwrap();
        viewer
            .dispatcher()
            .send(ViewerAction::SetZoomDelta(f32::NAN))
            .unwrap();
        viewer.pump(Instant::now());
        assert_eq!(*viewer.controls().unwrap(), before);
        assert_eq!(viewer.state().zoom_delta, 0.0);
    }

    #[test]
    fn speed_change_reaches_controls() {
        let mut viewer: Viewer<RecordingSurface> = Viewer::new(ViewerProps::default());
        let mut props = viewer.props().clone();
        props.viewer.rotate_speed = 0.01;
        viewer.set_props(props);
        assert_eq!(viewer.controls().unwrap().rotate_speed, 0.01);
    }

    #[test]
    fn modifier_change_resets_store_inputs() {
        let hub = EventHub::new();
        let mut viewer: Viewer<RecordingSurface> = Viewer::mount(ViewerProps::default(), &hub);
        hub.emit(&solidview_input::InputEvent::KeyDown(solidview_input::Key::Shift));
        viewer.pump(Instant::now());
        assert!(viewer.state().inputs.modifier.is_down());

        let mut props = viewer.props().clone();
        props.modifier_key = ModifierKey::Alt;
        viewer.set_props(props);
        assert!(!viewer.state().inputs.modifier.is_down());
        assert!(!viewer.state().inputs.pointer.is_down());
    }

    #[test]
    fn dispatched_actions_count_every_apply() {
        let mut viewer: Viewer<RecordingSurface> = Viewer::new(ViewerProps::default());
        let before = viewer.dispatched_actions();
        viewer
            .dispatcher()
            .send(ViewerAction::SetZoomDelta(10.0))
            .unwrap();
        viewer.pump(Instant::now());
        assert!(viewer.dispatched_actions() > before);
    }

    #[test]
    fn equal_solids_do_not_rebuild() {
        let mut viewer: Viewer<RecordingSurface> = Viewer::new(ViewerProps::default());
        let solid = Solid::new(
            vec![glam::Vec3::ZERO, glam::Vec3::X, glam::Vec3::Y],
            vec![[0, 1, 2]],
        );
        viewer.set_solids(vec![solid.clone()]);
        let generation = viewer.loop_generation;
        viewer.set_solids(vec![solid]);
        assert_eq!(viewer.loop_generation, generation);
        assert_eq!(viewer.entities().len(), 3);
    }
}
