use glam::{Vec2, Vec3};
use solidview_common::{Size, Solid, SurfaceId};
use solidview_input::{DragEvent, EventHub, InputEvent, Key, PinchEvent, WheelEvent};
use solidview_render::{
    AxisEntity, DrawCall, DrawCmd, Entity, EntityConverter, OutputSurface, RecordingSurface,
    RenderingOptions, Visuals,
};
use solidview_viewer::{FrameHost, FrameRequest, Viewer, ViewerProps};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct TestHost {
    next: u64,
    requested: Vec<FrameRequest>,
    cancelled: Vec<FrameRequest>,
}

impl FrameHost for TestHost {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.requested.push(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.cancelled.push(request);
    }
}

struct Harness {
    hub: EventHub,
    viewer: Viewer<RecordingSurface>,
    surface: Rc<RefCell<RecordingSurface>>,
    id: SurfaceId,
    host: Rc<RefCell<TestHost>>,
}

impl Harness {
    fn new(props: ViewerProps, surface: RecordingSurface) -> Self {
        let hub = EventHub::new();
        let mut viewer = Viewer::mount(props, &hub);
        let surface = Rc::new(RefCell::new(surface));
        let id = viewer.attach_surface(&surface);
        let host = Rc::new(RefCell::new(TestHost::default()));
        viewer.set_frame_host(host.clone());
        Self {
            hub,
            viewer,
            surface,
            id,
            host,
        }
    }

    fn ready() -> Self {
        let mut h = Self::new(ViewerProps::default(), RecordingSurface::new(Size::ZERO));
        h.pump();
        h
    }

    fn pump(&mut self) -> bool {
        self.viewer.pump(Instant::now())
    }

    fn drag(&self, touches: u8, delta: Vec2) {
        self.hub.emit(&InputEvent::Drag(DragEvent {
            target: self.id,
            down: true,
            touches,
            delta,
        }));
    }

    fn frames(&self) -> usize {
        self.surface.borrow().frame_count()
    }

    fn requested(&self) -> Vec<FrameRequest> {
        self.host.borrow().requested.clone()
    }

    fn cancelled(&self) -> Vec<FrameRequest> {
        self.host.borrow().cancelled.clone()
    }
}

fn triangle() -> Solid {
    Solid::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]])
}

#[test]
fn attach_sizes_surface_and_draws_once() {
    let h = Harness::ready();
    assert_eq!(h.surface.borrow().pixel_size(), Size::new(480, 480));
    assert!(h.viewer.render_handle().is_some());
    assert_eq!(h.frames(), 1);
    let frame = h.surface.borrow().last_frame().cloned().unwrap();
    assert_eq!(frame.viewport, Size::new(480, 480));
    assert!(matches!(frame.calls[1], DrawCall::Grid { .. }));
    assert!(matches!(frame.calls[2], DrawCall::Axis { size } if size == 10.0));
}

#[test]
fn drag_rotates_by_rotate_speed() {
    let mut h = Harness::ready();
    let before = *h.viewer.controls().unwrap();

    h.drag(1, Vec2::new(10.0, 0.0));
    assert!(h.pump());

    let after = *h.viewer.controls().unwrap();
    assert!((after.theta - (before.theta + 0.02)).abs() < 1e-6);
    assert!((after.phi - before.phi).abs() < 1e-6);
    assert!((after.radius - before.radius).abs() < 1e-3);
    assert_eq!(h.viewer.state().rotate_delta, Vec2::ZERO);
    assert!(h.viewer.state().inputs.pointer.is_down());
    let camera = h.viewer.camera().unwrap();
    assert!((camera.position() - after.eye_position()).length() < 1e-3);
    assert_eq!(h.frames(), 2);
}

#[test]
fn every_drag_sample_is_applied() {
    let mut h = Harness::ready();
    let before = h.viewer.controls().unwrap().theta;
    h.drag(1, Vec2::new(10.0, 0.0));
    h.drag(1, Vec2::new(10.0, 0.0));
    h.drag(1, Vec2::new(5.0, 0.0));
    h.pump();
    let after = h.viewer.controls().unwrap().theta;
    assert!((after - (before + 0.05)).abs() < 1e-5);
}

#[test]
fn modifier_drag_pans_target_and_camera_together() {
    let mut h = Harness::ready();
    let before_controls = *h.viewer.controls().unwrap();
    let before_offset = h.viewer.camera().unwrap().position() - before_controls.target;

    h.hub.emit(&InputEvent::KeyDown(Key::Shift));
    h.drag(1, Vec2::new(5.0, 0.0));
    h.pump();

    let controls = *h.viewer.controls().unwrap();
    let camera = *h.viewer.camera().unwrap();
    assert_ne!(controls.target, before_controls.target);
    assert!((controls.theta - before_controls.theta).abs() < 1e-6);
    assert!((camera.target() - controls.target).length() < 1e-4);
    assert!(((camera.position() - controls.target) - before_offset).length() < 1e-3);
    assert_eq!(h.viewer.state().pan_delta, Vec2::ZERO);

    h.hub.emit(&InputEvent::KeyUp(Key::Shift));
    h.drag(1, Vec2::new(5.0, 0.0));
    h.pump();
    assert!((h.viewer.controls().unwrap().theta - (before_controls.theta + 0.01)).abs() < 1e-6);
}

#[test]
fn three_finger_drag_pans() {
    let mut h = Harness::ready();
    let before = *h.viewer.controls().unwrap();
    h.drag(3, Vec2::new(0.0, 8.0));
    h.pump();
    let after = *h.viewer.controls().unwrap();
    assert_ne!(after.target, before.target);
    assert_eq!(after.theta, before.theta);
}

#[test]
fn wheel_and_pinch_zoom() {
    let mut h = Harness::ready();
    let start = h.viewer.controls().unwrap().radius;

    h.hub.emit(&InputEvent::Wheel(WheelEvent {
        target: h.id,
        delta: Vec2::new(0.0, 100.0),
    }));
    h.pump();
    let wheeled = h.viewer.controls().unwrap().radius;
    assert!((wheeled - (start + 3.0)).abs() < 1e-3);

    h.hub.emit(&InputEvent::Pinch(PinchEvent {
        target: h.id,
        touches: 2,
        delta: Vec2::new(100.0, 0.0),
    }));
    h.pump();
    let pinched = h.viewer.controls().unwrap().radius;
    assert!((pinched - start).abs() < 1e-3);
    assert_eq!(h.viewer.state().zoom_delta, 0.0);
}

#[test]
fn zoom_saturates_at_max_distance() {
    let mut h = Harness::ready();
    h.hub.emit(&InputEvent::Wheel(WheelEvent {
        target: h.id,
        delta: Vec2::new(0.0, 1.0e9),
    }));
    h.pump();
    let at_max = *h.viewer.camera().unwrap();
    assert_eq!(h.viewer.controls().unwrap().radius, 10_000.0);

    h.hub.emit(&InputEvent::Wheel(WheelEvent {
        target: h.id,
        delta: Vec2::new(0.0, 100.0),
    }));
    h.pump();
    assert!((h.viewer.camera().unwrap().position() - at_max.position()).length() < 1e-2);
}

#[test]
fn zero_delta_drag_changes_nothing() {
    let mut h = Harness::ready();
    let controls = *h.viewer.controls().unwrap();
    let camera = *h.viewer.camera().unwrap();

    h.drag(1, Vec2::ZERO);
    assert!(!h.pump());

    assert_eq!(*h.viewer.controls().unwrap(), controls);
    assert_eq!(*h.viewer.camera().unwrap(), camera);
    assert_eq!(h.frames(), 1);
}

#[test]
fn events_for_other_surfaces_are_ignored() {
    let mut h = Harness::ready();
    let controls = *h.viewer.controls().unwrap();
    h.hub.emit(&InputEvent::Drag(DragEvent {
        target: SurfaceId::new(),
        down: true,
        touches: 1,
        delta: Vec2::new(50.0, 50.0),
    }));
    h.pump();
    assert_eq!(*h.viewer.controls().unwrap(), controls);
    assert!(!h.viewer.state().inputs.pointer.is_down());
}

#[test]
fn unlaid_surface_defers_render_until_it_has_area() {
    let mut h = Harness::new(ViewerProps::default(), RecordingSurface::fixed(Size::ZERO));
    h.pump();
    assert!(h.viewer.render_handle().is_none());
    assert_eq!(h.frames(), 0);
    assert_eq!(h.surface.borrow().requested_sizes(), &[Size::new(480, 480)]);

    h.surface.borrow_mut().lay_out(Size::new(480, 480));
    assert!(h.pump());
    let handle = h.viewer.render_handle().unwrap();
    assert_eq!(handle.surface, h.id);
    assert_eq!(h.frames(), 1);
}

#[test]
fn static_mode_redraws_only_on_change() {
    let mut h = Harness::ready();
    assert!(!h.pump());
    assert!(!h.pump());
    assert_eq!(h.frames(), 1);

    h.viewer.set_solids(vec![triangle()]);
    assert!(h.pump());
    assert_eq!(h.frames(), 2);
    let last = h.surface.borrow().last_frame().cloned().unwrap();
    assert!(matches!(last.calls[3], DrawCall::Mesh { triangles: 1, .. }));

    h.viewer.set_solids(vec![triangle()]);
    assert!(!h.pump());
    assert_eq!(h.frames(), 2);
    assert!(h.requested().is_empty());
}

#[test]
fn hidden_grid_is_not_drawn() {
    let mut h = Harness::ready();
    let mut props = h.viewer.props().clone();
    props.scene.grid.show = false;
    h.viewer.set_props(props);
    h.pump();
    let last = h.surface.borrow().last_frame().cloned().unwrap();
    assert!(last.calls.iter().all(|c| !matches!(c, DrawCall::Grid { .. })));
    assert!(matches!(last.calls[1], DrawCall::Axis { .. }));
}

#[test]
fn resized_props_resize_surface_and_projection() {
    let mut h = Harness::ready();
    let mut props = h.viewer.props().clone();
    props.width = 640;
    props.height = 320;
    h.viewer.set_props(props);
    h.pump();
    assert_eq!(
        h.viewer.camera().unwrap().viewport().size(),
        Size::new(640, 320)
    );
    assert_eq!(h.surface.borrow().last_frame().unwrap().viewport, Size::new(640, 320));
}

#[test]
fn animated_loop_draws_per_frame_and_restarts_on_content() {
    let props = ViewerProps {
        animate: true,
        ..ViewerProps::default()
    };
    let mut h = Harness::new(props, RecordingSurface::new(Size::ZERO));
    let t0 = Instant::now();
    assert!(!h.viewer.pump(t0));
    assert!(h.viewer.is_animating());
    assert_eq!(h.frames(), 0);
    assert_eq!(h.requested().len(), 1);

    let first = h.requested()[0];
    let time = h
        .viewer
        .on_frame(first, t0 + Duration::from_millis(16))
        .unwrap();
    assert_eq!(time.delta, Duration::from_millis(16));
    assert_eq!(h.frames(), 1);
    let second = *h.requested().last().unwrap();

    h.viewer.set_solids(vec![triangle()]);
    h.viewer.pump(t0);
    assert_eq!(h.cancelled(), vec![second]);
    assert!(
        h.viewer
            .on_frame(second, t0 + Duration::from_millis(32))
            .is_none()
    );
    assert_eq!(h.frames(), 1);

    let third = *h.requested().last().unwrap();
    h.viewer
        .on_frame(third, t0 + Duration::from_millis(48))
        .unwrap();
    assert_eq!(h.frames(), 2);
}

#[test]
fn animate_without_frame_host_draws_statically() {
    let props = ViewerProps {
        animate: true,
        ..ViewerProps::default()
    };
    let hub = EventHub::new();
    let mut viewer: Viewer<RecordingSurface> = Viewer::mount(props, &hub);
    let surface = Rc::new(RefCell::new(RecordingSurface::new(Size::ZERO)));
    viewer.attach_surface(&surface);
    assert!(viewer.pump(Instant::now()));
    assert!(!viewer.is_animating());
    assert_eq!(surface.borrow().frame_count(), 1);
}

#[test]
fn unmount_cancels_loop_and_detaches_input() {
    let props = ViewerProps {
        animate: true,
        ..ViewerProps::default()
    };
    let mut h = Harness::new(props, RecordingSurface::new(Size::ZERO));
    h.pump();
    let pending = *h.requested().last().unwrap();
    let Harness {
        hub, viewer, host, ..
    } = h;
    viewer.unmount();
    assert_eq!(host.borrow().cancelled, vec![pending]);
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn dropping_viewer_cancels_pending_frame() {
    let props = ViewerProps {
        animate: true,
        ..ViewerProps::default()
    };
    let mut h = Harness::new(props, RecordingSurface::new(Size::ZERO));
    h.pump();
    let pending = *h.requested().last().unwrap();
    let Harness {
        hub, viewer, host, ..
    } = h;
    drop(viewer);
    assert_eq!(host.borrow().cancelled, vec![pending]);
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn replacing_frame_host_cancels_on_the_old_one() {
    let props = ViewerProps {
        animate: true,
        ..ViewerProps::default()
    };
    let mut h = Harness::new(props, RecordingSurface::new(Size::ZERO));
    h.pump();
    let pending = *h.requested().last().unwrap();

    let other = Rc::new(RefCell::new(TestHost::default()));
    h.viewer.set_frame_host(other.clone());
    assert_eq!(h.cancelled(), vec![pending]);
    h.pump();
    assert_eq!(other.borrow().requested.len(), 1);
    assert!(h.viewer.is_animating());
}

#[test]
fn reattaching_replaces_render_handle() {
    let mut h = Harness::ready();
    let first = h.viewer.render_handle().unwrap();
    let other = Rc::new(RefCell::new(RecordingSurface::new(Size::ZERO)));
    let id = h.viewer.attach_surface(&other);
    h.pump();
    let second = h.viewer.render_handle().unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(second.surface, id);
    assert_eq!(other.borrow().frame_count(), 1);
    assert_eq!(h.frames(), 1);
}

/// Shows each solid as an axis as long as its farthest vertex.
struct AxisPerSolid;

impl EntityConverter for AxisPerSolid {
    fn convert(&self, _rendering: &RenderingOptions, solids: &[Solid]) -> Vec<Entity> {
        solids
            .iter()
            .map(|solid| {
                let size = solid.positions.iter().map(|p| p.length()).fold(0.0, f32::max);
                Entity::Axis(AxisEntity {
                    visuals: Visuals {
                        draw_cmd: DrawCmd::Axis,
                        show: true,
                    },
                    size,
                })
            })
            .collect()
    }
}

#[test]
fn custom_converter_entities_reach_the_surface() {
    let hub = EventHub::new();
    let mut props = ViewerProps::default();
    props.scene.grid.show = false;
    props.scene.axis.show = false;
    let mut viewer: Viewer<RecordingSurface> =
        Viewer::mount(props, &hub).with_converter(AxisPerSolid);
    viewer.set_solids(vec![Solid::new(
        vec![Vec3::ZERO, Vec3::X * 7.0, Vec3::Y],
        vec![[0, 1, 2]],
    )]);
    let surface = Rc::new(RefCell::new(RecordingSurface::new(Size::ZERO)));
    viewer.attach_surface(&surface);
    assert!(viewer.pump(Instant::now()));

    let frame = surface.borrow().last_frame().cloned().unwrap();
    let axes: Vec<_> = frame
        .calls
        .iter()
        .filter_map(|c| match c {
            DrawCall::Axis { size } => Some(*size),
            _ => None,
        })
        .collect();
    assert_eq!(axes, vec![7.0]);
    assert!(frame.calls.iter().all(|c| !matches!(c, DrawCall::Mesh { .. })));
}

#[test]
fn detached_viewer_stops_drawing_until_reattached() {
    let mut h = Harness::ready();
    assert_eq!(h.frames(), 1);

    h.viewer.detach_surface();
    assert!(h.viewer.render_handle().is_none());
    assert_eq!(h.viewer.state().element, None);
    h.viewer.set_solids(vec![triangle()]);
    h.drag(1, Vec2::new(10.0, 0.0));
    assert!(!h.pump());
    assert_eq!(h.frames(), 1);

    let id = h.viewer.attach_surface(&h.surface);
    assert!(h.pump());
    assert_eq!(h.viewer.render_handle().unwrap().surface, id);
    assert_eq!(h.frames(), 2);
}
