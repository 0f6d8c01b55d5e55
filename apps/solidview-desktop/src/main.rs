mod demo;

use anyhow::Result;
use clap::Parser;
use demo::StairParams;
use egui::Context as EguiContext;
use glam::{Vec2, Vec3};
use solidview_common::Size;
use solidview_input::{EventHub, GestureRecognizer, InputEvent, Key, PointerSample};
use solidview_render::OutputSurface;
use solidview_render_wgpu::WgpuSurface;
use solidview_viewer::{FrameHost, FrameRequest, Viewer, ViewerProps};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Pixels per scrolled line.
const LINE_HEIGHT: f32 = 100.0;
/// Contact id of the mouse. Touch ids are shifted past it.
const MOUSE_CONTACT: u64 = 0;

#[derive(Parser)]
#[command(name = "solidview-desktop", about = "Orbit viewer for solids")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Surface width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Redraw continuously instead of on change
    #[arg(long)]
    animate: bool,
}

/// Frame callbacks are window redraws.
#[derive(Default)]
struct RedrawFrames {
    window: Option<Arc<Window>>,
    next: u64,
    pending: Option<FrameRequest>,
}

impl FrameHost for RedrawFrames {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.pending = Some(request);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

/// Camera readout for the side panel.
struct Status {
    position: Vec3,
    theta: f32,
    phi: f32,
    radius: f32,
}

struct Gpu {
    window: Arc<Window>,
    surface: Rc<RefCell<WgpuSurface>>,
    recognizer: GestureRecognizer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct DesktopApp {
    hub: EventHub,
    viewer: Viewer<WgpuSurface>,
    frames: Rc<RefCell<RedrawFrames>>,
    stairs: StairParams,
    cursor: Vec2,
    egui_ctx: EguiContext,
    gpu: Option<Gpu>,
}

impl DesktopApp {
    fn new(props: ViewerProps) -> Self {
        let hub = EventHub::new();
        let mut viewer = Viewer::mount(props, &hub);
        let frames = Rc::new(RefCell::new(RedrawFrames::default()));
        viewer.set_frame_host(frames.clone());
        let stairs = StairParams::default();
        viewer.set_solids(demo::stairs(&stairs));
        Self {
            hub,
            viewer,
            frames,
            stairs,
            cursor: Vec2::ZERO,
            egui_ctx: EguiContext::default(),
            gpu: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let size = self.viewer.props().size();
        let attrs = Window::default_attributes()
            .with_title("solidview")
            .with_inner_size(PhysicalSize::new(size.width, size.height));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let inner = window.inner_size();

        let mut surface = WgpuSurface::new(window.clone(), Size::new(inner.width, inner.height))?;
        surface.set_auto_present(false);
        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(surface.device(), surface.format(), None, 1, false);

        let surface = Rc::new(RefCell::new(surface));
        let id = self.viewer.attach_surface(&surface);
        self.frames.borrow_mut().window = Some(window.clone());
        window.request_redraw();
        self.gpu = Some(Gpu {
            window,
            surface,
            recognizer: GestureRecognizer::new(id),
            egui_winit,
            egui_renderer,
        });
        Ok(())
    }

    fn status(&self) -> Option<Status> {
        let camera = self.viewer.camera()?;
        let controls = self.viewer.controls()?;
        Some(Status {
            position: camera.position(),
            theta: controls.theta,
            phi: controls.phi,
            radius: controls.radius,
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let status = self.status();
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let mut props = self.viewer.props().clone();
        let before = self.stairs;
        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            draw_ui(ctx, &mut self.stairs, &mut props, status.as_ref());
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);
        if self.stairs != before {
            self.viewer.set_solids(demo::stairs(&self.stairs));
        }
        self.viewer.set_props(props);

        let mut drawn = self.viewer.pump(now);
        let pending = self.frames.borrow_mut().pending.take();
        if let Some(request) = pending {
            drawn |= self.viewer.on_frame(request, now).is_some();
        }
        // The panel is painted over the scene, so every redraw needs one.
        if !drawn {
            self.viewer.render_now();
        }

        let mut surface = gpu.surface.borrow_mut();
        if let Some(size) = surface.take_requested_size() {
            let _ = gpu
                .window
                .request_inner_size(PhysicalSize::new(size.width, size.height));
        }
        let Some(view) = surface.frame_view() else {
            return;
        };

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let pixels = surface.pixel_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [pixels.width, pixels.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        let device = surface.device();
        let queue = surface.queue();
        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        gpu.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }
        surface.present();
    }
}

fn draw_ui(
    ctx: &EguiContext,
    stairs: &mut StairParams,
    props: &mut ViewerProps,
    status: Option<&Status>,
) {
    egui::Window::new("Stairs")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.add(egui::Slider::new(&mut stairs.steps, 1..=24).text("steps"));
            ui.add(egui::Slider::new(&mut stairs.rise, 1.0..=40.0).text("rise"));
            ui.add(egui::Slider::new(&mut stairs.run, 1.0..=40.0).text("run"));
            ui.add(egui::Slider::new(&mut stairs.width, 5.0..=120.0).text("width"));
            ui.separator();
            ui.checkbox(&mut props.scene.grid.show, "Grid");
            ui.checkbox(&mut props.scene.axis.show, "Axis");
            ui.checkbox(&mut props.animate, "Animate");
            if let Some(s) = status {
                ui.separator();
                ui.label(format!(
                    "camera ({:.1}, {:.1}, {:.1})",
                    s.position.x, s.position.y, s.position.z
                ));
                ui.label(format!(
                    "theta {:.3}  phi {:.3}  radius {:.1}",
                    s.theta, s.phi, s.radius
                ));
            }
            ui.separator();
            ui.small("Drag: orbit | Shift+drag: pan | Wheel: zoom");
        });
}

fn modifier_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Key::Shift),
        KeyCode::ControlLeft | KeyCode::ControlRight => Some(Key::Control),
        KeyCode::AltLeft | KeyCode::AltRight => Some(Key::Alt),
        KeyCode::SuperLeft | KeyCode::SuperRight => Some(Key::Meta),
        _ => None,
    }
}

fn feed(hub: &EventHub, gpu: &mut Gpu, sample: PointerSample) {
    let events = gpu.recognizer.feed(sample);
    if events.is_empty() {
        return;
    }
    for event in &events {
        hub.emit(event);
    }
    gpu.window.request_redraw();
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize GPU: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.repaint {
            gpu.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.surface
                    .borrow_mut()
                    .resize(Size::new(new_size.width, new_size.height));
                gpu.window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(key) = modifier_key(code) {
                    let event = match state {
                        ElementState::Pressed => InputEvent::KeyDown(key),
                        ElementState::Released => InputEvent::KeyUp(key),
                    };
                    self.hub.emit(&event);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                let sample = PointerSample::Move {
                    id: MOUSE_CONTACT,
                    position: self.cursor,
                };
                feed(&self.hub, gpu, sample);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                let sample = match state {
                    ElementState::Pressed => PointerSample::Down {
                        id: MOUSE_CONTACT,
                        position: self.cursor,
                    },
                    ElementState::Released => PointerSample::Up { id: MOUSE_CONTACT },
                };
                feed(&self.hub, gpu, sample);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(-x, -y) * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(p) => Vec2::new(-p.x as f32, -p.y as f32),
                };
                feed(&self.hub, gpu, PointerSample::Wheel { delta });
            }
            WindowEvent::Touch(touch) => {
                let id = touch.id + 1;
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                let sample = match touch.phase {
                    TouchPhase::Started => PointerSample::Down { id, position },
                    TouchPhase::Moved => PointerSample::Move { id, position },
                    TouchPhase::Ended => PointerSample::Up { id },
                    TouchPhase::Cancelled => PointerSample::Cancel { id },
                };
                feed(&self.hub, gpu, sample);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut props = match &cli.config {
        Some(path) => ViewerProps::from_json_file(path)?,
        None => ViewerProps::default(),
    };
    if let Some(width) = cli.width {
        props.width = width;
    }
    if let Some(height) = cli.height {
        props.height = height;
    }
    props.animate |= cli.animate;
    props.validate()?;

    tracing::info!("solidview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DesktopApp::new(props);
    event_loop.run_app(&mut app)?;

    Ok(())
}
