use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use glam::Vec2;
use solidview_common::{Size, Solid};
use solidview_input::{DragEvent, EventHub, InputEvent, Key, PinchEvent, WheelEvent};
use solidview_render::RecordingSurface;
use solidview_viewer::{FrameHost, FrameRequest, Viewer, ViewerProps};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Simulated frame interval for animated runs.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "solidview-cli", about = "Headless tools for the solid viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default viewer settings
    Info,
    /// Validate a viewer configuration file
    CheckConfig {
        /// Path to the JSON configuration
        path: PathBuf,
    },
    /// Drive a viewer with scripted gestures and print the recorded frames
    Simulate {
        /// Viewer configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Solids to display (JSON array)
        #[arg(long)]
        solids: Option<PathBuf>,
        /// Gestures to apply in order, e.g. `rotate:10,0 pan:5,0 zoom:100 pinch:20`
        #[arg(short, long, value_delimiter = ' ', num_args = 0..)]
        gesture: Vec<Gesture>,
        /// Frames to run when the configuration animates
        #[arg(long, default_value = "3")]
        frames: u32,
    },
}

/// One scripted input gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Rotate(Vec2),
    Pan(Vec2),
    Zoom(f32),
    Pinch(f32),
}

impl FromStr for Gesture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, args) = s
            .split_once(':')
            .with_context(|| format!("gesture `{s}` is missing `:`"))?;
        let values = args
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("gesture `{s}` has a non-numeric value"))?;
        let gesture = match (kind, values.as_slice()) {
            ("rotate", [x, y]) => Self::Rotate(Vec2::new(*x, *y)),
            ("pan", [x, y]) => Self::Pan(Vec2::new(*x, *y)),
            ("zoom", [d]) => Self::Zoom(*d),
            ("pinch", [d]) => Self::Pinch(*d),
            _ => bail!("unknown gesture `{s}`"),
        };
        Ok(gesture)
    }
}

impl Gesture {
    /// Host events that perform this gesture on `target`.
    fn events(self, target: solidview_common::SurfaceId, modifier: Key) -> Vec<InputEvent> {
        let press = InputEvent::Drag(DragEvent {
            target,
            down: true,
            touches: 1,
            delta: Vec2::ZERO,
        });
        let release = InputEvent::Drag(DragEvent {
            target,
            down: false,
            touches: 1,
            delta: Vec2::ZERO,
        });
        let drag = |delta| {
            InputEvent::Drag(DragEvent {
                target,
                down: true,
                touches: 1,
                delta,
            })
        };
        match self {
            Self::Rotate(delta) => vec![press, drag(delta), release],
            Self::Pan(delta) => vec![
                InputEvent::KeyDown(modifier),
                press,
                drag(delta),
                release,
                InputEvent::KeyUp(modifier),
            ],
            Self::Zoom(d) => vec![InputEvent::Wheel(WheelEvent {
                target,
                delta: Vec2::new(0.0, d),
            })],
            Self::Pinch(d) => vec![InputEvent::Pinch(PinchEvent {
                target,
                touches: 2,
                delta: Vec2::new(d, 0.0),
            })],
        }
    }
}

/// Frame source with no display. Requests are answered by [`run_frames`].
#[derive(Default)]
struct Headless {
    next: u64,
    pending: Option<FrameRequest>,
}

impl FrameHost for Headless {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

fn run_frames(
    host: &RefCell<Headless>,
    viewer: &mut Viewer<RecordingSurface>,
    frames: u32,
    mut now: Instant,
) {
    for _ in 0..frames {
        let Some(request) = host.borrow_mut().pending.take() else {
            break;
        };
        now += FRAME_INTERVAL;
        if let Some(time) = viewer.on_frame(request, now) {
            tracing::debug!(elapsed = ?time.elapsed, delta = ?time.delta, "frame");
        }
    }
}

fn load_solids(path: &Path) -> anyhow::Result<Vec<Solid>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading solids from {}", path.display()))?;
    let solids: Vec<Solid> = serde_json::from_str(&text)
        .with_context(|| format!("parsing solids in {}", path.display()))?;
    tracing::info!(count = solids.len(), "loaded solids");
    Ok(solids)
}

fn simulate(
    config: Option<&Path>,
    solids: Option<&Path>,
    gestures: &[Gesture],
    frames: u32,
) -> anyhow::Result<()> {
    let props = match config {
        Some(path) => ViewerProps::from_json_file(path)?,
        None => ViewerProps::default(),
    };
    let modifier = Key::from(props.modifier_key);
    let animate = props.animate;

    let hub = EventHub::new();
    let mut viewer = Viewer::mount(props, &hub);
    if let Some(path) = solids {
        viewer.set_solids(load_solids(path)?);
    }
    let surface = Rc::new(RefCell::new(RecordingSurface::new(Size::ZERO)));
    let target = viewer.attach_surface(&surface);

    let host = Rc::new(RefCell::new(Headless::default()));
    viewer.set_frame_host(host.clone());
    let start = Instant::now();
    viewer.pump(start);
    for gesture in gestures {
        tracing::debug!(?gesture, "applying gesture");
        for event in gesture.events(target, modifier) {
            hub.emit(&event);
        }
        viewer.pump(start);
    }
    if animate {
        run_frames(&host, &mut viewer, frames, start);
    }

    print!("{}", surface.borrow().to_text());
    if let (Some(camera), Some(controls)) = (viewer.camera(), viewer.controls()) {
        let p = camera.position();
        println!("camera: position=({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
        println!(
            "controls: theta={:.4} phi={:.4} radius={:.3}",
            controls.theta, controls.phi, controls.radius
        );
    }
    println!("actions: {}", viewer.dispatched_actions());
    viewer.unmount();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("solidview-cli v{}", env!("CARGO_PKG_VERSION"));
            let camera = solidview_camera::perspective::defaults();
            println!(
                "camera: fov={:.4} near={} far={}",
                camera.fov(),
                camera.near(),
                camera.far()
            );
            let controls = solidview_camera::orbit::defaults();
            println!(
                "controls: distance=[{}, {}] phi=[{:.2}, {:.2}]",
                controls.min_distance, controls.max_distance, controls.min_phi, controls.max_phi
            );
            println!("default props:");
            println!("{}", serde_json::to_string_pretty(&ViewerProps::default())?);
        }
        Commands::CheckConfig { path } => {
            let props = ViewerProps::from_json_file(&path)?;
            let size = props.size();
            println!(
                "{}: ok ({}x{}, animate={}, modifier={:?})",
                path.display(),
                size.width,
                size.height,
                props.animate,
                props.modifier_key
            );
        }
        Commands::Simulate {
            config,
            solids,
            gesture,
            frames,
        } => {
            simulate(config.as_deref(), solids.as_deref(), &gesture, frames)?;
        }
    }

    Ok(())
}
