use crate::entity::{AxisEntity, GridEntity, MeshEntity};
use crate::surface::{DrawCommands, FrameContext, OutputSurface};
use glam::Vec3;
use solidview_common::{Rgba, Size};
use std::fmt::Write as _;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear { background: Rgba },
    Grid { size: [f32; 2], ticks: [f32; 2] },
    Axis { size: f32 },
    Mesh { triangles: usize, color: Rgba },
}

/// Draw calls of one completed frame plus the camera they were issued with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub camera_position: Vec3,
    pub viewport: Size,
    pub calls: Vec<DrawCall>,
}

/// In-memory output surface that records every frame instead of drawing.
///
/// Used for headless output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    size: Size,
    follows_requests: bool,
    requested: Vec<Size>,
    pending: Option<RecordedFrame>,
    frames: Vec<RecordedFrame>,
}

impl RecordingSurface {
    /// A surface that immediately takes whatever size is requested.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            follows_requests: true,
            ..Self::default()
        }
    }

    /// A surface whose size only changes through [`lay_out`](Self::lay_out),
    /// like a container the host has not laid out yet.
    pub fn fixed(size: Size) -> Self {
        Self {
            size,
            follows_requests: false,
            ..Self::default()
        }
    }

    /// Host-side layout pass.
    pub fn lay_out(&mut self, size: Size) {
        self.size = size;
    }

    pub fn requested_sizes(&self) -> &[Size] {
        &self.requested
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    /// Human-readable log of every recorded frame.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (index, frame) in self.frames.iter().enumerate() {
            let p = frame.camera_position;
            let _ = writeln!(
                out,
                "=== Frame {index} (camera=({:.2}, {:.2}, {:.2}) viewport={}x{}) ===",
                p.x, p.y, p.z, frame.viewport.width, frame.viewport.height
            );
            for call in &frame.calls {
                let _ = match call {
                    DrawCall::Clear { background } => {
                        writeln!(out, "  clear background={background:?}")
                    }
                    DrawCall::Grid { size, ticks } => {
                        writeln!(out, "  drawGrid size={size:?} ticks={ticks:?}")
                    }
                    DrawCall::Axis { size } => writeln!(out, "  drawAxis size={size:.1}"),
                    DrawCall::Mesh { triangles, color } => {
                        writeln!(out, "  drawMesh triangles={triangles} color={color:?}")
                    }
                };
            }
        }
        out
    }

    fn push(&mut self, call: DrawCall) {
        match self.pending.as_mut() {
            Some(frame) => frame.calls.push(call),
            None => tracing::warn!(?call, "draw call outside a frame ignored"),
        }
    }
}

impl DrawCommands for RecordingSurface {
    fn clear(&mut self, ctx: &FrameContext<'_>) {
        self.pending = Some(RecordedFrame {
            camera_position: ctx.camera.position(),
            viewport: ctx.camera.viewport().size(),
            calls: vec![DrawCall::Clear {
                background: ctx.rendering.background,
            }],
        });
    }

    fn draw_grid(&mut self, _ctx: &FrameContext<'_>, grid: &GridEntity) {
        self.push(DrawCall::Grid {
            size: grid.size,
            ticks: grid.ticks,
        });
    }

    fn draw_axis(&mut self, _ctx: &FrameContext<'_>, axis: &AxisEntity) {
        self.push(DrawCall::Axis { size: axis.size });
    }

    fn draw_mesh(&mut self, _ctx: &FrameContext<'_>, mesh: &MeshEntity) {
        self.push(DrawCall::Mesh {
            triangles: mesh.solid.triangle_count(),
            color: mesh.color,
        });
    }

    fn end_frame(&mut self) {
        if let Some(frame) = self.pending.take() {
            self.frames.push(frame);
        }
    }
}

impl OutputSurface for RecordingSurface {
    fn pixel_size(&self) -> Size {
        self.size
    }

    fn request_size(&mut self, size: Size) {
        self.requested.push(size);
        if self.follows_requests {
            self.size = size;
        }
    }
}
