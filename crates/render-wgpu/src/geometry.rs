use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use solidview_common::{Rgba, Solid};
use solidview_render::{AxisEntity, FrameContext, GridEntity};

/// Grids denser than this per direction are skipped.
const MAX_LINES_PER_AXIS: f32 = 2_000.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

/// Per-frame uniform block shared by the line and mesh shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub light_color: [f32; 4],
    pub light_direction: [f32; 4],
    pub light_position: [f32; 4],
    /// Ambient, diffuse, specular, shininess.
    pub amounts: [f32; 4],
}

pub(crate) fn frame_uniforms(ctx: &FrameContext<'_>) -> FrameUniforms {
    let r = ctx.rendering;
    let p = ctx.camera.position();
    let d = Vec3::from(r.light_direction).normalize_or(Vec3::Z);
    let [lx, ly, lz] = r.light_position;
    FrameUniforms {
        view_proj: ctx.camera.view_projection().to_cols_array_2d(),
        camera_position: [p.x, p.y, p.z, 1.0],
        light_color: r.light_color,
        light_direction: [d.x, d.y, d.z, 0.0],
        light_position: [lx, ly, lz, 1.0],
        amounts: [
            r.ambient_light_amount,
            r.diffuse_light_amount,
            r.specular_light_amount,
            r.material_shininess,
        ],
    }
}

/// Line list for a grid in the XY plane centered on the origin. Major lines
/// use `color`, minor lines `sub_color`. Every line is split at the center so
/// that fading can reach full strength there.
pub(crate) fn grid_lines(grid: &GridEntity) -> Vec<LineVertex> {
    let half = [grid.size[0] * 0.5, grid.size[1] * 0.5];
    if !(half[0] > 0.0 && half[1] > 0.0) {
        return Vec::new();
    }
    let [major, minor] = grid.ticks;
    let mut out = Vec::new();
    for offset in tick_offsets(half[1], minor).filter(|o| !on_tick(*o, major)) {
        push_grid_line(&mut out, grid, half, offset, true, grid.sub_color);
    }
    for offset in tick_offsets(half[0], minor).filter(|o| !on_tick(*o, major)) {
        push_grid_line(&mut out, grid, half, offset, false, grid.sub_color);
    }
    for offset in tick_offsets(half[1], major) {
        push_grid_line(&mut out, grid, half, offset, true, grid.color);
    }
    for offset in tick_offsets(half[0], major) {
        push_grid_line(&mut out, grid, half, offset, false, grid.color);
    }
    out
}

fn tick_offsets(half: f32, spacing: f32) -> impl Iterator<Item = f32> {
    let count = if spacing > 0.0 && spacing.is_finite() && half / spacing <= MAX_LINES_PER_AXIS {
        (half / spacing).floor() as i32
    } else {
        if spacing != 0.0 {
            tracing::warn!(spacing, "grid spacing out of range, lines skipped");
        }
        -1
    };
    (-count..=count).map(move |i| i as f32 * spacing)
}

fn on_tick(offset: f32, spacing: f32) -> bool {
    if !(spacing > 0.0) {
        return false;
    }
    let q = offset / spacing;
    (q - q.round()).abs() < 1e-4
}

fn push_grid_line(
    out: &mut Vec<LineVertex>,
    grid: &GridEntity,
    half: [f32; 2],
    offset: f32,
    along_x: bool,
    color: Rgba,
) {
    let extent = if along_x { half[0] } else { half[1] };
    let vertex = |t: f32| {
        let p = if along_x {
            Vec3::new(t, offset, 0.0)
        } else {
            Vec3::new(offset, t, 0.0)
        };
        let mut c = color;
        if grid.fade_out {
            let fade = 1.0 - (p.x.abs() / half[0]).max(p.y.abs() / half[1]);
            c[3] *= fade.clamp(0.0, 1.0);
        }
        LineVertex {
            position: p.to_array(),
            color: c,
        }
    };
    out.extend([vertex(-extent), vertex(0.0), vertex(0.0), vertex(extent)]);
}

/// Three lines from the origin: X red, Y green, Z blue.
pub(crate) fn axis_lines(axis: &AxisEntity) -> Vec<LineVertex> {
    let s = axis.size;
    [
        (Vec3::X, [1.0, 0.0, 0.0, 1.0]),
        (Vec3::Y, [0.0, 1.0, 0.0, 1.0]),
        (Vec3::Z, [0.0, 0.0, 1.0, 1.0]),
    ]
    .into_iter()
    .flat_map(|(dir, color)| {
        [
            LineVertex {
                position: [0.0; 3],
                color,
            },
            LineVertex {
                position: (dir * s).to_array(),
                color,
            },
        ]
    })
    .collect()
}

/// Flat-shaded triangle list in world space.
pub(crate) fn mesh_vertices(solid: &Solid, color: Rgba) -> Vec<MeshVertex> {
    let mut out = Vec::with_capacity(solid.triangle_count() * 3);
    for [a, b, c] in solid.world_triangles() {
        let normal = (b - a).cross(c - a).normalize_or(Vec3::Z).to_array();
        for p in [a, b, c] {
            out.push(MeshVertex {
                position: p.to_array(),
                normal,
                color,
            });
        }
    }
    out
}
