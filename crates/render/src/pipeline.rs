use crate::entity::{AxisEntity, DrawCmd, Entity, GridEntity, MeshEntity, Visuals};
use crate::options::{RenderingOptions, SceneOptions};
use crate::surface::{DrawCommands, FrameContext, OutputSurface};
use solidview_camera::CameraState;
use solidview_common::{Solid, SurfaceId};
use solidview_kernel::RenderHandle;
use std::cell::RefCell;
use std::rc::Weak;
use std::sync::Arc;

pub const DEFAULT_AXIS_SIZE: f32 = 10.0;

/// Converts solids into mesh entities.
pub trait EntityConverter {
    fn convert(&self, rendering: &RenderingOptions, solids: &[Solid]) -> Vec<Entity>;
}

/// Default converter: one visible mesh entity per solid. Solids without a
/// color take the configured mesh color; alpha below one marks the entity
/// transparent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolidConverter;

impl EntityConverter for SolidConverter {
    fn convert(&self, rendering: &RenderingOptions, solids: &[Solid]) -> Vec<Entity> {
        solids
            .iter()
            .map(|solid| {
                let color = solid.color.unwrap_or(rendering.mesh_color);
                Entity::Mesh(MeshEntity {
                    visuals: Visuals {
                        draw_cmd: DrawCmd::Mesh,
                        show: true,
                    },
                    color,
                    transparent: color[3] < 1.0,
                    solid: Arc::new(solid.clone()),
                })
            })
            .collect()
    }
}

/// Grid (if shown), axis (if shown), then the converted solids in order.
pub fn build_entities(
    options: &SceneOptions,
    solids: &[Solid],
    converter: &dyn EntityConverter,
) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(solids.len() + 2);
    let grid = &options.grid;
    if grid.show {
        entities.push(Entity::Grid(GridEntity {
            visuals: Visuals {
                draw_cmd: DrawCmd::Grid,
                show: true,
            },
            color: grid.color,
            sub_color: grid.sub_color,
            fade_out: grid.fade_out,
            transparent: grid.transparent,
            size: grid.size,
            ticks: grid.ticks,
        }));
    }
    if options.axis.show {
        entities.push(Entity::Axis(AxisEntity {
            visuals: Visuals {
                draw_cmd: DrawCmd::Axis,
                show: true,
            },
            size: DEFAULT_AXIS_SIZE,
        }));
    }
    entities.extend(converter.convert(&options.rendering, solids));
    tracing::debug!(count = entities.len(), solids = solids.len(), "entities built");
    entities
}

/// What a render function needs to bind a surface.
pub struct SurfaceOptions<S> {
    pub surface: Weak<RefCell<S>>,
    pub surface_id: SurfaceId,
    pub handle_id: u64,
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderContent<'a> {
    pub camera: &'a CameraState,
    pub entities: &'a [Entity],
    pub rendering: &'a RenderingOptions,
}

/// A render function bound to one surface.
pub struct RenderFn<S> {
    surface: Weak<RefCell<S>>,
    handle: RenderHandle,
}

/// Bind a surface for rendering.
///
/// Returns `None` while the surface is gone or has no area yet.
pub fn prepare_render<S: OutputSurface>(options: SurfaceOptions<S>) -> Option<RenderFn<S>> {
    let surface = options.surface.upgrade()?;
    let size = surface.try_borrow().ok()?.pixel_size();
    if !size.is_positive() {
        tracing::debug!(?size, "surface has no area, render not prepared");
        return None;
    }
    let handle = RenderHandle {
        id: options.handle_id,
        surface: options.surface_id,
    };
    tracing::debug!(handle = handle.id, ?size, "render prepared");
    Some(RenderFn {
        surface: options.surface,
        handle,
    })
}

impl<S: OutputSurface> RenderFn<S> {
    pub fn handle(&self) -> RenderHandle {
        self.handle
    }

    /// Issue one frame. Returns false when the surface is gone or busy.
    pub fn render(&self, content: &RenderContent<'_>) -> bool {
        let Some(surface) = self.surface.upgrade() else {
            return false;
        };
        let Ok(mut surface) = surface.try_borrow_mut() else {
            tracing::warn!(handle = self.handle.id, "surface busy, frame skipped");
            return false;
        };
        let _span = tracing::info_span!("render_frame", handle = self.handle.id).entered();

        let ctx = FrameContext {
            camera: content.camera,
            rendering: content.rendering,
        };
        draw_frame(&mut *surface, &ctx, content.entities);
        true
    }
}

fn draw_frame(target: &mut dyn DrawCommands, ctx: &FrameContext<'_>, entities: &[Entity]) {
    target.clear(ctx);
    for entity in entities.iter().filter(|e| e.is_shown()) {
        match entity {
            Entity::Grid(grid) => target.draw_grid(ctx, grid),
            Entity::Axis(axis) => target.draw_axis(ctx, axis),
            Entity::Mesh(mesh) => target.draw_mesh(ctx, mesh),
        }
    }
    target.end_frame();
    tracing::trace!(entities = entities.len(), "frame issued");
}
