use solidview_common::{Rgba, Solid};
use std::sync::Arc;

/// Name of the draw command an entity is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawCmd {
    Grid,
    Axis,
    Mesh,
}

impl DrawCmd {
    pub fn name(self) -> &'static str {
        match self {
            Self::Grid => "drawGrid",
            Self::Axis => "drawAxis",
            Self::Mesh => "drawMesh",
        }
    }
}

/// Attributes every entity carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visuals {
    pub draw_cmd: DrawCmd,
    pub show: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridEntity {
    pub visuals: Visuals,
    pub color: Rgba,
    pub sub_color: Rgba,
    pub fade_out: bool,
    pub transparent: bool,
    pub size: [f32; 2],
    pub ticks: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisEntity {
    pub visuals: Visuals,
    /// Length of each axis line in world units.
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshEntity {
    pub visuals: Visuals,
    pub color: Rgba,
    pub transparent: bool,
    pub solid: Arc<Solid>,
}

/// One drawable unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Grid(GridEntity),
    Axis(AxisEntity),
    Mesh(MeshEntity),
}

impl Entity {
    pub fn visuals(&self) -> &Visuals {
        match self {
            Self::Grid(e) => &e.visuals,
            Self::Axis(e) => &e.visuals,
            Self::Mesh(e) => &e.visuals,
        }
    }

    pub fn draw_cmd(&self) -> DrawCmd {
        self.visuals().draw_cmd
    }

    pub fn is_shown(&self) -> bool {
        self.visuals().show
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_cmd_names() {
        assert_eq!(DrawCmd::Grid.name(), "drawGrid");
        assert_eq!(DrawCmd::Axis.name(), "drawAxis");
        assert_eq!(DrawCmd::Mesh.name(), "drawMesh");
    }

    #[test]
    fn entity_exposes_visuals() {
        let axis = Entity::Axis(AxisEntity {
            visuals: Visuals {
                draw_cmd: DrawCmd::Axis,
                show: false,
            },
            size: 10.0,
        });
        assert_eq!(axis.draw_cmd(), DrawCmd::Axis);
        assert!(!axis.is_shown());
    }
}
