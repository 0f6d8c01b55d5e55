use crate::Rgba;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// An opaque renderable solid: an indexed triangle soup plus an optional color
/// and a placement transform.
///
/// The viewer never builds or edits solids. They come from an external
/// geometry source and are only converted into draw entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    #[serde(default)]
    pub color: Option<Rgba>,
    #[serde(default = "identity")]
    pub transform: Mat4,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl Solid {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            color: None,
            transform: Mat4::IDENTITY,
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// World-space corners of every triangle, skipping triangles that index
    /// outside `positions`.
    pub fn world_triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles.iter().filter_map(|[a, b, c]| {
            let a = self.positions.get(*a as usize)?;
            let b = self.positions.get(*b as usize)?;
            let c = self.positions.get(*c as usize)?;
            Some([
                self.transform.transform_point3(*a),
                self.transform.transform_point3(*b),
                self.transform.transform_point3(*c),
            ])
        })
    }
}
