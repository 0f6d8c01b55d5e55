use serde::{Deserialize, Serialize};
use solidview_common::Rgba;

/// Grid overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub show: bool,
    /// Color of the major lines.
    pub color: Rgba,
    /// Color of the minor lines.
    pub sub_color: Rgba,
    /// Fade lines out toward the grid border.
    pub fade_out: bool,
    pub transparent: bool,
    /// Extent along X and Y in world units.
    pub size: [f32; 2],
    /// Major and minor line spacing in world units.
    pub ticks: [f32; 2],
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            show: true,
            color: [0.0, 0.0, 0.0, 1.0],
            sub_color: [0.0, 0.0, 1.0, 0.5],
            fade_out: false,
            transparent: true,
            size: [144.0, 144.0],
            ticks: [12.0, 1.0],
        }
    }
}

/// Axis overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisOptions {
    pub show: bool,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self { show: true }
    }
}

/// Surface appearance and lighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingOptions {
    pub background: Rgba,
    pub mesh_color: Rgba,
    pub light_color: Rgba,
    pub light_direction: [f32; 3],
    pub light_position: [f32; 3],
    pub ambient_light_amount: f32,
    pub diffuse_light_amount: f32,
    pub specular_light_amount: f32,
    pub material_shininess: f32,
}

impl Default for RenderingOptions {
    fn default() -> Self {
        Self {
            background: [0.2, 0.2, 0.2, 1.0],
            mesh_color: [0.0, 0.6, 1.0, 1.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            light_direction: [0.2, 0.2, 1.0],
            light_position: [100.0, 200.0, 100.0],
            ambient_light_amount: 0.3,
            diffuse_light_amount: 0.89,
            specular_light_amount: 0.16,
            material_shininess: 8.0,
        }
    }
}

/// Everything that determines the entity list apart from the solids.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneOptions {
    pub grid: GridOptions,
    pub axis: AxisOptions,
    pub rendering: RenderingOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_defaults() {
        let g = GridOptions::default();
        assert!(g.show);
        assert_eq!(g.size, [144.0, 144.0]);
        assert_eq!(g.ticks, [12.0, 1.0]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let scene: SceneOptions =
            serde_json::from_str(r#"{ "grid": { "show": false }, "rendering": { "material_shininess": 2.0 } }"#)
                .unwrap();
        assert!(!scene.grid.show);
        assert_eq!(scene.grid.ticks, [12.0, 1.0]);
        assert!(scene.axis.show);
        assert_eq!(scene.rendering.material_shininess, 2.0);
        assert_eq!(scene.rendering.ambient_light_amount, 0.3);
    }
}
