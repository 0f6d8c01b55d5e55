use glam::Vec3;
use solidview_common::{Rgba, Solid};

const STEP_COLORS: [Rgba; 2] = [[0.0, 0.6, 1.0, 1.0], [0.9, 0.5, 0.1, 1.0]];

/// Parameters of the stair demo, edited from the side panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StairParams {
    pub steps: u32,
    pub rise: f32,
    pub run: f32,
    pub width: f32,
}

impl Default for StairParams {
    fn default() -> Self {
        Self {
            steps: 6,
            rise: 8.0,
            run: 10.0,
            width: 40.0,
        }
    }
}

/// Axis-aligned box between two corners.
pub fn cuboid(min: Vec3, max: Vec3) -> Solid {
    let positions = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
        .collect();
    #[rustfmt::skip]
    let triangles = vec![
        [0, 2, 1], [1, 2, 3], // -Z
        [4, 5, 6], [5, 7, 6], // +Z
        [0, 1, 4], [1, 5, 4], // -Y
        [2, 6, 3], [3, 6, 7], // +Y
        [0, 4, 2], [2, 4, 6], // -X
        [1, 3, 5], [3, 7, 5], // +X
    ];
    Solid::new(positions, triangles)
}

/// One box per step, centered on the origin in XY, rising along +Y.
pub fn stairs(params: &StairParams) -> Vec<Solid> {
    let depth = params.steps as f32 * params.run;
    let x0 = -params.width * 0.5;
    let y0 = -depth * 0.5;
    (0..params.steps)
        .map(|i| {
            let step = i as f32;
            cuboid(
                Vec3::new(x0, y0 + step * params.run, 0.0),
                Vec3::new(-x0, y0 + (step + 1.0) * params.run, (step + 1.0) * params.rise),
            )
            .with_color(STEP_COLORS[i as usize % STEP_COLORS.len()])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_is_closed_box() {
        let solid = cuboid(Vec3::ZERO, Vec3::ONE);
        assert_eq!(solid.positions.len(), 8);
        assert_eq!(solid.triangle_count(), 12);
        assert!(solid.positions.contains(&Vec3::ONE));
    }

    #[test]
    fn stairs_climb() {
        let params = StairParams::default();
        let solids = stairs(&params);
        assert_eq!(solids.len(), params.steps as usize);
        let top = |s: &Solid| s.positions.iter().map(|p| p.z).fold(f32::MIN, f32::max);
        assert_eq!(top(&solids[0]), params.rise);
        assert_eq!(top(&solids[5]), 6.0 * params.rise);
        assert_ne!(solids[0].color, solids[1].color);
    }
}
