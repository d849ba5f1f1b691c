//! Z-buffered triangle rasterizer with Lambert shading

use crate::camera::Intrinsics;
use crate::compositor::FrameBuffers;
use glam::{DMat4, DVec2, DVec3};
use rayon::prelude::*;

const NEAR_CLIP: f64 = 0.1;
const AMBIENT: f64 = 0.15;
const AREA_LIGHT_WEIGHT: f64 = 0.85;
const POINT_LIGHT_WEIGHT: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Interpolated vertex normals where the mesh has them.
    Smooth,
    /// One normal per face.
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    Point { location: DVec3 },
    Area { location: DVec3 },
}

impl LightSource {
    /// Diffuse contribution at a surface point with unit `normal`.
    fn irradiance(&self, point: DVec3, normal: DVec3) -> f64 {
        match *self {
            LightSource::Point { location } => {
                let to_light = (location - point).normalize_or_zero();
                POINT_LIGHT_WEIGHT * normal.dot(to_light).max(0.0)
            }
            // Wide overhead emitter: facing surfaces get full light, vertical ones half.
            LightSource::Area { location } => {
                let facing = if location.z >= point.z { DVec3::Z } else { DVec3::NEG_Z };
                AREA_LIGHT_WEIGHT * (0.5 + 0.5 * normal.dot(facing))
            }
        }
    }
}

/// Triangle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTriangle {
    pub vertices: [DVec3; 3],
    pub normals: Option<[DVec3; 3]>,
    pub color: [f32; 3],
}

/// Evaluated camera: world matrix (looking down local -Z) plus pinhole model.
#[derive(Debug, Clone, Copy)]
pub struct RasterCamera {
    pub world: DMat4,
    pub intrinsics: Intrinsics,
}

struct ScreenTriangle {
    screen: [DVec2; 3],
    depth: [f64; 3],
    world: [DVec3; 3],
    normals: [DVec3; 3],
    color: [f32; 3],
}

fn edge(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn project(
    triangle: &WorldTriangle,
    view: &DMat4,
    intrinsics: &Intrinsics,
    shading: Shading,
) -> Option<ScreenTriangle> {
    let [fx, fy] = intrinsics.focal_length;
    let [cx, cy] = intrinsics.principal_point;

    let mut screen = [DVec2::ZERO; 3];
    let mut depth = [0.0; 3];
    for (i, vertex) in triangle.vertices.iter().enumerate() {
        let v = view.transform_point3(*vertex);
        let d = -v.z;
        // Triangles crossing the near plane are dropped rather than clipped.
        if d < NEAR_CLIP {
            return None;
        }
        screen[i] = DVec2::new(fx * v.x / d + cx, cy - fy * v.y / d);
        depth[i] = d;
    }

    if edge(screen[0], screen[1], screen[2]).abs() < 1e-12 {
        return None;
    }

    let [a, b, c] = triangle.vertices;
    let face = (b - a).cross(c - a).normalize_or_zero();
    if face == DVec3::ZERO {
        return None;
    }

    let normals = match (shading, triangle.normals) {
        (Shading::Smooth, Some(normals)) => normals,
        _ => [face; 3],
    };

    Some(ScreenTriangle {
        screen,
        depth,
        world: triangle.vertices,
        normals,
        color: triangle.color,
    })
}

/// Renders triangles to colour, depth and coverage buffers on transparent film.
pub fn rasterize(
    triangles: &[WorldTriangle],
    camera: &RasterCamera,
    lights: &[LightSource],
    shading: Shading,
) -> FrameBuffers {
    let [width, height] = camera.intrinsics.image_size;
    let mut buffers = FrameBuffers::new(width, height);
    if width == 0 || height == 0 {
        return buffers;
    }

    let view = camera.world.inverse();
    let eye = camera.world.w_axis.truncate();

    let projected: Vec<ScreenTriangle> = triangles
        .par_iter()
        .filter_map(|triangle| project(triangle, &view, &camera.intrinsics, shading))
        .collect();

    log::trace!(
        "Rasterizing {} of {} triangles",
        projected.len(),
        triangles.len()
    );

    for tri in &projected {
        let [s0, s1, s2] = tri.screen;
        let area = edge(s0, s1, s2);

        let min = s0.min(s1).min(s2).floor().max(DVec2::ZERO);
        let max = s0
            .max(s1)
            .max(s2)
            .ceil()
            .min(DVec2::new((width - 1) as f64, (height - 1) as f64));
        if min.x > max.x || min.y > max.y {
            continue;
        }

        for y in min.y as u32..=max.y as u32 {
            for x in min.x as u32..=max.x as u32 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let b = [
                    edge(s1, s2, p) / area,
                    edge(s2, s0, p) / area,
                    edge(s0, s1, p) / area,
                ];
                if b.iter().any(|&w| w < 0.0) {
                    continue;
                }

                // Perspective-correct weights from screen-space barycentrics.
                let q = [b[0] / tri.depth[0], b[1] / tri.depth[1], b[2] / tri.depth[2]];
                let q_sum = q[0] + q[1] + q[2];
                let depth = 1.0 / q_sum;

                let idx = buffers.index(x, y);
                if depth as f32 >= buffers.depth[idx] {
                    continue;
                }

                let w = [q[0] * depth, q[1] * depth, q[2] * depth];
                let point = tri.world[0] * w[0] + tri.world[1] * w[1] + tri.world[2] * w[2];
                let mut normal = (tri.normals[0] * w[0]
                    + tri.normals[1] * w[1]
                    + tri.normals[2] * w[2])
                    .normalize_or_zero();
                // Two-sided surfaces.
                if normal.dot(eye - point) < 0.0 {
                    normal = -normal;
                }

                let intensity = (AMBIENT
                    + lights
                        .iter()
                        .map(|light| light.irradiance(point, normal))
                        .sum::<f64>())
                .min(1.0) as f32;

                buffers.color[idx] = tri.color.map(|c| c * intensity);
                buffers.depth[idx] = depth as f32;
                buffers.alpha[idx] = 1.0;
            }
        }
    }

    buffers
}
