use tracing::debug;

use crate::{
    axes::render_point,
    grid::GridSpec,
    interp::height_shade,
    types::{RenderPoint, RenderVector, Rgb, ScalarField},
};

/// How vertex colors are derived from the base color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Luminance scaled by `0.5 + 0.5·heightFactor` over the grid's height range.
    Height,
    /// The base color on every vertex.
    Flat,
}

/// One surface vertex in render space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: RenderPoint,
    pub color: Rgb,
}

/// Render-ready triangle mesh over a regular grid.
///
/// Vertex attributes are stored as parallel buffers so they can be handed to a
/// GPU mesh without reshuffling. For an `n × n` grid there are always
/// `(n + 1)²` vertices and `2·n²` triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions: `[[x, f(x, y), y], ...]`
    pub positions: Vec<[f32; 3]>,

    /// Per-vertex colors: `[[r, g, b], ...]`
    pub colors: Vec<[f32; 3]>,

    /// Smooth per-vertex normals: `[[nx, ny, nz], ...]`
    pub normals: Vec<[f32; 3]>,

    /// Triangle index triples, flattened.
    pub indices: Vec<u32>,

    /// Material opacity in `[0, 1]`.
    pub opacity: f32,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&self, index: usize) -> Vertex {
        let [x, y, z] = self.positions[index];
        let [r, g, b] = self.colors[index];
        Vertex {
            position: RenderPoint::new(x, y, z),
            color: Rgb::new(r, g, b),
        }
    }

    /// Iterates triangle index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Computes the unnormalized face normal of triangle `tri`.
    ///
    /// Its length is twice the triangle's area, so summing these weights larger
    /// faces more heavily.
    pub fn tri_normal(&self, tri: usize) -> RenderVector {
        let corner = |k: usize| {
            let [x, y, z] = self.positions[self.indices[tri * 3 + k] as usize];
            RenderVector::new(x, y, z)
        };
        let (a, b, c) = (corner(0), corner(1), corner(2));
        (c - b).cross(&(a - b))
    }

    /// Recomputes smooth normals from the current positions and indices.
    ///
    /// Vertices touched only by degenerate triangles get a zero normal.
    pub fn create_normals(&mut self) {
        let mut sums = vec![RenderVector::zeros(); self.positions.len()];
        for tri in 0..self.triangle_count() {
            let n = self.tri_normal(tri);
            for k in 0..3 {
                sums[self.indices[tri * 3 + k] as usize] += n;
            }
        }
        self.normals = sums
            .into_iter()
            .map(|n| {
                let len = n.norm();
                if len == 0. {
                    [0., 0., 0.]
                } else {
                    let n = n / len;
                    [n.x, n.y, n.z]
                }
            })
            .collect();
    }
}

/// Samples `function` over `grid` and builds a colored, triangulated mesh.
///
/// Degenerate samples are drawn at height `0`. Cells are split along the
/// same diagonal with a fixed winding, so normals agree across the surface
/// for two-sided shading. The mesh is rebuilt from scratch on every call.
///
/// ```text
/// 1. grid.sample        →  (n+1)² clamped heights
/// 2. render_point       →  (x, z, y) positions
/// 3. height_shade       →  per-vertex luminance
/// 4. cell_triangles     →  2 triangles per cell
/// 5. create_normals     →  area-weighted vertex normals
/// ```
pub fn synthesize(
    function: &ScalarField,
    grid: &GridSpec,
    color: Rgb,
    opacity: f32,
    shading: Shading,
) -> SurfaceMesh {
    let heights = grid.sample(function);
    let n = grid.resolution();
    let half_range = grid.half_range();

    let mut positions = Vec::with_capacity(heights.len());
    let mut colors = Vec::with_capacity(heights.len());
    for ((i, j), &z) in heights.indexed_iter() {
        let (x, y) = grid.corner(i, j);
        let p = render_point(x, y, z);
        positions.push([p.x, p.y, p.z]);

        let shade = match shading {
            Shading::Height => color.scaled(height_shade(z, half_range) as f32),
            Shading::Flat => color,
        };
        colors.push(shade.to_array());
    }

    let mut indices = Vec::with_capacity(n * n * 6);
    for i in 0..n {
        for j in 0..n {
            for tri in grid.cell_triangles(i, j) {
                indices.extend(tri);
            }
        }
    }

    let mut mesh = SurfaceMesh {
        positions,
        colors,
        normals: Vec::new(),
        indices,
        opacity: opacity.clamp(0., 1.),
    };
    mesh.create_normals();

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "synthesized surface mesh"
    );
    mesh
}
