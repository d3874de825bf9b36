use crate::math::Vector3;

/// Indexed triangle mesh with per-vertex normals and axis-aligned bounds.
///
/// `normals` always has one entry per vertex once ingestion completes, and
/// `indices` holds three entries per triangle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub indices: Vec<u32>,
    pub min_bounds: Vector3,
    pub max_bounds: Vector3,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Recomputes the bounds from the vertex set. Leaves the previous bounds
    /// untouched on an empty mesh.
    pub fn calculate_bounds(&mut self) {
        let Some(&first) = self.vertices.first() else {
            return;
        };
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
        self.min_bounds = min;
        self.max_bounds = max;
    }

    /// Recenters the mesh on the origin and scales it so its largest extent
    /// is 1.0.
    ///
    /// A mesh with zero extent (empty, or every vertex at one position) is
    /// left where it is.
    pub fn normalize(&mut self) {
        self.calculate_bounds();

        let center = (self.min_bounds + self.max_bounds) * 0.5;
        let largest = (self.max_bounds - self.min_bounds).max_element();
        if largest <= 0.0 {
            return;
        }

        let scale = 1.0 / largest;
        for vertex in &mut self.vertices {
            *vertex = (*vertex - center) * scale;
        }
        self.calculate_bounds();
    }

    /// Replaces every normal with the normalized sum of the face normals of
    /// the triangles that reference the vertex.
    ///
    /// Face normals are unit length, so larger triangles carry no extra
    /// weight. Meshes loaded without welding never share a vertex between
    /// triangles, which makes this a per-corner flat normal; whether shared
    /// corners were meant to be smoothed is unresolved, see `LoadOptions::weld`.
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vector3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;
            let p0 = self.vertices[i0];
            let p1 = self.vertices[i1];
            let p2 = self.vertices[i2];
            let normal = (p1 - p0).cross(p2 - p0).normalize();
            accum[i0] = accum[i0] + normal;
            accum[i1] = accum[i1] + normal;
            accum[i2] = accum[i2] + normal;
        }

        self.normals = accum.into_iter().map(Vector3::normalize).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn mesh_from(vertices: &[[f32; 3]]) -> Mesh {
        let vertices: Vec<Vector3> = vertices
            .iter()
            .map(|&[x, y, z]| Vector3::new(x, y, z))
            .collect();
        Mesh {
            normals: vec![Vector3::UP; vertices.len()],
            vertices,
            ..Mesh::default()
        }
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let mut mesh = mesh_from(&[[1.0, -2.0, 3.0], [-4.0, 5.0, 0.5], [2.0, 0.0, -1.0]]);
        mesh.calculate_bounds();
        assert_eq!(mesh.min_bounds, Vector3::new(-4.0, -2.0, -1.0));
        assert_eq!(mesh.max_bounds, Vector3::new(2.0, 5.0, 3.0));
    }

    #[test]
    fn bounds_of_empty_mesh_are_untouched() {
        let mut mesh = Mesh::new();
        mesh.min_bounds = Vector3::new(7.0, 7.0, 7.0);
        mesh.calculate_bounds();
        assert_eq!(mesh.min_bounds, Vector3::new(7.0, 7.0, 7.0));
    }

    #[test]
    fn normalize_fits_unit_extent_around_origin() {
        let mut mesh = mesh_from(&[[1.0, 2.0, 3.0], [5.0, 4.0, 3.0], [2.0, 8.0, 4.0]]);
        mesh.normalize();

        let size = mesh.max_bounds - mesh.min_bounds;
        assert!((size.max_element() - 1.0).abs() < EPS);
        let center = (mesh.min_bounds + mesh.max_bounds) * 0.5;
        assert!(center.abs_diff_eq(Vector3::ZERO, EPS));
        // y spans 2..8, so it becomes the unit axis
        assert!((size.y() - 1.0).abs() < EPS);
        assert!((size.x() - 4.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn normalize_single_point_leaves_vertices_alone() {
        let mut mesh = mesh_from(&[[2.0, 3.0, 4.0], [2.0, 3.0, 4.0], [2.0, 3.0, 4.0]]);
        mesh.normalize();
        for vertex in &mesh.vertices {
            assert_eq!(*vertex, Vector3::new(2.0, 3.0, 4.0));
        }
        assert_eq!(mesh.min_bounds, mesh.max_bounds);
    }

    #[test]
    fn normalize_empty_mesh_is_a_no_op() {
        let mut mesh = Mesh::new();
        mesh.normalize();
        assert!(mesh.is_empty());
        assert_eq!(mesh.min_bounds, Vector3::ZERO);
        assert_eq!(mesh.max_bounds, Vector3::ZERO);
    }

    #[test]
    fn recompute_normals_smooths_shared_vertices() {
        // two triangles folded along the y axis, sharing vertices 0 and 1
        let mut mesh = mesh_from(&[
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        mesh.indices = vec![0, 2, 1, 0, 1, 3];
        mesh.recompute_normals();

        let diagonal = Vector3::new(1.0, 0.0, 1.0).normalize();
        assert!(mesh.normals[0].abs_diff_eq(diagonal, EPS));
        assert!(mesh.normals[1].abs_diff_eq(diagonal, EPS));
        assert!(mesh.normals[2].abs_diff_eq(Vector3::new(0.0, 0.0, 1.0), EPS));
        assert!(mesh.normals[3].abs_diff_eq(Vector3::new(1.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn degenerate_triangle_gets_zero_normal() {
        let mut mesh = mesh_from(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
        mesh.indices = vec![0, 1, 2];
        mesh.recompute_normals();
        assert!(mesh.normals.iter().all(|n| *n == Vector3::ZERO));
    }
}
