use crate::model::BoundingBox;
use wgpu::util::DeviceExt;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Local-space bounds of all vertices
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().map(|v| Vec3::from(v.pos)))
    }

    /// Append another mesh, rebasing its indices
    pub fn append(&mut self, other: Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {

        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Flat plane in XZ facing +Y, centered at the origin
pub fn create_plane_mesh(size: f32) -> Mesh {
    let h = size / 2.0;
    let normal = [0.0, 1.0, 0.0];
    let color = [1.0; 4];
    let vertices = vec![
        Vertex { pos: [-h, 0.0, h], normal, color, uv: [0.0, 0.0] },
        Vertex { pos: [h, 0.0, h], normal, color, uv: [1.0, 0.0] },
        Vertex { pos: [h, 0.0, -h], normal, color, uv: [1.0, 1.0] },
        Vertex { pos: [-h, 0.0, -h], normal, color, uv: [0.0, 1.0] },
    ];
    Mesh { vertices, indices: vec![0, 1, 2, 0, 2, 3] }
}

/// Box centered at the origin with per-face normals and uvs
pub fn create_box_mesh(size: Vec3) -> Mesh {
    let h = size * 0.5;
    let color = [1.0; 4];
    // (normal, u axis, v axis) for each face; corners wind CCW seen from outside
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut mesh = Mesh::empty();
    for (n, u, v) in faces {
        let base = mesh.vertices.len() as u32;
        let center = n * h;
        let du = u * h;
        let dv = v * h;
        let corners = [
            (center - du - dv, [0.0, 0.0]),
            (center + du - dv, [1.0, 0.0]),
            (center + du + dv, [1.0, 1.0]),
            (center - du + dv, [0.0, 1.0]),
        ];
        for (p, uv) in corners {
            mesh.vertices.push(Vertex { pos: p.to_array(), normal: n.to_array(), color, uv });
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Line-list vertices outlining each box (12 edges, 24 vertices per box)
pub fn create_bounds_lines(boxes: &[BoundingBox], color: [f32; 4]) -> Vec<Vertex> {
    const EDGES: [(usize, usize); 12] = [
        (0, 1), (1, 2), (2, 3), (3, 0), // back
        (4, 5), (5, 6), (6, 7), (7, 4), // front
        (0, 4), (1, 5), (2, 6), (3, 7), // sides
    ];
    let mut out = Vec::with_capacity(boxes.len() * 24);
    for b in boxes {
        let c = b.corners();
        for (a, z) in EDGES {
            for idx in [a, z] {
                out.push(Vertex { pos: c[idx].to_array(), normal: [0.0, 1.0, 0.0], color, uv: [0.0, 0.0] });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_mesh_bounds_match_size() {
        let mesh = create_box_mesh(Vec3::new(4.0, 2.0, 1.0));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        let b = mesh.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(-2.0, -1.0, -0.5));
        assert_eq!(b.max, Vec3::new(2.0, 1.0, 0.5));
    }

    #[test]
    fn test_box_faces_wind_outwards() {
        let mesh = create_box_mesh(Vec3::ONE);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].pos));
            let n = Vec3::from(mesh.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut mesh = create_plane_mesh(2.0);
        mesh.append(create_plane_mesh(4.0));
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn test_bounds_lines_vertex_count() {
        let boxes = [BoundingBox::new(Vec3::ZERO, Vec3::ONE); 3];
        assert_eq!(create_bounds_lines(&boxes, [1.0; 4]).len(), 72);
    }
}
