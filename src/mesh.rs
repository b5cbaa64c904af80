use crate::geo::*;
use log::debug;
use parry3d::math::Point;
use rayon::prelude::*;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Cursor, Read},
    path::Path,
};
use stl::{BinaryStlFile, BinaryStlHeader, Triangle};
use thiserror::Error;

/// Size of the binary STL header plus the triangle count
const HEADER_LEN: usize = 84;
/// Size of one binary STL triangle record
const TRIANGLE_LEN: usize = 50;

#[derive(Error, Debug)]
pub enum StlError {
    #[error("Couldn't read STL file")]
    IO(#[from] std::io::Error),
    #[error("ASCII STL files are not supported, convert to binary first")]
    Ascii,
    #[error("STL file contains no triangles")]
    Empty,
}

/// Triangle soup loaded from an STL file
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub triangles: Triangles3d,
}

/// Welded vertex and index buffers in the layout parry expects
pub struct MeshBuffers {
    pub vertices: Vec<Point<f32>>,
    pub indices: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(triangles: Triangles3d) -> Mesh { Mesh { triangles } }

    /// Closed axis aligned box with outward facing triangles
    pub fn cuboid(min: (f32, f32, f32), max: (f32, f32, f32)) -> Mesh {
        let c = |x: bool, y: bool, z: bool| {
            Point3d::new(
                if x { max.0 } else { min.0 },
                if y { max.1 } else { min.1 },
                if z { max.2 } else { min.2 },
            )
        };
        // each face as a quad wound counter clockwise seen from outside
        let quads = [
            [c(false, false, false), c(false, true, false), c(true, true, false), c(true, false, false)],
            [c(false, false, true), c(true, false, true), c(true, true, true), c(false, true, true)],
            [c(false, false, false), c(true, false, false), c(true, false, true), c(false, false, true)],
            [c(false, true, false), c(false, true, true), c(true, true, true), c(true, true, false)],
            [c(false, false, false), c(false, false, true), c(false, true, true), c(false, true, false)],
            [c(true, false, false), c(true, true, false), c(true, true, true), c(true, false, true)],
        ];
        let triangles = quads
            .iter()
            .flat_map(|q| {
                vec![
                    Triangle3d::from_points(q[0], q[1], q[2]),
                    Triangle3d::from_points(q[0], q[2], q[3]),
                ]
            })
            .collect();
        Mesh { triangles }
    }

    pub fn len(&self) -> usize { self.triangles.len() }

    pub fn is_empty(&self) -> bool { self.triangles.is_empty() }

    pub fn bounds(&self) -> Line3d { get_bounds(&self.triangles) }

    /// Length of the bounding box diagonal
    pub fn length(&self) -> f32 { self.bounds().diagonal() }

    /// Merge identical vertices and build index buffers, skipping the
    /// triangles listed in `exclude`
    pub fn to_buffers(&self, exclude: &[usize]) -> MeshBuffers {
        let mut lookup: HashMap<[u32; 3], u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(self.triangles.len());
        for (index, tri) in self.triangles.iter().enumerate() {
            if exclude.contains(&index) {
                continue;
            }
            let mut face = [0_u32; 3];
            for (corner, point) in [tri.p1, tri.p2, tri.p3].iter().enumerate() {
                let key = [point.pos.x.to_bits(), point.pos.y.to_bits(), point.pos.z.to_bits()];
                face[corner] = *lookup.entry(key).or_insert_with(|| {
                    vertices.push(Point::from(*point));
                    vertices.len() as u32 - 1
                });
            }
            indices.push(face);
        }
        MeshBuffers { vertices, indices }
    }

    /// Count edges that aren't shared by exactly two triangles, a closed
    /// manifold surface has none
    pub fn boundary_edges(&self) -> usize {
        let buffers = self.to_buffers(&[]);
        let mut edges: HashMap<(u32, u32), usize> = HashMap::new();
        for face in &buffers.indices {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])].iter() {
                let key = if a < b { (*a, *b) } else { (*b, *a) };
                *edges.entry(key).or_insert(0) += 1;
            }
        }
        edges.values().filter(|count| **count != 2).count()
    }
}

/// Read a binary STL file from disk
pub fn load_mesh<P: AsRef<Path>>(filename: P) -> Result<Mesh, StlError> {
    let file = File::open(filename.as_ref())?;
    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes)?;
    let mesh = mesh_from_bytes(&bytes)?;
    debug!("loaded {} triangles from {}", mesh.len(), filename.as_ref().display());
    Ok(mesh)
}

/// Parse a binary STL held in memory
pub fn mesh_from_bytes(bytes: &[u8]) -> Result<Mesh, StlError> {
    if is_ascii(bytes) {
        return Err(StlError::Ascii);
    }
    let stl = stl::read_stl(&mut Cursor::new(bytes))?;
    if stl.triangles.is_empty() {
        return Err(StlError::Empty);
    }
    Ok(Mesh::new(to_triangles3d(&stl)))
}

/// ASCII files start with "solid", but so do some binary headers, so the
/// size has to disagree with the binary layout as well
fn is_ascii(bytes: &[u8]) -> bool {
    if !bytes.starts_with(b"solid") {
        return false;
    }
    if bytes.len() < HEADER_LEN {
        return true;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    count
        .checked_mul(TRIANGLE_LEN)
        .and_then(|len| len.checked_add(HEADER_LEN))
        .map_or(true, |expected| bytes.len() != expected)
}

pub fn to_triangles3d(file: &BinaryStlFile) -> Vec<Triangle3d> {
    file.triangles
        .par_iter()
        .map(|x| Triangle3d::from_points(x.v1.into(), x.v2.into(), x.v3.into()))
        .collect()
}

pub fn from_triangles3d(tris: &[Triangle3d]) -> BinaryStlFile {
    let triangles: Vec<_> = tris
        .iter()
        .map(|tri| Triangle {
            normal: Point3d::from(tri.normal()).into(),
            v1: tri.p1.into(),
            v2: tri.p2.into(),
            v3: tri.p3.into(),
            attr_byte_count: 0,
        })
        .collect();
    BinaryStlFile {
        header: BinaryStlHeader {
            header: [0_u8; 80],
            num_triangles: triangles.len() as u32,
        },
        triangles,
    }
}

/// Serialize triangles as a binary STL
pub fn to_bytes(tris: &[Triangle3d]) -> Result<Vec<u8>, StlError> {
    let mut out = Vec::new();
    stl::write_stl(&mut out, &from_triangles3d(tris))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_is_closed() {
        let mesh = Mesh::cuboid((0., 0., 0.), (1., 2., 3.));
        assert_eq!(mesh.len(), 12);
        assert_eq!(mesh.boundary_edges(), 0);
        assert_eq!(mesh.bounds(), Line3d::new((0., 0., 0.), (1., 2., 3.)));
    }

    #[test]
    fn missing_face_opens_surface() {
        let mut mesh = Mesh::cuboid((0., 0., 0.), (1., 1., 1.));
        mesh.triangles.truncate(10);
        assert!(mesh.boundary_edges() > 0);
    }

    #[test]
    fn buffers_weld_shared_corners() {
        let mesh = Mesh::cuboid((0., 0., 0.), (1., 1., 1.));
        let buffers = mesh.to_buffers(&[]);
        assert_eq!(buffers.vertices.len(), 8);
        assert_eq!(buffers.indices.len(), 12);
        let partial = mesh.to_buffers(&[0, 1]);
        assert_eq!(partial.indices.len(), 10);
    }

    #[test]
    fn reads_back_written_file() {
        let mesh = Mesh::cuboid((-1., -1., -1.), (1., 1., 1.));
        let bytes = to_bytes(&mesh.triangles).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 12 * TRIANGLE_LEN);
        let loaded = mesh_from_bytes(&bytes).unwrap();
        assert_eq!(loaded.triangles, mesh.triangles);
    }

    #[test]
    fn rejects_ascii() {
        let text = b"solid cube\n  facet normal 0 0 1\n    outer loop\n";
        assert!(matches!(mesh_from_bytes(text), Err(StlError::Ascii)));
    }

    #[test]
    fn solid_header_uses_declared_count() {
        let mut bytes = to_bytes(&Mesh::cuboid((0., 0., 0.), (1., 1., 1.)).triangles).unwrap();
        bytes[..5].copy_from_slice(b"solid");
        assert!(!is_ascii(&bytes));
        assert_eq!(mesh_from_bytes(&bytes).unwrap().len(), 12);

        // a huge declared count can't match any real file size
        bytes[80..84].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(is_ascii(&bytes));
        assert!(matches!(mesh_from_bytes(&bytes), Err(StlError::Ascii)));
    }

    #[test]
    fn rejects_empty() {
        let bytes = to_bytes(&[]).unwrap();
        assert!(matches!(mesh_from_bytes(&bytes), Err(StlError::Empty)));
    }
}
