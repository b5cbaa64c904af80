//! # Voxelize
//!
//! The two voxelizers being compared. `voxelize_stl` rasterises the surface
//! into a grid sized by a target resolution and flood fills it,
//! `voxelize_pitch` samples a lattice with a fixed spacing and keeps the
//! points enclosed by the mesh.

use crate::{
    geo::Point3d,
    mesh::{load_mesh, Mesh, StlError},
    volume::Volume,
};
use log::debug;
use ndarray::Array3;
use parry3d::{
    math::Point,
    query::PointQuery,
    shape::{TriMesh, TriMeshFlags},
    transformation::voxelization::{FillMode, VoxelSet},
};
use rayon::prelude::*;
use serde::Serialize;
use std::{fmt, path::Path, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxelizeError {
    #[error("resolution must be at least 2, got {0}")]
    Resolution(u32),
    #[error("pitch must be a positive number, got {0}")]
    Pitch(f32),
    #[error("excluded facet {index} is out of range for a mesh of {count} facets")]
    ExcludedFacet { index: usize, count: usize },
    #[error("nothing left to voxelize")]
    EmptyMesh,
    #[error("mesh has no volume")]
    Degenerate,
    #[error("surface is not closed, {edges} edges are not shared by two facets")]
    OpenSurface { edges: usize },
    #[error("unknown fill rule {0}, expected Inside, Surface or InsideAndSurface")]
    FillRule(String),
    #[error("Couldn't load mesh")]
    Mesh(#[from] StlError),
}

/// Which cells of the grid voxelizer are marked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FillRule {
    /// Cells enclosed by the surface that don't touch it
    Inside,
    /// Cells crossed by the surface
    Surface,
    InsideAndSurface,
}

impl FillRule {
    fn fill_mode(self) -> FillMode {
        match self {
            FillRule::Surface => FillMode::SurfaceOnly,
            FillRule::Inside | FillRule::InsideAndSurface => {
                FillMode::FloodFill { detect_cavities: false }
            },
        }
    }

    fn keeps(self, on_surface: bool) -> bool {
        match self {
            FillRule::Inside => !on_surface,
            FillRule::Surface => on_surface,
            FillRule::InsideAndSurface => true,
        }
    }
}

impl FromStr for FillRule {
    type Err = VoxelizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Inside" => Ok(FillRule::Inside),
            "Surface" => Ok(FillRule::Surface),
            "InsideAndSurface" => Ok(FillRule::InsideAndSurface),
            other => Err(VoxelizeError::FillRule(other.to_string())),
        }
    }
}

impl fmt::Display for FillRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FillRule::Inside => "Inside",
            FillRule::Surface => "Surface",
            FillRule::InsideAndSurface => "InsideAndSurface",
        };
        f.write_str(name)
    }
}

/// Load an STL file and voxelize it, see [`voxelize_mesh`]
pub fn voxelize_stl<P: AsRef<Path>>(
    path: P,
    resolution: u32,
    exclude: &[usize],
    fill: FillRule,
) -> Result<Volume, VoxelizeError> {
    let mesh = load_mesh(path)?;
    voxelize_mesh(&mesh, resolution, exclude, fill)
}

/// Voxelize a mesh into a grid with `resolution` cells along its longest
/// axis. Facets listed in `exclude` are left out.
pub fn voxelize_mesh(
    mesh: &Mesh,
    resolution: u32,
    exclude: &[usize],
    fill: FillRule,
) -> Result<Volume, VoxelizeError> {
    if resolution < 2 {
        return Err(VoxelizeError::Resolution(resolution));
    }
    if let Some(index) = exclude.iter().find(|index| **index >= mesh.len()) {
        return Err(VoxelizeError::ExcludedFacet {
            index: *index,
            count: mesh.len(),
        });
    }
    let buffers = mesh.to_buffers(exclude);
    if buffers.indices.is_empty() {
        return Err(VoxelizeError::EmptyMesh);
    }
    let bounds = crate::geo::get_bounds(
        &mesh
            .triangles
            .iter()
            .enumerate()
            .filter(|(index, _)| !exclude.contains(index))
            .map(|(_, tri)| *tri)
            .collect::<Vec<_>>(),
    );
    if bounds.diagonal() <= 0. {
        return Err(VoxelizeError::Degenerate);
    }

    let set = VoxelSet::voxelize(
        &buffers.vertices,
        &buffers.indices,
        resolution,
        fill.fill_mode(),
        false,
    );

    let extent = bounds.extent();
    let mut dims = [
        (extent.x / set.scale).round() as usize + 1,
        (extent.y / set.scale).round() as usize + 1,
        (extent.z / set.scale).round() as usize + 1,
    ];
    for voxel in set.voxels() {
        for axis in 0..3 {
            dims[axis] = dims[axis].max(voxel.coords[axis] as usize + 1);
        }
    }

    let mut data = Array3::zeros((dims[0], dims[1], dims[2]));
    for voxel in set.voxels().iter().filter(|v| fill.keeps(v.is_on_surface)) {
        let c = voxel.coords;
        data[[c.x as usize, c.y as usize, c.z as usize]] = 1;
    }
    let origin = Point3d::new(set.origin.x, set.origin.y, set.origin.z);
    let volume = Volume::new(data, origin, set.scale);
    debug!(
        "grid voxelizer: {:?} cells, pitch {}, {} of {} voxels kept",
        volume.shape(),
        set.scale,
        volume.count(),
        set.len()
    );
    Ok(volume)
}

/// Sample a lattice spaced `pitch` apart over the mesh bounds and mark the
/// points inside the mesh. With `check_surface` the mesh must be closed,
/// without it the result for an open mesh is undefined.
pub fn voxelize_pitch(mesh: &Mesh, pitch: f32, check_surface: bool) -> Result<Volume, VoxelizeError> {
    if !pitch.is_finite() || pitch <= 0. {
        return Err(VoxelizeError::Pitch(pitch));
    }
    if mesh.is_empty() {
        return Err(VoxelizeError::EmptyMesh);
    }
    if check_surface {
        let edges = mesh.boundary_edges();
        if edges > 0 {
            return Err(VoxelizeError::OpenSurface { edges });
        }
    }

    let bounds = mesh.bounds();
    let extent = bounds.extent();
    let count = |size: f32| ((size / pitch).ceil() as usize).max(1);
    let (nx, ny, nz) = (count(extent.x), count(extent.y), count(extent.z));

    let buffers = mesh.to_buffers(&[]);
    let trimesh = TriMesh::with_flags(buffers.vertices, buffers.indices, TriMeshFlags::ORIENTED);
    let min = bounds.p1.pos;

    // one x slab per task, laid out in the same order as the array
    let values: Vec<u8> = (0..nx)
        .into_par_iter()
        .flat_map(|i| {
            let trimesh = &trimesh;
            (0..ny)
                .flat_map(move |j| {
                    (0..nz).map(move |k| {
                        let point = Point::new(
                            min.x + i as f32 * pitch,
                            min.y + j as f32 * pitch,
                            min.z + k as f32 * pitch,
                        );
                        trimesh.contains_local_point(&point) as u8
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let data = Array3::from_shape_vec((nx, ny, nz), values)
        .map_err(|_| VoxelizeError::Degenerate)?;
    let volume = Volume::new(data, bounds.p1, pitch);
    debug!(
        "pitch voxelizer: {:?} cells, pitch {}, {} inside",
        volume.shape(),
        pitch,
        volume.count()
    );
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Triangle3d;

    fn cube() -> Mesh { Mesh::cuboid((0., 0., 0.), (10., 10., 10.)) }

    #[test]
    fn parses_fill_rules() {
        assert_eq!("Inside".parse::<FillRule>().unwrap(), FillRule::Inside);
        assert_eq!("Surface".parse::<FillRule>().unwrap(), FillRule::Surface);
        assert_eq!(
            "InsideAndSurface".parse::<FillRule>().unwrap(),
            FillRule::InsideAndSurface
        );
        assert!("inside".parse::<FillRule>().is_err());
        assert_eq!(FillRule::InsideAndSurface.to_string(), "InsideAndSurface");
    }

    #[test]
    fn grid_matches_resolution() {
        let volume = voxelize_mesh(&cube(), 20, &[], FillRule::InsideAndSurface).unwrap();
        let (x, y, z) = volume.shape();
        assert_eq!(x.max(y).max(z), 20);
        assert!(x > 0 && y > 0 && z > 0);
        // a solid cube fills nearly all of its grid
        assert!(volume.count() * 10 > x * y * z * 9);
    }

    #[test]
    fn inside_and_surface_split_the_solid() {
        let mesh = cube();
        let inside = voxelize_mesh(&mesh, 16, &[], FillRule::Inside).unwrap();
        let surface = voxelize_mesh(&mesh, 16, &[], FillRule::Surface).unwrap();
        let both = voxelize_mesh(&mesh, 16, &[], FillRule::InsideAndSurface).unwrap();
        assert!(inside.count() > 0);
        assert!(surface.count() > 0);
        assert_eq!(inside.count() + surface.count(), both.count());
        // centre is interior, corner is on the surface
        assert_eq!(inside.data[[8, 8, 8]], 1);
        assert_eq!(inside.data[[0, 0, 0]], 0);
        assert_eq!(surface.data[[0, 0, 0]], 1);
    }

    #[test]
    fn rejects_bad_arguments() {
        let mesh = cube();
        assert!(matches!(
            voxelize_mesh(&mesh, 1, &[], FillRule::Inside),
            Err(VoxelizeError::Resolution(1))
        ));
        assert!(matches!(
            voxelize_mesh(&mesh, 10, &[12], FillRule::Inside),
            Err(VoxelizeError::ExcludedFacet { index: 12, count: 12 })
        ));
        let all: Vec<usize> = (0..12).collect();
        assert!(matches!(
            voxelize_mesh(&mesh, 10, &all, FillRule::Inside),
            Err(VoxelizeError::EmptyMesh)
        ));
    }

    #[test]
    fn pitch_lattice_marks_interior() {
        let volume = voxelize_pitch(&cube(), 1., false).unwrap();
        assert_eq!(volume.shape(), (10, 10, 10));
        assert_eq!(volume.origin, Point3d::new(0., 0., 0.));
        assert_eq!(volume.data[[5, 5, 5]], 1);
        assert_eq!(volume.data[[3, 6, 2]], 1);
    }

    #[test]
    fn pitch_must_be_positive() {
        assert!(matches!(voxelize_pitch(&cube(), 0., false), Err(VoxelizeError::Pitch(_))));
        assert!(matches!(
            voxelize_pitch(&cube(), f32::NAN, false),
            Err(VoxelizeError::Pitch(_))
        ));
    }

    #[test]
    fn surface_check_rejects_open_mesh() {
        let mut mesh = cube();
        mesh.triangles.truncate(10);
        assert!(matches!(
            voxelize_pitch(&mesh, 1., true),
            Err(VoxelizeError::OpenSurface { .. })
        ));
        assert!(voxelize_pitch(&mesh, 1., false).is_ok());
        assert!(voxelize_pitch(&cube(), 1., true).is_ok());
    }

    #[test]
    fn open_mesh_is_sampled_without_surface_check() {
        let flat = Mesh::new(vec![Triangle3d::new((0., 0., 0.), (10., 0., 0.), (0., 10., 0.))]);
        assert!(matches!(
            voxelize_pitch(&flat, 1., true),
            Err(VoxelizeError::OpenSurface { edges: 3 })
        ));
        let volume = voxelize_pitch(&flat, 1., false).unwrap();
        assert_eq!(volume.shape(), (10, 10, 1));
    }
}
