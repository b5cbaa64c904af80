use crate::geo::{Line3d, Point3d};
use ndarray::Array3;

/// Dense grid of voxel values placed in world space
///
/// Cell `(i, j, k)` is centred on `origin + (i, j, k) * pitch`.
#[derive(Clone, Debug)]
pub struct Volume {
    pub data: Array3<u8>,
    pub origin: Point3d,
    pub pitch: f32,
}

impl Volume {
    pub fn new(data: Array3<u8>, origin: Point3d, pitch: f32) -> Volume {
        Volume { data, origin, pitch }
    }

    /// Number of cells along x, y and z
    pub fn shape(&self) -> (usize, usize, usize) { self.data.dim() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Lowest and highest value, (0, 0) for an empty grid
    pub fn range(&self) -> (u8, u8) {
        if self.data.is_empty() {
            return (0, 0);
        }
        self.data
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
    }

    /// Coordinates of every non-zero cell
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.data
            .indexed_iter()
            .filter(|(_, v)| **v != 0)
            .map(|(index, _)| index)
    }

    /// Number of non-zero cells
    pub fn count(&self) -> usize { self.data.iter().filter(|v| **v != 0).count() }

    pub fn cell_center(&self, i: usize, j: usize, k: usize) -> Point3d {
        self.origin + Point3d::new(i as f32, j as f32, k as f32) * self.pitch
    }

    /// World space box covered by all cells, edges included
    pub fn world_bounds(&self) -> Line3d {
        let (x, y, z) = self.shape();
        let half = Point3d::new(0.5, 0.5, 0.5) * self.pitch;
        let far = Point3d::new(x as f32 - 0.5, y as f32 - 0.5, z as f32 - 0.5) * self.pitch;
        Line3d::from_points(&(self.origin - half), &(self.origin + far))
    }
}
