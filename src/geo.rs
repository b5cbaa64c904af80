//! # Geo
//!
//! Geometric types shared by the mesh loader, the voxelizers and the plots.
//! Mostly wraps ultraviolet types with some additional functionality

use float_cmp::approx_eq;
use parry3d::math::Point;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    cmp::PartialEq,
    ops::{Add, Mul, Sub},
};
use ultraviolet::Vec3;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Point3d {
    pub pos: Vec3,
}

impl Point3d {
    pub fn new(x: f32, y: f32, z: f32) -> Point3d {
        Point3d {
            pos: Vec3::new(x, y, z),
        }
    }

    /// Lowest value in each axis
    pub fn min_by_component(&self, other: &Point3d) -> Point3d {
        self.pos.min_by_component(other.pos).into()
    }

    /// Highest value in each axis
    pub fn max_by_component(&self, other: &Point3d) -> Point3d {
        self.pos.max_by_component(other.pos).into()
    }
}

impl Add<Point3d> for Point3d {
    type Output = Point3d;

    fn add(self, other: Point3d) -> Point3d { (self.pos + other.pos).into() }
}

impl Sub<Point3d> for Point3d {
    type Output = Point3d;

    fn sub(self, other: Point3d) -> Point3d { (self.pos - other.pos).into() }
}

impl Mul<f32> for Point3d {
    type Output = Point3d;

    fn mul(self, num: f32) -> Point3d {
        Point3d::new(self.pos.x * num, self.pos.y * num, self.pos.z * num)
    }
}

impl From<Vec3> for Point3d {
    fn from(vec3: Vec3) -> Self { Point3d { pos: vec3 } }
}

impl From<[f32; 3]> for Point3d {
    fn from(p: [f32; 3]) -> Self { Point3d::new(p[0], p[1], p[2]) }
}

impl From<Point3d> for [f32; 3] {
    fn from(p: Point3d) -> Self { [p.pos.x, p.pos.y, p.pos.z] }
}

impl From<Point3d> for Point<f32> {
    fn from(p: Point3d) -> Self { Point::new(p.pos.x, p.pos.y, p.pos.z) }
}

impl Eq for Point3d {}

impl PartialEq for Point3d {
    fn eq(&self, other: &Self) -> bool {
        approx_eq!(f32, self.pos.x, other.pos.x, ulps = 3)
            && approx_eq!(f32, self.pos.y, other.pos.y, ulps = 3)
            && approx_eq!(f32, self.pos.z, other.pos.z, ulps = 3)
    }
}

/// Line segment, also used as an axis aligned bounding box from p1 (min) to
/// p2 (max)
#[derive(PartialEq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Line3d {
    pub p1: Point3d,
    pub p2: Point3d,
}

impl Line3d {
    pub fn new(p1: (f32, f32, f32), p2: (f32, f32, f32)) -> Line3d {
        Line3d {
            p1: Point3d::new(p1.0, p1.1, p1.2),
            p2: Point3d::new(p2.0, p2.1, p2.2),
        }
    }

    pub fn from_points(p1: &Point3d, p2: &Point3d) -> Line3d { Line3d { p1: *p1, p2: *p2 } }

    /// Empty bounds, ready to be grown with `union`
    pub fn empty() -> Line3d {
        Line3d {
            p1: Point3d::new(f32::MAX, f32::MAX, f32::MAX),
            p2: Point3d::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Smallest box containing both boxes
    ///
    /// # Examples
    ///
    /// ```
    /// use voxel_bench::geo::Line3d;
    /// let a = Line3d::new((0., 0., 0.), (1., 1., 1.));
    /// let b = Line3d::new((-1., 0.5, 0.), (0.5, 2., 3.));
    /// assert_eq!(a.union(&b), Line3d::new((-1., 0., 0.), (1., 2., 3.)));
    /// ```
    pub fn union(&self, other: &Line3d) -> Line3d {
        Line3d {
            p1: self.p1.min_by_component(&other.p1),
            p2: self.p2.max_by_component(&other.p2),
        }
    }

    /// Size of the box along each axis
    pub fn extent(&self) -> Vec3 { self.p2.pos - self.p1.pos }

    /// Length of the diagonal of the box
    ///
    /// # Examples
    ///
    /// ```
    /// use voxel_bench::geo::Line3d;
    /// let bounds = Line3d::new((0., 0., 0.), (2., 3., 6.));
    /// assert_eq!(bounds.diagonal(), 7.);
    /// ```
    pub fn diagonal(&self) -> f32 { self.extent().mag() }
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Triangle3d {
    pub p1: Point3d,
    pub p2: Point3d,
    pub p3: Point3d,
}

pub type Triangles3d = Vec<Triangle3d>;

impl Triangle3d {
    pub fn new(p1: (f32, f32, f32), p2: (f32, f32, f32), p3: (f32, f32, f32)) -> Triangle3d {
        Triangle3d {
            p1: Point3d::new(p1.0, p1.1, p1.2),
            p2: Point3d::new(p2.0, p2.1, p2.2),
            p3: Point3d::new(p3.0, p3.1, p3.2),
        }
    }

    pub fn from_points(p1: Point3d, p2: Point3d, p3: Point3d) -> Triangle3d {
        Triangle3d { p1, p2, p3 }
    }

    /// Unit normal following the right hand rule, zero for degenerate
    /// triangles
    pub fn normal(&self) -> Vec3 {
        let n = (self.p2.pos - self.p1.pos).cross(self.p3.pos - self.p1.pos);
        if n.mag_sq() > 0. {
            n.normalized()
        } else {
            Vec3::zero()
        }
    }

    pub fn bbox(self) -> Line3d {
        Line3d {
            p1: Point3d::new(self.min_x(), self.min_y(), self.min_z()),
            p2: Point3d::new(self.max_x(), self.max_y(), self.max_z()),
        }
    }

    pub fn min_x(self) -> f32 { self.p1.pos.x.min(self.p2.pos.x).min(self.p3.pos.x) }

    pub fn min_y(self) -> f32 { self.p1.pos.y.min(self.p2.pos.y).min(self.p3.pos.y) }

    pub fn min_z(self) -> f32 { self.p1.pos.z.min(self.p2.pos.z).min(self.p3.pos.z) }

    pub fn max_x(self) -> f32 { self.p1.pos.x.max(self.p2.pos.x).max(self.p3.pos.x) }

    pub fn max_y(self) -> f32 { self.p1.pos.y.max(self.p2.pos.y).max(self.p3.pos.y) }

    pub fn max_z(self) -> f32 { self.p1.pos.z.max(self.p2.pos.z).max(self.p3.pos.z) }
}

/// Get bounds for list of triangles
pub fn get_bounds(tris: &[Triangle3d]) -> Line3d {
    tris.par_iter()
        .map(|tri| tri.bbox())
        .reduce(Line3d::empty, |acc, bbox| acc.union(&bbox))
}
