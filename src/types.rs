//! Scalar and small-vector primitives shared across the engine, solver, and
//! spatial-index modules.

use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// The scalar type used throughout the core. The distilled spec calls this
/// `nbcoord_t`; this crate fixes it to `f64` rather than leaving it generic,
/// since every tolerance in the testable-properties section is stated in
/// double-precision terms.
pub type Coord = f64;

/// A 3-component vector used by the spatial index (bounding boxes, centers
/// of mass) and by initial-condition construction. The engine's state
/// buffers themselves stay flat `[Coord]` slices per the 6N layout — `Vec3`
/// is never part of that hard invariant, only a convenience for geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: Coord,
    pub y: Coord,
    pub z: Coord,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: Coord, y: Coord, z: Coord) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn norm_sqr(&self) -> Coord {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn norm(&self) -> Coord {
        self.norm_sqr().sqrt()
    }

    /// Component-wise max, used when growing an axis-aligned bounding box.
    #[inline]
    pub fn max(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    #[inline]
    pub fn min(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    #[inline]
    pub fn component(&self, axis: usize) -> Coord {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<Coord> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: Coord) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<Coord> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: Coord) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Gravitational constant used when none is supplied by a scenario. Most
/// end-to-end scenarios in §8 use normalized units (`G = 1`).
pub const DEFAULT_G: Coord = 1.0;

/// Default softening length. Chosen small relative to the two-body Kepler
/// scenario's separation (`a = 0.5`) so it does not perturb that test.
pub const DEFAULT_SOFTENING: Coord = 1e-6;
