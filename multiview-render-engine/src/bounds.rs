//! World-space axis-aligned bounds tracking for scene normalization

use glam::{DMat4, DVec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}

impl Aabb {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min: DVec3::INFINITY,
            max: DVec3::NEG_INFINITY,
        }
    }

    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        let mut bounds = Self::new();
        for point in points {
            bounds.update(point);
        }
        bounds
    }

    /// Update bounds with a new point
    pub fn update(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// True until at least one point was added.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn dimensions(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f64 {
        self.dimensions().max_element()
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// The eight corners, in no particular order.
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of the transformed corners of this box.
    pub fn transformed(&self, matrix: &DMat4) -> Aabb {
        Aabb::from_points(self.corners().map(|c| matrix.transform_point3(c)))
    }
}
