//! Bounding volumes and the pure intersection tests used for camera
//! collision and picking.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Shape of a [`BoundingVolume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    Aabb,
    Sphere,
}

impl VolumeKind {
    /// Parameters that must be present for a volume of this kind.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            Self::Aabb => &["width", "length", "height"],
            Self::Sphere => &["radius"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Aabb => "aabb",
            Self::Sphere => "sphere",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("aabb") || name.eq_ignore_ascii_case("box") {
            Some(Self::Aabb)
        } else if name.eq_ignore_ascii_case("sphere") {
            Some(Self::Sphere)
        } else {
            None
        }
    }
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable geometric envelope attached to a positioned object.
///
/// For AABBs `width` spans x, `height` spans y and `length` spans z. Moving
/// an object produces a new volume; see [`BoundingVolume::translated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    kind: VolumeKind,
    center: Vec3,
    params: BTreeMap<String, f32>,
}

impl BoundingVolume {
    /// Builds a volume, rejecting missing or negative kind parameters.
    pub fn new(
        kind: VolumeKind,
        center: Vec3,
        params: BTreeMap<String, f32>,
    ) -> Result<Self, SceneError> {
        for &param in kind.required_params() {
            match params.get(param) {
                None => return Err(SceneError::MissingVolumeParam { kind, param }),
                Some(&value) if !(value >= 0.0) => {
                    return Err(SceneError::NegativeVolumeParam { kind, param, value })
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            kind,
            center,
            params,
        })
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        let mut params = BTreeMap::new();
        params.insert("radius".to_string(), radius.max(0.0));
        Self {
            kind: VolumeKind::Sphere,
            center,
            params,
        }
    }

    pub fn aabb(center: Vec3, width: f32, length: f32, height: f32) -> Self {
        let mut params = BTreeMap::new();
        params.insert("width".to_string(), width.max(0.0));
        params.insert("length".to_string(), length.max(0.0));
        params.insert("height".to_string(), height.max(0.0));
        Self {
            kind: VolumeKind::Aabb,
            center,
            params,
        }
    }

    pub fn kind(&self) -> VolumeKind {
        self.kind
    }

    pub fn params(&self) -> &BTreeMap<String, f32> {
        &self.params
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Returns the named parameter, or zero when it is absent.
    pub fn param(&self, name: &str) -> f32 {
        self.params.get(name).copied().unwrap_or(0.0)
    }

    /// Returns a copy of this volume moved by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            kind: self.kind,
            center: self.center + offset,
            params: self.params.clone(),
        }
    }

    fn half_extents(&self) -> Vec3 {
        Vec3::new(
            self.param("width"),
            self.param("height"),
            self.param("length"),
        ) * 0.5
    }

    fn radius(&self) -> f32 {
        self.param("radius")
    }

    fn closest_point(&self, point: Vec3) -> Vec3 {
        match self.kind {
            VolumeKind::Aabb => {
                let half = self.half_extents();
                point.clamp(self.center - half, self.center + half)
            }
            VolumeKind::Sphere => {
                let offset = point - self.center;
                let radius = self.radius();
                if offset.length_squared() <= radius * radius {
                    point
                } else {
                    self.center + offset.normalize_or_zero() * radius
                }
            }
        }
    }
}

/// Reports whether two volumes overlap. Touching volumes overlap.
pub fn intersects(a: &BoundingVolume, b: &BoundingVolume) -> bool {
    match (a.kind, b.kind) {
        (VolumeKind::Sphere, VolumeKind::Sphere) => {
            let reach = a.radius() + b.radius();
            a.center.distance_squared(b.center) <= reach * reach
        }
        (VolumeKind::Aabb, VolumeKind::Aabb) => {
            let gap = (a.center - b.center).abs();
            let reach = a.half_extents() + b.half_extents();
            gap.cmple(reach).all()
        }
        (VolumeKind::Sphere, VolumeKind::Aabb) => sphere_meets_box(a, b),
        (VolumeKind::Aabb, VolumeKind::Sphere) => sphere_meets_box(b, a),
    }
}

fn sphere_meets_box(sphere: &BoundingVolume, aabb: &BoundingVolume) -> bool {
    let closest = aabb.closest_point(sphere.center);
    let radius = sphere.radius();
    closest.distance_squared(sphere.center) <= radius * radius
}

/// Reports whether `point` lies inside or on the surface of `volume`.
pub fn contains_point(volume: &BoundingVolume, point: Vec3) -> bool {
    distance_to_point(volume, point) <= 0.0
}

/// Distance from `point` to the surface of `volume`; zero when inside.
pub fn distance_to_point(volume: &BoundingVolume, point: Vec3) -> f32 {
    volume.closest_point(point).distance(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, f32)]) -> BTreeMap<String, f32> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn construction_requires_kind_parameters() {
        let err = BoundingVolume::new(
            VolumeKind::Aabb,
            Vec3::ZERO,
            params(&[("width", 1.0), ("length", 1.0)]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SceneError::MissingVolumeParam {
                kind: VolumeKind::Aabb,
                param: "height"
            }
        );

        let err = BoundingVolume::new(VolumeKind::Sphere, Vec3::ZERO, params(&[("radius", -2.0)]))
            .unwrap_err();
        assert!(matches!(err, SceneError::NegativeVolumeParam { param: "radius", .. }));

        let volume =
            BoundingVolume::new(VolumeKind::Sphere, Vec3::ONE, params(&[("radius", 2.0)])).unwrap();
        assert_eq!(volume.kind(), VolumeKind::Sphere);
        assert_eq!(volume.params().get("radius"), Some(&2.0));
    }

    #[test]
    fn sphere_overlap_includes_touching() {
        let a = BoundingVolume::sphere(Vec3::ZERO, 1.0);
        let b = BoundingVolume::sphere(Vec3::new(2.0, 0.0, 0.0), 1.0);
        let c = BoundingVolume::sphere(Vec3::new(2.5, 0.0, 0.0), 1.0);
        assert!(intersects(&a, &b));
        assert!(!intersects(&a, &c));
    }

    #[test]
    fn sphere_against_box_uses_closest_point() {
        let aabb = BoundingVolume::aabb(Vec3::ZERO, 2.0, 2.0, 2.0);
        let near_corner = BoundingVolume::sphere(Vec3::new(1.5, 1.5, 0.0), 0.75);
        let far_corner = BoundingVolume::sphere(Vec3::new(1.5, 1.5, 1.5), 0.75);
        assert!(intersects(&near_corner, &aabb));
        assert!(intersects(&aabb, &near_corner));
        assert!(!intersects(&far_corner, &aabb));
    }

    #[test]
    fn boxes_overlap_per_axis() {
        let a = BoundingVolume::aabb(Vec3::ZERO, 2.0, 2.0, 2.0);
        let b = BoundingVolume::aabb(Vec3::new(1.5, 0.0, 0.0), 1.0, 1.0, 1.0);
        let c = BoundingVolume::aabb(Vec3::new(0.0, 3.0, 0.0), 1.0, 1.0, 1.0);
        assert!(intersects(&a, &b));
        assert!(!intersects(&a, &c));
    }

    #[test]
    fn point_queries() {
        let aabb = BoundingVolume::aabb(Vec3::ZERO, 2.0, 4.0, 2.0);
        assert!(contains_point(&aabb, Vec3::new(0.5, 0.5, 1.5)));
        assert!(!contains_point(&aabb, Vec3::new(0.0, 0.0, 3.0)));
        assert!((distance_to_point(&aabb, Vec3::new(0.0, 0.0, 3.0)) - 1.0).abs() < 1e-6);

        let sphere = BoundingVolume::sphere(Vec3::ZERO, 1.0);
        assert!((distance_to_point(&sphere, Vec3::new(0.0, 3.0, 0.0)) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn translation_produces_new_volume() {
        let sphere = BoundingVolume::sphere(Vec3::ZERO, 1.0);
        let moved = sphere.translated(Vec3::X);
        assert_eq!(sphere.center(), Vec3::ZERO);
        assert_eq!(moved.center(), Vec3::X);
        assert_eq!(moved.param("radius"), 1.0);
    }
}
