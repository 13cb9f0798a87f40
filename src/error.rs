use thiserror::Error;

use crate::bounding::VolumeKind;
use crate::screen::ShaderId;

/// Errors raised while configuring a scene.
///
/// Per-frame operations never produce these; a failure here means the scene
/// was assembled incorrectly and should not be driven.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("{kind} bounding volume is missing the `{param}` parameter")]
    MissingVolumeParam {
        kind: VolumeKind,
        param: &'static str,
    },
    #[error("{kind} bounding volume parameter `{param}` is negative ({value})")]
    NegativeVolumeParam {
        kind: VolumeKind,
        param: &'static str,
        value: f32,
    },
    #[error("invalid projection: {0}")]
    InvalidProjection(String),
    #[error("edge rotation distance {0} is outside [0, 1]")]
    EdgeRotationOutOfRange(f32),
    #[error("camera velocity must be finite and non-negative, got {0}")]
    InvalidVelocity(f32),
    #[error("shader {0:?} is not registered")]
    UnknownShader(ShaderId),
}
