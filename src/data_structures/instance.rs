//! Translation/rotation/scale transforms.
//!
//! Scene nodes record their local transform as an [`Instance`]. The importer never bakes it
//! into vertex data; callers that want hierarchy-derived placement multiply the node matrices
//! themselves and feed the resulting matrix to the shader's `model` uniform.

use cgmath::One;

/// Position, rotation (as quaternion) and non-uniform scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transform (no move, rotate or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Builds an instance from glTF-style decomposed TRS (`rotation` is `[x, y, z, w]`).
    pub fn from_decomposed(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            position: translation.into(),
            rotation: rotation.into(),
            scale: scale.into(),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Rotation3, SquareMatrix, Vector3, Vector4};

    use super::*;

    #[test]
    fn identity_is_identity_matrix() {
        assert_eq!(Instance::new().to_matrix(), cgmath::Matrix4::identity());
    }

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let instance = Instance {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let moved = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((moved.x - 1.0).abs() < 1e-5, "{moved:?}");
        assert!((moved.y - 2.0).abs() < 1e-5, "{moved:?}");
        assert!((moved.z - 1.0).abs() < 1e-5, "{moved:?}");
    }

    #[test]
    fn decomposed_quaternion_is_xyzw() {
        let instance = Instance::from_decomposed([0.0; 3], [0.0, 0.0, 0.0, 1.0], [1.0; 3]);
        assert_eq!(instance.rotation, cgmath::Quaternion::one());
    }
}
