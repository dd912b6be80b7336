//! Texture matrices and the runtime transform they evaluate to.

use super::gx::{gx_enum, TexGenType};
use crate::util::{Mat3, Mat4, Mtx34, Vec2, Vec3, Vec4};

gx_enum! {
    /// How texture coordinates are derived before the SRT is applied.
    pub enum MappingMethod {
        #[default] Standard = 0,
        EnvironmentMapping = 1,
        ViewProjectionMapping = 2,
        ProjectionMapping = 3,
        EnvironmentLightMapping = 4,
        EnvironmentSpecularMapping = 5,
        ManualEnvironmentMapping = 6,
    }
}

gx_enum! {
    /// Authoring-tool convention for composing scale, rotation, translation.
    pub enum TransformModel {
        Default = 0,
        #[default] Maya = 1,
        Max = 2,
        Xsi = 3,
    }
}

gx_enum! {
    pub enum MappingOption {
        #[default] NoSelection = 0,
        /// Leave projected coordinates in [-1, 1].
        DontRemapTextureSpace = 1,
        /// Keep the model translation in environment mappings.
        KeepTranslation = 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexMatrix {
    pub projection: TexGenType,
    pub scale: Vec2,
    /// Degrees.
    pub rotate: f32,
    pub translate: Vec2,
    /// Row-major 4x4, used by the projection and manual mappings.
    pub effect_matrix: [f32; 16],
    pub transform_model: TransformModel,
    pub method: MappingMethod,
    pub option: MappingOption,
    /// Camera reference, -1 for the current camera.
    pub camera: i8,
    /// Light reference, -1 for none.
    pub light: i8,
}

impl Default for TexMatrix {
    fn default() -> Self {
        Self {
            projection: TexGenType::Matrix3x4,
            scale: Vec2::ONE,
            rotate: 0.0,
            translate: Vec2::ZERO,
            effect_matrix: Mat4::IDENTITY.transpose().to_cols_array(),
            transform_model: TransformModel::Maya,
            method: MappingMethod::Standard,
            option: MappingOption::NoSelection,
            camera: -1,
            light: -1,
        }
    }
}

/// V flip: `v -> 1 - v`.
const FLIP_V: Mat3 = Mat3::from_cols(Vec3::X, Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 1.0));

impl TexMatrix {
    /// 2D homogeneous transform of the scale/rotate/translate parameters.
    pub fn srt(&self) -> Mat3 {
        let angle = self.rotate.to_radians();
        let center = Mat3::from_translation(Vec2::splat(0.5));
        let uncenter = Mat3::from_translation(Vec2::splat(-0.5));
        let scale = Mat3::from_scale(self.scale);
        match self.transform_model {
            TransformModel::Default => Mat3::from_scale_angle_translation(self.scale, angle, self.translate),
            // V axis points up, rotation pivots around the texture center
            TransformModel::Maya => {
                let inner = Mat3::from_translation(self.translate)
                    * center
                    * Mat3::from_angle(angle)
                    * uncenter
                    * scale;
                FLIP_V * inner * FLIP_V
            }
            // Offsets move the texture, not the coordinates
            TransformModel::Max => {
                center * Mat3::from_translation(-self.translate) * Mat3::from_angle(-angle) * scale * uncenter
            }
            TransformModel::Xsi => {
                Mat3::from_translation(-self.translate) * Mat3::from_angle(-angle) * scale
            }
        }
    }

    fn effect(&self) -> Mat4 {
        Mat4::from_cols_array(&self.effect_matrix).transpose()
    }

    /// Evaluate the runtime 3x4 texture matrix for an object with model(-view)
    /// matrix `model`, seen through `view_proj`.
    ///
    /// Rows are the `s`, `t`, `q` outputs applied to the generator input.
    /// Light-based environment mappings use the plain normal projection; light
    /// positions live outside the archive.
    pub fn compute(&self, model: &Mat4, view_proj: &Mat4) -> Mtx34 {
        let remap = self.option != MappingOption::DontRemapTextureSpace;
        let base: [Vec4; 3] = match self.method {
            MappingMethod::Standard => [Vec4::X, Vec4::Y, Vec4::W],
            MappingMethod::EnvironmentMapping
            | MappingMethod::EnvironmentLightMapping
            | MappingMethod::EnvironmentSpecularMapping => {
                let n = self.normal_matrix(model);
                sphere_rows(&n, remap)
            }
            MappingMethod::ManualEnvironmentMapping => {
                let n = self.effect() * self.normal_matrix(model);
                [n.row(0), n.row(1), Vec4::W]
            }
            MappingMethod::ViewProjectionMapping => projective_rows(&(*view_proj * *model), remap),
            MappingMethod::ProjectionMapping => projective_rows(&(self.effect() * *model), remap),
        };

        let srt = self.srt();
        let mut out = Mtx34::IDENTITY;
        for (i, row) in out.rows.iter_mut().enumerate() {
            let r = srt.row(i);
            let v = base[0] * r.x + base[1] * r.y + base[2] * r.z;
            *row = v.to_array();
        }
        out
    }

    /// Inverse transpose of the upper 3x3 of `model`, optionally keeping the
    /// model translation.
    fn normal_matrix(&self, model: &Mat4) -> Mat4 {
        let upper = Mat3::from_mat4(*model);
        let mut n = Mat4::from_mat3(upper.inverse().transpose());
        if self.option == MappingOption::KeepTranslation {
            n.w_axis = model.w_axis;
        }
        n
    }
}

/// Project normals onto the unit sphere map.
fn sphere_rows(n: &Mat4, remap: bool) -> [Vec4; 3] {
    if !remap {
        return [n.row(0), n.row(1), Vec4::W];
    }
    [
        n.row(0) * 0.5 + Vec4::W * 0.5,
        n.row(1) * -0.5 + Vec4::W * 0.5,
        Vec4::W,
    ]
}

/// Clip-space `x, y, w` to texture `s, t, q`.
fn projective_rows(m: &Mat4, remap: bool) -> [Vec4; 3] {
    let (x, y, w) = (m.row(0), m.row(1), m.row(3));
    if !remap {
        return [x, y, w];
    }
    [x * 0.5 + w * 0.5, y * -0.5 + w * 0.5, w]
}
