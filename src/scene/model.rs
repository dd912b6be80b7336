//! Editable model graph.
//!
//! Bones live in an index arena: `parent` is an index (-1 for roots) and
//! `children` is derived from the parents by [`Model::rebuild_children`].

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::g3d::bone::{
    BONE_HAS_GEOMETRY, BONE_IDENTITY, BONE_NO_CLASSIC_SCALE, BONE_ROT_ZERO, BONE_SCALE_ONE, BONE_SCALE_UNIFORM,
    BONE_SSC, BONE_SSC_PARENT, BONE_TRANS_ZERO, BONE_VISIBLE,
};
use crate::g3d::{Billboard, EnvelopeMatrixMode, Material, Mesh, ScalingRule, TexMatrixMode};
use crate::util::{Aabb, Mtx34, Vec3};

/// One influence of a draw matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixWeight {
    pub bone: u32,
    pub weight: f32,
}

/// Weighted bone blend. One weight is a rigid binding, several a skinning
/// blend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawMatrix {
    pub weights: SmallVec<[MatrixWeight; 4]>,
}

impl DrawMatrix {
    pub fn rigid(bone: u32) -> Self {
        let mut weights = SmallVec::new();
        weights.push(MatrixWeight { bone, weight: 1.0 });
        Self { weights }
    }

    #[inline]
    pub fn is_rigid(&self) -> bool {
        self.weights.len() == 1
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().map(|w| w.weight).sum()
    }
}

/// A draw call attached to a bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Display {
    pub material: u32,
    pub mesh: u32,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub matrix_id: u32,
    pub billboard: Billboard,
    pub scale: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub translation: Vec3,
    pub aabb: Aabb,
    pub parent: i32,
    pub children: Vec<usize>,
    /// Segment scale compensation.
    pub ssc: bool,
    pub classic_scale: bool,
    pub visible: bool,
    pub displays: Vec<Display>,
    pub model_mtx: Mtx34,
    pub inverse_model_mtx: Mtx34,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            name: String::new(),
            matrix_id: 0,
            billboard: Billboard::None,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            aabb: Aabb::default(),
            parent: -1,
            children: Vec::new(),
            ssc: false,
            classic_scale: true,
            visible: true,
            displays: Vec::new(),
            model_mtx: Mtx34::IDENTITY,
            inverse_model_mtx: Mtx34::IDENTITY,
        }
    }
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Restore the editable bits of a stored flag word.
    pub fn set_from_flag(&mut self, flag: u32) {
        self.ssc = flag & BONE_SSC != 0;
        self.classic_scale = flag & BONE_NO_CLASSIC_SCALE == 0;
        self.visible = flag & BONE_VISIBLE != 0;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub name: String,
    pub scaling_rule: ScalingRule,
    pub tex_mtx_mode: TexMatrixMode,
    pub evp_mtx_mode: EnvelopeMatrixMode,
    pub source_location: String,
    pub aabb: Aabb,
    pub bones: Vec<Bone>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub draw_matrices: Vec<DrawMatrix>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Recompute every bone's children from the parent links, in bone order.
    pub fn rebuild_children(&mut self) {
        for bone in &mut self.bones {
            bone.children.clear();
        }
        for i in 0..self.bones.len() {
            let parent = self.bones[i].parent;
            if let Some(p) = usize::try_from(parent).ok().filter(|&p| p < self.bones.len()) {
                self.bones[p].children.push(i);
            }
        }
    }

    pub fn root_bones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent < 0)
            .map(|(i, _)| i)
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// True when some draw matrix blends several bones.
    pub fn needs_node_mix(&self) -> bool {
        self.draw_matrices.iter().any(|m| m.weights.len() > 1)
    }

    /// Draw matrices referenced by mesh data.
    pub fn display_matrices(&self) -> BTreeSet<i16> {
        crate::g3d::mesh::compute_display_matrices(&self.meshes)
    }

    /// Runtime hint word for bone `index`. Segment scale compensation is
    /// only looked for on direct children.
    pub fn compute_bone_flag(&self, index: usize, display_matrices: &BTreeSet<i16>) -> u32 {
        let bone = &self.bones[index];
        let mut flag = 0;
        let s = bone.scale;
        if s.x == s.y && s.y == s.z {
            flag |= BONE_SCALE_UNIFORM;
            if s == Vec3::ONE {
                flag |= BONE_SCALE_ONE;
            }
        }
        if bone.rotation == Vec3::ZERO {
            flag |= BONE_ROT_ZERO;
        }
        if bone.translation == Vec3::ZERO {
            flag |= BONE_TRANS_ZERO;
        }
        let identity = BONE_TRANS_ZERO | BONE_ROT_ZERO | BONE_SCALE_ONE;
        if flag & identity == identity {
            flag |= BONE_IDENTITY;
        }
        if bone.children.iter().any(|&c| self.bones.get(c).is_some_and(|b| b.ssc)) {
            flag |= BONE_SSC_PARENT;
        }
        if bone.ssc {
            flag |= BONE_SSC;
        }
        if !bone.classic_scale {
            flag |= BONE_NO_CLASSIC_SCALE;
        }
        if bone.visible {
            flag |= BONE_VISIBLE;
        }
        let displayed = i16::try_from(bone.matrix_id).is_ok_and(|m| display_matrices.contains(&m));
        if !bone.displays.is_empty() || displayed {
            flag |= BONE_HAS_GEOMETRY;
        }
        flag
    }
}
