//! Conversion between [`BinaryModel`] and the editable [`Model`].
//!
//! Decoding replays the model's bytecode methods to recover parent links,
//! draw calls, draw matrices and translucency. Encoding regenerates the
//! methods, the bone links and flags, and the model info block.

use tracing::{debug, trace};

use super::model::{Bone, Display, DrawMatrix, MatrixWeight, Model};
use crate::g3d::bytecode::{
    BlendMatrix, ByteCodeMethod, Command, METHOD_DRAW_OPA, METHOD_DRAW_XLU, METHOD_NODE_MIX, METHOD_NODE_TREE,
};
use crate::g3d::mesh::{compute_display_matrices, compute_vert_tri_counts};
use crate::g3d::{BinaryBone, BinaryModel, ModelInfo};
use crate::report::IoContext;
use crate::util::{Error, Result};

/// Replays bytecode against a model under construction.
struct ByteCodeReplay<'m> {
    model: &'m mut Model,
    lut: &'m [i32],
}

impl ByteCodeReplay<'_> {
    fn lookup(&self, matrix: u16) -> Option<usize> {
        let bone = *self.lut.get(matrix as usize)?;
        usize::try_from(bone).ok().filter(|&b| b < self.model.bones.len())
    }

    fn matrix_mut(&mut self, index: usize) -> &mut DrawMatrix {
        if self.model.draw_matrices.len() <= index {
            self.model.draw_matrices.resize_with(index + 1, DrawMatrix::default);
        }
        &mut self.model.draw_matrices[index]
    }

    fn on_draw(&mut self, method: &str, material: u16, mesh: u16, bone: u16, priority: u8, ctx: &mut IoContext<'_>) {
        let mut disp = Display { material: material as u32, mesh: mesh as u32, priority };
        let mut bone = bone as usize;
        if bone >= self.model.bones.len() {
            ctx.error(format!("Invalid bone index {bone} in render command"));
            bone = 0;
        }
        if disp.material as usize >= self.model.materials.len() {
            ctx.error(format!("Invalid material index {} in render command", disp.material));
            disp.material = 0;
        }
        if disp.mesh as usize >= self.model.meshes.len() {
            ctx.error(format!("Invalid mesh index {} in render command", disp.mesh));
            disp.mesh = 0;
        }
        let model = &mut *self.model;
        let (Some(target), Some(mat), Some(mesh)) = (
            model.bones.get_mut(bone),
            model.materials.get_mut(disp.material as usize),
            model.meshes.get(disp.mesh as usize),
        ) else {
            return;
        };
        target.displays.push(disp);
        let mesh_name = mesh.name.as_str();
        let drawn_xlu = method == METHOD_DRAW_XLU;
        if (method == METHOD_DRAW_OPA && mat.xlu) || (drawn_xlu && !mat.xlu) {
            let pass = |xlu: bool| if xlu { "Translucent" } else { "Opaque" };
            let text = format!(
                "Material {} (#{}) is rendered in the {} pass (with mesh {} #{}), but is marked as {}",
                mat.name,
                disp.material,
                pass(!mat.xlu),
                mesh_name,
                disp.mesh,
                pass(mat.xlu)
            );
            let mut materials = ctx.sublet("materials");
            materials.sublet(&mat.name).request(false, text);
        }
        // The pass a material is drawn in wins over its stored flag
        mat.xlu = drawn_xlu;
    }

    fn on_node_descendence(&mut self, bone: u16, parent_matrix: u16, ctx: &mut IoContext<'_>) {
        let index = bone as usize;
        if index >= self.model.bones.len() {
            ctx.error(format!("NodeDescendence names bone {index}, but the model has {}", self.model.bones.len()));
            return;
        }
        let parent = self.lut.get(parent_matrix as usize).copied();
        match parent {
            None => ctx.error(format!(
                "NodeDescendence of bone {index} references matrix {parent_matrix}, past the matrix table"
            )),
            Some(p) if p >= self.model.bones.len() as i32 => {
                ctx.error(format!("Matrix {parent_matrix} is owned by missing bone {p}"))
            }
            Some(p) => {
                if self.model.bones[index].parent != -1 && p >= 0 {
                    self.model.bones[index].parent = p;
                }
            }
        }

        let matrix_id = self.model.bones[index].matrix_id as usize;
        if matrix_id >= self.model.draw_matrices.len() {
            self.model.draw_matrices.resize_with(matrix_id + 1, DrawMatrix::default);
            self.model.draw_matrices[matrix_id] = DrawMatrix::rigid(index as u32);
        }
    }

    fn on_envelope_matrix(&mut self, matrix: u16, bone: u16, ctx: &mut IoContext<'_>) {
        if bone as usize >= self.model.bones.len() {
            ctx.error(format!("EnvelopeMatrix {matrix} binds missing bone {bone}"));
            return;
        }
        *self.matrix_mut(matrix as usize) = DrawMatrix::rigid(bone as u32);
    }

    fn on_node_mix(&mut self, matrix: u16, blend: &[BlendMatrix], ctx: &mut IoContext<'_>) {
        let mut weights = smallvec::SmallVec::new();
        for b in blend {
            match self.lookup(b.matrix) {
                Some(bone) => weights.push(MatrixWeight { bone: bone as u32, weight: b.ratio }),
                None => ctx.error(format!(
                    "NodeMix {matrix} blends matrix {}, which no bone owns",
                    b.matrix
                )),
            }
        }
        self.matrix_mut(matrix as usize).weights = weights;
    }
}

/// Build the editable model, reporting every inconsistency to `ctx`.
pub fn process_model(bin: &BinaryModel, ctx: &mut IoContext<'_>) -> Model {
    let info = &bin.info;
    let (num_verts, num_tris) = compute_vert_tri_counts(&bin.meshes);
    ctx.request(
        num_verts == info.num_verts,
        format!("Model header specifies {} vertices, but the file only has {num_verts}.", info.num_verts),
    );
    ctx.request(
        num_tris == info.num_tris,
        format!("Model header specifies {} triangles, but the file only has {num_tris}.", info.num_tris),
    );
    let display = compute_display_matrices(&bin.meshes);
    ctx.request(
        info.num_view_mtx as usize == display.len(),
        format!(
            "Model header specifies {} display matrices, but the mesh data only references {} display matrices.",
            info.num_view_mtx,
            display.len()
        ),
    );
    let needs_nrm = bin.meshes.iter().any(|m| m.needs_normal_mtx());
    ctx.request(
        info.normal_mtx_array == needs_nrm,
        if needs_nrm {
            "Model header does not tell the runtime library to maintain bone normal matrix arrays, although some meshes need it"
        } else {
            "Model header unnecessarily burdens the runtime library with bone-normal-matrix computation"
        },
    );
    let needs_tex = bin.meshes.iter().any(|m| m.needs_texture_mtx());
    ctx.request(
        info.tex_mtx_array == needs_tex,
        if needs_tex {
            "Model header does not tell the runtime library to maintain bone texture matrix arrays, although some meshes need it"
        } else {
            "Model header unnecessarily burdens the runtime library with bone-texture-matrix computation"
        },
    );
    ctx.request(!info.bound_volume, "Model specifies bounding data should be used");

    let lut = &bin.matrix_to_bone;
    for (i, bone) in bin.bones.iter().enumerate() {
        let Some(&owner) = lut.get(bone.matrix_id as usize) else {
            ctx.error(format!(
                "Bone {} specifies a matrix ID of {}, but the matrix LUT only specifies {} matrices total.",
                bone.name,
                bone.matrix_id,
                lut.len()
            ));
            continue;
        };
        ctx.request(
            owner == i as i32,
            format!(
                "Bone {} (#{i}) declares ownership of Matrix{}. However, Matrix{} does not register this bone as its owner. Rather, it specifies an owner ID of {owner}.",
                bone.name, bone.matrix_id, bone.matrix_id
            ),
        );
    }

    let mut model = Model {
        name: bin.name.clone(),
        scaling_rule: info.scaling_rule,
        tex_mtx_mode: info.tex_mtx_mode,
        evp_mtx_mode: info.evp_mtx_mode,
        source_location: info.source_location.clone(),
        aabb: info.aabb,
        bones: bin.bones.iter().map(from_binary_bone).collect(),
        materials: bin.materials.clone(),
        meshes: bin.meshes.clone(),
        draw_matrices: Vec::new(),
    };

    let mut replay = ByteCodeReplay { model: &mut model, lut };
    for method in &bin.bytecodes {
        for cmd in &method.commands {
            trace!(method = %method.name, ?cmd, "replay");
            match cmd {
                Command::Draw { material, mesh, bone, priority } => {
                    replay.on_draw(&method.name, *material, *mesh, *bone, *priority, ctx)
                }
                Command::NodeDescendence { bone, parent_matrix } => {
                    replay.on_node_descendence(*bone, *parent_matrix, ctx)
                }
                Command::EnvelopeMatrix { matrix, bone } => replay.on_envelope_matrix(*matrix, *bone, ctx),
                Command::NodeMix { matrix, blend } => replay.on_node_mix(*matrix, blend, ctx),
            }
        }
    }

    break_parent_cycles(&mut model, ctx);
    model.rebuild_children();

    for (i, m) in model.draw_matrices.iter().enumerate() {
        if m.weights.len() > 1 {
            let sum = m.weight_sum();
            ctx.request((sum - 1.0).abs() <= 1e-3, format!("Matrix{i} weights sum to {sum}, not 1"));
        }
    }
    debug!(model = %model.name, bones = model.bones.len(), matrices = model.draw_matrices.len(), "assembled model");
    model
}

fn from_binary_bone(bin: &BinaryBone) -> Bone {
    let mut bone = Bone {
        name: bin.name.clone(),
        matrix_id: bin.matrix_id,
        billboard: bin.billboard,
        scale: bin.scale,
        rotation: bin.rotate,
        translation: bin.translate,
        aabb: bin.aabb,
        parent: bin.parent,
        model_mtx: bin.model_mtx,
        inverse_model_mtx: bin.inverse_model_mtx,
        ..Default::default()
    };
    bone.set_from_flag(bin.flag);
    bone
}

/// Detach bones whose parent is missing or whose ancestry loops.
fn break_parent_cycles(model: &mut Model, ctx: &mut IoContext<'_>) {
    let n = model.bones.len();
    for bone in &mut model.bones {
        if bone.parent >= n as i32 {
            ctx.error(format!("Bone {} has parent index {} past the bone table", bone.name, bone.parent));
            bone.parent = -1;
        }
    }
    for i in 0..n {
        let mut cur = model.bones[i].parent;
        let mut steps = 0;
        while cur >= 0 && steps <= n {
            cur = model.bones[cur as usize].parent;
            steps += 1;
        }
        if steps > n {
            ctx.error(format!("Bone {} is its own ancestor", model.bones[i].name));
            model.bones[i].parent = -1;
        }
    }
}

fn narrow(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::WriteFailed(format!("{what} {value} does not fit the bytecode")))
}

/// Regenerate the bytecode methods for `model`. Empty draw matrices are
/// skipped with a warning.
pub fn build_render_lists(model: &Model, ctx: &mut IoContext<'_>) -> Result<Vec<ByteCodeMethod>> {
    let mut node_tree = ByteCodeMethod::new(METHOD_NODE_TREE);
    let mut node_mix = ByteCodeMethod::new(METHOD_NODE_MIX);
    let mut draw_opa = ByteCodeMethod::new(METHOD_DRAW_OPA);
    let mut draw_xlu = ByteCodeMethod::new(METHOD_DRAW_XLU);

    for (i, bone) in model.bones.iter().enumerate() {
        for d in &bone.displays {
            let cmd = Command::Draw {
                material: narrow(d.material as usize, "material")?,
                mesh: narrow(d.mesh as usize, "mesh")?,
                bone: narrow(i, "bone")?,
                priority: d.priority,
            };
            let xlu = model.materials.get(d.material as usize).is_some_and(|m| m.xlu);
            let pass = if xlu { &mut draw_xlu } else { &mut draw_opa };
            pass.commands.push(cmd);
        }
        let parent_matrix = usize::try_from(bone.parent)
            .ok()
            .and_then(|p| model.bones.get(p))
            .map_or(0, |p| p.matrix_id as usize);
        node_tree.commands.push(Command::NodeDescendence {
            bone: narrow(i, "bone")?,
            parent_matrix: narrow(parent_matrix, "matrix")?,
        });
    }

    if !model.needs_node_mix() {
        for (i, m) in model.draw_matrices.iter().enumerate() {
            if !m.weights.is_empty() && !is_bone_matrix(model, i, m) {
                ctx.warn(format!(
                    "Matrix{i} is not the matrix of the bone it binds and is dropped, as no matrix blends bones"
                ));
            }
        }
    } else {
        // Bone matrices first, then everything else in matrix order
        let mut emitted = vec![false; model.draw_matrices.len()];
        let order = model
            .bones
            .iter()
            .map(|b| b.matrix_id as usize)
            .chain(0..model.draw_matrices.len());
        for id in order {
            let Some(drw) = model.draw_matrices.get(id) else {
                ctx.warn(format!("Bone matrix {id} is past the draw matrix table and was not written"));
                continue;
            };
            if std::mem::replace(&mut emitted[id], true) {
                continue;
            }
            if drw.weights.is_empty() {
                ctx.warn(format!("Matrix{id} has no weights and was not written"));
                continue;
            }
            node_mix.commands.push(matrix_command(model, id, drw)?);
        }
    }

    let mut lists = vec![node_tree];
    lists.extend([node_mix, draw_opa, draw_xlu].into_iter().filter(|m| !m.commands.is_empty()));
    Ok(lists)
}

/// Whether the NodeTree alone reproduces matrix `id`: a rigid binding to the
/// bone that owns it.
fn is_bone_matrix(model: &Model, id: usize, drw: &DrawMatrix) -> bool {
    match drw.weights.as_slice() {
        [only] => model.bones.get(only.bone as usize).is_some_and(|b| b.matrix_id as usize == id),
        _ => false,
    }
}

fn matrix_command(model: &Model, id: usize, drw: &DrawMatrix) -> Result<Command> {
    let matrix = narrow(id, "matrix")?;
    let bone_of = |w: &MatrixWeight| {
        model
            .bones
            .get(w.bone as usize)
            .ok_or_else(|| Error::WriteFailed(format!("Matrix{id} weights missing bone {}", w.bone)))
    };
    if let [only] = drw.weights.as_slice() {
        bone_of(only)?;
        return Ok(Command::EnvelopeMatrix { matrix, bone: narrow(only.bone as usize, "bone")? });
    }
    let blend = drw
        .weights
        .iter()
        .map(|w| {
            Ok(BlendMatrix {
                matrix: narrow(bone_of(w)?.matrix_id as usize, "matrix")?,
                ratio: w.weight,
            })
        })
        .collect::<Result<_>>()?;
    Ok(Command::NodeMix { matrix, blend })
}

/// Lower the editable model to its on-disk shape.
pub fn to_binary_model(model: &Model, ctx: &mut IoContext<'_>) -> Result<BinaryModel> {
    let display = model.display_matrices();
    let bones = model
        .bones
        .iter()
        .enumerate()
        .map(|(i, bone)| to_binary_bone(model, i, bone, &display))
        .collect::<Vec<_>>();

    let lut_len = model
        .bones
        .iter()
        .map(|b| b.matrix_id as usize + 1)
        .chain(std::iter::once(model.draw_matrices.len()))
        .max()
        .unwrap_or(0);
    let mut matrix_to_bone = vec![-1; lut_len];
    for (i, bone) in model.bones.iter().enumerate() {
        matrix_to_bone[bone.matrix_id as usize] = i as i32;
    }

    let (num_verts, num_tris) = compute_vert_tri_counts(&model.meshes);
    let info = ModelInfo {
        scaling_rule: model.scaling_rule,
        tex_mtx_mode: model.tex_mtx_mode,
        num_verts,
        num_tris,
        source_location: model.source_location.clone(),
        num_view_mtx: display.len() as u32,
        normal_mtx_array: model.meshes.iter().any(|m| m.needs_normal_mtx()),
        tex_mtx_array: model.meshes.iter().any(|m| m.needs_texture_mtx()),
        bound_volume: false,
        evp_mtx_mode: model.evp_mtx_mode,
        aabb: model.aabb,
    };

    Ok(BinaryModel {
        name: model.name.clone(),
        info,
        matrix_to_bone,
        bytecodes: build_render_lists(model, ctx)?,
        bones,
        materials: model.materials.clone(),
        meshes: model.meshes.clone(),
    })
}

fn to_binary_bone(model: &Model, index: usize, bone: &Bone, display: &std::collections::BTreeSet<i16>) -> BinaryBone {
    let siblings = usize::try_from(bone.parent)
        .ok()
        .and_then(|p| model.bones.get(p))
        .map_or(&[][..], |p| p.children.as_slice());
    let at = siblings.iter().position(|&c| c == index);
    let sibling = |offset: isize| {
        at.and_then(|a| a.checked_add_signed(offset))
            .and_then(|s| siblings.get(s))
            .map_or(-1, |&s| s as i32)
    };
    BinaryBone {
        name: bone.name.clone(),
        id: index as u32,
        matrix_id: bone.matrix_id,
        flag: model.compute_bone_flag(index, display),
        billboard: bone.billboard,
        scale: bone.scale,
        rotate: bone.rotation,
        translate: bone.translation,
        aabb: bone.aabb,
        parent: bone.parent,
        first_child: bone.children.first().map_or(-1, |&c| c as i32),
        right_sibling: sibling(1),
        left_sibling: sibling(-1),
        model_mtx: bone.model_mtx,
        inverse_model_mtx: bone.inverse_model_mtx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g3d::{Material, Mesh};
    use crate::report::Transaction;
    use smallvec::smallvec;

    fn binary() -> BinaryModel {
        let mut bin = BinaryModel::new("m");
        for (i, name) in ["root", "a", "b", "c"].iter().enumerate() {
            bin.bones.push(BinaryBone {
                name: name.to_string(),
                id: i as u32,
                matrix_id: i as u32,
                parent: if i == 0 { -1 } else { 0 },
                ..Default::default()
            });
        }
        bin.matrix_to_bone = vec![0, 1, 2, 3, -1];
        let mut tree = ByteCodeMethod::new(METHOD_NODE_TREE);
        for i in 0..4 {
            tree.commands.push(Command::NodeDescendence { bone: i, parent_matrix: 0 });
        }
        bin.bytecodes.push(tree);
        bin
    }

    fn replay(bin: &BinaryModel) -> (Model, Transaction) {
        let mut tx = Transaction::new();
        let model = process_model(bin, &mut IoContext::new("MDL0 m", &mut tx));
        (model, tx)
    }

    #[test]
    fn test_node_tree_seeds_rigid_matrices() {
        let (model, tx) = replay(&binary());
        assert!(tx.is_clean(), "{:?}", tx.messages());
        assert_eq!(model.bones[0].children, vec![1, 2, 3]);
        assert_eq!(model.draw_matrices.len(), 4);
        assert_eq!(model.draw_matrices[2], DrawMatrix::rigid(2));
    }

    #[test]
    fn test_node_mix_resolves_through_lut() {
        let mut bin = binary();
        let mut mix = ByteCodeMethod::new(METHOD_NODE_MIX);
        mix.commands.push(Command::NodeMix {
            matrix: 4,
            blend: smallvec![BlendMatrix { matrix: 2, ratio: 0.5 }, BlendMatrix { matrix: 3, ratio: 0.5 }],
        });
        bin.bytecodes.push(mix);
        let (model, tx) = replay(&bin);
        assert!(!tx.is_failure());
        let weights = &model.draw_matrices[4].weights;
        assert_eq!(weights.as_slice(), &[MatrixWeight { bone: 2, weight: 0.5 }, MatrixWeight { bone: 3, weight: 0.5 }]);
    }

    #[test]
    fn test_draw_out_of_range_clamps() {
        let mut bin = binary();
        bin.materials.push(Material::new("mat"));
        bin.meshes.push(Mesh::new("poly"));
        let mut opa = ByteCodeMethod::new(METHOD_DRAW_OPA);
        opa.commands.push(Command::Draw { material: 7, mesh: 0, bone: 9, priority: 0 });
        bin.bytecodes.push(opa);
        let (model, tx) = replay(&bin);
        assert!(tx.is_failure());
        assert_eq!(tx.errors().count(), 2);
        assert_eq!(model.bones[0].displays, vec![Display { material: 0, mesh: 0, priority: 0 }]);
    }

    #[test]
    fn test_lut_ownership_warning() {
        let mut bin = binary();
        bin.matrix_to_bone.swap(1, 2);
        let (_, tx) = replay(&bin);
        assert_eq!(tx.warnings().count(), 2);
        assert!(!tx.is_failure());

        bin.bones[3].matrix_id = 40;
        let (_, tx) = replay(&bin);
        assert!(tx.is_failure());
    }

    #[test]
    fn test_parent_cycle_broken() {
        let mut model = Model::new("m");
        model.bones.push(Bone { parent: 1, ..Bone::new("a") });
        model.bones.push(Bone { parent: 0, ..Bone::new("b") });
        let mut tx = Transaction::new();
        break_parent_cycles(&mut model, &mut IoContext::new("m", &mut tx));
        assert!(tx.is_failure());
        assert!(model.bones.iter().any(|b| b.parent == -1));
    }

    #[test]
    fn test_render_lists_without_blending() {
        let (model, _) = replay(&binary());
        let mut tx = Transaction::new();
        let lists = build_render_lists(&model, &mut IoContext::new("m", &mut tx)).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, METHOD_NODE_TREE);
        assert_eq!(
            lists[0].commands[1],
            Command::NodeDescendence { bone: 1, parent_matrix: 0 }
        );
    }

    #[test]
    fn test_render_lists_with_blending() {
        let (mut model, _) = replay(&binary());
        model.draw_matrices.push(DrawMatrix {
            weights: smallvec![MatrixWeight { bone: 1, weight: 0.25 }, MatrixWeight { bone: 3, weight: 0.75 }],
        });
        model.materials.push(Material { xlu: true, ..Material::new("glass") });
        model.bones[2].displays.push(Display { material: 0, mesh: 0, priority: 3 });

        let mut tx = Transaction::new();
        let lists = build_render_lists(&model, &mut IoContext::new("m", &mut tx)).unwrap();
        let names: Vec<_> = lists.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec![METHOD_NODE_TREE, METHOD_NODE_MIX, METHOD_DRAW_XLU]);
        let mix = &lists[1].commands;
        assert_eq!(mix.len(), 5);
        assert_eq!(mix[0], Command::EnvelopeMatrix { matrix: 0, bone: 0 });
        assert_eq!(
            mix[4],
            Command::NodeMix {
                matrix: 4,
                blend: smallvec![BlendMatrix { matrix: 1, ratio: 0.25 }, BlendMatrix { matrix: 3, ratio: 0.75 }],
            }
        );
    }

    #[test]
    fn test_render_lists_keep_unowned_rigid_matrix() {
        let (mut model, _) = replay(&binary());
        model.draw_matrices.push(DrawMatrix::rigid(1));

        // Without blending there is no NodeMix method to carry it
        let mut tx = Transaction::new();
        let lists = build_render_lists(&model, &mut IoContext::new("m", &mut tx)).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(tx.warnings().count(), 1);

        model.draw_matrices.push(DrawMatrix {
            weights: smallvec![MatrixWeight { bone: 0, weight: 0.5 }, MatrixWeight { bone: 2, weight: 0.5 }],
        });
        let mut tx = Transaction::new();
        let lists = build_render_lists(&model, &mut IoContext::new("m", &mut tx)).unwrap();
        assert!(tx.is_clean(), "{:?}", tx.messages());
        assert_eq!(lists[1].name, METHOD_NODE_MIX);
        let mix = &lists[1].commands;
        assert_eq!(mix.len(), 6);
        assert_eq!(mix[3], Command::EnvelopeMatrix { matrix: 3, bone: 3 });
        assert_eq!(mix[4], Command::EnvelopeMatrix { matrix: 4, bone: 1 });
        assert!(matches!(mix[5], Command::NodeMix { matrix: 5, .. }));
    }

    #[test]
    fn test_binary_bone_links() {
        let (model, _) = replay(&binary());
        let mut tx = Transaction::new();
        let bin = to_binary_model(&model, &mut IoContext::new("m", &mut tx)).unwrap();
        assert_eq!(bin.bones[0].first_child, 1);
        assert_eq!((bin.bones[1].left_sibling, bin.bones[1].right_sibling), (-1, 2));
        assert_eq!((bin.bones[2].left_sibling, bin.bones[2].right_sibling), (1, 3));
        assert_eq!((bin.bones[3].left_sibling, bin.bones[3].right_sibling), (2, -1));
        assert_eq!(bin.matrix_to_bone, vec![0, 1, 2, 3]);
        assert_eq!(bin.info.num_view_mtx, 0);
        assert!(!bin.info.bound_volume);
    }
}
