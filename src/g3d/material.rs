//! Material codec.
//!
//! A material is a fixed-layout snapshot of the fixed-function pipeline
//! state. Array sections are present up to the counts in the header; the
//! counts are always recomputed from the arrays when writing.
//!
//! ```text
//! 0x00 u32 size               0x14 u8 texgens, chans, tev stages, ind stages
//! 0x04 s32 model offset       0x18 u8 controls, samplers, tex mtx, ind mtx
//! 0x08 s32 name offset        0x1C u32 cull mode
//! 0x0C u32 index              0x20 z mode (4)  0x24 alpha compare (8)
//! 0x10 u32 flag (bit 31 xlu)  0x2C blend (4)   0x30 misc flags (4)
//! 0x34 konst colors (16)  0x44 tev colors (32)  0x64 swap table (16)
//! 0x74 chan data, controls, texgens, tex matrices, samplers, tev stages,
//!      indirect orders, indirect matrices
//! ```

use super::gx::*;
use super::tex_matrix::{MappingMethod, MappingOption, TexMatrix, TransformModel};
use crate::io::{NameTable, Reader, Writer};
use crate::util::{ArrayVector, Error, Result};

/// Size of everything before the variable arrays.
pub const MATERIAL_FIXED_SIZE: u32 = 0x74;

const CHAN_DATA_SIZE: u32 = 8;
const CHAN_CONTROL_SIZE: u32 = 8;
const TEX_GEN_SIZE: u32 = 8;
const TEX_MATRIX_SIZE: u32 = 92;
const SAMPLER_SIZE: u32 = 20;
const TEV_STAGE_SIZE: u32 = 36;
const IND_ORDER_SIZE: u32 = 4;
const IND_MATRIX_SIZE: u32 = 28;

const FLAG_XLU: u32 = 0x8000_0000;
const MISC_EARLY_Z: u8 = 0x01;
const MISC_DITHER: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelData {
    pub material_color: Color,
    pub ambient_color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelControl {
    pub enabled: bool,
    pub ambient: ColorSource,
    pub material: ColorSource,
    pub light_mask: u8,
    pub diffuse: DiffuseFunction,
    pub attenuation: AttenuationFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TexGen {
    pub func: TexGenType,
    pub source: TexGenSrc,
    /// Hardware matrix slot (60 = identity, 30 + 3n = texture matrix n).
    pub matrix: u8,
    pub normalize: bool,
    pub post_matrix: u8,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sampler {
    pub texture: String,
    pub palette: String,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub lod_bias: f32,
    pub max_aniso: Anisotropy,
    pub bias_clamp: bool,
    pub edge_lod: bool,
}

/// One half (color or alpha) of a tev combiner. Arguments and operators are
/// raw register selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TevCombiner {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub op: u8,
    pub bias: u8,
    pub scale: u8,
    pub clamp: bool,
    pub out: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndirectStage {
    pub ind_stage: u8,
    pub format: u8,
    pub bias: u8,
    pub matrix: u8,
    pub wrap_s: u8,
    pub wrap_t: u8,
    pub add_prev: bool,
    pub utc_lod: bool,
    pub alpha: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TevStage {
    pub ras_order: u8,
    pub tex_map: u8,
    pub tex_coord: u8,
    pub ras_swap: u8,
    pub tex_swap: u8,
    pub konst_color_sel: u8,
    pub konst_alpha_sel: u8,
    pub color: TevCombiner,
    pub alpha: TevCombiner,
    pub indirect: IndirectStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for SwapSel {
    fn default() -> Self {
        Self { r: 0, g: 1, b: 2, a: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndirectOrder {
    pub tex_coord: u8,
    pub tex_map: u8,
    pub scale_u: u8,
    pub scale_v: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndirectMatrix {
    pub scale: i8,
    pub matrix: [[f32; 3]; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZMode {
    pub compare: bool,
    pub function: Compare,
    pub update: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlphaCompare {
    pub comp0: Compare,
    pub ref0: u8,
    pub op: AlphaOp,
    pub comp1: Compare,
    pub ref1: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendMode {
    pub kind: BlendModeType,
    pub source: BlendFactor,
    pub dest: BlendFactor,
    pub logic: LogicOp,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub name: String,
    /// Drawn in the translucent pass.
    pub xlu: bool,
    pub cull_mode: CullMode,
    pub early_z: bool,
    pub dither: bool,
    pub z_mode: ZMode,
    pub alpha_compare: AlphaCompare,
    pub blend_mode: BlendMode,
    pub chan_data: ArrayVector<ChannelData, 2>,
    /// Color0, Alpha0, Color1, Alpha1.
    pub color_chan_controls: ArrayVector<ChannelControl, 4>,
    pub tex_gens: ArrayVector<TexGen, 8>,
    pub konst_colors: [Color; 4],
    pub tev_colors: [ColorS10; 4],
    pub tex_matrices: ArrayVector<TexMatrix, 10>,
    pub samplers: ArrayVector<Sampler, 8>,
    pub tev_stages: ArrayVector<TevStage, 16>,
    pub swap_table: [SwapSel; 4],
    pub ind_orders: ArrayVector<IndirectOrder, 4>,
    pub ind_matrices: ArrayVector<IndirectMatrix, 3>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> u32 {
        MATERIAL_FIXED_SIZE
            + CHAN_DATA_SIZE * self.chan_data.len() as u32
            + CHAN_CONTROL_SIZE * self.color_chan_controls.len() as u32
            + TEX_GEN_SIZE * self.tex_gens.len() as u32
            + TEX_MATRIX_SIZE * self.tex_matrices.len() as u32
            + SAMPLER_SIZE * self.samplers.len() as u32
            + TEV_STAGE_SIZE * self.tev_stages.len() as u32
            + IND_ORDER_SIZE * self.ind_orders.len() as u32
            + IND_MATRIX_SIZE * self.ind_matrices.len() as u32
    }

    /// Texture names referenced by the samplers, in slot order.
    pub fn texture_names(&self) -> impl Iterator<Item = &str> {
        self.samplers.iter().map(|s| s.texture.as_str()).filter(|t| !t.is_empty())
    }

    pub fn read(r: &mut Reader<'_>) -> Result<Self> {
        let start = r.tell();
        let size = r.read_u32()?;
        let _model_ofs = r.read_i32()?;
        let name = r.read_name(start)?;
        let _index = r.read_u32()?;
        let flag = r.read_u32()?;

        let n_tex_gens = r.read_u8()?;
        let n_chans = r.read_u8()?;
        let n_stages = r.read_u8()?;
        let n_ind = r.read_u8()?;
        let n_controls = r.read_u8()?;
        let n_samplers = r.read_u8()?;
        let n_tex_mtx = r.read_u8()?;
        let n_ind_mtx = r.read_u8()?;

        let mut mat = Material {
            name,
            xlu: flag & FLAG_XLU != 0,
            cull_mode: read_enum32(r, "cull mode", CullMode::from_u8)?,
            ..Default::default()
        };

        mat.z_mode = ZMode {
            compare: r.read_bool()?,
            function: Compare::from_u8(r.read_u8()?)?,
            update: r.read_bool()?,
        };
        r.skip(1)?;
        mat.alpha_compare = AlphaCompare {
            comp0: Compare::from_u8(r.read_u8()?)?,
            ref0: r.read_u8()?,
            op: AlphaOp::from_u8(r.read_u8()?)?,
            comp1: Compare::from_u8(r.read_u8()?)?,
            ref1: r.read_u8()?,
        };
        r.skip(3)?;
        mat.blend_mode = BlendMode {
            kind: BlendModeType::from_u8(r.read_u8()?)?,
            source: BlendFactor::from_u8(r.read_u8()?)?,
            dest: BlendFactor::from_u8(r.read_u8()?)?,
            logic: LogicOp::from_u8(r.read_u8()?)?,
        };
        let misc = r.read_u8()?;
        mat.early_z = misc & MISC_EARLY_Z != 0;
        mat.dither = misc & MISC_DITHER != 0;
        r.skip(3)?;

        for c in mat.konst_colors.iter_mut() {
            *c = read_color(r)?;
        }
        for c in mat.tev_colors.iter_mut() {
            *c = ColorS10 { r: r.read_i16()?, g: r.read_i16()?, b: r.read_i16()?, a: r.read_i16()? };
        }
        for s in mat.swap_table.iter_mut() {
            *s = SwapSel { r: r.read_u8()?, g: r.read_u8()?, b: r.read_u8()?, a: r.read_u8()? };
        }

        for _ in 0..n_chans {
            mat.chan_data.push(ChannelData {
                material_color: read_color(r)?,
                ambient_color: read_color(r)?,
            })?;
        }
        for _ in 0..n_controls {
            let control = ChannelControl {
                enabled: r.read_bool()?,
                ambient: ColorSource::from_u8(r.read_u8()?)?,
                material: ColorSource::from_u8(r.read_u8()?)?,
                light_mask: r.read_u8()?,
                diffuse: DiffuseFunction::from_u8(r.read_u8()?)?,
                attenuation: AttenuationFunction::from_u8(r.read_u8()?)?,
            };
            r.skip(2)?;
            mat.color_chan_controls.push(control)?;
        }
        for _ in 0..n_tex_gens {
            let gen = TexGen {
                func: TexGenType::from_u8(r.read_u8()?)?,
                source: TexGenSrc::from_u8(r.read_u8()?)?,
                matrix: r.read_u8()?,
                normalize: r.read_bool()?,
                post_matrix: r.read_u8()?,
            };
            r.skip(3)?;
            mat.tex_gens.push(gen)?;
        }
        for _ in 0..n_tex_mtx {
            mat.tex_matrices.push(read_tex_matrix(r)?)?;
        }
        for _ in 0..n_samplers {
            let sampler = Sampler {
                texture: r.read_name(start)?,
                palette: r.read_name(start)?,
                wrap_u: WrapMode::from_u8(r.read_u8()?)?,
                wrap_v: WrapMode::from_u8(r.read_u8()?)?,
                min_filter: TextureFilter::from_u8(r.read_u8()?)?,
                mag_filter: TextureFilter::from_u8(r.read_u8()?)?,
                lod_bias: r.read_f32()?,
                max_aniso: Anisotropy::from_u8(r.read_u8()?)?,
                bias_clamp: r.read_bool()?,
                edge_lod: r.read_bool()?,
            };
            r.skip(1)?;
            mat.samplers.push(sampler)?;
        }
        for _ in 0..n_stages {
            mat.tev_stages.push(read_tev_stage(r)?)?;
        }
        for _ in 0..n_ind {
            mat.ind_orders.push(IndirectOrder {
                tex_coord: r.read_u8()?,
                tex_map: r.read_u8()?,
                scale_u: r.read_u8()?,
                scale_v: r.read_u8()?,
            })?;
        }
        for _ in 0..n_ind_mtx {
            let scale = r.read_i8()?;
            r.skip(3)?;
            let mut matrix = [[0.0f32; 3]; 2];
            for row in matrix.iter_mut() {
                for v in row.iter_mut() {
                    *v = r.read_f32()?;
                }
            }
            mat.ind_matrices.push(IndirectMatrix { scale, matrix })?;
        }

        if size != mat.size() {
            return Err(Error::invalid(format!(
                "material {} declares size 0x{size:X} but its contents take 0x{:X}",
                mat.name,
                mat.size()
            )));
        }
        Ok(mat)
    }

    /// Write at the cursor. `model_start` is the owning MDL0 address.
    pub fn write(&self, w: &mut Writer, names: &mut NameTable, model_start: u32, index: u32) -> Result<()> {
        let start = w.tell();
        w.write_u32(self.size())?;
        w.write_offset(model_start, start)?;
        names.write_ref(w, start, &self.name)?;
        w.write_u32(index)?;
        w.write_u32(if self.xlu { FLAG_XLU } else { 0 })?;

        w.write_u8(self.tex_gens.len() as u8)?;
        w.write_u8(self.chan_data.len() as u8)?;
        w.write_u8(self.tev_stages.len() as u8)?;
        w.write_u8(self.ind_orders.len() as u8)?;
        w.write_u8(self.color_chan_controls.len() as u8)?;
        w.write_u8(self.samplers.len() as u8)?;
        w.write_u8(self.tex_matrices.len() as u8)?;
        w.write_u8(self.ind_matrices.len() as u8)?;
        w.write_u32(self.cull_mode.to_u8() as u32)?;

        w.write_bool(self.z_mode.compare)?;
        w.write_u8(self.z_mode.function.to_u8())?;
        w.write_bool(self.z_mode.update)?;
        w.write_u8(0)?;
        let ac = &self.alpha_compare;
        w.write_u8(ac.comp0.to_u8())?;
        w.write_u8(ac.ref0)?;
        w.write_u8(ac.op.to_u8())?;
        w.write_u8(ac.comp1.to_u8())?;
        w.write_u8(ac.ref1)?;
        w.write_zeros(3)?;
        let bm = &self.blend_mode;
        w.write_u8(bm.kind.to_u8())?;
        w.write_u8(bm.source.to_u8())?;
        w.write_u8(bm.dest.to_u8())?;
        w.write_u8(bm.logic.to_u8())?;
        let mut misc = 0;
        if self.early_z {
            misc |= MISC_EARLY_Z;
        }
        if self.dither {
            misc |= MISC_DITHER;
        }
        w.write_u8(misc)?;
        w.write_zeros(3)?;

        for c in &self.konst_colors {
            write_color(w, c)?;
        }
        for c in &self.tev_colors {
            w.write_i16(c.r)?;
            w.write_i16(c.g)?;
            w.write_i16(c.b)?;
            w.write_i16(c.a)?;
        }
        for s in &self.swap_table {
            w.write_bytes(&[s.r, s.g, s.b, s.a])?;
        }

        for c in &self.chan_data {
            write_color(w, &c.material_color)?;
            write_color(w, &c.ambient_color)?;
        }
        for c in &self.color_chan_controls {
            w.write_bool(c.enabled)?;
            w.write_u8(c.ambient.to_u8())?;
            w.write_u8(c.material.to_u8())?;
            w.write_u8(c.light_mask)?;
            w.write_u8(c.diffuse.to_u8())?;
            w.write_u8(c.attenuation.to_u8())?;
            w.write_zeros(2)?;
        }
        for g in &self.tex_gens {
            w.write_u8(g.func.to_u8())?;
            w.write_u8(g.source.to_u8())?;
            w.write_u8(g.matrix)?;
            w.write_bool(g.normalize)?;
            w.write_u8(g.post_matrix)?;
            w.write_zeros(3)?;
        }
        for m in &self.tex_matrices {
            write_tex_matrix(w, m)?;
        }
        for s in &self.samplers {
            names.write_ref(w, start, &s.texture)?;
            names.write_ref(w, start, &s.palette)?;
            w.write_u8(s.wrap_u.to_u8())?;
            w.write_u8(s.wrap_v.to_u8())?;
            w.write_u8(s.min_filter.to_u8())?;
            w.write_u8(s.mag_filter.to_u8())?;
            w.write_f32(s.lod_bias)?;
            w.write_u8(s.max_aniso.to_u8())?;
            w.write_bool(s.bias_clamp)?;
            w.write_bool(s.edge_lod)?;
            w.write_u8(0)?;
        }
        for s in &self.tev_stages {
            write_tev_stage(w, s)?;
        }
        for o in &self.ind_orders {
            w.write_bytes(&[o.tex_coord, o.tex_map, o.scale_u, o.scale_v])?;
        }
        for m in &self.ind_matrices {
            w.write_i8(m.scale)?;
            w.write_zeros(3)?;
            for v in m.matrix.iter().flatten() {
                w.write_f32(*v)?;
            }
        }
        Ok(())
    }
}

fn read_color(r: &mut Reader<'_>) -> Result<Color> {
    Ok(Color::new(r.read_u8()?, r.read_u8()?, r.read_u8()?, r.read_u8()?))
}

fn write_color(w: &mut Writer, c: &Color) -> Result<()> {
    w.write_bytes(&[c.r, c.g, c.b, c.a])
}

fn read_tex_matrix(r: &mut Reader<'_>) -> Result<TexMatrix> {
    let projection = TexGenType::from_u8(r.read_u8()?)?;
    let method = MappingMethod::from_u8(r.read_u8()?)?;
    let transform_model = TransformModel::from_u8(r.read_u8()?)?;
    let option = MappingOption::from_u8(r.read_u8()?)?;
    let camera = r.read_i8()?;
    let light = r.read_i8()?;
    r.skip(2)?;
    let scale = r.read_vec2()?;
    let rotate = r.read_f32()?;
    let translate = r.read_vec2()?;
    let mut effect_matrix = [0.0f32; 16];
    for v in effect_matrix.iter_mut() {
        *v = r.read_f32()?;
    }
    Ok(TexMatrix {
        projection,
        scale,
        rotate,
        translate,
        effect_matrix,
        transform_model,
        method,
        option,
        camera,
        light,
    })
}

fn write_tex_matrix(w: &mut Writer, m: &TexMatrix) -> Result<()> {
    w.write_u8(m.projection.to_u8())?;
    w.write_u8(m.method.to_u8())?;
    w.write_u8(m.transform_model.to_u8())?;
    w.write_u8(m.option.to_u8())?;
    w.write_i8(m.camera)?;
    w.write_i8(m.light)?;
    w.write_zeros(2)?;
    w.write_vec2(m.scale)?;
    w.write_f32(m.rotate)?;
    w.write_vec2(m.translate)?;
    for v in &m.effect_matrix {
        w.write_f32(*v)?;
    }
    Ok(())
}

fn read_combiner(r: &mut Reader<'_>) -> Result<TevCombiner> {
    Ok(TevCombiner {
        a: r.read_u8()?,
        b: r.read_u8()?,
        c: r.read_u8()?,
        d: r.read_u8()?,
        op: r.read_u8()?,
        bias: r.read_u8()?,
        scale: r.read_u8()?,
        clamp: r.read_bool()?,
        out: r.read_u8()?,
    })
}

fn write_combiner(w: &mut Writer, c: &TevCombiner) -> Result<()> {
    w.write_bytes(&[c.a, c.b, c.c, c.d, c.op, c.bias, c.scale, c.clamp as u8, c.out])
}

fn read_tev_stage(r: &mut Reader<'_>) -> Result<TevStage> {
    let stage = TevStage {
        ras_order: r.read_u8()?,
        tex_map: r.read_u8()?,
        tex_coord: r.read_u8()?,
        ras_swap: r.read_u8()?,
        tex_swap: r.read_u8()?,
        konst_color_sel: r.read_u8()?,
        konst_alpha_sel: r.read_u8()?,
        color: read_combiner(r)?,
        alpha: read_combiner(r)?,
        indirect: IndirectStage {
            ind_stage: r.read_u8()?,
            format: r.read_u8()?,
            bias: r.read_u8()?,
            matrix: r.read_u8()?,
            wrap_s: r.read_u8()?,
            wrap_t: r.read_u8()?,
            add_prev: r.read_bool()?,
            utc_lod: r.read_bool()?,
            alpha: r.read_u8()?,
        },
    };
    r.skip(2)?;
    Ok(stage)
}

fn write_tev_stage(w: &mut Writer, s: &TevStage) -> Result<()> {
    w.write_bytes(&[
        s.ras_order,
        s.tex_map,
        s.tex_coord,
        s.ras_swap,
        s.tex_swap,
        s.konst_color_sel,
        s.konst_alpha_sel,
    ])?;
    write_combiner(w, &s.color)?;
    write_combiner(w, &s.alpha)?;
    let i = &s.indirect;
    w.write_bytes(&[
        i.ind_stage,
        i.format,
        i.bias,
        i.matrix,
        i.wrap_s,
        i.wrap_t,
        i.add_prev as u8,
        i.utc_lod as u8,
        i.alpha,
    ])?;
    w.write_zeros(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec2;

    fn sample_material() -> Material {
        let mut mat = Material::new("road");
        mat.xlu = true;
        mat.cull_mode = CullMode::None;
        mat.early_z = true;
        mat.z_mode = ZMode { compare: true, function: Compare::LEqual, update: true };
        mat.alpha_compare.comp0 = Compare::GEqual;
        mat.alpha_compare.ref0 = 128;
        mat.blend_mode = BlendMode {
            kind: BlendModeType::Blend,
            source: BlendFactor::SrcAlpha,
            dest: BlendFactor::InvSrcAlpha,
            logic: LogicOp::Copy,
        };
        mat.chan_data
            .push(ChannelData { material_color: Color::WHITE, ambient_color: Color::new(10, 20, 30, 40) })
            .unwrap();
        mat.color_chan_controls.push(ChannelControl { enabled: true, ..Default::default() }).unwrap();
        mat.color_chan_controls.push(ChannelControl::default()).unwrap();
        mat.tex_gens.push(TexGen { matrix: 30, ..Default::default() }).unwrap();
        mat.tex_matrices
            .push(TexMatrix { scale: Vec2::new(2.0, 2.0), rotate: 45.0, ..Default::default() })
            .unwrap();
        mat.samplers
            .push(Sampler { texture: "asphalt".into(), min_filter: TextureFilter::LinMipLin, ..Default::default() })
            .unwrap();
        mat.tev_stages.push(TevStage { tex_map: 0, ..Default::default() }).unwrap();
        mat.tev_stages.push(TevStage { ras_order: 4, ..Default::default() }).unwrap();
        mat.ind_matrices.push(IndirectMatrix { scale: -3, matrix: [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0]] }).unwrap();
        mat.konst_colors[2] = Color::new(1, 2, 3, 4);
        mat.tev_colors[1] = ColorS10 { r: -4, g: 255, b: 1023, a: 0 };
        mat
    }

    #[test]
    fn test_size_tracks_arrays() {
        let mat = Material::new("empty");
        assert_eq!(mat.size(), MATERIAL_FIXED_SIZE);
        let mat = sample_material();
        assert_eq!(mat.size(), MATERIAL_FIXED_SIZE + 8 + 16 + 8 + 92 + 20 + 72 + 28);
    }

    #[test]
    fn test_encode_decode() {
        let mat = sample_material();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        mat.write(&mut w, &mut names, 0, 0).unwrap();
        assert_eq!(w.tell(), mat.size());
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();

        let back = Material::read(&mut Reader::new(&bytes)).unwrap();
        assert_eq!(back, mat);
        assert_eq!(back.texture_names().collect::<Vec<_>>(), vec!["asphalt"]);
    }

    #[test]
    fn test_counts_follow_arrays_not_cache() {
        let mut mat = sample_material();
        mat.tev_stages.pop();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        mat.write(&mut w, &mut names, 0, 0).unwrap();
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();
        // tev stage count lives at 0x16
        assert_eq!(bytes[0x16], 1);
        assert_eq!(Material::read(&mut Reader::new(&bytes)).unwrap().tev_stages.len(), 1);
    }

    #[test]
    fn test_bad_enum_rejected() {
        let mat = sample_material();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        mat.write(&mut w, &mut names, 0, 0).unwrap();
        names.flush(&mut w).unwrap();
        let mut bytes = w.into_bytes();
        bytes[0x1F] = 9; // cull mode
        assert!(Material::read(&mut Reader::new(&bytes)).unwrap_err().is_malformed_input());

        // High bytes of the cull mode word are not ignored
        bytes[0x1E] = 1;
        bytes[0x1F] = 1;
        assert!(Material::read(&mut Reader::new(&bytes)).unwrap_err().is_malformed_input());
    }

    #[test]
    fn test_capacity_overflow_rejected() {
        let mut w = Writer::new();
        let mut names = NameTable::new();
        Material::new("m").write(&mut w, &mut names, 0, 0).unwrap();
        let mut bytes = w.into_bytes();
        bytes[0x15] = 3; // three channels, capacity is two
        bytes.extend_from_slice(&[0; 64]);
        assert!(Material::read(&mut Reader::new(&bytes)).is_err());
    }
}
