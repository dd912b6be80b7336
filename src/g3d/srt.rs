//! Texture SRT animation (`SRT0`, version 5).
//!
//! ```text
//! 0x00 "SRT0"               0x18 s32 name offset
//! 0x04 u32 size             0x1C s32 source path offset
//! 0x08 u32 version (5)      0x20 u16 frame duration, 0x22 u16 material count
//! 0x0C s32 archive offset   0x24 u32 transform model
//! 0x10 s32 material dict    0x28 u32 wrap mode
//! 0x14 s32 user data
//! ```
//!
//! Material blocks follow the dictionary, then every distinct track once.
//! Track offsets inside a matrix are relative to the offset field itself;
//! matrix offsets inside a material are relative to the material.

use std::collections::HashMap;

use tracing::debug;

use super::gx::{gx_enum, read_enum32};
use super::tex_matrix::TransformModel;
use crate::io::format::{rel, SRT0_MAGIC, SRT0_VERSION};
use crate::io::{calc_dictionary_size, Dictionary, NameTable, Reader, Region, Writer};
use crate::report::IoContext;
use crate::util::{Error, Result};

pub const SRT0_HEADER_SIZE: u32 = 0x2C;

/// Texture coordinate matrices a material can animate.
pub const MAX_TEXTURE_SRTS: usize = 8;
/// Indirect matrix slots addressable by the 32-bit enable mask.
pub const MAX_INDIRECT_SRTS: usize = 32;

pub const SRT_ENABLED: u32 = 0x001;
pub const SRT_SCL_ONE: u32 = 0x002;
pub const SRT_ROT_ZERO: u32 = 0x004;
pub const SRT_TRANS_ZERO: u32 = 0x008;
pub const SRT_SCL_ISOTROPIC: u32 = 0x010;
pub const SRT_SCL_U_FIXED: u32 = 0x020;
pub const SRT_SCL_V_FIXED: u32 = 0x040;
pub const SRT_ROT_FIXED: u32 = 0x080;
pub const SRT_TRANS_U_FIXED: u32 = 0x100;
pub const SRT_TRANS_V_FIXED: u32 = 0x200;

const SRT_FIXED_MASK: u32 =
    SRT_SCL_U_FIXED | SRT_SCL_V_FIXED | SRT_ROT_FIXED | SRT_TRANS_U_FIXED | SRT_TRANS_V_FIXED;

gx_enum! {
    pub enum AnimationWrapMode {
        Clamp = 0,
        #[default] Repeat = 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keyframe {
    pub frame: f32,
    pub value: f32,
    pub tangent: f32,
}

/// Hermite-interpolated curve shared by any number of bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SrtTrack {
    pub reserved: [u8; 2],
    pub step: f32,
    pub keyframes: Vec<Keyframe>,
}

/// Bit pattern of a track; equal keys mean byte-identical encodings.
#[derive(Hash, PartialEq, Eq)]
struct TrackKey(Vec<u32>);

impl SrtTrack {
    pub fn size(&self) -> u32 {
        8 + 12 * self.keyframes.len() as u32
    }

    fn key(&self) -> TrackKey {
        let mut bits = Vec::with_capacity(2 + 3 * self.keyframes.len());
        bits.push(u16::from_be_bytes(self.reserved) as u32);
        bits.push(self.step.to_bits());
        for k in &self.keyframes {
            bits.extend([k.frame.to_bits(), k.value.to_bits(), k.tangent.to_bits()]);
        }
        TrackKey(bits)
    }

    /// Value at `frame`, clamped to the first and last keys.
    pub fn sample(&self, frame: f32) -> Option<f32> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if frame <= first.frame {
            return Some(first.value);
        }
        if frame >= last.frame {
            return Some(last.value);
        }
        let i = self.keyframes.partition_point(|k| k.frame <= frame).saturating_sub(1);
        let (k0, k1) = (&self.keyframes[i], &self.keyframes[i + 1]);
        let dt = k1.frame - k0.frame;
        if dt <= 0.0 {
            return Some(k1.value);
        }
        let t = (frame - k0.frame) / dt;
        let (t2, t3) = (t * t, t * t * t);
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        Some(h00 * k0.value + h10 * dt * k0.tangent + h01 * k1.value + h11 * dt * k1.tangent)
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_u16()? as usize;
        let reserved = [r.read_u8()?, r.read_u8()?];
        let step = r.read_f32()?;
        let end = r.tell() as u64 + 12 * count as u64;
        if end > r.len() as u64 {
            return Err(Error::UnexpectedEof(end));
        }
        let keyframes = (0..count)
            .map(|_| {
                Ok(Keyframe { frame: r.read_f32()?, value: r.read_f32()?, tangent: r.read_f32()? })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { reserved, step, keyframes })
    }

    fn write(&self, w: &mut Writer) -> Result<()> {
        let count = u16::try_from(self.keyframes.len())
            .map_err(|_| Error::WriteFailed(format!("{} keyframes in one track", self.keyframes.len())))?;
        w.write_u16(count)?;
        w.write_bytes(&self.reserved)?;
        w.write_f32(self.step)?;
        for k in &self.keyframes {
            w.write_f32(k.frame)?;
            w.write_f32(k.value)?;
            w.write_f32(k.tangent)?;
        }
        Ok(())
    }
}

/// Tracks interned by content during decode.
#[derive(Default)]
struct TrackTable {
    tracks: Vec<SrtTrack>,
    index: HashMap<TrackKey, usize>,
}

impl TrackTable {
    fn intern(&mut self, track: SrtTrack) -> usize {
        let key = track.key();
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        self.tracks.push(track);
        self.index.insert(key, self.tracks.len() - 1);
        self.tracks.len() - 1
    }
}

/// Animated attribute of a texture matrix, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrtTarget {
    ScaleU,
    ScaleV,
    Rotate,
    TransU,
    TransV,
}

impl SrtTarget {
    pub const ALL: [SrtTarget; 5] = [Self::ScaleU, Self::ScaleV, Self::Rotate, Self::TransU, Self::TransV];

    /// Flag bit that, when set, marks this attribute as at its default.
    fn default_flag(self) -> u32 {
        match self {
            Self::ScaleU => SRT_SCL_ONE,
            Self::ScaleV => SRT_SCL_ISOTROPIC,
            Self::Rotate => SRT_ROT_ZERO,
            Self::TransU | Self::TransV => SRT_TRANS_ZERO,
        }
    }

    fn fixed_flag(self) -> u32 {
        match self {
            Self::ScaleU => SRT_SCL_U_FIXED,
            Self::ScaleV => SRT_SCL_V_FIXED,
            Self::Rotate => SRT_ROT_FIXED,
            Self::TransU => SRT_TRANS_U_FIXED,
            Self::TransV => SRT_TRANS_V_FIXED,
        }
    }

    fn included(self, flags: u32) -> bool {
        flags & self.default_flag() == 0
    }

    fn default_value(self) -> f32 {
        match self {
            Self::ScaleU | Self::ScaleV => 1.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SrtAttribute {
    Fixed(f32),
    /// Index into [`SrtAnimation::tracks`].
    Animated(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrtBinding {
    pub target: SrtTarget,
    pub data: SrtAttribute,
}

/// Per-texture-matrix bindings. Only attributes not at their default are
/// stored; the flag word says which.
#[derive(Debug, Clone, PartialEq)]
pub struct SrtMatrix {
    pub flags: u32,
    pub targets: Vec<SrtBinding>,
}

impl Default for SrtMatrix {
    fn default() -> Self {
        Self {
            flags: SRT_ENABLED | SRT_SCL_ONE | SRT_SCL_ISOTROPIC | SRT_ROT_ZERO | SRT_TRANS_ZERO,
            targets: Vec::new(),
        }
    }
}

impl SrtMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> u32 {
        4 + 4 * self.targets.len() as u32
    }

    /// Targets the flag word says are stored, in on-disk order.
    pub fn included_targets(&self) -> impl Iterator<Item = SrtTarget> + '_ {
        let enabled = self.flags & SRT_ENABLED != 0;
        SrtTarget::ALL
            .into_iter()
            .filter(move |t| enabled && t.included(self.flags))
    }

    /// Bind `target`, clearing its default bit and filling any attribute that
    /// becomes stored as a side effect with its implicit value.
    pub fn set(&mut self, target: SrtTarget, data: SrtAttribute) {
        let implicit: Vec<(SrtTarget, SrtAttribute)> =
            SrtTarget::ALL.iter().map(|&t| (t, self.get(t))).collect();
        self.flags = (self.flags | SRT_ENABLED) & !target.default_flag();
        let included: Vec<SrtTarget> = self.included_targets().collect();
        self.targets = included
            .into_iter()
            .map(|t| {
                let data = if t == target {
                    data
                } else {
                    implicit.iter().find(|(it, _)| *it == t).map_or(SrtAttribute::Fixed(t.default_value()), |x| x.1)
                };
                SrtBinding { target: t, data }
            })
            .collect();
        self.flags = self.encoded_flags();
    }

    /// Resolved binding for `target`, applying the implicit defaults: unit
    /// scale, V scale following U when isotropic, zero rotation and
    /// translation.
    pub fn get(&self, target: SrtTarget) -> SrtAttribute {
        if let Some(b) = self.targets.iter().find(|b| b.target == target) {
            return b.data;
        }
        if target == SrtTarget::ScaleV && self.flags & SRT_SCL_ISOTROPIC != 0 {
            return self.get(SrtTarget::ScaleU);
        }
        SrtAttribute::Fixed(target.default_value())
    }

    /// Value of `target` at `frame`.
    pub fn value(&self, target: SrtTarget, frame: f32, tracks: &[SrtTrack]) -> f32 {
        match self.get(target) {
            SrtAttribute::Fixed(v) => v,
            SrtAttribute::Animated(i) => tracks
                .get(i)
                .and_then(|t| t.sample(frame))
                .unwrap_or(target.default_value()),
        }
    }

    /// Flag word with the fixed bits recomputed from the bindings.
    fn encoded_flags(&self) -> u32 {
        self.targets.iter().fold(self.flags & !SRT_FIXED_MASK, |f, b| match b.data {
            SrtAttribute::Fixed(_) => f | b.target.fixed_flag(),
            SrtAttribute::Animated(_) => f,
        })
    }

    fn read(r: &mut Reader<'_>, region: &Region, tracks: &mut TrackTable) -> Result<Self> {
        let flags = r.read_u32()?;
        let mut matrix = Self { flags, targets: Vec::new() };
        let included: Vec<SrtTarget> = matrix.included_targets().collect();
        for target in included {
            let data = if flags & target.fixed_flag() != 0 {
                SrtAttribute::Fixed(r.read_f32()?)
            } else {
                let field = r.tell();
                let addr = region.resolve_from(field, r.read_i32()?)?;
                let track = r.at(addr, SrtTrack::read)?;
                SrtAttribute::Animated(tracks.intern(track))
            };
            matrix.targets.push(SrtBinding { target, data });
        }
        Ok(matrix)
    }

    fn write(&self, w: &mut Writer, track_addrs: &[u32]) -> Result<()> {
        let expected: Vec<SrtTarget> = self.included_targets().collect();
        if !expected.iter().copied().eq(self.targets.iter().map(|b| b.target)) {
            return Err(Error::WriteFailed(format!(
                "SRT matrix flags 0x{:X} do not match its bindings {:?}",
                self.flags,
                self.targets.iter().map(|b| b.target).collect::<Vec<_>>()
            )));
        }
        w.write_u32(self.encoded_flags())?;
        for b in &self.targets {
            match b.data {
                SrtAttribute::Fixed(v) => w.write_f32(v)?,
                SrtAttribute::Animated(i) => {
                    let addr = *track_addrs
                        .get(i)
                        .ok_or_else(|| Error::WriteFailed(format!("SRT binding references missing track {i}")))?;
                    let field = w.tell();
                    w.write_i32(rel(addr, field))?;
                }
            }
        }
        Ok(())
    }
}

/// Animated texture matrices of one material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SrtMaterial {
    pub name: String,
    pub texture_matrices: [Option<SrtMatrix>; MAX_TEXTURE_SRTS],
    pub indirect_matrices: [Option<SrtMatrix>; MAX_INDIRECT_SRTS],
}

fn enable_mask(slots: &[Option<SrtMatrix>]) -> u32 {
    slots
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_some())
        .fold(0, |mask, (i, _)| mask | (1 << i))
}

impl SrtMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn enabled_texsrts(&self) -> u32 {
        enable_mask(&self.texture_matrices)
    }

    pub fn enabled_indsrts(&self) -> u32 {
        enable_mask(&self.indirect_matrices)
    }

    /// Present matrices in on-disk order.
    pub fn matrices(&self) -> impl Iterator<Item = &SrtMatrix> {
        self.texture_matrices.iter().chain(self.indirect_matrices.iter()).flatten()
    }

    fn matrices_mut(&mut self) -> impl Iterator<Item = &mut SrtMatrix> {
        self.texture_matrices.iter_mut().chain(self.indirect_matrices.iter_mut()).flatten()
    }

    pub fn size(&self) -> u32 {
        self.matrices().fold(12, |acc, m| acc + 4 + m.size())
    }

    fn read(r: &mut Reader<'_>, region: &Region, tracks: &mut TrackTable, ctx: &mut IoContext<'_>) -> Result<Self> {
        let start = r.tell();
        let mut mat = Self::new(r.read_name(start)?);
        let mut tex_mask = r.read_u32()?;
        let ind_mask = r.read_u32()?;
        let tex_slots = mat.texture_matrices.len();
        if tex_mask >> tex_slots != 0 {
            ctx.warn(format!(
                "Material {} enables texture matrices past slot {}: 0x{tex_mask:X}. The extra bits were ignored.",
                mat.name,
                tex_slots - 1
            ));
            tex_mask &= (1 << tex_slots) - 1;
        }
        for (mask, slots) in [
            (tex_mask, &mut mat.texture_matrices[..]),
            (ind_mask, &mut mat.indirect_matrices[..]),
        ] {
            for (i, slot) in slots.iter_mut().enumerate() {
                if mask & (1 << i) == 0 {
                    continue;
                }
                let addr = region.resolve_from(start, r.read_i32()?)?;
                *slot = Some(r.at(addr, |r| SrtMatrix::read(r, region, tracks))?);
            }
        }
        Ok(mat)
    }

    fn write(&self, w: &mut Writer, names: &mut NameTable, track_addrs: &[u32]) -> Result<()> {
        let start = w.tell();
        names.write_ref(w, start, &self.name)?;
        w.write_u32(self.enabled_texsrts())?;
        w.write_u32(self.enabled_indsrts())?;
        let count = self.matrices().count() as u32;
        let mut accum = start + 12 + 4 * count;
        for m in self.matrices() {
            w.write_offset(accum, start)?;
            accum += m.size();
        }
        for m in self.matrices() {
            m.write(w, track_addrs)?;
        }
        Ok(())
    }
}

/// One `SRT0` sub-file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SrtAnimation {
    pub name: String,
    pub source_path: String,
    pub frame_duration: u16,
    pub transform_model: TransformModel,
    pub wrap_mode: AnimationWrapMode,
    pub materials: Vec<SrtMaterial>,
    pub tracks: Vec<SrtTrack>,
}

impl SrtAnimation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Append a track and return its index.
    pub fn add_track(&mut self, track: SrtTrack) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    /// Merge bit-identical tracks, keeping first occurrences in order and
    /// remapping every binding.
    pub fn dedup_tracks(&mut self) {
        let mut table = TrackTable::default();
        let remap: Vec<usize> = self.tracks.drain(..).map(|t| table.intern(t)).collect();
        self.tracks = table.tracks;
        for mat in &mut self.materials {
            for m in mat.matrices_mut() {
                for b in &mut m.targets {
                    if let SrtAttribute::Animated(i) = &mut b.data {
                        if let Some(&to) = remap.get(*i) {
                            *i = to;
                        }
                    }
                }
            }
        }
    }

    pub fn size(&self) -> u32 {
        SRT0_HEADER_SIZE
            + calc_dictionary_size(self.materials.len())
            + self.materials.iter().map(SrtMaterial::size).sum::<u32>()
            + self.tracks.iter().map(SrtTrack::size).sum::<u32>()
    }

    /// Decode a sub-file at the cursor. Tracks are shared by content.
    pub fn read(r: &mut Reader<'_>, ctx: &mut IoContext<'_>) -> Result<Self> {
        let region = r.section("SRT0", SRT0_MAGIC)?;
        let version = r.read_u32()?;
        if version != SRT0_VERSION {
            return Err(Error::UnsupportedVersion { section: "SRT0", version });
        }
        let _brres_ofs = r.read_i32()?;
        let dict_ofs = r.read_i32()?;
        let _user_data_ofs = r.read_i32()?;
        let name = r.read_name(region.start)?;
        let source_path = r.read_name(region.start)?;
        let frame_duration = r.read_u16()?;
        let material_count = r.read_u16()? as usize;
        let transform_model = read_enum32(r, "SRT0 transform model", TransformModel::from_u8)?;
        let wrap_mode = read_enum32(r, "SRT0 wrap mode", AnimationWrapMode::from_u8)?;

        r.seek_set(region.resolve(dict_ofs)?)?;
        let dict = Dictionary::read(r, &region, Some(material_count))?;
        let mut tracks = TrackTable::default();
        let mut materials = Vec::with_capacity(dict.len());
        for (dict_name, addr) in dict.entries() {
            let mat = r.at(addr, |r| SrtMaterial::read(r, &region, &mut tracks, ctx))?;
            if mat.name != dict_name {
                debug!(dict = dict_name, material = %mat.name, "SRT0 dictionary name differs");
            }
            materials.push(mat);
        }
        debug!(name = %name, materials = materials.len(), tracks = tracks.tracks.len(), "read SRT0");

        Ok(Self {
            name,
            source_path,
            frame_duration,
            transform_model,
            wrap_mode,
            materials,
            tracks: tracks.tracks,
        })
    }

    /// Encode at the cursor. Materials follow the dictionary, tracks follow
    /// all materials in index order.
    pub fn write(&self, w: &mut Writer, names: &mut NameTable, brres_start: u32) -> Result<()> {
        let material_count = u16::try_from(self.materials.len())
            .map_err(|_| Error::WriteFailed(format!("{} SRT0 materials", self.materials.len())))?;
        let mut s = w.section(SRT0_MAGIC)?;
        let start = s.start();
        s.write_u32(SRT0_VERSION)?;
        s.write_offset(brres_start, start)?;
        s.write_i32(SRT0_HEADER_SIZE as i32)?;
        s.write_i32(0)?;
        names.write_ref(&mut s, start, &self.name)?;
        names.write_ref(&mut s, start, &self.source_path)?;
        s.write_u16(self.frame_duration)?;
        s.write_u16(material_count)?;
        s.write_u32(self.transform_model.to_u8() as u32)?;
        s.write_u32(self.wrap_mode.to_u8() as u32)?;

        let mut accum = start + SRT0_HEADER_SIZE + calc_dictionary_size(self.materials.len());
        let mut entries = Vec::with_capacity(self.materials.len());
        for mat in &self.materials {
            entries.push((mat.name.as_str(), accum));
            accum += mat.size();
        }
        let track_addrs: Vec<u32> = self
            .tracks
            .iter()
            .map(|t| {
                let addr = accum;
                accum += t.size();
                addr
            })
            .collect();

        Dictionary::from_entries(entries)?.write(&mut s, names)?;
        for mat in &self.materials {
            mat.write(&mut s, names, &track_addrs)?;
        }
        for track in &self.tracks {
            track.write(&mut s)?;
        }
        if s.tell() != accum {
            return Err(Error::WriteFailed(format!(
                "SRT0 {} laid out to 0x{accum:X} but wrote to 0x{:X}",
                self.name,
                s.tell()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Transaction;

    fn ramp(to: f32) -> SrtTrack {
        SrtTrack {
            reserved: [0; 2],
            step: 1.0 / 30.0,
            keyframes: vec![
                Keyframe { frame: 0.0, value: 0.0, tangent: 0.0 },
                Keyframe { frame: 30.0, value: to, tangent: 0.0 },
            ],
        }
    }

    fn encode(anim: &SrtAnimation) -> Vec<u8> {
        let mut w = Writer::new();
        let mut names = NameTable::new();
        anim.write(&mut w, &mut names, 0).unwrap();
        names.flush(&mut w).unwrap();
        w.into_bytes()
    }

    fn decode(bytes: &[u8]) -> (Result<SrtAnimation>, Transaction) {
        let mut tx = Transaction::new();
        let anim = SrtAnimation::read(&mut Reader::new(bytes), &mut IoContext::new("SRT0", &mut tx));
        (anim, tx)
    }

    #[test]
    fn test_set_fills_implicit_attributes() {
        let mut m = SrtMatrix::new();
        m.set(SrtTarget::TransV, SrtAttribute::Animated(0));
        let kinds: Vec<_> = m.targets.iter().map(|b| b.target).collect();
        assert_eq!(kinds, vec![SrtTarget::TransU, SrtTarget::TransV]);
        assert_eq!(m.get(SrtTarget::TransU), SrtAttribute::Fixed(0.0));
        assert_ne!(m.flags & SRT_TRANS_U_FIXED, 0);
        assert_eq!(m.flags & SRT_TRANS_V_FIXED, 0);
        assert_eq!(m.size(), 12);
    }

    #[test]
    fn test_isotropic_scale_follows_u() {
        let mut m = SrtMatrix::new();
        m.set(SrtTarget::ScaleU, SrtAttribute::Fixed(2.0));
        assert_eq!(m.get(SrtTarget::ScaleV), SrtAttribute::Fixed(2.0));
        assert_eq!(m.value(SrtTarget::Rotate, 5.0, &[]), 0.0);
    }

    #[test]
    fn test_sample_hermite() {
        let t = ramp(10.0);
        assert_eq!(t.sample(-1.0), Some(0.0));
        assert_eq!(t.sample(40.0), Some(10.0));
        let mid = t.sample(15.0).unwrap();
        assert!((mid - 5.0).abs() < 1e-5);
        assert_eq!(SrtTrack::default().sample(0.0), None);
    }

    #[test]
    fn test_tracks_follow_materials() {
        let mut anim = SrtAnimation::new("scroll");
        let t = anim.add_track(ramp(1.0));
        let mut m = SrtMatrix::new();
        m.set(SrtTarget::TransU, SrtAttribute::Animated(t));
        let mut mat = SrtMaterial::new("water");
        mat.texture_matrices[1] = Some(m);
        anim.materials.push(mat);

        let bytes = encode(&anim);
        let size = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(size, anim.size());
        let (back, tx) = decode(&bytes);
        let back = back.unwrap();
        assert!(tx.is_clean(), "{:?}", tx.messages());
        assert_eq!(back, anim);
        assert_eq!(back.materials[0].enabled_texsrts(), 0b10);
    }

    #[test]
    fn test_stray_texture_mask_bits_ignored() {
        let mut anim = SrtAnimation::new("scroll");
        let t = anim.add_track(ramp(1.0));
        let mut m = SrtMatrix::new();
        m.set(SrtTarget::TransU, SrtAttribute::Animated(t));
        let mut mat = SrtMaterial::new("water");
        mat.texture_matrices[0] = Some(m);
        anim.materials.push(mat);

        let mut bytes = encode(&anim);
        // Texture mask of the only material, after the header and dictionary
        let at = (SRT0_HEADER_SIZE + calc_dictionary_size(1) + 4) as usize;
        assert_eq!(bytes[at..at + 4], 1u32.to_be_bytes());
        bytes[at..at + 4].copy_from_slice(&0x0000_0301u32.to_be_bytes());

        let (back, tx) = decode(&bytes);
        assert_eq!(back.unwrap(), anim);
        assert_eq!(tx.warnings().count(), 1);
        assert!(!tx.is_failure());
    }

    #[test]
    fn test_version_gate() {
        let mut bytes = encode(&SrtAnimation::new("a"));
        bytes[8..12].copy_from_slice(&4u32.to_be_bytes());
        let err = decode(&bytes).0.unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { section: "SRT0", version: 4 }));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_mismatched_bindings_rejected() {
        let mut anim = SrtAnimation::new("a");
        let mut mat = SrtMaterial::new("m");
        mat.texture_matrices[0] = Some(SrtMatrix {
            flags: SRT_ENABLED,
            targets: vec![SrtBinding { target: SrtTarget::Rotate, data: SrtAttribute::Fixed(1.0) }],
        });
        anim.materials.push(mat);
        let mut w = Writer::new();
        let mut names = NameTable::new();
        assert!(matches!(anim.write(&mut w, &mut names, 0), Err(Error::WriteFailed(_))));
    }

    #[test]
    fn test_dedup_remaps_bindings() {
        let mut anim = SrtAnimation::new("a");
        let a = anim.add_track(ramp(1.0));
        let b = anim.add_track(ramp(2.0));
        let c = anim.add_track(ramp(1.0));
        let mut m = SrtMatrix::new();
        m.set(SrtTarget::Rotate, SrtAttribute::Animated(c));
        m.set(SrtTarget::ScaleU, SrtAttribute::Animated(b));
        let mut mat = SrtMaterial::new("m");
        mat.indirect_matrices[31] = Some(m);
        anim.materials.push(mat);

        anim.dedup_tracks();
        assert_eq!(anim.tracks.len(), 2);
        let m = anim.materials[0].indirect_matrices[31].as_ref().unwrap();
        assert_eq!(m.get(SrtTarget::Rotate), SrtAttribute::Animated(a));
        assert_eq!(m.get(SrtTarget::ScaleU), SrtAttribute::Animated(1));
        assert_eq!(anim.materials[0].enabled_indsrts(), 1 << 31);
    }
}
