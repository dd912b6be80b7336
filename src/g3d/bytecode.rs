//! Draw-list bytecode.
//!
//! A model carries a few named methods, each a flat stream of commands that
//! the runtime executes to build its matrix palette and draw calls:
//!
//! | opcode | command         | payload                                   |
//! |--------|-----------------|-------------------------------------------|
//! | `0x00` | nop             |                                           |
//! | `0x01` | end             |                                           |
//! | `0x02` | NodeDescendence | u16 bone, u16 parent matrix               |
//! | `0x03` | NodeMix         | u16 matrix, u8 n, n x (u16 matrix, f32)   |
//! | `0x04` | Draw            | u16 material, u16 mesh, u16 bone, u8 prio |
//! | `0x05` | EnvelopeMatrix  | u16 matrix, u16 bone                      |
//! | `0x06` | MtxDup          | u16 dst, u16 src (skipped)                |

use smallvec::SmallVec;
use tracing::trace;

use crate::io::{Reader, Writer};
use crate::util::{Error, Result};

pub const OP_NOP: u8 = 0x00;
pub const OP_END: u8 = 0x01;
pub const OP_NODE_DESCENDENCE: u8 = 0x02;
pub const OP_NODE_MIX: u8 = 0x03;
pub const OP_DRAW: u8 = 0x04;
pub const OP_ENVELOPE_MATRIX: u8 = 0x05;
pub const OP_MTX_DUP: u8 = 0x06;

/// Conventional method names.
pub const METHOD_NODE_TREE: &str = "NodeTree";
pub const METHOD_NODE_MIX: &str = "NodeMix";
pub const METHOD_DRAW_OPA: &str = "DrawOpa";
pub const METHOD_DRAW_XLU: &str = "DrawXlu";

/// One input of a NodeMix blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendMatrix {
    pub matrix: u16,
    pub ratio: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Draw `mesh` with `material` using the matrix of `bone`.
    Draw {
        material: u16,
        mesh: u16,
        bone: u16,
        priority: u8,
    },
    /// `bone` hangs below whichever bone owns `parent_matrix`.
    NodeDescendence { bone: u16, parent_matrix: u16 },
    /// `matrix` is the rigid matrix of `bone`.
    EnvelopeMatrix { matrix: u16, bone: u16 },
    /// `matrix` blends other matrices.
    NodeMix {
        matrix: u16,
        blend: SmallVec<[BlendMatrix; 4]>,
    },
}

impl Command {
    /// Encoded size including the opcode.
    pub fn size(&self) -> u32 {
        match self {
            Self::Draw { .. } => 8,
            Self::NodeDescendence { .. } | Self::EnvelopeMatrix { .. } => 5,
            Self::NodeMix { blend, .. } => 4 + 6 * blend.len() as u32,
        }
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Draw { material, mesh, bone, priority } => {
                w.write_u8(OP_DRAW)?;
                w.write_u16(*material)?;
                w.write_u16(*mesh)?;
                w.write_u16(*bone)?;
                w.write_u8(*priority)
            }
            Self::NodeDescendence { bone, parent_matrix } => {
                w.write_u8(OP_NODE_DESCENDENCE)?;
                w.write_u16(*bone)?;
                w.write_u16(*parent_matrix)
            }
            Self::EnvelopeMatrix { matrix, bone } => {
                w.write_u8(OP_ENVELOPE_MATRIX)?;
                w.write_u16(*matrix)?;
                w.write_u16(*bone)
            }
            Self::NodeMix { matrix, blend } => {
                let n = u8::try_from(blend.len())
                    .map_err(|_| Error::WriteFailed(format!("NodeMix {matrix} blends {} matrices", blend.len())))?;
                w.write_u8(OP_NODE_MIX)?;
                w.write_u16(*matrix)?;
                w.write_u8(n)?;
                for b in blend {
                    w.write_u16(b.matrix)?;
                    w.write_f32(b.ratio)?;
                }
                Ok(())
            }
        }
    }
}

/// A named command stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ByteCodeMethod {
    pub name: String,
    pub commands: Vec<Command>,
}

impl ByteCodeMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), commands: Vec::new() }
    }

    /// Encoded size including the terminating `end`.
    pub fn size(&self) -> u32 {
        1 + self.commands.iter().map(Command::size).sum::<u32>()
    }

    /// Decode commands at the cursor up to and including `end`.
    pub fn read(r: &mut Reader<'_>, name: impl Into<String>) -> Result<Self> {
        let mut method = Self::new(name);
        loop {
            let at = r.tell();
            let cmd = match r.read_u8()? {
                OP_NOP => continue,
                OP_END => break,
                OP_DRAW => Command::Draw {
                    material: r.read_u16()?,
                    mesh: r.read_u16()?,
                    bone: r.read_u16()?,
                    priority: r.read_u8()?,
                },
                OP_NODE_DESCENDENCE => Command::NodeDescendence {
                    bone: r.read_u16()?,
                    parent_matrix: r.read_u16()?,
                },
                OP_ENVELOPE_MATRIX => Command::EnvelopeMatrix {
                    matrix: r.read_u16()?,
                    bone: r.read_u16()?,
                },
                OP_NODE_MIX => {
                    let matrix = r.read_u16()?;
                    let n = r.read_u8()?;
                    let mut blend = SmallVec::with_capacity(n as usize);
                    for _ in 0..n {
                        blend.push(BlendMatrix { matrix: r.read_u16()?, ratio: r.read_f32()? });
                    }
                    Command::NodeMix { matrix, blend }
                }
                OP_MTX_DUP => {
                    r.skip(4)?;
                    continue;
                }
                op => {
                    return Err(Error::invalid(format!(
                        "unknown opcode 0x{op:02X} at 0x{at:X} in method {}",
                        method.name
                    )))
                }
            };
            trace!(method = %method.name, ?cmd, "bytecode");
            method.commands.push(cmd);
        }
        Ok(method)
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        for cmd in &self.commands {
            cmd.write(w)?;
        }
        w.write_u8(OP_END)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_decode_mixed_stream() {
        let bytes = [
            OP_NODE_DESCENDENCE, 0, 1, 0, 0, //
            OP_NOP, //
            OP_MTX_DUP, 0, 3, 0, 2, //
            OP_DRAW, 0, 2, 0, 5, 0, 1, 9, //
            OP_END, 0xAA,
        ];
        let mut r = Reader::new(&bytes);
        let m = ByteCodeMethod::read(&mut r, METHOD_DRAW_OPA).unwrap();
        assert_eq!(
            m.commands,
            vec![
                Command::NodeDescendence { bone: 1, parent_matrix: 0 },
                Command::Draw { material: 2, mesh: 5, bone: 1, priority: 9 },
            ]
        );
        assert_eq!(r.tell(), bytes.len() as u32 - 1);
    }

    #[test]
    fn test_unknown_opcode_is_malformed() {
        let mut r = Reader::new(&[0x07, 0x01]);
        let err = ByteCodeMethod::read(&mut r, METHOD_NODE_TREE).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_missing_end_is_eof() {
        let mut r = Reader::new(&[OP_ENVELOPE_MATRIX, 0, 1]);
        assert!(matches!(ByteCodeMethod::read(&mut r, "x"), Err(Error::UnexpectedEof(_))));
    }

    #[test]
    fn test_sizes_match_encoding() {
        let mut m = ByteCodeMethod::new(METHOD_NODE_MIX);
        m.commands.push(Command::EnvelopeMatrix { matrix: 0, bone: 0 });
        m.commands.push(Command::NodeMix {
            matrix: 4,
            blend: smallvec![
                BlendMatrix { matrix: 2, ratio: 0.25 },
                BlendMatrix { matrix: 3, ratio: 0.75 },
            ],
        });
        let mut w = Writer::new();
        m.write(&mut w).unwrap();
        assert_eq!(w.tell(), m.size());
        assert_eq!(m.size(), 1 + 5 + 16);

        let bytes = w.into_bytes();
        let back = ByteCodeMethod::read(&mut Reader::new(&bytes), METHOD_NODE_MIX).unwrap();
        assert_eq!(back, m);
    }
}
