//! Operand shapes and their decoders.
//!
//! Every instruction is an opcode byte followed by an operand span of `skip` bytes. The span is
//! decoded according to the shape the instruction was registered with. Register indices are
//! clamped to the register file and immediates are sign-extended to 64 bits, except the lone
//! `ecalli` immediate which is a host call id and read unsigned. Offsets are
//! resolved into absolute branch targets relative to the instruction's own pc.
use crate::{error::DecodeError, state::vm_state::RegIndex, utils::VMUtils};
use jam_pvm_types::{common::RegValue, constants::REGISTERS_COUNT};

const MAX_IMM_SIZE: usize = 4;
const EXT_IMM_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneImmArgs {
    pub imm_x: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneRegExtImmArgs {
    pub r_a: RegIndex,
    pub imm_x: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TwoImmArgs {
    pub imm_x: RegValue,
    pub imm_y: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneOffsetArgs {
    pub target: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneRegOneImmArgs {
    pub r_a: RegIndex,
    pub imm_x: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneRegTwoImmArgs {
    pub r_a: RegIndex,
    pub imm_x: RegValue,
    pub imm_y: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneRegImmOffsetArgs {
    pub r_a: RegIndex,
    pub imm_x: RegValue,
    pub target: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TwoRegArgs {
    pub r_d: RegIndex,
    pub r_a: RegIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TwoRegOneImmArgs {
    pub r_a: RegIndex,
    pub r_b: RegIndex,
    pub imm_x: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TwoRegOneOffsetArgs {
    pub r_a: RegIndex,
    pub r_b: RegIndex,
    pub target: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TwoRegTwoImmArgs {
    pub r_a: RegIndex,
    pub r_b: RegIndex,
    pub imm_x: RegValue,
    pub imm_y: RegValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreeRegArgs {
    pub r_a: RegIndex,
    pub r_b: RegIndex,
    pub r_d: RegIndex,
}

/// Decoded operands of a single instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operands {
    NoArgs,
    OneImm(OneImmArgs),
    OneRegExtImm(OneRegExtImmArgs),
    TwoImm(TwoImmArgs),
    OneOffset(OneOffsetArgs),
    OneRegOneImm(OneRegOneImmArgs),
    OneRegTwoImm(OneRegTwoImmArgs),
    OneRegImmOffset(OneRegImmOffsetArgs),
    TwoReg(TwoRegArgs),
    TwoRegOneImm(TwoRegOneImmArgs),
    TwoRegOneOffset(TwoRegOneOffsetArgs),
    TwoRegTwoImm(TwoRegTwoImmArgs),
    ThreeReg(ThreeRegArgs),
}

/// The closed set of operand layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    NoArgs,
    OneImm,
    OneRegExtImm,
    TwoImm,
    OneOffset,
    OneRegOneImm,
    OneRegTwoImm,
    OneRegImmOffset,
    TwoReg,
    TwoRegOneImm,
    TwoRegOneOffset,
    TwoRegTwoImm,
    ThreeReg,
}

/// Cursor over the operand span of one instruction. Reads past the span yield zero.
struct OperandReader<'a> {
    name: &'static str,
    span: &'a [u8],
    pc: RegValue,
}

impl OperandReader<'_> {
    fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.span.len() < needed {
            return Err(DecodeError::InsufficientOperandBytes {
                name: self.name,
                needed,
                available: self.span.len(),
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn byte(&self, index: usize) -> u8 {
        self.span.get(index).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn skip(&self) -> usize {
        self.span.len()
    }

    #[inline(always)]
    fn reg(value: u8) -> RegIndex {
        (value as RegIndex).min(REGISTERS_COUNT - 1)
    }

    fn low_reg(&self, index: usize) -> RegIndex {
        Self::reg(self.byte(index) % 16)
    }

    fn high_reg(&self, index: usize) -> RegIndex {
        Self::reg(self.byte(index) / 16)
    }

    /// Little-endian unsigned value of `len` octets starting at `start`.
    fn raw(&self, start: usize, len: usize) -> u64 {
        (0..len).fold(0u64, |acc, i| {
            acc | (self.byte(start + i) as u64) << (8 * i)
        })
    }

    /// `X_len` of the octets at `start`.
    fn imm(&self, start: usize, len: usize) -> RegValue {
        VMUtils::sext(self.raw(start, len), len)
    }

    /// Absolute branch target `pc + Z_len(raw)`.
    fn target(&self, start: usize, len: usize) -> RegValue {
        let offset = VMUtils::unsigned_to_signed(self.raw(start, len), len).unwrap_or(0);
        self.pc.wrapping_add_signed(offset)
    }
}

impl OperandShape {
    /// Decodes the operand span following the opcode at `pc`.
    ///
    /// `span` must be exactly the `skip` octets after the opcode, clipped to the end of the code.
    pub fn decode(
        self,
        name: &'static str,
        span: &[u8],
        pc: RegValue,
    ) -> Result<Operands, DecodeError> {
        let r = OperandReader { name, span, pc };
        let l = r.skip();
        let operands = match self {
            Self::NoArgs => Operands::NoArgs,
            Self::OneImm => {
                let l_x = MAX_IMM_SIZE.min(l);
                Operands::OneImm(OneImmArgs {
                    imm_x: r.raw(0, l_x),
                })
            }
            Self::OneRegExtImm => {
                r.require(1 + EXT_IMM_SIZE)?;
                Operands::OneRegExtImm(OneRegExtImmArgs {
                    r_a: r.low_reg(0),
                    imm_x: r.raw(1, EXT_IMM_SIZE),
                })
            }
            Self::TwoImm => {
                r.require(1)?;
                let l_x = MAX_IMM_SIZE.min(r.byte(0) as usize % 8);
                let l_y = MAX_IMM_SIZE.min(l.saturating_sub(l_x + 1));
                Operands::TwoImm(TwoImmArgs {
                    imm_x: r.imm(1, l_x),
                    imm_y: r.imm(1 + l_x, l_y),
                })
            }
            Self::OneOffset => {
                let l_x = MAX_IMM_SIZE.min(l);
                Operands::OneOffset(OneOffsetArgs {
                    target: r.target(0, l_x),
                })
            }
            Self::OneRegOneImm => {
                r.require(1)?;
                let l_x = MAX_IMM_SIZE.min(l.saturating_sub(1));
                Operands::OneRegOneImm(OneRegOneImmArgs {
                    r_a: r.low_reg(0),
                    imm_x: r.imm(1, l_x),
                })
            }
            Self::OneRegTwoImm | Self::OneRegImmOffset => {
                r.require(1)?;
                let r_a = r.low_reg(0);
                let l_x = MAX_IMM_SIZE.min((r.byte(0) as usize / 16) % 8);
                let l_y = MAX_IMM_SIZE.min(l.saturating_sub(l_x + 1));
                let imm_x = r.imm(1, l_x);
                if self == Self::OneRegTwoImm {
                    Operands::OneRegTwoImm(OneRegTwoImmArgs {
                        r_a,
                        imm_x,
                        imm_y: r.imm(1 + l_x, l_y),
                    })
                } else {
                    Operands::OneRegImmOffset(OneRegImmOffsetArgs {
                        r_a,
                        imm_x,
                        target: r.target(1 + l_x, l_y),
                    })
                }
            }
            Self::TwoReg => {
                r.require(1)?;
                Operands::TwoReg(TwoRegArgs {
                    r_d: r.low_reg(0),
                    r_a: r.high_reg(0),
                })
            }
            Self::TwoRegOneImm => {
                r.require(1)?;
                let l_x = MAX_IMM_SIZE.min(l.saturating_sub(1));
                Operands::TwoRegOneImm(TwoRegOneImmArgs {
                    r_a: r.low_reg(0),
                    r_b: r.high_reg(0),
                    imm_x: r.imm(1, l_x),
                })
            }
            Self::TwoRegOneOffset => {
                r.require(1)?;
                let l_x = MAX_IMM_SIZE.min(l.saturating_sub(1));
                Operands::TwoRegOneOffset(TwoRegOneOffsetArgs {
                    r_a: r.low_reg(0),
                    r_b: r.high_reg(0),
                    target: r.target(1, l_x),
                })
            }
            Self::TwoRegTwoImm => {
                r.require(2)?;
                let l_x = MAX_IMM_SIZE.min(r.byte(1) as usize % 8);
                let l_y = MAX_IMM_SIZE.min(l.saturating_sub(l_x + 2));
                Operands::TwoRegTwoImm(TwoRegTwoImmArgs {
                    r_a: r.low_reg(0),
                    r_b: r.high_reg(0),
                    imm_x: r.imm(2, l_x),
                    imm_y: r.imm(2 + l_x, l_y),
                })
            }
            Self::ThreeReg => {
                r.require(2)?;
                Operands::ThreeReg(ThreeRegArgs {
                    r_a: r.low_reg(0),
                    r_b: r.high_reg(0),
                    r_d: OperandReader::reg(r.byte(1)),
                })
            }
        };
        Ok(operands)
    }
}
