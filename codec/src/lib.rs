//! JAM integer codec used by PVM program blobs.
//!
//! Provides the compact variable-length encoding `E`, the fixed-width little-endian encoding
//! `E_l` and the LSB-first packing of bit sequences, as defined in the Graypaper appendix on
//! serialization.
use bitvec::prelude::*;
use std::any::type_name;
use thiserror::Error;

pub mod prelude {
    pub use crate::{
        JamCodecError, JamDecode, JamDecodeFixed, JamEncode, JamEncodeFixed, JamInput, JamOutput,
    };
}

/// Bit sequences are packed least-significant bit first.
pub type JamBitVec = BitVec<u8, Lsb0>;

/// Widest fixed-length integer encoding in octets.
const MAX_FIXED_WIDTH: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JamCodecError {
    #[error("Input too short: needed {needed} more bytes, {remaining} remaining")]
    InputTooShort { needed: usize, remaining: usize },
    #[error("Value {value} does not fit in {width} octets")]
    ValueOutOfRange { value: u64, width: usize },
    #[error("Decoded value {value} does not fit in {type_name}")]
    TypeOverflow {
        value: u64,
        type_name: &'static str,
    },
    #[error("Unsupported fixed width {width} for {type_name}")]
    UnsupportedWidth {
        width: usize,
        type_name: &'static str,
    },
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Non-canonical compact encoding of {value} in {len} octets")]
    NonCanonical { value: u64, len: usize },
}

/// Source of encoded octets.
pub trait JamInput {
    /// Fills `into` completely or fails without consuming anything.
    fn read(&mut self, into: &mut [u8]) -> Result<(), JamCodecError>;

    fn read_byte(&mut self) -> Result<u8, JamCodecError> {
        let mut byte = [0u8];
        self.read(&mut byte)?;
        Ok(byte[0])
    }

    fn remaining_len(&self) -> usize;
}

impl JamInput for &[u8] {
    fn read(&mut self, into: &mut [u8]) -> Result<(), JamCodecError> {
        let (head, tail) = self
            .split_at_checked(into.len())
            .ok_or(JamCodecError::InputTooShort {
                needed: into.len(),
                remaining: self.len(),
            })?;
        into.copy_from_slice(head);
        *self = tail;
        Ok(())
    }

    fn remaining_len(&self) -> usize {
        self.len()
    }
}

/// Sink for encoded octets.
pub trait JamOutput {
    fn write(&mut self, bytes: &[u8]);

    fn push_byte(&mut self, byte: u8) {
        self.write(&[byte]);
    }
}

impl JamOutput for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes)
    }
}

pub trait JamEncode {
    /// Exact length of the encoding in octets.
    fn size_hint(&self) -> usize;

    fn encode_to<T: JamOutput>(&self, dest: &mut T) -> Result<(), JamCodecError>;

    fn encode(&self) -> Result<Vec<u8>, JamCodecError> {
        let mut buf = Vec::with_capacity(self.size_hint());
        self.encode_to(&mut buf)?;
        Ok(buf)
    }
}

pub trait JamDecode {
    fn decode<I: JamInput>(input: &mut I) -> Result<Self, JamCodecError>
    where
        Self: Sized;
}

/// `l` of the compact encoding: the number of octets following the prefix byte.
/// Only meaningful for `0 < x < 2^56`.
#[inline]
fn compact_tail_len(x: u64) -> usize {
    (x.ilog2() / 7) as usize
}

fn compact_size_hint(x: u64) -> usize {
    match x {
        0 => 1,
        x if x < 1 << 56 => compact_tail_len(x) + 1,
        _ => 1 + MAX_FIXED_WIDTH,
    }
}

/// `E(x)`: the prefix byte carries `l` leading one bits followed by the high bits of `x`; the
/// `l` low-order octets follow in little-endian order.
fn compact_encode_to<T: JamOutput>(x: u64, dest: &mut T) {
    match x {
        0 => dest.push_byte(0),
        x if x < 1 << 56 => {
            let l = compact_tail_len(x);
            let prefix = !(0xFFu8 >> l);
            dest.push_byte(prefix | (x >> (8 * l)) as u8);
            dest.write(&x.to_le_bytes()[..l]);
        }
        x => {
            dest.push_byte(0xFF);
            dest.write(&x.to_le_bytes());
        }
    }
}

/// Inverse of `E`. Only the shortest encoding of a value is accepted.
fn compact_decode<I: JamInput>(input: &mut I) -> Result<u64, JamCodecError> {
    let prefix = input.read_byte()?;
    let l = prefix.leading_ones() as usize;
    let value = if l == MAX_FIXED_WIDTH {
        u64::decode_fixed(input, MAX_FIXED_WIDTH)?
    } else {
        let high = prefix as u64 & (0xFF >> (l + 1));
        let low = u64::decode_fixed(input, l)?;
        (high << (8 * l)) | low
    };
    if compact_size_hint(value) != l + 1 {
        return Err(JamCodecError::NonCanonical { value, len: l + 1 });
    }
    Ok(value)
}

macro_rules! impl_jam_codec_for_uint {
    ($($t:ty),*) => {
        $(
            impl JamEncode for $t {
                fn size_hint(&self) -> usize {
                    compact_size_hint(*self as u64)
                }

                fn encode_to<T: JamOutput>(&self, dest: &mut T) -> Result<(), JamCodecError> {
                    compact_encode_to(*self as u64, dest);
                    Ok(())
                }
            }

            impl JamDecode for $t {
                fn decode<I: JamInput>(input: &mut I) -> Result<Self, JamCodecError> {
                    let value = compact_decode(input)?;
                    Self::try_from(value).map_err(|_| JamCodecError::TypeOverflow {
                        value,
                        type_name: type_name::<Self>(),
                    })
                }
            }
        )*
    }
}
impl_jam_codec_for_uint!(u8, u16, u32, u64, usize);

/// `E_l`: encoding into a caller-chosen fixed size.
pub trait JamEncodeFixed {
    /// Number of octets produced for the given `size`. Integers and octet sequences measure
    /// `size` in octets, bit sequences in bits.
    fn fixed_len(size: usize) -> usize {
        size
    }

    fn encode_to_fixed<T: JamOutput>(&self, dest: &mut T, size: usize)
        -> Result<(), JamCodecError>;

    fn encode_fixed(&self, size: usize) -> Result<Vec<u8>, JamCodecError> {
        let mut buf = Vec::with_capacity(Self::fixed_len(size));
        self.encode_to_fixed(&mut buf, size)?;
        Ok(buf)
    }
}

pub trait JamDecodeFixed {
    fn decode_fixed<I: JamInput>(input: &mut I, size: usize) -> Result<Self, JamCodecError>
    where
        Self: Sized;
}

macro_rules! impl_jam_fixed_codec_for_uint {
    ($($t:ty),*) => {
        $(
            impl JamEncodeFixed for $t {
                fn encode_to_fixed<T: JamOutput>(&self, dest: &mut T, width: usize) -> Result<(), JamCodecError> {
                    if width > MAX_FIXED_WIDTH {
                        return Err(JamCodecError::UnsupportedWidth { width, type_name: type_name::<Self>() });
                    }
                    let value = *self as u64;
                    if width < MAX_FIXED_WIDTH && value >> (8 * width) != 0 {
                        return Err(JamCodecError::ValueOutOfRange { value, width });
                    }
                    dest.write(&value.to_le_bytes()[..width]);
                    Ok(())
                }
            }

            impl JamDecodeFixed for $t {
                fn decode_fixed<I: JamInput>(input: &mut I, width: usize) -> Result<Self, JamCodecError> {
                    if width > std::mem::size_of::<Self>() {
                        return Err(JamCodecError::UnsupportedWidth { width, type_name: type_name::<Self>() });
                    }
                    let mut le_bytes = [0u8; MAX_FIXED_WIDTH];
                    input.read(&mut le_bytes[..width])?;
                    let value = u64::from_le_bytes(le_bytes);
                    Self::try_from(value).map_err(|_| JamCodecError::TypeOverflow {
                        value,
                        type_name: type_name::<Self>(),
                    })
                }
            }
        )*
    }
}
impl_jam_fixed_codec_for_uint!(u8, u16, u32, u64, usize);

impl JamEncodeFixed for JamBitVec {
    fn fixed_len(bits: usize) -> usize {
        bits.div_ceil(8)
    }

    fn encode_to_fixed<T: JamOutput>(&self, dest: &mut T, bits: usize) -> Result<(), JamCodecError> {
        if self.len() != bits {
            return Err(JamCodecError::LengthMismatch {
                expected: bits,
                actual: self.len(),
            });
        }
        for chunk in self.chunks(8) {
            dest.push_byte(chunk.load_le::<u8>());
        }
        Ok(())
    }
}

impl JamDecodeFixed for JamBitVec {
    /// Decodes `ceil(bits / 8)` octets, dropping the padding bits of the last octet.
    fn decode_fixed<I: JamInput>(input: &mut I, bits: usize) -> Result<Self, JamCodecError> {
        let mut bv = Self::from_vec(Vec::<u8>::decode_fixed(input, bits.div_ceil(8))?);
        bv.truncate(bits);
        Ok(bv)
    }
}

impl JamEncodeFixed for [u8] {
    fn encode_to_fixed<T: JamOutput>(&self, dest: &mut T, len: usize) -> Result<(), JamCodecError> {
        if self.len() != len {
            return Err(JamCodecError::LengthMismatch {
                expected: len,
                actual: self.len(),
            });
        }
        dest.write(self);
        Ok(())
    }
}

impl JamDecodeFixed for Vec<u8> {
    fn decode_fixed<I: JamInput>(input: &mut I, len: usize) -> Result<Self, JamCodecError> {
        // Reject before allocating.
        if len > input.remaining_len() {
            return Err(JamCodecError::InputTooShort {
                needed: len,
                remaining: input.remaining_len(),
            });
        }
        let mut buf = vec![0u8; len];
        input.read(&mut buf)?;
        Ok(buf)
    }
}
