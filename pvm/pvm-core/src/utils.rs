use jam_pvm_types::{
    common::{MemAddress, RegValue},
    constants::{INIT_ZONE_SIZE, PAGE_SIZE},
};

pub struct VMUtils;
impl VMUtils {
    //
    // Program initialization util functions
    //

    /// Represents `P` of the GP
    pub fn page_align(x: usize) -> usize {
        // P(x) = Z_P * ceil(x / Z_P)
        PAGE_SIZE * x.div_ceil(PAGE_SIZE)
    }

    /// Represents `Z` of the GP
    pub fn zone_align(x: usize) -> usize {
        // Z(x) = Z_Z * ceil(x / Z_Z)
        INIT_ZONE_SIZE * x.div_ceil(INIT_ZONE_SIZE)
    }

    /// Start address of the page containing `address`.
    #[inline(always)]
    pub fn page_start_address(address: MemAddress) -> MemAddress {
        address - address % PAGE_SIZE as MemAddress
    }

    //
    // Instruction arguments processing functions
    //

    /// Converts an unsigned integer to a signed integer of the same bit width.
    /// Represents `Z_n` of the GP
    ///
    /// # Arguments
    ///
    /// * `a`: The unsigned integer to convert. Bits above `8n` are ignored.
    /// * `n`: The number of octets in the integer.
    ///
    /// # Returns
    ///
    /// The signed equivalent of the input, or None if `n` is zero or greater than 8.
    pub fn unsigned_to_signed(a: u64, n: usize) -> Option<i64> {
        match n {
            1..=8 => {
                let shift = 64 - 8 * n as u32;
                Some(((a << shift) as i64) >> shift)
            }
            _ => None,
        }
    }

    /// Converts a signed integer to an unsigned integer of the same bit width.
    /// Represents `{Z_n}^-1` of the GP
    ///
    /// Returns None if `n` is zero or greater than 8.
    pub fn signed_to_unsigned(a: i64, n: usize) -> Option<u64> {
        match n {
            1..=7 => Some((a as u64) & ((1u64 << (8 * n)) - 1)),
            8 => Some(a as u64),
            _ => None,
        }
    }

    /// Performs signed extension on compactly encoded immediate argument octets, so that the
    /// argument can fit in the 64-bit register.
    /// Represents `X_n` of the GP.
    ///
    /// # Arguments
    ///
    /// * `compact_val`: The immediate value compactly encoded into an integer type.
    /// * `n`: The number of octets that the input integer `compact_val` represents.
    ///
    /// # Returns
    ///
    /// The sign-extended 64-bit unsigned integer. A zero-length input is always zero.
    pub fn sext(compact_val: u64, n: usize) -> RegValue {
        match Self::unsigned_to_signed(compact_val, n) {
            Some(signed) => signed as RegValue,
            None if n == 0 => 0,
            None => compact_val,
        }
    }

    /// `X_4` applied to the low 32 bits of a value; the common tail of 32-bit arithmetic.
    #[inline(always)]
    pub fn sext_32(val: u64) -> RegValue {
        val as u32 as i32 as i64 as RegValue
    }

    /// `Z_8` of a register value.
    #[inline(always)]
    pub fn u64_to_i64(val: RegValue) -> i64 {
        val as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_and_zone_align() {
        assert_eq!(VMUtils::page_align(0), 0);
        assert_eq!(VMUtils::page_align(1), PAGE_SIZE);
        assert_eq!(VMUtils::page_align(PAGE_SIZE), PAGE_SIZE);
        assert_eq!(VMUtils::zone_align(INIT_ZONE_SIZE + 1), 2 * INIT_ZONE_SIZE);
    }

    #[test]
    fn test_page_start_address() {
        assert_eq!(VMUtils::page_start_address(0x1_0fff), 0x1_0000);
        assert_eq!(VMUtils::page_start_address(0x1_1000), 0x1_1000);
    }

    #[test]
    fn test_unsigned_to_signed() {
        assert_eq!(VMUtils::unsigned_to_signed(0x7f, 1), Some(127));
        assert_eq!(VMUtils::unsigned_to_signed(0x80, 1), Some(-128));
        assert_eq!(VMUtils::unsigned_to_signed(0xffff, 2), Some(-1));
        assert_eq!(VMUtils::unsigned_to_signed(u64::MAX, 8), Some(-1));
        assert_eq!(VMUtils::unsigned_to_signed(1, 0), None);
        assert_eq!(VMUtils::unsigned_to_signed(1, 9), None);
    }

    #[test]
    fn test_signed_to_unsigned_inverts() {
        for n in 1..=8 {
            for a in [-1i64, 0, 1, -100, 100] {
                let u = VMUtils::signed_to_unsigned(a, n).unwrap();
                assert_eq!(VMUtils::unsigned_to_signed(u, n), Some(a));
            }
        }
    }

    #[test]
    fn test_sext() {
        assert_eq!(VMUtils::sext(0, 0), 0);
        assert_eq!(VMUtils::sext(0xff, 1), u64::MAX);
        assert_eq!(VMUtils::sext(0x7fff, 2), 0x7fff);
        assert_eq!(VMUtils::sext(0xdead_beef, 4), 0xffff_ffff_dead_beef);
        assert_eq!(VMUtils::sext(0x1234, 8), 0x1234);
        assert_eq!(VMUtils::sext_32(0x1_8000_0000), 0xffff_ffff_8000_0000);
    }
}
