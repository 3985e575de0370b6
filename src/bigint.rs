//! 256-bit signed and unsigned integers used for coordinates, instants and
//! populations.
//!
//! The core treats these as opaque values (see the crate-level docs); this
//! module only supplies the handful of operations the rest of the crate
//! actually needs: the signed/unsigned coordinate translation and shifts
//! that saturate to zero instead of panicking at the 256-bit boundary.

pub use ethnum::{I256, U256};

/// An unsigned 256-bit integer: populations, instants, unsigned coordinates.
pub type UBig = U256;

/// A signed 256-bit integer: cell coordinates.
pub type IBig = I256;

/// Number of bits in [`UBig`] / [`IBig`].
pub const BITS: u32 = 256;

/// Translates a signed coordinate into the unsigned domain used internally
/// by the Explorer and containment checks, by adding
/// `UINTBIG_MAX - INTBIG_MAX` (i.e. flipping the sign bit). `IBig` and
/// `UBig` share the same two's-complement bit layout, so this is a single
/// XOR of the top bit.
pub fn signed_to_unsigned(v: IBig) -> UBig {
    let mut bytes = v.to_le_bytes();
    bytes[31] ^= 0x80;
    UBig::from_le_bytes(bytes)
}

/// Inverse of [`signed_to_unsigned`].
pub fn unsigned_to_signed(v: UBig) -> IBig {
    let mut bytes = v.to_le_bytes();
    bytes[31] ^= 0x80;
    IBig::from_le_bytes(bytes)
}

/// Left-shifts `v` by `shift` bits, yielding zero instead of panicking or
/// wrapping when `shift >= 256` (Open Question 2 resolved in favour of
/// saturating to zero; see `SPEC_FULL.md` §9).
pub fn shl(v: UBig, shift: u32) -> UBig {
    if shift >= BITS {
        UBig::ZERO
    } else {
        v << shift
    }
}

/// Right-shifts `v` by `shift` bits, yielding zero when `shift >= 256`.
pub fn shr(v: UBig, shift: u32) -> UBig {
    if shift >= BITS {
        UBig::ZERO
    } else {
        v >> shift
    }
}

/// `2^height` as a [`UBig`], i.e. the side length of a macrocell at that
/// height. Saturates to zero for `height >= 256`, matching [`shl`].
pub fn side_len(height: u16) -> UBig {
    shl(UBig::ONE, height as u32)
}
