//! Floating-point element types and their poison patterns.
//!
//! Each supported width has one fixed signaling-NaN bit pattern. Any
//! arithmetic on an element still holding it either traps (when FP
//! exceptions are enabled) or yields a NaN that propagates into results.

/// Bit pattern written into 32-bit elements by the poison filler.
pub const SNAN_F32_BITS: u32 = 0x7fa0_0000;

/// Bit pattern written into 64-bit elements by the poison filler.
pub const SNAN_F64_BITS: u64 = 0x7ff0_0000_8000_0001;

/// Width of a floating-point element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementWidth {
    /// IEEE 754 binary32.
    F32,
    /// IEEE 754 binary64.
    F64,
}

impl ElementWidth {
    /// Size of one element in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// The poison pattern for this width, zero-extended to 64 bits.
    pub const fn snan_bits(self) -> u64 {
        match self {
            Self::F32 => SNAN_F32_BITS as u64,
            Self::F64 => SNAN_F64_BITS,
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A floating-point element type the pool can allocate and poison.
///
/// Sealed: implemented for `f32` and `f64` only.
pub trait Real: Copy + Default + PartialEq + Send + Sync + 'static + sealed::Sealed {
    /// Element width tag.
    const WIDTH: ElementWidth;

    /// The poison value for this type.
    fn snan() -> Self;

    /// Whether `self` carries exactly the poison bit pattern.
    fn is_poison(self) -> bool;
}

impl Real for f32 {
    const WIDTH: ElementWidth = ElementWidth::F32;

    fn snan() -> Self {
        f32::from_bits(SNAN_F32_BITS)
    }

    fn is_poison(self) -> bool {
        self.to_bits() == SNAN_F32_BITS
    }
}

impl Real for f64 {
    const WIDTH: ElementWidth = ElementWidth::F64;

    fn snan() -> Self {
        f64::from_bits(SNAN_F64_BITS)
    }

    fn is_poison(self) -> bool {
        self.to_bits() == SNAN_F64_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_are_signaling_nans() {
        // Exponent all ones, quiet bit clear, mantissa non-zero.
        assert_eq!(SNAN_F32_BITS & 0x7f80_0000, 0x7f80_0000);
        assert_eq!(SNAN_F32_BITS & 0x0040_0000, 0);
        assert_ne!(SNAN_F32_BITS & 0x007f_ffff, 0);

        assert_eq!(SNAN_F64_BITS & 0x7ff0_0000_0000_0000, 0x7ff0_0000_0000_0000);
        assert_eq!(SNAN_F64_BITS & 0x0008_0000_0000_0000, 0);
        assert_ne!(SNAN_F64_BITS & 0x000f_ffff_ffff_ffff, 0);
    }

    #[test]
    fn snan_values_are_nan() {
        assert!(f32::snan().is_nan());
        assert!(f64::snan().is_nan());
        assert!(f64::snan().is_poison());
        assert!(!f64::NAN.is_poison());
        assert!(!0.0f32.is_poison());
    }

    #[test]
    fn widths_match_types() {
        assert_eq!(<f32 as Real>::WIDTH.bytes(), std::mem::size_of::<f32>());
        assert_eq!(<f64 as Real>::WIDTH.bytes(), std::mem::size_of::<f64>());
        assert_eq!(ElementWidth::F32.snan_bits(), 0x7fa0_0000);
        assert_eq!(ElementWidth::F64.snan_bits(), SNAN_F64_BITS);
    }
}
