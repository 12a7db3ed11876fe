use crate::word::{from_signed, mask_word, to_signed, WORD_BITS, WORD_MASK, WORD_SIGN_BIT};

/// Unsigned quotient; `None` for a zero divisor.
#[must_use]
pub const fn div(a: u32, b: u32) -> Option<u32> {
    a.checked_div(b)
}

/// Unsigned remainder; `None` for a zero divisor.
#[must_use]
pub const fn rem(a: u32, b: u32) -> Option<u32> {
    a.checked_rem(b)
}

/// Logical left shift; counts of 24 or more clear the word.
#[must_use]
pub const fn shift_left(a: u32, b: u32) -> u32 {
    if b >= WORD_BITS {
        0
    } else {
        mask_word(a << b)
    }
}

/// Logical right shift; counts of 24 or more clear the word.
#[must_use]
pub const fn shift_right(a: u32, b: u32) -> u32 {
    if b >= WORD_BITS {
        0
    } else {
        mask_word(a) >> b
    }
}

/// Right shift that fills from bit 23.
#[must_use]
pub const fn arithmetic_shift_right(a: u32, b: u32) -> u32 {
    if b >= WORD_BITS {
        if a & WORD_SIGN_BIT == 0 {
            0
        } else {
            WORD_MASK
        }
    } else {
        from_signed(to_signed(a) >> b)
    }
}

/// `1` when `a` is zero, else `0`.
#[must_use]
pub const fn logical_not(a: u32) -> u32 {
    (a == 0) as u32
}

/// Unsigned `a > b` as `1`/`0`.
#[must_use]
pub const fn greater(a: u32, b: u32) -> u32 {
    (a > b) as u32
}

/// Unsigned `a < b` as `1`/`0`.
#[must_use]
pub const fn less(a: u32, b: u32) -> u32 {
    (a < b) as u32
}

/// Signed 24-bit `a > b` as `1`/`0`.
#[must_use]
pub const fn signed_greater(a: u32, b: u32) -> u32 {
    (to_signed(a) > to_signed(b)) as u32
}

/// Signed 24-bit `a < b` as `1`/`0`.
#[must_use]
pub const fn signed_less(a: u32, b: u32) -> u32 {
    (to_signed(a) < to_signed(b)) as u32
}

/// `pc` moved by a signed 24-bit offset, wrapping in 24 bits.
#[must_use]
pub const fn relative_target(pc: u32, offset: u32) -> u32 {
    mask_word(pc.wrapping_add(offset))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        arithmetic_shift_right, div, greater, less, logical_not, relative_target, rem,
        shift_left, shift_right, signed_greater, signed_less,
    };
    use crate::word::from_signed;

    #[test]
    fn division_by_zero_is_reported() {
        assert_eq!(div(10, 0), None);
        assert_eq!(rem(10, 0), None);
        assert_eq!(div(10, 3), Some(3));
        assert_eq!(rem(10, 3), Some(1));
    }

    #[rstest]
    #[case(1, 4, 16)]
    #[case(0x80_0001, 1, 0x02)]
    #[case(1, 23, 0x80_0000)]
    #[case(1, 24, 0)]
    #[case(1, 0xFF_FFFF, 0)]
    fn left_shift_masks_and_saturates(#[case] a: u32, #[case] b: u32, #[case] expected: u32) {
        assert_eq!(shift_left(a, b), expected);
    }

    #[rstest]
    #[case(0x80_0000, 4, 0x08_0000)]
    #[case(0xFF_FFFF, 23, 1)]
    #[case(0xFF_FFFF, 24, 0)]
    fn logical_right_shift_fills_with_zero(#[case] a: u32, #[case] b: u32, #[case] expected: u32) {
        assert_eq!(shift_right(a, b), expected);
    }

    #[rstest]
    #[case(0x80_0000, 4, 0xF8_0000)]
    #[case(0x40_0000, 4, 0x04_0000)]
    #[case(0xFF_FFF0, 2, 0xFF_FFFC)]
    #[case(0x80_0000, 30, 0xFF_FFFF)]
    #[case(0x7F_FFFF, 30, 0)]
    fn arithmetic_right_shift_fills_from_bit_23(
        #[case] a: u32,
        #[case] b: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(arithmetic_shift_right(a, b), expected);
    }

    #[test]
    fn not_is_logical() {
        assert_eq!(logical_not(0), 1);
        assert_eq!(logical_not(1), 0);
        assert_eq!(logical_not(0xFF_FFFF), 0);
    }

    #[test]
    fn signed_and_unsigned_comparisons_disagree_on_negatives() {
        let minus_one = from_signed(-1);
        assert_eq!(greater(minus_one, 1), 1);
        assert_eq!(signed_greater(minus_one, 1), 0);
        assert_eq!(less(minus_one, 1), 0);
        assert_eq!(signed_less(minus_one, 1), 1);
    }

    #[test]
    fn relative_targets_wrap_in_24_bits() {
        assert_eq!(relative_target(0x400, 6), 0x406);
        assert_eq!(relative_target(0x400, from_signed(-4)), 0x3FC);
        assert_eq!(relative_target(2, from_signed(-4)), 0xFF_FFFE);
    }
}
