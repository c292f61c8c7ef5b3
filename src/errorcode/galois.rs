//! GF(256) arithmetic for the Reed-Solomon code.
//!
//! An element of GF(256) is stored as a `u8` whose bits are the coefficients
//! of a polynomial of degree at most 7, the least significant bit being the
//! coefficient of 1. Addition works coefficient by coefficient, which on this
//! representation is XOR.
//!
//! Multiplication is defined modulo a fixed irreducible polynomial; QR codes
//! use 285 (0b1_0001_1101). With this choice x is a generator: the powers
//! x^0, x^1, ..., x^254 enumerate every non-zero element, and x^255 = 1. Any
//! non-zero element can therefore be identified with a power i of x, and a
//! product a·b becomes x^(i + j mod 255) for the powers i and j of a and b.
//! The two lookup tables below, `EXP_TABLE` and `LOG_TABLE`, translate
//! between the representations in both directions.

/// Compute the two lookup tables for GF(256).
const fn compute_exp_log() -> ([u8; 255], [u8; 256]) {
    let mut exp = [0u8; 255];
    let mut log = [0u8; 256];
    let mut p: u16 = 1; // polynomial representation of x^i
    let mut i: usize = 0;
    while i < 255 {
        exp[i] = p as u8;
        log[p as usize] = i as u8;
        p <<= 1;
        if p >= 256 {
            p ^= 0x11D;
        }
        i += 1;
    }
    (exp, log)
}

/// Powers of the generator: `EXP_TABLE[i]` is x^i as a polynomial.
pub(crate) const EXP_TABLE: [u8; 255] = compute_exp_log().0;

/// Inverse of `EXP_TABLE` for non-zero elements. `LOG_TABLE[0]` is unused.
pub(crate) const LOG_TABLE: [u8; 256] = compute_exp_log().1;

/// Multiplication usable in constant context, for deriving the generator
/// polynomials at compile time.
pub(crate) const fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let i = LOG_TABLE[a as usize] as usize + LOG_TABLE[b as usize] as usize;
    EXP_TABLE[i % 255]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GF(pub u8);

impl core::ops::Add<GF> for GF {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        GF(self.0 ^ rhs.0)
    }
}

impl core::ops::Mul<GF> for GF {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        GF(gf_mul(self.0, rhs.0))
    }
}

impl From<u8> for GF {
    fn from(value: u8) -> Self {
        GF(value)
    }
}

impl From<GF> for u8 {
    fn from(value: GF) -> u8 {
        value.0
    }
}

#[test]
fn sanity_check_tables() {
    use std::collections::HashSet;

    let exp: HashSet<u8> = EXP_TABLE.iter().cloned().collect();
    assert_eq!(exp.len(), EXP_TABLE.len());

    let log: HashSet<u8> = LOG_TABLE[1..].iter().cloned().collect();
    assert_eq!(log.len(), LOG_TABLE.len() - 1);

    for i in 0..255 {
        assert_eq!(i, LOG_TABLE[EXP_TABLE[i] as usize] as usize);
        assert_eq!(i + 1, EXP_TABLE[LOG_TABLE[i + 1] as usize] as usize);
    }
}

#[test]
fn first_powers_of_the_generator() {
    assert_eq!(&EXP_TABLE[..9], &[1, 2, 4, 8, 16, 32, 64, 128, 29]);
}

#[test]
fn gf256_mul() {
    assert_eq!(GF(123) * GF(1), GF(123));
    assert_eq!(GF(234) * GF(0), GF(0));
    assert_eq!(GF(0) * GF(23), GF(0));
    for a in 0..=255u8 {
        for b in 0..=255u8 {
            assert_eq!(GF(a) * GF(b), GF(b) * GF(a));
        }
    }
    // the multiplicative group has order 255
    let unit = (0..255).fold(GF(1), |acc, _| acc * GF(2));
    assert_eq!(unit, GF(1));
}

#[test]
fn gf256_add_is_self_inverse() {
    for a in 0..=255u8 {
        assert_eq!(GF(a) + GF(a), GF(0));
    }
}
