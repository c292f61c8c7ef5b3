//! Reed-Solomon error correction codewords.
//!
//! QR codes protect their payload with a Reed-Solomon code over GF(256).
//! Only the generator polynomials needed for the low error correction level
//! are carried here. Encoding is _systematic_: the data codewords are kept
//! as-is and the error codewords are the remainder of a polynomial division,
//! so the concatenation of both is divisible by the generator polynomial.
//!
//! Larger symbol versions split their payload into up to 25 blocks which are
//! each encoded independently with the same generator. The error codewords
//! of all blocks are stored after the data part of the message buffer;
//! interleaving for transmission happens later, when the symbol is drawn.

mod galois;

use galois::{gf_mul, EXP_TABLE, GF};

use crate::version::Version;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// Largest generator degree used by any version at low error correction.
pub(crate) const MAX_ECC_LEN: usize = 30;

/// Coefficients of the degree `DEG` generator polynomial, the product of
/// (x - x^i) for i = 0..DEG. The leading coefficient is always one and is
/// dropped from the returned array; the rest is ordered highest power first.
const fn generator_polynomial<const DEG: usize>() -> [u8; DEG] {
    let mut poly = [0u8; MAX_ECC_LEN + 1];
    poly[0] = 1;
    let mut degree = 0;
    while degree < DEG {
        // multiply by (x - x^degree), working on the trailing coefficients
        // from the back so that every step still sees the previous ones
        let root = EXP_TABLE[degree];
        let mut j = degree + 1;
        while j > 0 {
            poly[j] ^= gf_mul(root, poly[j - 1]);
            j -= 1;
        }
        degree += 1;
    }
    let mut out = [0u8; DEG];
    let mut j = 0;
    while j < DEG {
        out[j] = poly[j + 1];
        j += 1;
    }
    out
}

const P7: [u8; 7] = generator_polynomial();
const P10: [u8; 10] = generator_polynomial();
const P15: [u8; 15] = generator_polynomial();
const P18: [u8; 18] = generator_polynomial();
const P20: [u8; 20] = generator_polynomial();
const P22: [u8; 22] = generator_polynomial();
const P24: [u8; 24] = generator_polynomial();
const P26: [u8; 26] = generator_polynomial();
const P28: [u8; 28] = generator_polynomial();
const P30: [u8; 30] = generator_polynomial();

const GENERATOR_POLYNOMIALS: [&[u8]; 10] = [
    &P7, &P10, &P15, &P18, &P20, &P22, &P24, &P26, &P28, &P30,
];

fn generator(degree: usize) -> &'static [u8] {
    GENERATOR_POLYNOMIALS
        .iter()
        .find(|p| p.len() == degree)
        .expect("no generator polynomial of this degree, this is a bug")
}

/// Compute the error codewords for every block of the message.
///
/// `msg` holds the data codewords in front and room for the error codewords
/// of all blocks behind them, the layout produced by the codeword buffer.
pub(crate) fn add_error_correction(version: Version, msg: &mut [u8]) {
    let ecc_len = version.ecc_len();
    let gen = generator(ecc_len);
    let mut register = [0u8; MAX_ECC_LEN + 1];
    let mut ecc_start = version.data_capacity();
    for (offset, len) in version.blocks() {
        register.fill(0);
        ecc_block(
            msg[offset..offset + len].iter().copied(),
            gen,
            &mut register[..ecc_len + 1],
        );
        msg[ecc_start..ecc_start + ecc_len].copy_from_slice(&register[..ecc_len]);
        ecc_start += ecc_len;
    }
}

/// Polynomial division of one data block, leaving the remainder in
/// `register`.
///
/// `register` holds one byte more than the generator degree; the trailing
/// byte stays zero and keeps the shift in the inner loop uniform.
fn ecc_block(data: impl Iterator<Item = u8>, gen: &[u8], register: &mut [u8]) {
    let ecc_len = gen.len();
    for byte in data {
        let feedback = GF(register[0]) + GF(byte);
        for j in 0..ecc_len {
            register[j] = (GF(register[j + 1]) + feedback * GF(gen[j])).into();
        }
    }
}

#[test]
fn generator_polynomials_match_the_published_tables() {
    // ISO/IEC 18004 lists the generator coefficients as powers of x.
    fn from_exponents<const N: usize>(exponents: [u8; N]) -> [u8; N] {
        exponents.map(|e| EXP_TABLE[e as usize])
    }
    assert_eq!(P7, from_exponents([87, 229, 146, 149, 238, 102, 21]));
    assert_eq!(
        P10,
        from_exponents([251, 67, 46, 61, 118, 70, 64, 94, 32, 45])
    );
    assert_eq!(
        P15,
        from_exponents([8, 183, 61, 91, 202, 37, 51, 58, 58, 237, 140, 124, 5, 99, 105])
    );
    assert_eq!(
        P18,
        from_exponents([
            215, 234, 158, 94, 184, 97, 118, 170, 79, 187, 152, 148, 252, 179, 5, 98, 96, 153
        ])
    );
    assert_eq!(
        P20,
        from_exponents([
            17, 60, 79, 50, 61, 163, 26, 187, 202, 180, 221, 225, 83, 239, 156, 164, 212, 212,
            188, 190
        ])
    );
    assert_eq!(
        P22,
        from_exponents([
            210, 171, 247, 242, 93, 230, 14, 109, 221, 53, 200, 74, 8, 172, 98, 80, 219, 134,
            160, 105, 165, 231
        ])
    );
    assert_eq!(
        P24,
        from_exponents([
            229, 121, 135, 48, 211, 117, 251, 126, 159, 180, 169, 152, 192, 226, 228, 218, 111,
            0, 117, 232, 87, 96, 227, 21
        ])
    );
    assert_eq!(
        P26,
        from_exponents([
            173, 125, 158, 2, 103, 182, 118, 17, 145, 201, 111, 28, 165, 53, 161, 21, 245, 142,
            13, 102, 48, 227, 153, 145, 218, 70
        ])
    );
    assert_eq!(
        P28,
        from_exponents([
            168, 223, 200, 104, 224, 234, 108, 180, 110, 190, 195, 147, 205, 27, 232, 201, 21,
            43, 245, 87, 42, 195, 212, 119, 242, 37, 9, 123
        ])
    );
    assert_eq!(
        P30,
        from_exponents([
            41, 173, 145, 152, 216, 31, 179, 182, 50, 48, 110, 86, 239, 96, 222, 125, 42, 173,
            226, 193, 224, 130, 156, 37, 251, 216, 238, 40, 192, 180
        ])
    );
}

#[test]
fn remainder_of_a_single_one_is_the_generator() {
    // x^7 mod g(x) = x^7 - g(x), i.e. the non-leading coefficients of g
    let mut register = [0u8; 8];
    ecc_block([1u8].into_iter(), &P7, &mut register);
    assert_eq!(register[..7], P7);

    let mut register = [0u8; 8];
    ecc_block([0u8].into_iter(), &P7, &mut register);
    assert_eq!(register, [0u8; 8]);
}

#[test]
fn codewords_divide_evenly_by_the_generator() {
    for v in [1, 2, 5, 10, 17, 25, 40] {
        let version = Version::new(v).unwrap();
        let ecc_len = version.ecc_len();
        let mut msg = vec![0u8; version.total_codewords()];
        for (i, byte) in msg.iter_mut().take(version.data_capacity()).enumerate() {
            *byte = (i * 7 + 3) as u8;
        }
        add_error_correction(version, &mut msg);

        let gen = generator(ecc_len);
        let mut ecc_start = version.data_capacity();
        for (offset, len) in version.blocks() {
            let codeword = msg[offset..offset + len]
                .iter()
                .chain(&msg[ecc_start..ecc_start + ecc_len])
                .copied();
            let mut register = vec![0u8; ecc_len + 1];
            ecc_block(codeword, gen, &mut register);
            assert_eq!(register, vec![0u8; ecc_len + 1], "version {v}");
            ecc_start += ecc_len;
        }
    }
}
