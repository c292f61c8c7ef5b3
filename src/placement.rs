//! Arrangement of modules in the symbol.
//!
//! The symbol is drawn straight into the caller's output buffer as a packed
//! bitmap: row-major, most significant bit first, one bit per module with
//! 1 = dark, rows padded to whole bytes. Function patterns go in first, the
//! interleaved codeword stream fills the rest in the standard zig-zag order,
//! and the checkerboard mask is applied last. Only mask pattern 0 is
//! supported; a fixed mask keeps the work bounded and the output
//! deterministic, which matters more here than module balance.

use crate::bch;
use crate::version::Version;

/// Format information word for low error correction with mask pattern 0.
const FORMAT_INFO: u16 = bch::format_info_word(0);

pub(crate) struct MatrixMap<'a> {
    bits: &'a mut [u8],
    width: usize,
    stride: usize,
    version: Version,
}

impl<'a> MatrixMap<'a> {
    /// Clears and wraps the image buffer, which must hold at least
    /// `width * ceil(width / 8)` bytes.
    pub(crate) fn new(version: Version, image: &'a mut [u8]) -> MatrixMap<'a> {
        let width = version.width();
        let stride = width.div_ceil(8);
        let bits = &mut image[..width * stride];
        bits.fill(0);
        MatrixMap {
            bits,
            width,
            stride,
            version,
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    fn set(&mut self, x: usize, y: usize) {
        self.bits[y * self.stride + x / 8] |= 0x80 >> (x % 8);
    }

    fn flip(&mut self, x: usize, y: usize) {
        self.bits[y * self.stride + x / 8] ^= 0x80 >> (x % 8);
    }

    /// Square outline of `size` modules on a side with its top left corner
    /// at (x, y).
    fn draw_ring(&mut self, x: usize, y: usize, size: usize) {
        for k in 0..size {
            self.set(x + k, y);
            self.set(x + k, y + size - 1);
            self.set(x, y + k);
            self.set(x + size - 1, y + k);
        }
    }

    fn draw_finders(&mut self) {
        let far = self.width - 7;
        for (fx, fy) in [(0, 0), (far, 0), (0, far)] {
            self.draw_ring(fx, fy, 7);
            for y in fy + 2..fy + 5 {
                for x in fx + 2..fx + 5 {
                    self.set(x, y);
                }
            }
        }
    }

    // finder patterns with their separators
    fn is_finder(&self, x: usize, y: usize) -> bool {
        let end = self.width - 8;
        (x < 8 && y < 8) || (x < 8 && y >= end) || (x >= end && y < 8)
    }

    fn draw_alignments(&mut self) {
        let positions = self.version.alignment_positions();
        for &cx in positions {
            for &cy in positions {
                let (cx, cy) = (cx as usize, cy as usize);
                if self.is_finder(cx, cy) {
                    continue;
                }
                self.draw_ring(cx - 2, cy - 2, 5);
                self.set(cx, cy);
            }
        }
    }

    fn is_alignment(&self, x: usize, y: usize) -> bool {
        let positions = self.version.alignment_positions();
        for &cx in positions {
            for &cy in positions {
                let (cx, cy) = (cx as usize, cy as usize);
                if self.is_finder(cx, cy) {
                    continue;
                }
                if x + 2 >= cx && x <= cx + 2 && y + 2 >= cy && y <= cy + 2 {
                    return true;
                }
            }
        }
        false
    }

    fn draw_timing_patterns(&mut self) {
        for k in (8..self.width - 8).step_by(2) {
            self.set(k, 6);
            self.set(6, k);
        }
    }

    fn is_timing(&self, x: usize, y: usize) -> bool {
        x == 6 || y == 6
    }

    /// Both copies of the 15 bit format word, and the always-dark module.
    fn draw_format_info(&mut self) {
        let info = FORMAT_INFO;
        let mut skip = 0;
        for k in 0..7 {
            if k == 6 {
                skip = 1; // the vertical timing line
            }
            if info & 1 << (14 - k) != 0 {
                self.set(k + skip, 8);
                self.set(8, self.width - 1 - k);
            }
        }
        skip = 0;
        for k in 0..8 {
            if k == 2 {
                skip = 1; // the horizontal timing line
            }
            if info & 1 << (7 - k) != 0 {
                self.set(8, 8 - skip - k);
                self.set(self.width - 8 + k, 8);
            }
        }
        self.set(8, self.width - 8);
    }

    // format areas around the finders, dark module included
    fn is_format_area(&self, x: usize, y: usize) -> bool {
        let end = self.width - 8;
        (x <= 8 && y == 8) || (y <= 8 && x == 8) || (x == 8 && y >= end) || (x >= end && y == 8)
    }

    /// Both copies of the 18 bit version word, for versions 7 and up.
    fn draw_version_info(&mut self) {
        let info = self.version.version_info();
        if info == 0 {
            return;
        }
        let pos = self.width - 11;
        for x in 0..3 {
            for y in 0..6 {
                if info & 1 << (x + y * 3) != 0 {
                    self.set(x + pos, y);
                    self.set(y, x + pos);
                }
            }
        }
    }

    fn is_version_area(&self, x: usize, y: usize) -> bool {
        if self.version.version_info() == 0 {
            return false;
        }
        let pos = self.width - 11;
        (x >= pos && x < pos + 3 && y < 6) || (y >= pos && y < pos + 3 && x < 6)
    }

    /// True for modules that cannot hold data or error correction bits.
    pub(crate) fn is_reserved(&self, x: usize, y: usize) -> bool {
        self.is_finder(x, y)
            || self.is_format_area(x, y)
            || self.is_timing(x, y)
            || self.is_alignment(x, y)
            || self.is_version_area(x, y)
    }

    pub(crate) fn draw_function_patterns(&mut self) {
        self.draw_finders();
        self.draw_alignments();
        self.draw_timing_patterns();
        self.draw_format_info();
        self.draw_version_info();
    }

    /// Place the codeword stream into the free modules.
    ///
    /// Column pairs are walked from the right edge to the left, scanned
    /// upwards and downwards alternately with the right module of a pair
    /// before the left one, skipping the vertical timing line and every
    /// reserved module. Bits go in most significant first; modules past the
    /// end of the stream are the remainder and stay light.
    pub(crate) fn place_codewords(&mut self, codewords: impl Iterator<Item = u8>) {
        let mut bits = codewords.flat_map(|byte| (0..8).rev().map(move |k| byte & 1 << k != 0));
        let width = self.width;
        let mut right = width - 1;
        let mut upward = true;
        loop {
            for step in 0..2 * width {
                let x = right - step % 2;
                let y = if upward {
                    width - 1 - step / 2
                } else {
                    step / 2
                };
                if !self.is_reserved(x, y) {
                    if bits.next() == Some(true) {
                        self.set(x, y);
                    }
                }
            }
            if right == 1 {
                break;
            }
            right -= 2;
            if right == 6 {
                right = 5;
            }
            upward = !upward;
        }
        debug_assert!(
            bits.next().is_none(),
            "codeword stream exceeds the symbol capacity"
        );
    }

    /// Mask pattern 0: invert every free module on an even checkerboard.
    pub(crate) fn apply_mask(&mut self) {
        for y in 0..self.width {
            for x in 0..self.width {
                if (x + y) % 2 == 0 && !self.is_reserved(x, y) {
                    self.flip(x, y);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map_for(version: usize, image: &mut Vec<u8>) -> MatrixMap<'_> {
        let version = Version::new(version).unwrap();
        image.resize(version.width() * version.width().div_ceil(8), 0);
        MatrixMap::new(version, image)
    }

    fn row<'a>(map: &'a MatrixMap<'_>, y: usize) -> &'a [u8] {
        &map.bits[y * map.stride..(y + 1) * map.stride]
    }

    #[test]
    fn version_1_finder_and_timing_rows() {
        let mut image = Vec::new();
        let mut map = map_for(1, &mut image);
        map.draw_function_patterns();
        // rows 0..=6 of the top left finder, with the top right one behind it
        assert_eq!(row(&map, 0), &[0xFE, 0x03, 0xF8]);
        assert_eq!(row(&map, 1), &[0x82, 0x02, 0x08]);
        assert_eq!(row(&map, 2), &[0xBA, 0x02, 0xE8]);
        assert_eq!(row(&map, 5), &[0x82, 0x02, 0x08]);
        // row 6 adds the horizontal timing dots at columns 8, 10 and 12
        assert_eq!(row(&map, 6), &[0xFE, 0xAB, 0xF8]);
        // row 7 is all separator except the dotless timing column
        assert_eq!(row(&map, 7), &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn version_1_format_row_carries_the_format_word() {
        let mut image = Vec::new();
        let mut map = map_for(1, &mut image);
        map.draw_function_patterns();
        // 0x77C4 spread over row 8, plus the timing module at column 6
        assert_eq!(row(&map, 8), &[0xEF, 0x86, 0x20]);
    }

    #[test]
    fn version_2_has_one_alignment_pattern() {
        let mut image = Vec::new();
        let map = map_for(2, &mut image);
        assert!(map.is_alignment(18, 18));
        assert!(map.is_alignment(16, 16));
        assert!(!map.is_alignment(6, 6));
        assert!(!map.is_alignment(18, 6));
        assert!(!map.is_alignment(13, 18));
    }

    #[test]
    fn free_modules_match_the_codeword_capacity() {
        // remainder bits per version, ISO/IEC 18004
        fn remainder_bits(version: usize) -> usize {
            match version {
                1 => 0,
                2..=6 => 7,
                7..=13 => 0,
                14..=20 => 3,
                21..=27 => 4,
                28..=34 => 3,
                _ => 0,
            }
        }
        let mut image = Vec::new();
        for v in 1..=40 {
            let map = map_for(v, &mut image);
            let free = (0..map.width)
                .flat_map(|y| (0..map.width).map(move |x| (x, y)))
                .filter(|&(x, y)| !map.is_reserved(x, y))
                .count();
            let version = Version::new(v).unwrap();
            assert_eq!(
                free,
                version.total_codewords() * 8 + remainder_bits(v),
                "version {v}"
            );
        }
    }

    #[test]
    fn placement_fills_exactly_the_free_modules() {
        let mut image = Vec::new();
        for v in [1, 7, 14, 40] {
            let version = Version::new(v).unwrap();
            let mut map = map_for(v, &mut image);
            map.draw_function_patterns();
            // all-ones codewords darken every free module except remainders
            map.place_codewords(core::iter::repeat(0xFF).take(version.total_codewords()));
            let free_dark = (0..map.width)
                .flat_map(|y| (0..map.width).map(move |x| (x, y)))
                .filter(|&(x, y)| !map.is_reserved(x, y))
                .filter(|&(x, y)| map.bits[y * map.stride + x / 8] & 0x80 >> (x % 8) != 0)
                .count();
            assert_eq!(free_dark, version.total_codewords() * 8, "version {v}");
        }
    }

    #[test]
    fn mask_flips_only_free_modules() {
        let mut image = Vec::new();
        let mut map = map_for(1, &mut image);
        map.draw_function_patterns();
        let before = map.bits.to_vec();
        map.apply_mask();
        map.apply_mask();
        assert_eq!(&map.bits[..], &before[..]);

        map.apply_mask();
        // (0, 0) is a finder module, (9, 9) a free even one
        assert_eq!(map.bits[0] & 0x80, before[0] & 0x80);
        assert_ne!(
            map.bits[9 * map.stride + 1] & 0x40,
            before[9 * map.stride + 1] & 0x40
        );
    }
}
