//! The QR version catalog.
//!
//! A version is the size class of a symbol, 1 to 40. It fixes the module
//! width (4·version + 17), the split of the message into error correction
//! blocks, the alignment pattern grid and, for versions 7 and up, the
//! version information word. All parameters are the ones for the low error
//! correction level.

use crate::bch;
use crate::encodation::Segment;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// Block structure of one version: `group1_blocks` blocks of `group1_len`
/// data bytes, then `group2_blocks` blocks one byte longer, each protected
/// by `ecc_len` error correction bytes.
struct VersionParameter {
    ecc_len: u8,
    group1_blocks: u8,
    group2_blocks: u8,
    group1_len: u8,
}

const fn vp(ecc_len: u8, group1_blocks: u8, group2_blocks: u8, group1_len: u8) -> VersionParameter {
    VersionParameter {
        ecc_len,
        group1_blocks,
        group2_blocks,
        group1_len,
    }
}

#[rustfmt::skip]
const VPARAM: [VersionParameter; 40] = [
    vp(7, 1, 0, 19),    // V1
    vp(10, 1, 0, 34),   // V2
    vp(15, 1, 0, 55),   // V3
    vp(20, 1, 0, 80),   // V4
    vp(26, 1, 0, 108),  // V5
    vp(18, 2, 0, 68),   // V6
    vp(20, 2, 0, 78),   // V7
    vp(24, 2, 0, 97),   // V8
    vp(30, 2, 0, 116),  // V9
    vp(18, 2, 2, 68),   // V10
    vp(20, 4, 0, 81),   // V11
    vp(24, 2, 2, 92),   // V12
    vp(26, 4, 0, 107),  // V13
    vp(30, 3, 1, 115),  // V14
    vp(22, 5, 1, 87),   // V15
    vp(24, 5, 1, 98),   // V16
    vp(28, 1, 5, 107),  // V17
    vp(30, 5, 1, 120),  // V18
    vp(28, 3, 4, 113),  // V19
    vp(28, 3, 5, 107),  // V20
    vp(28, 4, 4, 116),  // V21
    vp(28, 2, 7, 111),  // V22
    vp(30, 4, 5, 121),  // V23
    vp(30, 6, 4, 117),  // V24
    vp(26, 8, 4, 106),  // V25
    vp(28, 10, 2, 114), // V26
    vp(30, 8, 4, 122),  // V27
    vp(30, 3, 10, 117), // V28
    vp(30, 7, 7, 116),  // V29
    vp(30, 5, 10, 115), // V30
    vp(30, 13, 3, 115), // V31
    vp(30, 17, 0, 115), // V32
    vp(30, 17, 1, 115), // V33
    vp(30, 13, 6, 115), // V34
    vp(30, 12, 7, 121), // V35
    vp(30, 6, 14, 121), // V36
    vp(30, 17, 4, 122), // V37
    vp(30, 4, 18, 122), // V38
    vp(30, 20, 4, 117), // V39
    vp(30, 19, 6, 118), // V40
];

/// Center coordinates of the alignment pattern grid, per version.
const ALIGNMENT_PATTERNS: [&[u8]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

/// Version information words for versions 7 to 40.
const VERSION_INFORMATION: [u32; 34] = {
    let mut words = [0u32; 34];
    let mut i = 0;
    while i < 34 {
        words[i] = bch::version_info_word(i as u32 + 7);
        i += 1;
    }
    words
};

/// A symbol size class, 1 to 40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(pub(crate) usize);

impl Version {
    /// Checked constructor, `None` outside 1..=40.
    pub fn new(version: usize) -> Option<Version> {
        (1..=40).contains(&version).then_some(Version(version))
    }

    /// The smallest version whose data capacity covers the segments, if any.
    ///
    /// The required bit count is recomputed per candidate because the length
    /// field widths change at the version thresholds.
    pub(crate) fn from_segments(segments: &[Segment<'_>]) -> Option<Version> {
        (1..=40).map(Version).find(|version| {
            let required: usize = segments.iter().map(|s| s.encoded_bits(*version)).sum();
            required <= version.data_capacity() * 8
        })
    }

    /// The version number, 1..=40.
    pub fn number(self) -> usize {
        self.0
    }

    /// Modules per side: 21 for version 1 up to 177 for version 40.
    pub fn width(self) -> usize {
        self.0 * 4 + 17
    }

    fn parameters(self) -> &'static VersionParameter {
        &VPARAM[self.0 - 1]
    }

    /// Data codewords (bytes) the symbol can carry.
    pub fn data_capacity(self) -> usize {
        let p = self.parameters();
        let group1_len = p.group1_len as usize;
        p.group1_blocks as usize * group1_len + p.group2_blocks as usize * (group1_len + 1)
    }

    /// Error correction codewords per block.
    pub(crate) fn ecc_len(self) -> usize {
        self.parameters().ecc_len as usize
    }

    pub(crate) fn group1_len(self) -> usize {
        self.parameters().group1_len as usize
    }

    pub(crate) fn block_count(self) -> usize {
        let p = self.parameters();
        (p.group1_blocks + p.group2_blocks) as usize
    }

    /// Data and error correction codewords together.
    pub(crate) fn total_codewords(self) -> usize {
        self.data_capacity() + self.block_count() * self.ecc_len()
    }

    /// Offset and length of every data block, group 1 first.
    pub(crate) fn blocks(self) -> impl Iterator<Item = (usize, usize)> {
        let group1_blocks = self.parameters().group1_blocks as usize;
        let group1_len = self.group1_len();
        (0..self.block_count()).map(move |block| {
            if block < group1_blocks {
                (block * group1_len, group1_len)
            } else {
                let offset = group1_blocks * group1_len + (block - group1_blocks) * (group1_len + 1);
                (offset, group1_len + 1)
            }
        })
    }

    pub(crate) fn alignment_positions(self) -> &'static [u8] {
        ALIGNMENT_PATTERNS[self.0 - 1]
    }

    /// The version information word, or 0 for versions without one.
    pub(crate) fn version_info(self) -> u32 {
        if self.0 >= 7 {
            VERSION_INFORMATION[self.0 - 7]
        } else {
            0
        }
    }
}

#[test]
fn data_capacities_match_the_published_table() {
    // data codewords per version for low error correction, ISO/IEC 18004
    let capacities: Vec<usize> = (1..=40)
        .map(|v| Version::new(v).unwrap().data_capacity())
        .collect();
    assert_eq!(
        capacities,
        vec![
            19, 34, 55, 80, 108, 136, 156, 194, 232, 274, 324, 370, 428, 461, 523, 589, 647,
            721, 795, 861, 932, 1006, 1094, 1174, 1276, 1370, 1468, 1531, 1631, 1735, 1843,
            1955, 2071, 2191, 2306, 2434, 2566, 2702, 2812, 2956
        ]
    );
}

#[test]
fn capacity_is_monotonic() {
    let mut last = 0;
    for v in 1..=40 {
        let capacity = Version::new(v).unwrap().data_capacity();
        assert!(capacity > last);
        last = capacity;
    }
}

#[test]
fn width_endpoints() {
    assert_eq!(Version::new(1).unwrap().width(), 21);
    assert_eq!(Version::new(40).unwrap().width(), 177);
    assert_eq!(Version::new(0), None);
    assert_eq!(Version::new(41), None);
}

#[test]
fn version_information_matches_the_published_table() {
    assert_eq!(
        VERSION_INFORMATION,
        [
            0x07C94, 0x085BC, 0x09A99, 0x0A4D3, 0x0BBF6, 0x0C762, 0x0D847, 0x0E60D, 0x0F928,
            0x10B78, 0x1145D, 0x12A17, 0x13532, 0x149A6, 0x15683, 0x168C9, 0x177EC, 0x18EC4,
            0x191E1, 0x1AFAB, 0x1B08E, 0x1CC1A, 0x1D33F, 0x1ED75, 0x1F250, 0x209D5, 0x216F0,
            0x2281A, 0x2373F, 0x24B0B, 0x254CE, 0x269C4, 0x276E1, 0x28C0B
        ]
    );
}

#[test]
fn alignment_grid_shape() {
    for v in 2..=40 {
        let version = Version::new(v).unwrap();
        let positions = version.alignment_positions();
        assert_eq!(positions.len(), v / 7 + 2, "version {v}");
        assert_eq!(positions[0], 6);
        assert_eq!(
            *positions.last().unwrap() as usize,
            version.width() - 7,
            "version {v}"
        );
    }
    assert!(Version::new(1).unwrap().alignment_positions().is_empty());
}

#[test]
fn blocks_cover_the_data_capacity() {
    for v in 1..=40 {
        let version = Version::new(v).unwrap();
        let mut expected_offset = 0;
        let mut total = 0;
        for (offset, len) in version.blocks() {
            assert_eq!(offset, expected_offset);
            assert!(len == version.group1_len() || len == version.group1_len() + 1);
            expected_offset += len;
            total += len;
        }
        assert_eq!(total, version.data_capacity());
        assert_eq!(version.blocks().count(), version.block_count());
    }
}

#[test]
fn smallest_version_for_binary_payloads() {
    // version 1 holds 19 bytes minus the 12 bit segment header
    let payload = [0u8; 80];
    assert_eq!(
        Version::from_segments(&[Segment::Binary(&payload[..17])]),
        Version::new(1)
    );
    assert_eq!(
        Version::from_segments(&[Segment::Binary(&payload[..18])]),
        Version::new(2)
    );
    assert_eq!(
        Version::from_segments(&[Segment::Binary(&[])]),
        Version::new(1)
    );
}

#[test]
fn payload_beyond_version_40_is_rejected() {
    let payload = vec![0u8; 2954];
    assert_eq!(Version::from_segments(&[Segment::Binary(&payload)]), None);
    assert_eq!(
        Version::from_segments(&[Segment::Binary(&payload[..2953])]),
        Version::new(40)
    );
}
