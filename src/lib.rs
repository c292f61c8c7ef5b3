//! QR code generation for panic and diagnostic screens.
//!
//! When the rest of the system is going down, a QR code on the screen is
//! often the only channel left with enough bandwidth for a useful crash
//! report. This crate encodes such a report into a scannable symbol under
//! the constraints of that moment. It never allocates and never blocks:
//! all work happens in two caller-supplied buffers and a few bytes of
//! stack, in a statically bounded number of steps.
//!
//! Two call forms are supported. Without a URL the payload is stored as a
//! single binary segment. With a URL the symbol starts with the URL as a
//! binary segment and appends the payload as a numeric segment, packing
//! every 13 payload bits into four decimal digits; digits are valid in a
//! URL query string and numeric mode stores them densely, so a web page
//! can recover the raw bytes with almost no space lost to escaping.
//!
//! The encoder always uses the low error correction level and mask
//! pattern 0, and picks the smallest of the 40 symbol versions that fits.
//! The output is a packed row-major bitmap, one bit per module, most
//! significant bit first, 1 meaning dark.
//!
//! ```
//! use panicqr::{generate, IMAGE_BUFFER_MIN, SCRATCH_BUFFER_MIN};
//!
//! let mut image = [0u8; IMAGE_BUFFER_MIN];
//! let mut scratch = [0u8; SCRATCH_BUFFER_MIN];
//! let report = b"kernel panic - not syncing";
//! image[..report.len()].copy_from_slice(report);
//! let width = generate(None, &mut image, report.len(), &mut scratch);
//! assert_eq!(width, 25); // a version 2 symbol
//! ```

#![cfg_attr(not(test), no_std)]

mod bch;
mod encodation;
mod errorcode;
mod placement;
mod version;

#[cfg(test)]
mod tests;

pub use version::Version;

use arrayvec::ArrayVec;

use encodation::{CodewordBuffer, Segment};
use placement::MatrixMap;

/// Smallest permitted image buffer: the packed bitmap of a version 40
/// symbol, 177 rows of 23 bytes.
pub const IMAGE_BUFFER_MIN: usize = 4071;

/// Smallest permitted scratch buffer: the data and error correction
/// codewords of a version 40 symbol.
pub const SCRATCH_BUFFER_MIN: usize = 3706;

/// Why a symbol could not be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    /// A supplied buffer is below its documented minimum, or `data_len`
    /// exceeds the image buffer.
    BufferTooSmall,
    /// The encoded segments do not fit into a version 40 symbol.
    DataTooLong,
}

impl core::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GenerateError::BufferTooSmall => {
                f.write_str("a supplied buffer is below its documented minimum")
            }
            GenerateError::DataTooLong => {
                f.write_str("the encoded input does not fit into a version 40 symbol")
            }
        }
    }
}

/// Draw a QR code for the given payload, and the URL if one is present.
///
/// The first `data_len` bytes of `image` are the payload; the whole buffer
/// is then overwritten with the packed output bitmap. `scratch` is working
/// memory with undefined contents afterwards. `image` must hold at least
/// [`IMAGE_BUFFER_MIN`] bytes and `scratch` at least [`SCRATCH_BUFFER_MIN`],
/// independent of the payload size.
///
/// Returns the module width of the symbol, 21 to 177, or 0 when the input
/// does not fit or a buffer is too small. The failure path only drops a
/// debug log record; a diagnostic screen without a QR code is still a
/// diagnostic screen.
pub fn generate(url: Option<&str>, image: &mut [u8], data_len: usize, scratch: &mut [u8]) -> u8 {
    match try_generate(url, image, data_len, scratch) {
        Ok(width) => width,
        Err(reason) => {
            log::debug!("dropping the diagnostic QR code: {}", reason);
            0
        }
    }
}

/// Like [`generate`], but reporting the reason for a failure.
pub fn try_generate(
    url: Option<&str>,
    image: &mut [u8],
    data_len: usize,
    scratch: &mut [u8],
) -> Result<u8, GenerateError> {
    if image.len() < IMAGE_BUFFER_MIN || scratch.len() < SCRATCH_BUFFER_MIN || data_len > image.len()
    {
        return Err(GenerateError::BufferTooSmall);
    }

    let version = {
        let payload = &image[..data_len];
        let mut segments = ArrayVec::<Segment<'_>, 2>::new();
        match url {
            Some(url) => {
                segments.push(Segment::Binary(url.as_bytes()));
                segments.push(Segment::Numeric(payload));
            }
            None => segments.push(Segment::Binary(payload)),
        }
        let version = Version::from_segments(&segments).ok_or(GenerateError::DataTooLong)?;
        let mut codewords = CodewordBuffer::new(version, scratch);
        for segment in &segments {
            codewords.append(segment);
        }
        codewords.finish();
        version
    };
    let message = &mut scratch[..version.total_codewords()];
    errorcode::add_error_correction(version, message);

    let mut matrix = MatrixMap::new(version, image);
    matrix.draw_function_patterns();
    matrix.place_codewords(encodation::interleaved(version, message));
    matrix.apply_mask();
    Ok(matrix.width() as u8)
}

/// Maximum payload bytes a symbol of this version can carry.
///
/// With `url_len` of zero this is the binary capacity; the three bytes
/// subtracted cover the segment header and terminator. With a URL the
/// payload goes through the numeric packing, so after a five byte
/// allowance for both segment headers only 39 of every 40 remaining bits
/// carry payload. Returns 0 when the version is out of range or the URL
/// alone exceeds the capacity.
pub fn max_data_size(version: u8, url_len: usize) -> usize {
    let Some(version) = Version::new(version as usize) else {
        return 0;
    };
    let capacity = version.data_capacity();
    if url_len > 0 {
        if url_len + 5 >= capacity {
            0
        } else {
            (capacity - url_len - 5) * 39 / 40
        }
    } else {
        capacity.saturating_sub(3)
    }
}
