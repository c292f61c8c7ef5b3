use pretty_assertions::assert_eq;

use crate::encodation::interleaved;
use crate::placement::MatrixMap;
use crate::{
    generate, max_data_size, try_generate, GenerateError, Version, IMAGE_BUFFER_MIN,
    SCRATCH_BUFFER_MIN,
};

fn buffers() -> (Vec<u8>, Vec<u8>) {
    (vec![0; IMAGE_BUFFER_MIN], vec![0; SCRATCH_BUFFER_MIN])
}

#[test]
fn empty_input_draws_the_smallest_symbol() {
    let (mut image, mut scratch) = buffers();
    let width = generate(None, &mut image, 0, &mut scratch);
    assert_eq!(width, 21);
    // the top left finder pattern occupies rows and columns 0 to 6
    let stride = 3;
    let first_bytes: Vec<u8> = (0..7).map(|y| image[y * stride]).collect();
    assert_eq!(first_bytes, vec![0xFE, 0x82, 0xBA, 0xBA, 0xBA, 0x82, 0xFE]);
}

#[test]
fn generation_is_deterministic() {
    let payload = b"BUG: unable to handle page fault for address: 0000000000000008";
    let mut first = buffers();
    let mut second = buffers();
    for (image, scratch) in [&mut first, &mut second] {
        image[..payload.len()].copy_from_slice(payload);
        assert_ne!(generate(None, image, payload.len(), scratch), 0);
    }
    assert_eq!(first.0, second.0);
}

#[test]
fn payload_size_decides_the_version() {
    // 17 bytes are the last fit for version 1, one more moves to version 2
    let (mut image, mut scratch) = buffers();
    image[..18].fill(b'x');
    assert_eq!(generate(None, &mut image, 17, &mut scratch), 21);

    let (mut image, mut scratch) = buffers();
    image[..18].fill(b'x');
    assert_eq!(generate(None, &mut image, 18, &mut scratch), 25);
}

#[test]
fn the_largest_payload_fills_version_40() {
    let (mut image, mut scratch) = buffers();
    image[..2953].fill(0xA5);
    assert_eq!(generate(None, &mut image, 2953, &mut scratch), 177);

    let (mut image, mut scratch) = buffers();
    image[..2954].fill(0xA5);
    assert_eq!(
        try_generate(None, &mut image, 2954, &mut scratch),
        Err(GenerateError::DataTooLong)
    );
    assert_eq!(generate(None, &mut image, 2954, &mut scratch), 0);
}

#[test]
fn undersized_buffers_are_rejected() {
    let mut image = vec![0; IMAGE_BUFFER_MIN - 1];
    let mut scratch = vec![0; SCRATCH_BUFFER_MIN];
    assert_eq!(
        try_generate(None, &mut image, 0, &mut scratch),
        Err(GenerateError::BufferTooSmall)
    );

    let mut image = vec![0; IMAGE_BUFFER_MIN];
    let mut scratch = vec![0; SCRATCH_BUFFER_MIN - 1];
    assert_eq!(generate(None, &mut image, 0, &mut scratch), 0);

    let (mut image, mut scratch) = buffers();
    let oversized = image.len() + 1;
    assert_eq!(generate(None, &mut image, oversized, &mut scratch), 0);
}

#[test]
fn url_and_payload_share_the_symbol() {
    let url = "https://example.com/panic?a=";
    let (mut image, mut scratch) = buffers();
    for (i, byte) in image[..100].iter_mut().enumerate() {
        *byte = (i * 13 + 5) as u8;
    }
    // 28 url bytes and 100 payload bytes need 1070 bits, a version 6 symbol
    assert_eq!(generate(Some(url), &mut image, 100, &mut scratch), 41);
}

#[test]
fn buffer_minimums_derive_from_version_40() {
    let v40 = Version::new(40).unwrap();
    assert_eq!(IMAGE_BUFFER_MIN, v40.width() * v40.width().div_ceil(8));
    assert_eq!(SCRATCH_BUFFER_MIN, v40.total_codewords());
}

#[test]
fn max_data_size_tracks_the_capacity_table() {
    for v in 1..=40u8 {
        let capacity = Version::new(v as usize).unwrap().data_capacity();
        assert_eq!(max_data_size(v, 0) + 3, capacity, "version {v}");
    }
    assert_eq!(max_data_size(1, 0), 16);
    assert_eq!(max_data_size(40, 0), 2953);
    assert_eq!(max_data_size(0, 0), 0);
    assert_eq!(max_data_size(41, 0), 0);
}

#[test]
fn max_data_size_with_a_url() {
    // version 1 holds 19 codewords: 11 url bytes and the 5 byte header
    // allowance leave 3 bytes, shrunk by the numeric packing ratio
    assert_eq!(max_data_size(1, 11), 3 * 39 / 40);
    // a url that eats the whole capacity leaves nothing
    assert_eq!(max_data_size(1, 14), 0);
    assert_eq!(max_data_size(1, 200), 0);
    assert!(max_data_size(40, 200) > 0);
}

#[test]
fn the_drawn_symbol_carries_the_interleaved_message() {
    let payload = b"PANIC at kernel/sched/core.c:1234"; // 33 bytes, version 3
    let (mut image, mut scratch) = buffers();
    image[..payload.len()].copy_from_slice(payload);
    let width = generate(None, &mut image, payload.len(), &mut scratch) as usize;
    assert_eq!(width, 29);

    let version = Version::new(3).unwrap();
    // the message survives in the scratch buffer: binary mode nibble, the
    // length 33, then the payload
    assert_eq!(scratch[0], 0x42);
    assert_eq!(scratch[1], 0x15);
    let expected: Vec<u8> = interleaved(version, &scratch[..version.total_codewords()]).collect();

    // undo the mask with a fresh geometry oracle, then read the modules
    // back in placement order
    let mut oracle_buf = vec![0; IMAGE_BUFFER_MIN];
    let oracle = MatrixMap::new(version, &mut oracle_buf);
    let stride = width.div_ceil(8);
    for y in 0..width {
        for x in 0..width {
            if (x + y) % 2 == 0 && !oracle.is_reserved(x, y) {
                image[y * stride + x / 8] ^= 0x80 >> (x % 8);
            }
        }
    }
    let mut bits = Vec::new();
    let mut right = width - 1;
    let mut upward = true;
    loop {
        for step in 0..2 * width {
            let x = right - step % 2;
            let y = if upward { width - 1 - step / 2 } else { step / 2 };
            if !oracle.is_reserved(x, y) {
                bits.push(image[y * stride + x / 8] & 0x80 >> (x % 8) != 0);
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
    let bytes: Vec<u8> = bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, bit| acc << 1 | *bit as u8))
        .collect();
    assert_eq!(bytes, expected);
}
