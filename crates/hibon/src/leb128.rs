//! Minimal LEB128 integers.
//!
//! Every integer in the canonical format (lengths, sizes, index keys and the
//! integer value types) is written in its shortest LEB128 form. The readers
//! reject any longer spelling of the same value so that a decoded document
//! always re-encodes to the bytes it came from.

use crate::error::{HibonError, Result};

/// Appends `value` as unsigned LEB128.
pub fn put_uleb(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Appends `value` as signed LEB128.
pub fn put_sleb(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Number of bytes `put_uleb` emits for `value`.
pub fn uleb_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Reads an unsigned LEB128 that must fit in `bits` bits.
/// Advances `pos` past the integer on success.
pub fn get_uleb(bytes: &[u8], pos: &mut usize, bits: u32) -> Result<u64> {
    let start = *pos;
    let max_len = (bits as usize + 6) / 7;
    let mut value: u128 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or_else(|| HibonError::malformed(*pos, "truncated LEB128"))?;
        *pos += 1;
        if *pos - start > max_len {
            return Err(HibonError::malformed(start, "LEB128 exceeds integer width"));
        }
        value |= u128::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if byte == 0 && *pos - start > 1 {
                return Err(HibonError::malformed(start, "non-minimal LEB128"));
            }
            break;
        }
    }
    if value >> bits != 0 {
        return Err(HibonError::malformed(start, "LEB128 exceeds integer width"));
    }
    Ok(value as u64)
}

/// Reads a signed LEB128 that must fit in `bits` bits.
/// Advances `pos` past the integer on success.
pub fn get_sleb(bytes: &[u8], pos: &mut usize, bits: u32) -> Result<i64> {
    let start = *pos;
    let max_len = (bits as usize + 6) / 7;
    let mut value: i128 = 0;
    let mut shift = 0u32;
    let mut previous: Option<u8> = None;
    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or_else(|| HibonError::malformed(*pos, "truncated LEB128"))?;
        *pos += 1;
        if *pos - start > max_len {
            return Err(HibonError::malformed(start, "LEB128 exceeds integer width"));
        }
        value |= i128::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if let Some(prev) = previous {
                let redundant = (byte == 0x00 && prev & 0x40 == 0)
                    || (byte == 0x7f && prev & 0x40 != 0);
                if redundant {
                    return Err(HibonError::malformed(start, "non-minimal LEB128"));
                }
            }
            if byte & 0x40 != 0 {
                value |= -1i128 << shift;
            }
            break;
        }
        previous = Some(byte);
    }
    let min = -(1i128 << (bits - 1));
    let max = (1i128 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(HibonError::malformed(start, "LEB128 exceeds integer width"));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uleb(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        put_uleb(&mut buf, value);
        buf
    }

    fn sleb(value: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        put_sleb(&mut buf, value);
        buf
    }

    #[test]
    fn unsigned_known_values() {
        assert_eq!(uleb(0), vec![0x00]);
        assert_eq!(uleb(127), vec![0x7f]);
        assert_eq!(uleb(128), vec![0x80, 0x01]);
        assert_eq!(uleb(624485), vec![0xe5, 0x8e, 0x26]);
        assert_eq!(uleb(u64::MAX).len(), 10);
        assert_eq!(uleb_len(u64::MAX), 10);
        assert_eq!(uleb_len(300), 2);
    }

    #[test]
    fn signed_known_values() {
        assert_eq!(sleb(0), vec![0x00]);
        assert_eq!(sleb(30), vec![0x1e]);
        assert_eq!(sleb(63), vec![0x3f]);
        assert_eq!(sleb(64), vec![0xc0, 0x00]);
        assert_eq!(sleb(-1), vec![0x7f]);
        assert_eq!(sleb(-64), vec![0x40]);
        assert_eq!(sleb(-65), vec![0xbf, 0x7f]);
        assert_eq!(sleb(-123456), vec![0xc0, 0xbb, 0x78]);
    }

    #[test]
    fn reads_back_extremes() {
        for value in [0, 1, u64::from(u32::MAX), u64::MAX] {
            let bytes = uleb(value);
            let mut pos = 0;
            assert_eq!(get_uleb(&bytes, &mut pos, 64).unwrap(), value);
            assert_eq!(pos, bytes.len());
        }
        for value in [0, -1, 64, -65, i64::MIN, i64::MAX] {
            let bytes = sleb(value);
            let mut pos = 0;
            assert_eq!(get_sleb(&bytes, &mut pos, 64).unwrap(), value);
            assert_eq!(pos, bytes.len());
        }
    }

    #[test]
    fn rejects_padded_unsigned() {
        let mut pos = 0;
        assert!(get_uleb(&[0x80, 0x00], &mut pos, 64).is_err());
        let mut pos = 0;
        assert!(get_uleb(&[0x81, 0x80, 0x00], &mut pos, 64).is_err());
    }

    #[test]
    fn rejects_padded_signed() {
        // 1 spelled with a redundant zero group
        let mut pos = 0;
        assert!(get_sleb(&[0x81, 0x00], &mut pos, 64).is_err());
        // -1 spelled with a redundant sign group
        let mut pos = 0;
        assert!(get_sleb(&[0xff, 0x7f], &mut pos, 64).is_err());
        // 64 needs its second byte
        let mut pos = 0;
        assert_eq!(get_sleb(&[0xc0, 0x00], &mut pos, 64).unwrap(), 64);
    }

    #[test]
    fn rejects_out_of_width() {
        let bytes = uleb(u64::from(u32::MAX) + 1);
        let mut pos = 0;
        assert!(get_uleb(&bytes, &mut pos, 32).is_err());

        let bytes = sleb(i64::from(i32::MAX) + 1);
        let mut pos = 0;
        assert!(get_sleb(&bytes, &mut pos, 32).is_err());

        let bytes = sleb(i64::from(i32::MIN));
        let mut pos = 0;
        assert_eq!(get_sleb(&bytes, &mut pos, 32).unwrap(), i64::from(i32::MIN));
    }

    #[test]
    fn rejects_truncation() {
        let mut pos = 0;
        assert!(get_uleb(&[0x80], &mut pos, 64).is_err());
        let mut pos = 0;
        assert!(get_sleb(&[], &mut pos, 64).is_err());
    }
}
