//! Utility functions for UTF-16 buffers and timestamp conversion.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use encoding_rs::UTF_16LE;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
pub const FILETIME_UNIX_DIFF: i64 = 11644473600;

/// FILETIME ticks (100 ns) per second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Rounds a buffer down to an even length.
///
/// Registry writers sometimes leave a dangling odd byte after UTF-16 data.
#[inline]
pub fn even_prefix(data: &[u8]) -> &[u8] {
    &data[..data.len() & !1]
}

/// Returns the byte offset of the first NUL code unit in aligned UTF-16LE data.
pub fn find_nul_unit(data: &[u8]) -> Option<usize> {
    data.chunks_exact(2)
        .position(|unit| LittleEndian::read_u16(unit) == 0)
        .map(|index| index * 2)
}

/// Decodes UTF-16LE bytes without failing.
///
/// Unpaired surrogates become U+FFFD.
pub fn decode_utf16_lossy(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }
    let (decoded, _had_errors) = UTF_16LE.decode_without_bom_handling(data);
    decoded.into_owned()
}

/// Reads a UTF-16LE string, stopping at the first NUL code unit.
///
/// Tolerates buffers with or without the trailing terminator and with an odd
/// trailing byte.
pub fn read_utf16_string(data: &[u8]) -> String {
    let data = even_prefix(data);
    let end = find_nul_unit(data).unwrap_or(data.len());
    decode_utf16_lossy(&data[..end])
}

/// Appends `s` as UTF-16LE followed by one NUL code unit.
pub fn write_utf16z(buf: &mut Vec<u8>, s: &str) {
    buf.reserve((s.len() + 1) * 2);
    for unit in s.encode_utf16() {
        // Writing into a Vec cannot fail.
        let _ = buf.write_u16::<LittleEndian>(unit);
    }
    let _ = buf.write_u16::<LittleEndian>(0);
}

/// Converts a Windows FILETIME (100 ns ticks since 1601-01-01) to UTC.
///
/// Returns `None` if the instant is outside chrono's representable range.
pub fn filetime_to_datetime(ticks: u64) -> Option<DateTime<Utc>> {
    let seconds = (ticks / TICKS_PER_SECOND) as i64 - FILETIME_UNIX_DIFF;
    let nanos = ((ticks % TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(seconds, nanos)
}

/// Converts a UTC instant to Windows FILETIME ticks.
///
/// Instants before 1601-01-01 saturate to zero.
pub fn datetime_to_filetime(at: DateTime<Utc>) -> u64 {
    let seconds = at.timestamp() + FILETIME_UNIX_DIFF;
    if seconds < 0 {
        return 0;
    }
    (seconds as u64) * TICKS_PER_SECOND + u64::from(at.timestamp_subsec_nanos() / 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_utf16_string() {
        let data = [b'H', 0, b'i', 0];
        assert_eq!(read_utf16_string(&data), "Hi");

        // Terminator and anything after it is dropped
        let data = [b'H', 0, b'i', 0, 0, 0, b'x', 0];
        assert_eq!(read_utf16_string(&data), "Hi");
    }

    #[test]
    fn test_read_utf16_string_odd_length() {
        let data = [b'H', 0, b'i', 0, 0];
        assert_eq!(read_utf16_string(&data), "Hi");
    }

    #[test]
    fn test_nul_search_is_aligned() {
        // Bytes 1..3 are zero but straddle two code units (U+0041, U+4200)
        let data = [0x41, 0x00, 0x00, 0x42, 0x00, 0x00];
        assert_eq!(find_nul_unit(&data), Some(4));
    }

    #[test]
    fn test_write_utf16z() {
        let mut buf = Vec::new();
        write_utf16z(&mut buf, "ab");
        assert_eq!(buf, vec![b'a', 0, b'b', 0, 0, 0]);
    }

    #[test]
    fn test_filetime_epoch() {
        let unix_epoch = FILETIME_UNIX_DIFF as u64 * TICKS_PER_SECOND;
        let at = filetime_to_datetime(unix_epoch).unwrap();
        assert_eq!(at.timestamp(), 0);
        assert_eq!(datetime_to_filetime(at), unix_epoch);
    }

    #[test]
    fn test_filetime_sub_second() {
        let ticks = 132_000_000_001_234_567u64;
        let at = filetime_to_datetime(ticks).unwrap();
        assert_eq!(at.timestamp_subsec_nanos(), 123_456_700);
        assert_eq!(datetime_to_filetime(at), ticks);
    }
}
