//! Typed value codec.
//!
//! Marshals between native [`Value`]s and the binary buffers stored in the
//! registry. Encoding is strict and always emits the canonical terminator
//! convention; decoding is lenient and never fails, because third-party
//! writers do not agree on terminators.
//!
//! ## Layouts
//!
//! ```text
//! REG_DWORD               4 bytes little-endian
//! REG_DWORD_BIG_ENDIAN    4 bytes big-endian
//! REG_QWORD               8 bytes little-endian
//! REG_SZ / REG_EXPAND_SZ  UTF-16LE units, then 00 00
//! REG_MULTI_SZ            (UTF-16LE units, 00 00)*, then 00 00
//! anything else           bytes as given
//! ```

use crate::error::{RegistryError, Result};
use crate::utils::{decode_utf16_lossy, even_prefix, find_nul_unit, read_utf16_string, write_utf16z};
use crate::value::{Value, ValueType};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Encodes a native value as the buffer for `value_type`.
///
/// `Value::None` encodes as zero, the empty string, the empty list or an
/// empty buffer depending on the type.
///
/// # Errors
///
/// * `TypeMismatch` if the value's shape cannot be stored as `value_type`
/// * `TypeMismatch` if a string holds an embedded NUL
/// * `InvalidElement` if a string list holds a non-string element, an
///   element with an embedded NUL, or an empty element next to others
/// * `UnsupportedValue` if an opaque type is given something other than bytes
///
/// # Examples
///
/// ```rust
/// use winregistry::{codec, Value, ValueType};
///
/// let buf = codec::encode(&Value::from("ok"), ValueType::String).unwrap();
/// assert_eq!(buf, vec![b'o', 0, b'k', 0, 0, 0]);
/// ```
pub fn encode(value: &Value, value_type: ValueType) -> Result<Vec<u8>> {
    match value_type {
        ValueType::Dword => {
            let mut buf = vec![0u8; 4];
            LittleEndian::write_u32(&mut buf, int_u32(value, value_type)?);
            Ok(buf)
        }

        ValueType::DwordBigEndian => {
            let mut buf = vec![0u8; 4];
            BigEndian::write_u32(&mut buf, int_u32(value, value_type)?);
            Ok(buf)
        }

        ValueType::Qword => {
            let n = match value {
                Value::None => 0,
                Value::Int(n) => *n,
                other => return Err(RegistryError::type_mismatch(value_type, other.kind())),
            };
            let mut buf = vec![0u8; 8];
            LittleEndian::write_u64(&mut buf, n);
            Ok(buf)
        }

        ValueType::String | ValueType::ExpandString => {
            let s = match value {
                Value::None => "",
                Value::Str(s) => s.as_str(),
                other => return Err(RegistryError::type_mismatch(value_type, other.kind())),
            };
            if s.contains('\0') {
                return Err(RegistryError::type_mismatch(value_type, "string with embedded NUL"));
            }
            let mut buf = Vec::new();
            write_utf16z(&mut buf, s);
            Ok(buf)
        }

        ValueType::MultiString => {
            let items: &[Value] = match value {
                Value::None => &[],
                Value::List(items) => items,
                other => return Err(RegistryError::type_mismatch(value_type, other.kind())),
            };
            let mut buf = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let found = match item {
                    // An empty element would read back as the list terminator,
                    // unless it is the only one.
                    Value::Str(s) if s.is_empty() && items.len() > 1 => "empty string",
                    Value::Str(s) if s.contains('\0') => "string with embedded NUL",
                    Value::Str(s) => {
                        write_utf16z(&mut buf, s);
                        continue;
                    }
                    other => other.kind(),
                };
                return Err(RegistryError::InvalidElement {
                    value_type,
                    index,
                    found: found.to_string(),
                });
            }
            buf.extend_from_slice(&[0, 0]);
            Ok(buf)
        }

        // REG_BINARY and every type without a native form: copy the bits.
        _ => match value {
            Value::None => Ok(Vec::new()),
            Value::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(RegistryError::UnsupportedValue {
                value_type,
                found: other.kind().to_string(),
            }),
        },
    }
}

/// Decodes a registry buffer of type `value_type`.
///
/// Never fails: short integers are zero-extended, a dangling odd byte after
/// UTF-16 data is ignored and terminators may be missing or repeated. An
/// empty opaque buffer decodes to `Value::None`.
///
/// # Examples
///
/// ```rust
/// use winregistry::{codec, Value, ValueType};
///
/// // No trailing terminator
/// let value = codec::decode(&[b'o', 0, b'k', 0], ValueType::String);
/// assert_eq!(value, Value::from("ok"));
/// ```
pub fn decode(data: &[u8], value_type: ValueType) -> Value {
    match value_type {
        ValueType::Dword => {
            Value::Int(u64::from(LittleEndian::read_u32(&padded::<4>(data, false))))
        }

        ValueType::DwordBigEndian => {
            Value::Int(u64::from(BigEndian::read_u32(&padded::<4>(data, true))))
        }

        ValueType::Qword => Value::Int(LittleEndian::read_u64(&padded::<8>(data, false))),

        ValueType::String | ValueType::ExpandString => Value::Str(read_utf16_string(data)),

        ValueType::MultiString => Value::List(decode_multi_string(data)),

        _ => {
            if data.is_empty() {
                Value::None
            } else {
                Value::Bytes(data.to_vec())
            }
        }
    }
}

/// Splits a REG_MULTI_SZ buffer on NUL units, stopping at the first empty string.
fn decode_multi_string(data: &[u8]) -> Vec<Value> {
    let data = even_prefix(data);

    // Canonical form of a list holding a single empty string.
    if data == [0, 0, 0, 0] {
        return vec![Value::Str(String::new())];
    }

    let mut items = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let end = find_nul_unit(rest).unwrap_or(rest.len());
        if end == 0 {
            break;
        }
        items.push(Value::Str(decode_utf16_lossy(&rest[..end])));
        rest = &rest[(end + 2).min(rest.len())..];
    }
    items
}

/// Copies up to `N` bytes into a zeroed array; big-endian values are right-aligned.
fn padded<const N: usize>(data: &[u8], right_align: bool) -> [u8; N] {
    let mut out = [0u8; N];
    let len = data.len().min(N);
    if right_align {
        out[N - len..].copy_from_slice(&data[..len]);
    } else {
        out[..len].copy_from_slice(&data[..len]);
    }
    out
}

fn int_u32(value: &Value, value_type: ValueType) -> Result<u32> {
    match value {
        Value::None => Ok(0),
        Value::Int(n) => u32::try_from(*n).map_err(|_| {
            RegistryError::type_mismatch(value_type, format!("integer {} (out of range)", n))
        }),
        other => Err(RegistryError::type_mismatch(value_type, other.kind())),
    }
}
