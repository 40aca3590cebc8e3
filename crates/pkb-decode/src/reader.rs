//! Little-endian field access over borrowed byte buffers.
//!
//! Every reader returns `None` past the end of the buffer instead of
//! panicking, so callers can walk declared counts against short data.

/// Read a little-endian `u32` at `offset`.
#[must_use]
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let raw: [u8; 4] = bytes.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

/// Read a little-endian `f32` at `offset`.
#[must_use]
pub fn read_f32_le(bytes: &[u8], offset: usize) -> Option<f32> {
    read_u32_le(bytes, offset).map(f32::from_bits)
}

/// Read three consecutive little-endian `f32`s.
pub(crate) fn read_f32x3(bytes: &[u8], offset: usize) -> Option<[f32; 3]> {
    Some([
        read_f32_le(bytes, offset)?,
        read_f32_le(bytes, offset.checked_add(4)?)?,
        read_f32_le(bytes, offset.checked_add(8)?)?,
    ])
}

/// Read three consecutive little-endian `u32`s.
pub(crate) fn read_u32x3(bytes: &[u8], offset: usize) -> Option<[u32; 3]> {
    Some([
        read_u32_le(bytes, offset)?,
        read_u32_le(bytes, offset.checked_add(4)?)?,
        read_u32_le(bytes, offset.checked_add(8)?)?,
    ])
}

/// Read the 4-byte signature at the start of a buffer.
pub(crate) fn read_signature(bytes: &[u8]) -> Option<[u8; 4]> {
    bytes.get(..4)?.try_into().ok()
}

/// Decode a fixed-width, NUL-padded name field.
///
/// The name ends at the first NUL. Bytes outside UTF-8 are replaced.
pub(crate) fn read_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Append `name` as a NUL-padded field of exactly `width` bytes.
///
/// Longer names are cut at `width`.
pub(crate) fn write_name(out: &mut Vec<u8>, name: &str, width: usize) {
    let raw = name.as_bytes();
    let len = raw.len().min(width);
    out.extend_from_slice(&raw[..len]);
    out.resize(out.len() + (width - len), 0);
}
