use super::{HeaderWidth, ImageHeader};
use crate::cursor::ByteCursor;
use crate::error::ScanError;

/// Decodes a 28-byte `mach_header`.
pub fn decode_header_32(bytes: &[u8]) -> Result<ImageHeader, ScanError> {
    decode(bytes, HeaderWidth::Bits32)
}

/// Decodes a 32-byte `mach_header_64`. The trailing `reserved` word is skipped.
pub fn decode_header_64(bytes: &[u8]) -> Result<ImageHeader, ScanError> {
    decode(bytes, HeaderWidth::Bits64)
}

fn decode(bytes: &[u8], width: HeaderWidth) -> Result<ImageHeader, ScanError> {
    let mut cur = ByteCursor::new(bytes, 0, width.header_size());
    // Fail once for the whole header rather than on whichever field runs out.
    cur.peek(width.header_size())?;

    Ok(ImageHeader {
        magic: cur.read_u32()?,
        cpu_type: cur.read_u32()?,
        cpu_subtype: cur.read_u32()?,
        file_type: cur.read_u32()?,
        command_count: cur.read_u32()?,
        commands_size: cur.read_u32()?,
        flags: cur.read_u32()?,
        width,
    })
}
