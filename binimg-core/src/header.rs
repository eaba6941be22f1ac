pub mod macho;

use crate::error::ScanError;
use goblin::mach::header::{MH_MAGIC, MH_MAGIC_64, SIZEOF_HEADER_32, SIZEOF_HEADER_64};

/// Decodes the fixed-size header at the start of an image region.
pub type HeaderDecoder = fn(&[u8]) -> Result<ImageHeader, ScanError>;

/// Pointer-width variant of the Mach-O header layout.
///
/// A process only ever maps images of its own width, so a single variant is
/// picked once (normally [`HeaderWidth::host`]) and used for every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderWidth {
    Bits32,
    Bits64,
}

impl HeaderWidth {
    pub const fn host() -> Self {
        if cfg!(target_pointer_width = "64") {
            HeaderWidth::Bits64
        } else {
            HeaderWidth::Bits32
        }
    }

    /// Size in bytes of the header; the first load command starts right after it.
    pub const fn header_size(self) -> usize {
        match self {
            HeaderWidth::Bits32 => SIZEOF_HEADER_32,
            HeaderWidth::Bits64 => SIZEOF_HEADER_64,
        }
    }

    /// The magic number of a header of this width in native byte order.
    pub const fn magic(self) -> u32 {
        match self {
            HeaderWidth::Bits32 => MH_MAGIC,
            HeaderWidth::Bits64 => MH_MAGIC_64,
        }
    }

    pub fn decoder(self) -> HeaderDecoder {
        match self {
            HeaderWidth::Bits32 => macho::decode_header_32,
            HeaderWidth::Bits64 => macho::decode_header_64,
        }
    }

    /// Formats an address the way a pointer of this width prints: `0x` plus
    /// zero-padded lowercase hex.
    pub fn format_address(self, address: u64) -> String {
        match self {
            HeaderWidth::Bits32 => format!("{address:#010x}"),
            HeaderWidth::Bits64 => format!("{address:#018x}"),
        }
    }

    pub fn is_64(self) -> bool {
        self == HeaderWidth::Bits64
    }
}

/// The fixed fields of a Mach-O header, read verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// `MH_MAGIC` or `MH_MAGIC_64` for a well-formed native image.
    pub magic: u32,

    /// CPU type, e.g. `CPU_TYPE_ARM64`.
    pub cpu_type: u32,

    /// CPU subtype. The top byte carries capability bits (pointer
    /// authentication on arm64e, `CPU_SUBTYPE_LIB64`) rather than the model.
    pub cpu_subtype: u32,

    /// File type, e.g. `MH_EXECUTE` or `MH_DYLIB`.
    pub file_type: u32,

    /// Number of load commands following the header (`ncmds`).
    pub command_count: u32,

    /// Total byte size of all load commands (`sizeofcmds`).
    pub commands_size: u32,

    pub flags: u32,

    /// Layout this header was decoded with.
    pub width: HeaderWidth,
}

impl ImageHeader {
    pub fn has_native_magic(&self) -> bool {
        self.magic == self.width.magic()
    }

    /// Offset one past the last byte of the load-command table.
    pub fn command_table_end(&self) -> usize {
        self.width
            .header_size()
            .saturating_add(self.commands_size as usize)
    }
}
