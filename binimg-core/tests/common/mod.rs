#![allow(dead_code)]

use binimg_core::{HeaderWidth, ImageSource, LoadedImage};
use goblin::mach::cputype::{
    CPU_SUBTYPE_ARM64_ALL, CPU_SUBTYPE_I386_ALL, CPU_TYPE_ARM64, CPU_TYPE_I386,
};
use goblin::mach::header::MH_EXECUTE;
use goblin::mach::load_command::{LC_SEGMENT_64, LC_UUID};

pub const SEQUENTIAL_UUID: [u8; 16] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
];

/// Builds a native-endian Mach-O image: header followed by load commands.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    width: HeaderWidth,
    cpu_type: u32,
    cpu_subtype: u32,
    commands: Vec<Vec<u8>>,
    command_count: Option<u32>,
    commands_size: Option<u32>,
}

impl ImageBuilder {
    pub fn arm64() -> Self {
        Self {
            width: HeaderWidth::Bits64,
            cpu_type: CPU_TYPE_ARM64,
            cpu_subtype: CPU_SUBTYPE_ARM64_ALL,
            commands: Vec::new(),
            command_count: None,
            commands_size: None,
        }
    }

    /// A 32-bit image: 28-byte `mach_header` without the `reserved` word.
    pub fn i386() -> Self {
        Self {
            width: HeaderWidth::Bits32,
            cpu_type: CPU_TYPE_I386,
            cpu_subtype: CPU_SUBTYPE_I386_ALL,
            ..Self::arm64()
        }
    }

    pub fn cpu(mut self, cpu_type: u32, cpu_subtype: u32) -> Self {
        self.cpu_type = cpu_type;
        self.cpu_subtype = cpu_subtype;
        self
    }

    /// A record whose `cmdsize` matches its length.
    pub fn command(self, cmd: u32, body: &[u8]) -> Self {
        let size = 8 + body.len() as u32;
        self.raw_command(cmd, size, body)
    }

    /// A record with an arbitrary declared `cmdsize`.
    pub fn raw_command(mut self, cmd: u32, cmdsize: u32, body: &[u8]) -> Self {
        let mut record = cmd.to_ne_bytes().to_vec();
        record.extend_from_slice(&cmdsize.to_ne_bytes());
        record.extend_from_slice(body);
        self.commands.push(record);
        self
    }

    pub fn uuid(self, bytes: [u8; 16]) -> Self {
        self.command(LC_UUID, &bytes)
    }

    /// An `LC_SEGMENT_64` without sections.
    pub fn segment_64(self, name: &str, vmaddr: u64, fileoff: u64, filesize: u64) -> Self {
        let mut body = [0u8; 16].to_vec();
        body[..name.len()].copy_from_slice(name.as_bytes());
        body.extend_from_slice(&vmaddr.to_ne_bytes());
        body.extend_from_slice(&filesize.to_ne_bytes()); // vmsize
        body.extend_from_slice(&fileoff.to_ne_bytes());
        body.extend_from_slice(&filesize.to_ne_bytes());
        body.extend_from_slice(&5i32.to_ne_bytes()); // maxprot r-x
        body.extend_from_slice(&5i32.to_ne_bytes()); // initprot r-x
        body.extend_from_slice(&0u32.to_ne_bytes()); // nsects
        body.extend_from_slice(&0u32.to_ne_bytes()); // flags
        self.command(LC_SEGMENT_64, &body)
    }

    pub fn command_count(mut self, count: u32) -> Self {
        self.command_count = Some(count);
        self
    }

    pub fn commands_size(mut self, size: u32) -> Self {
        self.commands_size = Some(size);
        self
    }

    pub fn commands_len(&self) -> u32 {
        self.commands.iter().map(|c| c.len() as u32).sum()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut words = vec![
            self.width.magic(),
            self.cpu_type,
            self.cpu_subtype,
            MH_EXECUTE,
            self.command_count.unwrap_or(self.commands.len() as u32),
            self.commands_size.unwrap_or_else(|| self.commands_len()),
            0,
        ];
        if self.width.is_64() {
            words.push(0);
        }

        let mut out: Vec<u8> = words.iter().flat_map(|w| w.to_ne_bytes()).collect();
        for command in &self.commands {
            out.extend_from_slice(command);
        }
        out
    }
}

#[derive(Debug, Clone)]
struct Entry {
    path: Option<String>,
    address: u64,
    bytes: Option<Vec<u8>>,
}

/// An in-memory stand-in for the loader's image list.
#[derive(Debug, Clone, Default)]
pub struct SyntheticImages {
    entries: Vec<Entry>,
}

impl SyntheticImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(mut self, path: &str, address: u64, image: &ImageBuilder) -> Self {
        self.entries.push(Entry {
            path: Some(path.to_string()),
            address,
            bytes: Some(image.build()),
        });
        self
    }

    pub fn raw(mut self, path: &str, address: u64, bytes: Vec<u8>) -> Self {
        self.entries.push(Entry {
            path: Some(path.to_string()),
            address,
            bytes: Some(bytes),
        });
        self
    }

    pub fn without_path(mut self, address: u64, image: &ImageBuilder) -> Self {
        self.entries.push(Entry {
            path: None,
            address,
            bytes: Some(image.build()),
        });
        self
    }

    pub fn without_header(mut self, path: &str) -> Self {
        self.entries.push(Entry {
            path: Some(path.to_string()),
            address: 0,
            bytes: None,
        });
        self
    }
}

impl ImageSource for SyntheticImages {
    fn count(&self) -> usize {
        self.entries.len()
    }

    fn name_at(&self, index: usize) -> Option<String> {
        self.entries.get(index)?.path.clone()
    }

    fn header_at(&self, index: usize) -> Option<LoadedImage<'_>> {
        let entry = self.entries.get(index)?;
        Some(LoadedImage {
            address: entry.address,
            bytes: entry.bytes.as_deref()?,
        })
    }
}
