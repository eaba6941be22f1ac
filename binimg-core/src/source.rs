//! Where loaded images come from.
//!
//! The inspector only sees the [`ImageSource`] trait, so the same parsing
//! runs against the live dyld image list, Mach-O files on disk, or byte
//! buffers built in tests.

#[cfg(target_vendor = "apple")]
pub mod dyld;
pub mod files;

use goblin::mach::cputype::{get_arch_name_from_types, CPU_SUBTYPE_MASK};

/// A header region handed out by an [`ImageSource`].
#[derive(Debug, Clone, Copy)]
pub struct LoadedImage<'a> {
    /// Address reported for the header.
    pub address: u64,
    /// Bytes starting at the header and covering at least its load commands.
    pub bytes: &'a [u8],
}

pub trait ImageSource {
    /// Number of images, indexed `0..count()`.
    fn count(&self) -> usize;

    /// Full path of the image at `index`, if known.
    fn name_at(&self, index: usize) -> Option<String>;

    fn header_at(&self, index: usize) -> Option<LoadedImage<'_>>;

    /// Human-readable architecture for a CPU type/subtype pair.
    fn arch_label(&self, cpu_type: u32, cpu_subtype: u32) -> Option<String> {
        arch_name(cpu_type, cpu_subtype).map(str::to_owned)
    }
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn name_at(&self, index: usize) -> Option<String> {
        (**self).name_at(index)
    }

    fn header_at(&self, index: usize) -> Option<LoadedImage<'_>> {
        (**self).header_at(index)
    }

    fn arch_label(&self, cpu_type: u32, cpu_subtype: u32) -> Option<String> {
        (**self).arch_label(cpu_type, cpu_subtype)
    }
}

/// Looks up the architecture name, ignoring the capability bits of the subtype.
pub fn arch_name(cpu_type: u32, cpu_subtype: u32) -> Option<&'static str> {
    get_arch_name_from_types(cpu_type, cpu_subtype & !CPU_SUBTYPE_MASK)
}

/// A source with no images: what a process on a non-Mach-O platform sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageSource for NoImages {
    fn count(&self) -> usize {
        0
    }

    fn name_at(&self, _index: usize) -> Option<String> {
        None
    }

    fn header_at(&self, _index: usize) -> Option<LoadedImage<'_>> {
        None
    }
}

#[cfg(target_vendor = "apple")]
pub type HostImages = dyld::DyldImages;

#[cfg(not(target_vendor = "apple"))]
pub type HostImages = NoImages;

/// The images loaded into the current process.
pub fn host_images() -> HostImages {
    HostImages::default()
}
