//! The live image list of the current process, read through dyld.

use super::{ImageSource, LoadedImage};
use crate::header::HeaderWidth;
use libc::{_dyld_get_image_header, _dyld_get_image_name, _dyld_image_count};
use std::ffi::CStr;
use std::slice;

#[derive(Debug, Clone, Copy)]
pub struct DyldImages {
    width: HeaderWidth,
}

impl Default for DyldImages {
    fn default() -> Self {
        Self {
            width: HeaderWidth::host(),
        }
    }
}

impl ImageSource for DyldImages {
    fn count(&self) -> usize {
        // The count is a snapshot; images added afterwards are not visited and
        // indices past the end come back as null below.
        unsafe { _dyld_image_count() as usize }
    }

    fn name_at(&self, index: usize) -> Option<String> {
        let index = u32::try_from(index).ok()?;
        let name = unsafe { _dyld_get_image_name(index) };
        if name.is_null() {
            return None;
        }
        // SAFETY: dyld returns a NUL-terminated path that lives as long as the image.
        Some(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
    }

    fn header_at(&self, index: usize) -> Option<LoadedImage<'_>> {
        let index = u32::try_from(index).ok()?;
        let header = unsafe { _dyld_get_image_header(index) };
        if header.is_null() {
            return None;
        }
        let base = header.cast::<u8>();
        let header_size = self.width.header_size();

        // SAFETY: dyld hands out a mapped header of the host's width.
        let prefix = unsafe { slice::from_raw_parts(base, header_size) };
        let parsed = match self.width.decoder()(prefix) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("image {index}: unreadable header: {err}");
                return None;
            }
        };

        // SAFETY: the load commands follow the header inside the same mapped
        // __TEXT segment and stay mapped while the image is loaded.
        let bytes = unsafe { slice::from_raw_parts(base, parsed.command_table_end()) };
        Some(LoadedImage {
            address: base as usize as u64,
            bytes,
        })
    }
}
