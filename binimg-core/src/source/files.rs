//! Mach-O images read from disk.
//!
//! Lets the same inspection run against binaries that are not loaded into
//! this process, e.g. an app bundle's executable next to its dSYM. The
//! reported address is the unslid `__TEXT` load address, which is what
//! `atos -l` expects for an on-disk image.

use super::{ImageSource, LoadedImage};
use crate::header::HeaderWidth;
use anyhow::{bail, Context, Result};
use goblin::mach::fat::FAT_MAGIC;
use goblin::mach::MachO;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct FileImage {
    path: PathBuf,
    // None when the file could not be read or is not a usable image.
    data: Option<Vec<u8>>,
    address: u64,
}

#[derive(Debug)]
pub struct FileImages {
    images: Vec<FileImage>,
}

impl FileImages {
    /// Reads every path, expecting images of the host's pointer width.
    pub fn open<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::with_width(paths, HeaderWidth::host())
    }

    /// Reads every path, expecting images of `width`.
    ///
    /// Files that cannot be used still occupy their index, with no header, so
    /// the inspector skips them the way it skips a loader entry without one.
    pub fn with_width<I, P>(paths: I, width: HeaderWidth) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let images: Vec<FileImage> = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref();
                match load(path, width) {
                    Ok((data, address)) => FileImage {
                        path: path.to_path_buf(),
                        data: Some(data),
                        address,
                    },
                    Err(err) => {
                        warn!("{err:#}");
                        FileImage {
                            path: path.to_path_buf(),
                            data: None,
                            address: 0,
                        }
                    }
                }
            })
            .collect();

        let usable = images.iter().filter(|i| i.data.is_some()).count();
        info!("Loaded {usable} of {} Mach-O files", images.len());
        Self { images }
    }
}

fn load(path: &Path, width: HeaderWidth) -> Result<(Vec<u8>, u64)> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    if data.starts_with(&FAT_MAGIC.to_be_bytes()) {
        bail!("{}: fat archives are not supported", path.display());
    }

    let header = width.decoder()(&data)
        .with_context(|| format!("{}: not a Mach-O image", path.display()))?;
    if !header.has_native_magic() {
        bail!(
            "{}: magic {:#x} is not a native {}-bit Mach-O header",
            path.display(),
            header.magic,
            if width.is_64() { 64 } else { 32 }
        );
    }

    let address = text_vmaddr(&data).unwrap_or_else(|| {
        debug!("{}: no __TEXT segment, reporting address 0", path.display());
        0
    });
    Ok((data, address))
}

fn text_vmaddr(data: &[u8]) -> Option<u64> {
    let macho = match MachO::parse(data, 0) {
        Ok(macho) => macho,
        Err(err) => {
            debug!("goblin could not parse image: {err}");
            return None;
        }
    };
    macho
        .segments
        .iter()
        .find(|segment| segment.name().ok() == Some("__TEXT"))
        .map(|segment| segment.vmaddr)
}

impl ImageSource for FileImages {
    fn count(&self) -> usize {
        self.images.len()
    }

    fn name_at(&self, index: usize) -> Option<String> {
        let image = self.images.get(index)?;
        Some(image.path.to_string_lossy().into_owned())
    }

    fn header_at(&self, index: usize) -> Option<LoadedImage<'_>> {
        let image = self.images.get(index)?;
        let bytes = image.data.as_deref()?;
        Some(LoadedImage {
            address: image.address,
            bytes,
        })
    }
}
