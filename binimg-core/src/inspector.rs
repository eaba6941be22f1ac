use crate::build_id::BuildId;
use crate::header::{HeaderDecoder, HeaderWidth};
use crate::load_command::find_build_identifier;
use crate::source::ImageSource;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

/// Marker printed in place of an identifier when an image has none.
pub const UUID_NOT_FOUND: &str = "uuid not found";

/// One inspected image. Rows are built by [`ImageInspector`] and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    name: String,
    address: u64,
    #[serde(skip)]
    width: HeaderWidth,
    arch: String,
    uuid: Option<BuildId>,
}

impl ImageDescriptor {
    /// Last path component, e.g. `libswiftCore.dylib`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header address reported by the source.
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn address_string(&self) -> String {
        self.width.format_address(self.address)
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn uuid(&self) -> Option<BuildId> {
        self.uuid
    }
}

/// `<name> <address> - <arch> - <uuid or "uuid not found">`, the line format
/// symbolication tooling reads.
impl fmt::Display for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - {} - ", self.name, self.address_string(), self.arch)?;
        match &self.uuid {
            Some(uuid) => write!(f, "{uuid}"),
            None => f.write_str(UUID_NOT_FOUND),
        }
    }
}

/// Inspects every image of a source.
pub struct ImageInspector<S> {
    source: S,
    width: HeaderWidth,
    decode: HeaderDecoder,
}

impl<S: fmt::Debug> fmt::Debug for ImageInspector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageInspector")
            .field("source", &self.source)
            .field("width", &self.width)
            .finish()
    }
}

impl<S: ImageSource> ImageInspector<S> {
    pub fn new(source: S) -> Self {
        Self::with_width(source, HeaderWidth::host())
    }

    pub fn with_width(source: S, width: HeaderWidth) -> Self {
        Self {
            source,
            width,
            decode: width.decoder(),
        }
    }

    /// Describes every image in source order, optionally restricted to the
    /// given short names. Images lacking a path, a header or a known
    /// architecture are left out.
    pub fn inspect<N: AsRef<str>>(&self, filter: Option<&[N]>) -> Vec<ImageDescriptor> {
        let count = self.source.count();
        let images: Vec<ImageDescriptor> = (0..count)
            .filter_map(|index| self.inspect_one(index, filter))
            .collect();
        info!("Described {} of {count} images", images.len());
        images
    }

    fn inspect_one<N: AsRef<str>>(
        &self,
        index: usize,
        filter: Option<&[N]>,
    ) -> Option<ImageDescriptor> {
        let Some(path) = self.source.name_at(index) else {
            debug!("image {index}: no path, skipping");
            return None;
        };
        let Some(name) = short_name(&path) else {
            debug!("image {index}: empty path, skipping");
            return None;
        };

        if let Some(filter) = filter {
            if !filter.iter().any(|wanted| wanted.as_ref() == name) {
                return None;
            }
        }

        let Some(image) = self.source.header_at(index) else {
            debug!("{name}: no header, skipping");
            return None;
        };
        let header = match (self.decode)(image.bytes) {
            Ok(header) => header,
            Err(err) => {
                debug!("{name}: {err}, skipping");
                return None;
            }
        };
        let Some(arch) = self.source.arch_label(header.cpu_type, header.cpu_subtype) else {
            debug!(
                "{name}: unknown architecture {:#x}/{:#x}, skipping",
                header.cpu_type, header.cpu_subtype
            );
            return None;
        };

        let uuid = match find_build_identifier(&header, image.bytes) {
            Ok(uuid) => uuid,
            Err(err) => {
                warn!("{name}: corrupt load commands: {err}");
                None
            }
        };

        Some(ImageDescriptor {
            name: name.to_owned(),
            address: image.address,
            width: self.width,
            arch,
            uuid,
        })
    }
}

/// The final non-empty `/`-separated segment of `path`.
pub fn short_name(path: &str) -> Option<&str> {
    path.rsplit('/').find(|segment| !segment.is_empty())
}
