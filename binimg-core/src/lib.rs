pub mod build_id;
pub mod cursor;
pub mod error;
pub mod header;
pub mod inspector;
pub mod load_command;
pub mod source;

pub use build_id::*;
pub use error::*;
pub use header::{HeaderWidth, ImageHeader};
pub use inspector::*;
pub use load_command::{find_build_identifier, load_commands, LoadCommand};
pub use source::*;

/// One formatted line per image loaded into this process, for use with `atos`:
///
/// ```text
/// atos -arch arm64 -o MyApp.dSYM/Contents/Resources/DWARF/MyApp -l 0x0000000100000000 0x0000000100003f2c
/// ```
///
/// `image_names_to_log` restricts the output to images with those short names.
/// Never fails; on hosts without Mach-O images the list is empty.
pub fn get_binary_images_info<N: AsRef<str>>(image_names_to_log: Option<&[N]>) -> Vec<String> {
    binary_images_info(&host_images(), image_names_to_log)
}

/// Like [`get_binary_images_info`], against any source.
pub fn binary_images_info<S, N>(source: &S, image_names_to_log: Option<&[N]>) -> Vec<String>
where
    S: ImageSource + ?Sized,
    N: AsRef<str>,
{
    ImageInspector::new(source)
        .inspect(image_names_to_log)
        .iter()
        .map(ToString::to_string)
        .collect()
}
