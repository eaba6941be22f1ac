use anyhow::{Context, Result};
use binimg_core::files::FileImages;
use binimg_core::{
    host_images, load_commands, HeaderWidth, ImageDescriptor, ImageInspector, ImageSource,
    UUID_NOT_FOUND,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// List Mach-O images with their load address, architecture and UUID
#[derive(Parser)]
#[command(
    name = "binimg",
    about = "Describe Mach-O binary images for symbolication with atos",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Describe the images loaded into this process
    Loaded {
        /// Only report images with this file name (repeatable)
        #[arg(short, long = "image")]
        images: Vec<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Lines)]
        format: Format,
    },
    /// Describe Mach-O files on disk
    Files {
        /// Paths to thin Mach-O executables or dylibs
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only report images with this file name (repeatable)
        #[arg(short, long = "image")]
        images: Vec<String>,

        /// Header layout to expect (defaults to this host's pointer width)
        #[arg(short, long, value_enum)]
        width: Option<Width>,

        #[arg(short, long, value_enum, default_value_t = Format::Lines)]
        format: Format,
    },
    /// List the load commands of a Mach-O file
    Commands {
        path: PathBuf,

        #[arg(short, long, value_enum)]
        width: Option<Width>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One `name address - arch - uuid` line per image
    Lines,
    Json,
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
enum Width {
    #[value(name = "32")]
    Bits32,
    #[value(name = "64")]
    Bits64,
}

impl From<Width> for HeaderWidth {
    fn from(width: Width) -> Self {
        match width {
            Width::Bits32 => HeaderWidth::Bits32,
            Width::Bits64 => HeaderWidth::Bits64,
        }
    }
}

#[derive(Tabled)]
struct ImageRow {
    #[tabled(rename = "Image")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Arch")]
    arch: String,
    #[tabled(rename = "UUID")]
    uuid: String,
}

impl From<&ImageDescriptor> for ImageRow {
    fn from(image: &ImageDescriptor) -> Self {
        Self {
            name: image.name().to_string(),
            address: image.address_string(),
            arch: image.arch().to_string(),
            uuid: image
                .uuid()
                .map_or_else(|| UUID_NOT_FOUND.to_string(), |uuid| uuid.to_string()),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Loaded { images, format } => {
            if !cfg!(target_vendor = "apple") {
                log::warn!("no dyld on this platform, the process has no Mach-O images");
            }
            let source = host_images();
            describe(&source, HeaderWidth::host(), &images, format)?;
        }

        Command::Files {
            paths,
            images,
            width,
            format,
        } => {
            let width = width.map_or_else(HeaderWidth::host, HeaderWidth::from);
            let source = FileImages::with_width(&paths, width);
            describe(&source, width, &images, format)?;
        }

        Command::Commands { path, width } => {
            let width = width.map_or_else(HeaderWidth::host, HeaderWidth::from);
            list_commands(&path, width)?;
        }
    }

    Ok(())
}

fn describe<S: ImageSource>(
    source: &S,
    width: HeaderWidth,
    names: &[String],
    format: Format,
) -> Result<()> {
    let filter = (!names.is_empty()).then_some(names);
    let described = ImageInspector::with_width(source, width).inspect(filter);

    match format {
        Format::Lines => {
            for image in &described {
                println!("{image}");
            }
        }
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&described)?);
        }
        Format::Table => {
            if described.is_empty() {
                println!("No Mach-O images found.");
            } else {
                let rows: Vec<ImageRow> = described.iter().map(ImageRow::from).collect();
                println!("{}", Table::new(rows).with(Style::psql()));
            }
        }
    }
    Ok(())
}

fn list_commands(path: &Path, width: HeaderWidth) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let header = width.decoder()(&data)
        .with_context(|| format!("{} is too short for a Mach-O header", path.display()))?;
    if !header.has_native_magic() {
        anyhow::bail!(
            "{}: magic {:#x} is not a native Mach-O header",
            path.display(),
            header.magic
        );
    }

    println!(
        "{} load commands, {} bytes",
        header.command_count, header.commands_size
    );
    println!(
        "{:<6} {:<10} {:<28} {:<8}",
        "Index", "Offset", "Command", "Size"
    );
    println!("{}", "-".repeat(56));

    for command in load_commands(&header, &data) {
        match command {
            Ok(command) => {
                println!(
                    "{:<6} 0x{:<8x} {:<28} {:<8}",
                    command.index,
                    command.offset,
                    command.name(),
                    command.cmdsize
                );
                match command.uuid() {
                    Ok(Some(uuid)) => println!("{:<6} {:<10} uuid {uuid}", "", ""),
                    Ok(None) => {}
                    Err(err) => {
                        println!("corrupt load command table: {err}");
                        break;
                    }
                }
            }
            Err(err) => {
                println!("corrupt load command table: {err}");
                break;
            }
        }
    }
    Ok(())
}
