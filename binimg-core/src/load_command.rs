use crate::build_id::BuildId;
use crate::cursor::ByteCursor;
use crate::error::ScanError;
use crate::header::ImageHeader;
use goblin::mach::load_command::{cmd_to_str, LC_UUID, SIZEOF_LOAD_COMMAND, SIZEOF_UUID_COMMAND};

/// One record of the load-command table.
#[derive(Debug, Clone, Copy)]
pub struct LoadCommand<'a> {
    /// Position in the table, starting at 0.
    pub index: u32,
    /// Byte offset of the record from the start of the image header.
    pub offset: usize,
    pub cmd: u32,
    /// Declared size, including the 8-byte `cmd`/`cmdsize` prefix.
    pub cmdsize: u32,
    /// The whole record, prefix included.
    pub data: &'a [u8],
}

impl<'a> LoadCommand<'a> {
    /// The `LC_*` name of this command, or `"LC_UNKNOWN"`.
    pub fn name(&self) -> &'static str {
        cmd_to_str(self.cmd)
    }

    /// Decodes the identifier if this is an `LC_UUID` record.
    pub fn uuid(&self) -> Result<Option<BuildId>, ScanError> {
        if self.cmd != LC_UUID {
            return Ok(None);
        }
        if self.data.len() < SIZEOF_UUID_COMMAND {
            return Err(ScanError::CorruptCommand {
                index: self.index,
                offset: self.offset,
                size: self.cmdsize,
                minimum: SIZEOF_UUID_COMMAND,
            });
        }
        let mut cur = ByteCursor::new(self.data, SIZEOF_LOAD_COMMAND, self.data.len());
        Ok(Some(BuildId::from_bytes(cur.read_array()?)))
    }
}

/// Walks the load commands that follow `header` inside `image`.
///
/// `image` must start at the header. The walk yields at most
/// `header.command_count` records, never reads past
/// `header.command_table_end()` or the end of `image`, and stops after the
/// first error.
pub fn load_commands<'a>(header: &ImageHeader, image: &'a [u8]) -> LoadCommands<'a> {
    LoadCommands {
        cursor: ByteCursor::new(
            image,
            header.width.header_size(),
            header.command_table_end(),
        ),
        remaining: header.command_count,
        index: 0,
    }
}

/// Returns the first `LC_UUID` identifier in the table, if any.
pub fn find_build_identifier(
    header: &ImageHeader,
    image: &[u8],
) -> Result<Option<BuildId>, ScanError> {
    for command in load_commands(header, image) {
        if let Some(uuid) = command?.uuid()? {
            return Ok(Some(uuid));
        }
    }
    Ok(None)
}

#[derive(Debug, Clone)]
pub struct LoadCommands<'a> {
    cursor: ByteCursor<'a>,
    remaining: u32,
    index: u32,
}

impl<'a> LoadCommands<'a> {
    fn read_next(&mut self) -> Result<LoadCommand<'a>, ScanError> {
        let index = self.index;
        let offset = self.cursor.position();

        let mut prefix = self.cursor;
        let cmd = prefix.read_u32()?;
        let cmdsize = prefix.read_u32()?;

        // A size below the prefix would never move the cursor forward.
        if (cmdsize as usize) < SIZEOF_LOAD_COMMAND {
            return Err(ScanError::CorruptCommand {
                index,
                offset,
                size: cmdsize,
                minimum: SIZEOF_LOAD_COMMAND,
            });
        }

        let data = self
            .cursor
            .peek(cmdsize as usize)
            .map_err(|_| ScanError::Overrun {
                index,
                offset,
                size: cmdsize,
                limit: self.cursor.limit(),
            })?;
        self.cursor.advance(data.len())?;

        Ok(LoadCommand {
            index,
            offset,
            cmd,
            cmdsize,
            data,
        })
    }
}

impl<'a> Iterator for LoadCommands<'a> {
    type Item = Result<LoadCommand<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let next = self.read_next();
        self.index += 1;
        if next.is_err() {
            self.remaining = 0;
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderWidth;
    use goblin::mach::load_command::{LC_SEGMENT_64, LC_SYMTAB};

    fn header(command_count: u32, commands_size: u32) -> ImageHeader {
        ImageHeader {
            magic: HeaderWidth::Bits64.magic(),
            cpu_type: 0,
            cpu_subtype: 0,
            file_type: 0,
            command_count,
            commands_size,
            flags: 0,
            width: HeaderWidth::Bits64,
        }
    }

    fn record(cmd: u32, cmdsize: u32, body: &[u8]) -> Vec<u8> {
        let mut out = cmd.to_ne_bytes().to_vec();
        out.extend_from_slice(&cmdsize.to_ne_bytes());
        out.extend_from_slice(body);
        out
    }

    fn image(records: &[Vec<u8>]) -> Vec<u8> {
        let mut out = vec![0u8; HeaderWidth::Bits64.header_size()];
        for r in records {
            out.extend_from_slice(r);
        }
        out
    }

    #[test]
    fn test_iterates_variable_length_records() {
        let records = vec![
            record(LC_SEGMENT_64, 24, &[0; 16]),
            record(LC_SYMTAB, 8, &[]),
            record(LC_UUID, 24, &[0xaa; 16]),
        ];
        let bytes = image(&records);
        let h = header(3, 56);

        let commands: Vec<_> = load_commands(&h, &bytes)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].offset, 32);
        assert_eq!(commands[1].offset, 56);
        assert_eq!(commands[2].offset, 64);
        assert_eq!(commands[2].name(), "LC_UUID");
        assert_eq!(commands[1].data.len(), 8);
    }

    #[test]
    fn test_32_bit_table_starts_after_28_byte_header() {
        let h = ImageHeader {
            width: HeaderWidth::Bits32,
            magic: HeaderWidth::Bits32.magic(),
            ..header(2, 48)
        };
        let mut bytes = vec![0u8; HeaderWidth::Bits32.header_size()];
        bytes.extend_from_slice(&record(LC_SYMTAB, 24, &[0; 16]));
        bytes.extend_from_slice(&record(LC_UUID, 24, &[0x5a; 16]));

        let offsets: Vec<usize> = load_commands(&h, &bytes)
            .map(|c| c.unwrap().offset)
            .collect();
        assert_eq!(offsets, [28, 52]);
        assert_eq!(
            find_build_identifier(&h, &bytes),
            Ok(Some(BuildId::from_bytes([0x5a; 16])))
        );
    }

    #[test]
    fn test_zero_commands_yields_nothing() {
        let bytes = image(&[]);
        assert_eq!(load_commands(&header(0, 0), &bytes).count(), 0);
        assert_eq!(find_build_identifier(&header(0, 0), &bytes), Ok(None));
    }

    #[test]
    fn test_zero_size_record_stops_the_walk() {
        let bytes = image(&[record(LC_SYMTAB, 0, &[]), record(LC_UUID, 24, &[1; 16])]);
        let h = header(2, 32);

        let mut commands = load_commands(&h, &bytes);
        assert_eq!(
            commands.next().unwrap().unwrap_err(),
            ScanError::CorruptCommand {
                index: 0,
                offset: 32,
                size: 0,
                minimum: 8
            }
        );
        assert!(commands.next().is_none());
    }

    #[test]
    fn test_short_uuid_record_is_corrupt() {
        let bytes = image(&[record(LC_UUID, 16, &[1; 8])]);
        let h = header(1, 16);
        assert!(matches!(
            find_build_identifier(&h, &bytes),
            Err(ScanError::CorruptCommand { minimum: 24, .. })
        ));
    }

    #[test]
    fn test_record_crossing_declared_table_end_is_overrun() {
        let bytes = image(&[record(LC_SYMTAB, 16, &[0; 8]), record(LC_UUID, 24, &[1; 16])]);
        // The table claims 24 bytes; the UUID record runs 16 bytes beyond it.
        let h = header(2, 24);
        assert_eq!(
            find_build_identifier(&h, &bytes),
            Err(ScanError::Overrun {
                index: 1,
                offset: 48,
                size: 24,
                limit: 56
            })
        );
    }

    #[test]
    fn test_prefix_past_region_end_is_truncated() {
        let bytes = image(&[record(LC_SYMTAB, 8, &[])]);
        let h = header(2, 64);
        let results: Vec<_> = load_commands(&h, &bytes).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ScanError::Truncated { offset: 40, .. })));
    }
}
