use crate::error::ParseBuildIdError;
use hex::FromHexError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Byte offsets after which the textual form inserts a dash (8-4-4-4-12 digits).
const DASH_AFTER: [usize; 4] = [4, 6, 8, 10];

/// Character positions of the dashes in the textual form.
const DASH_AT: [usize; 4] = [8, 13, 18, 23];

/// Character ranges of the hex groups in the textual form.
const GROUPS: [(usize, usize); 5] = [(0, 8), (9, 13), (14, 18), (19, 23), (24, 36)];

/// The 128-bit build identifier carried by an image's `LC_UUID` command.
///
/// Displays as uppercase dashed hex, e.g. `01020304-0506-0708-090A-0B0C0D0E0F10`,
/// which is also what `dwarfdump --uuid` prints for the matching dSYM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildId([u8; 16]);

impl BuildId {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if DASH_AFTER.contains(&i) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for BuildId {
    type Err = ParseBuildIdError;

    /// Accepts the dashed form in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.as_bytes();
        if text.len() != 36 {
            return Err(ParseBuildIdError::Length(text.len()));
        }
        if let Some(&dash) = DASH_AT.iter().find(|&&pos| text[pos] != b'-') {
            return Err(ParseBuildIdError::MissingDash(dash));
        }

        let mut bytes = [0u8; 16];
        let mut out = 0;
        for (start, end) in GROUPS {
            let len = (end - start) / 2;
            hex::decode_to_slice(&text[start..end], &mut bytes[out..out + len]).map_err(
                |err| match err {
                    FromHexError::InvalidHexCharacter { index, .. } => {
                        ParseBuildIdError::InvalidDigit(start + index)
                    }
                    _ => ParseBuildIdError::InvalidDigit(start),
                },
            )?;
            out += len;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for BuildId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
