use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RasterError;

/// Set of independent flags selecting the traversal pattern of a raster.
///
/// The numeric values match the flag values persisted by existing beamline
/// setups, so `bits()` can be stored and restored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScanType(u32);

impl ScanType {
    /// Columns are the inner loop instead of rows.
    pub const VERTICAL: ScanType = ScanType(1);
    /// Reverse the inner direction on every other line.
    pub const SNAKE: ScanType = ScanType(2);
    /// Start on the right instead of the left.
    pub const FLIP_HORIZONTAL: ScanType = ScanType(4);
    /// Start at the bottom instead of the top.
    pub const FLIP_VERTICAL: ScanType = ScanType(8);
    /// Append the reversed path without repeating the turnaround point.
    pub const BIDIRECTIONAL: ScanType = ScanType(16);
    /// Hexagonally staggered lines.
    pub const TRIANGULAR: ScanType = ScanType(32);

    const FLAGS: [(ScanType, &'static str); 6] = [
        (ScanType::VERTICAL, "vertical"),
        (ScanType::SNAKE, "snake"),
        (ScanType::FLIP_HORIZONTAL, "flip-horizontal"),
        (ScanType::FLIP_VERTICAL, "flip-vertical"),
        (ScanType::BIDIRECTIONAL, "bidirectional"),
        (ScanType::TRIANGULAR, "triangular"),
    ];

    const ALL_BITS: u32 = 0b11_1111;

    pub const fn empty() -> Self {
        ScanType(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `None` if any bit outside the known flags is set.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL_BITS == 0 {
            Some(ScanType(bits))
        } else {
            None
        }
    }

    pub const fn contains(self, other: ScanType) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: ScanType) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ScanType) {
        self.0 &= !other.0;
    }

    /// Names of the flags that are set, in flag order.
    pub fn flag_names(self) -> Vec<&'static str> {
        Self::FLAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    fn from_flag_name(name: &str) -> Result<Self, RasterError> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        Self::FLAGS
            .iter()
            .find(|(_, flag_name)| *flag_name == normalized)
            .map(|(flag, _)| *flag)
            .ok_or_else(|| RasterError::UnknownScanFlag(name.trim().to_string()))
    }
}

impl std::ops::BitOr for ScanType {
    type Output = ScanType;

    fn bitor(self, rhs: ScanType) -> ScanType {
        ScanType(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ScanType {
    fn bitor_assign(&mut self, rhs: ScanType) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("default");
        }
        f.write_str(&self.flag_names().join("|"))
    }
}

/// Parses `|`- or `,`-separated flag names, `default`, or the numeric bit value.
impl FromStr for ScanType {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(bits) = trimmed.parse::<u32>() {
            return ScanType::from_bits(bits).ok_or(RasterError::InvalidScanType(bits));
        }
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
            return Ok(ScanType::empty());
        }
        trimmed
            .split(['|', ','])
            .try_fold(ScanType::empty(), |acc, name| {
                Ok(acc | ScanType::from_flag_name(name)?)
            })
    }
}

impl TryFrom<Vec<String>> for ScanType {
    type Error = RasterError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(ScanType::empty(), |acc, name| {
            Ok(acc | ScanType::from_flag_name(name)?)
        })
    }
}

impl From<ScanType> for Vec<String> {
    fn from(scan_type: ScanType) -> Self {
        scan_type
            .flag_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bits_rejects_unknown_flags() {
        assert_eq!(ScanType::from_bits(63), Some(ScanType(63)));
        assert_eq!(ScanType::from_bits(64), None);
        assert_eq!(ScanType::from_bits(0), Some(ScanType::empty()));
    }

    #[test]
    fn test_parse_flag_names() {
        let parsed: ScanType = "snake|triangular".parse().unwrap();
        assert_eq!(parsed, ScanType::SNAKE | ScanType::TRIANGULAR);

        let parsed: ScanType = "vertical, flip_horizontal".parse().unwrap();
        assert_eq!(parsed, ScanType::VERTICAL | ScanType::FLIP_HORIZONTAL);

        let parsed: ScanType = "18".parse().unwrap();
        assert_eq!(parsed, ScanType::SNAKE | ScanType::BIDIRECTIONAL);

        assert_eq!("default".parse::<ScanType>().unwrap(), ScanType::empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "snake|spiral".parse::<ScanType>(),
            Err(RasterError::UnknownScanFlag("spiral".to_string()))
        );
        assert_eq!(
            "128".parse::<ScanType>(),
            Err(RasterError::InvalidScanType(128))
        );
    }

    #[test]
    fn test_display_round_trips() {
        let scan_type = ScanType::VERTICAL | ScanType::SNAKE | ScanType::BIDIRECTIONAL;
        assert_eq!(scan_type.to_string(), "vertical|snake|bidirectional");
        assert_eq!(scan_type.to_string().parse::<ScanType>().unwrap(), scan_type);
        assert_eq!(ScanType::empty().to_string(), "default");
    }

    #[test]
    fn test_insert_remove() {
        let mut scan_type = ScanType::empty();
        scan_type.insert(ScanType::SNAKE);
        scan_type |= ScanType::FLIP_VERTICAL;
        assert!(scan_type.contains(ScanType::SNAKE));
        scan_type.remove(ScanType::SNAKE);
        assert_eq!(scan_type, ScanType::FLIP_VERTICAL);
    }
}
