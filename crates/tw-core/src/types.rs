//! Common data types for tagweight

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Flavour category of a physics object.
///
/// Derived from the generator-level hadron flavour code; never stored on the
/// object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Bottom
    B,
    /// Charm (also used for hadronic taus)
    C,
    /// Light quarks and gluons
    Udsg,
}

impl Category {
    /// All categories in calibration-file order.
    pub const ALL: [Category; 3] = [Category::B, Category::C, Category::Udsg];

    /// Classify an integer hadron flavour code.
    ///
    /// `5` is bottom, `4` is charm and `15` (tau) borrows the charm
    /// calibration. Everything else is light.
    pub fn from_flavour(code: i32) -> Self {
        match code {
            5 => Category::B,
            4 | 15 => Category::C,
            _ => Category::Udsg,
        }
    }

    /// Category from the `jetFlavor` column of a calibration file.
    pub fn from_file_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Category::B),
            1 => Some(Category::C),
            2 => Some(Category::Udsg),
            _ => None,
        }
    }

    /// Index used by the `jetFlavor` column of a calibration file.
    pub fn file_index(self) -> u8 {
        match self {
            Category::B => 0,
            Category::C => 1,
            Category::Udsg => 2,
        }
    }

    /// Heavy-flavour categories select rows by the heavy measurement type.
    pub fn is_heavy(self) -> bool {
        matches!(self, Category::B | Category::C)
    }

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::B => "b",
            Category::C => "c",
            Category::Udsg => "udsg",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Systematic variation of a calibration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variation {
    /// Nominal measurement
    Central,
    /// +1σ
    Up,
    /// −1σ
    Down,
}

impl Variation {
    /// All variations.
    pub const ALL: [Variation; 3] = [Variation::Central, Variation::Up, Variation::Down];

    /// Value of the `sysType` column selecting this variation.
    pub fn as_str(self) -> &'static str {
        match self {
            Variation::Central => "central",
            Variation::Up => "up",
            Variation::Down => "down",
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "central" => Ok(Variation::Central),
            "up" => Ok(Variation::Up),
            "down" => Ok(Variation::Down),
            other => Err(Error::Configuration(format!("unknown variation: {other}"))),
        }
    }
}

/// Tagger operating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingPoint {
    /// Loose working point
    Loose,
    /// Medium working point
    Medium,
    /// Tight working point
    Tight,
    /// Discriminant reshaping (binned in the tagger output)
    Reshaping,
}

impl OperatingPoint {
    /// Operating point from the `OperatingPoint` column of a calibration file.
    pub fn from_file_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(OperatingPoint::Loose),
            1 => Some(OperatingPoint::Medium),
            2 => Some(OperatingPoint::Tight),
            3 => Some(OperatingPoint::Reshaping),
            _ => None,
        }
    }

    /// Index used by the `OperatingPoint` column of a calibration file.
    pub fn file_index(self) -> u8 {
        match self {
            OperatingPoint::Loose => 0,
            OperatingPoint::Medium => 1,
            OperatingPoint::Tight => 2,
            OperatingPoint::Reshaping => 3,
        }
    }

    /// Working-point name as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            OperatingPoint::Loose => "Loose",
            OperatingPoint::Medium => "Medium",
            OperatingPoint::Tight => "Tight",
            OperatingPoint::Reshaping => "Reshaping",
        }
    }

    /// Reshaping entries are binned and evaluated in the discriminant.
    pub fn uses_discriminant(self) -> bool {
        self == OperatingPoint::Reshaping
    }
}

impl fmt::Display for OperatingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Loose" => Ok(OperatingPoint::Loose),
            "Medium" => Ok(OperatingPoint::Medium),
            "Tight" => Ok(OperatingPoint::Tight),
            "Reshaping" => Ok(OperatingPoint::Reshaping),
            other => Err(Error::Configuration(format!("unknown working point: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavour_classification() {
        assert_eq!(Category::from_flavour(5), Category::B);
        assert_eq!(Category::from_flavour(4), Category::C);
        assert_eq!(Category::from_flavour(15), Category::C);
        for code in [-5, -1, 0, 1, 2, 3, 6, 14, 16, 21, i32::MAX, i32::MIN] {
            assert_eq!(Category::from_flavour(code), Category::Udsg, "code {code}");
        }
    }

    #[test]
    fn test_file_index_roundtrip() {
        for c in Category::ALL {
            assert_eq!(Category::from_file_index(c.file_index()), Some(c));
        }
        assert_eq!(Category::from_file_index(3), None);
        assert_eq!(OperatingPoint::from_file_index(4), None);
    }

    #[test]
    fn test_heavy() {
        assert!(Category::B.is_heavy());
        assert!(Category::C.is_heavy());
        assert!(!Category::Udsg.is_heavy());
    }

    #[test]
    fn test_working_point_names() {
        assert_eq!("Medium".parse::<OperatingPoint>().unwrap(), OperatingPoint::Medium);
        assert_eq!("Reshaping".parse::<OperatingPoint>().unwrap(), OperatingPoint::Reshaping);
        let err = "medium".parse::<OperatingPoint>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!("Ultra".parse::<OperatingPoint>().is_err());
    }

    #[test]
    fn test_variation_names() {
        for v in Variation::ALL {
            assert_eq!(v.as_str().parse::<Variation>().unwrap(), v);
        }
        assert!("up_jes".parse::<Variation>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Category::Udsg).unwrap();
        assert_eq!(json, "\"udsg\"");
        let v: Variation = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(v, Variation::Down);
    }
}
