//! Enumerated request options
//!
//! Each option is a closed set. Parsing a string outside the set fails with
//! [`Error::InvalidOption`] before anything is sent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How input data should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    /// Values are stored verbatim
    Raw,
    /// Values are parsed as if typed into the UI (numbers, dates, formulas)
    #[default]
    UserEntered,
}

/// How existing data is treated when appending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertDataOption {
    /// New rows are inserted, shifting existing rows down
    #[default]
    InsertRows,
    /// New data overwrites whatever is in the way
    Overwrite,
}

/// Which axis the outer list of a value grid runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MajorDimension {
    #[default]
    Rows,
    Columns,
}

macro_rules! closed_set {
    ($ty:ident, $kind:literal, [$($variant:ident => $text:literal),+ $(,)?]) => {
        impl $ty {
            /// Wire spelling
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }

            /// Every legal value
            pub fn all() -> &'static [$ty] {
                &[$($ty::$variant),+]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(Error::InvalidOption {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_set!(ValueInputOption, "value input", [Raw => "RAW", UserEntered => "USER_ENTERED"]);
closed_set!(InsertDataOption, "insert data", [InsertRows => "INSERT_ROWS", Overwrite => "OVERWRITE"]);
closed_set!(MajorDimension, "major dimension", [Rows => "ROWS", Columns => "COLUMNS"]);

impl MajorDimension {
    /// Row and column counts of a value grid laid out along this dimension
    pub fn extent_of<T>(&self, values: &[Vec<T>]) -> (u32, u32) {
        let outer = values.len() as u32;
        let inner = values.iter().map(Vec::len).max().unwrap_or(0) as u32;
        match self {
            MajorDimension::Rows => (outer, inner),
            MajorDimension::Columns => (inner, outer),
        }
    }
}
