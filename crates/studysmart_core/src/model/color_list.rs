//! Persistence encoding for subject color lists.
//!
//! Colors are stored as comma-joined decimal ARGB integers. The empty list
//! is stored as the empty string.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// A token in a persisted color list is not a decimal `i32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorListParseError {
    pub token: String,
}

impl Display for ColorListParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid color token `{}`", self.token)
    }
}

impl Error for ColorListParseError {}

/// Serializes colors as `a,b,c`.
pub fn encode_color_list(colors: &[i32]) -> String {
    colors
        .iter()
        .map(|color| color.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses `a,b,c` back into colors.
///
/// Any token that is not a decimal integer fails the whole decode.
pub fn decode_color_list(value: &str) -> Result<Vec<i32>, ColorListParseError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }

    value
        .split(',')
        .map(|token| {
            token.parse::<i32>().map_err(|_| ColorListParseError {
                token: token.to_string(),
            })
        })
        .collect()
}
