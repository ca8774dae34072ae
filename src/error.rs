use std::num::ParseIntError;

use thiserror::Error;

/// Failure of a whole parse. Nothing parsed before the failure is returned.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A hunk header matched the header shape but one of its numbers does
    /// not fit a line number (e.g. `@@ -99999999999 +1 @@`).
    #[error("invalid line number in hunk header on line {line_number}: {header:?}")]
    InvalidHunkNumber {
        /// 1-based physical line of the header in the input.
        line_number: usize,
        header: String,
        #[source]
        source: ParseIntError,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
