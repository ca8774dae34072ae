//! Parse patches into a file/block/line model and lay them out side by side.
//!
//! ```
//! use patchview::{HighlightConfig, ParserConfig, parse_diff, side_by_side};
//!
//! let patch = "--- a/sample.js\n+++ b/sample.js\n@@ -1 +1,2 @@\n-test\n+test1r\n+test2r\n";
//! let files = parse_diff(patch, &ParserConfig::default()).unwrap();
//! let rows = side_by_side(&files[0], &HighlightConfig::default());
//!
//! // header row, one paired row, one insertion opposite a blank cell
//! assert_eq!(rows.len(), 3);
//! assert_eq!(rows[1].new.line.markup(), "test<ins>1r</ins>");
//! ```

pub mod config;
pub mod diff_file;
pub mod error;
pub mod highlight;
pub mod parser;
pub mod patterns;
pub mod side_by_side;


pub use config::{Granularity, HighlightConfig, ParserConfig, PrefixMatching};
pub use diff_file::{Block, DiffFile, DiffLine, FileStatus, LineType};
pub use error::ParseError;
pub use highlight::{Highlight, HighlightedLine, Segment, SegmentKind, diff_highlight};
pub use parser::{DiffParser, parse_diff};
pub use side_by_side::{Cell, CellKind, ChangeRun, Row, align_block, side_by_side};
