use serde::{Deserialize, Serialize};

/// One file touched by a patch.
///
/// Field names serialise in camelCase; this is the interchange shape the
/// renderers consume, so renaming a field is a breaking change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffFile {
    /// Set by a `diff ...` start line; turns off `---`/`+++` file splitting.
    #[serde(skip)]
    pub is_git_diff: bool,
    pub is_combined: bool,
    pub is_deleted: bool,
    pub is_new: bool,
    pub is_copy: bool,
    pub is_rename: bool,
    pub is_binary: bool,
    pub old_name: String,
    pub new_name: String,
    /// Bare extension of the last name seen, e.g. `rs`.
    pub language: String,
    pub unchanged_percentage: String,
    pub changed_percentage: String,
    pub checksum_before: String,
    pub checksum_after: String,
    pub mode: String,
    pub new_file_mode: String,
    pub deleted_file_mode: String,
    pub old_mode: String,
    pub new_mode: String,
    pub blocks: Vec<Block>,
    pub deleted_lines: usize,
    pub added_lines: usize,
}

/// A hunk: the `@@ ... @@` header and the lines under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub header: String,
    pub old_start_line: u32,
    /// Start on the second parent; only non-zero for combined diffs.
    pub old_start_line2: u32,
    pub new_start_line: u32,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    /// Raw line, diff marker included.
    pub content: String,
    #[serde(rename = "type")]
    pub line_type: LineType,
    /// 0 when the line does not exist on the old side.
    pub old_number: u32,
    /// 0 when the line does not exist on the new side.
    pub new_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Context,
    Insert,
    Delete,
}

/// Coarse classification used for tagging a file in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Deleted,
    Renamed,
    Changed,
}

impl FileStatus {
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Added => "ADDED",
            FileStatus::Deleted => "DELETED",
            FileStatus::Renamed => "RENAMED",
            FileStatus::Changed => "CHANGED",
        }
    }

    /// Single-letter form, as `git status --short` prints it.
    pub fn short(self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::Changed => 'M',
        }
    }
}

const UNKNOWN_PATH: &str = "unknown/file/path";

impl DiffFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hunk lines across all blocks.
    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|block| block.lines.len()).sum()
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn status(&self) -> FileStatus {
        if self.is_rename || self.is_copy {
            FileStatus::Renamed
        } else if self.is_new {
            FileStatus::Added
        } else if self.is_deleted {
            FileStatus::Deleted
        } else if self.new_name != self.old_name {
            FileStatus::Renamed
        } else {
            FileStatus::Changed
        }
    }

    /// Name to show for the file: `old → new` for a move, otherwise whichever
    /// side is a real path.
    pub fn display_name(&self) -> String {
        let old = unify_path(&self.old_name);
        let new = unify_path(&self.new_name);

        if !old.is_empty()
            && !new.is_empty()
            && old != new
            && !is_dev_null(&old)
            && !is_dev_null(&new)
        {
            format!("{old} → {new}")
        } else if !new.is_empty() && !is_dev_null(&new) {
            new
        } else if !old.is_empty() {
            old
        } else {
            UNKNOWN_PATH.to_string()
        }
    }
}

impl Block {
    pub fn new(header: &str, old_start_line: u32, old_start_line2: u32, new_start_line: u32) -> Self {
        Self {
            header: header.to_string(),
            old_start_line,
            old_start_line2,
            new_start_line,
            lines: Vec::new(),
        }
    }

    pub fn add_line(&mut self, line: DiffLine) {
        self.lines.push(line);
    }
}

impl DiffLine {
    pub fn new_insert(line: &str, new_number: u32) -> Self {
        Self {
            content: line.to_string(),
            line_type: LineType::Insert,
            old_number: 0,
            new_number,
        }
    }

    pub fn new_delete(line: &str, old_number: u32) -> Self {
        Self {
            content: line.to_string(),
            line_type: LineType::Delete,
            old_number,
            new_number: 0,
        }
    }

    pub fn new_context(line: &str, old_number: u32, new_number: u32) -> Self {
        Self {
            content: line.to_string(),
            line_type: LineType::Context,
            old_number,
            new_number,
        }
    }
}

fn unify_path(path: &str) -> String {
    path.replacen('\\', "/", 1)
}

fn is_dev_null(path: &str) -> bool {
    path.starts_with("dev/null") || path.starts_with("/dev/null")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(old: &str, new: &str) -> DiffFile {
        DiffFile {
            old_name: old.to_string(),
            new_name: new.to_string(),
            ..DiffFile::default()
        }
    }

    #[test]
    fn display_name_for_moved_file() {
        assert_eq!(named("sample", "sample2").display_name(), "sample → sample2");
    }

    #[test]
    fn display_name_skips_dev_null() {
        assert_eq!(named("/dev/null", "added.rs").display_name(), "added.rs");
        assert_eq!(named("gone.rs", "/dev/null").display_name(), "gone.rs");
        assert_eq!(named("", "").display_name(), "unknown/file/path");
    }

    #[test]
    fn display_name_normalises_backslash() {
        assert_eq!(named("src\\a.rs", "src\\a.rs").display_name(), "src/a.rs");
    }

    #[test]
    fn status_prefers_rename_over_new() {
        let mut file = named("a", "a");
        assert_eq!(file.status(), FileStatus::Changed);

        file.is_new = true;
        assert_eq!(file.status(), FileStatus::Added);

        file.is_rename = true;
        assert_eq!(file.status(), FileStatus::Renamed);
        assert_eq!(file.status().label(), "RENAMED");
    }

    #[test]
    fn line_type_serialises_lowercase() {
        let line = DiffLine::new_insert("+x", 3);
        let json = serde_json::to_value(&line).unwrap();

        assert_eq!(json["type"], "insert");
        assert_eq!(json["oldNumber"], 0);
        assert_eq!(json["newNumber"], 3);
        assert_eq!(json["content"], "+x");
    }
}
