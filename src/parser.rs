//! Single-pass patch parser.
//!
//! Accepts plain unified diffs, git extended diffs and combined (merge)
//! diffs, in any mix, and produces one [`DiffFile`] per file change. All
//! mutable state of a pass lives in a [`ParserState`] owned by that pass, so
//! independent parses never share anything.

use log::{debug, trace};

use crate::config::ParserConfig;
use crate::diff_file::{Block, DiffFile, DiffLine};
use crate::error::{ParseError, Result};
use crate::patterns::{
    HUNK_HEADER_PREFIX, HunkNumbers, Metadata, NEW_FILE_HEADER, NO_NEWLINE_MARKER,
    OLD_FILE_HEADER, patterns,
};

const BINARY_BLOCK_HEADER: &str = "Binary file";

const INSERT_MARKERS: &[&str] = &["+"];
const DELETE_MARKERS: &[&str] = &["-"];
const COMBINED_INSERT_MARKERS: &[&str] = &["+", " +"];
const COMBINED_DELETE_MARKERS: &[&str] = &["-", " -"];

/// Reusable front end holding a parser configuration.
///
/// Each call to [`DiffParser::parse`] runs on its own state, so one
/// `DiffParser` may be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct DiffParser {
    config: ParserConfig,
}

impl DiffParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse(&self, input: &str) -> Result<Vec<DiffFile>> {
        parse_diff(input, &self.config)
    }
}

/// Parses a complete patch text.
///
/// Either every file is returned or the first error is; a partially parsed
/// file list is never handed back.
pub fn parse_diff(input: &str, config: &ParserConfig) -> Result<Vec<DiffFile>> {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let mut state = ParserState::new(config);
    for idx in 0..lines.len() {
        state.process_line(&lines, idx)?;
    }

    Ok(state.finish())
}

struct ParserState<'c> {
    config: &'c ParserConfig,
    files: Vec<DiffFile>,
    current_file: Option<DiffFile>,
    current_block: Option<Block>,
    old_line: u32,
    old_line2: u32,
    new_line: u32,
    /// Names from the `diff --git` line, used only if the file headers
    /// never provide better ones.
    possible_old_name: String,
    possible_new_name: String,
}

impl<'c> ParserState<'c> {
    fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            files: Vec::new(),
            current_file: None,
            current_block: None,
            old_line: 0,
            old_line2: 0,
            new_line: 0,
            possible_old_name: String::new(),
            possible_new_name: String::new(),
        }
    }

    fn process_line(&mut self, lines: &[&str], idx: usize) -> Result<()> {
        let line = lines[idx];
        if line.is_empty() || line.starts_with('*') || line == NO_NEWLINE_MARKER {
            return Ok(());
        }

        let prev_line = idx.checked_sub(1).map_or("", |i| lines[i]);
        let next_line = lines.get(idx + 1).copied().unwrap_or("");
        let after_next_line = lines.get(idx + 2).copied().unwrap_or("");

        if line.starts_with("diff") {
            let file = self.start_file();
            file.is_git_diff = true;
            if let Some((old, new)) = patterns().git_diff_paths(line) {
                self.possible_old_name = patterns().clean_path(old, &self.config.src_prefix);
                self.possible_new_name = patterns().clean_path(new, &self.config.dst_prefix);
            }
            return Ok(());
        }

        let starts_unified_file = line.starts_with(OLD_FILE_HEADER)
            && next_line.starts_with(NEW_FILE_HEADER)
            && after_next_line.starts_with(HUNK_HEADER_PREFIX);
        let needs_file = match &self.current_file {
            None => true,
            Some(file) => !file.is_git_diff && starts_unified_file,
        };
        if needs_file {
            self.start_file();
        }

        let is_name_pair = (line.starts_with(OLD_FILE_HEADER)
            && next_line.starts_with(NEW_FILE_HEADER))
            || (line.starts_with(NEW_FILE_HEADER) && prev_line.starts_with(OLD_FILE_HEADER));
        if is_name_pair && self.set_file_name(line) {
            return Ok(());
        }

        let Some(file) = self.current_file.as_ref() else {
            return Ok(());
        };
        let implicit_block = file.is_git_diff
            && !file.old_name.is_empty()
            && !file.new_name.is_empty()
            && self.current_block.is_none();
        if line.starts_with(HUNK_HEADER_PREFIX) || implicit_block {
            return self.start_block(line, idx + 1);
        }

        if self.current_block.is_some()
            && (line.starts_with('+') || line.starts_with('-') || line.starts_with(' '))
        {
            self.create_line(line);
            return Ok(());
        }

        match patterns().classify(line) {
            Some(metadata) => self.apply_metadata(metadata, lines, idx),
            None => {
                trace!("ignoring unrecognised line {}: {line:?}", idx + 1);
                Ok(())
            }
        }
    }

    /// Takes the old or new name from a `---`/`+++` line. The first name
    /// seen wins; returns false when the line was not consumed.
    fn set_file_name(&mut self, line: &str) -> bool {
        let Some(file) = self.current_file.as_mut() else {
            return false;
        };

        if let Some(raw) = line.strip_prefix(OLD_FILE_HEADER) {
            let name = patterns().clean_path(raw, &self.config.src_prefix);
            if file.old_name.is_empty() && !name.is_empty() {
                file.language = extension_or(&name, &file.language);
                file.old_name = name;
                return true;
            }
        }

        if let Some(raw) = line.strip_prefix(NEW_FILE_HEADER) {
            let name = patterns().clean_path(raw, &self.config.dst_prefix);
            if file.new_name.is_empty() && !name.is_empty() {
                file.language = extension_or(&name, &file.language);
                file.new_name = name;
                return true;
            }
        }

        false
    }

    fn start_file(&mut self) -> &mut DiffFile {
        self.save_block();
        self.save_file();
        self.current_file.insert(DiffFile::new())
    }

    fn start_block(&mut self, header: &str, line_number: usize) -> Result<()> {
        self.save_block();
        let Some(file) = self.current_file.as_mut() else {
            return Ok(());
        };

        match patterns().hunk_numbers(header) {
            Some(HunkNumbers::Plain { old, new }) => {
                file.is_combined = false;
                self.old_line = parse_number(old, header, line_number)?;
                self.old_line2 = 0;
                self.new_line = parse_number(new, header, line_number)?;
            }
            Some(HunkNumbers::Combined { old, old2, new }) => {
                file.is_combined = true;
                self.old_line = parse_number(old, header, line_number)?;
                self.old_line2 = parse_number(old2, header, line_number)?;
                self.new_line = parse_number(new, header, line_number)?;
            }
            None => {
                file.is_combined = false;
                self.old_line = 0;
                self.old_line2 = 0;
                self.new_line = 0;
            }
        }

        self.current_block = Some(Block::new(
            header,
            self.old_line,
            self.old_line2,
            self.new_line,
        ));
        Ok(())
    }

    fn create_line(&mut self, line: &str) {
        let (Some(file), Some(block)) = (self.current_file.as_mut(), self.current_block.as_mut())
        else {
            return;
        };

        let (insert_markers, delete_markers) = if file.is_combined {
            (COMBINED_INSERT_MARKERS, COMBINED_DELETE_MARKERS)
        } else {
            (INSERT_MARKERS, DELETE_MARKERS)
        };
        let matching = self.config.prefix_matching;

        if matching.matches(line, insert_markers) {
            file.added_lines += 1;
            block.add_line(DiffLine::new_insert(line, self.new_line));
            self.new_line = self.new_line.saturating_add(1);
        } else if matching.matches(line, delete_markers) {
            file.deleted_lines += 1;
            block.add_line(DiffLine::new_delete(line, self.old_line));
            self.old_line = self.old_line.saturating_add(1);
        } else {
            block.add_line(DiffLine::new_context(line, self.old_line, self.new_line));
            self.old_line = self.old_line.saturating_add(1);
            self.new_line = self.new_line.saturating_add(1);
        }
    }

    fn apply_metadata(&mut self, metadata: Metadata<'_>, lines: &[&str], idx: usize) -> Result<()> {
        let Some(file) = self.current_file.as_mut() else {
            return Ok(());
        };

        match metadata {
            Metadata::OldMode(mode) => file.old_mode = mode.to_string(),
            Metadata::NewMode(mode) => file.new_mode = mode.to_string(),
            Metadata::DeletedFileMode(mode) => {
                file.deleted_file_mode = mode.to_string();
                file.is_deleted = true;
            }
            Metadata::CombinedDeletedFileMode { parent1, parent2 } => {
                file.deleted_file_mode = format!("{parent1},{parent2}");
                file.is_deleted = true;
            }
            Metadata::NewFileMode(mode) => {
                file.new_file_mode = mode.to_string();
                file.is_new = true;
            }
            Metadata::CopyFrom(path) => {
                if !has_hunk_ahead(lines, idx) {
                    file.old_name = path.to_string();
                }
                file.is_copy = true;
            }
            Metadata::CopyTo(path) => {
                if !has_hunk_ahead(lines, idx) {
                    file.new_name = path.to_string();
                }
                file.is_copy = true;
            }
            Metadata::RenameFrom(path) => {
                if !has_hunk_ahead(lines, idx) {
                    file.old_name = path.to_string();
                }
                file.is_rename = true;
            }
            Metadata::RenameTo(path) => {
                if !has_hunk_ahead(lines, idx) {
                    file.new_name = path.to_string();
                }
                file.is_rename = true;
            }
            Metadata::BinaryFiles { old, new } => {
                file.is_binary = true;
                file.old_name = patterns().clean_path(old, &self.config.src_prefix);
                file.new_name = patterns().clean_path(new, &self.config.dst_prefix);
                return self.start_block(BINARY_BLOCK_HEADER, idx + 1);
            }
            Metadata::BinaryPatch => {
                file.is_binary = true;
                return self.start_block(lines[idx], idx + 1);
            }
            Metadata::SimilarityIndex(percent) => file.unchanged_percentage = percent.to_string(),
            Metadata::DissimilarityIndex(percent) => file.changed_percentage = percent.to_string(),
            Metadata::Index {
                before,
                after,
                mode,
            } => {
                file.checksum_before = before.to_string();
                file.checksum_after = after.to_string();
                if let Some(mode) = mode {
                    file.mode = mode.to_string();
                }
            }
            Metadata::CombinedIndex {
                parent1,
                parent2,
                result,
            } => {
                file.checksum_before = format!("{parent1},{parent2}");
                file.checksum_after = result.to_string();
            }
            Metadata::CombinedMode {
                parent1,
                parent2,
                result,
            } => {
                file.old_mode = format!("{parent1},{parent2}");
                file.new_mode = result.to_string();
            }
        }

        Ok(())
    }

    fn save_block(&mut self) {
        if let Some(block) = self.current_block.take() {
            match self.current_file.as_mut() {
                Some(file) => file.add_block(block),
                None => debug!("dropping block {:?} with no open file", block.header),
            }
        }
    }

    fn save_file(&mut self) {
        if let Some(mut file) = self.current_file.take() {
            if file.old_name.is_empty() {
                file.old_name = std::mem::take(&mut self.possible_old_name);
            }
            if file.new_name.is_empty() {
                file.new_name = std::mem::take(&mut self.possible_new_name);
            }
            if file.language.is_empty() {
                file.language = extension_or(&file.new_name, "");
            }

            if file.new_name.is_empty() {
                debug!("dropping file without a name ({} blocks)", file.blocks.len());
            } else {
                debug!(
                    "parsed {}: {} blocks, +{} -{}",
                    file.new_name,
                    file.blocks.len(),
                    file.added_lines,
                    file.deleted_lines
                );
                self.files.push(file);
            }
        }

        self.possible_old_name.clear();
        self.possible_new_name.clear();
    }

    fn finish(mut self) -> Vec<DiffFile> {
        self.save_block();
        self.save_file();
        self.files
    }
}

fn parse_number(value: &str, header: &str, line_number: usize) -> Result<u32> {
    value
        .parse()
        .map_err(|source| ParseError::InvalidHunkNumber {
            line_number,
            header: header.to_string(),
            source,
        })
}

/// Whether a `---`/`+++`/`@@` triple follows before the next file starts.
fn has_hunk_ahead(lines: &[&str], idx: usize) -> bool {
    lines[idx..]
        .windows(3)
        .take_while(|window| !window[0].starts_with("diff"))
        .any(|window| {
            window[0].starts_with(OLD_FILE_HEADER)
                && window[1].starts_with(NEW_FILE_HEADER)
                && window[2].starts_with(HUNK_HEADER_PREFIX)
        })
}

/// Last dot-separated segment of `name`, or `fallback` when there is none.
fn extension_or(name: &str, fallback: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, extension)) => extension.to_string(),
        None => fallback.to_string(),
    }
}
