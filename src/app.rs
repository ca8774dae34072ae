use anyhow::Result;
use log::info;
use patchview::{DiffFile, DiffParser, HighlightConfig, Row, side_by_side};
use ratatui::widgets::ListState;
use syntect::{
    highlighting::{Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
};

const THEME: &str = "base16-ocean.dark";

pub struct App {
    pub files: Vec<DiffFile>,
    pub selected_file: usize,
    pub file_list_state: ListState,
    pub scroll_offset: usize,
    pub show_side_by_side: bool,
    pub show_shortcuts: bool,
    pub highlight_config: HighlightConfig,
    /// Side-by-side rows of the selected file.
    rows: Vec<Row>,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl App {
    pub fn new(show_side_by_side: bool, highlight_config: HighlightConfig) -> Self {
        let mut state = ListState::default();
        state.select(Some(0));

        Self {
            files: Vec::new(),
            selected_file: 0,
            file_list_state: state,
            scroll_offset: 0,
            show_side_by_side,
            show_shortcuts: true,
            highlight_config,
            rows: Vec::new(),
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    pub fn load_diff(&mut self, parser: &DiffParser, diff_text: &str) -> Result<()> {
        self.files = parser.parse(diff_text)?;
        info!("loaded {} files", self.files.len());

        self.selected_file = 0;
        self.file_list_state.select(Some(0));
        self.select_file(0);

        Ok(())
    }

    pub fn selected(&self) -> Option<&DiffFile> {
        self.files.get(self.selected_file)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of scrollable lines in the active view.
    pub fn display_len(&self) -> usize {
        if self.show_side_by_side {
            self.rows.len()
        } else {
            self.selected()
                .map_or(0, |file| file.line_count() + file.blocks.len().max(1))
        }
    }

    fn select_file(&mut self, index: usize) {
        self.selected_file = index;
        self.file_list_state.select(Some(index));
        self.scroll_offset = 0;
        self.rows = self
            .files
            .get(index)
            .map(|file| side_by_side(file, &self.highlight_config))
            .unwrap_or_default();
    }

    pub fn next_file(&mut self) {
        if !self.files.is_empty() {
            self.select_file((self.selected_file + 1) % self.files.len());
        }
    }

    pub fn previous_file(&mut self) {
        if !self.files.is_empty() {
            let index = if self.selected_file == 0 {
                self.files.len() - 1
            } else {
                self.selected_file - 1
            };
            self.select_file(index);
        }
    }

    pub fn scroll_down(&mut self) {
        if self.scroll_offset + 1 < self.display_len() {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        if self.scroll_offset > 0 {
            self.scroll_offset -= 1;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.display_len().saturating_sub(1);
    }

    pub fn toggle_view_mode(&mut self, width: u16) {
        self.show_side_by_side = width >= 120 && !self.show_side_by_side;
        self.scroll_offset = 0;
    }

    pub fn toggle_shortcuts(&mut self) {
        self.show_shortcuts = !self.show_shortcuts;
    }

    /// Syntax for a file's extension, as recorded by the parser.
    pub fn get_syntax_for_file(&self, file: &DiffFile) -> Option<&SyntaxReference> {
        match file.language.as_str() {
            "" => None,
            // TypeScript isn't in default syntect, use JavaScript syntax
            "ts" | "tsx" | "jsx" => self
                .syntax_set
                .find_syntax_by_extension("js")
                .or_else(|| self.syntax_set.find_syntax_by_name("JavaScript")),
            "cc" | "cxx" => self.syntax_set.find_syntax_by_extension("cpp"),
            "hpp" => self.syntax_set.find_syntax_by_extension("h"),
            extension => self.syntax_set.find_syntax_by_extension(extension),
        }
    }

    pub fn get_theme(&self) -> &Theme {
        &self.theme_set.themes[THEME]
    }

    pub fn get_syntax_set(&self) -> &SyntaxSet {
        &self.syntax_set
    }
}
