use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::{Env, Target};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info};
use patchview::{DiffParser, Granularity, HighlightConfig, ParserConfig, PrefixMatching};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::{app::App, ui::render_ui::ui};

mod app;
mod ui;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Git diff arguments (e.g., "HEAD~1", "main..feature")
    #[arg(default_value = "")]
    diff_args: String,

    /// Read the patch from a file instead of running git
    #[arg(short, long, conflicts_with = "stdin")]
    file: Option<PathBuf>,

    /// Read the patch from standard input
    #[arg(long)]
    stdin: bool,

    /// Print the parsed files as JSON and exit
    #[arg(long)]
    json: bool,

    /// Start in side-by-side view
    #[arg(short, long)]
    side_by_side: bool,

    /// Extra prefix to strip from old-side paths
    #[arg(long, default_value = "")]
    src_prefix: String,

    /// Extra prefix to strip from new-side paths
    #[arg(long, default_value = "")]
    dst_prefix: String,

    /// Only test the first marker candidate when classifying combined-diff lines
    #[arg(long)]
    legacy_prefix_match: bool,

    /// Highlight changed words instead of changed characters
    #[arg(long)]
    word_diff: bool,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            src_prefix: self.src_prefix.clone(),
            dst_prefix: self.dst_prefix.clone(),
            prefix_matching: if self.legacy_prefix_match {
                PrefixMatching::FirstCandidateOnly
            } else {
                PrefixMatching::AllCandidates
            },
        }
    }

    fn highlight_config(&self) -> HighlightConfig {
        HighlightConfig {
            granularity: if self.word_diff {
                Granularity::Words
            } else {
                Granularity::Chars
            },
        }
    }

    fn read_patch(&self) -> Result<String> {
        if let Some(path) = &self.file {
            return fs::read_to_string(path)
                .with_context(|| format!("failed to read patch from {}", path.display()));
        }

        if self.stdin {
            let mut patch = String::new();
            io::stdin()
                .read_to_string(&mut patch)
                .context("failed to read patch from stdin")?;
            return Ok(patch);
        }

        git_diff(&self.diff_args)
    }
}

fn git_diff(args: &str) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.arg("diff");

    if !args.is_empty() {
        for arg in args.split_whitespace() {
            cmd.arg(arg);
        }
    }

    debug!("running {cmd:?}");
    let output = cmd.output().context("failed to run git diff")?;
    if !output.status.success() {
        bail!(
            "git diff failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, &app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('j') => app.next_file(),
                KeyCode::Char('k') => app.previous_file(),
                KeyCode::Down => app.scroll_down(),
                KeyCode::Up => app.scroll_up(),
                KeyCode::Char('d') | KeyCode::PageDown => {
                    for _ in 0..10 {
                        app.scroll_down();
                    }
                }
                KeyCode::Char('u') | KeyCode::PageUp => {
                    for _ in 0..10 {
                        app.scroll_up();
                    }
                }
                KeyCode::Char('s') => {
                    let width = terminal.size()?.width;
                    app.toggle_view_mode(width);
                }
                KeyCode::Char('?') => app.toggle_shortcuts(),
                KeyCode::Char('g') => app.scroll_offset = 0,
                KeyCode::Char('G') => app.scroll_to_bottom(),
                _ => {}
            }
        }
    }
}

/// Holds log output while the alternate screen owns the terminal.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn drain_to(&self, out: &mut impl Write) -> io::Result<()> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?;
        out.write_all(&bytes)?;
        bytes.clear();
        Ok(())
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Logs go to `--log-file` when given, straight to stderr for `--json`, and
/// into a buffer otherwise; the buffer is written out once the terminal is
/// restored.
fn init_logging(args: &Args) -> Result<Option<LogBuffer>> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));

    let buffer = if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
        None
    } else if args.json {
        None
    } else {
        let buffer = LogBuffer::default();
        builder.target(Target::Pipe(Box::new(buffer.clone())));
        Some(buffer)
    };

    builder.init();
    Ok(buffer)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let logs = init_logging(&args)?;

    let result = run(&args);

    if let Some(logs) = logs {
        logs.drain_to(&mut io::stderr())?;
    }
    result
}

fn run(args: &Args) -> Result<()> {
    let parser = DiffParser::new(args.parser_config());
    debug!("parser config: {:?}", parser.config());
    let patch = args.read_patch()?;
    info!("read {} bytes of patch text", patch.len());

    if args.json {
        let files = parser.parse(&patch)?;
        serde_json::to_writer_pretty(io::stdout().lock(), &files)?;
        println!();
        return Ok(());
    }

    let mut app = App::new(args.side_by_side, args.highlight_config());
    app.load_diff(&parser, &patch)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::LogBuffer;

    #[test]
    fn log_buffer_holds_output_until_drained() {
        let buffer = LogBuffer::default();
        let mut writer = buffer.clone();
        writer.write_all(b"WARN first\n").unwrap();
        writer.write_all(b"DEBUG second\n").unwrap();

        let mut out = Vec::new();
        buffer.drain_to(&mut out).unwrap();
        assert_eq!(out, b"WARN first\nDEBUG second\n");

        let mut again = Vec::new();
        buffer.drain_to(&mut again).unwrap();
        assert!(again.is_empty());
    }
}
