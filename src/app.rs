use std::{
    collections::BTreeMap,
    io::{BufRead, Write},
    path::Path,
    time::Duration,
};

use anyhow::Context;

use crate::{
    config::Config,
    parser::{ScanOptions, scan_with},
    session::{MAX_READ, PtySession},
    strip::strip_ansi,
    utils::{describe_unterminated, escape_for_display},
};

const INITIAL_READ: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Quit,
    Status,
    /// `None` when the size could not be parsed
    Resize(Option<(u16, u16)>),
}

impl MetaCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            ":quit" | ":q" => Some(MetaCommand::Quit),
            ":status" | ":s" => Some(MetaCommand::Status),
            other => other
                .strip_prefix(":resize")
                .map(|size| MetaCommand::Resize(parse_size(size.trim()))),
        }
    }
}

/// `COLSxROWS`, both non-zero.
fn parse_size(size: &str) -> Option<(u16, u16)> {
    let (cols, rows) = size.split_once(['x', 'X'])?;
    let cols: u16 = cols.trim().parse().ok()?;
    let rows: u16 = rows.trim().parse().ok()?;
    (cols > 0 && rows > 0).then_some((cols, rows))
}

/// Interactive loop: every line typed is sent to the shell and the reply is
/// shown raw, as tokens, and stripped.
pub struct App {
    session: PtySession,
    options: ScanOptions,
    read_timeout: Duration,
}

impl App {
    pub fn new(config: &Config, cwd: Option<&Path>) -> anyhow::Result<Self> {
        let (cols, rows) = config.size();
        let session = PtySession::start(config.shell(), cols, rows, cwd)?;
        Ok(Self {
            session,
            options: config.scan_options(),
            read_timeout: config.read_timeout(),
        })
    }

    pub fn run(&mut self, input: impl BufRead, mut out: impl Write) -> anyhow::Result<()> {
        writeln!(out, "Session started (pid {:?})", self.session.pid())?;

        let initial = self.session.read(INITIAL_READ, Some(self.read_timeout));
        if !initial.is_empty() {
            writeln!(out, "--- initial output ({} bytes) ---", initial.len())?;
            writeln!(out, "{}", strip_ansi(&String::from_utf8_lossy(&initial)))?;
            writeln!(out, "--- end initial ---")?;
        }

        let mut lines = input.lines();
        loop {
            write!(out, "pty> ")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            let line = line.context("reading command")?;

            if let Some(command) = MetaCommand::parse(&line) {
                if !self.handle_meta(command, &mut out)? {
                    break;
                }
                continue;
            }

            if !self.session.check_running() {
                writeln!(out, "  session is not running")?;
                break;
            }

            let written = self.session.write(format!("{line}\n").as_bytes())?;
            writeln!(out, "  -> wrote {written} bytes")?;

            let output = self.session.read(MAX_READ, Some(self.read_timeout));
            if output.is_empty() {
                writeln!(out, "  <- (no output)")?;
            } else {
                writeln!(out, "  <- read {} bytes", output.len())?;
                self.show_output(&String::from_utf8_lossy(&output), &mut out)?;
            }
        }

        writeln!(out, "Closing session...")?;
        self.session.close();
        Ok(())
    }

    /// Returns false when the loop should stop.
    fn handle_meta(&mut self, command: MetaCommand, out: &mut impl Write) -> anyhow::Result<bool> {
        match command {
            MetaCommand::Quit => return Ok(false),
            MetaCommand::Status => {
                let running = self.session.check_running();
                let (cols, rows) = self.session.size();
                writeln!(
                    out,
                    "  pid: {:?}  running: {}  exit code: {:?}  size: {cols}x{rows}  cwd: {}",
                    self.session.pid(),
                    if running { "yes" } else { "no" },
                    self.session.exit_code(),
                    self.session.current_dir().as_deref().unwrap_or("?"),
                )?;
            }
            MetaCommand::Resize(Some((cols, rows))) => {
                let result = self.session.resize(cols, rows);
                let status = if result.is_ok() { "ok" } else { "failed" };
                writeln!(out, "  resize {cols}x{rows}: {status}")?;
            }
            MetaCommand::Resize(None) => {
                writeln!(out, "  usage: :resize COLSxROWS  (e.g. :resize 120x40)")?;
            }
        }
        Ok(true)
    }

    fn show_output(&self, text: &str, out: &mut impl Write) -> anyhow::Result<()> {
        let scanned = scan_with(text, self.options);

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for token in &scanned.tokens {
            *counts.entry(token.kind()).or_default() += 1;
        }
        let summary: Vec<String> = counts
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();

        writeln!(out, "  --- raw ---")?;
        writeln!(out, "{}", escape_for_display(text))?;
        writeln!(out, "  --- tokens: {} ---", summary.join(" "))?;
        for fragment in &scanned.unterminated {
            writeln!(out, "  {}", describe_unterminated(fragment))?;
        }
        writeln!(out, "  --- clean ---")?;
        writeln!(out, "{}", strip_ansi(text))?;
        writeln!(out, "  --- end ---")?;
        Ok(())
    }
}
