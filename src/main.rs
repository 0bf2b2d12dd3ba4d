//! escscan
//!
//! Inspect the escape sequences in terminal output.

use std::{
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use escscan::{
    UnterminatedPolicy,
    app::App,
    config::Config,
    logging, scan_with, strip_ansi,
    utils::{describe_token, describe_unterminated},
};

#[derive(Parser, Debug)]
#[command(name = "escscan")]
#[command(version)]
#[command(about = "Split terminal output into text and escape sequences", long_about = None)]
struct CliArgs {
    /// Path to custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every token of FILE (or stdin)
    Scan {
        file: Option<PathBuf>,

        /// What to do with the ESC of an unterminated CSI/OSC (overrides config)
        #[arg(long, value_enum, value_name = "POLICY")]
        unterminated: Option<UnterminatedPolicy>,

        /// Print tokens as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print FILE (or stdin) with escape sequences and controls removed
    Strip { file: Option<PathBuf> },
    /// Run a shell on a PTY and inspect what it prints
    Shell {
        /// Shell command to run
        #[arg(short, long, value_name = "SHELL")]
        shell: Option<String>,

        #[arg(long, value_name = "COLS")]
        cols: Option<u16>,

        #[arg(long, value_name = "ROWS")]
        rows: Option<u16>,

        /// Working directory for the shell
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config_path = Config::locate(args.config.as_deref());
    let mut config = Config::resolve(config_path.as_deref())?;
    logging::init(if args.verbose {
        "debug"
    } else {
        config.log_level()
    });
    match &config_path {
        Some(path) => log::debug!("Using config {}: {config:?}", path.display()),
        None => log::debug!("No config file, using defaults"),
    }

    match args.command {
        Command::Scan {
            file,
            unterminated,
            json,
        } => {
            config.unterminated = unterminated.or(config.unterminated);
            let input = read_input(file.as_deref())?;
            let output = scan_with(&input, config.scan_options());

            let mut out = BufWriter::new(io::stdout().lock());
            if json {
                serde_json::to_writer_pretty(&mut out, &output)?;
                writeln!(out)?;
            } else {
                for token in &output.tokens {
                    writeln!(out, "{}", describe_token(token))?;
                }
            }
            out.flush()?;

            for fragment in &output.unterminated {
                log::warn!("{}", describe_unterminated(fragment));
            }
        }
        Command::Strip { file } => {
            let input = read_input(file.as_deref())?;
            let mut out = io::stdout().lock();
            write!(out, "{}", strip_ansi(&input))?;
            out.flush()?;
        }
        Command::Shell {
            shell,
            cols,
            rows,
            cwd,
        } => {
            config.shell = shell.or(config.shell);
            config.cols = cols.or(config.cols);
            config.rows = rows.or(config.rows);

            let mut app = App::new(&config, cwd.as_deref())?;
            app.run(io::stdin().lock(), io::stdout())?;
        }
    }

    Ok(())
}

/// Whole input as text; invalid UTF-8 is replaced.
fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    let bytes = match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .context("reading stdin")?;
            bytes
        }
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_policy(argv: &[&str]) -> Option<UnterminatedPolicy> {
        match CliArgs::try_parse_from(argv).unwrap().command {
            Command::Scan { unterminated, .. } => unterminated,
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_policy_accepts_both_values() {
        assert_eq!(
            scan_policy(&["escscan", "scan", "--unterminated", "drop"]),
            Some(UnterminatedPolicy::Drop)
        );
        assert_eq!(
            scan_policy(&["escscan", "scan", "--unterminated", "preserve-as-unknown"]),
            Some(UnterminatedPolicy::PreserveAsUnknown)
        );
        assert_eq!(scan_policy(&["escscan", "scan", "input.txt"]), None);
    }

    #[test]
    fn unterminated_policy_rejects_unknown_value() {
        assert!(CliArgs::try_parse_from(["escscan", "scan", "--unterminated", "keep"]).is_err());
    }

    #[test]
    fn cli_drop_overrides_preserving_config() {
        let mut config = Config::parse(r#"unterminated = "preserve-as-unknown""#).unwrap();
        let cli = scan_policy(&["escscan", "scan", "--unterminated", "drop"]);
        config.unterminated = cli.or(config.unterminated);
        assert_eq!(config.scan_options().unterminated, UnterminatedPolicy::Drop);
    }

    #[test]
    fn global_config_flag_is_located() {
        let args = CliArgs::try_parse_from(["escscan", "strip", "--config", "/tmp/x.toml"]).unwrap();
        assert_eq!(
            Config::locate(args.config.as_deref()),
            Some(PathBuf::from("/tmp/x.toml"))
        );
    }
}
