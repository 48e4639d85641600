//! CLI definitions using clap.
//!
//! The target command goes after `--`; its pieces are joined with single
//! spaces and handed to the root interpreter as one argument.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Repeatedly run a command (usually a test) to check for flakiness
#[derive(Parser, Debug)]
#[command(name = "flakr")]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "flakr [OPTIONS] -- <COMMAND>...")]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How long to run the command for. This is the minimum run time:
    /// invocations still in flight when it elapses are allowed to finish
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Duration,

    /// Number of concurrent runs of the command
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// How frequently to refresh the output, e.g. '1m', '30s', '500ms'
    #[arg(short, long, value_parser = parse_duration)]
    pub refresh: Option<Duration>,

    /// File to write results to, one JSON object per line
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Root command the target is passed to, enabling piping and
    /// redirection. Repeat the flag for each piece, e.g.
    /// `--root-command sh --root-command -c`
    #[arg(long, allow_hyphen_values = true)]
    pub root_command: Option<Vec<String>>,

    /// Stop the whole run as soon as one invocation fails
    #[arg(short, long)]
    pub stop_on_failure: bool,

    /// The command to run, after --
    #[arg(last = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// The target command line: positional pieces joined with single spaces.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Parse a human-readable duration string (e.g. "30s", "500ms", "5m", "1h").
/// A bare number is seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let (number, suffix) = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&input[..i], &input[i..]))
        .unwrap_or((input, ""));

    let n: u64 = number
        .parse()
        .map_err(|_| format!("invalid number in duration: {input}"))?;

    let duration = match suffix {
        "ms" => Duration::from_millis(n),
        "" | "s" => Duration::from_secs(n),
        "m" => Duration::from_secs(n * 60),
        "h" => Duration::from_secs(n * 3600),
        other => return Err(format!("unknown duration suffix '{other}' in: {input}")),
    };

    if duration.is_zero() {
        return Err(format!("duration must be > 0: {input}"));
    }
    Ok(duration)
}
