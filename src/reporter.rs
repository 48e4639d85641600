//! Reporter: periodic console progress line.
//!
//! On every tick the reporter takes a statistics snapshot and rewrites a
//! single progress line in place. It is a pure observer — it never touches
//! the results pipeline. On shutdown it renders one final line, terminated
//! with a newline, computed after all statistics are final.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use colored::Colorize;
use crossterm::{
    cursor::MoveToColumn,
    execute,
    terminal::{Clear, ClearType},
};

use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::stats::{RunStats, Snapshot};

/// Lifecycle-managed periodic progress reporter.
pub struct Reporter {
    stats: Arc<RunStats>,
    tick: Duration,
    lifecycle: Lifecycle,
}

impl Reporter {
    pub fn new(stats: Arc<RunStats>, tick: Duration) -> Self {
        Self {
            stats,
            tick,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Start ticking. The first line appears one tick interval after start.
    pub fn start(&mut self) {
        let stats = self.stats.clone();
        let tick = self.tick;
        let mut shutdown = self.lifecycle.shutdown();

        self.lifecycle.start(async move {
            let start = Instant::now();
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            loop {
                tokio::select! {
                    _ = shutdown.signalled() => break,
                    _ = ticker.tick() => {
                        print_progress(&stats.snapshot(), start.elapsed());
                    }
                }
            }
            print_final(&stats.snapshot(), start.elapsed());
        });
    }

    /// Signal the reporter to stop; it prints the final line before exiting.
    pub async fn close(&mut self) {
        self.lifecycle.close().await;
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}

/// Render the progress line for a snapshot at a given elapsed time.
pub fn render_line(snapshot: &Snapshot, elapsed: Duration, now: DateTime<Local>) -> String {
    let percent = match snapshot.percent_successful() {
        Some(pct) => format!("{pct:5.2}% success"),
        None => "<no runs>".to_string(),
    };
    format!(
        "{} | {:>6} | Runs: {} ({}:{}) ({})",
        now.format("%Y-%m-%d %H:%M:%S"),
        format_elapsed(elapsed),
        snapshot.runs,
        snapshot.successful.to_string().green(),
        snapshot.failed.to_string().red(),
        percent,
    )
}

/// Format elapsed wall-clock time as `MMmSSs.mmm`, with an hours prefix once
/// the run passes the hour mark.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours == 0 {
        format!("{minutes:2}m{secs:2}s.{ms:03}")
    } else {
        format!("{hours}h{minutes:2}m{secs:2}s.{ms:03}")
    }
}

fn print_progress(snapshot: &Snapshot, elapsed: Duration) {
    let mut stdout = std::io::stdout();
    let _ = execute!(stdout, Clear(ClearType::CurrentLine), MoveToColumn(0));
    print!("{}", render_line(snapshot, elapsed, Local::now()));
    let _ = stdout.flush();
}

fn print_final(snapshot: &Snapshot, elapsed: Duration) {
    print_progress(snapshot, elapsed);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(runs: u64, successful: u64) -> Snapshot {
        Snapshot {
            runs,
            successful,
            failed: runs - successful,
            compute_time: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_format_elapsed_under_an_hour() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), " 0m 0s.000");
        assert_eq!(format_elapsed(Duration::from_millis(1_234)), " 0m 1s.234");
        assert_eq!(format_elapsed(Duration::from_secs(754)), "12m34s.000");
    }

    #[test]
    fn test_format_elapsed_over_an_hour() {
        assert_eq!(format_elapsed(Duration::from_secs(3_600)), "1h 0m 0s.000");
        assert_eq!(
            format_elapsed(Duration::from_secs(2 * 3600 + 5 * 60 + 6)),
            "2h 5m 6s.000"
        );
    }

    #[test]
    fn test_render_line_no_runs() {
        colored::control::set_override(false);
        let line = render_line(&snapshot(0, 0), Duration::from_secs(1), Local::now());
        assert!(line.contains("Runs: 0"));
        assert!(line.contains("<no runs>"));
        assert!(!line.contains("% success"));
    }

    #[test]
    fn test_render_line_with_runs() {
        colored::control::set_override(false);
        let line = render_line(&snapshot(4, 3), Duration::from_secs(2), Local::now());
        assert!(line.contains("Runs: 4 (3:1)"));
        assert!(line.contains("75.00% success"));
    }

    #[test]
    fn test_render_line_shape() {
        colored::control::set_override(false);
        let line = render_line(&snapshot(1, 1), Duration::from_millis(1500), Local::now());
        let parts: Vec<&str> = line.split(" | ").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].trim(), "0m 1s.500");
        assert!(parts[2].starts_with("Runs: 1"));
    }

    #[tokio::test]
    async fn test_reporter_lifecycle() {
        let stats = Arc::new(RunStats::new());
        let mut reporter = Reporter::new(stats, Duration::from_millis(10));
        assert_eq!(reporter.state(), LifecycleState::Created);

        reporter.start();
        assert_eq!(reporter.state(), LifecycleState::Running);

        tokio::time::sleep(Duration::from_millis(30)).await;
        reporter.close().await;
        assert_eq!(reporter.state(), LifecycleState::Stopped);
    }
}
