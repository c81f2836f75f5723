//! Runtime options derived from the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;

/// Polling faster than this hammers drbdsetup for no benefit.
pub const MIN_INTERVAL: Duration = Duration::from_millis(400);

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Which renderer drives the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TuiMode {
    /// Redraw in place each refresh.
    Interactive,
    /// Append frames without clearing the screen.
    Ugly,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Replay events from this file instead of polling drbdsetup.
    pub file: Option<PathBuf>,
    /// Poll cadence; zero in file mode, which also disables pruning.
    pub interval: Duration,
    pub tui: TuiMode,
    /// Skip confirmation prompts for dangerous commands.
    pub expert: bool,
}

impl Config {
    /// Resolve raw flag values into a runnable configuration.
    ///
    /// Invalid values never abort: an unparsable interval falls back to
    /// the default and one below the floor is clamped, each with an
    /// error report for the display's error footer.
    pub fn resolve(
        file: Option<PathBuf>,
        interval: &str,
        tui: TuiMode,
        expert: bool,
    ) -> (Config, Vec<anyhow::Error>) {
        let mut reports = Vec::new();

        let mut interval = match humantime::parse_duration(interval) {
            Ok(d) => d,
            Err(e) => {
                reports.push(anyhow!(
                    "defaulting to {}s polling interval: {e}",
                    DEFAULT_INTERVAL.as_secs()
                ));
                DEFAULT_INTERVAL
            }
        };

        if interval < MIN_INTERVAL {
            reports.push(anyhow!(
                "interval {interval:?} is too quick, switching to {}ms minimum polling interval",
                MIN_INTERVAL.as_millis()
            ));
            interval = MIN_INTERVAL;
        }

        // File replay carries its own timestamps; pruning against the
        // wall clock would erase everything.
        if file.is_some() {
            interval = Duration::ZERO;
        }

        (
            Config {
                file,
                interval,
                tui,
                expert,
            },
            reports,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        let (cfg, reports) = Config::resolve(None, "1s", TuiMode::Interactive, false);
        assert_eq!(cfg.interval, Duration::from_secs(1));
        assert!(reports.is_empty());
    }

    #[test]
    fn test_unparsable_interval_falls_back() {
        let (cfg, reports) = Config::resolve(None, "soon", TuiMode::Interactive, false);
        assert_eq!(cfg.interval, DEFAULT_INTERVAL);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].to_string().contains("defaulting"));
    }

    #[test]
    fn test_too_quick_interval_is_clamped() {
        let (cfg, reports) = Config::resolve(None, "100ms", TuiMode::Interactive, false);
        assert_eq!(cfg.interval, MIN_INTERVAL);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].to_string().contains("minimum"));
    }

    #[test]
    fn test_exact_minimum_passes() {
        let (cfg, reports) = Config::resolve(None, "400ms", TuiMode::Ugly, true);
        assert_eq!(cfg.interval, MIN_INTERVAL);
        assert!(reports.is_empty());
        assert!(cfg.expert);
    }

    #[test]
    fn test_file_mode_disables_pruning() {
        let (cfg, reports) = Config::resolve(
            Some(PathBuf::from("/tmp/events.log")),
            "1s",
            TuiMode::Ugly,
            false,
        );
        assert_eq!(cfg.interval, Duration::ZERO);
        assert!(reports.is_empty());
    }
}
