use crate::domain::Window;
use crate::error::{LaurelError, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "laurel")]
#[command(version = "0.1.0")]
#[command(about = "Periodic player ranking and award engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml plus the LAUREL_ENV file)
    #[arg(short, long, default_value = "config", env = "LAUREL_CONFIG_DIR")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute rankings, issue awards and notify recipients
    Run {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Compute and print the selection without writing anything
    Preview {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Apply database migrations
    Migrate,
}

#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// First day of the window (inclusive, YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day of the window (inclusive, YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Number of closed days ending yesterday
    #[arg(long, default_value = "7", conflicts_with_all = ["from", "to"])]
    pub last_days: u32,
}

impl WindowArgs {
    /// Resolve to a window; only fully elapsed days are accepted
    pub fn resolve(&self, today: NaiveDate) -> Result<Window> {
        let window = match (self.from, self.to) {
            (Some(from), Some(to)) => Window::new(from, to)?,
            (None, None) => Window::last_closed_days(today, self.last_days)?,
            _ => {
                return Err(LaurelError::InvalidWindow(
                    "--from and --to must be given together".to_string(),
                ))
            }
        };

        if !window.is_closed(today) {
            return Err(LaurelError::InvalidWindow(format!(
                "window {window} has not closed yet"
            )));
        }
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    #[test]
    fn test_default_is_previous_seven_days() {
        let cli = Cli::try_parse_from(["laurel", "run"]).unwrap();
        let Commands::Run { window } = cli.command else {
            panic!("expected run");
        };
        let w = window.resolve(today()).unwrap();
        assert_eq!(w.period_key(), "20240304_20240310");
    }

    #[test]
    fn test_explicit_bounds() {
        let cli = Cli::try_parse_from(["laurel", "preview", "--from", "2024-03-01", "--to", "2024-03-03"]).unwrap();
        let Commands::Preview { window } = cli.command else {
            panic!("expected preview");
        };
        assert_eq!(window.resolve(today()).unwrap().days(), 3);
    }

    #[test]
    fn test_open_window_rejected() {
        let args = WindowArgs {
            from: Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
            to: Some(today()),
            last_days: 7,
        };
        assert!(matches!(args.resolve(today()), Err(LaurelError::InvalidWindow(_))));
    }

    #[test]
    fn test_from_without_to_rejected_by_parser() {
        assert!(Cli::try_parse_from(["laurel", "run", "--from", "2024-03-01"]).is_err());
    }
}
