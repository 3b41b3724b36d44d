use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

/// Terminal presentation for the demo output.
pub struct Ui {
    palette: Palette,
    paint: bool,
}

impl Ui {
    pub fn new(theme: Theme) -> Self {
        let paint = theme != Theme::Plain && std::io::stdout().is_terminal();

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::plain(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };
        Self { palette, paint }
    }

    pub fn heading(&self, title: &str) {
        let formatted = format!("{HEADING_ICON} {title}");
        if self.paint {
            println!("\n{}", self.palette.heading.paint(formatted));
        } else {
            println!("\n{formatted}");
        }
    }

    /// Prints aligned `key: value` rows under a heading.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        self.heading(title);
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            if self.paint {
                println!(
                    "  {} {}",
                    self.palette.key.paint(format!("{key:>width$}:")),
                    value
                );
            } else {
                println!("  {key:>width$}: {value}");
            }
        }
    }

    pub fn line(&self, text: impl Display) {
        println!("  {text}");
    }

    pub fn success(&self, message: &str) {
        if self.paint {
            println!("{} {message}", self.palette.success.paint(SUCCESS_ICON));
        } else {
            println!("{SUCCESS_ICON} {message}");
        }
    }

    pub fn warn(&self, message: &str) {
        if self.paint {
            eprintln!("{} {message}", self.palette.warn.paint(WARNING_ICON));
        } else {
            eprintln!("{WARNING_ICON} {message}");
        }
    }

    /// Starts a spinner on stderr; it stays hidden when stderr is not a
    /// terminal.
    pub fn task(&self, label: impl Into<String>) -> Task {
        let label = label.into();
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(label);
        pb.enable_steady_tick(Duration::from_millis(120));
        Task {
            pb,
            start: Instant::now(),
        }
    }
}

pub struct Task {
    pb: ProgressBar,
    start: Instant,
}

impl Task {
    pub fn finish(self) -> Duration {
        self.pb.finish_and_clear();
        self.start.elapsed()
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

struct Palette {
    heading: Style,
    key: Style,
    success: Style,
    warn: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn light() -> Self {
        Self {
            heading: Style::new().fg(Color::Blue).bold(),
            key: Style::new().fg(Color::Black).bold(),
            success: Style::new().fg(Color::Green).bold(),
            warn: Style::new().fg(Color::Red).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            success: Style::new(),
            warn: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const WARNING_ICON: &str = "⚠";
