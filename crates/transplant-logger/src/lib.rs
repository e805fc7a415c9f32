mod sink;

pub use sink::{ConsoleSink, MessageSink};

use crossterm::{ExecutableCommand, cursor, terminal};
use owo_colors::OwoColorize;
use std::io::{self, IsTerminal, Write};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    /// Errors and warnings go to stderr so `--json` output on stdout stays parseable.
    const fn to_stderr(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }

    fn render(self, message: &str) -> String {
        match self {
            Self::Info => format!("{} {message}", "::".bright_cyan().bold()),
            Self::Success => format!("{} {}", "✓".bright_green().bold(), message.bright_green()),
            Self::Warning => format!("{} {}", "⚠".bright_yellow().bold(), message.bright_yellow()),
            Self::Error => format!("{} {}", "✗".bright_red().bold(), message.bright_red()),
            Self::Debug => format!("{} {}", "debug".bright_black(), message.bright_black()),
        }
    }
}

/// Console output for one `transplant` invocation.
pub struct Logger {
    started: Instant,
    quiet: bool,
}

impl Logger {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            started: Instant::now(),
            quiet,
        }
    }

    /// Drops a partially drawn line before printing over it.
    fn reset_line(&self) {
        let mut stdout = io::stdout();
        if self.quiet || !stdout.is_terminal() {
            return;
        }
        let _ = stdout.execute(cursor::MoveToColumn(0));
        let _ = stdout.execute(terminal::Clear(terminal::ClearType::CurrentLine));
        let _ = stdout.flush();
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        // quiet keeps errors only
        if self.quiet && level != LogLevel::Error {
            return;
        }
        self.reset_line();

        let line = level.render(message);
        if level.to_stderr() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    /// Success line carrying the time since the logger was created.
    pub fn finish(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.reset_line();
        println!(
            "{} {}",
            LogLevel::Success.render(message),
            format!("[{}]", elapsed_label(self.started.elapsed())).bright_black()
        );
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Success, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn debug(&self, message: &str, enabled: bool) {
        if enabled {
            self.log(LogLevel::Debug, message);
        }
    }
}

#[must_use]
pub fn elapsed_label(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(1) {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// First call wins; later calls keep the existing logger.
pub fn init_logger(quiet: bool) {
    let _ = LOGGER.set(Logger::new(quiet));
}

fn logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(false))
}

pub fn info(message: &str) {
    logger().info(message);
}

pub fn success(message: &str) {
    logger().success(message);
}

pub fn warn(message: &str) {
    logger().warn(message);
}

pub fn error(message: &str) {
    logger().error(message);
}

pub fn debug(message: &str, enabled: bool) {
    logger().debug(message, enabled);
}

pub fn finish(message: &str) {
    logger().finish(message);
}
