//! Plain terminal renderer

use std::io::Write;

use colored::{ColoredString, Colorize};

use crate::models::log_entry::{LogEntry, LogKind};
use crate::models::notice::{Notice, NoticeLevel};
use crate::models::status::StatusColor;
use crate::render::view::{RowBody, RowView, StatusIcon};
use crate::render::Renderer;

const BAR_WIDTH: usize = 20;

/// Writes rows, journal lines and notices to a terminal
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: String) {
        // Write errors are ignored
        let _ = writeln!(self.out, "{}", line);
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render_row(&mut self, row: &RowView) {
        let badge = paint(&format!("[{}]", row.label), row.color);
        let line = match &row.body {
            RowBody::Progress {
                percent,
                bar_color,
                current_file,
                files,
                speed,
            } => {
                let mut details = Vec::new();
                if let Some(file) = current_file {
                    details.push(file.clone());
                }
                if let Some((current, total)) = files {
                    details.push(format!("{}/{} files", current, total));
                }
                if let Some(speed) = speed {
                    details.push(speed.clone());
                }
                format!(
                    "{} {} {} {}",
                    row.target_id.bold(),
                    badge,
                    paint(&progress_bar(*percent), *bar_color),
                    details.join("  ")
                )
            }
            RowBody::Icon { icon } => {
                let icon = match icon {
                    StatusIcon::Check => "✔".green(),
                    StatusIcon::Cross => "✘".red(),
                    StatusIcon::Dash => "–".dimmed(),
                };
                format!("{} {} {} {}", row.target_id.bold(), badge, icon, row.message)
            }
        };
        self.write_line(line.trim_end().to_string());
    }

    fn render_log(&mut self, entry: &LogEntry) {
        let text = entry.to_string();
        let line = match entry.kind {
            LogKind::Success => text.green(),
            LogKind::Error => text.red(),
            LogKind::Warning => text.yellow(),
            LogKind::Info => text.cyan(),
        };
        self.write_line(line.to_string());
    }

    fn render_log_cleared(&mut self) {
        self.write_line("Ready, waiting for actions...".dimmed().to_string());
    }

    fn render_notice(&mut self, notice: &Notice) {
        let line = match notice.level {
            NoticeLevel::Info => notice.message.blue(),
            NoticeLevel::Success => notice.message.green(),
            NoticeLevel::Warning => notice.message.yellow(),
            NoticeLevel::Error => notice.message.red(),
            NoticeLevel::Alert => format!("!! {}", notice.message).red().bold(),
        };
        self.write_line(line.to_string());
    }
}

fn paint(text: &str, color: StatusColor) -> ColoredString {
    match color {
        StatusColor::Success => text.green(),
        StatusColor::Danger => text.red(),
        StatusColor::Warning => text.yellow(),
        StatusColor::Info => text.cyan(),
        StatusColor::Secondary => text.dimmed(),
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = BAR_WIDTH * percent.min(100) as usize / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}
