use colored::*;
use std::time::Duration;

pub struct ConsoleUi;

impl ConsoleUi {
    pub fn write_banner(title: &str) {
        println!("{}", format!("=== {title} ===").bright_cyan().bold());
    }

    pub fn info(msg: &str) {
        println!("{} {}", "[INFO]".bright_blue(), msg);
    }

    pub fn warn(msg: &str) {
        println!("{} {}", "[WARN]".bright_yellow(), msg);
    }

    pub fn error(msg: &str) {
        eprintln!("{} {}", "[ERROR]".bright_red().bold(), msg);
    }

    pub fn success(msg: &str) {
        println!("{}", msg.bright_green());
    }

    /// Passes a line from the device through untouched.
    pub fn device_line(line: &str) {
        println!("{}", line.trim());
    }

    pub fn sample_line(elapsed: Duration, total: f64, top: Option<(&str, f64)>) {
        let top = match top {
            Some((name, cpu)) => format!("{} ({:.1}%)", name.bright_white(), cpu),
            None => "N/A".bright_black().to_string(),
        };
        println!(
            "[{:6.1}s] Total CPU: {}  Top: {}",
            elapsed.as_secs_f64(),
            format!("{total:5.1}%").yellow(),
            top
        );
    }

    pub fn section(title: &str) {
        println!("\n{}", format!("=== {title} ===").bright_cyan());
    }

    pub fn stat_row(name: &str, avg: f64, max: f64) {
        println!(
            "  {:25} - Avg: {:5.1}%, Max: {:5.1}%",
            name.bright_white(),
            avg,
            max
        );
    }
}
