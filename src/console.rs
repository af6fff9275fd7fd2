//! Colorful console output for service startup.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::net::SocketAddr;

/// ASCII art banner for service startup.
pub fn print_banner() {
    let banner = r#"
  _____           _   ____             _
 |  ___|   _  ___| | |  _ \ ___  _   _| |_ ___
 | |_ | | | |/ _ \ | | |_) / _ \| | | | __/ _ \
 |  _|| |_| |  __/ | |  _ < (_) | |_| | ||  __/
 |_|   \__,_|\___|_| |_| \_\___/ \__,_|\__\___|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Fuel Cost Estimator".bright_cyan()
    );
}

/// Prints what the service loaded and where it listens.
pub fn print_startup(addr: SocketAddr, price_points: usize, cached_locations: usize) {
    println!(
        "{} {} {} price points ({}), cached locations ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Startup]".bright_cyan(),
        format_count(price_points),
        format_count(cached_locations)
    );
    if price_points == 0 {
        println!(
            "{} {} {} price table is empty, fuel stops cannot be matched",
            timestamp().bright_black(),
            "WARN".yellow(),
            "[Startup]".bright_cyan()
        );
    }
    println!(
        "{} {} {} listening on {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Startup]".bright_cyan(),
        format!("http://{}", addr).white().bold()
    );
}

/// Formats a count with thousands separators, highlighted.
fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en).bright_yellow().to_string()
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}
