use owo_colors::OwoColorize;
use vnshelf_core::UserStats;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "vnshelf".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Visual novel activity from VNDB\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print the player block and list sizes after a pass
pub fn print_player_details(player: &UserStats, lists: [(&str, usize); 3]) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", format!("{} ({})", player.username, player.id).bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Play time:".dimmed(), player.total_play_time.bright_white());
    eprintln!(
        "  {} {} finished, {} playing",
        "On list:".dimmed(),
        player.finished_count.to_string().bright_white(),
        player.playing_count.to_string().bright_white()
    );

    for (label, count) in lists {
        eprintln!("  {} {}", format!("{}:", label).dimmed(), count.to_string().bright_white());
    }
    eprintln!();
}

/// Print a duration with a speed hint
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let indicator = if ms < 1000.0 {
        "fast".green().to_string()
    } else if ms < 5000.0 {
        "moderate".bright_yellow().to_string()
    } else {
        "slow".bright_red().to_string()
    };

    eprintln!("  {} {:>8.2}ms ({})", format!("{}:", label).dimmed(), ms, indicator);
}
