//! Simple line-based CLI output utilities.

use crate::models::Prompt;
use crate::notice::Notice;

/// Line width for separators.
const LINE_WIDTH: usize = 60;

/// Longest title shown in a listing line.
const TITLE_WIDTH: usize = 32;

/// Print a header.
///
/// ```text
/// PROMPTS (page 1 of 3, 21 total)
/// ════════════════════════════════════════════════════════════
/// ```
pub fn print_header(title: &str) {
    println!("{}", title);
    println!("{}", "═".repeat(LINE_WIDTH));
}

/// Print a notice on stdout, or stderr for errors.
///
/// ```text
///   ✓ Prompt reported
/// ```
pub fn print_notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("  ✗ {}", notice);
    } else {
        println!("  ✓ {}", notice);
    }
}

/// One listing line for a prompt.
///
/// ```text
/// #12   Cat haiku                  ♥ 3 (liked)  copies 5  by Ana ★
/// ```
pub fn format_prompt_line(prompt: &Prompt, liked: bool) -> String {
    let mut line = format!(
        "#{:<5} {:<width$} ♥ {}{}  copies {}",
        prompt.id,
        truncate(&prompt.title, TITLE_WIDTH),
        prompt.likes,
        if liked { " (liked)" } else { "" },
        prompt.copy_count,
        width = TITLE_WIDTH,
    );
    if let Some(name) = prompt.username.as_deref().filter(|n| !n.is_empty()) {
        line.push_str("  by ");
        line.push_str(name);
    }
    if prompt.is_owner {
        line.push_str(" ★");
    }
    line
}

/// Print a prompt in full.
pub fn print_prompt(prompt: &Prompt) {
    println!("#{} {}", prompt.id, prompt.title);
    println!("{}", "─".repeat(LINE_WIDTH));
    println!("{}", prompt.text);
    if let Some(url) = &prompt.image_url {
        println!("image: {}", url);
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
