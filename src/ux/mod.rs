use colored::Colorize;
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::time::Duration;

use crate::stage::Stage;

const PREVIEW_CHARS: usize = 1200;

pub fn banner(stage: Stage) {
    println!("\n=== {} ===", stage.title().to_uppercase().bold());
}

/// Print an artifact, truncated for readability unless `full`.
pub fn show_artifact(text: &str, full: bool) {
    let total = text.chars().count();
    if full || total <= PREVIEW_CHARS {
        println!("\n{text}\n");
    } else {
        let preview: String = text.chars().take(PREVIEW_CHARS).collect();
        println!("\n{preview}...\n({total} chars total, truncated for readability)\n");
    }
}

pub fn prompt_line(msg: &str) -> String {
    print!("{}: ", msg.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_err() {
        return String::new();
    }
    s.trim().to_string()
}

/// Ask for feedback on an artifact; `None` means the user accepted it.
pub fn read_feedback(what: &str) -> Option<String> {
    let s = prompt_line(&format!(
        "Provide feedback on the {what} (or type 'done' to finalize)"
    ));
    if s.is_empty() || s.eq_ignore_ascii_case("done") {
        None
    } else {
        Some(s)
    }
}

pub fn confirm(prompt: &str) -> bool {
    let ans = prompt_line(&format!("{prompt} [y/N]")).to_lowercase();
    ans == "y" || ans == "yes"
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(msg.to_string());
    pb
}
