//! Output formatting - clean, ASCII-only terminal output.

use owo_colors::OwoColorize;

/// Display an error
pub fn display_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

/// Display a success message
pub fn display_success(message: &str) {
    println!("[OK] {}", message.green());
}

/// Display an info message
pub fn display_info(message: &str) {
    println!("[INFO] {}", message);
}

/// Display a warning
pub fn display_warning(message: &str) {
    println!("[WARNING] {}", message.yellow());
}
