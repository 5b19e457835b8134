use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner style used while an operation is running.
/// - Yellow spinner with braille frames, current step as the message.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap()
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Green check mark followed by the final message.
pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap()
}

/// Red cross followed by the error message.
pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap()
}

/// Ticking spinner for `operation`, or a hidden bar when `quiet` (JSON output).
pub fn operation_spinner(operation: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(format!("running {}", operation));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn finish_ok(pb: &ProgressBar, msg: impl Into<String>) {
    pb.set_style(ok_style());
    pb.finish_with_message(msg.into());
}

pub fn finish_err(pb: &ProgressBar, msg: impl Into<String>) {
    pb.set_style(err_style());
    pb.finish_with_message(msg.into());
}
