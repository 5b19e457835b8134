use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::{OpsError, Result};

/// Run `git clone --mirror <url> <dest>`.
///
/// # Errors
/// [`OpsError::Transport`] with the captured stderr/stdout when git cannot be
/// spawned or exits non-zero.
pub fn clone_mirror(git: &Path, url: &str, dest: &Path) -> Result<()> {
    let mut cmd = Command::new(git);
    cmd.arg("clone").arg("--mirror").arg(url).arg(dest);
    run(cmd, &format!("git clone --mirror {}", redact_url(url)), url)
}

/// Run `git push --mirror <url>` inside `repo_dir`.
///
/// The URL usually carries credentials; they never appear in the returned error.
pub fn push_mirror(git: &Path, repo_dir: &Path, url: &str) -> Result<()> {
    let mut cmd = Command::new(git);
    cmd.arg("push").arg("--mirror").arg(url).current_dir(repo_dir);
    run(cmd, &format!("git push --mirror {}", redact_url(url)), url)
}

fn run(mut cmd: Command, label: &str, url: &str) -> Result<()> {
    cmd.env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd
        .output()
        .map_err(|e| OpsError::transport(label, format!("failed to spawn git: {}", e)))?;

    if !output.status.success() {
        let text = describe_failure(&output);
        return Err(OpsError::transport(label, scrub(&text, url)));
    }
    Ok(())
}

fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut text = format!("exit status {}", output.status);
    for part in [stderr.trim(), stdout.trim()] {
        if !part.is_empty() {
            text.push('\n');
            text.push_str(part);
        }
    }
    text
}

/// Drop userinfo from an http(s) URL; other forms are returned unchanged.
pub fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut u) if u.password().is_some() || !u.username().is_empty() => {
            let _ = u.set_password(None);
            let _ = u.set_username("");
            u.to_string()
        }
        _ => url.to_string(),
    }
}

/// Remove any trace of the credentialed `url` from process output.
fn scrub(text: &str, url: &str) -> String {
    let mut out = text.replace(url, &redact_url(url));
    if let Ok(u) = reqwest::Url::parse(url)
        && let Some(pw) = u.password()
        && !pw.is_empty()
    {
        out = out.replace(pw, "***");
    }
    out
}
