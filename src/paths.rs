use std::{env, path::PathBuf};

#[derive(Clone)]
pub struct Paths {
    pub config: PathBuf,
}

/// Directory holding ghm's configuration.
///
/// `$XDG_CONFIG_HOME/.ghm` when set, otherwise `$HOME/.config/.ghm`.
pub fn ghm_home() -> PathBuf {
    let xdg = env::var_os("XDG_CONFIG_HOME");
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    base.join(".ghm")
}

pub fn paths() -> Paths {
    let home = ghm_home();
    Paths {
        config: home.join("config.toml"),
    }
}
