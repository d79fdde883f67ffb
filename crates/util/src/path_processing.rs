//! Resolution of user-supplied file paths such as `--config` and `RESCAT_CONFIG_PATH`.

use std::path::PathBuf;

use dirs_next::home_dir;

/// Resolves a config or draft path typed by the user.
///
/// Surrounding whitespace is dropped and a leading `~` (alone, or followed by either
/// path separator) is replaced by the home directory. Anything else is taken
/// literally. When no home directory is known the `~` stays in place and the
/// subsequent read reports the missing file.
pub fn expand_tilde(path: &str) -> PathBuf {
    let path = path.trim();
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    let Some(home) = home_dir() else {
        return PathBuf::from(path);
    };
    if rest.is_empty() {
        return home;
    }
    match rest.strip_prefix(['/', '\\']) {
        Some(relative) => home.join(relative),
        // `~user` forms are not expanded.
        None => PathBuf::from(path),
    }
}
