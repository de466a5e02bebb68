/// Default location of the config file on Linux desktops:
///   $XDG_CONFIG_HOME/navchime/config.toml, or ~/.config/navchime/config.toml
use std::path::PathBuf;

const APP_DIR_NAME: &str = "navchime";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the navchime config directory, or `None` when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

/// Returns the default config file path, if a config directory can be found.
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn config_dir_from(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    // An empty or relative XDG_CONFIG_HOME is ignored, as the basedir spec requires.
    let base = xdg_config_home
        .filter(|p| p.is_absolute())
        .or_else(|| home.map(|h| h.join(".config")))?;
    Some(base.join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_config_home_takes_precedence() {
        let dir = config_dir_from(Some(PathBuf::from("/xdg")), Some(PathBuf::from("/home/u")));
        assert_eq!(dir, Some(PathBuf::from("/xdg/navchime")));
    }

    #[test]
    fn falls_back_to_home_dot_config() {
        let dir = config_dir_from(None, Some(PathBuf::from("/home/u")));
        assert_eq!(dir, Some(PathBuf::from("/home/u/.config/navchime")));
    }

    #[test]
    fn relative_xdg_config_home_is_ignored() {
        let dir = config_dir_from(Some(PathBuf::from("cfg")), Some(PathBuf::from("/home/u")));
        assert_eq!(dir, Some(PathBuf::from("/home/u/.config/navchime")));
    }

    #[test]
    fn no_base_directory_yields_none() {
        assert_eq!(config_dir_from(None, None), None);
    }

    #[test]
    fn config_file_path_has_correct_name() {
        if let Some(path) = config_file_path() {
            assert_eq!(path.file_name().unwrap(), CONFIG_FILE_NAME);
        }
    }
}
