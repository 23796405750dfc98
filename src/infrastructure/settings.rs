use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::domain::Settings;

/// Read-only view of the user-facing settings, consulted before every tick.
pub trait SettingsSource: Send + Sync {
    fn current(&self) -> Settings;
}

/// JSON settings file written by the settings surface, re-read on every call.
///
/// A missing file means defaults. A file that cannot be read or parsed is
/// logged and also treated as defaults so a half-written file never stops
/// the scheduler.
pub struct FileSettings {
    path: PathBuf,
    fallback_credential: Option<String>,
}

impl FileSettings {
    pub fn new(path: impl AsRef<Path>, fallback_credential: Option<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fallback_credential,
        }
    }

    fn read(&self) -> Settings {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => return Settings::default(),
            Err(err) => {
                tracing::warn!(target: "settings", error = %err, path = %self.path.display(), "settings file unreadable");
                return Settings::default();
            }
        };
        serde_json::from_str(&body).unwrap_or_else(|err| {
            tracing::warn!(target: "settings", error = %err, path = %self.path.display(), "settings file malformed");
            Settings::default()
        })
    }
}

impl SettingsSource for FileSettings {
    fn current(&self) -> Settings {
        let mut settings = normalize(self.read());
        if settings.credential.is_none() {
            settings.credential = self.fallback_credential.clone();
        }
        settings
    }
}

/// Trims the credential; a blank one counts as absent.
pub(crate) fn normalize(mut settings: Settings) -> Settings {
    settings.credential = settings
        .credential
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    settings
}
