use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};
use which::which;

/// Launch settings for the Chromium surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub headless: bool,
    /// Browser binary; detected from `PATH` and well-known locations when unset.
    pub executable: Option<PathBuf>,
    pub user_data_dir: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub navigation_timeout_secs: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            headless: false,
            executable: None,
            user_data_dir: None,
            window_width: 1280,
            window_height: 800,
            navigation_timeout_secs: 30,
        }
    }
}

impl SurfaceConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs.max(1))
    }

    pub fn resolved_executable(&self) -> Option<PathBuf> {
        self.executable.clone().or_else(detect_chrome_executable)
    }
}

/// Locates a Chrome/Chromium binary: `OPERATOR_CHROME` first, then `PATH`,
/// then the usual install locations for the host OS.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("OPERATOR_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(value) = env::var(key) {
                let root = PathBuf::from(value.trim());
                paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                paths.push(root.join("Chromium/Application/chrome.exe"));
                paths.push(root.join("Microsoft/Edge/Application/msedge.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }
}
