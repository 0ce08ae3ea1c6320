//! Startup scripts
//!
//! A script is a plain text file of `[section]` headers, each followed by
//! console commands. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! # run after the mount connects
//! [mount]
//! mode Equatorial
//! time now
//! ```

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Section run right after the mount connection opens
pub const MOUNT_SECTION: &str = "mount";

/// Parsed script, commands grouped by section
#[derive(Debug, Default)]
pub struct InitScript {
    sections: HashMap<String, Vec<String>>,
}

impl InitScript {
    /// Parse script text. Commands before the first header belong to no section
    /// and are dropped.
    pub fn parse(text: &str) -> Self {
        let mut sections: HashMap<String, Vec<String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            match &current {
                Some(name) => sections.entry(name.clone()).or_default().push(line.to_string()),
                None => tracing::warn!(line = number + 1, "Init script command outside any section"),
            }
        }

        Self { sections }
    }

    /// Read and parse a script file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading init script {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    /// Commands of one section; empty if the section is absent
    pub fn script(&self, name: &str) -> &[String] {
        self.sections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `<config dir>/nexstar/init`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nexstar").join("init"))
    }
}
