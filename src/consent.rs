//! Persisted location permission and the terminal prompt that sets it.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::WifiLocateError;
use crate::model::AuthorizationState;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Authorized,
    Denied,
}

impl From<Decision> for AuthorizationState {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Authorized => AuthorizationState::Authorized,
            Decision::Denied => AuthorizationState::Denied,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConsentFile {
    state: Decision,
}

/// The user's stored answer, kept next to the config file.
#[derive(Debug, Clone)]
pub struct ConsentStore {
    path: PathBuf,
}

impl ConsentStore {
    pub fn new(path: PathBuf) -> Self {
        ConsentStore { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("authorization.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable file means the user has not been asked yet.
    pub fn load(&self) -> Option<Decision> {
        let content = fs::read_to_string(&self.path).ok()?;
        match toml::from_str::<ConsentFile>(&content) {
            Ok(file) => Some(file.state),
            Err(e) => {
                log::warn!("Ignoring malformed {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, decision: Decision) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string(&ConsentFile { state: decision })
            .context("Failed to serialize authorization")?;

        fs::write(&self.path, content)
            .map_err(|e| WifiLocateError::Consent(format!("{}: {}", self.path.display(), e)))?;

        Ok(())
    }
}

/// Interpret a prompt answer. Anything other than yes is a refusal.
pub fn parse_answer(line: &str) -> Decision {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Decision::Authorized,
        _ => Decision::Denied,
    }
}

/// Ask on the controlling terminal. Blocks until the user answers.
pub fn ask_on_terminal(tty: &mut (impl BufRead + Write)) -> Result<Decision> {
    write!(
        tty,
        "Allow wifi-locate to determine your location from nearby WiFi networks? [y/N] "
    )?;
    tty.flush()?;

    let mut line = String::new();
    let read = tty.read_line(&mut line).context("Failed to read answer")?;
    if read == 0 {
        bail!("Terminal closed before an answer was given");
    }
    Ok(parse_answer(&line))
}

/// Terminal handle used for the prompt. Stdout is reserved for the result line.
pub struct Terminal {
    reader: BufReader<fs::File>,
}

impl Terminal {
    pub fn open() -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(|_| WifiLocateError::NoTerminal)?;
        Ok(Terminal {
            reader: BufReader::new(file),
        })
    }

    /// Second handle on the same terminal, for writing while a read blocks.
    pub fn try_clone_writer(&self) -> Result<fs::File> {
        self.reader
            .get_ref()
            .try_clone()
            .context("Failed to duplicate terminal handle")
    }
}

impl std::io::Read for Terminal {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        std::io::Read::read(&mut self.reader, buf)
    }
}

impl BufRead for Terminal {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

impl Write for Terminal {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.reader.get_mut().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.reader.get_mut().flush()
    }
}
