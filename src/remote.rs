//! Remote documentation sources.
//!
//! The sync stage only needs two operations from wherever the docs live:
//! list a directory and read a file. [`RemoteSource`] captures that contract.
//!
//! - [`GhCliSource`] reaches the GitHub contents API through the `gh` CLI, so
//!   authentication is whatever `gh` is already configured with.
//! - [`LocalMirrorSource`] reads a local checkout, for offline builds and tests.
//!
//! Every `gh` call is bounded by a timeout. A call that times out, exits
//! non-zero, or returns something unparseable fails immediately; there is no
//! retry. Failures are classified into [`RemoteError`] variants whose messages
//! tell the operator what to do next.

use crate::types::{EntryKind, RemoteEntry};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error(
        "✗ GitHub CLI not found ({binary}).\n  Install with: brew install gh (macOS) or see https://cli.github.com/manual/installation"
    )]
    ToolMissing { binary: String },
    #[error("✗ GitHub authentication failed.\n  Run: gh auth login\n  Or set GH_TOKEN environment variable")]
    AuthFailed,
    #[error("✗ GitHub API rate limit exceeded.\n  Wait or authenticate with a token (GH_TOKEN).")]
    RateLimited,
    #[error("✗ Resource not found: {endpoint}\n  Check if the repository exists and is accessible.")]
    NotFound { endpoint: String },
    #[error("Remote call timed out after {secs}s: {endpoint}")]
    Timeout { endpoint: String, secs: u64 },
    #[error("Failed to parse remote response for {endpoint}: {detail}")]
    Parse { endpoint: String, detail: String },
    #[error("Remote call failed for {endpoint}: {detail}")]
    Failed { endpoint: String, detail: String },
}

/// Read access to a documentation repository.
pub trait RemoteSource {
    /// List the entries of `path` in `repo`, in the order the source returns them.
    fn list_dir(&self, repo: &str, path: &str) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Raw bytes of the file at `path` in `repo`.
    fn read_file(&self, repo: &str, path: &str) -> Result<Vec<u8>, RemoteError>;
}

// =============================================================================
// GitHub CLI bridge
// =============================================================================

/// GitHub contents API reached through `gh api`.
#[derive(Debug, Clone)]
pub struct GhCliSource {
    binary: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct GhEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct GhFile {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

impl GhCliSource {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn api(&self, endpoint: &str) -> Result<Vec<u8>, RemoteError> {
        let child = Command::new(&self.binary)
            .args(["api", endpoint])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => RemoteError::ToolMissing {
                    binary: self.binary.clone(),
                },
                _ => RemoteError::Failed {
                    endpoint: endpoint.to_string(),
                    detail: e.to_string(),
                },
            })?;

        let output = wait_with_timeout(child, self.timeout).map_err(|e| RemoteError::Failed {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        })?;

        match output {
            Finished::Exited {
                success: true,
                stdout,
                ..
            } => Ok(stdout),
            Finished::Exited { stderr, .. } => {
                Err(classify_failure(
                    &String::from_utf8_lossy(&stderr),
                    endpoint,
                    &self.binary,
                ))
            }
            Finished::TimedOut => Err(RemoteError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

fn contents_endpoint(repo: &str, path: &str) -> String {
    format!("repos/{}/contents/{}", repo, path.trim_matches('/'))
}

impl RemoteSource for GhCliSource {
    fn list_dir(&self, repo: &str, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let endpoint = contents_endpoint(repo, path);
        let body = self.api(&endpoint)?;
        parse_listing(&body, &endpoint)
    }

    fn read_file(&self, repo: &str, path: &str) -> Result<Vec<u8>, RemoteError> {
        let endpoint = contents_endpoint(repo, path);
        let body = self.api(&endpoint)?;
        decode_file(&body, &endpoint)
    }
}

fn parse_error(endpoint: &str, detail: impl Into<String>) -> RemoteError {
    RemoteError::Parse {
        endpoint: endpoint.to_string(),
        detail: detail.into(),
    }
}

fn snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(200).collect()
}

/// Parse a contents-API directory listing.
///
/// Entries other than files and directories (symlinks, submodules) are skipped.
fn parse_listing(body: &[u8], endpoint: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
    let entries: Vec<GhEntry> = serde_json::from_slice(body)
        .map_err(|e| parse_error(endpoint, format!("{e}: {}", snippet(body))))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let kind = match entry.kind.as_str() {
                "file" => EntryKind::File,
                "dir" => EntryKind::Directory,
                other => {
                    tracing::debug!(path = %entry.path, kind = other, "skipping remote entry");
                    return None;
                }
            };
            Some(RemoteEntry {
                name: entry.name,
                path: entry.path,
                kind,
            })
        })
        .collect())
}

/// Decode a contents-API file response (base64 with embedded newlines).
fn decode_file(body: &[u8], endpoint: &str) -> Result<Vec<u8>, RemoteError> {
    let file: GhFile = serde_json::from_slice(body)
        .map_err(|e| parse_error(endpoint, format!("{e}: {}", snippet(body))))?;

    if file.encoding != "base64" {
        return Err(parse_error(
            endpoint,
            format!(
                "unsupported content encoding \"{}\" (files over 1 MB are not served inline)",
                file.encoding
            ),
        ));
    }

    let compact: String = file
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|e| parse_error(endpoint, format!("invalid base64 content: {e}")))
}

/// Map the stderr of a failed `binary api` call to an operator-actionable error.
pub fn classify_failure(stderr: &str, endpoint: &str, binary: &str) -> RemoteError {
    let lower = stderr.to_lowercase();
    // `gh` itself reports HTTP 404 as "gh: Not Found", so the shell's
    // lowercase message is matched case-sensitively.
    if stderr.contains("command not found") || stderr.contains(&format!("{binary}: not found")) {
        RemoteError::ToolMissing {
            binary: binary.to_string(),
        }
    } else if lower.contains("authentication")
        || lower.contains("gh auth login")
        || lower.contains("401")
    {
        RemoteError::AuthFailed
    } else if lower.contains("rate limit") || lower.contains("403") {
        RemoteError::RateLimited
    } else if lower.contains("not found") || lower.contains("404") {
        RemoteError::NotFound {
            endpoint: endpoint.to_string(),
        }
    } else {
        RemoteError::Failed {
            endpoint: endpoint.to_string(),
            detail: stderr.trim().to_string(),
        }
    }
}

enum Finished {
    Exited {
        success: bool,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    TimedOut,
}

/// Wait for `child`, draining its pipes so a large response cannot block it.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> io::Result<Finished> {
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);
    let deadline = Instant::now() + timeout;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_reader(stdout);
    let stderr = join_reader(stderr);

    Ok(match status {
        Some(status) => Finished::Exited {
            success: status.success(),
            stdout,
            stderr,
        },
        None => Finished::TimedOut,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

// =============================================================================
// Local mirror
// =============================================================================

/// A local checkout standing in for the remote repository.
///
/// The repository id is ignored; paths resolve under `root`.
#[derive(Debug, Clone)]
pub struct LocalMirrorSource {
    root: PathBuf,
}

impl LocalMirrorSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, RemoteError> {
        let relative = Path::new(path.trim_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(RemoteError::NotFound {
                endpoint: path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn io_error(&self, path: &str, err: io::Error) -> RemoteError {
        match err.kind() {
            io::ErrorKind::NotFound => RemoteError::NotFound {
                endpoint: self.root.join(path).display().to_string(),
            },
            _ => RemoteError::Failed {
                endpoint: self.root.join(path).display().to_string(),
                detail: err.to_string(),
            },
        }
    }
}

impl RemoteSource for LocalMirrorSource {
    fn list_dir(&self, _repo: &str, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let dir = self.resolve(path)?;
        let read = std::fs::read_dir(&dir).map_err(|e| self.io_error(path, e))?;

        let mut entries = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| self.io_error(path, e))?;
            let file_type = entry.file_type().map_err(|e| self.io_error(path, e))?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let entry_path = match path.trim_matches('/') {
                "" => name.clone(),
                parent => format!("{parent}/{name}"),
            };
            entries.push(RemoteEntry {
                name,
                path: entry_path,
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, _repo: &str, path: &str) -> Result<Vec<u8>, RemoteError> {
        let file = self.resolve(path)?;
        std::fs::read(&file).map_err(|e| self.io_error(path, e))
    }
}
