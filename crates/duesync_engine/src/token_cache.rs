use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use duesync_logging::ds_info;
use tempfile::NamedTempFile;

use crate::auth::{AuthError, IdentityProvider};

pub type TokenPrompt = Arc<dyn Fn() -> io::Result<String> + Send + Sync>;

/// Identity provider backed by a token file.
///
/// Silent requests read the file. Interactive requests fall back to asking
/// the user to paste an access token, which is then cached atomically.
pub struct FileTokenCache {
    path: PathBuf,
    prompt: TokenPrompt,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>, authorize_hint: Option<String>) -> Self {
        let prompt: TokenPrompt = Arc::new(move || stdin_prompt(authorize_hint.as_deref()));
        Self::with_prompt(path, prompt)
    }

    pub fn with_prompt(path: impl Into<PathBuf>, prompt: TokenPrompt) -> Self {
        Self {
            path: path.into(),
            prompt,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_cached(&self) -> Result<Option<String>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let token = text.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AuthError::Cache(err.to_string())),
        }
    }

    fn store(&self, token: &str) -> Result<(), AuthError> {
        write_atomically(&self.path, token).map_err(|err| AuthError::Cache(err.to_string()))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FileTokenCache {
    async fn get_token(&self, interactive: bool) -> Result<String, AuthError> {
        if let Some(token) = self.read_cached()? {
            return Ok(token);
        }
        if !interactive {
            return Err(AuthError::Denied("OAuth2 not granted or revoked.".into()));
        }

        let prompt = self.prompt.clone();
        let answer = tokio::task::spawn_blocking(move || prompt())
            .await
            .map_err(|err| AuthError::Denied(err.to_string()))?
            .map_err(|err| AuthError::Denied(err.to_string()))?;
        let token = answer.trim();
        if token.is_empty() {
            return Err(AuthError::Denied("The user did not approve access.".into()));
        }
        self.store(token)?;
        ds_info!("Cached new access token at {:?}", self.path);
        Ok(token.to_string())
    }

    async fn remove_cached_token(&self, token: &str) -> Result<(), AuthError> {
        match self.read_cached()? {
            Some(cached) if cached == token => match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AuthError::Cache(err.to_string())),
            },
            _ => Ok(()),
        }
    }
}

fn stdin_prompt(authorize_hint: Option<&str>) -> io::Result<String> {
    let mut stderr = io::stderr();
    if let Some(hint) = authorize_hint {
        writeln!(stderr, "Authorize access at: {hint}")?;
    }
    write!(stderr, "Paste an access token (empty to cancel): ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// Write via a sibling temp file and rename, so a crash never leaves a
/// half-written token behind.
fn write_atomically(target: &Path, content: &str) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
