//! Core cache operations: `register`, `list`, `verify`, `get_file` (\S4.8).

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::cancellation::CancellationToken;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::hash::sha256_file;
use crate::id::{first_free_id, id_from_source, sanitize};
use crate::manifest::{FileEntry, Manifest, ModelFormat};

/// The outcome of a [`ModelCache::verify`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Whether every tracked file matched its recorded size and digest.
    pub valid: bool,
    /// One human-readable message per mismatch. Empty when `valid`.
    pub errors: Vec<String>,
}

/// A content-addressed cache of locally registered models, rooted at a
/// single directory (\S4.8).
///
/// Mirrors `llm-base`'s `ModelParameters`-style "resolve config once, pass
/// by value" shape: a `ModelCache` just carries a [`CacheConfig`] and has
/// no other state.
pub struct ModelCache {
    config: CacheConfig,
}

impl ModelCache {
    /// Builds a cache from an explicit configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Builds a cache rooted at the environment/per-OS default location.
    pub fn from_env() -> Self {
        Self::new(CacheConfig::from_env())
    }

    /// The cache's resolved configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Registers a local file into the cache, copying it in and computing
    /// its SHA-256 digest. Returns the (possibly de-conflicted) model id.
    ///
    /// For `http://`/`https://` sources, use [`ModelCache::register_async`].
    pub fn register(
        &self,
        source: &str,
        model_id: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<String, CacheError> {
        if source.trim().is_empty() {
            return Err(CacheError::Validation("source must not be empty".to_string()));
        }
        let path = Path::new(source);
        if !path.is_file() {
            return Err(CacheError::Validation(format!(
                "local source {source:?} is not a file; use register_async for HTTP(S) sources"
            )));
        }

        std::fs::create_dir_all(self.config.root())?;
        let (id, entry_dir) = self.create_entry_dir(source, model_id)?;

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("model").to_string();
        let dest = entry_dir.join(&file_name);
        std::fs::copy(path, &dest)?;

        let file_entry = file_entry_for(&dest, &file_name)?;
        let manifest = self.build_manifest(&id, source, display_name, file_entry);
        write_manifest(&entry_dir, &manifest)?;
        log::info!("registered model {id:?} from local source {source:?}");
        Ok(id)
    }

    /// Registers a model from a local path or an `http(s)://` URL,
    /// streaming downloads with a bounded timeout and cooperative
    /// cancellation (\S5).
    pub async fn register_async(
        &self,
        source: &str,
        model_id: Option<&str>,
        display_name: Option<&str>,
        token: &CancellationToken,
    ) -> Result<String, CacheError> {
        if source.trim().is_empty() {
            return Err(CacheError::Validation("source must not be empty".to_string()));
        }
        if !(source.starts_with("http://") || source.starts_with("https://")) {
            return self.register(source, model_id, display_name);
        }

        tokio::fs::create_dir_all(self.config.root()).await?;
        let (id, entry_dir) = self.create_entry_dir(source, model_id)?;

        let file_name = source
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("model")
            .to_string();
        let dest = entry_dir.join(&file_name);

        let download = download_to_file(source, &dest, &self.config, token);
        match tokio::time::timeout(self.config.download_timeout(), download).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = tokio::fs::remove_dir_all(&entry_dir).await;
                return Err(e);
            }
            Err(_elapsed) => {
                let _ = tokio::fs::remove_dir_all(&entry_dir).await;
                return Err(CacheError::DownloadAborted(source.to_string()));
            }
        }

        let file_entry = file_entry_for(&dest, &file_name)?;
        let manifest = self.build_manifest(&id, source, display_name, file_entry);
        write_manifest(&entry_dir, &manifest)?;
        log::info!("registered model {id:?} from remote source {source:?}");
        Ok(id)
    }

    /// Lists every cache entry whose `manifest.json` parses successfully,
    /// skipping and logging anything that doesn't.
    pub fn list(&self) -> Vec<Manifest> {
        let mut out = Vec::new();
        let entries = match std::fs::read_dir(self.config.root()) {
            Ok(entries) => entries,
            Err(_) => return out,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let manifest_path = path.join("manifest.json");
            let contents = match std::fs::read_to_string(&manifest_path) {
                Ok(contents) => contents,
                Err(_) => continue,
            };
            match serde_json::from_str::<Manifest>(&contents) {
                Ok(manifest) => out.push(manifest),
                Err(e) => log::warn!("skipping unparseable manifest at {manifest_path:?}: {e}"),
            }
        }
        out
    }

    /// Re-hashes every file tracked by `model_id`'s manifest and reports
    /// any size or SHA-256 mismatch.
    pub fn verify(&self, model_id: &str) -> Result<VerifyReport, CacheError> {
        let manifest = self.load_manifest(model_id)?;
        let entry_dir = self.config.root().join(model_id);
        let mut errors = Vec::new();

        for file in &manifest.files {
            let path = entry_dir.join(&file.path);
            if !path.is_file() {
                errors.push(format!("{}: missing", file.path));
                continue;
            }
            let actual_size = std::fs::metadata(&path)?.len();
            if actual_size != file.size_bytes {
                errors.push(format!(
                    "{}: size mismatch: expected {}, got {actual_size}",
                    file.path, file.size_bytes
                ));
            }
            let actual_sha256 = sha256_file(&path)?;
            if !actual_sha256.eq_ignore_ascii_case(&file.sha256) {
                errors.push(format!(
                    "{}: sha256 mismatch: expected {}, got {actual_sha256}",
                    file.path, file.sha256
                ));
            }
        }

        Ok(VerifyReport { valid: errors.is_empty(), errors })
    }

    /// The path to `model_id`'s primary (first) file.
    pub fn get_file(&self, model_id: &str) -> Result<PathBuf, CacheError> {
        let manifest = self.load_manifest(model_id)?;
        let file = manifest
            .primary_file()
            .ok_or_else(|| CacheError::Validation(format!("model {model_id:?} has no files")))?;
        Ok(self.config.root().join(model_id).join(&file.path))
    }

    fn allocate_id(&self, source: &str, model_id: Option<&str>) -> String {
        let candidate = model_id
            .map(sanitize)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| id_from_source(source));
        first_free_id(self.config.root(), &candidate)
    }

    /// Picks a free model id and creates its directory exclusively,
    /// retrying against a fresh id if a concurrent registration wins the
    /// race between [`first_free_id`]'s existence check and the create
    /// (\S5: "register must tolerate races by using the id-uniqueness
    /// loop atomically (create-directory exclusively, retry on conflict)").
    fn create_entry_dir(&self, source: &str, model_id: Option<&str>) -> Result<(String, PathBuf), CacheError> {
        loop {
            let id = self.allocate_id(source, model_id);
            let entry_dir = self.config.root().join(&id);
            match std::fs::create_dir(&entry_dir) {
                Ok(()) => return Ok((id, entry_dir)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn build_manifest(
        &self,
        id: &str,
        source: &str,
        display_name: Option<&str>,
        file: FileEntry,
    ) -> Manifest {
        Manifest {
            model_id: id.to_string(),
            display_name: display_name.map(str::to_string).unwrap_or_else(|| id.to_string()),
            format: ModelFormat::from_extension(Path::new(&file.path)),
            quantization: None,
            tokenizer_id: None,
            max_context_tokens: None,
            files: vec![file],
            created_utc: chrono::Utc::now().to_rfc3339(),
            source: source.to_string(),
            notes: None,
        }
    }

    fn load_manifest(&self, model_id: &str) -> Result<Manifest, CacheError> {
        let manifest_path = self.config.root().join(model_id).join("manifest.json");
        if !manifest_path.is_file() {
            return Err(CacheError::NotFound(model_id.to_string()));
        }
        let contents = std::fs::read_to_string(&manifest_path)?;
        serde_json::from_str(&contents).map_err(|e| CacheError::Manifest(model_id.to_string(), e))
    }
}

fn file_entry_for(path: &Path, relative_name: &str) -> Result<FileEntry, CacheError> {
    Ok(FileEntry {
        path: relative_name.to_string(),
        size_bytes: std::fs::metadata(path)?.len(),
        sha256: sha256_file(path)?,
    })
}

/// Atomically persists `manifest` as `<entry_dir>/manifest.json` by writing
/// to a sibling temp file and renaming it into place (\S4.8, mirroring the
/// write-temp-then-rename pattern `smq`'s writer uses for tensor data).
fn write_manifest(entry_dir: &Path, manifest: &Manifest) -> Result<(), CacheError> {
    let tmp_path = entry_dir.join("manifest.json.tmp");
    let final_path = entry_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| CacheError::Manifest(manifest.model_id.clone(), e))?;
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, &final_path)?;
    Ok(())
}

/// Streams `url` to `dest`, checking `token` at every chunk boundary.
/// Grounded on `llm-test`'s `download_file` (`Client::get(url).send().await`,
/// a `res.chunk().await` loop writing chunks as they arrive) with
/// cancellation support layered on top.
async fn download_to_file(
    url: &str,
    dest: &Path,
    config: &CacheConfig,
    token: &CancellationToken,
) -> Result<(), CacheError> {
    let redirect_policy = if config.follow_redirects() {
        reqwest::redirect::Policy::default()
    } else {
        reqwest::redirect::Policy::none()
    };
    let client = reqwest::Client::builder().redirect(redirect_policy).build()?;
    let mut response = client.get(url).send().await?;

    let mut file = tokio::fs::File::create(dest).await?;
    while let Some(chunk) = response.chunk().await? {
        if token.is_cancelled() {
            return Err(CacheError::DownloadAborted(url.to_string()));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
