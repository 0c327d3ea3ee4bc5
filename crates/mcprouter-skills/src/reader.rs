// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The skill read contract: URI parsing, path-traversal
//! and symlink-escape defense, size enforcement, and MIME
//! classification.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext, Resource, ResourceContents};
use tracing::debug;

use crate::discovery::{discover_skills, list_assets, SKILL_MANIFEST};
use crate::mime::{classify, is_text_like};

/// Pseudo service id skill resources are registered under — skills are
/// native to the router rather than owned by any upstream service.
pub const SKILLS_SERVICE_ID: &str = "skills";

/// Default cap on a single asset's size before a read is rejected with
/// [`CoreError::ResourceTooLarge`].
pub const DEFAULT_MAX_ASSET_BYTES: u64 = 10 * 1024 * 1024;

/// A directory of skill subdirectories, each exposing `SKILL.md` plus
/// arbitrary assets as `skills://` resources.
#[derive(Debug, Clone)]
pub struct SkillsRoot {
    root: PathBuf,
    max_asset_bytes: u64,
}

impl SkillsRoot {
    /// A skills root at `root`, with the default size cap.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
        }
    }

    /// Override the per-asset size cap.
    pub fn with_max_asset_bytes(mut self, max_asset_bytes: u64) -> Self {
        self.max_asset_bytes = max_asset_bytes;
        self
    }

    /// List every `skills://` resource under this root: `SKILL.md` plus
    /// every other asset in each discovered skill directory.
    pub fn list_resources(&self) -> Result<Vec<Resource>, CoreError> {
        let mut resources = Vec::new();
        for skill in discover_skills(&self.root)? {
            for rel in list_assets(&skill.dir)? {
                let uri = format!("skills://{}/{}", skill.name, rel);
                let mime_type = classify(Path::new(&rel));
                resources.push(Resource {
                    uri,
                    service_id: SKILLS_SERVICE_ID.to_string(),
                    mime_type,
                    description: format!("{} asset of skill '{}'", rel, skill.name),
                });
            }
        }
        Ok(resources)
    }

    /// Read the contents addressed by a `skills://<name>/<path>` URI,
    /// applying the full six-step contract from 
    pub async fn read(&self, uri: &str) -> Result<ResourceContents, CoreError> {
        let (name, rel_path) = parse_skill_uri(uri)?;
        let skill_dir = self.resolve_skill_dir(name)?;

        let safe_rel = reject_unsafe_relative_path(rel_path)?;
        let target = self.resolve_within_base(&skill_dir, &safe_rel)?;

        let metadata = tokio::fs::metadata(&target)
            .await
            .map_err(|e| io_error_to_core(&target, e))?;
        if metadata.len() > self.max_asset_bytes {
            return Err(CoreError::ResourceTooLarge(format!(
                "{uri} is {} bytes, exceeding the {} byte cap",
                metadata.len(),
                self.max_asset_bytes
            )));
        }

        let bytes = tokio::fs::read(&target)
            .await
            .map_err(|e| io_error_to_core(&target, e))?;
        let mime_type = classify(&safe_rel);

        let contents = if is_text_like(&mime_type) {
            ResourceContents {
                uri: uri.to_string(),
                mime_type,
                text: Some(String::from_utf8_lossy(&bytes).into_owned()),
                blob: None,
            }
        } else {
            ResourceContents {
                uri: uri.to_string(),
                mime_type,
                text: None,
                blob: Some(bytes),
            }
        };
        debug!(uri, bytes = metadata.len(), "read skill asset");
        Ok(contents)
    }

    fn resolve_skill_dir(&self, name: &str) -> Result<PathBuf, CoreError> {
        let skills = discover_skills(&self.root)?;
        skills
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.dir)
            .ok_or_else(|| CoreError::NotFound(format!("skill '{name}'")))
    }

    /// Canonicalize `base.join(rel)` and enforce it stays within `base`,
    /// steps 2–3 (defends against both symlink escape
    /// and sibling-prefix attacks by requiring the separator-qualified
    /// prefix, not a bare string prefix).
    fn resolve_within_base(&self, base: &Path, rel: &Path) -> Result<PathBuf, CoreError> {
        let base = base
            .canonicalize()
            .map_err(|e| io_error_to_core(base, e))?;
        let joined = base.join(rel);
        let target = joined.canonicalize().map_err(|e| io_error_to_core(&joined, e))?;

        if target == base {
            return Ok(target);
        }
        let mut base_with_sep = base.as_os_str().to_owned();
        base_with_sep.push(std::path::MAIN_SEPARATOR.to_string());
        if target.as_os_str().to_string_lossy().starts_with(&*base_with_sep.to_string_lossy()) {
            Ok(target)
        } else {
            Err(CoreError::InvalidPath(format!(
                "{} points outside skill directory",
                rel.display()
            )))
        }
    }
}

fn io_error_to_core(path: &Path, err: io::Error) -> CoreError {
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::NotFound(format!("{}", path.display()))
    } else {
        CoreError::Other(anyhow::anyhow!("{}: {err}", path.display()))
    }
}

/// The [`mcprouter_core::ResourceReader`] the router registers one
/// instance of per `skills://` URI, closing over the
/// shared [`SkillsRoot`] and its own URI the same way the manager
/// expects any other resource's reader to.
pub struct SkillResourceReader {
    root: std::sync::Arc<SkillsRoot>,
    uri: String,
}

impl SkillResourceReader {
    pub fn new(root: std::sync::Arc<SkillsRoot>, uri: impl Into<String>) -> Self {
        Self {
            root,
            uri: uri.into(),
        }
    }
}

#[async_trait]
impl mcprouter_core::ResourceReader for SkillResourceReader {
    async fn read(&self, _ctx: ExecutionContext) -> Result<ResourceContents, CoreError> {
        self.root.read(&self.uri).await
    }
}

/// Split a `skills://<name>/<relative-path>` URI into its name and
/// relative-path parts. The relative path defaults to `SKILL.md` when
/// the URI names only a skill with no trailing path.
fn parse_skill_uri(uri: &str) -> Result<(&str, &str), CoreError> {
    let rest = uri
        .strip_prefix("skills://")
        .ok_or_else(|| CoreError::InvalidArgument(format!("not a skills:// uri: {uri}")))?;
    if rest.is_empty() {
        return Err(CoreError::InvalidArgument(format!("malformed skills:// uri: {uri}")));
    }
    let (name, path) = rest.split_once('/').unwrap_or((rest, ""));
    if name.is_empty() {
        return Err(CoreError::InvalidArgument(format!("malformed skills:// uri: {uri}")));
    }
    let path = if path.is_empty() { SKILL_MANIFEST } else { path };
    Ok((name, path))
}

/// Step 1 of the read contract: reject syntactically unsafe paths
/// before touching the filesystem at all.
fn reject_unsafe_relative_path(p: &str) -> Result<PathBuf, CoreError> {
    if p.chars().any(|c| c.is_control()) {
        return Err(CoreError::InvalidPath(format!("invalid asset path: {p}")));
    }
    let path = Path::new(p);
    if path.is_absolute() {
        return Err(CoreError::InvalidPath(format!("invalid asset path: {p}")));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(CoreError::InvalidPath(format!("invalid asset path: {p}"))),
        }
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_skill(tmp: &Path, name: &str) -> PathBuf {
        let dir = tmp.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SKILL_MANIFEST), "# instructions").unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_skill_manifest_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        make_skill(tmp.path(), "s");
        let root = SkillsRoot::new(tmp.path());

        let contents = root.read("skills://s/SKILL.md").await.unwrap();
        assert_eq!(contents.text.as_deref(), Some("# instructions"));
        assert_eq!(contents.mime_type, "text/markdown");
    }

    #[tokio::test]
    async fn reads_plain_text_asset() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = make_skill(tmp.path(), "s");
        fs::write(dir.join("asset.txt"), "hello").unwrap();
        let root = SkillsRoot::new(tmp.path());

        let contents = root.read("skills://s/asset.txt").await.unwrap();
        assert_eq!(contents.text.as_deref(), Some("hello"));
        assert!(contents.blob.is_none());
    }

    #[tokio::test]
    async fn rejects_parent_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        make_skill(tmp.path(), "s");
        fs::write(tmp.path().join("secret.txt"), "nope").unwrap();
        let root = SkillsRoot::new(tmp.path());

        let err = root.read("skills://s/../secret.txt").await.unwrap_err();
        assert!(err.to_string().contains("invalid asset path"), "{err}");
    }

    #[tokio::test]
    async fn rejects_absolute_path() {
        let tmp = tempfile::tempdir().unwrap();
        make_skill(tmp.path(), "s");
        let root = SkillsRoot::new(tmp.path());

        let err = root.read("skills:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_) | CoreError::InvalidPath(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rejects_symlink_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = make_skill(tmp.path(), "s");
        let outside = tmp.path().join("outside.txt");
        fs::write(&outside, "top secret").unwrap();
        std::os::unix::fs::symlink(&outside, dir.join("bad")).unwrap();
        let root = SkillsRoot::new(tmp.path());

        let err = root.read("skills://s/bad").await.unwrap_err();
        assert!(err.to_string().contains("points outside skill directory"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rejects_sibling_prefix_directory() {
        let tmp = tempfile::tempdir().unwrap();
        make_skill(tmp.path(), "myskill");
        let sibling = make_skill(tmp.path(), "myskill-sibling");
        fs::write(sibling.join("leak.txt"), "leaked").unwrap();
        let sibling_abs = sibling.canonicalize().unwrap();

        let skills_root = SkillsRoot::new(tmp.path());
        let myskill_dir = skills_root.resolve_skill_dir("myskill").unwrap();
        let outcome = skills_root.resolve_within_base(&myskill_dir, Path::new("../myskill-sibling/leak.txt"));
        assert!(outcome.is_err());
        let _ = sibling_abs;
    }

    #[tokio::test]
    async fn enforces_max_asset_size() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = make_skill(tmp.path(), "s");
        fs::write(dir.join("big.bin"), vec![0u8; 16]).unwrap();
        let root = SkillsRoot::new(tmp.path()).with_max_asset_bytes(8);

        let err = root.read("skills://s/big.bin").await.unwrap_err();
        assert!(matches!(err, CoreError::ResourceTooLarge(_)));
    }

    #[tokio::test]
    async fn unknown_skill_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let root = SkillsRoot::new(tmp.path());
        let err = root.read("skills://missing/SKILL.md").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn list_resources_includes_manifest_and_assets() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = make_skill(tmp.path(), "s");
        fs::write(dir.join("asset.txt"), "data").unwrap();
        let root = SkillsRoot::new(tmp.path());

        let resources = root.list_resources().unwrap();
        let uris: Vec<_> = resources.iter().map(|r| r.uri.as_str()).collect();
        assert!(uris.contains(&"skills://s/SKILL.md"));
        assert!(uris.contains(&"skills://s/asset.txt"));
    }
}
