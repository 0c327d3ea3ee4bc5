// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Skill directory discovery.

use std::path::{Path, PathBuf};

use mcprouter_core::CoreError;
use walkdir::WalkDir;

/// Canonical instructions file every skill directory must contain.
pub const SKILL_MANIFEST: &str = "SKILL.md";

/// A single discovered skill: its name and the directory it lives in.
#[derive(Debug, Clone)]
pub struct SkillDescriptor {
    /// The skill's name, taken from its directory name.
    pub name: String,
    /// Canonicalized path to the skill directory.
    pub dir: PathBuf,
}

/// Discover every immediate child of `root` that contains a `SKILL.md`.
///
/// Only one level deep is considered — a skill directory is a direct
/// child of `root`, not a directory found by recursing further down.
/// Non-directory entries and directories without a manifest are
/// skipped rather than treated as errors, so a root can be freely
/// shared with unrelated files.
pub fn discover_skills(root: &Path) -> Result<Vec<SkillDescriptor>, CoreError> {
    let root = root
        .canonicalize()
        .map_err(|e| CoreError::Other(anyhow::anyhow!("skill root {}: {e}", root.display())))?;

    let mut skills = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| CoreError::Other(anyhow::anyhow!("walking skill root: {e}")))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if !entry.path().join(SKILL_MANIFEST).is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        skills.push(SkillDescriptor {
            name,
            dir: entry.path().to_path_buf(),
        });
    }
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(skills)
}

/// Recursively list every asset file inside a skill directory, relative
/// to that directory, including `SKILL.md` itself. Paths use `/` as the
/// separator regardless of host platform, matching the `skills://`
/// URI space.
pub fn list_assets(skill_dir: &Path) -> Result<Vec<String>, CoreError> {
    let mut assets = Vec::new();
    for entry in WalkDir::new(skill_dir).follow_links(false) {
        let entry = entry.map_err(|e| CoreError::Other(anyhow::anyhow!("walking skill dir: {e}")))?;
        if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(skill_dir)
            .map_err(|e| CoreError::Other(anyhow::anyhow!("skill asset path: {e}")))?;
        let rel = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/");
        if !rel.is_empty() {
            assets.push(rel);
        }
    }
    assets.sort();
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_only_directories_with_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("has-manifest")).unwrap();
        fs::write(tmp.path().join("has-manifest/SKILL.md"), "# hi").unwrap();
        fs::create_dir(tmp.path().join("no-manifest")).unwrap();
        fs::write(tmp.path().join("stray-file.txt"), "x").unwrap();

        let found = discover_skills(tmp.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "has-manifest");
    }

    #[test]
    fn does_not_recurse_past_one_level() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("outer/inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("SKILL.md"), "# hi").unwrap();

        let found = discover_skills(tmp.path()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn lists_nested_assets_with_forward_slash_separators() {
        let tmp = tempfile::tempdir().unwrap();
        let skill = tmp.path().join("s");
        fs::create_dir_all(skill.join("sub")).unwrap();
        fs::write(skill.join("SKILL.md"), "# hi").unwrap();
        fs::write(skill.join("sub/asset.txt"), "data").unwrap();

        let mut assets = list_assets(&skill).unwrap();
        assets.sort();
        assert_eq!(assets, vec!["SKILL.md".to_string(), "sub/asset.txt".to_string()]);
    }
}
