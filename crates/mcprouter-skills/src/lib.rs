// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Filesystem-backed skill resource reader.
//!
//! A skill is a directory `<root>/<name>/` containing a canonical
//! `SKILL.md` plus arbitrary assets, exposed as MCP resources under
//! `skills://<name>/SKILL.md` and `skills://<name>/<relative_path>`.
//! This crate owns discovery of skill directories and the read
//! contract that guards against path traversal and symlink escape.

mod discovery;
mod mime;
mod reader;

pub use discovery::{discover_skills, SkillDescriptor};
pub use reader::{SkillResourceReader, SkillsRoot, DEFAULT_MAX_ASSET_BYTES};
