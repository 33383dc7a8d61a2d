//! Skills: built-in file-backed catalog plus user-owned rows.
//!
//! Built-in skills live under `skills/<name>/SKILL.md` with YAML frontmatter
//! (`name`, `description`) followed by the Markdown body. User skills are
//! database rows keyed by `(user_id, name)`. The model discovers both through
//! an `<available_skills>` XML block prepended to the system prompt.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{Store, StoreResult};

/// Skill names: lowercase alphanumeric segments joined by single hyphens,
/// 1-64 characters.
pub fn is_valid_skill_name(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));
    !name.is_empty() && name.len() <= 64 && pattern.is_match(name)
}

/// Escape text for inclusion in XML content.
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// A built-in skill loaded from disk.
#[derive(Debug, Clone)]
pub struct BuiltinSkill {
    pub name: String,
    pub description: String,
    pub content: String,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SkillFrontmatter {
    name: Option<String>,
    description: Option<String>,
}

/// File-backed catalog of built-in skills, loaded once at startup.
#[derive(Debug, Default)]
pub struct SkillCatalog {
    skills: Vec<BuiltinSkill>,
}

impl SkillCatalog {
    /// Scan `dir` for `<name>/SKILL.md` entries.
    ///
    /// Entries whose frontmatter `name` does not match the directory name are
    /// skipped, as are files that fail to parse.
    pub fn load(dir: &Path) -> Self {
        let mut skills = Vec::new();
        let Ok(entries) = std::fs::read_dir(dir) else {
            debug!("skills directory {:?} not found; no built-in skills", dir);
            return Self { skills };
        };

        for entry in entries.flatten() {
            let skill_file = entry.path().join("SKILL.md");
            let Ok(raw) = std::fs::read_to_string(&skill_file) else {
                continue;
            };
            let dir_name = entry.file_name().to_string_lossy().to_string();
            match parse_skill_file(&raw) {
                Some((frontmatter, body)) if frontmatter.name.as_deref() == Some(&dir_name) => {
                    skills.push(BuiltinSkill {
                        name: dir_name,
                        description: frontmatter.description.unwrap_or_default(),
                        content: body,
                        path: skill_file,
                    });
                }
                Some(_) => {
                    warn!(
                        "skipping skill {:?}: frontmatter name does not match directory",
                        skill_file
                    );
                }
                None => {
                    warn!("skipping skill {:?}: invalid frontmatter", skill_file);
                }
            }
        }

        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Self { skills }
    }

    pub fn skills(&self) -> &[BuiltinSkill] {
        &self.skills
    }

    pub fn content_by_name(&self, name: &str) -> Option<&str> {
        self.skills
            .iter()
            .find(|skill| skill.name == name)
            .map(|skill| skill.content.as_str())
    }
}

/// Split a SKILL.md file into parsed frontmatter and trimmed body.
fn parse_skill_file(raw: &str) -> Option<(SkillFrontmatter, String)> {
    let rest = raw.strip_prefix("---")?;
    let (frontmatter, body) = rest.split_once("\n---")?;
    let frontmatter: SkillFrontmatter = serde_yaml::from_str(frontmatter).ok()?;
    Some((frontmatter, body.trim().to_string()))
}

/// Skill operations shared by the tool handlers and the HTTP surface.
pub struct SkillService;

impl SkillService {
    /// Build the `<available_skills>` XML for the system prompt: built-in
    /// skills first, then the user's own rows.
    pub async fn available_skills_xml(
        catalog: &SkillCatalog,
        store: &Store,
        user_id: Uuid,
    ) -> StoreResult<String> {
        let mut entries: Vec<(String, String)> = catalog
            .skills()
            .iter()
            .map(|skill| (skill.name.clone(), skill.description.clone()))
            .collect();
        for row in store.skills.list(user_id).await? {
            entries.push((row.name, row.description));
        }

        let mut parts = Vec::with_capacity(entries.len());
        for (name, description) in entries {
            parts.push(format!(
                "\t<skill>\n\t\t<name>{}</name>\n\t\t<description>{}</description>\n\t</skill>",
                xml_escape(&name),
                xml_escape(&description)
            ));
        }
        Ok(format!(
            "<available_skills>\n{}\n</available_skills>",
            parts.join("\n")
        ))
    }

    /// Skill body for `load_skill`: the user's row wins over a built-in of
    /// the same name.
    pub async fn content_by_name(
        catalog: &SkillCatalog,
        store: Option<&Store>,
        user_id: Option<Uuid>,
        name: &str,
    ) -> StoreResult<Option<String>> {
        if let (Some(store), Some(user_id)) = (store, user_id) {
            if let Some(row) = store.skills.get_by_name(user_id, name).await? {
                return Ok(Some(row.content));
            }
        }
        Ok(catalog.content_by_name(name).map(str::to_string))
    }
}
