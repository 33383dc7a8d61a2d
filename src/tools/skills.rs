//! Skill tools: `load_skill` and `update_skill`.
//!
//! Both read the caller's identity and store handle from the request scope;
//! `update_skill` returns `false` instead of failing when no authenticated
//! user is bound.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use super::{build_definition, ParamKind, ParamSpec, ToolError, ToolHandler, ToolSet};
use crate::{
    context,
    domain::{is_valid_skill_name, SkillCatalog, SkillService},
};

const LOAD_DOC: &str = "Get a skill by name.\n\n\
Loads the skill body for the given name, preferring the caller's own skills\n\
over the built-in catalog.\n\n\
Args:\n\
    skill_name: Name of the skill to load\n\n\
Returns:\n\
    Skill content as a string, or null if not found\n";

const UPDATE_DOC: &str = "Create or update the current user's skill.\n\n\
Skill names use lowercase letters, numbers and hyphens; 1-64 characters; no\n\
leading or trailing hyphen.\n\n\
Args:\n\
    skill_name: Name of the skill\n\
    description: What the skill does and when to use it\n\
    body: Markdown body with the instructions\n\n\
Returns:\n\
    true if the skill was created or updated, false otherwise\n";

pub fn register(tools: &mut ToolSet, catalog: Arc<SkillCatalog>) {
    tools.register(
        build_definition(
            "load_skill",
            LOAD_DOC,
            &[ParamSpec::required("skill_name", ParamKind::String)],
        ),
        Arc::new(LoadSkillTool {
            catalog: catalog.clone(),
        }),
    );
    tools.register(
        build_definition(
            "update_skill",
            UPDATE_DOC,
            &[
                ParamSpec::required("skill_name", ParamKind::String),
                ParamSpec::required("description", ParamKind::String),
                ParamSpec::required("body", ParamKind::String),
            ],
        ),
        Arc::new(UpdateSkillTool { catalog }),
    );
}

fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError(format!("missing or non-string argument: {name}")))
}

struct LoadSkillTool {
    catalog: Arc<SkillCatalog>,
}

#[async_trait]
impl ToolHandler for LoadSkillTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let skill_name = string_arg(&args, "skill_name")?;
        let store = context::current_store();
        let content = SkillService::content_by_name(
            &self.catalog,
            store.as_deref(),
            context::current_user_id(),
            skill_name,
        )
        .await
        .map_err(|err| ToolError(err.to_string()))?;
        Ok(content.map(Value::String).unwrap_or(Value::Null))
    }
}

struct UpdateSkillTool {
    catalog: Arc<SkillCatalog>,
}

#[async_trait]
impl ToolHandler for UpdateSkillTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let skill_name = string_arg(&args, "skill_name")?;
        let description = string_arg(&args, "description")?;
        let body = string_arg(&args, "body")?;

        if !is_valid_skill_name(skill_name) {
            return Ok(Value::Bool(false));
        }
        // Built-in skills are read-only; a user row may not shadow one.
        if self.catalog.content_by_name(skill_name).is_some() {
            return Ok(Value::Bool(false));
        }

        let (Some(store), Some(user_id)) = (context::current_store(), context::current_user_id())
        else {
            return Ok(Value::Bool(false));
        };

        match store.skills.upsert(user_id, skill_name, description, body).await {
            Ok(_) => Ok(Value::Bool(true)),
            Err(err) => {
                warn!("update_skill failed for '{}': {}", skill_name, err);
                Ok(Value::Bool(false))
            }
        }
    }
}
