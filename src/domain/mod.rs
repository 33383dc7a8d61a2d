//! Domain services over the store and catalogs.

pub mod mcps;
pub mod skills;

pub use mcps::McpService;
pub use skills::{is_valid_skill_name, xml_escape, SkillCatalog, SkillService};
