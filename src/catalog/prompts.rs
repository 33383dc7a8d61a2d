//! System prompt catalog.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PromptCard {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub content: String,
}

pub struct PromptCatalog {
    cards: Vec<PromptCard>,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            cards: vec![
                PromptCard {
                    id: "assistant".to_string(),
                    name: "Assistant".to_string(),
                    content: "You are a helpful assistant. Answer clearly and concisely."
                        .to_string(),
                },
                PromptCard {
                    id: "creative".to_string(),
                    name: "Creative".to_string(),
                    content: "You are a creative writing partner. Favor vivid, original phrasing."
                        .to_string(),
                },
            ],
        }
    }
}

impl PromptCatalog {
    pub fn cards(&self) -> &[PromptCard] {
        &self.cards
    }

    pub fn content_by_id(&self, prompt_id: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|card| card.id == prompt_id)
            .map(|card| card.content.as_str())
    }
}
