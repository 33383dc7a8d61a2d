//! Allowed models.
//!
//! Model ids take the form `<provider>/<model>`; a `/responses/` infix
//! selects the responses-style reasoning variant of the same model.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ModelCard {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(skip)]
    pub supports_reasoning: bool,
}

pub struct ModelCatalog {
    cards: Vec<ModelCard>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            cards: vec![
                ModelCard {
                    id: "openai/gpt-5".to_string(),
                    name: "GPT-5".to_string(),
                    provider: "OpenAI".to_string(),
                    supports_reasoning: true,
                },
                ModelCard {
                    id: "openai/responses/gpt-5".to_string(),
                    name: "GPT-5 Think".to_string(),
                    provider: "OpenAI".to_string(),
                    supports_reasoning: true,
                },
                ModelCard {
                    id: "gemini/gemini-3-flash-preview".to_string(),
                    name: "Gemini 3 Flash".to_string(),
                    provider: "Google".to_string(),
                    supports_reasoning: false,
                },
            ],
        }
    }
}

impl ModelCatalog {
    pub fn cards(&self) -> &[ModelCard] {
        &self.cards
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelCard> {
        self.cards.iter().find(|card| card.id == model_id)
    }

    pub fn is_valid(&self, model_id: &str) -> bool {
        self.get(model_id).is_some()
    }

    /// The default model is the first card.
    pub fn default_id(&self) -> &str {
        &self.cards[0].id
    }
}
