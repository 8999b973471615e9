//! Brand resolution tables.
//!
//! Each deployment serves a single brand; the brand decides which backend
//! agent answers the thread, which welcome message seeds a new thread, and
//! which sportsbook site betting deep-links point at.

use serde::{Deserialize, Serialize};

/// Supported brands. Unknown brand strings fall back to [`Brand::Bwin`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Sportingbet,
    #[default]
    Bwin,
}

impl Brand {
    /// Parse a brand identifier, falling back to the default brand.
    pub fn from_id(id: &str) -> Self {
        match id {
            "sportingbet" => Brand::Sportingbet,
            _ => Brand::Bwin,
        }
    }

    /// Brand identifier as sent in store metadata.
    pub fn id(&self) -> &'static str {
        match self {
            Brand::Sportingbet => "sportingbet",
            Brand::Bwin => "bwin",
        }
    }

    /// Backend agent that answers threads for this brand.
    pub fn agent_id(&self) -> &'static str {
        match self {
            Brand::Sportingbet => "sportingbot-chat-assistant",
            Brand::Bwin => "botandwin-chat-assistant",
        }
    }

    /// Assistant welcome message used to seed a newly registered thread.
    pub fn welcome_message(&self) -> &'static str {
        match self {
            Brand::Sportingbet => {
                "Olá! Eu sou o SportingBOT, seu assistente de apostas esportivas. \
                 Posso te ajudar com informações sobre partidas, odds, estatísticas \
                 e muito mais. Como posso ajudar?"
            }
            Brand::Bwin => {
                "¡Hola! Soy BotAndWin, tu asistente de apuestas deportivas. Puedo \
                 ayudarte con información sobre partidos, cuotas, estadísticas y \
                 mucho más. ¿En qué puedo ayudarte?"
            }
        }
    }

    /// Welcome message for brand ids outside the table.
    pub fn fallback_welcome_message() -> &'static str {
        "¡Hola! Soy tu asistente de apuestas deportivas. ¿En qué puedo ayudarte?"
    }

    /// Sportsbook site that betting deep-links resolve against.
    pub fn sports_base_url(&self) -> &'static str {
        match self {
            Brand::Sportingbet => "https://www.sportingbet.bet.br",
            Brand::Bwin => "https://www.bwin.es",
        }
    }
}

/// Resolve the welcome message for a raw brand id, including ids outside the
/// brand table.
pub fn welcome_for_brand_id(id: &str) -> &'static str {
    match id {
        "sportingbet" => Brand::Sportingbet.welcome_message(),
        "bwin" => Brand::Bwin.welcome_message(),
        _ => Brand::fallback_welcome_message(),
    }
}
