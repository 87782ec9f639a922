//! Process configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `GEMINI_API_KEY` / `GOOGLE_API_KEY` | none |
//! | `NEO_LLM_BASE_URL` | Generative Language API v1beta |
//! | `NEO_TEXT_MODEL` | `gemini-2.0-flash` |
//! | `NEO_SEARCH_MODEL` | `gemini-2.5-flash` |
//! | `NEO_IMAGE_MODEL` | `imagen-4.0-generate-preview-06-06` |
//! | `MAPS_API_KEY` | none (static location) |
//! | `NEO_LOCATION` | `India` |
//! | `NEO_DEFAULT_GRADES` | `1,2,3,4,5` |
//!
//! Repository selection has its own variables, see [`crate::db::RepositoryType`].

use std::net::SocketAddr;

use crate::llm::gemini::{
    DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_SEARCH_MODEL, DEFAULT_TEXT_MODEL,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub search_model: String,
    pub image_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub llm: LlmSettings,
    pub maps_api_key: Option<String>,
    /// Place name used when no maps key is set or geolocation fails.
    pub fallback_location: String,
    /// Grades used when the request names none and inference fails.
    pub default_grades: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            llm: LlmSettings::default(),
            maps_api_key: None,
            fallback_location: "India".to_string(),
            default_grades: ["1", "2", "3", "4", "5"].map(String::from).to_vec(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let llm = LlmSettings {
            api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            base_url: get("NEO_LLM_BASE_URL").unwrap_or(defaults.llm.base_url),
            text_model: get("NEO_TEXT_MODEL").unwrap_or(defaults.llm.text_model),
            search_model: get("NEO_SEARCH_MODEL").unwrap_or(defaults.llm.search_model),
            image_model: get("NEO_IMAGE_MODEL").unwrap_or(defaults.llm.image_model),
        };

        let default_grades = get("NEO_DEFAULT_GRADES")
            .map(|v| split_list(&v))
            .filter(|grades| !grades.is_empty())
            .unwrap_or(defaults.default_grades);

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            llm,
            maps_api_key: get("MAPS_API_KEY"),
            fallback_location: get("NEO_LOCATION").unwrap_or(defaults.fallback_location),
            default_grades,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
