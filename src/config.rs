use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Runtime settings, read from the process environment.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let model = lookup("OPENAI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let data_dir = lookup("PRINT_DEBUGGER_DATA_DIR").map(PathBuf::from);

        Self {
            api_key,
            model,
            base_url,
            data_dir,
        }
    }
}

/// Load `.env`, then `.env.local`. Variables already present in the
/// environment are never overridden.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }
    if let Ok(path) = dotenvy::from_filename(".env.local") {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }
}
