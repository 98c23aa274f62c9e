/// Workflow engine settings loaded from environment variables.
///
/// Every field is optional at startup; operations that need a missing value
/// fail with [`crate::N8nError::NotConfigured`] when they are called.
#[derive(Debug, Clone, Default)]
pub struct N8nConfig {
    /// Start webhook of the poem workflow.
    pub webhook_url: Option<String>,
    /// Value of the `X-API-Key` header sent to the start webhook.
    pub webhook_api_key: Option<String>,
    /// Base URL of the engine, e.g. `https://n8n.example.com`.
    pub api_base_url: Option<String>,
    /// Engine API key (`X-N8N-API-KEY`).
    pub api_key: Option<String>,
    /// Workflow listed when a listing request names none.
    pub workflow_id: Option<String>,
}

impl N8nConfig {
    /// Load engine configuration from environment variables.
    ///
    /// | Env Var            | Field             |
    /// |--------------------|-------------------|
    /// | `N8N_WEBHOOK_URL`  | `webhook_url`     |
    /// | `X_API_KEY`        | `webhook_api_key` |
    /// | `N8N_API_BASE_URL` | `api_base_url`    |
    /// | `N8N_API_KEY`      | `api_key`         |
    /// | `N8N_WORKFLOW_ID`  | `workflow_id`     |
    ///
    /// Blank values are treated as unset.
    pub fn from_env() -> Self {
        Self {
            webhook_url: optional_env("N8N_WEBHOOK_URL"),
            webhook_api_key: optional_env("X_API_KEY"),
            api_base_url: optional_env("N8N_API_BASE_URL"),
            api_key: optional_env("N8N_API_KEY"),
            workflow_id: optional_env("N8N_WORKFLOW_ID"),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
