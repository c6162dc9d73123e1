use serde::Deserialize;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Client settings, read from `TASKBOARD_*` environment variables.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_builder(
            config::Config::builder().add_source(config::Environment::with_prefix("TASKBOARD")),
        )
    }

    /// Builds the configuration from an arbitrary set of sources.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let settings = builder.build()?;
        let config: ClientConfig = settings.try_deserialize()?;
        Ok(config)
    }

    /// Applies values given on the command line over the loaded ones.
    pub fn with_overrides(mut self, server_url: Option<String>, token: Option<String>) -> Self {
        if let Some(server_url) = server_url {
            self.server_url = server_url;
        }
        if token.is_some() {
            self.token = token;
        }
        self
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}
