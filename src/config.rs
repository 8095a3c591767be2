//! Configuration for the playground host, frame shim, and compile proxy.
//!
//! Defaults target local development; every field can be overridden through
//! a `JECT_*` environment variable.

use crate::constants::DEFAULT_COMPILE_PORT;
use serde::{Deserialize, Serialize};

/// Configuration shared by the `run`, `frame`, and `compile-server`
/// subcommands.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// Registrable domain the host UI is served from (origin of the relay
    /// receiver).
    pub domain_main: String,
    /// Registrable domain the content frame is served from. Distinct from
    /// `domain_main` so the relay has a real origin boundary to check.
    pub domain_frame: String,
    /// Base URL of the external session API.
    pub api_base_url: String,
    /// Base URL the content frame resolves its pages against.
    pub frame_base_url: String,
    /// Listen port for the compile proxy.
    pub compile_port: u16,
    /// Base URL of the external transpiler service the compile proxy
    /// forwards to.
    pub transpiler_url: String,
    /// Command used to spawn the content-frame process. `{url}` is replaced
    /// with the resolved page URL. Empty means "this executable, `frame`
    /// subcommand".
    #[serde(default)]
    pub frame_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain_main: "ject.dev".to_string(),
            domain_frame: "ject.page".to_string(),
            api_base_url: "http://ject.dev.local:1850".to_string(),
            frame_base_url: "http://ject.page.local:1850".to_string(),
            compile_port: DEFAULT_COMPILE_PORT,
            transpiler_url: "http://localhost:1952".to_string(),
            frame_command: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the default configuration with environment overrides applied.
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(domain) = std::env::var("JECT_DOMAIN_MAIN") {
            self.domain_main = domain;
        }
        if let Ok(domain) = std::env::var("JECT_DOMAIN_FRAME") {
            self.domain_frame = domain;
        }
        if let Ok(url) = std::env::var("JECT_API_URL") {
            self.api_base_url = url;
        }
        if let Ok(url) = std::env::var("JECT_FRAME_URL") {
            self.frame_base_url = url;
        }
        if let Ok(port) = std::env::var("JECT_COMPILE_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.compile_port = port;
            }
        }
        if let Ok(url) = std::env::var("JECT_TRANSPILER_URL") {
            self.transpiler_url = url;
        }
        if let Ok(command) = std::env::var("JECT_FRAME_COMMAND") {
            self.frame_command = command.split_whitespace().map(str::to_owned).collect();
        }
    }

    /// Origin of the host UI, derived from the session API base URL.
    pub fn main_origin(&self) -> anyhow::Result<String> {
        crate::relay::origin::origin_of(&self.api_base_url)
    }

    /// Origin of the content frame, derived from the frame base URL. This is
    /// the expected origin of every inbound relay message.
    pub fn frame_origin(&self) -> anyhow::Result<String> {
        crate::relay::origin::origin_of(&self.frame_base_url)
    }
}
