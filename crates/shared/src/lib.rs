pub mod discussion;
pub mod host;
pub mod notes;
pub mod outcome;
pub mod team;

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_server_url() -> String {
        "http://localhost:3001".to_string()
    }

    fn default_poll_interval_ms() -> u64 {
        1200
    }

    fn default_connect_retry_limit() -> u32 {
        10
    }

    fn default_connect_retry_delay_ms() -> u64 {
        1500
    }

    /// Task-tracker credentials and the list that receives mention cards.
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct TrackerSettings {
        pub api_key: Option<String>,
        pub token: Option<String>,
        /// Cards created from mentions land here; unset skips card creation.
        pub mention_list_id: Option<String>,
    }

    impl TrackerSettings {
        pub fn is_configured(&self) -> bool {
            self.api_key.is_some() && self.token.is_some()
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Settings {
        /// Base URL of the analysis/notification backend.
        #[serde(default = "default_server_url")]
        pub server_base_url: String,
        /// How often the canvas selection is polled.
        #[serde(default = "default_poll_interval_ms")]
        pub selection_poll_ms: u64,
        /// How many times to retry connecting to the host sandbox.
        #[serde(default = "default_connect_retry_limit")]
        pub connect_retry_limit: u32,
        #[serde(default = "default_connect_retry_delay_ms")]
        pub connect_retry_delay_ms: u64,
        #[serde(default)]
        pub tracker: TrackerSettings,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                server_base_url: default_server_url(),
                selection_poll_ms: default_poll_interval_ms(),
                connect_retry_limit: default_connect_retry_limit(),
                connect_retry_delay_ms: default_connect_retry_delay_ms(),
                tracker: TrackerSettings::default(),
            }
        }
    }
}
