use crate::storage::IdPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Server configuration
///
/// Every option can also be set through its environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "roadstats")]
#[command(about = "Road fatality record store with a CRUD and aggregation HTTP API")]
pub struct AppConfig {
    /// Interface to bind
    #[arg(long, env = "ROADSTATS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "ROADSTATS_PORT", default_value_t = 5000)]
    pub port: u16,

    /// CSV file backing the record store
    #[arg(long, env = "ROADSTATS_DATA_FILE", default_value = "data/five_yr_fatalities.csv")]
    pub data_file: PathBuf,

    /// Id assignment for new records: reuse-max or monotonic
    #[arg(long, env = "ROADSTATS_ID_POLICY", default_value_t = IdPolicy::ReuseMax)]
    pub id_policy: IdPolicy,
}

impl AppConfig {
    /// Configuration with defaults and the given backing file.
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            data_file: data_file.into(),
            id_policy: IdPolicy::ReuseMax,
        }
    }

    /// Set the host
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the id policy
    pub fn id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
