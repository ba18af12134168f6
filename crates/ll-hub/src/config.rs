//! # Hub Configuration
//!
//! TOML file with a `[server]` table and one `[[providers]]` entry per
//! configured sink. Providers are constructed, and their options
//! validated, before the server accepts a request.

use crate::registry::ProviderRegistry;
use ll_core::ColumnOverrides;
use ll_store::{
    DataProvider, MySqlProvider, PostgresProvider, PostgresSink, RelationalOptions,
    SqliteProvider,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}
fn default_max_page_size() -> u32 {
    500
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Postgres,
    Mysql,
    Sqlite,
    Sqlserver,
    Mongodb,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(default)]
    pub name: Option<String>,
    pub connection_string: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// Table, or collection for MongoDB.
    pub table: String,
    /// MongoDB only.
    #[serde(default)]
    pub database: Option<String>,
    /// PostgreSQL only.
    #[serde(default)]
    pub sink: PostgresSink,
    /// MongoDB only.
    #[cfg(feature = "mongo")]
    #[serde(default)]
    pub search: ll_store::SearchMode,
    #[serde(default)]
    pub columns: ColumnOverrides,
}

impl ProviderConfig {
    fn relational(&self) -> RelationalOptions {
        RelationalOptions {
            connection_string: self.connection_string.clone(),
            name: self.name.clone(),
            schema: self.schema.clone(),
            table: self.table.clone(),
            columns: self.columns.clone(),
        }
    }
}

impl Config {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, BoxError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Construct every configured provider. MongoDB clients are shared by all
/// providers using the same connection string.
pub async fn build_registry(providers: &[ProviderConfig]) -> Result<ProviderRegistry, BoxError> {
    let mut registry = ProviderRegistry::new();
    #[cfg(feature = "mongo")]
    let mut mongo_clients: std::collections::HashMap<String, ll_store::mongo::Client> =
        std::collections::HashMap::new();

    for config in providers {
        let provider: Arc<dyn DataProvider> = match config.kind {
            ProviderKind::Postgres => {
                Arc::new(PostgresProvider::new(config.relational(), config.sink)?)
            }
            ProviderKind::Mysql => Arc::new(MySqlProvider::new(config.relational())?),
            ProviderKind::Sqlite => Arc::new(SqliteProvider::new(config.relational())?),
            #[cfg(feature = "sqlserver")]
            ProviderKind::Sqlserver => {
                Arc::new(ll_store::SqlServerProvider::new(config.relational())?)
            }
            #[cfg(not(feature = "sqlserver"))]
            ProviderKind::Sqlserver => {
                return Err("SQL Server support not compiled. Rebuild with --features sqlserver".into());
            }
            #[cfg(feature = "mongo")]
            ProviderKind::Mongodb => {
                let client = match mongo_clients.get(&config.connection_string) {
                    Some(client) => client.clone(),
                    None => {
                        let client = ll_store::mongo::connect(&config.connection_string).await?;
                        mongo_clients.insert(config.connection_string.clone(), client.clone());
                        client
                    }
                };
                Arc::new(ll_store::MongoProvider::new(
                    &client,
                    ll_store::MongoOptions {
                        name: config.name.clone(),
                        database: config.database.clone(),
                        collection: config.table.clone(),
                        columns: config.columns.clone(),
                        search: config.search,
                    },
                )?)
            }
            #[cfg(not(feature = "mongo"))]
            ProviderKind::Mongodb => {
                return Err("MongoDB support not compiled. Rebuild with --features mongo".into());
            }
        };
        tracing::info!(provider = provider.name(), kind = ?config.kind, "provider ready");
        registry.register(provider)?;
    }
    Ok(registry)
}
