//! # MongoDB Provider
//!
//! Reads documents written by `Serilog.Sinks.MongoDB`. The filter is built
//! from the same predicates as the SQL dialects and rendered as a query
//! document; paging uses the native `find` sort/skip/limit and the total
//! comes from `count_documents`.
//!
//! The [`Client`] is a shared handle. Create it once per URI with
//! [`connect`] and hand clones to every provider that reads through it.

pub mod filter;

pub use mongodb::Client;

use crate::aggregate;
use crate::error::{StoreError, StoreResult};
use crate::provider::DataProvider;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use ll_core::{
    ColumnMapping, ColumnOverrides, ConfigError, LevelFormat, PropertyType, QueryParameters,
    RawLogRecord, ResultPage,
};
use mongodb::bson::{Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::Collection;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How free-text search is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// `$text` against the collection's text index.
    #[default]
    Text,
    /// Case-insensitive `$regex` over message and exception.
    Pattern,
}

#[derive(Debug, Clone, Default)]
pub struct MongoOptions {
    pub name: Option<String>,
    /// Falls back to the database named in the connection URI.
    pub database: Option<String>,
    pub collection: String,
    pub columns: ColumnOverrides,
    pub search: SearchMode,
}

/// Parse `uri` and create the shared client. No connection is made until
/// the first query.
pub async fn connect(uri: &str) -> StoreResult<Client> {
    if uri.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "connection_string",
        }
        .into());
    }
    let options = ClientOptions::parse(uri).await?;
    Ok(Client::with_options(options)?)
}

pub struct MongoProvider {
    name: String,
    collection: Collection<Document>,
    columns: ColumnMapping,
    search: SearchMode,
}

impl MongoProvider {
    pub fn new(client: &Client, options: MongoOptions) -> Result<Self, ConfigError> {
        let database = match options.database.as_deref().map(str::trim) {
            Some(database) if !database.is_empty() => database.to_string(),
            _ => client
                .default_database()
                .map(|db| db.name().to_string())
                .ok_or(ConfigError::Missing { field: "database" })?,
        };
        let collection = options.collection.trim();
        if collection.is_empty() {
            return Err(ConfigError::Missing {
                field: "collection",
            });
        }
        let columns = ColumnMapping::mongodb().with_overrides(&options.columns)?;

        let name = match options.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("MongoDb.{}.{}", database, collection),
        };
        Ok(Self {
            name,
            collection: client.database(&database).collection(collection),
            columns,
            search: options.search,
        })
    }

    pub fn filter_for(&self, params: &QueryParameters) -> Document {
        let predicates = ll_core::filter::build(params, LevelFormat::Name);
        filter::render(&predicates, &self.columns, self.search)
    }

    async fn fetch_page(
        &self,
        query: Document,
        params: &QueryParameters,
    ) -> StoreResult<Vec<RawLogRecord>> {
        let cursor = self
            .collection
            .find(query)
            .sort(filter::newest_first(&self.columns))
            .skip(params.offset().unsigned_abs())
            .limit(params.limit())
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents
            .iter()
            .map(|document| decode_document(document, &self.columns))
            .collect()
    }

    async fn count(&self, query: Document) -> StoreResult<u64> {
        Ok(self.collection.count_documents(query).await?)
    }
}

#[async_trait::async_trait]
impl DataProvider for MongoProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_data(
        &self,
        params: &QueryParameters,
        cancel: &CancellationToken,
    ) -> StoreResult<ResultPage> {
        let query = self.filter_for(params);
        debug!(
            provider = %self.name,
            collection = %self.collection.name(),
            "mongo search"
        );
        aggregate::join_page(
            params,
            cancel,
            PropertyType::Json,
            self.fetch_page(query.clone(), params),
            self.count(query),
        )
        .await
    }
}

// =============================================================================
// Document Decoding
// =============================================================================

fn decode_document(document: &Document, columns: &ColumnMapping) -> StoreResult<RawLogRecord> {
    let text = |column: Option<&str>| column.and_then(|c| document.get(c)).and_then(bson_text);
    Ok(RawLogRecord {
        timestamp: bson_timestamp(document.get(columns.timestamp()))?,
        level: text(Some(columns.level())),
        message: text(Some(columns.message())),
        message_template: text(columns.message_template()),
        exception: text(Some(columns.exception())),
        properties: text(Some(columns.properties())),
        log_event: text(columns.log_event()),
        additional: columns
            .additional()
            .iter()
            .map(|field| (field.clone(), text(Some(field.as_str()))))
            .collect(),
    })
}

/// Strings pass through; nested documents and other values become
/// relaxed extended JSON.
fn bson_text(value: &Bson) -> Option<String> {
    match value {
        Bson::Null | Bson::Undefined => None,
        Bson::String(text) => Some(text.clone()),
        other => Some(other.clone().into_relaxed_extjson().to_string()),
    }
}

fn bson_timestamp(value: Option<&Bson>) -> StoreResult<DateTime<Utc>> {
    let decode_error = |reason: String| StoreError::Decode {
        column: "timestamp",
        reason,
    };
    match value {
        Some(Bson::DateTime(ts)) => DateTime::from_timestamp_millis(ts.timestamp_millis())
            .ok_or_else(|| decode_error(format!("{:?} is out of range", ts))),
        Some(Bson::String(text)) => DateTime::parse_from_rfc3339(text)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|err| decode_error(err.to_string())),
        Some(other) => Err(decode_error(format!("unexpected {:?}", other.element_type()))),
        None => Err(decode_error("field is missing".into())),
    }
}
