//! # ll: LogLens operator CLI
//!
//! - `ll search`: Query a running hub and print one page of entries.
//! - `ll keys`: List the provider names a hub serves.
//! - `ll explain`: Print the SQL a provider would run, without a database.

use clap::{Parser, Subcommand};
use ll_core::params::{parse_timestamp, DEFAULT_PAGE_SIZE};
use ll_core::{Dialect, QueryParameters};

mod explain;
mod render;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Search structured logs across SQL and document stores.
#[derive(Parser)]
#[command(name = "ll", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by `search` and `explain`.
#[derive(clap::Args)]
struct FilterArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Entries per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    count: u32,

    /// Level name, alias or numeric code.
    #[arg(long)]
    level: Option<String>,

    /// Case-insensitive text matched against message and exception.
    #[arg(long)]
    search: Option<String>,

    /// Inclusive lower bound (ISO-8601).
    #[arg(long)]
    start: Option<String>,

    /// Exclusive upper bound (ISO-8601).
    #[arg(long)]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a running hub.
    Search {
        /// Hub base URL.
        #[arg(long, env = "LL_HUB", default_value = "http://127.0.0.1:3000")]
        hub: String,

        /// Provider name (defaults to the hub's first provider).
        #[arg(long)]
        key: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print the raw JSON response instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List the provider names a hub serves.
    Keys {
        /// Hub base URL.
        #[arg(long, env = "LL_HUB", default_value = "http://127.0.0.1:3000")]
        hub: String,
    },

    /// Print the fetch and count statements for a dialect.
    Explain {
        /// postgres, mysql, sqlite or sqlserver.
        #[arg(long)]
        dialect: Dialect,

        #[arg(long)]
        table: String,

        /// Defaults to `public` (postgres) or `dbo` (sqlserver).
        #[arg(long)]
        schema: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

impl FilterArgs {
    fn to_params(&self) -> Result<QueryParameters, BoxError> {
        let mut builder = QueryParameters::builder()
            .page(self.page)
            .page_size(self.count);
        if let Some(level) = &self.level {
            builder = builder.level(level.as_str());
        }
        if let Some(text) = &self.search {
            builder = builder.search_text(text.as_str());
        }
        if let Some(start) = parse_timestamp("start", self.start.as_deref().unwrap_or(""))? {
            builder = builder.start_date(start);
        }
        if let Some(end) = parse_timestamp("end", self.end.as_deref().unwrap_or(""))? {
            builder = builder.end_date(end);
        }
        Ok(builder.build()?)
    }

    /// Query string for `/api/logs`, in the hub's parameter names.
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("count", self.count.to_string()),
        ];
        let optional = [
            ("level", &self.level),
            ("searchCriteria", &self.search),
            ("startDate", &self.start),
            ("endDate", &self.end),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                pairs.push((name, value.clone()));
            }
        }
        pairs
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Explain {
            dialect,
            table,
            schema,
            filters,
        } => run_explain(dialect, &table, schema.as_deref(), &filters),

        cmd => match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(async_main(cmd)),
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_explain(
    dialect: Dialect,
    table: &str,
    schema: Option<&str>,
    filters: &FilterArgs,
) -> Result<(), BoxError> {
    let params = filters.to_params()?;
    let builder = explain::query_builder(dialect, schema, table)?;
    print!("{}", render::statement("fetch", dialect, &builder.fetch(&params)));
    println!();
    print!("{}", render::statement("count", dialect, &builder.count(&params)));
    Ok(())
}

async fn async_main(cmd: Commands) -> Result<(), BoxError> {
    let client = reqwest::Client::new();

    match cmd {
        Commands::Search {
            hub,
            key,
            filters,
            json,
        } => {
            // Validate locally so typos fail before the request.
            filters.to_params()?;
            let mut query = filters.query_pairs();
            if let Some(key) = key {
                query.push(("key", key));
            }

            let url = format!("{}/api/logs", hub.trim_end_matches('/'));
            let resp = client.get(&url).query(&query).send().await?;
            let body = checked_json(resp).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                let page: render::LogsResponse = serde_json::from_value(body)?;
                println!("{}", render::logs_table(&page));
            }
        }

        Commands::Keys { hub } => {
            let url = format!("{}/api/keys", hub.trim_end_matches('/'));
            let resp = client.get(&url).send().await?;
            let keys: Vec<String> = serde_json::from_value(checked_json(resp).await?)?;
            for key in keys {
                println!("{}", key);
            }
        }

        Commands::Explain { .. } => {}
    }
    Ok(())
}

/// The JSON body of a successful response, or the hub's `error` message.
async fn checked_json(resp: reqwest::Response) -> Result<serde_json::Value, BoxError> {
    let status = resp.status();
    let body = resp.json::<serde_json::Value>().await?;
    if status.is_success() {
        return Ok(body);
    }
    let message = body
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("request failed");
    Err(format!("hub returned {}: {}", status, message).into())
}
