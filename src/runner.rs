//! Process modes: serve lookups, or resolve a batch against a running server.

use std::io::Write;
use std::sync::Arc;

use prometheus::Registry;
use tracing::{debug, info};

use crate::client::{ResolvedCode, SearchClient};
use crate::config::{CallType, Config, ConfigError};
use crate::error::LookupError;
use crate::loader::load_csv;
use crate::observability::LookupMetrics;
use crate::resolver::PrefixResolver;
use crate::server::{start_server, ServerOptions};
use crate::shutdown::wait_for_signal;
use crate::store::PrefixStore;

/// Loads the prefix table, serves until SIGINT/SIGTERM, then shuts down.
pub async fn run_server(config: &Config) -> Result<(), LookupError> {
    let store = Arc::new(PrefixStore::new());
    load_csv(&config.data_file, &store)?;

    let resolver = Arc::new(PrefixResolver::new(Arc::clone(&store)));
    let registry = Registry::new();
    let metrics = LookupMetrics::new(&registry).map_err(|e| LookupError::Internal(e.into()))?;

    let options = ServerOptions::from_config(&config.server)?;
    let handle = start_server(resolver, options, Some(metrics)).await?;
    info!(addr = %handle.local_addr(), prefixes = store.len(), "Lookup service ready");

    handle
        .serve_until(wait_for_signal(), config.shutdown_timeout())
        .await
}

/// Resolves `SEARCH` against the configured server and writes one line per
/// number to `out`.
pub async fn run_client<W: Write>(config: &Config, out: &mut W) -> Result<(), LookupError> {
    let numbers = parse_search(&config.search)?;
    let mut client = SearchClient::connect(&config.client).await?;
    let resolved = resolve_batch(&mut client, &numbers, config.call_type).await?;

    for code in &resolved {
        writeln!(out, "{code}").map_err(|e| LookupError::Internal(e.into()))?;
    }
    Ok(())
}

/// Resolves `numbers` with the requested call type.
///
/// NotFound is reported per number in both modes; any other failure ends
/// the batch.
pub async fn resolve_batch(
    client: &mut SearchClient,
    numbers: &[String],
    call_type: CallType,
) -> Result<Vec<ResolvedCode>, LookupError> {
    match call_type {
        CallType::Streaming => client.streaming_get_code_by_number(numbers).await,
        CallType::Unary => {
            let mut resolved = Vec::with_capacity(numbers.len());
            for number in numbers {
                let code = match client.get_code_by_number(number).await {
                    Ok(code) => ResolvedCode::Found(code),
                    Err(err) if err.is_not_found() => ResolvedCode::NotFound,
                    Err(err) => return Err(err),
                };
                debug!(%number, %code, "Resolved");
                resolved.push(code);
            }
            Ok(resolved)
        }
    }
}

/// Splits the `SEARCH` value into numbers.
///
/// Spaces are removed and empty entries skipped.
pub fn parse_search(search: &str) -> Result<Vec<String>, LookupError> {
    let numbers: Vec<String> = search
        .replace(' ', "")
        .split(',')
        .filter(|number| !number.is_empty())
        .map(str::to_string)
        .collect();

    if numbers.is_empty() {
        return Err(ConfigError::ParseError {
            name: "SEARCH".to_string(),
            reason: "no phone numbers to search".to_string(),
        }
        .into());
    }
    Ok(numbers)
}
