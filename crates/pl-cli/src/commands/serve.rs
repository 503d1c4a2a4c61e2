//! JSON-lines request/response loop over the provenance service.
//!
//! One request object per input line, one response object per output line:
//!
//! ```text
//! {"op":"create","productId":"BIKE-001","owner":"A","metadata":"frame 54cm"}
//! {"ok":true,"result":{"productId":"BIKE-001","kind":"Manufacture",...}}
//! ```

use anyhow::{Context, Result};
use clap::Args;
use pl_service::{LedgerError, ProvenanceService, QueryFilters};
use pl_store::history_digest;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Read requests from this file instead of stdin.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

/// A single inbound call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Request {
    Create {
        product_id: String,
        owner: String,
        #[serde(default)]
        metadata: Option<String>,
    },
    Transfer {
        product_id: String,
        current_owner: String,
        next_owner: String,
    },
    Repair {
        product_id: String,
        owner: String,
        #[serde(default)]
        metadata: Option<String>,
    },
    History {
        product_id: String,
    },
    Recent {
        #[serde(default)]
        limit: Option<usize>,
    },
    Query(QueryFilters),
    Verify {
        product_id: String,
    },
}

impl Request {
    fn op(&self) -> &'static str {
        match self {
            Request::Create { .. } => "create",
            Request::Transfer { .. } => "transfer",
            Request::Repair { .. } => "repair",
            Request::History { .. } => "history",
            Request::Recent { .. } => "recent",
            Request::Query(_) => "query",
            Request::Verify { .. } => "verify",
        }
    }
}

/// Why a request produced no result.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Counters reported when a session ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub requests: usize,
    pub failures: usize,
}

/// Execute one request against the service.
pub fn handle_request(
    service: &ProvenanceService,
    request: Request,
) -> Result<Value, RequestError> {
    let value = match request {
        Request::Create {
            product_id,
            owner,
            metadata,
        } => to_value(&*service.create_product(&product_id, metadata, &owner)?)?,
        Request::Transfer {
            product_id,
            current_owner,
            next_owner,
        } => to_value(&*service.transfer_ownership(&product_id, &current_owner, &next_owner)?)?,
        Request::Repair {
            product_id,
            owner,
            metadata,
        } => to_value(&*service.record_repair(&product_id, &owner, metadata)?)?,
        Request::History { product_id } => to_value(&service.get_history(&product_id)?)?,
        Request::Recent { limit } => to_value(&service.get_recent(limit))?,
        Request::Query(filters) => to_value(&service.query_all(&filters))?,
        Request::Verify { product_id } => {
            service.verify_custody(&product_id)?;
            let history = service.get_history(&product_id)?;
            json!({
                "productId": product_id,
                "valid": true,
                "events": history.len(),
                "currentOwner": history.last().map(|e| e.owner.clone()),
                "digest": history_digest(history.iter().map(Arc::as_ref)),
            })
        }
    };
    Ok(value)
}

fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<Value> {
    serde_json::to_value(value)
}

fn error_code(err: &RequestError) -> &'static str {
    match err {
        RequestError::Ledger(LedgerError::DuplicateProduct(_)) => "DuplicateProduct",
        RequestError::Ledger(LedgerError::UnknownProduct(_)) => "UnknownProduct",
        RequestError::Ledger(LedgerError::OwnershipMismatch { .. }) => "OwnershipMismatch",
        RequestError::Ledger(LedgerError::CustodyViolation { .. }) => "CustodyViolation",
        RequestError::Serialization(_) => "Internal",
    }
}

fn failure(code: &str, message: String) -> Value {
    json!({ "ok": false, "error": { "code": code, "message": message } })
}

/// Turn one input line into one response object.
pub fn respond(service: &ProvenanceService, line: &str) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "unparseable request");
            return failure("BadRequest", err.to_string());
        }
    };

    let op = request.op();
    match handle_request(service, request) {
        Ok(result) => {
            debug!(op, "request succeeded");
            json!({ "ok": true, "result": result })
        }
        Err(err @ RequestError::Serialization(_)) => {
            error!(op, error = %err, "request result could not be serialized");
            failure(error_code(&err), err.to_string())
        }
        Err(err) => {
            info!(op, code = error_code(&err), error = %err, "request failed");
            failure(error_code(&err), err.to_string())
        }
    }
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub fn run_session<R: BufRead, W: Write>(
    service: &ProvenanceService,
    reader: R,
    mut writer: W,
) -> Result<SessionStats> {
    let mut stats = SessionStats::default();
    for line in reader.lines() {
        let line = line.context("failed to read request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = respond(service, &line);
        stats.requests += 1;
        if response["ok"] != Value::Bool(true) {
            stats.failures += 1;
        }

        serde_json::to_writer(&mut writer, &response).context("failed to write response")?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    Ok(stats)
}

/// Handle `pl serve`.
pub fn cmd_serve(service: &ProvenanceService, args: ServeArgs) -> Result<()> {
    let stdout = io::stdout();
    let stats = match args.input {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open request file {}", path.display()))?;
            run_session(service, BufReader::new(file), stdout.lock())?
        }
        None => run_session(service, io::stdin().lock(), stdout.lock())?,
    };
    info!(
        requests = stats.requests,
        failures = stats.failures,
        products = service.store().product_count(),
        events = service.store().event_count(),
        "session finished"
    );
    Ok(())
}
