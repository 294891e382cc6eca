//! HTTP front end: `POST /api/query` with `{"sql": "..."}` runs one statement
//! against a shared catalog and answers with the JSON query result.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use minidb::{Catalog, execute};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minidb-server")]
#[command(about = "In-memory SQL database over HTTP", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "MINIDB_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Name of the in-memory catalog
    #[arg(long, default_value = "main")]
    catalog: String,

    /// Log filter directive (e.g. `info`, `minidb=debug`)
    #[arg(long, env = "MINIDB_LOG", default_value = "info")]
    log: String,
}

/// One catalog shared by every connection; the lock serializes statements.
#[derive(Clone)]
struct AppState {
    catalog: Arc<Mutex<Catalog>>,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    sql: String,
}

/// Body of a request that never reached the executor.
#[derive(Debug, Serialize)]
struct RejectedRequest<'a> {
    success: bool,
    message: &'a str,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState {
        catalog: Arc::new(Mutex::new(Catalog::new(cli.catalog))),
    };

    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state).await }
            }))
        }
    });

    let server = match Server::try_bind(&cli.addr) {
        Ok(builder) => builder.serve(make_svc),
        Err(err) => {
            error!(addr = %cli.addr, error = %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %cli.addr, "listening");
    match server.await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "server error");
            ExitCode::FAILURE
        }
    }
}

async fn handle_request(req: Request<Body>, state: AppState) -> Result<Response<Body>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::POST, "/api/query") => Ok(handle_query(req, state).await),
        _ => Ok(rejected(StatusCode::NOT_FOUND, "ERROR: not found")),
    }
}

async fn handle_query(req: Request<Body>, state: AppState) -> Response<Body> {
    let bytes = match hyper::body::to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(_) => return rejected(StatusCode::BAD_REQUEST, "ERROR: invalid request body"),
    };

    let payload: QueryRequest = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(_) => return rejected(StatusCode::BAD_REQUEST, "ERROR: expected {\"sql\": string}"),
    };

    let result = match state.catalog.lock() {
        Ok(mut catalog) => execute(&mut catalog, &payload.sql),
        Err(_) => {
            return rejected(StatusCode::INTERNAL_SERVER_ERROR, "ERROR: catalog lock poisoned");
        }
    };
    debug!(sql = %payload.sql, success = result.success, "served query");

    // Statement failures are part of the result, not an HTTP error
    json_response(StatusCode::OK, &result)
}

fn rejected(status: StatusCode, message: &str) -> Response<Body> {
    json_response(
        status,
        &RejectedRequest {
            success: false,
            message,
        },
    )
}

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<Body> {
    let (status, body) = match serde_json::to_vec(body) {
        Ok(body) => (status, body),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"success":false,"message":"ERROR: failed to encode result"}"#.to_vec(),
        ),
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
