// Bill Splitter - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use bill_splitter::server::router;
use bill_splitter::{init_tracing, open_store, Backend};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bill-splitter-server", version, about = "Bill Splitter JSON API")]
struct Args {
    /// Directory holding the ledger files
    #[arg(long, env = "BILL_SPLITTER_DATA", default_value = ".")]
    data: PathBuf,

    /// Record store backing: csv or sqlite
    #[arg(long, env = "BILL_SPLITTER_BACKEND", default_value = "csv")]
    backend: String,

    /// Address to listen on
    #[arg(long, env = "BILL_SPLITTER_BIND", default_value = "127.0.0.1:3000")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("bill_splitter=info,tower_http=info");
    let args = Args::parse();

    println!("🌐 Bill Splitter - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let backend = Backend::parse(&args.backend)?;
    let store = open_store(backend, &args.data)?;
    println!("✓ Ledger opened: {:?} ({})", args.data, store.name());

    let app = router(store);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    println!("\n🚀 Server running on http://{}", args.bind);
    println!("   API: http://{}/api/summary", args.bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server failed")?;

    Ok(())
}
