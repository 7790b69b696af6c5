// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use gaffer_lookupd::{env, ListenCtx, Listener};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = env::listen_addr();
    let tcp = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "lookupd listening");

    let ctx = Arc::new(ListenCtx::new(env::idle_cutoff()));
    Listener::new(tcp, ctx).run().await;

    Ok(())
}
