// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use bffgate::backends::ReqwestTransport;
use bffgate::config::{load_and_compile, watch_config};
use bffgate::connection::Gateway;
use bffgate::engine::{HandlerMap, MethodRegistry};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const WATCH_INTERVAL: Duration = Duration::from_secs(2);

struct Args {
    config: PathBuf,
    call: Option<String>,
    watch: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut config = None;
    let mut call = None;
    let mut watch = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--call" => call = Some(args.next().context("--call needs a JSON argument")?),
            "--watch" => watch = true,
            _ if config.is_none() => config = Some(PathBuf::from(arg)),
            other => bail!("unexpected argument '{other}'"),
        }
    }

    let Some(config) = config else {
        eprintln!("Usage: bffgate <config.yaml> [--call '<json>'] [--watch]");
        eprintln!("Example: bffgate configs/profile.yaml --call '{{\"method\": \"getProfile\", \"params\": {{\"user_id\": \"u1\"}}}}'");
        std::process::exit(1);
    };
    Ok(Args {
        config,
        call,
        watch,
    })
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;

    let (cfg, handlers) = load_and_compile(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    println!("🚀 bffgate");
    println!("═══════════════════════════════════");
    println!("Config: {}", args.config.display());
    print_methods(&handlers);

    let registry = Arc::new(MethodRegistry::with_handlers(handlers));
    let http = ReqwestTransport::new(cfg.invocation.timeout())?;
    let gateway = Gateway::new(Arc::clone(&registry), cfg.invocation.clone())
        .with_http_transport(Arc::new(http));

    if let Some(call) = &args.call {
        run_call(&gateway, call).await?;
    }

    if args.watch {
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn(watch_config(
            args.config.clone(),
            registry,
            WATCH_INTERVAL,
            cancel.clone(),
        ));
        println!("\n👀 Watching {} (Ctrl-C to stop)", args.config.display());
        tokio::signal::ctrl_c().await?;
        cancel.cancel();
        watcher.await?;
    }

    Ok(())
}

fn print_methods(handlers: &HandlerMap) {
    let mut methods: Vec<_> = handlers.values().collect();
    methods.sort_by(|a, b| a.method().cmp(b.method()));

    println!("Methods: {}", methods.len());
    for handler in methods {
        println!("\n  {}", handler.method());
        for (field, kind) in handler.validator().fields() {
            println!("    param {}: {}", field, kind.as_str());
        }
        for plan in handler.steps() {
            let deps = if plan.depends_on.is_empty() {
                String::new()
            } else {
                format!(" <- {}", plan.depends_on.join(", "))
            };
            println!(
                "    step  {} [{}]{}",
                plan.processor.name(),
                plan.processor.kind(),
                deps
            );
        }
    }
}

/// Run one call through a session whose push upstream echoes every frame back.
async fn run_call(gateway: &Gateway, call: &str) -> Result<()> {
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (upstream_tx, mut upstream_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let session = Arc::new(gateway.session(Arc::new(client_tx), Arc::new(upstream_tx)));

    let loopback = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            while let Some(frame) = upstream_rx.recv().await {
                session.on_upstream_frame(frame).await;
            }
        })
    };

    session.on_client_frame(call.as_bytes().to_vec()).await;
    let reply = client_rx
        .recv()
        .await
        .context("session ended without a reply")?;

    let pretty = match serde_json::from_slice::<serde_json::Value>(&reply) {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(_) => String::from_utf8_lossy(&reply).into_owned(),
    };
    println!("\n📤 Reply:\n{pretty}");

    session.close().await;
    loopback.abort();
    Ok(())
}
