//! Interactive driver for the admission gate.
//!
//! Reads lines from stdin. `join <user_id> <reason>` simulates a join request;
//! anything else is treated as a chat message and passed to the command
//! handler, e.g. `/ga add student`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gate_config::GateConfig;
use gate_kernel::{AdmissionService, CommandContext, CommandHandler};
use gate_notify::LogNotifier;
use gate_policy::JoinRequest;
use gate_primitives::{GroupId, UserId};
use gate_store::MemoryStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Simulate group join requests against the admission gate")]
struct Args {
    /// JSON configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Group the simulated chat takes place in.
    #[arg(long, default_value = "demo-group")]
    group: String,

    /// User issuing commands.
    #[arg(long, default_value = "admin")]
    sender: String,

    /// Fallback log filter when `RUST_LOG` is unset.
    #[arg(long, default_value = gate_telemetry::DEFAULT_FILTER)]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    gate_telemetry::init_tracing(&args.log)?;

    let config = match &args.config {
        Some(path) => GateConfig::from_path(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => GateConfig::default(),
    };

    let group = GroupId::new(args.group)?;
    let sender = UserId::new(args.sender)?;

    let notifier = Arc::new(LogNotifier::new(config.admin_notification_platform.clone()));
    let service = Arc::new(AdmissionService::new(
        Arc::new(MemoryStore::new()),
        notifier,
        config,
    ));
    let console = CommandHandler::new(Arc::clone(&service));
    let ctx = CommandContext::group(group.clone(), sender);

    info!(
        group_id = %group,
        prefix = console.parser().prefix(),
        "ready; type `join <user_id> <reason>` or a command"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("join ") {
            let Some((user, reason)) = rest.trim().split_once(char::is_whitespace) else {
                println!("usage: join <user_id> <reason>");
                continue;
            };
            let request = JoinRequest::new(group.clone(), UserId::new(user)?, reason.trim());
            let admission = service.handle(&request).await?;
            println!(
                "{} {}: {}",
                if admission.approved() { "APPROVE" } else { "REJECT" },
                request.requester_id(),
                admission.summary()
            );
            admission.delivery().await;
            continue;
        }

        match console.respond(&ctx, line).await {
            Some(reply) => println!("{reply}"),
            None => {
                let prefix = console.parser().prefix();
                println!("(not a command; commands start with /{prefix})");
            }
        }
    }

    service.dispatch_pool().close();
    Ok(())
}
