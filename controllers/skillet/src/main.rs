//! skillet
//!
//! Creates and deletes local kind clusters from a declarative config:
//! - create: provisions the cluster, deploys the configured applications and
//!   installs the default Helm charts
//! - delete: tears a cluster down and prunes it from the kubeconfig
//! - validate: checks a config file without touching any cluster

mod cancel;
mod controller;
mod error;
mod installer;
mod naming;
mod oracle;
mod reconciler;
mod settings;
mod topology;
mod validate;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod controller_test;

use clap::{Parser, Subcommand};
use cluster_config::ClusterConfig;
use controller::{Collaborators, CreateRequest, LifecycleController};
use error::LifecycleError;
use settings::LifecycleSettings;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Manage local kind clusters from a declarative config
#[derive(Debug, Parser)]
#[command(name = "skillet", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// kubeconfig list to read contexts from; the first entry is pruned on delete
    #[arg(long, global = true, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Default resource (Helm chart) manifest installed into new clusters
    #[arg(long, global = true, env = "SKILLET_CHARTS_MANIFEST")]
    charts_manifest: Option<PathBuf>,

    /// Cancel the operation after this many seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a cluster, optionally from a config file
    Create {
        /// Cluster name; must match the config file's name if both are given
        #[arg(short, long)]
        name: Option<String>,
        /// Cluster config file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete a cluster
    Delete {
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Validate a cluster config file
    Validate {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print the JSON Schema of the cluster config file
    Schema,
}

impl Cli {
    fn settings(&self) -> LifecycleSettings {
        let mut settings = LifecycleSettings::from_env();
        if let Some(kubeconfig) = &self.kubeconfig {
            // KUBECONFIG may hold a list; clap hands us the raw value
            settings.set_kubeconfig(kubeconfig.as_os_str());
        }
        if let Some(manifest) = &self.charts_manifest {
            settings.charts_manifest = manifest.clone();
        }
        settings
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Exit status for a failed run: the lifecycle family's code, else 1
fn exit_status(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<LifecycleError>() {
        Some(lifecycle) => {
            debug!("Failure class: {:?}", lifecycle.code());
            lifecycle.exit_code()
        }
        None => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::Schema = cli.command {
        let schema = ClusterConfig::json_schema()?;
        println!("{}", schema);
        return Ok(());
    }

    // kube and reqwest both use rustls; pin the provider before either builds a client
    let _ = rustls::crypto::ring::default_provider().install_default();

    let settings = cli.settings();
    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, cli.timeout.map(Duration::from_secs));

    let collaborators = Collaborators::production(&settings)?;
    let controller = LifecycleController::new(settings, collaborators, cancel);

    match cli.command {
        Command::Create { name, file } => {
            let request = CreateRequest { name, config: file };
            controller.create(&request).await?;
        }
        Command::Delete { name } => {
            controller.delete(name.as_deref()).await?;
        }
        Command::Validate { file } => {
            let config = controller.validate(&file).await?;
            info!(
                "{} is valid: cluster {} with {} application(s)",
                file.display(),
                config.name,
                config.applications.len()
            );
        }
        Command::Schema => {}
    }
    Ok(())
}

/// Cancel `token` on Ctrl-C or once `timeout` elapses
fn spawn_cancel_triggers(token: &CancellationToken, timeout: Option<Duration>) {
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    if let Some(timeout) = timeout {
        let on_deadline = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = on_deadline.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    warn!("Timed out after {}s, cancelling", timeout.as_secs());
                    on_deadline.cancel();
                }
            }
        });
    }
}
