// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use kube::Client;
use kubevirt_worker::{
    credentials::{CredentialSource, SecretCredentialSource, StaticCredentialSource},
    crd::{CloudProfile, Cluster, SecretBinding, Shoot, Worker},
    manifest,
    scheme::Scheme,
    validation::{
        CloudProfileValidator, InMemoryLookup, KubeShootLookup, SecretValidator, ShootLookup,
        ShootValidator,
    },
    worker::MachineGenerator,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// Compiles KubeVirt worker pools and validates KubeVirt Gardener resources.
#[derive(Parser, Debug)]
#[command(name = "kubevirt-worker", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the machine classes, deployments, volumes and provider status of a worker as YAML
    Generate {
        /// Worker manifest
        #[arg(long)]
        worker: PathBuf,

        /// Cluster manifest holding the cloud profile and the shoot
        #[arg(long)]
        cluster: PathBuf,

        /// Provider cluster kubeconfig; read from the worker's secret when omitted
        #[arg(long)]
        kubeconfig: Option<PathBuf>,
    },

    /// Decode a provider payload and print it in canonical form
    Decode {
        /// Payload file (JSON or YAML) carrying apiVersion and kind
        file: PathBuf,

        /// Drop unknown fields instead of rejecting them
        #[arg(long)]
        lenient: bool,
    },

    /// Validate a shoot, or the update from --old to --shoot
    ValidateShoot {
        #[arg(long)]
        shoot: PathBuf,

        #[arg(long)]
        old: Option<PathBuf>,

        #[command(flatten)]
        objects: LookupArgs,
    },

    /// Validate the provider config of a cloud profile
    ValidateCloudProfile {
        #[arg(long)]
        cloud_profile: PathBuf,
    },

    /// Validate a cloud provider secret, or the update from --old to SECRET
    ValidateSecret {
        #[arg(value_name = "SECRET")]
        target: PathBuf,

        #[arg(long)]
        old: Option<PathBuf>,

        #[command(flatten)]
        objects: LookupArgs,
    },
}

/// Objects the validators look up; with --from-cluster they are read from the API server.
#[derive(clap::Args, Debug)]
struct LookupArgs {
    /// Read cloud profiles, secret bindings, secrets and shoots from the current cluster
    #[arg(long, conflicts_with_all = ["cloud_profile", "secret_binding", "secret", "shoots"])]
    from_cluster: bool,

    #[arg(long)]
    cloud_profile: Vec<PathBuf>,

    #[arg(long)]
    secret_binding: Vec<PathBuf>,

    #[arg(long)]
    secret: Vec<PathBuf>,

    /// Shoots that may use the validated secret
    #[arg(long = "existing-shoot")]
    shoots: Vec<PathBuf>,
}

impl LookupArgs {
    async fn lookup(&self) -> Result<Box<dyn ShootLookup>> {
        if self.from_cluster {
            debug!("Initializing Kubernetes client");
            let client = Client::try_default().await?;
            return Ok(Box::new(KubeShootLookup::new(client)));
        }

        let mut lookup = InMemoryLookup::new();
        for path in &self.cloud_profile {
            lookup = lookup.with_cloud_profile(manifest::load::<CloudProfile>(path).await?);
        }
        for path in &self.secret_binding {
            lookup = lookup.with_secret_binding(manifest::load::<SecretBinding>(path).await?);
        }
        for path in &self.secret {
            lookup = lookup.with_secret(manifest::load::<Secret>(path).await?);
        }
        for path in &self.shoots {
            lookup = lookup.with_shoot(manifest::load::<Shoot>(path).await?);
        }
        Ok(Box::new(lookup))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("kubevirt-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Logs go to stderr so that generated YAML on stdout stays clean.
    // RUST_LOG selects the level (default info), RUST_LOG_FORMAT=json switches to JSON.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    debug!("Logging initialized with file and line number tracking");
    let scheme = Scheme::new();

    match cli.command {
        Command::Generate {
            worker,
            cluster,
            kubeconfig,
        } => generate(&scheme, &worker, &cluster, kubeconfig.as_deref()).await,
        Command::Decode { file, lenient } => {
            let payload = RawExtension(manifest::load::<serde_json::Value>(&file).await?);
            let decoder = if lenient {
                scheme.lenient_decoder()
            } else {
                scheme.strict_decoder()
            };
            let config = decoder
                .decode_any(&payload)
                .with_context(|| format!("could not decode {}", file.display()))?;
            info!("Decoded {} from {}", config.kind(), file.display());
            print!("{}", serde_yaml::to_string(&scheme.encode_any(&config)?.0)?);
            Ok(())
        }
        Command::ValidateShoot {
            shoot,
            old,
            objects,
        } => {
            let new: Shoot = manifest::load(&shoot).await?;
            let old: Option<Shoot> = match old {
                Some(path) => Some(manifest::load(&path).await?),
                None => None,
            };
            let lookup = objects.lookup().await?;

            ShootValidator::new(&scheme, lookup.as_ref())
                .validate(&new, old.as_ref())
                .await
                .with_context(|| format!("shoot {} is invalid", shoot.display()))?;
            info!("Shoot {} is valid", shoot.display());
            Ok(())
        }
        Command::ValidateCloudProfile { cloud_profile } => {
            let profile: CloudProfile = manifest::load(&cloud_profile).await?;
            CloudProfileValidator::new(&scheme)
                .validate(&profile)
                .with_context(|| format!("cloud profile {} is invalid", cloud_profile.display()))?;
            info!("Cloud profile {} is valid", cloud_profile.display());
            Ok(())
        }
        Command::ValidateSecret {
            target,
            old,
            objects,
        } => {
            let new: Secret = manifest::load(&target).await?;
            let old: Option<Secret> = match old {
                Some(path) => Some(manifest::load(&path).await?),
                None => None,
            };
            let lookup = objects.lookup().await?;

            SecretValidator::new(lookup.as_ref())
                .validate(&new, old.as_ref())
                .await
                .with_context(|| format!("secret {} is invalid", target.display()))?;
            info!("Secret {} is valid", target.display());
            Ok(())
        }
    }
}

async fn generate(
    scheme: &Scheme,
    worker_path: &std::path::Path,
    cluster_path: &std::path::Path,
    kubeconfig_path: Option<&std::path::Path>,
) -> Result<()> {
    let worker: Worker = manifest::load(worker_path).await?;
    let cluster: Cluster = manifest::load(cluster_path).await?;

    let credentials: Box<dyn CredentialSource> = match kubeconfig_path {
        Some(path) => {
            let kubeconfig = manifest::read(path).await?;
            let secret_ref = &worker.spec.secret_ref;
            Box::new(StaticCredentialSource::new().with_kubeconfig(
                &secret_ref.namespace,
                &secret_ref.name,
                &kubeconfig,
            ))
        }
        None => {
            debug!("Initializing Kubernetes client");
            Box::new(SecretCredentialSource::new(Client::try_default().await?))
        }
    };

    let output = MachineGenerator::new(scheme, credentials.as_ref())
        .generate(&worker, &cluster)
        .await
        .and_then(|result| result.into_output(scheme, &worker))
        .with_context(|| format!("generation for worker {} failed", worker_path.display()))?;

    for image in &output.retired_machine_images {
        info!("Machine image {} {} is no longer in use", image.name, image.version);
    }
    print!("{}", serde_yaml::to_string(&output)?);
    Ok(())
}
