// Copyright 2020 Boban Acimovic
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

#[macro_use]
extern crate log;
use std::path::{Path, PathBuf};

use anyhow::Context;
use charm_certificates::{
    relation::{
        certificates_events, CertificatesEvent, CertificatesProvides, CertificatesRequires,
    },
    render_certificate, render_self_signed_issuer, resources_from_yaml,
    resources_from_yaml_strict,
    template::IssuerKind,
    CertificateRequest, CustomResourceInstance, KubeApi, Outcome,
};
use clap::{Parser, Subcommand};
use kube::Client;

/// cert-manager resources for the certificates relation
#[derive(Parser, Debug)]
#[command(name = "certificates")]
struct Opt {
    /// Sets a custom config file
    #[arg(short, long, default_value = "certificates.toml")]
    config: PathBuf,

    /// Overrides the certificate name
    #[arg(long)]
    name: Option<String>,

    /// Overrides the namespace certificates are created in
    #[arg(short, long)]
    namespace: Option<String>,

    /// Overrides the certificate common name
    #[arg(long, global = true)]
    common_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rendered certificate manifest
    Render {
        /// Also render the self-signed issuer the certificate refers to
        #[arg(long)]
        with_issuer: bool,
    },
    /// Create every resource in a manifest file
    Apply {
        file: PathBuf,
        /// Fail on documents of unrecognized kind
        #[arg(long)]
        strict: bool,
    },
    /// Delete every resource in a manifest file
    Delete {
        file: PathBuf,
        /// Fail on documents of unrecognized kind
        #[arg(long)]
        strict: bool,
    },
    /// Request a certificate through the relation
    Request,
    /// Report missing cert-manager CRDs
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::parse();
    debug!("Options: {:#?}", opt);

    let mut cfg: CertificateRequest = confy::load_path(&opt.config)
        .with_context(|| format!("failed loading config {}", opt.config.display()))?;
    apply_overrides(&opt, &mut cfg);
    debug!("Config: {:#?}", cfg);

    match opt.command {
        Command::Render { with_issuer } => {
            if with_issuer {
                let ns = match cfg.issuer_kind {
                    IssuerKind::Issuer => Some(cfg.namespace.as_str()),
                    IssuerKind::ClusterIssuer => None,
                };
                print!("{}", render_self_signed_issuer(&cfg.issuer_name, ns)?);
                println!("---");
            }
            print!("{}", render_certificate(&cfg)?);
        }
        Command::Apply { file, strict } => {
            let resources = load_file(&file, strict)?;
            let api = KubeApi::new(Client::try_default().await?);
            warn_missing_crds(&api).await;

            let mut outcomes = Vec::with_capacity(resources.len());
            for resource in resources.iter() {
                outcomes.push(resource.create(&api).await);
            }
            summarize("created", &resources, &outcomes);
        }
        Command::Delete { file, strict } => {
            let resources = load_file(&file, strict)?;
            let api = KubeApi::new(Client::try_default().await?);

            // Dependents first, so certificates go before their issuers.
            let mut outcomes = Vec::with_capacity(resources.len());
            for resource in resources.iter().rev() {
                outcomes.push(resource.delete(&api).await);
            }
            outcomes.reverse();
            summarize("deleted", &resources, &outcomes);
        }
        Command::Request => {
            let api = KubeApi::new(Client::try_default().await?);
            let (events, mut rx) = certificates_events();
            let provides =
                CertificatesProvides::new(cfg.namespace.clone(), cfg.clone(), events.clone());
            let requires = CertificatesRequires::new(events);

            requires.request_certificate(cfg.common_name.clone())?;
            for event in provides.process_pending(&mut rx, &api).await {
                if let CertificatesEvent::ResourceCreated {
                    kind,
                    name,
                    outcome,
                } = event
                {
                    match outcome {
                        Outcome::Failed(e) => warn!("{} {} was not created: {}", kind, name, e),
                        _ => info!("{} {} created", kind, name),
                    }
                }
            }
        }
        Command::Check => {
            let api = KubeApi::new(Client::try_default().await?);
            let missing = api.missing_crds().await;
            if missing.is_empty() {
                info!("all cert-manager CRDs are installed");
            }
            for kind in missing {
                println!("missing crd {}", kind.crd_name());
            }
        }
    }

    Ok(())
}

fn apply_overrides(opt: &Opt, cfg: &mut CertificateRequest) {
    if let Some(name) = &opt.name {
        cfg.name = name.clone();
    }
    if let Some(ns) = &opt.namespace {
        cfg.namespace = ns.clone();
    }
    if let Some(cn) = &opt.common_name {
        cfg.common_name = cn.clone();
    }
}

fn load_file(file: &Path, strict: bool) -> anyhow::Result<Vec<CustomResourceInstance>> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed reading manifest {}", file.display()))?;
    let resources = if strict {
        resources_from_yaml_strict(&raw)?
    } else {
        resources_from_yaml(&raw)?
    };
    info!("loaded {} resources from {}", resources.len(), file.display());
    Ok(resources)
}

async fn warn_missing_crds(api: &KubeApi) {
    for kind in api.missing_crds().await {
        warn!(
            "crd {} not found, {} resources will be rejected",
            kind.crd_name(),
            kind
        );
    }
}

fn summarize(verb: &str, resources: &[CustomResourceInstance], outcomes: &[Outcome]) {
    let failed: Vec<String> = resources
        .iter()
        .zip(outcomes)
        .filter(|(_, o)| o.is_failed())
        .map(|(r, _)| r.full_name())
        .collect();
    if failed.is_empty() {
        info!("{} {} resources", verb, resources.len());
    } else {
        error!(
            "{} {} of {} resources, failed: {}",
            verb,
            resources.len() - failed.len(),
            resources.len(),
            failed.join(", ")
        );
    }
}
