// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generates the CustomResourceDefinition YAML for the operator.
//!
//! Run with `cargo run --bin crdgen` and apply the output with kubectl, or
//! write it to a file with `--output`.

use clap::Parser;
use kube::CustomResourceExt;
use nephio_adapter::crd::NetworkSliceIntent;

#[derive(Parser)]
#[command(name = "crdgen", about = "Generate NetworkSliceIntent CRD YAML")]
struct Args {
    /// Write the CRD to this file instead of stdout
    #[arg(short, long)]
    output: Option<std::path::PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let crd = NetworkSliceIntent::crd();
    let yaml = serde_yaml::to_string(&crd)?;

    match args.output {
        Some(path) => std::fs::write(&path, yaml)?,
        None => print!("{yaml}"),
    }
    Ok(())
}
