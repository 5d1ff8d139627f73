// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The `protosize` driver: reads a serialized protobuf payload, measures it
//! against a schema with `protosize-wire`, assembles the pprof size profile
//! with `protosize`, and writes the result. All profiling logic lives in
//! those crates; this binary is glue and exit codes.

use anyhow::Context;
use clap::Parser;
use protosize::internal::SizeProfile;
use protosize_wire::{compute_size_profile, SchemaIndex};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Profile which fields of a serialized protobuf payload consume the most
/// bytes, writing a pprof-compatible size profile.
#[derive(Parser, Debug)]
#[command(name = "protosize", version)]
struct Cli {
    /// Serialized protobuf payload to profile.
    input: PathBuf,

    /// Where to write the pprof-encoded size profile.
    output: PathBuf,

    /// Compiled descriptor set (`protoc --descriptor_set_out`) describing
    /// the payload.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,

    /// Fully qualified root message type. Defaults to the first message
    /// type of the schema's last file.
    #[arg(long, value_name = "NAME")]
    root_message: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    // clap's own error path would exit 2; this tool's contract is exit 1
    // for every failure, usage errors included.
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(1);
    });

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let payload = fs::read(&cli.input)
        .with_context(|| format!("could not read input path ({})", cli.input.display()))?;

    let descriptor_bytes = fs::read(&cli.schema)
        .with_context(|| format!("could not read schema path ({})", cli.schema.display()))?;
    let index = SchemaIndex::from_descriptor_set_bytes(&descriptor_bytes)
        .with_context(|| format!("could not resolve schema ({})", cli.schema.display()))?;
    let root = index.resolve_root(cli.root_message.as_deref())?;
    info!(
        root = root.full_name(),
        payload_bytes = payload.len(),
        "profiling payload"
    );

    let samples = compute_size_profile(&payload, root, &index)
        .with_context(|| format!("could not walk input ({})", cli.input.display()))?;
    debug!(distinct_paths = samples.len(), "walk complete");

    let encoded = SizeProfile::assemble(samples)?;

    let mut output = File::create(&cli.output)
        .with_context(|| format!("could not open output path ({})", cli.output.display()))?;
    output
        .write_all(&encoded)
        .and_then(|()| output.sync_all())
        .with_context(|| format!("could not write output path ({})", cli.output.display()))?;
    info!(bytes = encoded.len(), path = %cli.output.display(), "wrote size profile");

    Ok(())
}
