use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::B256;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use operator_vault::{
    decode_batch_with_limits, extract, preflight, DecodeLimits, Verdict, VaultConfig,
};
use operator_vault_encoder::{encode_batch, AllowListTree};
use operator_vault_types::{Descriptor, PinnedOffsets};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod manifest;

use manifest::{read_json, DescriptorSpec, OperationSpec};

/// Build allow-lists and batches for an operator vault, and check them before submission.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Vault configuration JSON; its decode limits apply to `decode` and `preflight`.
    #[arg(long, env = "VAULT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the allow-list root and every proof from a descriptor manifest.
    Tree {
        #[arg(long)]
        descriptors: PathBuf,

        /// Where to write the tree report (root, leaves, proofs).
        #[arg(long, default_value = "allowlist.json")]
        out: PathBuf,
    },
    /// Encode a batch manifest into submission bytes (hex on stdout).
    Encode {
        #[arg(long)]
        batch: PathBuf,

        /// Descriptor manifest used to fill in proofs left empty in the batch.
        #[arg(long)]
        descriptors: Option<PathBuf>,
    },
    /// Decode submission bytes and print them as a batch manifest.
    Decode {
        /// Hex-encoded batch (0x prefix optional).
        batch: String,
    },
    /// Extract the words at pinned offsets from a payload.
    Extract {
        /// Hex-encoded payload, selector included.
        payload: String,

        /// Comma-separated argument offsets.
        #[arg(long, value_delimiter = ',')]
        offsets: Vec<u16>,
    },
    /// Check constraints, proofs and pinned values of a batch without executing it.
    Preflight {
        batch: String,

        /// Authorization root to check against. Defaults to the root in `--config`.
        #[arg(long, env = "VAULT_ROOT")]
        root: Option<B256>,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref().map(read_json::<VaultConfig>).transpose()?;
    let limits = config.as_ref().map(|c| c.limits).unwrap_or_default();

    match &cli.command {
        Command::Tree { descriptors, out } => write_tree(descriptors, out),
        Command::Encode { batch, descriptors } => {
            let encoded = encode(batch, descriptors.as_deref())?;
            println!("0x{}", hex::encode(encoded));
            Ok(())
        }
        Command::Decode { batch } => {
            let operations = decode_batch_with_limits(&parse_hex(batch)?, &limits)?;
            let specs: Vec<OperationSpec> =
                operations.iter().map(OperationSpec::from_operation).collect();
            println!("{}", serde_json::to_string_pretty(&specs)?);
            Ok(())
        }
        Command::Extract { payload, offsets } => {
            let offsets = PinnedOffsets::new(offsets)
                .map_err(|e| anyhow!("{} offsets, at most 15 allowed", e.count))?;
            let extracted = extract(&parse_hex(payload)?, &offsets)?;
            for word in extracted.chunks(32) {
                println!("0x{}", hex::encode(word));
            }
            Ok(())
        }
        Command::Preflight { batch, root } => {
            let root = root.or_else(|| config.as_ref().map(|c| c.root)).ok_or_else(|| {
                anyhow!("missing root: pass --root, set VAULT_ROOT, or use --config")
            })?;
            run_preflight(&parse_hex(batch)?, root, &limits)
        }
    }
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let input = input.trim();
    hex::decode(input.strip_prefix("0x").unwrap_or(input)).context("invalid hex input")
}

fn load_descriptors(path: &Path) -> Result<Vec<Descriptor>> {
    let specs: Vec<DescriptorSpec> = read_json(path)?;
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| spec.to_descriptor().with_context(|| format!("descriptor {i}")))
        .collect()
}

fn write_tree(descriptors_path: &Path, out: &Path) -> Result<()> {
    let descriptors = load_descriptors(descriptors_path)?;
    let tree = AllowListTree::from_descriptors(&descriptors);
    info!(leaves = tree.len(), root = %tree.root(), "allow-list built");

    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let mut entries = Vec::with_capacity(tree.len());
    for i in 0..tree.len() {
        entries.push(json!({
            "index": i,
            "leaf": tree.leaf(i),
            "proof": tree.proof(i).unwrap_or_default(),
        }));
    }
    let report = json!({
        "root": tree.root(),
        "generated_at": now,
        "source": descriptors_path.display().to_string(),
        "leaves": entries,
    });

    write_json_atomic(out, &report)?;
    println!("{}", tree.root());
    Ok(())
}

fn encode(batch_path: &Path, descriptors_path: Option<&Path>) -> Result<Vec<u8>> {
    let specs: Vec<OperationSpec> = read_json(batch_path)?;
    let tree = descriptors_path
        .map(|p| load_descriptors(p).map(|d| AllowListTree::from_descriptors(&d)))
        .transpose()?;

    let mut operations = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        let mut op = spec.to_operation().with_context(|| format!("operation {i}"))?;
        if let (Some(tree), true) = (&tree, op.proof.is_empty()) {
            let leaf = op.leaf();
            let index = (0..tree.len())
                .find(|&j| tree.leaf(j) == Some(leaf))
                .ok_or_else(|| anyhow!("operation {i}: leaf {leaf} is not in the allow-list"))?;
            op.proof = tree.proof(index).unwrap_or_default();
            debug!(operation = i, descriptor = index, "proof filled in");
        }
        operations.push(op);
    }
    encode_batch(&operations).context("batch does not fit the wire format")
}

fn run_preflight(batch: &[u8], root: B256, limits: &DecodeLimits) -> Result<()> {
    let reports = preflight(batch, root, limits)?;
    let mut rejected = 0usize;
    for report in &reports {
        let verdict = match &report.verdict {
            Verdict::Authorized => "authorized".to_string(),
            Verdict::DependsOnResults => "pinned words depend on earlier results".to_string(),
            Verdict::Rejected(e) => {
                rejected += 1;
                format!("rejected: {e}")
            }
        };
        println!("#{} leaf {} {}", report.index, report.leaf, verdict);
    }
    if rejected > 0 {
        return Err(anyhow!("{rejected} of {} operations would be rejected", reports.len()));
    }
    Ok(())
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising report JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

