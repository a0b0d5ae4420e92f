//! notary CLI - Command line interface for notary_tree
//!
//! Every command prints one JSON document on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use notary_tree::canonical::canonicalize_str;
use notary_tree::hasher::hash_canonical;
use notary_tree::merkle::ProofEntry;
use notary_tree::{verify, Config, Error, Hash, Notary, RecordInput, StoreFormat};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notary")]
#[command(about = "Tamper-evident notarization with per-day Merkle trees")]
#[command(version)]
struct Cli {
    /// Directory holding the per-identity store files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Store file encoding
    #[arg(long)]
    store: Option<StoreArg>,

    /// Attach the reversible demo tag to receipts (NOT confidential)
    #[arg(long)]
    insecure_demo_tag: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum StoreArg {
    Json,
    Compact,
}

impl From<StoreArg> for StoreFormat {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Json => StoreFormat::Json,
            StoreArg::Compact => StoreFormat::Compact,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Notarize a record and print its receipt
    Notarize {
        /// Identity the record belongs to
        identity: String,
        /// Record content (a string)
        content: Option<String>,
        /// Read the content from a file instead
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
        #[arg(long, default_value = "")]
        provider: String,
        #[arg(long, default_value = "")]
        model: String,
        #[arg(long, default_value = "none")]
        fingerprint: String,
        #[arg(long)]
        content_type: Option<String>,
        /// Unix seconds (defaults to now)
        #[arg(long)]
        created: Option<u64>,
    },

    /// Prove a leaf against its tree's current root
    Proof {
        identity: String,
        /// Content hash (hex, optional 0x)
        hash: String,
    },

    /// Check a proof without any store
    Verify {
        /// Leaf hash
        leaf: String,
        /// Claimed root
        root: String,
        /// JSON proof: a list of entries or a full inclusion proof
        proof: String,
    },

    /// List an identity's trees
    Trees { identity: String },

    /// Show an archived leaf with its ledger registration payload
    Leaf { identity: String, hash: String },

    /// Print the anchoring payload for a tree
    Anchor { identity: String, tree_id: String },

    /// Print the canonical form of a JSON document and its leaf hash
    Canonicalize { json: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Notarize {
            ref identity,
            ref content,
            ref file,
            ref provider,
            ref model,
            ref fingerprint,
            ref content_type,
            created,
        } => {
            let (content, default_type) = match (content, file) {
                (Some(text), _) => (Value::String(text.clone()), None),
                (None, Some(path)) => read_file_content(path)?,
                (None, None) => anyhow::bail!("either content or --file is required"),
            };
            let created = match created {
                Some(secs) => secs,
                None => u64::try_from(chrono::Utc::now().timestamp())?,
            };

            let mut input = RecordInput::new(identity.as_str(), created, content)
                .with_provider(provider.as_str(), model.as_str())
                .with_fingerprint(fingerprint.as_str());
            if let Some(ct) = content_type.clone().or(default_type) {
                input = input.with_content_type(ct);
            }

            let notary = open_notary(&cli)?;
            let receipt = notary.notarize(input)?;
            let mut value = serde_json::to_value(&receipt)?;
            value["status"] = json!("ok");
            output(&cli.format, &value)?;
        }

        Commands::Proof {
            ref identity,
            ref hash,
        } => {
            let notary = open_notary(&cli)?;
            let proof = notary.proof_for_hash(identity, &Hash::parse(hash)?)?;
            output(&cli.format, &serde_json::to_value(&proof)?)?;
        }

        Commands::Verify {
            ref leaf,
            ref root,
            ref proof,
        } => {
            let leaf = Hash::parse(leaf)?;
            let root = Hash::parse(root)?;
            let entries = parse_proof(proof)?;
            let valid = verify(&leaf, &entries, &root);
            output(
                &cli.format,
                &json!({
                    "valid": valid,
                    "leaf": leaf.to_hex(),
                    "root": root.to_hex(),
                }),
            )?;
            if !valid {
                std::process::exit(1);
            }
        }

        Commands::Trees { ref identity } => {
            let notary = open_notary(&cli)?;
            let trees = notary.trees(identity)?;
            output(
                &cli.format,
                &json!({
                    "identity": identity,
                    "count": trees.len(),
                    "trees": trees,
                }),
            )?;
        }

        Commands::Leaf {
            ref identity,
            ref hash,
        } => {
            let notary = open_notary(&cli)?;
            let hash = Hash::parse(hash)?;
            match notary.find_leaf(identity, &hash)? {
                Some(leaf) => {
                    // content without a ledger encoding still shows the leaf
                    let registration = match notary.leaf_registration(identity, &hash) {
                        Ok(registration) => registration.to_wire(),
                        Err(Error::Anchor(message)) => json!({ "error": message }),
                        Err(e) => return Err(e.into()),
                    };
                    output(
                        &cli.format,
                        &json!({
                            "leaf": leaf,
                            "intact": leaf.rehash_matches()?,
                            "registration": registration,
                        }),
                    )?;
                }
                None => {
                    output(
                        &cli.format,
                        &json!({
                            "status": "error",
                            "message": format!("Leaf not found: {}", hash)
                        }),
                    )?;
                    std::process::exit(1);
                }
            }
        }

        Commands::Anchor {
            ref identity,
            ref tree_id,
        } => {
            let notary = open_notary(&cli)?;
            let payload = notary.anchor_payload(identity, tree_id)?;
            output(&cli.format, &payload.to_wire())?;
        }

        Commands::Canonicalize { ref json } => {
            let canonical = canonicalize_str(json)?;
            let hash = hash_canonical(canonical.as_bytes());
            output(
                &cli.format,
                &json!({
                    "canonical": canonical,
                    "hash": hash.to_hex(),
                }),
            )?;
        }
    }

    Ok(())
}

/// Config file and environment first, then flags
fn open_notary(cli: &Cli) -> anyhow::Result<Notary<notary_tree::FileStore>> {
    let mut config = Config::load()?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(store) = cli.store {
        config.store_format = store.into();
    }
    if cli.insecure_demo_tag {
        config.insecure_demo_tag = true;
    }
    Ok(Notary::open(config)?)
}

/// UTF-8 files become string content, anything else `0x`-hex tagged `file`
fn read_file_content(path: &Path) -> anyhow::Result<(Value, Option<String>)> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => (Value::String(text), None),
        Err(e) => (
            Value::String(format!("0x{}", hex::encode(e.as_bytes()))),
            Some("file".to_string()),
        ),
    })
}

fn parse_proof(text: &str) -> anyhow::Result<Vec<ProofEntry>> {
    let value: Value = serde_json::from_str(text)?;
    let entries = match value {
        Value::Object(mut obj) => obj
            .remove("proof")
            .ok_or_else(|| anyhow::anyhow!("proof object has no \"proof\" field"))?,
        other => other,
    };
    Ok(serde_json::from_value(entries)?)
}

fn output(format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
