//! Wadkit CLI - Command-line tool for God of War WAD archives.
//!
//! This is the main entry point for the wadkit command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use wadkit::common::hash::{name_hash, unhash};
use wadkit::prelude::*;
use wadkit::vif::VifReader;

/// Wadkit - God of War WAD archive browser
#[derive(Parser)]
#[command(name = "wadkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the node tree of an archive
    List {
        /// Path to the WAD file
        #[arg(short, long, env = "WADKIT_INPUT")]
        input: PathBuf,

        /// Only show nodes whose name matches (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Look up a name, optionally from inside a group
    Find {
        /// Path to the WAD file
        #[arg(short, long, env = "WADKIT_INPUT")]
        input: PathBuf,

        /// Node name
        name: String,

        /// Group node to search from
        #[arg(short, long, value_parser = parse_node_id)]
        scope: Option<NodeId>,
    },

    /// Show the hops followed to resolve a link
    Resolve {
        /// Path to the WAD file
        #[arg(short, long, env = "WADKIT_INPUT")]
        input: PathBuf,

        /// Node id
        #[arg(value_parser = parse_node_id)]
        id: NodeId,
    },

    /// Decode one node and print the result
    Decode {
        /// Path to the WAD file
        #[arg(short, long, env = "WADKIT_INPUT")]
        input: PathBuf,

        /// Node id
        #[arg(value_parser = parse_node_id)]
        id: NodeId,

        /// Print mesh streams as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode every node with a registered decoder
    DecodeAll {
        /// Path to the WAD file
        #[arg(short, long, env = "WADKIT_INPUT")]
        input: PathBuf,

        /// Decode on all cores
        #[arg(short, long)]
        parallel: bool,
    },

    /// Decode a raw VIF stream file
    Vif {
        /// Input stream file
        input: PathBuf,

        /// List packets instead of decoding
        #[arg(short, long)]
        disasm: bool,

        /// Print blocks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Hash node names, or reverse a hash
    Hash {
        /// Names to hash
        names: Vec<String>,

        /// Hash value to reverse
        #[arg(short, long, value_parser = parse_u32)]
        unhash: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List { input, filter } => {
            cmd_list(&input, filter.as_deref())?;
        }
        Commands::Find { input, name, scope } => {
            cmd_find(&input, &name, scope)?;
        }
        Commands::Resolve { input, id } => {
            cmd_resolve(&input, id)?;
        }
        Commands::Decode { input, id, json } => {
            cmd_decode(&input, id, json)?;
        }
        Commands::DecodeAll { input, parallel } => {
            cmd_decode_all(&input, parallel)?;
        }
        Commands::Vif {
            input,
            disasm,
            json,
        } => {
            cmd_vif(&input, disasm, json)?;
        }
        Commands::Hash { names, unhash } => {
            cmd_hash(&names, unhash);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open(path: &Path) -> Result<Wad> {
    let start = Instant::now();
    let wad = Wad::open(path, Arc::new(default_registry()))
        .with_context(|| format!("Failed to open WAD archive {}", path.display()))?;
    tracing::info!("loaded {} nodes in {:?}", wad.node_count(), start.elapsed());
    Ok(wad)
}

fn cmd_list(path: &Path, filter: Option<&str>) -> Result<()> {
    let wad = open(path)?;
    let pattern = filter
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;

    let mut count = 0;
    for (depth, node) in wad.walk() {
        let name = node.name_lossy();
        if let Some(pattern) = &pattern {
            if !pattern.matches(&name) {
                continue;
            }
        }

        let detail = if node.is_link() {
            match wad.resolve(node.id()) {
                Ok(target) => format!("-> {target}"),
                Err(e) => format!("-> ? ({e})"),
            }
        } else {
            format!(
                "{:#06x} {:>8} {:#010x}",
                node.flags(),
                node.size(),
                node.format().unwrap_or_default()
            )
        };

        println!(
            "{:indent$}{:>6} {:<24} {}",
            "",
            node.id().to_string(),
            name,
            detail,
            indent = depth * 2
        );
        count += 1;
    }

    println!("\nTotal: {} nodes", count);

    Ok(())
}

fn cmd_find(path: &Path, name: &str, scope: Option<NodeId>) -> Result<()> {
    let wad = open(path)?;
    let id = wad.lookup(name.as_bytes(), scope)?;
    let resolved = wad.resolve(id)?;

    if resolved == id {
        println!("{id}");
    } else {
        println!("{id} -> {resolved}");
    }

    Ok(())
}

fn cmd_resolve(path: &Path, id: NodeId) -> Result<()> {
    let wad = open(path)?;
    let node = wad
        .node(id)
        .with_context(|| format!("No node {id}"))?;

    println!("{} {}", id, node.name_lossy());
    for hop in wad.link_chain(id)? {
        if let Some(node) = wad.node(hop) {
            let parent = node
                .parent()
                .map_or_else(|| "root".to_string(), |p| p.to_string());
            println!("  -> {} {} (in {})", hop, node.name_lossy(), parent);
        }
    }

    Ok(())
}

fn cmd_decode(path: &Path, id: NodeId, json: bool) -> Result<()> {
    let wad = open(path)?;
    let payload = wad
        .get(id)
        .with_context(|| format!("Failed to decode {id}"))?;

    match payload.downcast_ref::<MeshStream>() {
        Some(mesh) if json => println!("{}", serde_json::to_string_pretty(mesh)?),
        Some(mesh) => {
            for block in &mesh.blocks {
                print_block(block);
            }
        }
        None => println!("{payload:#?}"),
    }

    Ok(())
}

fn cmd_decode_all(path: &Path, parallel: bool) -> Result<()> {
    let wad = open(path)?;
    let start = Instant::now();

    let results = if parallel {
        let pb = ProgressBar::new_spinner();
        pb.set_message("Decoding...");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        let results = wad.decode_all_parallel();
        pb.finish_and_clear();
        results
    } else {
        let nodes: Vec<NodeId> = wad.decodable().map(WadNode::id).collect();
        let pb = ProgressBar::new(nodes.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );

        let results = nodes
            .into_iter()
            .map(|id| {
                let result = wad.get(id);
                pb.inc(1);
                (id, result)
            })
            .collect::<Vec<_>>();
        pb.finish_with_message("Done");
        results
    };

    let mut errors = 0;
    for (id, result) in &results {
        if let Err(e) = result {
            eprintln!("Error decoding {}: {}", id, e);
            errors += 1;
        }
    }

    println!(
        "Decoded {} nodes in {:?} ({} errors)",
        results.len() - errors,
        start.elapsed(),
        errors
    );

    Ok(())
}

fn cmd_vif(path: &Path, disasm: bool, json: bool) -> Result<()> {
    let data = fs::read(path).context("Failed to read input file")?;

    if disasm {
        for packet in VifReader::new(&data, 0) {
            let packet = packet?;
            println!("{:#08x} {}", packet.offset, packet.command);
        }
        return Ok(());
    }

    let blocks = VifDecoder::new(&data)
        .decode()
        .context("Failed to decode vertex stream")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
    } else {
        for block in &blocks {
            print_block(block);
        }
    }

    Ok(())
}

fn cmd_hash(names: &[String], value: Option<u32>) {
    for name in names {
        println!("{:#010x} {}", name_hash(name.as_bytes()), name);
    }

    if let Some(value) = value {
        println!("{:#010x} {}", value, String::from_utf8_lossy(&unhash(value)));
    }
}

fn print_block(block: &VertexBlock) {
    println!(
        "block @ {:#x}: {} vertices, uv {}, normals {}, colors {}{}, joints {}, material rows {}",
        block.offset(),
        block.vertex_count(),
        block.uvs().is_some(),
        block.normals().is_some(),
        block.colors().is_some(),
        if block.has_transparency() { " (transparent)" } else { "" },
        block.joints().is_some(),
        block.material().map_or(0, <[_]>::len)
    );
}

/// Node ids are written as `12` or `#12`.
fn parse_node_id(s: &str) -> std::result::Result<NodeId, String> {
    s.trim_start_matches('#')
        .parse::<u32>()
        .map(NodeId::new)
        .map_err(|e| format!("invalid node id {s:?}: {e}"))
}

/// Decimal or `0x`-prefixed hex.
fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}
