use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;

use circus_mapper::ingest::{
    address_column_candidates, annotate_locality, parse_pasted, save_company_table,
};
use circus_mapper::{CircusConfig, MappingRequest, extract_locality, preview_variants, run_mapping};

#[derive(Parser, Debug)]
#[command(name = "circus-mapper", version, about = "Map company job tables into the canonical store")]
struct Cli {
    /// Canonical store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Mapping rule file
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Directory of company source tables
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every rule variant of a company/prefix against the first source row
    Preview {
        #[arg(long)]
        company: String,
        #[arg(long)]
        prefix: String,
        /// Source table instead of the company table under the data dir
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Map one identifier with a rule variant and upsert into the store
    Map {
        #[arg(long)]
        company: String,
        #[arg(long)]
        identifier: String,
        /// 1-based rule variant number
        #[arg(long, default_value_t = 1)]
        variant: usize,
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Print the prefecture and municipality of each address
    Locality {
        addresses: Vec<String>,
    },
    /// Build a company table from pasted tab-delimited text read on stdin
    Ingest {
        #[arg(long)]
        company: String,
        /// Address column; defaults to the first address-like header
        #[arg(long)]
        address_column: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> CircusConfig {
        let mut config = CircusConfig::default();
        if let Some(store) = &self.store {
            config.store_path.clone_from(store);
        }
        if let Some(rules) = &self.rules {
            config.rule_path.clone_from(rules);
        }
        if let Some(data_dir) = &self.data_dir {
            config.data_dir.clone_from(data_dir);
        }
        config
    }
}

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    let start = Instant::now();

    match cli.command {
        Command::Preview {
            company,
            prefix,
            source,
        } => {
            let previews = preview_variants(&config, &company, &prefix, source)
                .with_context(|| format!("previewing rules for {company} / {prefix}"))?;
            if previews.is_empty() {
                bail!("no rule variants registered for {company} / {prefix}");
            }
            println!("{}", serde_json::to_string_pretty(&previews)?);
        }
        Command::Map {
            company,
            identifier,
            variant,
            source,
        } => {
            if variant == 0 {
                bail!("rule variants are numbered from 1");
            }
            let mut request = MappingRequest::new(&company, &identifier).with_variant(variant - 1);
            if let Some(source) = source {
                request = request.with_source(source);
            }
            let outcome = run_mapping(&config, &request)
                .with_context(|| format!("mapping {company} / {identifier}"))?;
            if !outcome.store.changed() {
                info!("Store already up to date for {}", outcome.mapping_id);
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Locality { addresses } => {
            let localities: Vec<_> = addresses
                .iter()
                .map(|address| (address.as_str(), extract_locality(address)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&localities)?);
        }
        Command::Ingest {
            company,
            address_column,
        } => {
            let mut pasted = String::new();
            std::io::stdin()
                .read_to_string(&mut pasted)
                .context("reading pasted rows from stdin")?;

            let mut table = parse_pasted(&pasted);
            if table.is_empty() {
                bail!("no records found in pasted text");
            }
            let column = match address_column {
                Some(column) => column,
                None => address_column_candidates(&table.headers)
                    .first()
                    .map(|c| (*c).to_string())
                    .context("pasted text has no header")?,
            };
            info!("Using '{column}' as the address column");

            annotate_locality(&mut table, &column);
            let path = save_company_table(&config, &company, &table)
                .with_context(|| format!("saving company table for {company}"))?;
            println!("{}", path.display());
        }
    }

    info!("Done in {:?}", start.elapsed());
    Ok(())
}
