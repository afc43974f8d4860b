//! paydocs CLI entry point

mod chunk;
mod commands;
mod config;
mod embed;
mod error;
mod index;
mod llm;
mod mcp;
mod search;
mod store;
mod tools;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use commands::{
    cmd_delete_indices, cmd_find_endpoint, cmd_index, cmd_init, cmd_list, cmd_recommend,
    cmd_search, cmd_search_by_mode, cmd_search_by_payment_method, cmd_show, cmd_status, cmd_verify,
    print_deleted_indices, print_endpoint_result, print_index_stats, print_init, print_listing,
    print_recommendation, print_search_results, print_show_result, print_status,
    print_verify_report, InitOptions, SearchOptions,
};
use config::{Collection, Config};
use error::Result;
use index::IndexOptions;
use mcp::McpServer;
use std::path::PathBuf;
use tools::{EndpointQuery, TaskType};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "paydocs")]
#[command(version, about = "Semantic search and integration tools for PayerMax API documentation", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which chunk index a search targets
#[derive(Debug, Clone, Copy, ValueEnum)]
enum IndexTarget {
    /// API specifications and samples
    Api,
    /// Integration guides and product docs
    Guides,
}

impl From<IndexTarget> for Collection {
    fn from(target: IndexTarget) -> Self {
        match target {
            IndexTarget::Api => Collection::ApiDocs,
            IndexTarget::Guides => Collection::Guides,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize paydocs configuration
    Init {
        /// Base directory for paydocs data (defaults to ~/.paydocs)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Index the documentation tree into the search cluster
    Index {
        /// Path to the documentation root
        #[arg(default_value = ".")]
        docs_dir: PathBuf,

        /// Delete and recreate the indices before indexing
        #[arg(long)]
        recreate: bool,

        /// Restrict the run to one collection
        #[arg(long, value_enum)]
        collection: Option<IndexTarget>,

        /// Worker count (defaults to config; 1 disables parallelism)
        #[arg(long)]
        workers: Option<usize>,

        /// Report per-index statistics instead of indexing
        #[arg(long)]
        verify: bool,

        /// Delete both indices instead of indexing
        #[arg(long)]
        delete: bool,
    },

    /// Semantic search over indexed documentation
    Search {
        /// The search query
        #[arg(required_unless_present_any = ["mode", "payment_method"])]
        query: Option<String>,

        /// Which index to search
        #[arg(short, long, value_enum, default_value = "api")]
        index: IndexTarget,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Filter by document type (api_doc, api_sample, integration_guide, payermax_doc)
        #[arg(long)]
        doc_type: Option<String>,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Search guides for an integration mode (cashier, pure_api, drop_in, ...)
        #[arg(long, conflicts_with_all = ["query", "payment_method"])]
        mode: Option<String>,

        /// Search product docs for a payment method (card, applepay, googlepay, apm)
        #[arg(long, conflicts_with = "query")]
        payment_method: Option<String>,
    },

    /// Fetch every chunk for one named API or workflow
    Show {
        /// API or workflow name (the file stem of its markdown document)
        name: String,

        /// Which index to look in
        #[arg(short, long, value_enum, default_value = "api")]
        index: IndexTarget,

        /// Exclude sample code from API lookups
        #[arg(long)]
        no_samples: bool,
    },

    /// List indexed APIs or guides
    List {
        /// Which index to list
        #[arg(short, long, value_enum, default_value = "api")]
        index: IndexTarget,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Filter by document type (guides only)
        #[arg(long)]
        doc_type: Option<String>,
    },

    /// Find the best API endpoint for a payment task
    FindEndpoint {
        /// The task to accomplish (e.g. create_payment, refund)
        task_type: String,

        /// Payment method involved
        #[arg(long)]
        payment_type: Option<String>,

        /// Integration mode in use
        #[arg(long)]
        integration_mode: Option<String>,

        /// Extra requirements to consider
        #[arg(long)]
        requirements: Option<String>,

        /// Include sample code
        #[arg(long)]
        samples: bool,

        /// Path to the documentation root
        #[arg(long, default_value = ".")]
        docs_dir: PathBuf,
    },

    /// Recommend an integration method from a description of your needs
    Recommend {
        /// Natural-language description of the integration requirements
        description: String,

        /// Path to the documentation root
        #[arg(long, default_value = ".")]
        docs_dir: PathBuf,
    },

    /// Show system status
    Status,

    /// Start MCP server on stdio
    Mcp {
        /// Path to the documentation root
        #[arg(long, default_value = ".")]
        docs_dir: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if let Commands::Init { base_dir, force } = &cli.command {
        let config = cmd_init(InitOptions {
            base_dir: base_dir.clone(),
            force: *force,
        })
        .await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            print_init(&config);
        }
        return Ok(());
    }

    // Handle completions command (doesn't need config)
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "paydocs", &mut std::io::stdout());
        return Ok(());
    }

    // Load configuration
    let config = match cli.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::load_from(None)?,
    };

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Index {
            docs_dir,
            recreate,
            collection,
            workers,
            verify,
            delete,
        } => {
            if delete {
                let deleted = cmd_delete_indices(&config, docs_dir).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&deleted)?);
                } else {
                    print_deleted_indices(&deleted);
                }
            } else if verify {
                let reports = cmd_verify(&config, docs_dir).await?;
                if cli.json {
                    let value: Vec<serde_json::Value> = reports
                        .iter()
                        .map(|(name, stats)| {
                            serde_json::json!({ "index": name, "stats": stats })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&value)?);
                } else {
                    print_verify_report(&reports);
                }
            } else {
                let options = IndexOptions {
                    recreate,
                    collection: collection.map(Collection::from),
                    workers: workers.unwrap_or(config.index.workers),
                };
                let stats = cmd_index(&config, docs_dir, options).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    print_index_stats(&stats);
                }
            }
        }

        Commands::Search {
            query,
            index,
            top_k,
            doc_type,
            category,
            mode,
            payment_method,
        } => {
            let result = if let Some(mode) = mode {
                cmd_search_by_mode(&config, &mode).await?
            } else if let Some(method) = payment_method {
                cmd_search_by_payment_method(&config, &method).await?
            } else {
                let options = SearchOptions {
                    top_k,
                    doc_type: doc_type
                        .as_deref()
                        .map(|s| s.parse::<store::DocType>())
                        .transpose()?,
                    category,
                };
                let query = query.unwrap_or_default();
                cmd_search(&config, index.into(), &query, options).await?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_search_results(&result);
            }
        }

        Commands::Show {
            name,
            index,
            no_samples,
        } => {
            let result = cmd_show(&config, index.into(), &name, !no_samples).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_show_result(&result);
            }
        }

        Commands::List {
            index,
            category,
            doc_type,
        } => {
            let doc_type = doc_type
                .as_deref()
                .map(|s| s.parse::<store::DocType>())
                .transpose()?;
            let result = cmd_list(&config, index.into(), category.as_deref(), doc_type).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_listing(&result);
            }
        }

        Commands::FindEndpoint {
            task_type,
            payment_type,
            integration_mode,
            requirements,
            samples,
            docs_dir,
        } => {
            let query = EndpointQuery {
                task_type: task_type.parse::<TaskType>()?,
                payment_type,
                integration_mode,
                additional_requirements: requirements,
                include_samples: samples,
            };
            let result = cmd_find_endpoint(&config, docs_dir, query).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_endpoint_result(&result);
            }
        }

        Commands::Recommend {
            description,
            docs_dir,
        } => {
            let result = cmd_recommend(&config, docs_dir, &description).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_recommendation(&result);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Mcp { docs_dir } => {
            let server = McpServer::new(config, docs_dir)?;
            server.run().await?;
        }
    }

    Ok(())
}
