use anyhow::{bail, Context, Result};
use arxiv_mcp_server::config::load_settings;
use arxiv_mcp_server::http::{self, AppState};
use arxiv_mcp_server::mcp::tools::{DOWNLOAD_PAPER, LIST_PAPERS, READ_PAPER, SEARCH_PAPERS};
use arxiv_mcp_server::mcp::{McpServer, PromptRegistry, ToolRegistry};
use arxiv_mcp_server::models::{DownloadRequest, ReadRequest, SearchRequest, ToolOutput};
use arxiv_mcp_server::sources::{ArxivSource, Source};
use arxiv_mcp_server::store::PaperStore;
use arxiv_mcp_server::utils::HttpClient;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// arXiv MCP Server - search, download and read arXiv papers
#[derive(Parser, Debug)]
#[command(name = "arxiv-mcp-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search, download and read arXiv papers over MCP (stdio) or HTTP/SSE", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path (default: ./arxiv-mcp-server.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding downloaded papers
    #[arg(long, global = true)]
    storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the server (stdio MCP by default)
    Serve {
        /// Serve HTTP with Server-Sent Events instead of stdio
        #[arg(long)]
        http: bool,

        /// Host to bind in HTTP mode
        #[arg(long)]
        host: Option<String>,

        /// Port to bind in HTTP mode
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Search arXiv
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Earliest publication date (e.g. 2023-01-01)
        #[arg(long)]
        date_from: Option<String>,

        /// Latest publication date
        #[arg(long)]
        date_to: Option<String>,

        /// Restrict to an arXiv category (repeatable)
        #[arg(long = "category", short)]
        categories: Vec<String>,
    },

    /// Download a paper and convert it to text
    #[command(alias = "d")]
    Download {
        /// arXiv paper ID
        paper_id: String,

        /// Only report whether the paper is already stored
        #[arg(long)]
        check_status: bool,
    },

    /// List stored papers
    #[command(alias = "ls")]
    List,

    /// Print a stored paper
    #[command(alias = "r")]
    Read {
        /// arXiv paper ID
        paper_id: String,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    // stdout carries JSON-RPC in stdio mode, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("arxiv_mcp_server={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Print a one-shot tool result as JSON
fn print_output(output: ToolOutput) -> Result<()> {
    if let ToolOutput::Rejected(message) = output {
        bail!("{}", message);
    }
    println!("{}", serde_json::to_string_pretty(&output.to_value())?);
    Ok(())
}

async fn run_tool(tools: &ToolRegistry, name: &str, args: Value) -> Result<()> {
    let output = tools
        .execute(name, args)
        .await
        .with_context(|| format!("{} failed", name))?;
    print_output(output)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let mut settings =
        load_settings(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.storage_path {
        settings.storage.path = path;
    }
    tracing::debug!("Papers are stored in {}", settings.storage.path.display());

    let client = HttpClient::new(settings.arxiv.request_timeout())
        .context("Failed to build HTTP client")?;
    let source: Arc<dyn Source> = Arc::new(ArxivSource::with_endpoints(
        client,
        settings.arxiv.api_url.as_str(),
        settings.arxiv.pdf_url.as_str(),
    ));
    let store = PaperStore::new(settings.storage.path.clone());
    let tools = ToolRegistry::new(source, store, settings.max_results);

    let command = cli.command.unwrap_or(Commands::Serve {
        http: false,
        host: None,
        port: None,
    });

    match command {
        Commands::Serve {
            http: use_http,
            host,
            port,
        } => {
            if use_http {
                if let Some(host) = host {
                    settings.server.host = host;
                }
                if let Some(port) = port {
                    settings.server.port = port;
                }
                http::serve(AppState::new(settings, tools))
                    .await
                    .context("HTTP server failed")?;
            } else {
                McpServer::new(&tools, Arc::new(PromptRegistry::new()))?
                    .run()
                    .await?;
            }
        }

        Commands::Search {
            query,
            max_results,
            date_from,
            date_to,
            categories,
        } => {
            let request = SearchRequest {
                query,
                max_results,
                date_from,
                date_to,
                categories,
            };
            run_tool(&tools, SEARCH_PAPERS, serde_json::to_value(request)?).await?;
        }

        Commands::Download {
            paper_id,
            check_status,
        } => {
            let request = DownloadRequest {
                paper_id,
                check_status,
            };
            run_tool(&tools, DOWNLOAD_PAPER, serde_json::to_value(request)?).await?;
        }

        Commands::List => run_tool(&tools, LIST_PAPERS, json!({})).await?,

        Commands::Read { paper_id } => {
            run_tool(&tools, READ_PAPER, serde_json::to_value(ReadRequest::new(paper_id))?).await?;
        }
    }

    Ok(())
}
