use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polis_common::{init_logging, ClientConfig, Configuration};
use polis_proposals::{
    Category, CategoryFilter, ProposalDraft, ProposalRecord, ProposalRepository, ProposalService,
    Signer, VoteDirection,
};
use polis_storage::FileStorage;
use tracing::debug;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of the file-backed store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Wallet address to sign writes with
    #[arg(long, global = true)]
    author: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List proposals, newest first
    List {
        /// Only show proposals whose content contains this text
        #[arg(long, default_value = "")]
        search: String,
        /// Category name, or "all"
        #[arg(long, default_value = "all")]
        category: String,
    },
    /// Submit a new proposal
    Create {
        /// One of Education, Healthcare, Infrastructure, Environment, Economy, Security
        #[arg(long)]
        category: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Vote on a proposal
    Vote {
        id: String,
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    /// Show aggregate statistics
    Stats,
    /// Write a default configuration file
    InitConfig {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for VoteDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => VoteDirection::Up,
            DirectionArg::Down => VoteDirection::Down,
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let mut config = config.with_env_overrides()?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(author) = &cli.author {
        config.author = Some(author.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_record(record: &ProposalRecord) {
    let date = record
        .created_at()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<24} {:<15} {}  {:>4} up / {:<4} down  ({:.0}% support)",
        record.id,
        record.category,
        date,
        record.upvotes,
        record.downvotes,
        record.approval_ratio() * 100.0,
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { path } = &cli.command {
        ClientConfig::default().save_to_file(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging(&config.log_level)?;
    debug!("Using data directory {}", config.data_dir.display());

    let storage = FileStorage::new(&config.data_dir).await?;
    let mut repository = ProposalRepository::new(Arc::new(storage));
    if let Some(author) = &config.author {
        repository = repository.with_signer(Signer::new(author.clone()));
    }
    let service = ProposalService::new(repository, config.notifications.clone());

    match cli.command {
        Commands::List { search, category } => {
            let filter: CategoryFilter = category.parse()?;
            service.refresh().await?;

            let visible = service.visible(&search, filter).await;
            if visible.is_empty() {
                println!("No proposals found");
            }
            for record in &visible {
                print_record(record);
            }

            let skipped = service.snapshot().await.skipped;
            if !skipped.is_empty() {
                println!("({} unreadable proposals skipped)", skipped.len());
            }
        }
        Commands::Create { category, content, title } => {
            let category: Category = category.parse()?;
            let draft = ProposalDraft::new(category, content).with_title(title);
            let id = service.submit(&draft).await?;
            println!("Created proposal {}", id);
        }
        Commands::Vote { id, direction } => {
            let record = service.cast_vote(&id, direction.into()).await?;
            print_record(&record);
        }
        Commands::Stats => {
            service.refresh().await?;
            let stats = service.stats().await;
            println!("Total proposals: {}", stats.count);
            println!("Total votes:     {}", stats.total_votes);
            println!("Approval rate:   {}", stats.approval_percent());
            match &stats.most_discussed {
                Some(record) => println!(
                    "Most discussed:  #{} ({} votes)",
                    record.short_id(),
                    record.total_votes()
                ),
                None => println!("Most discussed:  -"),
            }
        }
        Commands::InitConfig { .. } => {}
    }

    if let Some(notice) = service.status().await {
        debug!("{:?}: {}", notice.status, notice.message);
    }

    Ok(())
}
