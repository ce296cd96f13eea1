use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rx_search_core::catalog::seed;
use rx_search_core::models::CatalogKind;
use rx_search_core::{ClinicalContext, MedicationStore, RxSearchCore, SearchConfig, TestStore};
use rx_search_gateway::{Gateway, MockEnhancedLookup, SearchRequest};

#[derive(Parser)]
#[command(name = "rx-search")]
#[command(about = "Search the medication and diagnostic test catalogs")]
struct Cli {
    /// Medication catalog (JSON array). Defaults to the bundled catalog
    #[arg(long, global = true)]
    medications: Option<PathBuf>,

    /// Diagnostic test catalog (JSON array). Defaults to the bundled catalog
    #[arg(long, global = true)]
    tests: Option<PathBuf>,

    /// Search configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of results
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Use the keyword-based enhanced lookup
    #[arg(long, global = true)]
    mock_lookup: bool,

    /// Print compact JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search medications
    Medications {
        /// Search text
        text: String,
        /// Patient age in years
        #[arg(long)]
        age: Option<u32>,
        /// Reported allergy (repeatable)
        #[arg(long = "allergy")]
        allergies: Vec<String>,
        /// Working diagnosis
        #[arg(long)]
        diagnosis: Option<String>,
    },
    /// Search diagnostic tests
    Tests {
        /// Search text
        text: String,
        /// Working diagnosis
        #[arg(long)]
        diagnosis: Option<String>,
    },
    /// Complete record names
    Complete {
        /// Name prefix or fragment
        text: String,
        #[arg(long, value_enum, default_value_t = KindArg::Medication)]
        kind: KindArg,
    },
    /// Print catalog fingerprints
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Medication,
    Test,
}

impl From<KindArg> for CatalogKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Medication => CatalogKind::Medication,
            KindArg::Test => CatalogKind::Test,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rx_search_gateway=info".parse()?)
                .add_directive("rx_search_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let core = Arc::new(open_core(&cli)?);

    let mut gateway = Gateway::new(Arc::clone(&core));
    if cli.mock_lookup {
        gateway = gateway.with_lookup(MockEnhancedLookup);
    }

    let output = match &cli.command {
        Commands::Medications {
            text,
            age,
            allergies,
            diagnosis,
        } => {
            let mut context = ClinicalContext {
                age: *age,
                diagnosis: diagnosis.clone(),
                ..ClinicalContext::default()
            };
            for allergy in allergies {
                context.add_allergy(allergy);
            }
            let request = request(text, cli.limit, context);
            serde_json::to_value(gateway.handle_medications(&request))?
        }
        Commands::Tests { text, diagnosis } => {
            let context = ClinicalContext {
                diagnosis: diagnosis.clone(),
                ..ClinicalContext::default()
            };
            let request = request(text, cli.limit, context);
            serde_json::to_value(gateway.handle_tests(&request))?
        }
        Commands::Complete { text, kind } => {
            serde_json::to_value(gateway.complete((*kind).into(), text, cli.limit))?
        }
        Commands::Info => {
            let medications = core.medication_snapshot();
            let tests = core.test_snapshot();
            serde_json::json!({
                "medications": {
                    "records": medications.len(),
                    "fingerprint": medications.fingerprint(),
                },
                "tests": {
                    "records": tests.len(),
                    "fingerprint": tests.fingerprint(),
                },
            })
        }
    };

    if cli.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

fn open_core(cli: &Cli) -> anyhow::Result<RxSearchCore> {
    let config = match &cli.config {
        Some(path) => SearchConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SearchConfig::default(),
    }
    .with_env_overrides()
    .context("Invalid environment override")?;

    let medications = match &cli.medications {
        Some(path) => MedicationStore::from_path(path)
            .with_context(|| format!("Failed to load medications {}", path.display()))?,
        None => seed::medications().context("Bundled medication catalog is invalid")?,
    };
    let tests = match &cli.tests {
        Some(path) => TestStore::from_path(path)
            .with_context(|| format!("Failed to load tests {}", path.display()))?,
        None => seed::tests().context("Bundled test catalog is invalid")?,
    };

    tracing::info!(
        medications = medications.len(),
        tests = tests.len(),
        "Catalogs loaded"
    );

    Ok(RxSearchCore::new(medications, tests, config))
}

fn request(text: &str, limit: Option<usize>, context: ClinicalContext) -> SearchRequest {
    SearchRequest {
        text: text.to_string(),
        context: Some(context).filter(|ctx| !ctx.is_empty()),
        limit,
    }
}
