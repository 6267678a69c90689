//! Command-line interface for building and reading deposits.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use uuid::Uuid;

use crate::batch::{Depositor, DoiBatch, DoiBatchOptions};
use crate::citations::{load_citations, Citations};
use crate::common::{present, DocumentInput, EncodeOptions, Titles};
use crate::conference::{conference_from_frontmatters, Proceedings};
use crate::config::{
    validate_email, DepositSettings, DoiPrefixes, DEFAULT_DEPOSITOR_EMAIL, DEFAULT_DEPOSITOR_NAME,
    DEFAULT_DOI_PREFIX,
};
use crate::dataset::{database_xml, dataset_from_frontmatter, dataset_xml, Database};
use crate::doi::generate_doi;
use crate::error::{DepositError, Result};
use crate::frontmatter::Frontmatter;
use crate::journal::{journal_from_frontmatters, JournalMetadata};
use crate::preprint::preprint_xml_from_frontmatter;
use crate::reader::DepositReader;
use crate::schema::SchemaVersion;
use crate::tree::Element;

/// Crossref Deposit - Build Crossref deposit XML from document frontmatter.
#[derive(Parser)]
#[command(name = "crossref-deposit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode one or more frontmatter files as a deposit batch.
    Deposit(DepositArgs),

    /// Decode a deposit file and print it as JSON.
    Read {
        /// Deposit XML file
        file: PathBuf,
    },

    /// Generate new random DOIs.
    Generate {
        /// Organization key (e.g., scipy) or DOI prefix (default: curvenote)
        prefix: Option<String>,

        /// Number of DOIs to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Settings file whose doi_prefix is used when no prefix is given
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Kind of record to deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DepositType {
    Preprint,
    Journal,
    Conference,
    Dataset,
}

#[derive(Debug, Args)]
pub struct DepositArgs {
    /// Frontmatter files (YAML or JSON)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Kind of record
    #[arg(short = 't', long = "type", value_enum, default_value_t = DepositType::Preprint)]
    pub kind: DepositType,

    /// Deposit settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Batch id (default: random UUID)
    #[arg(long)]
    pub id: Option<String>,

    /// Depositor name
    #[arg(long)]
    pub name: Option<String>,

    /// Depositor email
    #[arg(long)]
    pub email: Option<String>,

    /// Registrant (default: Crossref)
    #[arg(long)]
    pub registrant: Option<String>,

    /// Schema version (4.4.2 or 5.3.1)
    #[arg(long)]
    pub schema_version: Option<String>,

    /// Journal title
    #[arg(long)]
    pub journal_title: Option<String>,

    /// Abbreviated journal title
    #[arg(long)]
    pub journal_abbr: Option<String>,

    /// Journal DOI
    #[arg(long)]
    pub journal_doi: Option<String>,

    /// Citations file, matched to the frontmatter file at the same position
    #[arg(long)]
    pub citations: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Deposit(args) => deposit_command(&args),
        Commands::Read { file } => read_command(&file),
        Commands::Generate {
            prefix,
            count,
            config,
        } => generate_command(prefix.as_deref(), count, config.as_deref()),
    }
}

/// Execute the deposit command.
fn deposit_command(args: &DepositArgs) -> Result<()> {
    let settings = match &args.config {
        Some(path) => DepositSettings::load(path)?,
        None => DepositSettings::default(),
    };

    let version = match &args.schema_version {
        Some(value) => value.parse::<SchemaVersion>()?,
        None => settings.schema_version(),
    };
    let depositor = resolve_depositor(args, &settings)?;
    let registrant = args
        .registrant
        .clone()
        .unwrap_or_else(|| settings.registrant().to_string());
    let id = args
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if args.citations.len() > args.files.len() {
        return Err(DepositError::InvalidValue {
            field: "citations".to_string(),
            message: format!(
                "{} citation files given for {} frontmatter files",
                args.citations.len(),
                args.files.len()
            ),
        });
    }

    let frontmatters = args
        .files
        .iter()
        .map(|path| Frontmatter::load(path))
        .collect::<Result<Vec<_>>>()?;
    let mut inputs = Vec::with_capacity(frontmatters.len());
    for (index, frontmatter) in frontmatters.iter().enumerate() {
        let mut input = DocumentInput::new(frontmatter);
        if let Some(path) = args.citations.get(index) {
            let records = load_citations(path)?;
            input = input.with_citations(Citations::from_source(&records));
        }
        inputs.push(input);
    }

    let opts = EncodeOptions::default()
        .with_version(version)
        .with_resource_base(settings.resource_base());
    let body = encode_body(args, &settings, &inputs, &opts)?;

    let batch_options = DoiBatchOptions::new(id, depositor)
        .with_registrant(registrant)
        .with_version(version);
    let batch = DoiBatch::new(&batch_options, body);

    match &args.output {
        Some(path) => {
            batch.save(path)?;
            eprintln!(
                "{} {} record(s) to {}",
                style("Saved").green().bold(),
                inputs.len(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", batch.to_xml()?),
    }

    Ok(())
}

/// Depositor from flags, then the settings file, then built-in defaults.
fn resolve_depositor(args: &DepositArgs, settings: &DepositSettings) -> Result<Depositor> {
    let from_file = settings.depositor.as_ref();
    let name = args
        .name
        .clone()
        .or_else(|| from_file.map(|d| d.name.clone()))
        .unwrap_or_else(|| DEFAULT_DEPOSITOR_NAME.to_string());
    let email = args
        .email
        .clone()
        .or_else(|| from_file.map(|d| d.email.clone()))
        .unwrap_or_else(|| DEFAULT_DEPOSITOR_EMAIL.to_string());
    validate_email(&email)?;
    Ok(Depositor::new(name, email))
}

fn encode_body(
    args: &DepositArgs,
    settings: &DepositSettings,
    inputs: &[DocumentInput<'_>],
    opts: &EncodeOptions,
) -> Result<Vec<Element>> {
    match args.kind {
        DepositType::Preprint => inputs
            .iter()
            .map(|input| preprint_xml_from_frontmatter(input, opts))
            .collect(),
        DepositType::Journal => {
            let journal = settings.journal.clone().unwrap_or_default();
            let overrides = JournalMetadata {
                title: args.journal_title.clone().or(journal.title),
                abbrev_title: args.journal_abbr.clone().or(journal.abbrev_title),
                issn: journal.issn,
                doi_data: opts.doi_data(args.journal_doi.as_deref().or(journal.doi.as_deref())),
            };
            Ok(vec![journal_from_frontmatters(&overrides, inputs, opts)?])
        }
        DepositType::Conference => {
            let conference = settings
                .conference
                .as_ref()
                .ok_or_else(|| DepositError::missing_in("conference", "settings"))?;
            let proceedings = Proceedings {
                title: present(Some(conference.proceedings.title.as_str())).map(str::to_string),
                publisher: present(Some(conference.proceedings.publisher.as_str())).map(str::to_string),
                publication_date: Some(conference.proceedings.publication_date.clone()),
                doi_data: opts.doi_data(conference.proceedings.doi.as_deref()),
                series: conference.proceedings.series.clone(),
            };
            Ok(vec![conference_from_frontmatters(
                &conference.event,
                &proceedings,
                inputs,
                opts,
            )?])
        }
        DepositType::Dataset => {
            let datasets = inputs
                .iter()
                .map(|input| dataset_from_frontmatter(input, opts).and_then(|d| dataset_xml(&d)))
                .collect::<Result<Vec<_>>>()?;
            let title = inputs.first().and_then(|input| {
                let fm = input.frontmatter;
                fm.venue
                    .as_ref()
                    .and_then(|venue| present(venue.title.as_deref()))
                    .or_else(|| fm.title())
            });
            let database = Database {
                titles: title.map(Titles::new).unwrap_or_default(),
                datasets,
                ..Database::default()
            };
            Ok(vec![database_xml(&database)?])
        }
    }
}

/// Execute the read command.
fn read_command(file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let reader = DepositReader::new(&text);
    if !reader.is_parsed() {
        eprintln!(
            "{} {} is not well-formed XML",
            style("Warning:").yellow().bold(),
            file.display()
        );
    }
    println!("{}", serde_json::to_string_pretty(&reader.decode())?);
    Ok(())
}

/// Execute the generate command.
fn generate_command(prefix: Option<&str>, count: usize, config: Option<&Path>) -> Result<()> {
    let settings = match config {
        Some(path) => DepositSettings::load(path)?,
        None => DepositSettings::default(),
    };
    let key = prefix
        .or(settings.doi_prefix.as_deref())
        .unwrap_or(DEFAULT_DOI_PREFIX);
    let prefix = DoiPrefixes::default().resolve(key)?;
    let mut rng = rand::rng();
    for _ in 0..count {
        println!("{}", generate_doi(&prefix, &mut rng));
    }
    Ok(())
}
