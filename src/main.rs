mod dom;
mod fetch;
mod parser;
mod vcard;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use parser::sections::DedupePolicy;
use parser::ProfileRecord;
use vcard::photo::HttpPhotoResolver;
use vcard::{CardOptions, FieldOrder, PhotoMode};

#[derive(Parser)]
#[command(
    name = "profile_vcard",
    about = "Scrape a profile page and export a vCard (.vcf) contact file"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a profile record from a page and print it as JSON
    Extract(ExtractArgs),
    /// Build a .vcf from a previously extracted profile record
    Card(CardArgs),
    /// Extract + build in one pipeline
    Run {
        #[command(flatten)]
        extract: ExtractArgs,
        /// Source URL recorded in the card (defaults to the input when it is a URL)
        #[arg(long)]
        source_url: Option<String>,
        #[command(flatten)]
        build: BuildArgs,
    },
}

#[derive(Args)]
struct ExtractArgs {
    /// Saved profile HTML file, or an http(s) URL
    input: String,
    /// Max entries to keep per section
    #[arg(long, default_value_t = parser::sections::DEFAULT_MAX_ENTRIES)]
    max_entries: usize,
    /// How duplicated text fragments are collapsed
    #[arg(long, value_enum, default_value = "alternate")]
    dedupe: DedupePolicy,
}

#[derive(Args)]
struct CardArgs {
    /// Profile record JSON produced by `extract`
    record: PathBuf,
    /// Source URL recorded in the card
    #[arg(long)]
    source_url: String,
    #[command(flatten)]
    build: BuildArgs,
}

#[derive(Args)]
struct BuildArgs {
    /// Role of the first experience field (markup-revision dependent)
    #[arg(long, value_enum, default_value = "title-first")]
    field_order: FieldOrder,
    /// Photo handling: reference by URL, embed base64 bytes, or omit
    #[arg(long = "photo", value_enum, default_value = "uri")]
    photo_mode: PhotoMode,
    /// Directory the .vcf is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Timeout for the photo fetch, in seconds
    #[arg(long, default_value_t = vcard::photo::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract(args) => {
            let record = extract_record(&args).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Card(args) => {
            let data = std::fs::read_to_string(&args.record)
                .with_context(|| format!("Failed to read {}", args.record.display()))?;
            let record: ProfileRecord =
                serde_json::from_str(&data).context("Record file is not valid profile JSON")?;
            build_and_write(&record, &args.source_url, &args.build).await
        }
        Commands::Run {
            extract,
            source_url,
            build,
        } => {
            let source = source_url
                .or_else(|| fetch::is_url(&extract.input).then(|| extract.input.clone()))
                .context("No --source-url given and the input is not a URL")?;
            let record = extract_record(&extract).await?;
            build_and_write(&record, &source, &build).await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

async fn extract_record(args: &ExtractArgs) -> Result<ProfileRecord> {
    let html = fetch::read_input(&args.input).await?;
    let page = dom::Document::parse(&html);
    Ok(parser::extract_profile(&page, args.max_entries, args.dedupe))
}

async fn build_and_write(record: &ProfileRecord, source_url: &str, args: &BuildArgs) -> Result<()> {
    let resolver = HttpPhotoResolver::new(Duration::from_secs(args.timeout_secs));
    let options = CardOptions {
        field_order: args.field_order,
        photo_mode: args.photo_mode,
    };

    let card = vcard::build_card(record, source_url, &options, &resolver).await?;

    let path = args.out_dir.join(&card.filename);
    std::fs::write(&path, card.bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
