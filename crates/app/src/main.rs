use clap::Parser;
use sem_grep_core::{HashedNgramProvider, IndexStatus, Indexer, ScanOptions};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "sem-grep",
    version,
    about = "Semantic grep: rank local documents by meaning, not substrings."
)]
struct Cli {
    /// The search query.
    query: String,

    /// Re-scan the tree and refresh the index before searching
    /// (might take some time).
    #[arg(long, short = 'u', default_value_t = false)]
    update: bool,

    /// The directory to search.
    #[arg(long, short = 'p', default_value = ".")]
    path: String,

    /// The number of results to return.
    #[arg(short = 'n', long = "results", default_value = "1")]
    n: usize,

    /// File extension to index.
    #[arg(long, default_value = "md")]
    extension: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let root = Path::new(&cli.path);

    let provider = HashedNgramProvider::default();
    let indexer = Indexer::new(&provider, root);

    let (previous, status) = indexer.load_previous();
    let mut must_update = cli.update;
    match &status {
        IndexStatus::Loaded => {}
        IndexStatus::Missing => {
            info!(path = %indexer.store().path().display(), "no index yet, building one");
            must_update = true;
        }
        IndexStatus::Invalid { reason } => {
            warn!(%reason, "index file unusable, rebuilding from scratch");
            must_update = true;
        }
    }

    let options = ScanOptions {
        extension: cli.extension,
        ..ScanOptions::default()
    };

    let index = if must_update {
        let (index, report) = indexer.update(root, &previous, &options)?;
        for skipped in &report.skipped_files {
            warn!(
                path = %skipped.path.display(),
                reason = %skipped.reason,
                "skipped unreadable file"
            );
        }
        info!(
            indexed = report.indexed,
            reused = report.reused,
            embedded = report.embedded,
            "index refreshed"
        );
        index
    } else {
        previous
    };

    let hits = indexer.search(&index, &cli.query, cli.n)?;

    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }

    for hit in hits {
        println!(
            "{} with score {:.4} in chapter {}",
            hit.path.display(),
            hit.score,
            hit.chapter_index
        );
        println!("{}\n", hit.chapter_text);
    }

    Ok(())
}
