use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use verbdeps::config::{Domain, Layout};
use verbdeps::{Lexicon, MatchMode, RecordWriter, VerbSet, archive, pipeline};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Collect sentences containing listed verbs from a corpus
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Corpus domain to read
    #[arg(long, value_enum, default_value_t = Domain::Web)]
    domain: Domain,
    /// Directory holding the verb list, the corpora and the context file
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
    /// How web corpus tokens are matched; fiction is always matched on its lemma stream
    #[arg(long, value_enum, default_value_t = MatchMode::Surface)]
    match_mode: MatchMode,
    /// Stop after this many fiction sentences
    #[arg(long)]
    limit: Option<usize>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn load_lexicon(layout: &Layout) -> Result<Lexicon> {
    let path = layout.lexicon();
    if !path.exists() {
        warn!(
            "no lexicon at {}, matching lowercased surface forms",
            path.display()
        );
        return Ok(Lexicon::new());
    }
    let lexicon = Lexicon::from_path(&path).with_context(|| format!("loading {}", path.display()))?;
    info!("lexicon: {} forms", lexicon.len());
    Ok(lexicon)
}

fn process(args: &Args) -> Result<()> {
    let layout = Layout::new(&args.data_dir);

    let verb_path = layout.verb_list();
    let verbs = VerbSet::load(&verb_path)?;
    info!("parsed {} verbs from {}", verbs.entries(), verb_path.display());

    let out_path = layout.contexts();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&out_path)
        .with_context(|| format!("opening {}", out_path.display()))?;
    let mut writer = RecordWriter::new(BufWriter::new(file));

    info!("domain: {}", args.domain);
    let stats = match args.domain {
        Domain::Web => {
            let lexicon = match args.match_mode {
                MatchMode::Surface => load_lexicon(&layout)?,
                MatchMode::Lemmatized => Lexicon::new(),
            };
            let lines = archive::open_lines(layout.web_sentences())?;
            pipeline::collect_web_contexts(lines, &verbs, args.match_mode, &lexicon, &mut writer)?
        }
        Domain::Fiction => {
            let (lemmatized, tokenized) = layout.fiction();
            let lemma_lines = archive::open_lines(&lemmatized)?;
            let surface_lines = archive::open_lines(&tokenized)?;
            pipeline::collect_fiction_contexts(
                lemma_lines,
                surface_lines,
                &verbs,
                args.limit,
                &mut writer,
            )?
        }
    };

    info!(
        "{} lines, {} contexts written to {}, {} skipped",
        stats.lines,
        stats.rows,
        out_path.display(),
        stats.skipped
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    pretty_env_logger::formatted_timed_builder()
        .filter_level(args.verbose.log_level_filter())
        .init();
    if let Err(e) = process(&args) {
        error!("{e:#}");
        process::exit(1);
    }
}
