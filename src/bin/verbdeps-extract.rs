use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::{error, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use verbdeps::config::Layout;
use verbdeps::{ContextRecord, ParserCommand, PrefixMap, RecordWriter, Treebank, pipeline};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Extract subject, preposition and oblique argument of each collected verb
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// CoNLL-U parses of the context sentences (.conllu or .conllu.gz)
    #[arg(long, required_unless_present = "parser_cmd", conflicts_with = "parser_cmd")]
    treebank: Option<PathBuf>,
    /// Parser command reading one sentence per line on stdin and writing CoNLL-U; run once
    #[arg(long)]
    parser_cmd: Option<String>,
    /// Directory holding the context file, the prefix map and the output
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn load_parses(args: &Args, layout: &Layout, contexts: &[ContextRecord]) -> Result<Treebank> {
    match (&args.treebank, &args.parser_cmd) {
        (Some(path), _) => {
            let path = layout.resolve(path);
            let treebank = Treebank::from_path(&path)
                .with_context(|| format!("loading treebank {}", path.display()))?;
            info!("treebank: {} parsed sentences", treebank.len());
            Ok(treebank)
        }
        (None, Some(command)) => {
            info!("parsing {} contexts with: {}", contexts.len(), command);
            let sentences: Vec<&str> = contexts.iter().map(|c| c.sentence.as_str()).collect();
            let treebank = ParserCommand::from_command_line(command)?
                .parse_all(&sentences)
                .with_context(|| format!("running {}", command))?;
            Ok(treebank)
        }
        (None, None) => anyhow::bail!("either --treebank or --parser-cmd is required"),
    }
}

fn process(args: &Args) -> Result<()> {
    let layout = Layout::new(&args.data_dir);

    let prefixes = PrefixMap::from_path(layout.prefix_map())?;
    info!("prefix map: {} verbs", prefixes.len());

    let contexts_path = layout.contexts();
    let contexts = pipeline::read_contexts(&contexts_path)
        .with_context(|| format!("reading {}", contexts_path.display()))?;
    info!("{} contexts", contexts.len());

    let mut parses = load_parses(args, &layout, &contexts)?;

    let out_path = layout.dependencies();
    let file = File::create(&out_path).with_context(|| format!("creating {}", out_path.display()))?;
    let mut writer = RecordWriter::new(BufWriter::new(file));

    let bar = cliclack::progress_bar(contexts.len() as u64);
    bar.start("Extracting dependencies");
    let stats = pipeline::extract_dependencies(
        &contexts,
        &mut parses,
        &prefixes,
        &mut writer,
        || bar.inc(1),
    );
    let stats = match stats {
        Ok(stats) => stats,
        Err(e) => {
            bar.error("Extraction failed");
            return Err(e.into());
        }
    };
    bar.stop(format!("{} rows written to {}", stats.rows, out_path.display()));

    info!(
        "{} with arguments, {} with oblique, {} with nothing found, {} without parse",
        stats.found,
        stats.objects,
        stats.unparsed,
        parses.misses()
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
