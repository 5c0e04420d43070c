//! gist CLI: text-quality scoring and segmentation debugging.
//!
//! Generation-backed operations (summarize/paraphrase) need a loaded
//! sequence-to-sequence generator, which is an external collaborator;
//! the CLI covers the self-contained side of the crate.

use std::fs;
use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use gist::metrics::{readability, score, MetricValue};
use gist::segment::{chunk_by_words, split_paragraphs, split_sentences, tokenize_words};

/// Text-quality evaluation CLI - BLEU, ROUGE, perplexity, readability
#[derive(Parser)]
#[command(name = "gist")]
#[command(
    author,
    version,
    about = "Text-quality evaluation CLI - BLEU, ROUGE, perplexity, readability",
    long_about = r#"
gist - quality evaluation for generated text

CAPABILITIES:
  • Score a candidate against a reference (BLEU 1-4, ROUGE-1/2/L,
    n-gram perplexity, readability deltas)
  • Readability report for a single text (Flesch, Gunning Fog, SMOG,
    ARI, Coleman-Liau, Dale-Chall)
  • Segmentation debugging (word chunks, paragraphs, sentences)

Metrics degrade gracefully: empty or degenerate inputs produce
per-metric "unavailable" markers, never a failed report.

EXAMPLES:
  gist score --reference ref.txt --candidate cand.txt
  gist score -R "The cat sat on the mat." -C "A cat sat on a mat."
  gist readability notes.txt
  gist segment --max-words 800 document.txt
"#
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a candidate text against a reference
    #[command(visible_alias = "s")]
    Score(ScoreArgs),

    /// Readability report for one text
    #[command(visible_alias = "r")]
    Readability(TextArgs),

    /// Show word chunks, paragraphs, and sentences of a text
    #[command(visible_alias = "seg")]
    Segment(SegmentArgs),
}

#[derive(clap::Args)]
struct ScoreArgs {
    /// Reference file (use -R for inline text)
    #[arg(long, conflicts_with = "reference_text")]
    reference: Option<String>,

    /// Inline reference text
    #[arg(short = 'R', long = "reference-text")]
    reference_text: Option<String>,

    /// Candidate file (use -C for inline text)
    #[arg(long, conflicts_with = "candidate_text")]
    candidate: Option<String>,

    /// Inline candidate text
    #[arg(short = 'C', long = "candidate-text")]
    candidate_text: Option<String>,

    /// Optional original source file, for original-vs-candidate deltas
    #[arg(long)]
    original: Option<String>,
}

#[derive(clap::Args)]
struct TextArgs {
    /// Input file; stdin when omitted
    file: Option<String>,
}

#[derive(clap::Args)]
struct SegmentArgs {
    /// Input file; stdin when omitted
    file: Option<String>,

    /// Maximum words per chunk
    #[arg(long, default_value_t = 800)]
    max_words: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable tables
    Pretty,
    /// JSON on stdout
    Json,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Score(args) => run_score(args, cli.format),
        Commands::Readability(args) => run_readability(args, cli.format),
        Commands::Segment(args) => run_segment(args, cli.format),
    }
}

fn run_score(args: ScoreArgs, format: OutputFormat) -> Result<(), String> {
    let reference = read_side(args.reference.as_deref(), args.reference_text, "reference")?;
    let candidate = read_side(args.candidate.as_deref(), args.candidate_text, "candidate")?;
    let original = args
        .original
        .as_deref()
        .map(read_file)
        .transpose()?;

    let report = score(&reference, &candidate, original.as_deref());
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Pretty => {
            print_metric("bleu", &report.bleu, |b| {
                format!(
                    "bleu-1 {:.4}  bleu-2 {:.4}  bleu-3 {:.4}  bleu-4 {:.4}  bleu {:.4}",
                    b.bleu_1, b.bleu_2, b.bleu_3, b.bleu_4, b.bleu
                )
            });
            print_metric("rouge", &report.rouge, |r| {
                format!(
                    "rouge1 f1 {:.4}  rouge2 f1 {:.4}  rougeL f1 {:.4}",
                    r.rouge1.f1, r.rouge2.f1, r.rouge_l.f1
                )
            });
            print_metric("perplexity (candidate)", &report.perplexity_candidate, |p| {
                format!("{:.2} ({}-gram)", p.perplexity, p.ngram)
            });
            print_metric("perplexity (reference)", &report.perplexity_reference, |p| {
                format!("{:.2} ({}-gram)", p.perplexity, p.ngram)
            });
            print_metric("readability (vs reference)", &report.readability_reference, |c| {
                format!(
                    "flesch delta {:+.2}  fog delta {:+.2}  words {:+}",
                    c.delta.flesch_reading_ease, c.delta.gunning_fog, c.delta.word_count
                )
            });
            if let Some(cmp) = &report.readability_original {
                print_metric("readability (vs original)", cmp, |c| {
                    format!(
                        "flesch delta {:+.2}  fog delta {:+.2}  words {:+}",
                        c.delta.flesch_reading_ease, c.delta.gunning_fog, c.delta.word_count
                    )
                });
            }
            Ok(())
        }
    }
}

fn run_readability(args: TextArgs, format: OutputFormat) -> Result<(), String> {
    let text = read_input(args.file.as_deref())?;
    let report = readability(&text);
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Pretty => {
            print_metric("readability", &report, |r| {
                format!(
                    "flesch {:.2}  fk-grade {:.2}  fog {:.2}  smog {:.2}  ari {:.2}  \
                     coleman-liau {:.2}  dale-chall {:.2}  words {}  band {:?}",
                    r.flesch_reading_ease,
                    r.flesch_kincaid_grade,
                    r.gunning_fog,
                    r.smog_index,
                    r.automated_readability_index,
                    r.coleman_liau_index,
                    r.dale_chall_readability_score,
                    r.word_count,
                    r.complexity_band
                )
            });
            Ok(())
        }
    }
}

fn run_segment(args: SegmentArgs, format: OutputFormat) -> Result<(), String> {
    let text = read_input(args.file.as_deref())?;
    let chunks = chunk_by_words(&text, args.max_words);
    let paragraphs = split_paragraphs(&text);
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "word_count": tokenize_words(&text).len(),
                "chunks": chunks,
                "paragraphs": paragraphs.len(),
                "sentences": paragraphs
                    .iter()
                    .map(|p| split_sentences(p).len())
                    .sum::<usize>(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?
            );
            Ok(())
        }
        OutputFormat::Pretty => {
            println!("{} chunk(s) of <= {} words", chunks.len(), args.max_words);
            for chunk in &chunks {
                println!(
                    "  [{}] words {}..{}",
                    chunk.index, chunk.word_range.0, chunk.word_range.1
                );
            }
            println!("{} paragraph(s)", paragraphs.len());
            for (i, paragraph) in paragraphs.iter().enumerate() {
                println!("  [{i}] {} sentence(s)", split_sentences(paragraph).len());
            }
            Ok(())
        }
    }
}

fn print_metric<T>(name: &str, value: &MetricValue<T>, render: impl Fn(&T) -> String) {
    match value {
        MetricValue::Ready(inner) => println!("{name}: {}", render(inner)),
        MetricValue::Unavailable { reason } => println!("{name}: unavailable ({reason})"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())?
    );
    Ok(())
}

fn read_side(
    file: Option<&str>,
    inline: Option<String>,
    name: &str,
) -> Result<String, String> {
    match (file, inline) {
        (Some(path), None) => read_file(path),
        (None, Some(text)) => Ok(text),
        (None, None) => Err(format!("missing {name}: pass --{name} FILE or an inline text flag")),
        (Some(_), Some(_)) => unreachable!("clap conflicts_with prevents this"),
    }
}

fn read_file(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))
}

fn read_input(file: Option<&str>) -> Result<String, String> {
    match file {
        Some(path) => read_file(path),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("reading stdin: {e}"))?;
            Ok(buffer)
        }
    }
}
