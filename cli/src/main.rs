use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use screen_core::persist::{load_model, ModelPaths};
use screen_core::{is_blank_query, rank_label, DocumentInput, NormalizerConfig, Screener, Screening};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "screen")]
#[command(about = "Rank resumes against job requirements", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank resumes (plain-text files and/or pasted text) by similarity to the requirements
    Rank {
        /// Model directory (meta.json, vectorizer.bin, optional classifier.bin / categories.json)
        #[arg(long, default_value = "./model")]
        model: String,
        /// Job requirements or keywords
        #[arg(long, default_value = "")]
        query: String,
        /// Resume file or directory of .txt files (repeatable)
        #[arg(long)]
        input: Vec<PathBuf>,
        /// Pasted resume as NAME=TEXT (repeatable)
        #[arg(long = "text", value_parser = parse_named_text)]
        texts: Vec<(String, String)>,
        /// Show the first N characters of every resume under its rank line
        #[arg(long)]
        preview: Option<usize>,
        /// Print results as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Keep non-ASCII characters instead of blanking them
        #[arg(long, default_value_t = false)]
        keep_non_ascii: bool,
        /// Fold accented letters to their ASCII base before cleaning
        #[arg(long, default_value_t = false)]
        fold_diacritics: bool,
    },
    /// List the category labels the model can predict
    Categories {
        #[arg(long, default_value = "./model")]
        model: String,
    },
}

#[derive(Serialize)]
struct RankedRow<'a> {
    rank: usize,
    ordinal: &'a str,
    id: &'a str,
    score: f32,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank { model, query, input, texts, preview, json, keep_non_ascii, fold_diacritics } => {
            let config = NormalizerConfig { strip_non_ascii: !keep_non_ascii, fold_diacritics, ..Default::default() };
            run_rank(&model, &query, &input, texts, preview, json, config)
        }
        Commands::Categories { model } => {
            let model = load_model(&ModelPaths::new(&model))?;
            for (id, label) in model.categories().iter() {
                println!("{id:>3}  {label}");
            }
            Ok(())
        }
    }
}

fn run_rank(
    model_dir: &str,
    query: &str,
    inputs: &[PathBuf],
    texts: Vec<(String, String)>,
    preview: Option<usize>,
    json: bool,
    config: NormalizerConfig,
) -> Result<()> {
    let mut docs = collect_documents(inputs)?;
    docs.extend(texts.into_iter().map(|(name, text)| DocumentInput::new(name, text)));

    if docs.is_empty() {
        eprintln!("No resumes uploaded or pasted.");
        return Ok(());
    }
    if is_blank_query(query) {
        eprintln!("Please enter job requirements or keywords to rank resumes.");
        return Ok(());
    }

    let model = load_model(&ModelPaths::new(model_dir)).with_context(|| format!("loading model from {model_dir}"))?;
    tracing::info!(docs = docs.len(), "ranking resumes");
    let screening = Screener::with_config(&model, config).screen(query, docs);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows(&screening, preview))?);
    } else {
        print!("{}", render(&screening, preview));
    }
    Ok(())
}

fn rows(screening: &Screening, preview: Option<usize>) -> Vec<RankedRow<'_>> {
    screening
        .results
        .iter()
        .map(|r| RankedRow {
            rank: r.rank,
            ordinal: &r.ordinal,
            id: &r.document.id,
            score: r.score,
            category: &r.category,
            preview: preview.map(|n| truncate_chars(&r.document.raw_text, n)),
        })
        .collect()
}

fn render(screening: &Screening, preview: Option<usize>) -> String {
    let mut out = String::new();
    out.push_str("All resumes (ranked by match to your requirements):\n");
    for r in &screening.results {
        out.push_str(&format!(
            "{}: {} (Match Score: {:.2}, Predicted Category: {})\n",
            rank_label(r.rank),
            r.document.id,
            r.score,
            r.category
        ));
        if let Some(n) = preview {
            for line in truncate_chars(&r.document.raw_text, n).lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("    ---\n");
        }
    }
    out
}

/// Gather `.txt` resumes. Directories are walked recursively; files come back sorted by path
/// within each input, named by their file name.
fn collect_documents(inputs: &[PathBuf]) -> Result<Vec<DocumentInput>> {
    let mut docs = Vec::new();
    for input in inputs {
        let mut files: Vec<PathBuf> = Vec::new();
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && is_text_file(p) {
                    files.push(p.to_path_buf());
                }
            }
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(anyhow!("input {} does not exist", input.display()));
        }

        for file in files {
            let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %file.display(), "resume is not valid UTF-8; decoding lossily");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| file.display().to_string());
            docs.push(DocumentInput::new(name, text));
        }
    }
    Ok(docs)
}

fn is_text_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()).map(|ext| ext.eq_ignore_ascii_case("txt")).unwrap_or(false)
}

fn parse_named_text(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, text)) if !name.trim().is_empty() => Ok((name.trim().to_string(), text.to_string())),
        _ => Err(format!("expected NAME=TEXT, got {raw:?}")),
    }
}

fn truncate_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}
