//! Lipika CLI - offline transliteration from the command line
//!
//! Runs the same engine as the server, in-process, against a local models
//! directory.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;

use lipika_core::models::LanguageArtifacts;
use lipika_core::{
    CharVocab, EngineConfig, LanguageCode, Mode, ModelRegistry, Provider,
    TransliterationRequest, TransliterationService,
};

/// Lipika - romanized to native-script transliteration
///
/// Examples:
///   lipika transliterate "naa peru Rahul" --to te --mode mix
///   lipika languages
///   lipika vocab build pairs.jsonl --lang te --out ./models
#[derive(Parser)]
#[command(
    name = "lipika",
    about = "Romanized to native-script transliteration",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding `{lang}_model.*` and vocabulary files
    #[arg(long, global = true, value_name = "DIR", env = "LIPIKA_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Device preference: auto, cpu, cuda or metal
    #[arg(long, global = true, env = "LIPIKA_DEVICE")]
    pub device: Option<String>,

    /// Maximum sequence length, including start and end markers
    #[arg(long, global = true, env = "LIPIKA_MAX_LEN")]
    pub max_len: Option<usize>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transliterate a phrase into a target script
    #[command(name = "transliterate", alias = "tr")]
    Transliterate {
        /// Romanized text
        text: String,

        /// Target language code (te, hi, ta, ...)
        #[arg(long, short = 't')]
        to: String,

        /// Source language tag, echoed in the response
        #[arg(long, short = 'f', default_value = "en")]
        from: String,

        /// Keep English-looking tokens (mix) or transliterate everything (native)
        #[arg(long, short, value_enum, default_value = "native")]
        mode: ModeArg,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// List languages with model artifacts on disk
    #[command(name = "languages", alias = "langs")]
    Languages,

    /// Vocabulary tools
    #[command(name = "vocab")]
    Vocab {
        #[command(subcommand)]
        command: VocabCommands,
    },
}

#[derive(Subcommand)]
pub enum VocabCommands {
    /// Build `{lang}_char2idx.json` and `{lang}_idx2char.json` from a JSONL
    /// file of `{"en": .., "native": ..}` pairs
    Build {
        /// JSONL training pairs
        pairs: PathBuf,

        /// Language code used for the file names
        #[arg(long)]
        lang: String,

        /// Output directory
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Transliterate every token
    Native,
    /// Keep English words, numbers and handles as typed
    Mix,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Native => Mode::Native,
            ModeArg::Mix => Mode::Mix,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if cli.verbose {
                    "lipika_core=info,lipika_cli=info".into()
                } else {
                    "warn".into()
                }
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Transliterate {
            ref text,
            ref to,
            ref from,
            mode,
            json,
        } => {
            let service = TransliterationService::from_config(&engine_config(&cli))?;
            let request = TransliterationRequest::new(text.as_str(), to.as_str())
                .with_source_lang(from.as_str())
                .with_mode(mode.into());
            let response = service.transliterate(&request).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.primary);
                if response.provider == Provider::Stub {
                    eprintln!(
                        "note: no usable model for '{}' in {}; some tokens were left as typed",
                        to,
                        service.registry().models_dir().display()
                    );
                }
            }
        }
        Commands::Languages => {
            let registry = ModelRegistry::from_config(&engine_config(&cli))?;
            let languages = registry.available_languages()?;
            if languages.is_empty() {
                println!(
                    "No language models found in {}",
                    registry.models_dir().display()
                );
            }
            for code in languages {
                match code.info() {
                    Some(info) => println!("{:<6} {:<10} {}", code, info.name, info.script),
                    None => println!("{code}"),
                }
            }
        }
        Commands::Vocab {
            command: VocabCommands::Build {
                ref pairs,
                ref lang,
                ref out,
            },
        } => {
            let lang: LanguageCode = lang.parse()?;
            let vocab = build_vocab(pairs)?;
            fs::create_dir_all(out)
                .with_context(|| format!("creating {}", out.display()))?;
            let paths = LanguageArtifacts::expected(out, lang.as_str());
            vocab.save(&paths.char2idx_path, &paths.idx2char_path)?;
            info!("Wrote vocabulary maps for {lang} to {}", out.display());
            println!(
                "{} symbols -> {}, {}",
                vocab.len(),
                paths.char2idx_path.display(),
                paths.idx2char_path.display()
            );
        }
    }

    Ok(())
}

fn engine_config(cli: &Cli) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(dir) = &cli.models_dir {
        config = config.with_models_dir(dir);
    }
    if let Some(device) = &cli.device {
        config.device = device.trim().to_ascii_lowercase();
    }
    if let Some(max_len) = cli.max_len {
        config.max_sequence_length = max_len;
    }
    config
}

#[derive(Debug, Deserialize)]
struct PairRecord {
    en: String,
    native: String,
}

fn read_pairs(path: &Path) -> anyhow::Result<Vec<PairRecord>> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut pairs = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: PairRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid pair", path.display(), index + 1))?;
        pairs.push(record);
    }
    Ok(pairs)
}

fn build_vocab(path: &Path) -> anyhow::Result<CharVocab> {
    let pairs = read_pairs(path)?;
    if pairs.is_empty() {
        bail!("{} contains no pairs", path.display());
    }
    Ok(CharVocab::from_corpus(
        pairs.iter().map(|p| (p.en.as_str(), p.native.as_str())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_transliterate_arguments() {
        let cli = Cli::parse_from([
            "lipika",
            "transliterate",
            "naa peru",
            "--to",
            "te",
            "--mode",
            "mix",
            "--json",
        ]);
        match cli.command {
            Commands::Transliterate { to, mode, json, .. } => {
                assert_eq!(to, "te");
                assert_eq!(Mode::from(mode), Mode::Mix);
                assert!(json);
            }
            _ => panic!("expected transliterate"),
        }
    }

    #[test]
    fn builds_vocab_from_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.jsonl");
        fs::write(
            &path,
            "{\"en\": \"ghar\", \"native\": \"ఘర్\"}\n\n{\"en\": \"amma\", \"native\": \"అమ్మ\"}\n",
        )
        .unwrap();

        let vocab = build_vocab(&path).unwrap();
        assert!(vocab.id_of('g').is_some());
        assert!(vocab.id_of('అ').is_some());
        assert_eq!(vocab.specials().eos, 2);
    }

    #[test]
    fn reports_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.jsonl");
        fs::write(&path, "{\"en\": \"ghar\"}\n").unwrap();

        let err = build_vocab(&path).unwrap_err();
        assert!(format!("{err:#}").contains(":1:"));
    }
}
