// Melody CLI entry point.
//
// Runs the pieces of the pipeline from files on disk:
//   build-corpus  events JSON -> delimited corpus text + vocabulary JSON
//   windows       report the training-window tensor a corpus produces
//   train-markov  fit the n-gram predictor on a corpus
//   generate      sample a melody from the predictor, decode it, write MIDI
//   decode        turn a token stream into events (and MIDI)
//
// Usage:
//   cargo run -p melody_gen -- build-corpus --pieces pieces.json
//   cargo run -p melody_gen -- train-markov --order 4
//   cargo run -p melody_gen -- generate --seed "67 _ 67 _ 67 _ _ _" --rng-seed 7 --midi out.mid
//
// All commands accept `--config pipeline.json` (see `PipelineConfig`).

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use melody_codec::corpus::{build_corpus, load_corpus, save_corpus, split_pieces};
use melody_codec::decode::decode_tokens;
use melody_codec::event::{Event, melody_summary, total_duration};
use melody_codec::token::{Token, join_stream, parse_stream};
use melody_codec::vocabulary::Vocabulary;
use melody_codec::window::{SequenceWindower, map_to_ids};
use melody_gen::config::PipelineConfig;
use melody_gen::generator::MelodyGenerator;
use melody_gen::markov::MarkovPredictor;
use melody_gen::midi::write_midi;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "melody", about = "Time-step melody codec and generator")]
struct Cli {
    /// Debug-level logging for the melody crates.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pipeline config JSON; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode pieces into a delimited corpus and build its vocabulary.
    BuildCorpus {
        /// JSON array of pieces, each an array of events.
        #[arg(long)]
        pieces: PathBuf,
        #[arg(long, default_value = "dataset.txt")]
        corpus: PathBuf,
        #[arg(long, default_value = "mapping.json")]
        vocab: PathBuf,
    },
    /// Report the training windows a corpus yields.
    Windows {
        #[arg(long, default_value = "dataset.txt")]
        corpus: PathBuf,
        #[arg(long, default_value = "mapping.json")]
        vocab: PathBuf,
    },
    /// Fit the n-gram predictor on a corpus.
    TrainMarkov {
        #[arg(long, default_value = "dataset.txt")]
        corpus: PathBuf,
        #[arg(long, default_value = "mapping.json")]
        vocab: PathBuf,
        #[arg(long, default_value = "model.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 4)]
        order: usize,
        #[arg(long, default_value_t = 0.01)]
        smoothing: f64,
    },
    /// Generate a melody continuing a seed.
    Generate {
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
        #[arg(long, default_value = "mapping.json")]
        vocab: PathBuf,
        /// Seed in token notation, e.g. "67 _ 67 _ r _".
        #[arg(long, default_value = "")]
        seed: String,
        #[arg(long)]
        steps: Option<usize>,
        #[arg(long)]
        temperature: Option<f64>,
        /// RNG seed for reproducible output.
        #[arg(long)]
        rng_seed: Option<u64>,
        /// Write the generated token stream here.
        #[arg(long)]
        tokens_out: Option<PathBuf>,
        #[arg(long)]
        midi: Option<PathBuf>,
    },
    /// Decode a token stream into events.
    Decode {
        /// Tokens inline; use --tokens-file for a file.
        #[arg(long, conflicts_with = "tokens_file")]
        tokens: Option<String>,
        #[arg(long)]
        tokens_file: Option<PathBuf>,
        #[arg(long)]
        midi: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    melody_gen::logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::BuildCorpus {
            pieces,
            corpus,
            vocab,
        } => cmd_build_corpus(&config, &pieces, &corpus, &vocab),
        Command::Windows { corpus, vocab } => cmd_windows(&config, &corpus, &vocab),
        Command::TrainMarkov {
            corpus,
            vocab,
            out,
            order,
            smoothing,
        } => cmd_train_markov(&corpus, &vocab, &out, order, smoothing),
        Command::Generate {
            model,
            vocab,
            seed,
            steps,
            temperature,
            rng_seed,
            tokens_out,
            midi,
        } => {
            let mut config = config;
            if let Some(steps) = steps {
                config.generation.num_steps = steps;
            }
            if let Some(t) = temperature {
                config.generation.temperature = t;
            }
            cmd_generate(
                &config,
                &model,
                &vocab,
                &seed,
                rng_seed,
                tokens_out.as_deref(),
                midi.as_deref(),
            )
        }
        Command::Decode {
            tokens,
            tokens_file,
            midi,
        } => {
            let text = match (tokens, tokens_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("pass --tokens or --tokens-file"),
            };
            cmd_decode(&config, &text, midi.as_deref())
        }
    }
}

fn cmd_build_corpus(
    config: &PipelineConfig,
    pieces: &Path,
    corpus: &Path,
    vocab: &Path,
) -> Result<()> {
    let data = std::fs::read_to_string(pieces)
        .with_context(|| format!("reading {}", pieces.display()))?;
    let pieces: Vec<Vec<Event>> = serde_json::from_str(&data).context("parsing pieces JSON")?;
    println!("Loaded {} pieces.", pieces.len());

    let build = build_corpus(&pieces, &config.codec)?;
    for rejected in &build.rejected {
        println!("  Skipped piece {}: {}", rejected.index, rejected.error);
    }
    if build.accepted.is_empty() {
        bail!("no piece could be encoded");
    }

    save_corpus(corpus, &build.corpus).with_context(|| format!("writing {}", corpus.display()))?;
    build.vocabulary.save(vocab).with_context(|| format!("writing {}", vocab.display()))?;
    println!(
        "Corpus: {} pieces, {} tokens -> {}",
        build.accepted.len(),
        build.corpus.len(),
        corpus.display()
    );
    println!("Vocabulary: {} symbols -> {}", build.vocabulary.len(), vocab.display());
    Ok(())
}

fn load_inputs(corpus: &Path, vocab: &Path) -> Result<(Vec<Token>, Vocabulary)> {
    let tokens =
        load_corpus(corpus).with_context(|| format!("reading corpus {}", corpus.display()))?;
    Ok((tokens, load_vocabulary(vocab)?))
}

fn load_vocabulary(vocab: &Path) -> Result<Vocabulary> {
    Vocabulary::load(vocab).with_context(|| format!("reading vocabulary {}", vocab.display()))
}

fn cmd_windows(config: &PipelineConfig, corpus: &Path, vocab: &Path) -> Result<()> {
    let (tokens, vocabulary) = load_inputs(corpus, vocab)?;
    let windower = SequenceWindower::new(&tokens, &vocabulary, config.codec.sequence_length)
        .context("corpus and vocabulary do not match")?;
    let (examples, length, width) = windower.input_shape();
    let bytes = examples * length * width * std::mem::size_of::<f32>();
    let megabytes = bytes as f64 / (1024.0 * 1024.0);
    println!("Pieces: {}", split_pieces(&tokens).len());
    println!("Tokens: {}", tokens.len());
    println!("Examples: {examples}");
    println!("Input shape: ({examples}, {length}, {width})");
    println!("One-hot inputs if materialized: {megabytes:.1} MB");
    Ok(())
}

fn cmd_train_markov(
    corpus: &Path,
    vocab: &Path,
    out: &Path,
    order: usize,
    smoothing: f64,
) -> Result<()> {
    let (tokens, vocabulary) = load_inputs(corpus, vocab)?;
    let ids = map_to_ids(&tokens, &vocabulary).context("corpus and vocabulary do not match")?;
    let model = MarkovPredictor::train(&ids, order, vocabulary.len(), smoothing)?;
    model.save(out).with_context(|| format!("writing {}", out.display()))?;
    println!("Trained order-{order} model on {} tokens -> {}", ids.len(), out.display());
    Ok(())
}

fn cmd_generate(
    config: &PipelineConfig,
    model: &Path,
    vocab: &Path,
    seed: &str,
    rng_seed: Option<u64>,
    tokens_out: Option<&Path>,
    midi: Option<&Path>,
) -> Result<()> {
    let vocabulary = load_vocabulary(vocab)?;
    let predictor = MarkovPredictor::load(model)
        .with_context(|| format!("reading model {}", model.display()))?;
    if predictor.vocabulary_size != vocabulary.len() {
        bail!(
            "model was trained on {} symbols but the vocabulary has {}",
            predictor.vocabulary_size,
            vocabulary.len()
        );
    }
    let seed = parse_stream(seed).context("parsing seed")?;

    let mut rng = match rng_seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let mut generator = MelodyGenerator::new(predictor, &vocabulary, config.generation.clone())?;
    let generation = generator.generate(&seed, &mut rng)?;
    println!(
        "Generated {} tokens in {} steps (stopped on {:?}).",
        generation.generated().len(),
        generation.steps,
        generation.stop
    );

    let text = join_stream(&generation.melody);
    println!("{text}");
    if let Some(path) = tokens_out {
        std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
    }

    if generation.melody.is_empty() {
        println!("Empty melody; nothing to decode.");
        return Ok(());
    }
    let events = decode_tokens(&generation.melody, config.codec.time_step)?;
    write_events(config, &events, midi)
}

fn cmd_decode(config: &PipelineConfig, text: &str, midi: Option<&Path>) -> Result<()> {
    let tokens = parse_stream(text).context("parsing tokens")?;
    let events = decode_tokens(&tokens, config.codec.time_step)?;
    write_events(config, &events, midi)
}

fn write_events(config: &PipelineConfig, events: &[Event], midi: Option<&Path>) -> Result<()> {
    println!(
        "{} events, {} quarter lengths: {}",
        events.len(),
        total_duration(events),
        melody_summary(events)
    );
    if let Some(path) = midi {
        write_midi(events, config.tempo_bpm, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote MIDI to {}", path.display());
    }
    Ok(())
}
