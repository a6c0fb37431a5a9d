use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use verse::config::{self, VerseConfig};
use verse::display::{render, ShowMeta};
use verse::{
    scan, CommandClassifier, MetadataResolver, ProfanityCache, ProfanityFlags, ScanConfig,
    SelectionError, StreamOptions, VerseError,
};

#[derive(Parser, Debug)]
#[command(name = "verse")]
#[command(about = "Print a random line from your lyrics collection")]
#[command(version, disable_version_flag = true)]
struct Args {
    /// Print the artist above the line
    #[arg(long)]
    show_artist: bool,

    /// Print the song title above the line
    #[arg(long)]
    show_title: bool,

    /// Print artist and title (same as --show-artist --show-title)
    #[arg(long)]
    show_meta: bool,

    /// Allow lines flagged as profane
    #[arg(long)]
    allow_profanities: bool,

    /// Rebuild the profanity cache and exit
    #[arg(long)]
    generate_profanity_cache: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Directory holding lyric files [default: ~/lyrics]
    #[arg(long)]
    lyrics_dir: Option<PathBuf>,

    /// Music library searched for tagged audio files [default: ~/music/tracks]
    #[arg(long)]
    music_dir: Option<PathBuf>,

    /// Take artist/title from file names only, skipping tag lookup
    #[arg(long)]
    split_filenames: bool,

    /// Sample in a single streaming pass instead of loading the whole corpus
    #[arg(long)]
    streaming: bool,

    /// Profanity classifier program (reads lines on stdin, prints 0/1 per line)
    #[arg(long, default_value = config::DEFAULT_CLASSIFIER)]
    classifier: String,

    /// Classifier timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_CLASSIFIER_TIMEOUT_SECS)]
    classifier_timeout: u64,

    /// Seed for reproducible selection
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON on stderr
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    // stdout carries the lyric, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}

fn build_config(args: &Args, config_dir: PathBuf) -> Result<VerseConfig> {
    let lyrics_dir = match args.lyrics_dir.clone().or_else(config::default_lyrics_dir) {
        Some(dir) => dir,
        None => anyhow::bail!("No lyrics directory given and HOME is not set"),
    };

    Ok(VerseConfig {
        config_dir,
        lyrics_dir,
        music_dir: args.music_dir.clone().or_else(config::default_music_dir),
        classifier_command: args.classifier.clone(),
        classifier_timeout: Duration::from_secs(args.classifier_timeout),
        max_corpus_lines: config::MAX_CORPUS_LINES,
    })
}

fn build_resolver(config: &VerseConfig, split_filenames: bool) -> MetadataResolver {
    match &config.music_dir {
        Some(dir) if !split_filenames && dir.is_dir() => MetadataResolver::from_music_dir(dir),
        _ => MetadataResolver::filename_only(),
    }
}

fn report(err: VerseError) -> ExitCode {
    match &err {
        VerseError::NoLyricsFound | VerseError::Selection(_) => println!("{err}"),
        VerseError::ConfigDir(_) => eprintln!("{err}"),
    }
    ExitCode::FAILURE
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_json);

    info!(?args, "Parsed CLI arguments");

    let config_dir = match config::init_config_dir().await {
        Ok(dir) => dir,
        Err(e) => return Ok(report(e)),
    };
    let config = build_config(&args, config_dir)?;
    info!("Lyrics directory: {}", config.lyrics_dir.display());

    let show = ShowMeta::from_flags(args.show_artist, args.show_title, args.show_meta);
    let cache = ProfanityCache::new(config.cache_path());
    let classifier = CommandClassifier::new(&config.classifier_command, config.classifier_timeout);
    let resolver = build_resolver(&config, args.split_filenames);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let scan_config = ScanConfig {
        max_lines: config.max_corpus_lines,
        prefer_filename_split: args.split_filenames,
        ..ScanConfig::default()
    };

    if args.streaming && !args.generate_profanity_cache {
        let flags = if args.allow_profanities {
            None
        } else {
            match cache.read().await {
                Some(flags) => Some(flags),
                None => {
                    // No flags to stream against: build the cache the same way a scan run would
                    warn!("Profanity cache missing, scanning to build it before streaming");
                    let corpus = scan(&config.lyrics_dir, &resolver, &scan_config).await;
                    if corpus.is_empty() {
                        return Ok(report(VerseError::NoLyricsFound));
                    }
                    Some(cache.load_or_regenerate(&corpus, &classifier, false).await)
                }
            }
        };
        let options = StreamOptions {
            allow_profanity: args.allow_profanities,
            prefer_filename_split: args.split_filenames,
            flags: flags.as_ref(),
            ..StreamOptions::default()
        };
        return match verse::pick_streaming(&config.lyrics_dir, &resolver, &options, &mut rng).await {
            Ok(picked) => {
                print!("{}", render(&picked.text, &picked.meta, show));
                Ok(ExitCode::SUCCESS)
            }
            Err(SelectionError::EmptyCorpus) => Ok(report(VerseError::NoLyricsFound)),
            Err(e) => Ok(report(e.into())),
        };
    }

    let corpus = scan(&config.lyrics_dir, &resolver, &scan_config).await;
    if corpus.is_empty() {
        return Ok(report(VerseError::NoLyricsFound));
    }

    if args.generate_profanity_cache {
        return match cache.regenerate(&corpus, &classifier).await {
            Ok(flags) => {
                println!(
                    "Profanity cache written to {}: {} lines, {} flagged",
                    cache.path().display(),
                    flags.len(),
                    flags.profane_count()
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Profanity cache not regenerated: {e:#}");
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let flags = if args.allow_profanities {
        ProfanityFlags::all_clean(corpus.len())
    } else {
        cache.load_or_regenerate(&corpus, &classifier, false).await
    };

    match verse::pick_line(&corpus, &flags, args.allow_profanities, &mut rng) {
        Ok(picked) => {
            print!("{}", render(&picked.text, &picked.meta, show));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Selection failed over {} lines: {}", corpus.len(), e);
            Ok(report(e.into()))
        }
    }
}
