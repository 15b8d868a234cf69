//! stardict-lookup: CLI tool for inspecting and querying StarDict dictionaries.

use clap::{Parser, Subcommand};
use stardict::{CacheConfig, Dictionary, Entry, StarDictInfo};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stardict-lookup")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Look up words in StarDict dictionaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print dictionary metadata
    Info {
        /// Path to the .ifo file
        ifo: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up a word
    Lookup {
        /// Path to the .ifo file
        ifo: PathBuf,

        /// Word to look up
        word: String,

        /// Return every headword starting with the word
        #[arg(short, long)]
        predictive: bool,

        /// Lowercase the word before looking it up
        #[arg(short, long)]
        lowercase: bool,

        /// Disable the article cache
        #[arg(long)]
        no_cache: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { ifo, json } => show_info(&ifo, json),
        Commands::Lookup {
            ifo,
            word,
            predictive,
            lowercase,
            no_cache,
            json,
        } => lookup(&ifo, &word, predictive, lowercase, no_cache, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn show_info(ifo: &PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let info = StarDictInfo::load(ifo)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Name:        {}", info.book_name);
    println!("Version:     {}", info.version.as_str());
    println!("Words:       {}", info.word_count);
    if let Some(count) = info.syn_word_count {
        println!("Synonyms:    {}", count);
    }
    println!("Offset bits: {}", info.offset_bits.bits());
    if let Some(ref types) = info.same_type_sequence {
        println!("Types:       {}", types);
    }
    for (label, value) in [
        ("Author:     ", &info.author),
        ("Email:      ", &info.email),
        ("Website:    ", &info.website),
        ("Date:       ", &info.date),
        ("Description:", &info.description),
    ] {
        if let Some(value) = value {
            println!("{} {}", label, value);
        }
    }

    Ok(())
}

fn lookup(
    ifo: &PathBuf,
    word: &str,
    predictive: bool,
    lowercase: bool,
    no_cache: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dict = if no_cache {
        Dictionary::open_with_config(ifo, CacheConfig::no_cache())?
    } else {
        Dictionary::open(ifo)?
    };

    let word = if lowercase {
        word.to_lowercase()
    } else {
        word.to_string()
    };

    let entries = if predictive {
        dict.lookup_predictive(&word)?
    } else {
        dict.lookup(&word)?
    };
    dict.close();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries for {:?}", word);
        return Ok(());
    }
    for entry in &entries {
        print_entry(entry);
    }

    Ok(())
}

fn print_entry(entry: &Entry) {
    println!("== {} [{}]", entry.word, entry.entry_type);
    match entry.article {
        Some(ref text) => println!("{}\n", text),
        None => println!("(article unavailable)\n"),
    }
}
