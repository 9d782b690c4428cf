// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `ragtime` - finds ragtime rhythms in xmk transcriptions and lends them to other songs.

use std::io::{self, Write};
use std::path::PathBuf;

use log::{error, info};
use structopt::StructOpt;

use rag_rhythm::config::{GeneratorConfig, PatternLength};
use rag_rhythm::corpus::{CorpusSource, PatternTable, XmkDirectory};
use rag_rhythm::syncopation::SyncopationCount;
use rag_rhythm::{rephrase_files, xmk, Error};

#[derive(Debug, StructOpt)]
#[structopt(name = "ragtime", about = "Finding and borrowing ragtime rhythms")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Cells per measure of the onset patterns, a multiple of 8.
    #[structopt(short = "l", long, default_value = "8")]
    pattern_length: PatternLength,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Print the onset pattern of every measure of a song.
    Patterns {
        #[structopt(parse(from_os_str))]
        song: PathBuf,
    },
    /// Print the weighted patterns of a directory of xmk files.
    Table {
        #[structopt(parse(from_os_str))]
        corpus: PathBuf,

        /// Cells per measure the corpus files are read at before stretching.
        #[structopt(long, default_value = "8")]
        corpus_length: PatternLength,
    },
    /// Replace the rhythms of a song with rhythms from a corpus.
    Generate {
        #[structopt(parse(from_os_str))]
        song: PathBuf,

        #[structopt(parse(from_os_str))]
        corpus: PathBuf,

        /// Cells per measure the corpus files are read at before stretching.
        #[structopt(long, default_value = "8")]
        corpus_length: PatternLength,

        /// Seed for choosing the rules, for reproducible output.
        #[structopt(short, long)]
        seed: Option<u64>,

        /// Where to write the generated song. Printed if not given.
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
    },
    /// Count 121 syncopations in every song of a directory.
    Syncopation {
        #[structopt(parse(from_os_str))]
        corpus: PathBuf,
    },
}

fn write_output(text: &str, output: Option<&PathBuf>) -> Result<(), Error> {
    let result = match output {
        Some(path) => std::fs::write(path, text),
        None => io::stdout().write_all(text.as_bytes()),
    };
    result.map_err(|source| Error::WriteOutput { source })
}

fn print_table(table: &PatternTable) {
    for (onsets, group) in table.groups() {
        println!("{} onsets:", onsets);
        for entry in group {
            println!("  {:.4}  {}", entry.weight, entry.pattern);
        }
    }
}

fn print_syncopation(title: &str, count: &SyncopationCount) {
    let ratio = |r: Option<f64>| r.map_or_else(|| "-".to_owned(), |r| format!("{:.3}", r));
    println!(
        "{}\t{}\t{} ({})\t{} ({})\t{} ({})\t{} ({})",
        title,
        count.bars,
        count.untied,
        ratio(count.untied_ratio()),
        count.tied,
        ratio(count.tied_ratio()),
        count.untied_augmented,
        ratio(count.untied_augmented_ratio()),
        count.tied_augmented,
        ratio(count.tied_augmented_ratio()),
    );
}

fn run(opt: Opt) -> Result<(), Error> {
    match opt.command {
        Command::Patterns { song } => {
            let song = xmk::read(&song)?;
            for (number, pattern) in song.measure_patterns(opt.pattern_length)? {
                println!("{}\t{}", number, pattern);
            }
        }
        Command::Table {
            corpus,
            corpus_length,
        } => {
            let corpus = XmkDirectory::new(corpus, corpus_length);
            print_table(&PatternTable::from_corpus(&corpus, opt.pattern_length)?);
        }
        Command::Generate {
            song,
            corpus,
            corpus_length,
            seed,
            output,
        } => {
            let config = GeneratorConfig {
                pattern_length: opt.pattern_length,
                corpus_length,
                seed,
            };
            let (rules, generated) = rephrase_files(&config, &song, &corpus)?;
            info!(
                "{} rules, {} patterns without rule, {} measures kept their rhythm",
                rules.len(),
                rules.failures().len(),
                generated.unaligned.len()
            );
            write_output(&generated.to_string(), output.as_ref())?;
        }
        Command::Syncopation { corpus } => {
            let songs = XmkDirectory::new(corpus, PatternLength::EIGHTHS).songs()?;
            println!("title\tbars\tuntied\ttied\tuntied aug.\ttied aug.");
            let mut total = SyncopationCount::default();
            for song in &songs {
                let count = SyncopationCount::of_song(&song.melody, song.bass.as_deref());
                print_syncopation(&song.title, &count);
                total = total.add(count);
            }
            print_syncopation("total", &total);
        }
    }
    Ok(())
}

fn main() {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    if let Err(err) = simple_logger::init_with_level(level) {
        eprintln!("could not set up logging: {}", err);
    }

    if let Err(err) = run(opt) {
        error!("{}", err);
        std::process::exit(1);
    }
}
