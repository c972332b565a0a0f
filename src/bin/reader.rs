//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use keyed_bplist::archive::UnarchivedModel;
use keyed_bplist::printer::{self, DEFAULT_INDENT_WIDTH};
use keyed_bplist::PlistReader;
use log::LevelFilter;

/// Decodes a binary property list and prints its contents.
#[derive(Parser)]
struct Cli {
    /// Path to the bplist00 document to read.
    input: PathBuf,

    /// Path to write the rendered tree to. Defaults to stdout.
    output: Option<PathBuf>,

    /// Number of spaces per indentation level.
    #[arg(long, default_value_t = DEFAULT_INDENT_WIDTH)]
    indent: usize,

    /// Recognize the NSKeyedArchiver convention and print the reconstructed
    /// object graph instead of the raw value tree.
    #[arg(long)]
    unarchive: bool,

    /// Increase logging verbosity. Can be specified multiple times.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn run(&self) -> Result<()> {
        let reader = PlistReader::from_path(&self.input)
            .with_context(|| format!("reading {}", self.input.display()))?;

        let mut sink: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(File::create(path).with_context(|| format!("creating {}", path.display()))?),
            None => Box::new(io::stdout()),
        };

        if self.unarchive {
            let model = UnarchivedModel::from_value(&reader.plist_root);
            printer::print_model(&mut sink, &model, self.indent)?;
        } else {
            printer::print_value(&mut sink, &reader.plist_root, self.indent)?;
        }

        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level.as_str())).init();

    let exit_code = match cli.run() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}
