use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{warn, LevelFilter};

use bzip2_blocksort::{Bz2Error, Config, ErrorKind};

/// Zip, Unzip, Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Zip,
    Unzip,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Define the two output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    name = "bzip2",
    version,
    about = "A block-sorting file compressor",
    long_about = "
    bzip2 compresses files using the Burrows-Wheeler block sorting text compression
    algorithm, and Huffman coding. Compressed files are bit-compatible with the
    classic bzip2 program.

    If no file names are given, bzip2 compresses or decompresses from standard input
    to standard output. Short flags can be combined, so `-v -4` means the same as -v4 or -4v."
)]
pub struct Args {
    /// Files to process ("-" is standard input)
    #[clap()]
    files: Vec<String>,

    /// Force compression
    #[clap(short = 'z', long = "compress")]
    compress: bool,

    /// Force decompression
    #[clap(short = 'd', long = "decompress")]
    decompress: bool,

    /// Test compressed file integrity
    #[clap(short = 't', long = "test")]
    test: bool,

    /// Keep (don't delete) input files
    #[clap(short = 'k', long = "keep")]
    keep: bool,

    /// Overwrite existing output files
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Output to standard out
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Suppress noncritical error messages
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Be verbose (a 2nd -v gives more)
    #[clap(short = 'v', long = "verbose", parse(from_occurrences))]
    verbose: u64,

    /// Use less memory (at most 2500k)
    #[clap(short = 's', long = "small")]
    small: bool,

    /// Display software license
    #[clap(short = 'L', long = "license")]
    license: bool,

    /// Sorting effort before switching to the fallback sort (1-250, 0 means 30)
    #[clap(long = "work-factor", default_value_t = 30)]
    work_factor: u32,

    /// Alias for -1
    #[clap(long = "fast")]
    fast: bool,

    /// Alias for -9
    #[clap(long = "best")]
    best: bool,

    /// Set block size to 100k
    #[clap(short = '1', hide = true)]
    one: bool,
    #[clap(short = '2', hide = true)]
    two: bool,
    #[clap(short = '3', hide = true)]
    three: bool,
    #[clap(short = '4', hide = true)]
    four: bool,
    #[clap(short = '5', hide = true)]
    five: bool,
    #[clap(short = '6', hide = true)]
    six: bool,
    #[clap(short = '7', hide = true)]
    seven: bool,
    #[clap(short = '8', hide = true)]
    eight: bool,
    /// Set block size to 900k (-1 .. -9 pick 100k .. 900k)
    #[clap(short = '9')]
    nine: bool,
}

impl Args {
    /// The block size picked by -1 .. -9, --fast and --best. The largest one given wins.
    fn block_size(&self) -> u8 {
        let digits = [
            self.one || self.fast,
            self.two,
            self.three,
            self.four,
            self.five,
            self.six,
            self.seven,
            self.eight,
            self.nine || self.best,
        ];
        digits
            .iter()
            .rposition(|&set| set)
            .map_or(9, |i| i as u8 + 1)
    }
}

#[derive(Debug)]
pub struct BzOpts {
    /// Engine settings: block size, work factor, small mode
    pub config: Config,
    /// Vec of names of files to read for input
    pub files: Vec<String>,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Don't remove input files after processing
    pub keep_input_files: bool,
    /// Compress/Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Log level for the terminal logger
    pub verbosity: LevelFilter,
    /// Print the license and quit
    pub license: bool,
}

/// Put command line information from CLAP into our internal structure.
pub fn bzopts_init() -> Result<BzOpts, Bz2Error> {
    let program = std::env::args().next().unwrap_or_default();
    bzopts_from(Args::parse(), &program)
}

fn bzopts_from(args: Args, program: &str) -> Result<BzOpts, Bz2Error> {
    // Like the original, the name we were invoked under sets the default mode
    let invoked_as = Path::new(program)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let (mut op_mode, mut output) = match invoked_as.as_str() {
        "bunzip2" => (Mode::Unzip, Output::File),
        "bzcat" => (Mode::Unzip, Output::Stdout),
        _ => (Mode::Zip, Output::File),
    };

    if args.compress {
        op_mode = Mode::Zip
    };
    if args.decompress {
        op_mode = Mode::Unzip
    };
    if args.test {
        op_mode = Mode::Test
    };
    if args.stdout {
        output = Output::Stdout
    };

    let config = Config::new(args.block_size())?
        .with_work_factor(args.work_factor)?
        .with_small(args.small);

    // Warn is the default, each -v adds one level, -q silences everything but errors
    let verbosity = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Ok(BzOpts {
        config,
        files: args.files,
        force_overwrite: args.force,
        keep_input_files: args.keep,
        op_mode,
        output,
        verbosity,
        license: args.license,
    })
}

/// Name of the compressed file for `input`.
pub fn zipped_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".bz2");
    PathBuf::from(name)
}

/// Name of the decompressed file for `input`: strip .bz2/.bz, turn .tbz2/.tbz into .tar,
/// otherwise add .out
pub fn unzipped_name(input: &Path) -> PathBuf {
    const SUFFIXES: [(&str, &str); 4] = [(".bz2", ""), (".bz", ""), (".tbz2", ".tar"), (".tbz", ".tar")];

    let name = input.to_string_lossy();
    for (old, new) in SUFFIXES {
        if let Some(stem) = name.strip_suffix(old) {
            if !stem.is_empty() && !stem.ends_with('/') {
                return PathBuf::from(format!("{}{}", stem, new));
            }
        }
    }
    let mut name = input.as_os_str().to_owned();
    name.push(".out");
    PathBuf::from(name)
}

/// True when `input` already looks compressed, so compressing it again is skipped.
pub fn has_bz_suffix(input: &Path) -> bool {
    let name = input.to_string_lossy();
    [".bz2", ".bz", ".tbz2", ".tbz"]
        .iter()
        .any(|s| name.ends_with(s))
}

/// Deletes the output file when dropped, unless the work finished and `disarm` was called.
/// A failed or interrupted run never leaves a half written output behind.
pub struct OutputGuard {
    path: Option<PathBuf>,
}

impl OutputGuard {
    pub fn new(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
        }
    }

    pub fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Could not remove incomplete output {}: {}", path.display(), e);
            }
        }
    }
}

/// Exit code for a failure: 2 for damaged input, 1 for everything else.
pub fn exit_code(err: &Bz2Error) -> i32 {
    match err.kind() {
        ErrorKind::BadMagic
        | ErrorKind::TruncatedStream
        | ErrorKind::CorruptBlock
        | ErrorKind::MissingEndOfBlock
        | ErrorKind::CrcMismatch => 2,
        _ => 1,
    }
}

/// Official license statement for Bzip2
pub fn license() -> &'static str {
    "
   bzip2, a block-sorting file compressor.
   Copyright (C) 1996-2010 by Julian Seward; 2010-2023 by various.

   This program is free software; you can redistribute it and/or modify
   it under the terms set out in the LICENSE file, which is included
   in the bzip2 source distribution.

   This program is distributed in the hope that it will be useful,
   but WITHOUT ANY WARRANTY; without even the implied warranty of
   MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
   LICENSE file for more details."
}
