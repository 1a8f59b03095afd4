//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]
mod cli;

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, IsTerminal, Read, Write},
    path::Path,
    process::exit,
};

use bzip2_blocksort::{compress, decompress, test, Bz2Error};
use log::{error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::cli::{bzopts_init, exit_code, BzOpts, Mode, Output, OutputGuard};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() {
    let options = match bzopts_init() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("bzip2: {}", e);
            exit(1);
        }
    };

    // Log to stderr, stdout may be carrying compressed data
    if TermLogger::init(
        options.verbosity,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("bzip2: could not start the logger");
    }

    if options.license {
        println!("{}", cli::license());
        exit(0);
    }

    info!("Operational mode set to {}, output to {}", options.op_mode, options.output);
    info!(
        "Block size {}00k, work factor {}{}",
        options.config.block_size(),
        options.config.work_factor(),
        if options.config.small() { ", small mode" } else { "" }
    );

    //----- Figure how what we need to do and go do it
    let mut code = 0;
    if options.files.is_empty() || options.files.iter().all(|f| f == "-") {
        if let Err(e) = run_stdin(&options) {
            error!("(stdin): {}", e);
            code = exit_code(&e);
        }
    } else {
        for name in options.files.iter().filter(|f| f.as_str() != "-") {
            if let Err(e) = run_file(Path::new(name), &options) {
                error!("{}: {}", name, e);
                code = code.max(exit_code(&e));
            }
        }
    }
    exit(code);
}

/// Standard input to standard output.
fn run_stdin(options: &BzOpts) -> Result<(), Bz2Error> {
    if options.op_mode == Mode::Zip && io::stdout().is_terminal() && !options.force_overwrite {
        return Err(Bz2Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "compressed data not written to a terminal (use -f to force)",
        )));
    }
    if options.op_mode == Mode::Test {
        return engine(io::stdin().lock(), io::sink(), options);
    }
    to_stdout(io::stdin().lock(), options)
}

/// Run the engine on `source`, writing to standard output.
fn to_stdout<R: Read>(source: R, options: &BzOpts) -> Result<(), Bz2Error> {
    let mut out = BufWriter::new(io::stdout().lock());
    let result = engine(source, &mut out, options);
    out.flush()?;
    result
}

/// Run the engine in the selected mode and report what it did.
fn engine<R: Read, W: Write>(source: R, sink: W, options: &BzOpts) -> Result<(), Bz2Error> {
    match options.op_mode {
        Mode::Zip => {
            let summary = compress(source, sink, &options.config)?;
            info!(
                "{} blocks, {} bytes in, {} bytes out, ratio {:.3}, crc {:#010x}",
                summary.blocks,
                summary.bytes_in,
                summary.bytes_out,
                summary.ratio(),
                summary.stream_crc
            );
        }
        Mode::Unzip => {
            let summary = decompress(source, sink, &options.config)?;
            if summary.trailing_garbage {
                warn!("trailing garbage after EOF ignored");
            }
            info!(
                "{} streams, {} blocks, {} bytes out",
                summary.streams, summary.blocks, summary.bytes_out
            );
        }
        Mode::Test => {
            let summary = test(source, &options.config)?;
            if summary.trailing_garbage {
                warn!("trailing garbage after EOF ignored");
            }
            info!("ok ({} streams, {} blocks)", summary.streams, summary.blocks);
        }
    }
    Ok(())
}

/// Process one named file.
fn run_file(path: &Path, options: &BzOpts) -> Result<(), Bz2Error> {
    if !path.is_file() {
        return Err(Bz2Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "can't open input file (missing, or not a regular file)",
        )));
    }
    let source = BufReader::new(File::open(path)?);

    if options.op_mode == Mode::Test {
        return engine(source, io::sink(), options);
    }
    if options.output == Output::Stdout {
        return to_stdout(source, options);
    }

    let target = match options.op_mode {
        Mode::Zip => {
            if cli::has_bz_suffix(path) {
                warn!("{}: input file already has a bzip2 suffix, skipped", path.display());
                return Ok(());
            }
            cli::zipped_name(path)
        }
        _ => cli::unzipped_name(path),
    };

    if target.exists() && !options.force_overwrite {
        return Err(Bz2Error::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("output file {} already exists", target.display()),
        )));
    }

    let file = File::create(&target)?;
    let mut guard = OutputGuard::new(&target);
    let mut sink = BufWriter::new(file);
    engine(source, &mut sink, options)?;
    sink.flush()?;
    guard.disarm();
    info!("{} -> {}", path.display(), target.display());

    if !options.keep_input_files {
        fs::remove_file(path)?;
    }
    Ok(())
}
