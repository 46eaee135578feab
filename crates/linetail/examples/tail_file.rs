//! Follows a file as it grows, printing each complete line.
//!
//! ```text
//! cargo run --example tail_file -- /var/log/syslog
//! ```
//!
//! Set `RUST_LOG=linetail=debug` to watch reads and seeks.
#![allow(missing_docs)]

use std::{env, process::ExitCode, thread, time::Duration};

use linetail::{IoSource, LineReaderOptions, LineSplitter, NextLine};

fn main() -> ExitCode {
    env_logger::init();
    let Some(path) = env::args_os().nth(1) else {
        eprintln!("usage: tail_file <path>");
        return ExitCode::FAILURE;
    };

    let source = match IoSource::open(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("cannot open {}: {err}", path.to_string_lossy());
            return ExitCode::FAILURE;
        }
    };
    let mut lines = LineSplitter::open(source, LineReaderOptions::default());

    loop {
        match lines.next_line() {
            Ok(NextLine::Ready(line)) => println!("{line}"),
            Ok(NextLine::Pending) => thread::sleep(Duration::from_millis(250)),
            Err(err) if err.is_malformed() => {
                eprintln!("skipping: {err}");
                lines.reset_decoder();
            }
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }
}
