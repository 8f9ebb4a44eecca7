// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for phpfmt.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use phpfmt::format::{format, FormatError};
use phpfmt::printer::Options;
use phpfmt::project;

const LONG_ABOUT: &str = "Formats PHP source code in a fixed style.

With no paths, source is read from standard input and the result written
to standard output. Directory arguments are walked recursively; files
with .php and .phpt extensions are formatted. The minimum PHP version is
discovered from the nearest composer.json; files constrained below PHP
8.0 are formatted in the 7.4-compatible style.

The PHPFMT environment variable tweaks the style with comma-separated
options: base, comma (trailing commas), align (column alignment). Unset
or empty selects the standard style (comma,align).";

#[derive(Parser, Debug)]
#[command(
    name = "phpfmt",
    version,
    about = "PHP source code formatter",
    long_about = LONG_ABOUT
)]
struct Cli {
    #[arg(
        short = 'w',
        long = "write",
        help = "write result to (source) file instead of stdout"
    )]
    write: bool,
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let default_options = env_options();

    if cli.paths.is_empty() {
        if cli.write {
            fatal("cannot use -w with standard input");
        }
        let mut input = Vec::new();
        if let Err(err) = io::stdin().read_to_end(&mut input) {
            fatal(&err.to_string());
        }
        match format("<stdin>", &input, default_options) {
            Ok((output, warnings)) => {
                emit_warnings(&warnings);
                if let Err(err) = io::stdout().write_all(&output) {
                    fatal(&err.to_string());
                }
            }
            Err(err) => fatal(&err.to_string()),
        }
        return;
    }

    let mut run = Run {
        write: cli.write,
        default_options,
        version_cache: HashMap::new(),
    };
    for path in &cli.paths {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) => fatal(&format!("{}: {err}", path.display())),
        };
        let result = if meta.is_dir() {
            run.walk_dir(path)
        } else {
            run.format_file(path)
        };
        if let Err(err) = result {
            fatal(&err.to_string());
        }
    }
}

struct Run {
    write: bool,
    default_options: Options,
    version_cache: HashMap<PathBuf, i64>,
}

impl Run {
    fn walk_dir(&mut self, dir: &Path) -> Result<(), FormatError> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .collect::<io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .collect();
        entries.sort();
        for path in entries {
            if path.is_dir() {
                self.walk_dir(&path)?;
            } else {
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("php" | "phpt") => self.format_file(&path)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn format_file(&mut self, path: &Path) -> Result<(), FormatError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let version = project::min_php_version_cached(dir, &mut self.version_cache)?;
        let mut options = self.default_options;
        if version < project::TARGET_PHP_VERSION {
            options |= Options::LEGACY;
        }

        let input = fs::read(path)?;
        let filename = path.display().to_string();
        let (output, warnings) = format(&filename, &input, options)?;
        emit_warnings(&warnings);
        if self.write {
            fs::write(path, output)?;
        } else {
            io::stdout().write_all(&output)?;
        }
        Ok(())
    }
}

fn env_options() -> Options {
    let spec = env::var("PHPFMT").unwrap_or_default();
    let (options, warnings) = project::options_from_env(&spec);
    emit_warnings(&warnings);
    options
}

fn emit_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("phpfmt: WARN: {warning}");
    }
}

fn fatal(message: &str) -> ! {
    eprintln!("phpfmt: {message}");
    process::exit(1);
}
