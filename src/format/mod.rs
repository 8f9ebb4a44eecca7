// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The per-file formatting pipeline.

mod docfmt;
mod use_sort;

use std::fmt;
use std::io;

use crate::printer::{self, Options};
use crate::syntax::{self, SyntaxError};

/// A fatal formatting failure. Doc-comment problems are not fatal; they
/// are reported as warnings and leave the file un-doc-formatted.
#[derive(Debug)]
pub enum FormatError {
    Syntax { filename: String, err: SyntaxError },
    Encoding { filename: String },
    Io(io::Error),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Syntax { filename, err } => {
                write!(f, "{filename}:{}:{}: {}", err.line, err.column, err.message)
            }
            FormatError::Encoding { filename } => {
                write!(f, "{filename}: input is not valid UTF-8")
            }
            FormatError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<io::Error> for FormatError {
    fn from(err: io::Error) -> Self {
        FormatError::Io(err)
    }
}

/// Formats one PHP source file.
///
/// The pipeline is parse → print → `use` ordering → doc reformatting
/// (only when column alignment is on). Non-fatal problems are returned
/// as warning strings alongside the output.
pub fn format(
    filename: &str,
    src: &[u8],
    options: Options,
) -> Result<(Vec<u8>, Vec<String>), FormatError> {
    let src = std::str::from_utf8(src).map_err(|_| FormatError::Encoding {
        filename: filename.to_string(),
    })?;
    let file = syntax::parse(src, options.contains(Options::LEGACY)).map_err(|err| {
        FormatError::Syntax {
            filename: filename.to_string(),
            err,
        }
    })?;
    let (printed, mut warnings) = printer::print(&file, options);
    let mut code = use_sort::order_use_stmts(&printed);

    if options.contains(Options::ALIGN_COLUMNS) {
        match docfmt::format_docs(filename, &code) {
            Ok(with_docs) => code = with_docs,
            Err(err) => warnings.push(err.to_string()),
        }
    }
    Ok((code.into_bytes(), warnings))
}

#[cfg(test)]
mod tests {
    use super::{format, FormatError};
    use crate::printer::Options;

    fn fmt(src: &str) -> String {
        let (out, warnings) = format("<test>", src.as_bytes(), Options::STANDARD).expect("format");
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        String::from_utf8(out).expect("utf-8 output")
    }

    #[test]
    fn pipeline_sorts_use_statements() {
        assert_eq!(
            fmt("<?php\nuse B\\Y;\nuse A\\X;\nuse A\\Z;\n"),
            "<?php\n\nuse A\\X;\nuse A\\Z;\nuse B\\Y;\n"
        );
    }

    #[test]
    fn pipeline_reformats_doc_comments() {
        let out = fmt("<?php\nclass C {\n/** @var  int  $x */\npublic $x;\n}\n");
        assert!(out.contains("/** @var int $x */"), "{out}");
    }

    #[test]
    fn doc_parse_problems_are_warnings_not_errors() {
        let src = "<?php\n/** @param */\n$x = 1;\n";
        let (out, warnings) =
            format("<test>", src.as_bytes(), Options::STANDARD).expect("format");
        let out = String::from_utf8(out).expect("utf-8");
        assert!(out.contains("/** @param */"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("<test>:"), "{}", warnings[0]);
    }

    #[test]
    fn syntax_errors_carry_the_filename() {
        let err = format("bad.php", b"<?php\n$x = 'oops\n", Options::STANDARD).unwrap_err();
        let FormatError::Syntax { .. } = err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert!(err.to_string().starts_with("bad.php:"), "{err}");
    }

    #[test]
    fn invalid_utf8_is_reported_per_file() {
        let err = format("bin.php", &[0x3c, 0xff, 0xfe], Options::STANDARD).unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"));
    }
}
