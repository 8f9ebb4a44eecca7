// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Lexicographic ordering of top-level `use` statements.

/// Sorts contiguous runs of top-level `use` lines. Namespace separators
/// sort before identifier characters, so shorter prefixes come first; a
/// leading `\` is dropped from the statement. Group-use lines (those
/// containing `{`) and indented lines are left alone and break runs.
pub(crate) fn order_use_stmts(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut stmts: Vec<String> = Vec::new();

    fn flush(out: &mut String, stmts: &mut Vec<String>) {
        stmts.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        for stmt in stmts.drain(..) {
            out.push_str(&stmt);
        }
    }

    const USE: &str = "use ";
    for line in src.split_inclusive('\n') {
        if let Some(rest) = line.strip_prefix(USE) {
            if !line.contains('{') {
                let rest = rest.trim_start_matches('\\');
                stmts.push(format!("{USE}{rest}"));
                continue;
            }
        }
        flush(&mut out, &mut stmts);
        out.push_str(line);
    }
    flush(&mut out, &mut stmts);
    out
}

// The `;` character sorts after digits but before letters, which gives
// namespace separators the ordering we want.
fn sort_key(line: &str) -> String {
    line.replace('\\', ";")
}

#[cfg(test)]
mod tests {
    use super::order_use_stmts;

    #[test]
    fn sorts_a_contiguous_run() {
        let src = "<?php\n\nuse B\\Y;\nuse A\\X;\nuse A\\Z;\n\n$x = 1;\n";
        assert_eq!(
            order_use_stmts(src),
            "<?php\n\nuse A\\X;\nuse A\\Z;\nuse B\\Y;\n\n$x = 1;\n"
        );
    }

    #[test]
    fn shorter_prefixes_sort_first() {
        let src = "use Foo\\Bar;\nuse Foo;\nuse FooBar;\n";
        assert_eq!(
            order_use_stmts(src),
            "use Foo;\nuse Foo\\Bar;\nuse FooBar;\n"
        );
    }

    #[test]
    fn leading_backslashes_are_dropped_and_ignored_in_ordering() {
        let src = "use \\B\\Y;\nuse A\\X;\n";
        assert_eq!(order_use_stmts(src), "use A\\X;\nuse B\\Y;\n");
    }

    #[test]
    fn non_use_lines_break_runs() {
        let src = "use B;\n\nuse A;\n";
        assert_eq!(order_use_stmts(src), "use B;\n\nuse A;\n");
    }

    #[test]
    fn group_use_lines_are_not_sorted() {
        let src = "use B;\nuse A\\{X, Y};\nuse A;\n";
        assert_eq!(order_use_stmts(src), "use B;\nuse A\\{X, Y};\nuse A;\n");
    }

    #[test]
    fn indented_trait_use_is_untouched() {
        let src = "class C\n{\n\tuse B;\n\tuse A;\n}\n";
        assert_eq!(order_use_stmts(src), src);
    }
}
