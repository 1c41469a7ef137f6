//! Indentation-outline parser.
//!
//! Every non-blank, non-comment line becomes a node; a line indented deeper
//! than the one before it becomes that line's child. Brackets must balance
//! across the snippet and string literals must close on their own line.

use std::iter::Peekable;

use crate::compiler::context::BuildContext;
use crate::compiler::diagnostics::{DiagnosticCode, Glitch, Locus, TextRange};
use crate::compiler::pass::{ParserPass, PassLifecycle, SnippetVersions};
use crate::program::vst;

/// Columns a tab advances the indentation by.
const TAB_WIDTH: usize = 4;

/// Node kind of a line at the top of a snippet.
pub const DECL_KIND: &str = "decl";
/// Node kind of every nested line.
pub const STMT_KIND: &str = "stmt";

#[derive(Debug, Default)]
pub struct OutlineParser {
    snippets_parsed: usize,
}

impl OutlineParser {
    pub fn new() -> Self {
        OutlineParser::default()
    }
}

impl PassLifecycle for OutlineParser {
    fn clean_up(&mut self) {
        tracing::trace!("outline parser: {} snippet(s) so far", self.snippets_parsed);
    }
}

impl ParserPass for OutlineParser {
    fn process_snippet(
        &mut self,
        out: &mut vst::Snippet,
        text: &str,
        versions: SnippetVersions,
        build_ctx: &mut BuildContext,
    ) {
        self.snippets_parsed += 1;
        tracing::trace!(
            "parsing {} at language version {}",
            out.path,
            versions.language_version
        );

        let mut lines = Vec::new();
        for (row, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            // Columns count chars, matching the bracket checker.
            let column = raw.chars().take_while(|c| c.is_whitespace()).count();
            let range = TextRange::on_row(row as u32, column as u32, trimmed.chars().count() as u32);
            lines.push((indent_of(raw), vst::Node::new(STMT_KIND, trimmed, range)));
        }

        for (message, range) in check_balance(text) {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::SyntaxError,
                message,
                Locus::new(&out.path, range),
            ));
        }

        let mut lines = lines.into_iter().peekable();
        out.nodes = nest(&mut lines, 0);
        for node in &mut out.nodes {
            node.kind = DECL_KIND.to_string();
        }
    }
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Consume every line indented at least `min_indent`, attaching deeper
/// lines to the line above them.
fn nest<I>(lines: &mut Peekable<I>, min_indent: usize) -> Vec<vst::Node>
where
    I: Iterator<Item = (usize, vst::Node)>,
{
    let mut nodes = Vec::new();
    while let Some((indent, mut node)) = lines.next_if(|(indent, _)| *indent >= min_indent) {
        node.children = nest(lines, indent + 1);
        nodes.push(node);
    }
    nodes
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Unbalanced brackets and unterminated strings, in source order.
fn check_balance(text: &str) -> Vec<(String, TextRange)> {
    let mut problems = Vec::new();
    let mut open: Vec<(char, u32, u32)> = Vec::new();

    for (row, line) in text.lines().enumerate() {
        let row = row as u32;
        if line.trim_start().starts_with('#') {
            continue;
        }
        let mut string_start = None;
        let mut escaped = false;

        for (column, c) in line.chars().enumerate() {
            let column = column as u32;
            if string_start.is_some() {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => string_start = None,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => string_start = Some(column),
                '(' | '[' | '{' => open.push((c, row, column)),
                ')' | ']' | '}' => match open.pop() {
                    Some((opener, _, _)) if closer_for(opener) == c => {}
                    Some((opener, _, _)) => problems.push((
                        format!("mismatched `{}`; expected `{}`", c, closer_for(opener)),
                        TextRange::on_row(row, column, 1),
                    )),
                    None => problems.push((
                        format!("unexpected `{}`", c),
                        TextRange::on_row(row, column, 1),
                    )),
                },
                _ => {}
            }
        }

        if let Some(column) = string_start {
            problems.push((
                "unterminated string literal".to_string(),
                TextRange::on_row(row, column, 1),
            ));
        }
    }

    for (opener, row, column) in open {
        problems.push((
            format!("unclosed `{}`", opener),
            TextRange::on_row(row, column, 1),
        ));
    }
    problems
}
