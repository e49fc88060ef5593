//! Text-based folding regions.
//!
//! Two heuristics run over raw lines, top to bottom:
//!
//! - runs of two or more lines opening with a prefix-declaration keyword
//! - blocks of lines indented deeper than the line that introduces them
//!
//! Lines claimed by a prefix run never start an indentation block.

const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    Prefix,
    Indentation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRegion {
    pub start_line: u32,
    pub end_line: u32,
    pub kind: FoldKind,
}

pub fn folding_regions(text: &str, prefix_keywords: &[String]) -> Vec<FoldRegion> {
    let lines = split_lines(text);
    let mut regions = Vec::new();
    let mut line = 0;

    while line < lines.len() {
        if opens_with_keyword(lines[line], prefix_keywords) {
            let mut end = line;
            while end + 1 < lines.len() && opens_with_keyword(lines[end + 1], prefix_keywords) {
                end += 1;
            }
            if end > line {
                regions.push(FoldRegion {
                    start_line: line as u32,
                    end_line: end as u32,
                    kind: FoldKind::Prefix,
                });
                line = end + 1;
                continue;
            }
        }
        if let Some(end) = indentation_block_end(&lines, line) {
            regions.push(FoldRegion {
                start_line: line as u32,
                end_line: end as u32,
                kind: FoldKind::Indentation,
            });
        }
        line += 1;
    }

    regions
}

fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(['\r', '\n']) {
        lines.push(&rest[..idx]);
        let skip = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[idx + skip..];
    }
    lines.push(rest);
    lines
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn depth(line: &str) -> usize {
    line.chars()
        .take_while(|ch| ch.is_whitespace())
        .map(|ch| if ch == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn opens_with_keyword(line: &str, keywords: &[String]) -> bool {
    let trimmed = line.trim_start();
    keywords.iter().any(|keyword| {
        let Some(head) = trimmed.get(..keyword.len()) else {
            return false;
        };
        head.eq_ignore_ascii_case(keyword)
            && trimmed[keyword.len()..]
                .chars()
                .next()
                .map_or(true, |next| !(next.is_alphanumeric() || next == '_'))
    })
}

/// Last line of the block introduced by `start`, if the next line is deeper.
fn indentation_block_end(lines: &[&str], start: usize) -> Option<usize> {
    let first = lines[start];
    let next = lines.get(start + 1)?;
    if is_blank(first) || is_blank(next) {
        return None;
    }
    let base = depth(first);
    if depth(next) <= base {
        return None;
    }
    let mut end = start + 1;
    for (idx, line) in lines.iter().enumerate().skip(start + 2) {
        if is_blank(line) {
            continue;
        }
        if depth(line) <= base {
            break;
        }
        end = idx;
    }
    Some(end)
}
