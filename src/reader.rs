//! Delimited corpus files: one document per line as `id label text`.
//!
//! Fields are separated by whitespace and/or commas. The first two fields are
//! kept as instance metadata, everything after them is the document text.

use std::io::{self, BufRead};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::instance::InstanceList;

const LINE_PATTERN: &str = r"^(\S*)[\s,]*(\S*)[\s,]*(.*)$";

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| Regex::new(LINE_PATTERN).expect("line pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub name: &'a str,
    pub label: &'a str,
    pub text: &'a str,
}

/// Splits one line into its three fields. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Record<'_>> {
    if line.trim().is_empty() {
        return None;
    }
    let caps = line_regex().captures(line)?;
    let field = |idx| caps.get(idx).map_or("", |m| m.as_str());
    Some(Record {
        name: field(1),
        label: field(2),
        text: field(3),
    })
}

/// Feeds every record of `reader` through the pipeline of `instances`.
///
/// Returns the number of instances added. Invalid UTF-8 is reported as an
/// `InvalidData` error.
pub fn read_delimited<R: BufRead>(reader: R, instances: &mut InstanceList) -> io::Result<usize> {
    let mut added = 0;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Some(record) => {
                instances.add_thru_pipe(record.name, record.label, record.text);
                added += 1;
            }
            None => debug!(line = lineno + 1, "Skipping blank line"),
        }
    }
    Ok(added)
}
