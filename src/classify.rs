//! Line classification for marker-structured model files.
//!
//! Column zero carries the structure: `*` opens a section (or declares a
//! run), `@` introduces a column header, `!`/`#` are comments. Experiment and
//! treatment declarations are recognized by keyword. Readers call
//! [`classify`] on every line; the result depends only on the line itself.

use std::sync::LazyLock;

use regex::Regex;

static RUN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\*RUN\b\s*:?\s*(\d+)?").expect("run marker pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty after trimming.
    Blank,
    /// `!` or `#` comment.
    Comment,
    /// `*` line that is not a run declaration; carries the section name.
    Section(&'a str),
    /// `@` line; carries the column names.
    Header(Vec<String>),
    /// `*RUN` line with its numeric identifier when one is present.
    Run(Option<u32>),
    /// Line declaring the experiment code after its first colon.
    Experiment(Option<String>),
    /// `TREATMENT n : name ...` declaration.
    Treatment {
        number: Option<String>,
        name: Option<String>,
    },
    /// Anything else.
    Data(&'a str),
}

impl LineKind<'_> {
    /// True for lines that end the current data block.
    pub fn closes_block(&self) -> bool {
        matches!(
            self,
            LineKind::Section(_)
                | LineKind::Header(_)
                | LineKind::Run(_)
                | LineKind::Experiment(_)
                | LineKind::Treatment { .. }
        )
    }

    pub fn is_ignorable(&self) -> bool {
        matches!(self, LineKind::Blank | LineKind::Comment)
    }
}

pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('!') || trimmed.starts_with('#') {
        return LineKind::Comment;
    }
    if let Some(rest) = trimmed.strip_prefix('@') {
        return LineKind::Header(header_tokens(rest));
    }
    if let Some(captures) = RUN_MARKER.captures(trimmed) {
        let run = captures.get(1).and_then(|m| m.as_str().parse().ok());
        return LineKind::Run(run);
    }
    if trimmed.contains("EXPERIMENT")
        && let Some((_, after)) = trimmed.split_once(':')
    {
        let code = after.split_whitespace().next().map(str::to_string);
        return LineKind::Experiment(code);
    }
    if trimmed.to_ascii_uppercase().starts_with("TREATMENT") {
        return parse_treatment(trimmed);
    }
    if let Some(rest) = trimmed.strip_prefix('*') {
        return LineKind::Section(rest.trim());
    }
    LineKind::Data(line)
}

/// Column names of an `@` header, leading marker removed.
pub fn header_tokens(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}

fn parse_treatment(line: &str) -> LineKind<'_> {
    let number = line
        .split_whitespace()
        .nth(1)
        .map(|token| token.trim_matches(':').to_string())
        .filter(|token| !token.is_empty());
    let name = line
        .split_once(':')
        .map(|(_, after)| treatment_name(after))
        .filter(|name| !name.is_empty());
    LineKind::Treatment { number, name }
}

/// Text after the colon without its trailing token (the model code that the
/// simulation appends). A lone token is kept as the name.
fn treatment_name(after_colon: &str) -> String {
    let text = after_colon.trim();
    match text.rsplit_once(char::is_whitespace) {
        Some((head, _)) => head.trim_end().to_string(),
        None => text.to_string(),
    }
}
