//! Variable dictionary and crop registry from the model's reference files.
//!
//! Both lookups are parsed on first use and cached for the life of the
//! [`ReferenceData`] value. A file that cannot be found or read produces an
//! empty lookup and a warning, so callers fall back to raw codes.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use log::{debug, warn};
use serde::Serialize;

use crate::{config::ReferenceConfig, io_utils};

const CODE_WIDTH: usize = 6;
const LABEL_START: usize = 7;
const DESCRIPTION_START: usize = 23;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableInfo {
    pub code: String,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropInfo {
    pub code: String,
    pub name: String,
    /// Data directory registered for the crop, when the profile lists one.
    pub directory: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ReferenceData {
    config: ReferenceConfig,
    variables: OnceLock<BTreeMap<String, VariableInfo>>,
    crops: OnceLock<BTreeMap<String, CropInfo>>,
}

impl ReferenceData {
    pub fn new(config: ReferenceConfig) -> Self {
        Self {
            config,
            variables: OnceLock::new(),
            crops: OnceLock::new(),
        }
    }

    /// Drops both caches; the next lookup re-reads the files.
    pub fn reload(&mut self) {
        self.variables = OnceLock::new();
        self.crops = OnceLock::new();
    }

    pub fn variable(&self, code: &str) -> Option<&VariableInfo> {
        self.variables().get(&lookup_key(code))
    }

    /// Short label for `code`, or `code` itself when none is known.
    pub fn label_for<'a>(&'a self, code: &'a str) -> &'a str {
        match self.variable(code) {
            Some(info) if !info.label.is_empty() => &info.label,
            _ => code,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.variables().len()
    }

    pub fn crop(&self, code: &str) -> Option<&CropInfo> {
        self.crop_map().get(&lookup_key(code))
    }

    /// All registered crops ordered by code.
    pub fn crops(&self) -> Vec<&CropInfo> {
        self.crop_map().values().collect()
    }

    fn variables(&self) -> &BTreeMap<String, VariableInfo> {
        self.variables.get_or_init(|| {
            let lines = self.load_lines(&self.config.variable_file);
            let parsed = parse_variables(&lines);
            debug!("Loaded {} variable definition(s)", parsed.len());
            parsed
        })
    }

    fn crop_map(&self) -> &BTreeMap<String, CropInfo> {
        self.crops.get_or_init(|| {
            let details = self.load_lines(&self.config.detail_file);
            let profile = self.load_lines(&self.config.profile_file);
            let names = parse_crop_names(&details);
            let directories = parse_crop_directories(&profile);
            let joined = names
                .into_iter()
                .map(|(code, name)| {
                    let directory = directories.get(&code).cloned();
                    (
                        code.clone(),
                        CropInfo {
                            code,
                            name,
                            directory,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>();
            debug!("Loaded {} crop registration(s)", joined.len());
            joined
        })
    }

    fn load_lines(&self, file_name: &str) -> Vec<String> {
        let Some(path) = self.config.locate(file_name) else {
            warn!(
                "Reference file {} not found under {:?}",
                file_name,
                self.config.resolved_search_paths()
            );
            return Vec::new();
        };
        read_or_warn(&path)
    }
}

fn read_or_warn(path: &Path) -> Vec<String> {
    match io_utils::read_lines(path) {
        Ok(lines) => lines,
        Err(err) => {
            warn!("Failed to read reference file {}: {}", path.display(), err);
            Vec::new()
        }
    }
}

fn lookup_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn is_reference_noise(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('@')
        || trimmed.starts_with('*')
        || trimmed.starts_with('!')
}

/// Fixed-width character slice, trimmed. Out-of-range bounds give "".
fn field(chars: &[char], start: usize, end: Option<usize>) -> String {
    if start >= chars.len() {
        return String::new();
    }
    let end = end.map_or(chars.len(), |end| end.min(chars.len()));
    chars[start..end].iter().collect::<String>().trim().to_string()
}

/// Parses `DATA.CDE` style records: code in characters 0..6, label in
/// 7..23, description from 23 on. The first definition of a code wins.
pub fn parse_variables(lines: &[String]) -> BTreeMap<String, VariableInfo> {
    let mut variables = BTreeMap::new();
    for line in lines.iter().filter(|line| !is_reference_noise(line)) {
        let chars = line.chars().collect::<Vec<_>>();
        let code = field(&chars, 0, Some(CODE_WIDTH));
        if code.is_empty() {
            continue;
        }
        let key = lookup_key(&code);
        variables.entry(key).or_insert_with(|| VariableInfo {
            code,
            label: field(&chars, LABEL_START, Some(DESCRIPTION_START)),
            description: field(&chars, DESCRIPTION_START, None),
        });
    }
    variables
}

/// Crop code to crop name from the `*Crop` section of `DETAIL.CDE`.
pub fn parse_crop_names(lines: &[String]) -> BTreeMap<String, String> {
    let mut names = BTreeMap::new();
    let mut in_crops = false;
    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with('*') {
            in_crops = trimmed.to_ascii_uppercase().starts_with("*CROP");
            continue;
        }
        if !in_crops || is_reference_noise(trimmed) {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        if let Some(code) = tokens.next() {
            let name = tokens.collect::<Vec<_>>().join(" ");
            names.entry(lookup_key(code)).or_insert(name);
        }
    }
    names
}

/// Crop code to data directory from `DSSATPRO` entries such as
/// `MZD    C: \DSSAT48\Maize`. Only three-letter keys ending in `D` are
/// directory entries; a bare drive token is joined to the path after it.
pub fn parse_crop_directories(lines: &[String]) -> BTreeMap<String, PathBuf> {
    let mut directories = BTreeMap::new();
    for line in lines.iter().filter(|line| !is_reference_noise(line)) {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        let Some((key, rest)) = tokens.split_first() else {
            continue;
        };
        let key = lookup_key(key);
        if key.chars().count() != 3 || !key.ends_with('D') || rest.is_empty() {
            continue;
        }
        let crop = key.chars().take(2).collect::<String>();
        let directory = match rest {
            [drive, path, ..] if drive.ends_with(':') => format!("{drive}{path}"),
            _ => rest.join(" "),
        };
        directories.entry(crop).or_insert_with(|| PathBuf::from(directory));
    }
    directories
}
