//! Proposal document parsing.
//!
//! A proposal is a markdown file with a YAML front matter block followed by a
//! fixed set of `##` sections. Extraction is purely structural: a missing
//! header yields an empty section, never an error. Only front matter that
//! cannot be decoded as a key/value mapping is rejected.
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Separator token that opens and closes the front matter block.
pub const FRONT_MATTER_DELIMITER: &str = "---";

pub const TITLE_KEY: &str = "Proposal Title";
pub const TAGLINE_KEY: &str = "Tagline";
pub const FUNDING_KEY: &str = "Requested Funding Amount";
pub const SKILLS_KEY: &str = "Skills";
pub const SPONSOR_KEY: &str = "Is your organization willing to sponsor this project?";
pub const EXISTING_OSS_KEY: &str = "Is this an existing OSS project?";
pub const AUTHOR_KEY: &str = "Author";
pub const PROPOSAL_ID_KEY: &str = "Proposal ID";

const DESCRIPTION_HEADER: &str = "## Project Description";
const DETAILS_HEADER: &str = "## Project Details & Specifications";
const STAGES_HEADER: &str = "## Project Stages";
const SUPPORTING_HEADER: &str = "## Supporting Information";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("front matter is not valid YAML: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    #[error("front matter must be a key/value mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("front matter field `{0}` must be a scalar or a list of scalars")]
    UnsupportedValue(String),
}

/// A single decoded front matter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

/// Front matter fields keyed by their declared name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    fields: BTreeMap<String, MetadataValue>,
}

impl Metadata {
    /// Text value for `key`; blank and null values count as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            MetadataValue::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// Values for `key` as a list; a single scalar becomes a one-item list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(MetadataValue::List(items)) => items.clone(),
            Some(MetadataValue::Text(text)) if !text.trim().is_empty() => {
                text.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Fixed body sections of a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub description: String,
    pub details: String,
    pub supporting_info: String,
}

/// Project stages in document order, keyed by their `Phase N` label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Phases {
    entries: Vec<(String, String)>,
}

impl Phases {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, text)| text.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
    }

    /// Later duplicates of a label replace the earlier text in place.
    fn insert(&mut self, label: String, text: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == label) {
            entry.1 = text;
        } else {
            self.entries.push((label, text));
        }
    }
}

impl Serialize for Phases {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, text) in &self.entries {
            map.serialize_entry(label, text)?;
        }
        map.end()
    }
}

/// A parsed proposal. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalDocument {
    pub metadata: Metadata,
    pub sections: Sections,
    pub phases: Phases,
}

impl ProposalDocument {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let content = content.replace("\r\n", "\n");
        let metadata = parse_front_matter(&content)?;
        let (sections, phases) = fetch_sections(&content);
        Ok(Self {
            metadata,
            sections,
            phases,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.text(TITLE_KEY)
    }

    pub fn tagline(&self) -> Option<&str> {
        self.metadata.text(TAGLINE_KEY)
    }

    pub fn requested_funding(&self) -> Option<&str> {
        self.metadata.text(FUNDING_KEY)
    }

    pub fn skills(&self) -> Vec<String> {
        self.metadata.list(SKILLS_KEY)
    }

    pub fn sponsor_willing(&self) -> Option<&str> {
        self.metadata.text(SPONSOR_KEY)
    }

    pub fn existing_oss(&self) -> Option<&str> {
        self.metadata.text(EXISTING_OSS_KEY)
    }

    pub fn author(&self) -> Option<&str> {
        self.metadata.text(AUTHOR_KEY)
    }

    /// Identifier assigned by an earlier submission; present in update mode.
    pub fn proposal_id(&self) -> Option<&str> {
        self.metadata.text(PROPOSAL_ID_KEY).map(str::trim)
    }
}

/// Decode the block between the first two delimiters.
///
/// Fewer than two delimiters means the document has no front matter, which is
/// reported as empty metadata rather than an error.
pub fn parse_front_matter(content: &str) -> Result<Metadata, ParseError> {
    let mut parts = content.splitn(3, FRONT_MATTER_DELIMITER);
    let (Some(_), Some(block), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
        return Ok(Metadata::default());
    };

    let value: Value = serde_yaml::from_str(block)?;
    let mapping = match value {
        Value::Null => return Ok(Metadata::default()),
        Value::Mapping(mapping) => mapping,
        Value::Bool(_) => return Err(ParseError::NotAMapping("a boolean")),
        Value::Number(_) => return Err(ParseError::NotAMapping("a number")),
        Value::String(_) => return Err(ParseError::NotAMapping("a string")),
        Value::Sequence(_) => return Err(ParseError::NotAMapping("a list")),
        Value::Tagged(_) => return Err(ParseError::NotAMapping("a tagged value")),
    };

    let mut fields = BTreeMap::new();
    for (key, value) in mapping {
        let Some(key) = scalar_text(&key) else {
            return Err(ParseError::UnsupportedValue(format!("{key:?}")));
        };
        let value = match &value {
            Value::Null => continue,
            Value::Sequence(items) => {
                let items = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| {
                        scalar_text(item).ok_or_else(|| ParseError::UnsupportedValue(key.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                MetadataValue::List(items)
            }
            other => MetadataValue::Text(
                scalar_text(other).ok_or_else(|| ParseError::UnsupportedValue(key.clone()))?,
            ),
        };
        fields.insert(key, value);
    }
    Ok(Metadata { fields })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Remove `<!-- ... -->` blocks so template guidance is never read as content.
pub fn strip_comments(content: &str) -> String {
    let comment = Regex::new(r"(?s)<!--.*?-->").expect("regex for html comments");
    comment.replace_all(content, "").into_owned()
}

fn fetch_sections(content: &str) -> (Sections, Phases) {
    let content = strip_comments(content);
    let description = section_between(&content, DESCRIPTION_HEADER, Some(DETAILS_HEADER));
    let details = section_between(&content, DETAILS_HEADER, Some(STAGES_HEADER));
    let stages = section_between(&content, STAGES_HEADER, Some(SUPPORTING_HEADER));
    let supporting_info = section_between(&content, SUPPORTING_HEADER, None);

    let sections = Sections {
        description: description.map(|text| text.trim().to_string()).unwrap_or_default(),
        details: details.map(|text| text.trim().to_string()).unwrap_or_default(),
        supporting_info: supporting_info
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
    };
    let phases = stages.map(parse_phases).unwrap_or_default();
    (sections, phases)
}

/// Text between `start` and `end` headers, or from `start` to end of input.
///
/// Both headers must sit on their own line for the section to match.
fn section_between<'a>(content: &'a str, start: &str, end: Option<&str>) -> Option<&'a str> {
    let pattern = match end {
        Some(end) => format!(
            r"(?s){}\n(.*?)\n{}",
            regex::escape(start),
            regex::escape(end)
        ),
        None => format!(r"(?s){}\n(.*)\z", regex::escape(start)),
    };
    let regex = Regex::new(&pattern).expect("regex for section headers");
    regex
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str())
}

fn parse_phases(stages: &str) -> Phases {
    let header = Regex::new(r"(?m)^### (Phase \d+)[ \t]*$").expect("regex for phase headers");
    let mut phases = Phases::default();
    let headers: Vec<_> = header.captures_iter(stages).collect();
    for (index, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let body_end = headers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(stages.len());
        let body = &stages[whole.end()..body_end];
        phases.insert(label.as_str().to_string(), body.trim().to_string());
    }
    phases
}
