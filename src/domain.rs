use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MirtarbaseError;

static MIRTARBASE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^MIRT\d+$").unwrap());
static CANONICAL_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.0*)?$").unwrap());

/// miRTarBase interaction accession, e.g. `MIRT000002`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MirtarbaseId(String);

impl MirtarbaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MirtarbaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MirtarbaseId {
    type Err = MirtarbaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        if !MIRTARBASE_ID_RE.is_match(&normalized) {
            return Err(MirtarbaseError::InvalidIdentifier(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// NCBI Gene identifier in canonical integer form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntrezId(String);

impl EntrezId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntrezId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntrezId {
    type Err = MirtarbaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        canonical_integer(value)
            .map(Self)
            .ok_or_else(|| MirtarbaseError::InvalidIdentifier(value.to_string()))
    }
}

/// Coerces spreadsheet numbers to their integer text: `"3091.0"` becomes `"3091"`.
///
/// Returns `None` for empty or non-numeric input.
pub fn canonical_integer(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let captures = CANONICAL_INTEGER_RE.captures(trimmed)?;
    let digits = captures.get(1)?.as_str().trim_start_matches('0');
    if digits.is_empty() {
        return Some("0".to_string());
    }
    Some(digits.to_string())
}

/// Strips the `HGNC:` prefix so `HGNC:4910` and `4910` compare equal.
pub fn normalize_hgnc_id(value: &str) -> String {
    let trimmed = value.trim();
    match trimmed.split_once(':') {
        Some((prefix, rest)) if prefix.eq_ignore_ascii_case("hgnc") => rest.trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Trims a cell and maps blank values to `None`.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Identifier namespaces a graph node may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Mirtarbase,
    MirbaseMature,
    Mirbase,
    Hgnc,
    Entrez,
    Unrecognized(String),
}

impl Namespace {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "mirtarbase" | "mtb" => Namespace::Mirtarbase,
            "mirbase.mature" | "mirbase_mature" => Namespace::MirbaseMature,
            "mirbase" => Namespace::Mirbase,
            "hgnc" => Namespace::Hgnc,
            "egid" | "eg" | "entrez" | "ncbigene" => Namespace::Entrez,
            _ => Namespace::Unrecognized(value.to_string()),
        }
    }

    /// Prefix written on nodes this crate creates.
    pub fn prefix(&self) -> &str {
        match self {
            Namespace::Mirtarbase => "mirtarbase",
            Namespace::MirbaseMature => "mirbase.mature",
            Namespace::Mirbase => "mirbase",
            Namespace::Hgnc => "hgnc",
            Namespace::Entrez => "ncbigene",
            Namespace::Unrecognized(value) => value,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}
