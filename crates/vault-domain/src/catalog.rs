//! Generation-log catalog types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum length of a log title.
pub const TITLE_MAX_LEN: usize = 200;

/// How an image generation was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    #[serde(rename = "txt2img")]
    Txt2Img,
    #[serde(rename = "img2img")]
    Img2Img,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Txt2Img => "txt2img",
            Self::Img2Img => "img2img",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log type: {0}")]
pub struct UnknownLogType(pub String);

impl FromStr for LogType {
    type Err = UnknownLogType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt2img" => Ok(Self::Txt2Img),
            "img2img" => Ok(Self::Img2Img),
            other => Err(UnknownLogType(other.to_owned())),
        }
    }
}

/// Whether an attached image fed the generation or came out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Input,
    Output,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset type: {0}")]
pub struct UnknownAssetType(pub String);

impl FromStr for AssetType {
    type Err = UnknownAssetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            other => Err(UnknownAssetType(other.to_owned())),
        }
    }
}

/// Tag array on a log that the tag endpoints aggregate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Tools,
    Models,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tools => "tools",
            Self::Models => "models",
        }
    }
}

/// Split a comma-separated tag string into trimmed, non-blank tags.
///
/// Returns `None` when no tag survives, so empty lists are stored as NULL.
pub fn parse_tags(raw: Option<&str>) -> Option<Vec<String>> {
    let tags: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();
    (!tags.is_empty()).then_some(tags)
}
