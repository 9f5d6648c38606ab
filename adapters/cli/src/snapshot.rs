use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use stackrunner_core::{LevelId, SnapshotCell};
use stackrunner_world::LevelShape;
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "stack";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "stack:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Occupied cells of a level grid together with the level they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GridSnapshot {
    /// Level the cells were captured from.
    pub level: LevelId,
    /// Occupied cells, bottom row first.
    pub cells: Vec<SnapshotCell>,
}

#[derive(Serialize, Deserialize)]
struct SerializableSnapshot {
    level: LevelId,
    cells: Vec<SnapshotCell>,
}

/// Errors that can occur while encoding or decoding snapshot strings.
#[derive(Debug, Error)]
pub(crate) enum SnapshotError {
    /// The provided string was empty or contained only whitespace.
    #[error("snapshot string was empty")]
    EmptyPayload,
    /// A header or payload segment was missing.
    #[error("snapshot string is missing the {0}")]
    MissingField(&'static str),
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("snapshot version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header dimensions disagree with the level in the payload.
    #[error("{level} is {expected_width}x{expected_height}, snapshot claims {width}x{height}")]
    DimensionMismatch {
        /// Level named in the payload.
        level: LevelId,
        /// Width of that level.
        expected_width: u32,
        /// Height of that level.
        expected_height: u32,
        /// Width in the header.
        width: u32,
        /// Height in the header.
        height: u32,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The payload could not be (de)serialised.
    #[error("could not process snapshot payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl GridSnapshot {
    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, SnapshotError> {
        let shape = LevelShape::for_level(self.level);
        let json = serde_json::to_vec(&SerializableSnapshot {
            level: self.level,
            cells: self.cells.clone(),
        })?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            shape.width(),
            shape.height()
        ))
    }

    /// Decodes a snapshot from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(SnapshotError::MissingField("prefix"))?;
        let version = parts.next().ok_or(SnapshotError::MissingField("version"))?;
        let dimensions = parts
            .next()
            .ok_or(SnapshotError::MissingField("grid dimensions"))?;
        let payload = parts.next().ok_or(SnapshotError::MissingField("payload"))?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(SnapshotError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version.to_owned()));
        }

        let (width, height) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let decoded: SerializableSnapshot = serde_json::from_slice(&bytes)?;

        let shape = LevelShape::for_level(decoded.level);
        if (shape.width(), shape.height()) != (width, height) {
            return Err(SnapshotError::DimensionMismatch {
                level: decoded.level,
                expected_width: shape.width(),
                expected_height: shape.height(),
                width,
                height,
            });
        }

        Ok(Self {
            level: decoded.level,
            cells: decoded.cells,
        })
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), SnapshotError> {
    let invalid = || SnapshotError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}
