//! Task snapshots: serializable descriptions of the live component stack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from snapshot encoding/decoding
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot encode/decode failed: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Pixel layout of a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb565,
    Argb8888,
    Alpha8,
}

/// Metadata-only thumbnail attached to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Thumbnail {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }
}

/// Description of one task: its component stack and optional thumbnail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: u64,
    pub base_component: Option<String>,
    pub top_component: Option<String>,
    pub component_count: u32,
    pub running_count: u32,
    pub thumbnail: Option<Thumbnail>,
    pub description: Option<String>,
}

impl TaskSnapshot {
    /// Serialize for transport
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Rebuild from [`TaskSnapshot::to_bytes`] output
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TaskSnapshot {
        TaskSnapshot {
            id: 1,
            base_component: None,
            top_component: None,
            component_count: 1,
            running_count: 2,
            thumbnail: None,
            description: None,
        }
    }

    #[test]
    fn round_trip_without_thumbnail_keeps_none_fields() {
        let snapshot = sample();
        let back = TaskSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        assert_eq!(back, snapshot);
        assert!(back.base_component.is_none());
        assert!(back.thumbnail.is_none());
        assert_eq!(back.component_count, 1);
        assert_eq!(back.running_count, 2);
    }

    #[test]
    fn round_trip_preserves_thumbnail_dimensions() {
        let mut snapshot = sample();
        snapshot.thumbnail = Some(Thumbnail::new(480, 320, PixelFormat::Rgb565));

        let back = TaskSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        let thumbnail = back.thumbnail.unwrap();
        assert_eq!(thumbnail.width, 480);
        assert_eq!(thumbnail.height, 320);
        assert_eq!(thumbnail.format, PixelFormat::Rgb565);
    }

    #[test]
    fn corrupt_bytes_are_a_codec_error() {
        let err = TaskSnapshot::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Codec(_)));
    }
}
