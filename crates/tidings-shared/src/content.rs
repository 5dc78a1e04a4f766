//! Message payloads.
//!
//! [`MessageContent`] is a closed set of variants; every consumer matches it
//! exhaustively instead of probing for optional fields.

use serde::{Deserialize, Serialize};

use crate::constants::MAP_LINK_BASE;
use crate::error::ValidationError;

/// Kind of binary media handed to the blob store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    File,
}

impl MediaKind {
    /// Resource class the blob store files this kind under.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Image => "image",
            // the blob store treats audio as a video resource
            Self::Audio => "video",
            Self::File => "raw",
        }
    }
}

/// Payload of a chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Image {
        media_ref: String,
    },
    Audio {
        media_ref: String,
    },
    File {
        media_ref: String,
        file_name: Option<String>,
    },
    Location {
        map_ref: String,
        latitude: f64,
        longitude: f64,
    },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Wrap an uploaded media reference in the variant matching `kind`.
    pub fn media(kind: MediaKind, media_ref: String, file_name: Option<String>) -> Self {
        match kind {
            MediaKind::Image => Self::Image { media_ref },
            MediaKind::Audio => Self::Audio { media_ref },
            MediaKind::File => Self::File {
                media_ref,
                file_name,
            },
        }
    }

    pub fn location(latitude: f64, longitude: f64) -> Self {
        Self::Location {
            map_ref: format!("{MAP_LINK_BASE}{latitude},{longitude}"),
            latitude,
            longitude,
        }
    }

    /// Stable tag stored alongside the record.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Audio { .. } => "audio",
            Self::File { .. } => "file",
            Self::Location { .. } => "location",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// Reject payloads that must never reach the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Text { text } if text.trim().is_empty() => Err(ValidationError::EmptyContent),
            Self::Text { .. } => Ok(()),
            Self::Image { media_ref } | Self::Audio { media_ref } | Self::File { media_ref, .. }
                if media_ref.is_empty() =>
            {
                Err(ValidationError::MissingMediaRef)
            }
            Self::Image { .. } | Self::Audio { .. } | Self::File { .. } => Ok(()),
            Self::Location {
                latitude,
                longitude,
                ..
            } => {
                if (-90.0..=90.0).contains(latitude) && (-180.0..=180.0).contains(longitude) {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidCoordinates)
                }
            }
        }
    }

    /// One-line summary used for the chat preview and notification body.
    pub fn preview(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Image { .. } => "Photo".to_string(),
            Self::Audio { .. } => "Voice message".to_string(),
            Self::File { file_name, .. } => {
                format!("File: {}", file_name.as_deref().unwrap_or("file"))
            }
            Self::Location { .. } => "Location".to_string(),
        }
    }
}
