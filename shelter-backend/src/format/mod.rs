//! Value formats for stored responses.
//!
//! A [`Format`] turns a [`StoredResponse`] into the bytes a backend keeps,
//! and back. [`JsonFormat`] is the default because persisted entries stay
//! readable when inspecting a store by hand; [`BincodeFormat`] is smaller
//! and faster for large stores.

use std::fmt::Debug;

use shelter_core::{Raw, StoredResponse};
use thiserror::Error;

mod bincode;
mod json;

pub use self::bincode::BincodeFormat;
pub use self::json::JsonFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Unique identifier for format types, used to compare format equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTypeId {
    Json,
    Bincode,
    /// For user-defined custom formats. The string should be a unique identifier.
    Custom(&'static str),
}

/// Serialization format for stored responses.
pub trait Format: Debug + Send + Sync {
    fn serialize(&self, value: &StoredResponse) -> Result<Raw, FormatError>;

    fn deserialize(&self, data: &[u8]) -> Result<StoredResponse, FormatError>;

    fn clone_box(&self) -> Box<dyn Format>;

    fn format_type_id(&self) -> FormatTypeId;
}

impl Clone for Box<dyn Format> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl Format for Box<dyn Format> {
    fn serialize(&self, value: &StoredResponse) -> Result<Raw, FormatError> {
        (**self).serialize(value)
    }

    fn deserialize(&self, data: &[u8]) -> Result<StoredResponse, FormatError> {
        (**self).deserialize(data)
    }

    fn clone_box(&self) -> Box<dyn Format> {
        (**self).clone_box()
    }

    fn format_type_id(&self) -> FormatTypeId {
        (**self).format_type_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use shelter_core::ResponseDescriptor;

    fn stored() -> StoredResponse {
        let response = ResponseDescriptor::new(StatusCode::OK)
            .with_content_type("application/javascript")
            .with_body(&b"console.log('recalls');\x00\xff"[..]);
        StoredResponse::capture(&response).unwrap()
    }

    #[test]
    fn formats_preserve_entry() {
        let formats: [Box<dyn Format>; 2] = [Box::new(JsonFormat), Box::new(BincodeFormat)];
        for format in formats {
            let raw = format.serialize(&stored()).unwrap();
            let restored = format.deserialize(&raw).unwrap();
            assert_eq!(restored.body(), stored().body(), "{format:?}");
            assert_eq!(restored.headers(), stored().headers(), "{format:?}");
        }
    }

    #[test]
    fn garbage_is_a_deserialize_error() {
        for format in [&JsonFormat as &dyn Format, &BincodeFormat] {
            assert!(matches!(
                format.deserialize(b"\x01not a response"),
                Err(FormatError::Deserialize(_))
            ));
        }
    }

    #[test]
    fn type_ids_differ() {
        assert_ne!(JsonFormat.format_type_id(), BincodeFormat.format_type_id());
    }
}
