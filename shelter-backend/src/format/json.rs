use bytes::Bytes;
use shelter_core::{Raw, StoredResponse};

use super::{Format, FormatError, FormatTypeId};

/// Human-readable JSON encoding, the default for every store.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn serialize(&self, value: &StoredResponse) -> Result<Raw, FormatError> {
        let encoded = serde_json::to_vec(value).map_err(|err| FormatError::Serialize(err.into()))?;
        Ok(Bytes::from(encoded))
    }

    fn deserialize(&self, data: &[u8]) -> Result<StoredResponse, FormatError> {
        serde_json::from_slice(data).map_err(|err| FormatError::Deserialize(err.into()))
    }

    fn clone_box(&self) -> Box<dyn Format> {
        Box::new(*self)
    }

    fn format_type_id(&self) -> FormatTypeId {
        FormatTypeId::Json
    }
}
