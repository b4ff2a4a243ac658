use ::bincode::config::standard;
use ::bincode::serde::{decode_from_slice, encode_to_vec};
use bytes::Bytes;
use shelter_core::{Raw, StoredResponse};

use super::{Format, FormatError, FormatTypeId};

/// Compact binary format backed by bincode's serde bridge.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn serialize(&self, value: &StoredResponse) -> Result<Raw, FormatError> {
        encode_to_vec(value, standard())
            .map(Bytes::from)
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<StoredResponse, FormatError> {
        decode_from_slice(data, standard())
            .map(|(value, _)| value)
            .map_err(|err| FormatError::Deserialize(Box::new(err)))
    }

    fn clone_box(&self) -> Box<dyn Format> {
        Box::new(*self)
    }

    fn format_type_id(&self) -> FormatTypeId {
        FormatTypeId::Bincode
    }
}
