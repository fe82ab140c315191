//! Story Bundle Serialization
//!
//! MessagePack encoding of [`StoryRecords`] for caching a loaded story.

use super::records::StoryRecords;
use crate::error::CoreError;
use rmp_serde::{Deserializer, Serializer};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Encode records to MessagePack
pub fn encode_bundle(records: &StoryRecords) -> Result<Vec<u8>, CoreError> {
    Ok(rmp_serde::to_vec_named(records)?)
}

/// Decode records from MessagePack
pub fn decode_bundle(data: &[u8]) -> Result<StoryRecords, CoreError> {
    Ok(rmp_serde::from_slice(data)?)
}

/// Stream records into any writer
pub fn write_bundle<W: Write>(records: &StoryRecords, writer: W) -> Result<(), CoreError> {
    let mut serializer = Serializer::new(writer).with_struct_map();
    records.serialize(&mut serializer)?;
    Ok(())
}

/// Read records from any reader
pub fn read_bundle<R: Read>(reader: R) -> Result<StoryRecords, CoreError> {
    let mut deserializer = Deserializer::new(reader);
    Ok(StoryRecords::deserialize(&mut deserializer)?)
}
