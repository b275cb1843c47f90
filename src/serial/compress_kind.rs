use crate::serial::SerializationError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::borrow::Cow;

/// Payload compressor, selected per message by the envelope's one-byte tag.
///
/// Tag zero is the identity transform. Real algorithms register as further
/// variants; the payload codec already routes both directions through this
/// enum, so adding one touches no call sites.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum CompressKind {
    None = 0,
}

impl CompressKind {
    pub fn from_tag(tag: u8) -> Result<Self, SerializationError> {
        Self::try_from(tag).map_err(|_| SerializationError::UnknownCompressTag(tag))
    }

    pub fn tag(&self) -> u8 {
        (*self).into()
    }

    pub fn compress<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>, SerializationError> {
        match self {
            CompressKind::None => Ok(Cow::Borrowed(bytes)),
        }
    }

    pub fn decompress<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>, SerializationError> {
        match self {
            CompressKind::None => Ok(Cow::Borrowed(bytes)),
        }
    }
}
