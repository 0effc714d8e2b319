use super::{Deserialize, Serialize, SerializeError};
use std::io::{Read, Write};

/// Either a resolved value or the diagnostic messages that blocked
/// resolving it. Both arms survive serialization so a downstream module
/// can re-report why a type never resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Failable<T> {
    Success(T),
    Failure(Vec<String>),
}

impl<T> Failable<T> {
    pub fn success(&self) -> Option<&T> {
        match self {
            Failable::Success(value) => Some(value),
            Failable::Failure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Failable<U> {
        match self {
            Failable::Success(value) => Failable::Success(f(value)),
            Failable::Failure(messages) => Failable::Failure(messages),
        }
    }
}

impl<T> From<Result<T, Vec<String>>> for Failable<T> {
    fn from(result: Result<T, Vec<String>>) -> Self {
        match result {
            Ok(value) => Failable::Success(value),
            Err(messages) => Failable::Failure(messages),
        }
    }
}

impl<T: Serialize> Serialize for Failable<T> {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        match self {
            Failable::Success(value) => {
                1u8.serialize(writer)?;
                value.serialize(writer)
            }
            Failable::Failure(messages) => {
                0u8.serialize(writer)?;
                messages.serialize(writer)
            }
        }
    }
}

impl<T: Deserialize> Deserialize for Failable<T> {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        match u8::deserialize(reader)? {
            1 => Ok(Failable::Success(T::deserialize(reader)?)),
            0 => Ok(Failable::Failure(Vec::deserialize(reader)?)),
            other => Err(SerializeError::Malformed(format!(
                "invalid failable discriminant {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{from_bytes, to_bytes};

    #[test]
    fn both_arms_round_trip() {
        let success: Failable<String> = Failable::Success("UInt8".into());
        let failure: Failable<String> =
            Failable::Failure(vec!["Unable to infer type".into(), "second".into()]);

        for value in [success, failure] {
            let bytes = to_bytes(&value).unwrap();
            assert_eq!(from_bytes::<Failable<String>>(&bytes).unwrap(), value);
        }
    }
}
