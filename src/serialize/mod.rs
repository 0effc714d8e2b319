mod failable;

pub use failable::Failable;
use std::fmt::Display;
use std::io::{self, Read, Write};

/// Wire encoding shared by module interfaces: fixed-width little-endian
/// integers, `u32`-length-prefixed UTF-8 strings, `u32`-counted arrays,
/// single-byte discriminants for small enums.
pub trait Serialize {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError>;
}

pub trait Deserialize: Sized {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError>;
}

#[derive(Debug)]
pub enum SerializeError {
    EndOfStream,
    Io(io::Error),
    Malformed(String),
}

impl Display for SerializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializeError::EndOfStream => write!(f, "Unexpected end of stream"),
            SerializeError::Io(error) => write!(f, "{}", error),
            SerializeError::Malformed(message) => write!(f, "Malformed data: {}", message),
        }
    }
}

impl From<io::Error> for SerializeError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            SerializeError::EndOfStream
        } else {
            SerializeError::Io(error)
        }
    }
}

impl std::error::Error for SerializeError {}

pub fn to_bytes(value: &impl Serialize) -> Result<Vec<u8>, SerializeError> {
    let mut bytes = Vec::new();
    value.serialize(&mut bytes)?;
    Ok(bytes)
}

/// Deserializes a value and requires the input to be fully consumed.
pub fn from_bytes<T: Deserialize>(bytes: &[u8]) -> Result<T, SerializeError> {
    let mut reader = bytes;
    let value = T::deserialize(&mut reader)?;

    if !reader.is_empty() {
        return Err(SerializeError::Malformed(format!(
            "{} trailing byte(s) after value",
            reader.len()
        )));
    }

    Ok(value)
}

impl Serialize for u8 {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        Ok(writer.write_all(&[*self])?)
    }
}

impl Deserialize for u8 {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let mut buffer = [0u8; 1];
        reader.read_exact(&mut buffer)?;
        Ok(buffer[0])
    }
}

impl Serialize for u32 {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        Ok(writer.write_all(&self.to_le_bytes())?)
    }
}

impl Deserialize for u32 {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let mut buffer = [0u8; 4];
        reader.read_exact(&mut buffer)?;
        Ok(u32::from_le_bytes(buffer))
    }
}

impl Serialize for i32 {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        Ok(writer.write_all(&self.to_le_bytes())?)
    }
}

impl Deserialize for i32 {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let mut buffer = [0u8; 4];
        reader.read_exact(&mut buffer)?;
        Ok(i32::from_le_bytes(buffer))
    }
}

impl Serialize for bool {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        (*self as u8).serialize(writer)
    }
}

impl Deserialize for bool {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        match u8::deserialize(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SerializeError::Malformed(format!(
                "invalid boolean byte {}",
                other
            ))),
        }
    }
}

impl Serialize for String {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.as_str().serialize(writer)
    }
}

impl Serialize for str {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        let length: u32 = self
            .len()
            .try_into()
            .map_err(|_| SerializeError::Malformed("string too long".into()))?;

        length.serialize(writer)?;
        Ok(writer.write_all(self.as_bytes())?)
    }
}

impl Deserialize for String {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let length = u32::deserialize(reader)? as usize;

        let mut bytes = vec![0u8; length];
        reader.read_exact(&mut bytes)?;

        String::from_utf8(bytes)
            .map_err(|_| SerializeError::Malformed("string is not valid UTF-8".into()))
    }
}

impl<T: Serialize> Serialize for Vec<T> {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        let count: u32 = self
            .len()
            .try_into()
            .map_err(|_| SerializeError::Malformed("array too long".into()))?;

        count.serialize(writer)?;

        for element in self {
            element.serialize(writer)?;
        }

        Ok(())
    }
}

impl<T: Deserialize> Deserialize for Vec<T> {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let count = u32::deserialize(reader)? as usize;

        let mut elements = Vec::new();
        for _ in 0..count {
            elements.push(T::deserialize(reader)?);
        }

        Ok(elements)
    }
}

impl<T: Serialize> Serialize for Option<T> {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        match self {
            None => 0u8.serialize(writer),
            Some(value) => {
                1u8.serialize(writer)?;
                value.serialize(writer)
            }
        }
    }
}

impl<T: Deserialize> Deserialize for Option<T> {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        match u8::deserialize(reader)? {
            0 => Ok(None),
            1 => Ok(Some(T::deserialize(reader)?)),
            other => Err(SerializeError::Malformed(format!(
                "invalid option byte {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Serialize + Deserialize + PartialEq + std::fmt::Debug>(value: T) {
        let bytes = to_bytes(&value).unwrap();
        let back: T = from_bytes(&bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn primitives_round_trip() {
        round_trip(0u8);
        round_trip(255u8);
        round_trip(0u32);
        round_trip(u32::MAX);
        round_trip(-1i32);
        round_trip(i32::MIN);
        round_trip(true);
        round_trip(false);
    }

    #[test]
    fn strings_round_trip() {
        round_trip(String::new());
        round_trip("scope".to_string());
        round_trip("käse × scope".to_string());
    }

    #[test]
    fn containers_round_trip() {
        round_trip(vec!["a".to_string(), "b".to_string()]);
        round_trip(Vec::<u32>::new());
        round_trip(Some("key".to_string()));
        round_trip(Option::<String>::None);
        round_trip(vec![Some(7u32), None]);
    }

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(to_bytes(&0x01020304u32).unwrap(), [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn truncated_input_is_end_of_stream() {
        let bytes = to_bytes(&"requirement".to_string()).unwrap();

        for cut in 0..bytes.len() {
            match from_bytes::<String>(&bytes[..cut]) {
                Err(SerializeError::EndOfStream) => {}
                other => panic!("expected EndOfStream at {}, got {:?}", cut, other.err()),
            }
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = to_bytes(&42u32).unwrap();
        bytes.push(0);

        assert!(matches!(
            from_bytes::<u32>(&bytes),
            Err(SerializeError::Malformed(_))
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn integers_round_trip(value in any::<u32>()) {
                let bytes = to_bytes(&value).unwrap();
                prop_assert_eq!(from_bytes::<u32>(&bytes).unwrap(), value);
            }

            #[test]
            fn nested_containers_round_trip(
                value in proptest::collection::vec(any::<Option<String>>(), 0..8)
            ) {
                let bytes = to_bytes(&value).unwrap();
                prop_assert_eq!(from_bytes::<Vec<Option<String>>>(&bytes).unwrap(), value);
            }

            #[test]
            fn failable_round_trips(
                success in any::<bool>(),
                value in any::<String>(),
                messages in proptest::collection::vec(any::<String>(), 0..4),
            ) {
                let failable: Failable<String> = if success {
                    Failable::Success(value)
                } else {
                    Failable::Failure(messages)
                };

                let bytes = to_bytes(&failable).unwrap();
                prop_assert_eq!(from_bytes::<Failable<String>>(&bytes).unwrap(), failable);
            }
        }
    }
}
