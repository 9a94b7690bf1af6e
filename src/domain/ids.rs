//! Opaque handles
//!
//! Device and stream ids are generation-counted arena indices. At the external
//! boundary they travel as strings like `device-3-1` / `stream-0-4`; a token
//! that fails to parse simply refers to nothing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::arena::Index;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) Index);

        impl $name {
            pub(crate) fn index(&self) -> Index {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}-{}"), self.0.slot, self.0.generation)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let invalid = || format!(concat!("invalid ", $prefix, " token: {}"), s);
                let rest = s
                    .strip_prefix(concat!($prefix, "-"))
                    .ok_or_else(invalid)?;
                let (slot, generation) = rest.split_once('-').ok_or_else(invalid)?;
                Ok(Self(Index {
                    slot: slot.parse().map_err(|_| invalid())?,
                    generation: generation.parse().map_err(|_| invalid())?,
                }))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let token = String::deserialize(deserializer)?;
                token.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

opaque_id!(
    /// Handle to a device discovered by the `DeviceRegistry`
    DeviceId,
    "device"
);

opaque_id!(
    /// Handle to a stream owned by the `StreamEngine`
    StreamId,
    "stream"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let id = StreamId(Index {
            slot: 7,
            generation: 3,
        });
        assert_eq!(id.to_string(), "stream-7-3");
        assert_eq!("stream-7-3".parse::<StreamId>().unwrap(), id);
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        assert!("device-1-0".parse::<StreamId>().is_err());
        assert!("stream-1".parse::<StreamId>().is_err());
        assert!("stream-a-0".parse::<StreamId>().is_err());
        assert!("".parse::<DeviceId>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DeviceId(Index {
            slot: 0,
            generation: 0,
        });
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"device-0-0\"");
        let back: DeviceId = serde_json::from_str("\"device-0-0\"").unwrap();
        assert_eq!(back, id);
    }
}
