//! Channel type definitions and parsing.

use serde::{Deserialize, Serialize};

use farmhub_core::types::id::{AnimalId, FarmId, UserId};

/// Typed channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ChannelType {
    /// Farm channel — all connections currently scoped to one farm.
    Farm(FarmId),
    /// Entity channel — connections watching one specific animal.
    Animal(AnimalId),
    /// Personal user channel — direct messages to all of a user's
    /// connections.
    User(UserId),
}

impl ChannelType {
    /// Parses a channel string into a typed channel.
    pub fn parse(channel: &str) -> Option<Self> {
        let (prefix, id) = channel.split_once(':')?;
        match prefix {
            "farm" => id.parse().ok().map(ChannelType::Farm),
            "animal" => id.parse().ok().map(ChannelType::Animal),
            "user" => id.parse().ok().map(ChannelType::User),
            _ => None,
        }
    }

    /// Converts to a channel name string.
    pub fn to_channel_name(&self) -> String {
        match self {
            ChannelType::Farm(id) => format!("farm:{id}"),
            ChannelType::Animal(id) => format!("animal:{id}"),
            ChannelType::User(id) => format!("user:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let farm = ChannelType::Farm(FarmId::new());
        let name = farm.to_channel_name();
        assert_eq!(ChannelType::parse(&name), Some(farm));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(ChannelType::parse("weather:global"), None);
        assert_eq!(ChannelType::parse("farm:not-a-uuid"), None);
        assert_eq!(ChannelType::parse("noseparator"), None);
    }
}
