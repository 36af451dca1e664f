// ============================================================
// Layer 3 — Decoder Topology
// ============================================================
// The system supports two ways of decoding a shell command:
//
//   flat — the decoder emits the command as a linear token
//          sequence, one token at a time
//   tree — the decoder emits a serialized command-argument
//          tree skeleton (head command, flags, arguments)
//
// The topology is chosen once at startup. An unknown topology
// string is a fatal error raised before any resource is
// allocated, so a typo on the command line fails fast.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// The decoder topology of a training or decoding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderTopology {
    /// Decode the command as a flat token sequence
    Flat,
    /// Decode the command as a serialized tree skeleton
    Tree,
}

impl FromStr for DecoderTopology {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Self::Flat),
            "tree" => Ok(Self::Tree),
            other => Err(anyhow!("Unrecognized decoder topology: '{other}'")),
        }
    }
}

impl fmt::Display for DecoderTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_known_topologies() {
        assert_eq!("flat".parse::<DecoderTopology>().unwrap(), DecoderTopology::Flat);
        assert_eq!("tree".parse::<DecoderTopology>().unwrap(), DecoderTopology::Tree);
    }

    #[test]
    fn test_unknown_topology_is_an_error() {
        let err = "basic_rnn".parse::<DecoderTopology>().unwrap_err();
        assert!(err.to_string().contains("Unrecognized decoder topology"));
    }

    #[test]
    fn test_display_round_trips() {
        for t in [DecoderTopology::Flat, DecoderTopology::Tree] {
            assert_eq!(t.to_string().parse::<DecoderTopology>().unwrap(), t);
        }
    }
}
