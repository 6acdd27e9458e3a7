//! Replayable battle traces encoded as single-line transfer strings.

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tank_clash_core::{Command, Directive};

const TRACE_DOMAIN: &str = "tanks";
const TRACE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded trace payload.
pub(crate) const TRACE_HEADER: &str = "tanks:v1";
/// Delimiter used to separate the prefix, field dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Everything needed to replay a battle: the directives the world executed
/// and the policies installed as tanks spawned.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BattleTrace {
    /// Number of tile columns on the recorded field.
    pub(crate) columns: u32,
    /// Number of tile rows on the recorded field.
    pub(crate) rows: u32,
    /// Seed the battle's random streams were derived from.
    pub(crate) battle_seed: u64,
    /// Policy stand-ins, one per successful spawn, in spawn order.
    pub(crate) brains: Vec<BrainSpec>,
    /// Directives in the exact order the world executed them.
    pub(crate) directives: Vec<Directive>,
}

/// Serializable stand-in for a policy installed during the battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum BrainSpec {
    /// No policy; the tank only ran injected commands.
    Inert,
    /// Seeded wanderer.
    Wander {
        /// Seed the wanderer's dice were built from.
        seed: u64,
    },
    /// Fixed script replayed one command at a time.
    Scripted {
        /// Commands in playback order.
        script: Vec<Command>,
    },
}

impl BattleTrace {
    /// Encodes the trace into a single-line string suitable for file transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableTrace {
            battle_seed: self.battle_seed,
            brains: self.brains.clone(),
            directives: self.directives.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("battle trace serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{TRACE_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a trace from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, TraceError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TraceError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(TraceError::MissingPrefix)?;
        let version = parts.next().ok_or(TraceError::MissingVersion)?;
        let dimensions = parts.next().ok_or(TraceError::MissingDimensions)?;
        let payload = parts.next().ok_or(TraceError::MissingPayload)?;

        if domain != TRACE_DOMAIN {
            return Err(TraceError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRACE_VERSION {
            return Err(TraceError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(TraceError::InvalidEncoding)?;
        let decoded: SerializableTrace =
            serde_json::from_slice(&bytes).map_err(TraceError::InvalidPayload)?;

        let trace = Self {
            columns,
            rows,
            battle_seed: decoded.battle_seed,
            brains: decoded.brains,
            directives: decoded.directives,
        };
        trace.check_dimensions()?;
        Ok(trace)
    }

    fn check_dimensions(&self) -> Result<(), TraceError> {
        let configured = self.directives.iter().find_map(|directive| match directive {
            Directive::ConfigureBattlefield { columns, rows, .. } => Some((*columns, *rows)),
            _ => None,
        });

        match configured {
            Some(configured) if configured == (self.columns, self.rows) => Ok(()),
            Some(configured) => Err(TraceError::MismatchedDimensions {
                header: (self.columns, self.rows),
                configured,
            }),
            None => Err(TraceError::MissingConfiguration),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableTrace {
    battle_seed: u64,
    brains: Vec<BrainSpec>,
    directives: Vec<Directive>,
}

/// Errors that can occur while decoding battle trace strings.
#[derive(Debug)]
pub(crate) enum TraceError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded trace.
    MissingPrefix,
    /// The encoded trace did not contain a version segment.
    MissingVersion,
    /// The encoded trace did not include field dimensions.
    MissingDimensions,
    /// The encoded trace did not include the payload segment.
    MissingPayload,
    /// The encoded trace used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded trace used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The field dimensions could not be parsed from the encoded trace.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The header dimensions disagree with the recorded battlefield.
    MismatchedDimensions {
        /// Dimensions carried by the header segment.
        header: (u32, u32),
        /// Dimensions carried by the recorded configure directive.
        configured: (u32, u32),
    },
    /// The recorded directives never configure a battlefield.
    MissingConfiguration,
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "trace payload was empty"),
            Self::MissingPrefix => write!(f, "trace string is missing the prefix"),
            Self::MissingVersion => write!(f, "trace string is missing the version"),
            Self::MissingDimensions => write!(f, "trace string is missing the field dimensions"),
            Self::MissingPayload => write!(f, "trace string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "trace prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "trace version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse field dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode trace payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse trace payload: {error}")
            }
            Self::MismatchedDimensions { header, configured } => write!(
                f,
                "trace header says {}x{} but the recorded battlefield is {}x{}",
                header.0, header.1, configured.0, configured.1
            ),
            Self::MissingConfiguration => {
                write!(f, "trace does not configure a battlefield")
            }
        }
    }
}

impl Error for TraceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), TraceError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| TraceError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| TraceError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| TraceError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(TraceError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tank_clash_core::{Facing, TankColor, TankSeed, Tile, TileCoord, TileExtent};

    fn sample_trace() -> BattleTrace {
        BattleTrace {
            columns: 12,
            rows: 8,
            battle_seed: 77,
            brains: vec![
                BrainSpec::Wander { seed: 41 },
                BrainSpec::Scripted {
                    script: vec![Command::Forward, Command::Face(Facing::Left), Command::Shoot],
                },
            ],
            directives: vec![
                Directive::ConfigureBattlefield {
                    columns: 12,
                    rows: 8,
                    tile_extent: TileExtent::new(32.0, 32.0),
                    terrain_seed: 3,
                    blocking_tiles: vec![Tile::Water],
                },
                Directive::SpawnTank {
                    seed: TankSeed {
                        cell: TileCoord::new(1, 1),
                        facing: Facing::Right,
                        color: TankColor::Red,
                    },
                },
                Directive::SpawnTank {
                    seed: TankSeed {
                        cell: TileCoord::new(10, 6),
                        facing: Facing::Left,
                        color: TankColor::Blue,
                    },
                },
                Directive::Tick {
                    dt: Duration::from_millis(100),
                },
                Directive::Tick {
                    dt: Duration::from_millis(100),
                },
            ],
        }
    }

    #[test]
    fn round_trip_records_a_full_battle() {
        let trace = sample_trace();

        let encoded = trace.encode();
        assert!(encoded.starts_with(&format!("{TRACE_HEADER}:12x8:")));

        let decoded = BattleTrace::decode(&encoded).expect("trace decodes");
        assert_eq!(trace, decoded);
    }

    #[test]
    fn decode_rejects_empty_payloads() {
        assert!(matches!(
            BattleTrace::decode("   "),
            Err(TraceError::EmptyPayload)
        ));
    }

    #[test]
    fn decode_rejects_foreign_prefixes() {
        let mut encoded = sample_trace().encode();
        encoded.replace_range(0..5, "blitz");

        assert!(matches!(
            BattleTrace::decode(&encoded),
            Err(TraceError::InvalidPrefix(prefix)) if prefix == "blitz"
        ));
    }

    #[test]
    fn decode_rejects_unsupported_versions() {
        let encoded = sample_trace().encode().replacen(":v1:", ":v9:", 1);

        assert!(matches!(
            BattleTrace::decode(&encoded),
            Err(TraceError::UnsupportedVersion(version)) if version == "v9"
        ));
    }

    #[test]
    fn decode_rejects_malformed_dimensions() {
        let encoded = sample_trace().encode().replacen(":12x8:", ":12by8:", 1);

        assert!(matches!(
            BattleTrace::decode(&encoded),
            Err(TraceError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn decode_rejects_header_field_mismatches() {
        let mut trace = sample_trace();
        trace.columns = 30;

        let encoded = trace.encode();
        assert!(matches!(
            BattleTrace::decode(&encoded),
            Err(TraceError::MismatchedDimensions {
                header: (30, 8),
                configured: (12, 8),
            })
        ));
    }

    #[test]
    fn decode_requires_a_battlefield_configuration() {
        let mut trace = sample_trace();
        let _ = trace.directives.remove(0);

        let encoded = trace.encode();
        assert!(matches!(
            BattleTrace::decode(&encoded),
            Err(TraceError::MissingConfiguration)
        ));
    }
}
