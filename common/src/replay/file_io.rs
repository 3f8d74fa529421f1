use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{REPLAY_FILE_EXTENSION, REPLAY_VERSION, ReplayState};

#[derive(Debug)]
pub enum ReplayFileError {
    IoError(std::io::Error),
    EncodeError(serde_json::Error),
    DecodeError(serde_json::Error),
    UnsupportedVersion { found: u8, expected: u8 },
    EmptyFile,
    InvalidState(String),
}

impl std::fmt::Display for ReplayFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayFileError::IoError(e) => write!(f, "IO error: {}", e),
            ReplayFileError::EncodeError(e) => write!(f, "Encode error: {}", e),
            ReplayFileError::DecodeError(e) => write!(f, "Decode error: {}", e),
            ReplayFileError::UnsupportedVersion { found, expected } => {
                write!(f, "Unsupported replay version: found {}, expected {}", found, expected)
            }
            ReplayFileError::EmptyFile => write!(f, "Empty replay file"),
            ReplayFileError::InvalidState(e) => write!(f, "Invalid state: {}", e),
        }
    }
}

impl std::error::Error for ReplayFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayFileError::IoError(e) => Some(e),
            ReplayFileError::EncodeError(e) | ReplayFileError::DecodeError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReplayFileError {
    fn from(e: std::io::Error) -> Self {
        ReplayFileError::IoError(e)
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    version: u8,
    replay: &'a ReplayState,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    version: u8,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    replay: ReplayState,
}

pub fn save_replay(path: &Path, replay: &ReplayState) -> Result<(), ReplayFileError> {
    let bytes = save_replay_to_bytes(replay)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

pub fn save_replay_to_bytes(replay: &ReplayState) -> Result<Vec<u8>, ReplayFileError> {
    let envelope = EnvelopeOut {
        version: REPLAY_VERSION,
        replay,
    };
    serde_json::to_vec(&envelope).map_err(ReplayFileError::EncodeError)
}

pub fn load_replay(path: &Path) -> Result<ReplayState, ReplayFileError> {
    let mut file = std::fs::File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    load_replay_from_bytes(&buffer)
}

/// The version is read on its own first so a newer file reports
/// `UnsupportedVersion` rather than a field mismatch.
pub fn load_replay_from_bytes(bytes: &[u8]) -> Result<ReplayState, ReplayFileError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ReplayFileError::EmptyFile);
    }

    let header: EnvelopeHeader =
        serde_json::from_slice(bytes).map_err(ReplayFileError::DecodeError)?;
    if header.version != REPLAY_VERSION {
        return Err(ReplayFileError::UnsupportedVersion {
            found: header.version,
            expected: REPLAY_VERSION,
        });
    }

    let envelope: EnvelopeIn = serde_json::from_slice(bytes).map_err(ReplayFileError::DecodeError)?;
    Ok(envelope.replay)
}

pub fn generate_replay_filename(seed: i32, score: u32) -> String {
    let now = chrono::Local::now();
    let timestamp = now.format("%Y%m%d%H%M%S");

    format!("{}_SEED{}_SCORE{}.{}", timestamp, seed, score, REPLAY_FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::blockgrid::Point;
    use crate::identifiers::ShapeId;
    use crate::replay::GameMove;

    fn sample_replay() -> ReplayState {
        ReplayState {
            seed: -42,
            moves: vec![GameMove {
                shape_id: ShapeId::new(7),
                cells: vec![Point::new(0, 0), Point::new(0, 1)],
                color: 2,
                row: 3,
                col: 4,
                timestamp: 1_500,
                score: 2,
                cleared_rows: vec![],
                cleared_cols: vec![],
                cleared_boxes: vec![],
            }],
            final_score: 2,
            engine_version: "0.3.1".to_string(),
            started_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_save_load_replay_bytes() {
        let replay = sample_replay();
        let bytes = save_replay_to_bytes(&replay).unwrap();
        let loaded = load_replay_from_bytes(&bytes).unwrap();
        assert_eq!(loaded, replay);
    }

    #[test]
    fn test_envelope_layout() {
        let bytes = save_replay_to_bytes(&sample_replay()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["replay"]["seed"], -42);
        assert_eq!(value["replay"]["finalScore"], 2);
    }

    #[test]
    fn test_minimal_client_payload() {
        let json = r#"{"version":1,"replay":{"seed":5,"finalScore":0,"moves":[
            {"shapeId":0,"cells":[{"row":0,"col":0}],"color":1,"row":2,"col":2,"timestamp":10,"score":1}
        ]}}"#;
        let replay = load_replay_from_bytes(json.as_bytes()).unwrap();
        assert_eq!(replay.moves.len(), 1);
        assert!(replay.moves[0].cleared_rows.is_empty());
        assert_eq!(replay.engine_version, "");
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "gridlock_file_io_{}.{}",
            std::process::id(),
            REPLAY_FILE_EXTENSION
        ));
        let replay = sample_replay();
        save_replay(&path, &replay).unwrap();
        let loaded = load_replay(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, replay);
    }

    #[test]
    fn test_generate_replay_filename() {
        let filename = generate_replay_filename(-7, 120);
        assert!(filename.ends_with(".gridlockreplay"));
        assert!(filename.contains("SEED-7"));
        assert!(filename.contains("SCORE120"));
    }

    #[test]
    fn test_load_empty_file_error() {
        assert!(matches!(load_replay_from_bytes(&[]), Err(ReplayFileError::EmptyFile)));
        assert!(matches!(load_replay_from_bytes(b" \n"), Err(ReplayFileError::EmptyFile)));
    }

    #[test]
    fn test_load_unsupported_version_error() {
        let result = load_replay_from_bytes(br#"{"version":99,"replay":{}}"#);
        assert!(matches!(result, Err(ReplayFileError::UnsupportedVersion { found: 99, .. })));
    }

    #[test]
    fn test_load_garbage_error() {
        let result = load_replay_from_bytes(b"not json");
        assert!(matches!(result, Err(ReplayFileError::DecodeError(_))));
    }

    #[test]
    fn test_missing_file_error() {
        let result = load_replay(Path::new("/definitely/not/here.gridlockreplay"));
        assert!(matches!(result, Err(ReplayFileError::IoError(_))));
    }
}
