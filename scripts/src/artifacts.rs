//! Loading of compiled contract artifacts

use std::{fs, path::Path};

use alloy::primitives::Bytes;
use serde::Deserialize;

use crate::errors::ScriptError;

/// The bytecode field of a compilation artifact.
///
/// Hardhat emits the creation code as a plain hex string, Foundry nests it
/// under an `object` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    /// Hardhat layout: `"bytecode": "0x..."`
    Hex(String),
    /// Foundry layout: `"bytecode": { "object": "0x..." }`
    Object {
        /// The hex-encoded creation code
        object: String,
    },
}

/// The subset of a compilation artifact needed for deployment
#[derive(Deserialize)]
struct Artifact {
    /// The contract's creation code
    bytecode: ArtifactBytecode,
}

/// Parse the creation code out of a compilation artifact's JSON
pub fn parse_creation_code(artifact_json: &str) -> Result<Bytes, ScriptError> {
    let artifact: Artifact = serde_json::from_str(artifact_json)
        .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

    let hex = match artifact.bytecode {
        ArtifactBytecode::Hex(hex) => hex,
        ArtifactBytecode::Object { object } => object,
    };

    // Libraries must be linked before deployment, in which case the bytecode
    // contains `__$<hash>$__` placeholders
    if hex.contains("__") {
        return Err(ScriptError::ArtifactParsing(
            "bytecode contains unlinked library placeholders".to_string(),
        ));
    }

    let code = hex
        .parse::<Bytes>()
        .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

    if code.is_empty() {
        return Err(ScriptError::ArtifactParsing(
            "artifact has empty bytecode, is the contract abstract?".to_string(),
        ));
    }

    Ok(code)
}

/// Read the creation code from the compilation artifact at the given path
pub fn load_creation_code(path: &Path) -> Result<Bytes, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {}", path.display(), e)))?;

    parse_creation_code(&contents)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_hardhat_artifact() {
        let json = r#"{
            "_format": "hh-sol-artifact-1",
            "contractName": "PledgePost",
            "abi": [],
            "bytecode": "0x6080604052",
            "deployedBytecode": "0x6080"
        }"#;

        let code = parse_creation_code(json).unwrap();
        assert_eq!(&code[..], &[0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn test_parse_foundry_artifact() {
        let json = r#"{
            "abi": [],
            "bytecode": { "object": "0x6080604052", "linkReferences": {} }
        }"#;

        let code = parse_creation_code(json).unwrap();
        assert_eq!(code.len(), 5);
    }

    #[test]
    fn test_reject_empty_bytecode() {
        let json = r#"{ "bytecode": "0x" }"#;
        assert!(matches!(
            parse_creation_code(json),
            Err(ScriptError::ArtifactParsing(_))
        ));
    }

    #[test]
    fn test_reject_unlinked_bytecode() {
        let json = r#"{ "bytecode": "0x6080__$0123456789abcdef$__6040" }"#;
        assert!(parse_creation_code(json).is_err());
    }

    #[test]
    fn test_load_missing_artifact() {
        let res = load_creation_code(Path::new("does/not/exist.json"));
        assert!(matches!(res, Err(ScriptError::ReadFile(_))));
    }

    #[test]
    fn test_load_artifact_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bytecode": "0x00" }}"#).unwrap();

        let code = load_creation_code(file.path()).unwrap();
        assert_eq!(&code[..], &[0x00]);
    }
}
