//! Admin page password gate.

use sha2::{Digest, Sha256};

use crate::config::{ConfigError, ConfigResult};

/// Message shown when the password does not match.
pub const INCORRECT_PASSWORD: &str = "Incorrect password";

/// Result of a password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Show the admin content and load its data
    Unlocked,
    /// Keep the gate up, clear the input and show `message`
    Rejected { message: String },
}

/// Stateless comparison against a stored SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGate {
    digest: [u8; 32],
}

impl AdminGate {
    /// Build a gate from a hex-encoded SHA-256 digest.
    pub fn from_digest(hex_digest: &str) -> ConfigResult<Self> {
        let bytes = hex::decode(hex_digest.trim())
            .map_err(|e| ConfigError::Invalid(format!("admin digest is not hex: {}", e)))?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ConfigError::Invalid("admin digest must be 32 bytes".into()))?;
        Ok(Self { digest })
    }

    /// Build a gate from a plaintext password.
    pub fn from_password(password: &str) -> Self {
        Self {
            digest: sha256(password.as_bytes()),
        }
    }

    /// Hex digest for storing in configuration.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// Check a submitted password.
    pub fn check(&self, input: &str) -> GateOutcome {
        if sha256(input.as_bytes()) == self.digest {
            tracing::info!("admin gate unlocked");
            GateOutcome::Unlocked
        } else {
            tracing::warn!("admin gate rejected password");
            GateOutcome::Rejected {
                message: INCORRECT_PASSWORD.to_string(),
            }
        }
    }
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_password() {
        let gate = AdminGate::from_password("s3cret");
        assert_eq!(gate.check("s3cret"), GateOutcome::Unlocked);
        assert_eq!(
            gate.check("wrong"),
            GateOutcome::Rejected {
                message: "Incorrect password".into()
            }
        );
        assert!(matches!(gate.check(""), GateOutcome::Rejected { .. }));
    }

    #[test]
    fn test_digest_roundtrip() {
        let gate = AdminGate::from_password("s3cret");
        let restored = AdminGate::from_digest(&gate.digest_hex()).unwrap();
        assert_eq!(restored, gate);
        assert_eq!(restored.check("s3cret"), GateOutcome::Unlocked);
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        let gate = AdminGate::from_digest(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        )
        .unwrap();
        assert_eq!(gate.check("abc"), GateOutcome::Unlocked);
    }

    #[test]
    fn test_invalid_digest() {
        assert!(AdminGate::from_digest("zz").is_err());
        assert!(AdminGate::from_digest("abcd").is_err());
    }
}
