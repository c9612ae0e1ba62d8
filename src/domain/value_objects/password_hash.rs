use sha2::{Digest, Sha256};
use uuid::Uuid;

const SCHEME: &str = "sha256";
const ROUNDS: u32 = 10_000;

/// Salted, iterated SHA-256 password digest stored as `sha256$rounds$salt$hex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn generate(password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = digest(password, &salt, ROUNDS);
        Self(format!("{}${}${}${}", SCHEME, ROUNDS, salt, digest))
    }

    pub fn from_stored(stored: String) -> Self {
        Self(stored)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, password: &str) -> bool {
        let mut parts = self.0.splitn(4, '$');
        let (Some(scheme), Some(rounds), Some(salt), Some(expected)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        if scheme != SCHEME {
            return false;
        }

        let Ok(rounds) = rounds.parse::<u32>() else {
            return false;
        };

        constant_time_eq(digest(password, salt, rounds).as_bytes(), expected.as_bytes())
    }
}

impl std::fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn digest(password: &str, salt: &str, rounds: u32) -> String {
    let mut output = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();

    for _ in 1..rounds {
        output = Sha256::new()
            .chain_update(output)
            .chain_update(password.as_bytes())
            .finalize();
    }

    format!("{:x}", output)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
