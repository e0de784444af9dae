//! Test-only helpers for loading JSON fixtures bundled under `src/fixtures/`.

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::MokshaCoreError;

pub fn read_fixture(name: &str) -> std::io::Result<String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src/fixtures")
        .join(name);
    std::fs::read_to_string(path)
}

pub fn read_fixture_as<T: DeserializeOwned>(name: &str) -> Result<T, MokshaCoreError> {
    let raw = read_fixture(name).expect("fixture not found");
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenV3;

    #[test]
    fn test_read_token_fixture() -> anyhow::Result<()> {
        let token: TokenV3 = read_fixture_as("token_60.json")?;
        assert_eq!(token.total_amount(), 60);
        Ok(())
    }
}
