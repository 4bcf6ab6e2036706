//! Market input (input.json) loading and validation.

use std::path::Path;

use serde::Deserialize;
use varopt::{CovarianceMatrix, ReturnVector, check_dimensions};

use crate::error::{Error, Result};

/// Expected returns and covariance for one allocation run.
///
/// Shape checks on the vector and matrix themselves (finite, square,
/// symmetric) happen during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketInput {
    #[serde(default)]
    pub assets: Option<Vec<String>>,
    pub returns: ReturnVector,
    pub covariance: CovarianceMatrix,
}

impl MarketInput {
    /// Load and validate an input.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::InputRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let input: MarketInput = serde_json::from_str(json)?;
        input.validate()?;
        Ok(input)
    }

    fn validate(&self) -> Result<()> {
        check_dimensions(&self.returns, &self.covariance)?;

        if let Some(assets) = &self.assets {
            if assets.len() != self.returns.len() {
                return Err(Error::Input(format!(
                    "{} asset names for {} returns",
                    assets.len(),
                    self.returns.len()
                )));
            }
            let mut seen = std::collections::HashSet::new();
            for name in assets {
                if name.is_empty() {
                    return Err(Error::Input("empty asset name".into()));
                }
                if !seen.insert(name) {
                    return Err(Error::Input(format!("duplicate asset: {name}")));
                }
            }
        }
        Ok(())
    }

    pub fn num_assets(&self) -> usize {
        self.returns.len()
    }

    /// Asset labels: the given names, or `asset_0`, `asset_1`, ...
    pub fn asset_names(&self) -> Vec<String> {
        match &self.assets {
            Some(names) => names.clone(),
            None => (0..self.num_assets()).map(|i| format!("asset_{i}")).collect(),
        }
    }
}

/// Parse a comma-separated weight list such as `0.4,0.4,0.2`.
pub fn parse_weights(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|_| Error::Input(format!("invalid weight '{part}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> &'static str {
        r#"{
            "assets": ["AAPL", "MSFT", "SPY"],
            "returns": [0.01, 0.02, 0.015],
            "covariance": [
                [0.0001, 0.00002, 0.00001],
                [0.00002, 0.00015, 0.00003],
                [0.00001, 0.00003, 0.00012]
            ]
        }"#
    }

    #[test]
    fn parse_valid_input() {
        let input = MarketInput::from_json(valid_json()).unwrap();
        assert_eq!(input.num_assets(), 3);
        assert_eq!(input.asset_names(), vec!["AAPL", "MSFT", "SPY"]);
        assert_eq!(input.returns.as_slice()[1], 0.02);
    }

    #[test]
    fn names_default_when_absent() {
        let input = MarketInput::from_json(
            r#"{ "returns": [0.01, 0.02], "covariance": [[0.0001, 0.0], [0.0, 0.0002]] }"#,
        )
        .unwrap();
        assert_eq!(input.asset_names(), vec!["asset_0", "asset_1"]);
    }

    #[test]
    fn reject_dimension_mismatch() {
        let err = MarketInput::from_json(
            r#"{ "returns": [0.01, 0.02, 0.03], "covariance": [[0.0001, 0.0], [0.0, 0.0002]] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Optimize(varopt::Error::InvalidInput(_))));
    }

    #[test]
    fn reject_asymmetric_covariance() {
        let err = MarketInput::from_json(
            r#"{ "returns": [0.01, 0.02], "covariance": [[0.0001, 0.5], [0.0, 0.0002]] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InputParse(_)));
    }

    #[test]
    fn reject_duplicate_assets() {
        let json = valid_json().replace("\"SPY\"", "\"AAPL\"");
        assert!(matches!(MarketInput::from_json(&json), Err(Error::Input(_))));
    }

    #[test]
    fn reject_name_count_mismatch() {
        let json = valid_json().replace(", \"SPY\"", "");
        assert!(matches!(MarketInput::from_json(&json), Err(Error::Input(_))));
    }

    #[test]
    fn weights_parse() {
        assert_eq!(parse_weights("0.4, 0.4,0.2").unwrap(), vec![0.4, 0.4, 0.2]);
        assert!(parse_weights("0.4,abc").is_err());
        assert!(parse_weights("").is_err());
    }
}
