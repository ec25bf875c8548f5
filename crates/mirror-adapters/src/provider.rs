//! The `{local, aws, gcp, oracle}` provider selector (spec §4.D).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Aws,
    Gcp,
    Oracle,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Provider::Local),
            "aws" => Ok(Provider::Aws),
            "gcp" => Ok(Provider::Gcp),
            "oracle" => Ok(Provider::Oracle),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}
