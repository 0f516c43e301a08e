//! Site dialects: per-site vocabularies that turn a tokenized URL into a
//! canonical search record.

pub mod homes;
pub mod realtor;
pub mod redfin;
pub mod rent;
pub mod streeteasy;
pub mod zillow;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::matcher::MatchPolicy;
use crate::tokenizer::{tokenize, TokenizedUrl};
use crate::types::{SearchRecord, VerifyError, VerifyResult};

/// A site-specific URL vocabulary.
pub trait Dialect: Send + Sync {
    fn site(&self) -> Site;

    /// Parse a tokenized URL. Never fails; unknown tokens are kept raw.
    fn parse(&self, url: &TokenizedUrl) -> SearchRecord;

    /// Comparison policy used when a verifier is built without an override.
    fn default_policy(&self) -> MatchPolicy;

    /// Whether `update` should store this URL at all.
    fn accepts(&self, _url: &TokenizedUrl) -> bool {
        true
    }
}

/// Supported sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Redfin,
    Zillow,
    Realtor,
    Homes,
    Rent,
    #[serde(alias = "street_easy")]
    Streeteasy,
}

impl Site {
    pub const ALL: [Site; 6] = [
        Site::Redfin,
        Site::Zillow,
        Site::Realtor,
        Site::Homes,
        Site::Rent,
        Site::Streeteasy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Redfin => "redfin",
            Site::Zillow => "zillow",
            Site::Realtor => "realtor",
            Site::Homes => "homes",
            Site::Rent => "rent",
            Site::Streeteasy => "streeteasy",
        }
    }

    /// Registered domain for host matching.
    pub fn domain(&self) -> &'static str {
        match self {
            Site::Redfin => "redfin.com",
            Site::Zillow => "zillow.com",
            Site::Realtor => "realtor.com",
            Site::Homes => "homes.com",
            Site::Rent => "rent.com",
            Site::Streeteasy => "streeteasy.com",
        }
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            Site::Redfin => &redfin::Redfin,
            Site::Zillow => &zillow::Zillow,
            Site::Realtor => &realtor::Realtor,
            Site::Homes => &homes::Homes,
            Site::Rent => &rent::Rent,
            Site::Streeteasy => &streeteasy::StreetEasy,
        }
    }

    /// Pick the site whose domain hosts `url`.
    pub fn detect(url: &str) -> VerifyResult<Site> {
        let tokens = tokenize(url)?;
        Self::ALL
            .into_iter()
            .find(|site| tokens.host_is(site.domain()))
            .ok_or(VerifyError::UnknownSite(tokens.host))
    }

    /// Tokenize and parse `url` with this site's dialect.
    pub fn parse_url(&self, url: &str) -> VerifyResult<SearchRecord> {
        let tokens = tokenize(url)?;
        Ok(self.dialect().parse(&tokens))
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let key = key.trim_end_matches(".com");
        match key {
            "redfin" => Ok(Site::Redfin),
            "zillow" => Ok(Site::Zillow),
            "realtor" => Ok(Site::Realtor),
            "homes" => Ok(Site::Homes),
            "rent" => Ok(Site::Rent),
            "streeteasy" | "street_easy" => Ok(Site::Streeteasy),
            _ => Err(VerifyError::UnknownSite(s.to_string())),
        }
    }
}
