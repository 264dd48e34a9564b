//! Wire model of a catalog detail payload with its appended sub-resources.
//!
//! Every field is optional and decoded leniently: a sub-field that is missing,
//! `null`, or of the wrong shape becomes `None` on its own instead of failing
//! the whole record.

use harvest_logging::harvest_warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub original_title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub budget: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub revenue: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub vote_average: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub vote_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub popularity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub original_language: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub tagline: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub genres: Option<Vec<Named>>,
    #[serde(default, deserialize_with = "lenient")]
    pub production_companies: Option<Vec<Named>>,
    #[serde(default, deserialize_with = "lenient")]
    pub production_countries: Option<Vec<Named>>,
    #[serde(default, deserialize_with = "lenient")]
    pub spoken_languages: Option<Vec<Named>>,
    #[serde(default, deserialize_with = "lenient")]
    pub belongs_to_collection: Option<Named>,

    // Enrichment sub-resources requested via `append_to_response`.
    #[serde(default, deserialize_with = "lenient")]
    pub keywords: Option<KeywordList>,
    #[serde(default, deserialize_with = "lenient")]
    pub credits: Option<Credits>,
    #[serde(default, deserialize_with = "lenient")]
    pub release_dates: Option<ReleaseDates>,
}

/// Any nested object whose display value is its `name`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Named {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

impl Named {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct KeywordList {
    #[serde(default, deserialize_with = "lenient")]
    pub keywords: Option<Vec<Named>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "lenient")]
    pub cast: Option<Vec<CastMember>>,
    #[serde(default, deserialize_with = "lenient")]
    pub crew: Option<Vec<CrewMember>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CastMember {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub gender: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CrewMember {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub gender: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub job: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ReleaseDates {
    #[serde(default, deserialize_with = "lenient")]
    pub results: Option<Vec<RegionRelease>>,
}

/// Release entries for one region, keyed by ISO 3166-1 code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RegionRelease {
    #[serde(default, deserialize_with = "lenient")]
    pub iso_3166_1: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub release_dates: Option<Vec<ReleaseEntry>>,
}

impl RegionRelease {
    pub fn new(region: &str, certifications: &[&str]) -> Self {
        Self {
            iso_3166_1: Some(region.to_string()),
            release_dates: Some(
                certifications
                    .iter()
                    .map(|cert| ReleaseEntry {
                        certification: Some(cert.to_string()),
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ReleaseEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub certification: Option<String>,
}

/// Decodes `Option<T>`, degrading a malformed value to `None` with a warning.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value::<T>(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            harvest_warn!(
                "Dropping malformed {} field: {}",
                std::any::type_name::<T>(),
                err
            );
            Ok(None)
        }
    }
}
