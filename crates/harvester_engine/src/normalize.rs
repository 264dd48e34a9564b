//! Flattens a [`RawRecord`] into one fixed-schema tabular row.

use serde::Serialize;

use crate::record::{Named, RawRecord, RegionRelease};

/// Separator placed between the display values of a nested collection.
pub const JOIN_SEPARATOR: &str = ", ";

/// Region whose certification is selected when none is configured.
pub const DEFAULT_CERTIFICATION_REGION: &str = "US";

/// One flat output row. Every nested collection is reduced to a joined string,
/// or `None` when it is absent or contributes no values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NormalizedRecord {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,
    pub overview: Option<String>,
    pub original_language: Option<String>,
    pub runtime: Option<u32>,
    pub tagline: Option<String>,
    pub genres: Option<String>,
    pub keywords: Option<String>,
    pub production_companies: Option<String>,
    pub production_countries: Option<String>,
    pub spoken_languages: Option<String>,
    pub collection: Option<String>,
    pub cast: Option<String>,
    pub cast_genders: Option<String>,
    pub crew: Option<String>,
    pub crew_jobs: Option<String>,
    pub certification: Option<String>,
}

impl NormalizedRecord {
    /// Column names in output order.
    pub const COLUMNS: [&'static str; 24] = [
        "id",
        "title",
        "original_title",
        "budget",
        "revenue",
        "release_date",
        "vote_average",
        "vote_count",
        "popularity",
        "overview",
        "original_language",
        "runtime",
        "tagline",
        "genres",
        "keywords",
        "production_companies",
        "production_countries",
        "spoken_languages",
        "collection",
        "cast",
        "cast_genders",
        "crew",
        "crew_jobs",
        "certification",
    ];

    /// Renders the record as text cells in [`Self::COLUMNS`] order.
    pub fn to_row(&self) -> Vec<Option<String>> {
        fn text<T: ToString>(value: &Option<T>) -> Option<String> {
            value.as_ref().map(ToString::to_string)
        }

        vec![
            text(&self.id),
            self.title.clone(),
            self.original_title.clone(),
            text(&self.budget),
            text(&self.revenue),
            self.release_date.clone(),
            text(&self.vote_average),
            text(&self.vote_count),
            text(&self.popularity),
            self.overview.clone(),
            self.original_language.clone(),
            text(&self.runtime),
            self.tagline.clone(),
            self.genres.clone(),
            self.keywords.clone(),
            self.production_companies.clone(),
            self.production_countries.clone(),
            self.spoken_languages.clone(),
            self.collection.clone(),
            self.cast.clone(),
            self.cast_genders.clone(),
            self.crew.clone(),
            self.crew_jobs.clone(),
            self.certification.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    certification_region: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CERTIFICATION_REGION)
    }
}

impl Normalizer {
    pub fn new(certification_region: impl Into<String>) -> Self {
        Self {
            certification_region: certification_region.into(),
        }
    }

    pub fn certification_region(&self) -> &str {
        &self.certification_region
    }

    pub fn normalize(&self, raw: RawRecord) -> NormalizedRecord {
        let certification = select_certification(
            raw.release_dates
                .as_ref()
                .and_then(|dates| dates.results.as_deref()),
            &self.certification_region,
        );
        let keywords = raw
            .keywords
            .as_ref()
            .and_then(|list| list.keywords.as_deref())
            .and_then(join_names);
        let (cast_names, cast_genders) = paired_columns(
            raw.credits
                .as_ref()
                .and_then(|c| c.cast.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|m| (m.name.as_deref(), Some(gender_code(m.gender)))),
        );
        let (crew_names, crew_jobs) = paired_columns(
            raw.credits
                .as_ref()
                .and_then(|c| c.crew.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|m| (m.name.as_deref(), m.job.clone())),
        );

        NormalizedRecord {
            genres: raw.genres.as_deref().and_then(join_names),
            keywords,
            production_companies: raw.production_companies.as_deref().and_then(join_names),
            production_countries: raw.production_countries.as_deref().and_then(join_names),
            spoken_languages: raw.spoken_languages.as_deref().and_then(join_names),
            collection: raw
                .belongs_to_collection
                .as_ref()
                .and_then(|collection| non_empty(collection.name.as_deref())),
            cast: cast_names,
            cast_genders,
            crew: crew_names,
            crew_jobs,
            certification,

            id: raw.id,
            title: raw.title,
            original_title: raw.original_title,
            budget: raw.budget,
            revenue: raw.revenue,
            release_date: raw.release_date,
            vote_average: raw.vote_average,
            vote_count: raw.vote_count,
            popularity: raw.popularity,
            overview: raw.overview,
            original_language: raw.original_language,
            runtime: raw.runtime,
            tagline: raw.tagline,
        }
    }
}

/// First entry for `region` wins; its first listed certification is used.
/// Empty certifications count as not recorded.
pub fn select_certification(entries: Option<&[RegionRelease]>, region: &str) -> Option<String> {
    let entry = entries?
        .iter()
        .find(|entry| entry.iso_3166_1.as_deref() == Some(region))?;
    let first = entry.release_dates.as_deref()?.first()?;
    non_empty(first.certification.as_deref())
}

/// Upstream code for "not specified".
const UNSPECIFIED_GENDER: u8 = 0;

fn gender_code(gender: Option<u8>) -> String {
    gender.unwrap_or(UNSPECIFIED_GENDER).to_string()
}

/// Joins a name column and its detail column from the same member list, so
/// position `i` of both columns describes the same person. Members without a
/// name are dropped from both; a missing detail becomes an empty cell. The
/// detail column is null when no member has one.
fn paired_columns<'a>(
    members: impl Iterator<Item = (Option<&'a str>, Option<String>)>,
) -> (Option<String>, Option<String>) {
    let (names, details): (Vec<&str>, Vec<String>) = members
        .filter_map(|(name, detail)| {
            let name = name.filter(|name| !name.trim().is_empty())?;
            let detail = detail.filter(|d| !d.trim().is_empty()).unwrap_or_default();
            Some((name, detail))
        })
        .unzip();
    if names.is_empty() {
        return (None, None);
    }
    let details = if details.iter().all(String::is_empty) {
        None
    } else {
        Some(details.join(JOIN_SEPARATOR))
    };
    (Some(names.join(JOIN_SEPARATOR)), details)
}

fn join_names(items: &[Named]) -> Option<String> {
    join(items.iter().map(|item| item.name.clone()))
}

fn join(values: impl Iterator<Item = Option<String>>) -> Option<String> {
    let parts: Vec<String> = values
        .flatten()
        .filter(|value| !value.trim().is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(JOIN_SEPARATOR))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(ToOwned::to_owned)
}
