use harvester_engine::{
    select_certification, CastMember, Credits, CrewMember, NormalizedRecord, Normalizer, RawRecord,
    RegionRelease,
};
use pretty_assertions::assert_eq;

fn parse(json: &str) -> RawRecord {
    serde_json::from_str(json).expect("record json")
}

#[test]
fn full_payload_flattens_into_every_column() {
    let raw = parse(
        r#"{
            "id": 11,
            "title": "Star Wars",
            "original_title": "Star Wars",
            "budget": 11000000,
            "revenue": 775398007,
            "release_date": "1977-05-25",
            "vote_average": 8.2,
            "vote_count": 19000,
            "popularity": 72.1,
            "overview": "Princess Leia is captured.",
            "original_language": "en",
            "runtime": 121,
            "tagline": "A long time ago in a galaxy far, far away...",
            "genres": [{"name": "Adventure"}, {"name": "Action"}],
            "production_companies": [{"name": "Lucasfilm Ltd."}],
            "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}],
            "spoken_languages": [{"iso_639_1": "en", "name": "English"}],
            "belongs_to_collection": {"id": 10, "name": "Star Wars Collection"},
            "keywords": {"keywords": [{"name": "rebellion"}, {"name": "space opera"}]},
            "credits": {
                "cast": [{"name": "Mark Hamill", "gender": 2}, {"name": "Carrie Fisher", "gender": 1}],
                "crew": [{"name": "George Lucas", "gender": 2, "job": "Director"},
                         {"name": "John Williams", "gender": 2, "job": "Original Music Composer"}]
            },
            "release_dates": {"results": [
                {"iso_3166_1": "GB", "release_dates": [{"certification": "U"}]},
                {"iso_3166_1": "US", "release_dates": [{"certification": "PG"}]}
            ]}
        }"#,
    );

    let row = Normalizer::default().normalize(raw);

    assert_eq!(
        row,
        NormalizedRecord {
            id: Some(11),
            title: Some("Star Wars".into()),
            original_title: Some("Star Wars".into()),
            budget: Some(11_000_000),
            revenue: Some(775_398_007),
            release_date: Some("1977-05-25".into()),
            vote_average: Some(8.2),
            vote_count: Some(19_000),
            popularity: Some(72.1),
            overview: Some("Princess Leia is captured.".into()),
            original_language: Some("en".into()),
            runtime: Some(121),
            tagline: Some("A long time ago in a galaxy far, far away...".into()),
            genres: Some("Adventure, Action".into()),
            keywords: Some("rebellion, space opera".into()),
            production_companies: Some("Lucasfilm Ltd.".into()),
            production_countries: Some("United States of America".into()),
            spoken_languages: Some("English".into()),
            collection: Some("Star Wars Collection".into()),
            cast: Some("Mark Hamill, Carrie Fisher".into()),
            cast_genders: Some("2, 1".into()),
            crew: Some("George Lucas, John Williams".into()),
            crew_jobs: Some("Director, Original Music Composer".into()),
            certification: Some("PG".into()),
        }
    );
}

#[test]
fn empty_collections_become_null() {
    let raw = parse(
        r#"{
            "id": 5,
            "title": "Four Rooms",
            "genres": [],
            "keywords": {"keywords": []},
            "credits": {"cast": [], "crew": []},
            "release_dates": {"results": []},
            "belongs_to_collection": null
        }"#,
    );

    let row = Normalizer::default().normalize(raw);

    assert_eq!(row.title.as_deref(), Some("Four Rooms"));
    assert_eq!(row.genres, None);
    assert_eq!(row.keywords, None);
    assert_eq!(row.cast, None);
    assert_eq!(row.cast_genders, None);
    assert_eq!(row.crew, None);
    assert_eq!(row.crew_jobs, None);
    assert_eq!(row.certification, None);
    assert_eq!(row.collection, None);
}

#[test]
fn first_us_entry_wins_certification() {
    let entries = vec![
        RegionRelease::new("FR", &["12"]),
        RegionRelease::new("US", &["PG-13"]),
        RegionRelease::new("US", &["R"]),
    ];
    assert_eq!(
        select_certification(Some(&entries), "US").as_deref(),
        Some("PG-13")
    );
}

#[test]
fn first_certification_within_the_region_entry_is_used() {
    let entries = vec![RegionRelease::new("US", &["R", "NC-17"])];
    assert_eq!(select_certification(Some(&entries), "US").as_deref(), Some("R"));
}

#[test]
fn missing_region_or_blank_certification_is_null() {
    let only_fr = vec![RegionRelease::new("FR", &["12"])];
    assert_eq!(select_certification(Some(&only_fr), "US"), None);

    let blank = vec![RegionRelease::new("US", &[""]), RegionRelease::new("US", &["R"])];
    assert_eq!(select_certification(Some(&blank), "US"), None);

    assert_eq!(select_certification(None, "US"), None);
}

#[test]
fn configured_region_selects_its_own_entry() {
    let raw = RawRecord {
        id: Some(1),
        release_dates: Some(harvester_engine::ReleaseDates {
            results: Some(vec![
                RegionRelease::new("US", &["PG"]),
                RegionRelease::new("DE", &["12"]),
            ]),
        }),
        ..RawRecord::default()
    };
    let row = Normalizer::new("DE").normalize(raw);
    assert_eq!(row.certification.as_deref(), Some("12"));
}

fn cells(column: &Option<String>) -> Vec<&str> {
    column
        .as_deref()
        .map(|text| text.split(", ").collect())
        .unwrap_or_default()
}

#[test]
fn cast_columns_stay_aligned_when_gender_is_missing() {
    let raw = RawRecord {
        credits: Some(Credits {
            cast: Some(vec![
                CastMember {
                    name: Some("A".into()),
                    gender: Some(1),
                },
                CastMember {
                    name: Some("B".into()),
                    gender: None,
                },
                CastMember {
                    name: None,
                    gender: Some(2),
                },
                CastMember {
                    name: Some("D".into()),
                    gender: Some(2),
                },
            ]),
            crew: None,
        }),
        ..RawRecord::default()
    };
    let row = Normalizer::default().normalize(raw);
    assert_eq!(row.cast.as_deref(), Some("A, B, D"));
    assert_eq!(row.cast_genders.as_deref(), Some("1, 0, 2"));
    assert_eq!(cells(&row.cast).len(), cells(&row.cast_genders).len());
    assert_eq!(row.crew, None);
    assert_eq!(row.crew_jobs, None);
}

#[test]
fn crew_columns_stay_aligned_when_job_is_missing() {
    let raw = RawRecord {
        credits: Some(Credits {
            cast: None,
            crew: Some(vec![
                CrewMember {
                    name: Some("Ann".into()),
                    gender: Some(1),
                    job: None,
                },
                CrewMember {
                    name: Some("Bob".into()),
                    gender: None,
                    job: Some("Director".into()),
                },
                CrewMember {
                    name: Some(" ".into()),
                    gender: None,
                    job: Some("Writer".into()),
                },
            ]),
        }),
        ..RawRecord::default()
    };
    let row = Normalizer::default().normalize(raw);
    assert_eq!(row.crew.as_deref(), Some("Ann, Bob"));
    assert_eq!(row.crew_jobs.as_deref(), Some(", Director"));
    assert_eq!(cells(&row.crew), vec!["Ann", "Bob"]);
    assert_eq!(cells(&row.crew_jobs), vec!["", "Director"]);
}

#[test]
fn crew_without_any_job_has_null_jobs_column() {
    let raw = RawRecord {
        credits: Some(Credits {
            cast: None,
            crew: Some(vec![CrewMember {
                name: Some("Solo".into()),
                gender: Some(2),
                job: None,
            }]),
        }),
        ..RawRecord::default()
    };
    let row = Normalizer::default().normalize(raw);
    assert_eq!(row.crew.as_deref(), Some("Solo"));
    assert_eq!(row.crew_jobs, None);
}

#[test]
fn malformed_sub_field_degrades_only_that_column() {
    let raw = parse(
        r#"{
            "id": 42,
            "title": "Partial",
            "genres": {"name": "not a list"},
            "release_dates": "oops",
            "credits": {"cast": [{"name": "Someone", "gender": 0}]}
        }"#,
    );

    let row = Normalizer::default().normalize(raw);

    assert_eq!(row.id, Some(42));
    assert_eq!(row.title.as_deref(), Some("Partial"));
    assert_eq!(row.genres, None);
    assert_eq!(row.certification, None);
    assert_eq!(row.cast.as_deref(), Some("Someone"));
    assert_eq!(row.cast_genders.as_deref(), Some("0"));
}

#[test]
fn scalar_text_passes_through_untouched() {
    let raw = parse(r#"{"id": 3, "overview": "  spaced,\ttabbed\n", "tagline": ""}"#);
    let row = Normalizer::default().normalize(raw);
    assert_eq!(row.overview.as_deref(), Some("  spaced,\ttabbed\n"));
    assert_eq!(row.tagline.as_deref(), Some(""));
}

#[test]
fn json_form_keeps_null_columns() {
    let row = Normalizer::default().normalize(parse(r#"{"id": 1}"#));
    let value = serde_json::to_value(&row).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), NormalizedRecord::COLUMNS.len());
    for column in NormalizedRecord::COLUMNS {
        assert!(object.contains_key(column), "missing column {column}");
    }
    assert!(object["title"].is_null());
    assert_eq!(object["id"], serde_json::json!(1));
}
