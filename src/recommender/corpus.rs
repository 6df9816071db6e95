//! Place corpus and its embedding matrix.
//!
//! Row *i* of the embedding matrix describes the place at row *i* of the place
//! table. [`Corpus::new`] is the only constructor and refuses any pair that
//! would break that correspondence.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use super::normalize::normalize_tags;
use crate::models::{Place, Season, UnknownSeason};

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("failed to read corpus file: {0}")]
    Csv(#[from] csv::Error),

    #[error("corpus contains no places")]
    Empty,

    #[error("{places} places but {embeddings} embedding rows")]
    RowCountMismatch { places: usize, embeddings: usize },

    #[error("embedding row {row} has {actual} components, expected {expected}")]
    RaggedEmbedding {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("embedding rows are empty")]
    ZeroDimension,

    #[error("embedding row {row}, column {column}: '{value}' is not a finite number")]
    InvalidNumber {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("place id {0} appears more than once")]
    DuplicateId(i64),

    #[error("place {id}: {source}")]
    InvalidSeason {
        id: i64,
        #[source]
        source: UnknownSeason,
    },
}

/// Immutable place table plus the matching embedding matrix
#[derive(Debug, Clone)]
pub struct Corpus {
    places: Vec<Place>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
    /// Place id to row
    rows: HashMap<i64, usize>,
}

/// One row of the places CSV
#[derive(Debug, Deserialize)]
struct PlaceRecord {
    travel_id: i64,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    season: String,
    #[serde(default)]
    nature_tags: String,
    #[serde(default)]
    vibe_tags: String,
    #[serde(default)]
    target_tags: String,
}

impl PlaceRecord {
    fn into_place(self) -> Result<Place, CorpusError> {
        let season = Season::parse_optional(&self.season).map_err(|source| {
            CorpusError::InvalidSeason {
                id: self.travel_id,
                source,
            }
        })?;

        Ok(Place {
            id: self.travel_id,
            name: self.name.trim().to_string(),
            description: self.description,
            season,
            nature_tags: split_tag_cell(&self.nature_tags),
            vibe_tags: split_tag_cell(&self.vibe_tags),
            target_tags: split_tag_cell(&self.target_tags),
        })
    }
}

/// Tag cells hold lists separated by `,` or `|`
fn split_tag_cell(cell: &str) -> Vec<String> {
    normalize_tags(cell.split([',', '|']))
}

impl Corpus {
    /// Pairs places with their embeddings after checking the row invariant
    pub fn new(places: Vec<Place>, embeddings: Vec<Vec<f32>>) -> Result<Self, CorpusError> {
        if places.is_empty() {
            return Err(CorpusError::Empty);
        }
        if places.len() != embeddings.len() {
            return Err(CorpusError::RowCountMismatch {
                places: places.len(),
                embeddings: embeddings.len(),
            });
        }

        let dimension = embeddings[0].len();
        if dimension == 0 {
            return Err(CorpusError::ZeroDimension);
        }
        if let Some((row, emb)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, emb)| emb.len() != dimension)
        {
            return Err(CorpusError::RaggedEmbedding {
                row,
                expected: dimension,
                actual: emb.len(),
            });
        }

        let mut rows = HashMap::with_capacity(places.len());
        for (row, place) in places.iter().enumerate() {
            if rows.insert(place.id, row).is_some() {
                return Err(CorpusError::DuplicateId(place.id));
            }
        }

        Ok(Self {
            places,
            embeddings,
            dimension,
            rows,
        })
    }

    /// Loads the places CSV and the embeddings CSV from disk
    pub fn load(places_path: &Path, embeddings_path: &Path) -> Result<Self, CorpusError> {
        let places = read_places(csv::Reader::from_path(places_path)?)?;
        let embeddings = read_embeddings(
            csv::ReaderBuilder::new()
                .has_headers(false)
                .from_path(embeddings_path)?,
        )?;
        Self::new(places, embeddings)
    }

    /// Same as [`Corpus::load`] but from in-memory readers
    pub fn from_readers<P: Read, E: Read>(places: P, embeddings: E) -> Result<Self, CorpusError> {
        let places = read_places(csv::Reader::from_reader(places))?;
        let embeddings = read_embeddings(
            csv::ReaderBuilder::new()
                .has_headers(false)
                .from_reader(embeddings),
        )?;
        Self::new(places, embeddings)
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn place(&self, id: i64) -> Option<&Place> {
        self.rows.get(&id).map(|&row| &self.places[row])
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Reads only the place table, e.g. to compute its embeddings
pub fn load_places(path: &Path) -> Result<Vec<Place>, CorpusError> {
    let places = read_places(csv::Reader::from_path(path)?)?;
    if places.is_empty() {
        return Err(CorpusError::Empty);
    }
    Ok(places)
}

/// Writes an embedding matrix in the headerless format [`Corpus::load`] reads
pub fn write_embeddings<W: Write>(writer: W, rows: &[Vec<f32>]) -> Result<(), CorpusError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn read_places<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Place>, CorpusError> {
    reader
        .deserialize::<PlaceRecord>()
        .map(|record| record?.into_place())
        .collect()
}

fn read_embeddings<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Vec<f32>>, CorpusError> {
    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .enumerate()
            .map(|(column, field)| {
                field
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| CorpusError::InvalidNumber {
                        row,
                        column,
                        value: field.to_string(),
                    })
            })
            .collect::<Result<Vec<f32>, _>>()?;
        rows.push(values);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACES: &str = "\
travel_id,name,description,season,nature_tags,vibe_tags,target_tags
101,Gyeongpo Beach,Wide sandy beach,summer,\"#Beach, sea\",healing|quiet,family
102,Seoraksan,Granite peaks,가을,mountain|forest|Mountain,,couple|friends
103,Nami Island,,,,,
";

    const EMBEDDINGS: &str = "0.1,0.2,0.3\n0.0,1.0,0.0\n-0.5,0.5,0.0\n";

    #[test]
    fn test_written_embeddings_load_back() {
        let rows = vec![vec![0.25, -1.0, 0.5], vec![0.0, 1.0, 0.125], vec![1.0, 0.0, 0.0]];
        let mut buf = Vec::new();
        write_embeddings(&mut buf, &rows).unwrap();

        let corpus = Corpus::from_readers(PLACES.as_bytes(), buf.as_slice()).unwrap();
        assert_eq!(corpus.embeddings(), rows.as_slice());
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let places_path = dir.path().join("places.csv");
        let embeddings_path = dir.path().join("place_embeddings.csv");
        std::fs::write(&places_path, PLACES).unwrap();
        std::fs::write(&embeddings_path, EMBEDDINGS).unwrap();

        let corpus = Corpus::load(&places_path, &embeddings_path).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(load_places(&places_path).unwrap().len(), 3);
        assert!(matches!(
            Corpus::load(&places_path, &dir.path().join("missing.csv")),
            Err(CorpusError::Csv(_))
        ));
    }

    #[test]
    fn test_loads_places_with_normalized_tags() {
        let corpus = Corpus::from_readers(PLACES.as_bytes(), EMBEDDINGS.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.dimension(), 3);

        let beach = &corpus.places()[0];
        assert_eq!(beach.id, 101);
        assert_eq!(beach.season, Some(Season::Summer));
        assert_eq!(beach.nature_tags, vec!["beach", "sea"]);
        assert_eq!(beach.vibe_tags, vec!["healing", "quiet"]);

        let mountain = &corpus.places()[1];
        assert_eq!(mountain.season, Some(Season::Autumn));
        assert_eq!(mountain.nature_tags, vec!["mountain", "forest"]);
        assert!(mountain.vibe_tags.is_empty());

        let island = &corpus.places()[2];
        assert_eq!(island.season, None);
        assert!(island.target_tags.is_empty());
    }

    #[test]
    fn test_embedding_rows_follow_place_rows() {
        let corpus = Corpus::from_readers(PLACES.as_bytes(), EMBEDDINGS.as_bytes()).unwrap();
        assert_eq!(corpus.embeddings()[1], vec![0.0, 1.0, 0.0]);
        assert_eq!(corpus.place(102).unwrap().name, "Seoraksan");
        assert!(corpus.place(999).is_none());
    }

    #[test]
    fn test_row_count_mismatch_is_rejected() {
        let err = Corpus::from_readers(PLACES.as_bytes(), "0.1,0.2,0.3\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::RowCountMismatch {
                places: 3,
                embeddings: 1
            }
        ));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = Corpus::from_readers(
            PLACES.as_bytes(),
            "0.1,0.2,0.3\n0.0,abc,0.0\n1,1,1\n".as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, CorpusError::InvalidNumber { row: 1, column: 1, .. }));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = Corpus::new(
            vec![place(1), place(2)],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CorpusError::RaggedEmbedding {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = Corpus::new(vec![place(1), place(1)], vec![vec![1.0], vec![0.5]]).unwrap_err();
        assert!(matches!(err, CorpusError::DuplicateId(1)));
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        assert!(matches!(Corpus::new(vec![], vec![]), Err(CorpusError::Empty)));
    }

    #[test]
    fn test_unknown_season_is_rejected() {
        let places = "travel_id,name,season\n5,Somewhere,rainy\n";
        let err = Corpus::from_readers(places.as_bytes(), "1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CorpusError::InvalidSeason { id: 5, .. }));
    }

    fn place(id: i64) -> Place {
        Place {
            id,
            name: format!("place-{id}"),
            description: String::new(),
            season: None,
            nature_tags: Vec::new(),
            vibe_tags: Vec::new(),
            target_tags: Vec::new(),
        }
    }
}
