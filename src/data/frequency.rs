//! Observed encounter frequencies: how often each `(hit, ring)` bucket was seen.
//!
//! The table file is 11 tab-separated rows of 11 counts (row = hit, column = ring).
//! Observation files are whitespace-separated `hit ring` pairs, one per encounter.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AreaDamageError, Result};

/// Bound on both table indices; buckets run `0..MAX_MONSTERS_PER_BUCKET`.
pub const MAX_MONSTERS_PER_BUCKET: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub hit: usize,
    pub ring: usize,
}

impl Observation {
    pub fn new(hit: usize, ring: usize) -> Result<Self> {
        check_bounds(hit, ring)?;
        Ok(Self { hit, ring })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    cells: [[u64; MAX_MONSTERS_PER_BUCKET]; MAX_MONSTERS_PER_BUCKET],
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(hit, ring, count)` triples; later triples overwrite earlier ones.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, u64)>,
    {
        let mut table = Self::new();
        for (hit, ring, count) in counts {
            table.set(hit, ring, count)?;
        }
        Ok(table)
    }

    /// Count for a bucket; out-of-range buckets read as zero.
    pub fn get(&self, hit: usize, ring: usize) -> u64 {
        self.cells
            .get(hit)
            .and_then(|row| row.get(ring))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, hit: usize, ring: usize, count: u64) -> Result<()> {
        check_bounds(hit, ring)?;
        self.cells[hit][ring] = count;
        Ok(())
    }

    pub fn record(&mut self, hit: usize, ring: usize) -> Result<()> {
        check_bounds(hit, ring)?;
        self.cells[hit][ring] += 1;
        Ok(())
    }

    /// Add one count per observation. Every observation is range-checked before any
    /// count changes.
    pub fn merge(&mut self, observations: &[Observation]) -> Result<()> {
        for obs in observations {
            check_bounds(obs.hit, obs.ring)?;
        }
        for obs in observations {
            self.cells[obs.hit][obs.ring] += 1;
        }
        Ok(())
    }

    /// Nonzero buckets as `(hit, ring, count)`, hit-major.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        self.cells.iter().enumerate().flat_map(|(hit, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &count)| count != 0)
                .map(move |(ring, &count)| (hit, ring, count))
        })
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Parse the tab-separated table format. Blank lines and trailing tabs are ignored;
    /// an empty cell inside a row is malformed.
    pub fn parse_tsv(raw: &str, source: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(raw.as_bytes());

        let mut table = Self::new();
        let mut hit = 0usize;
        for record in reader.records() {
            let record = record.map_err(|err| AreaDamageError::malformed(source, err.to_string()))?;
            let mut cells: Vec<&str> = record.iter().collect();
            while cells.last().is_some_and(|cell| cell.is_empty()) {
                cells.pop();
            }
            if cells.is_empty() {
                continue;
            }
            if hit >= MAX_MONSTERS_PER_BUCKET {
                return Err(AreaDamageError::malformed(
                    source,
                    format!("expected {MAX_MONSTERS_PER_BUCKET} rows, found more"),
                ));
            }
            if cells.len() != MAX_MONSTERS_PER_BUCKET {
                return Err(AreaDamageError::malformed(
                    source,
                    format!(
                        "row {hit} has {} values, expected {MAX_MONSTERS_PER_BUCKET}",
                        cells.len()
                    ),
                ));
            }
            for (ring, cell) in cells.iter().enumerate() {
                if cell.is_empty() {
                    return Err(AreaDamageError::malformed(
                        source,
                        format!("row {hit} column {ring} is empty"),
                    ));
                }
                let count = cell.parse::<u64>().map_err(|_| {
                    AreaDamageError::malformed(
                        source,
                        format!("row {hit} column {ring}: '{cell}' is not a count"),
                    )
                })?;
                table.cells[hit][ring] = count;
            }
            hit += 1;
        }
        if hit != MAX_MONSTERS_PER_BUCKET {
            return Err(AreaDamageError::malformed(
                source,
                format!("expected {MAX_MONSTERS_PER_BUCKET} rows, found {hit}"),
            ));
        }
        Ok(table)
    }

    pub fn write_tsv<W: io::Write>(&self, out: W) -> io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(out);
        for row in &self.cells {
            writer.write_record(row.iter().map(u64::to_string))?;
        }
        writer.flush()
    }

    pub fn to_tsv(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        self.write_tsv(&mut buf)?;
        String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

/// Parse `hit ring hit ring ...` pairs.
pub fn parse_observations(raw: &str, source: &Path) -> Result<Vec<Observation>> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(AreaDamageError::malformed(
            source,
            format!("odd number of values ({}); observations come in hit/ring pairs", tokens.len()),
        ));
    }
    tokens
        .chunks(2)
        .enumerate()
        .map(|(index, pair)| -> Result<Observation> {
            let parse = |token: &str| {
                token.parse::<usize>().map_err(|_| {
                    AreaDamageError::malformed(
                        source,
                        format!("observation {index}: '{token}' is not a monster count"),
                    )
                })
            };
            Observation::new(parse(pair[0])?, parse(pair[1])?)
        })
        .collect()
}

fn check_bounds(hit: usize, ring: usize) -> Result<()> {
    if hit >= MAX_MONSTERS_PER_BUCKET || ring >= MAX_MONSTERS_PER_BUCKET {
        return Err(AreaDamageError::OutOfRange { hit, ring });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn src() -> PathBuf {
        PathBuf::from("total.txt")
    }

    #[test]
    fn record_and_iterate_nonzero() {
        let mut table = FrequencyTable::new();
        table.record(2, 3).unwrap();
        table.record(2, 3).unwrap();
        table.record(0, 0).unwrap();
        let cells: Vec<_> = table.iter_nonzero().collect();
        assert_eq!(cells, vec![(0, 0, 1), (2, 3, 2)]);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn record_rejects_out_of_range() {
        let mut table = FrequencyTable::new();
        let err = table.record(11, 0).unwrap_err();
        assert!(matches!(err, AreaDamageError::OutOfRange { hit: 11, ring: 0 }));
        assert_eq!(table.get(11, 0), 0);
    }

    #[test]
    fn merge_is_all_or_nothing() {
        let mut table = FrequencyTable::new();
        let bad = [Observation { hit: 1, ring: 1 }, Observation { hit: 1, ring: 40 }];
        assert!(table.merge(&bad).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn tsv_round_trip_preserves_counts() {
        let table = FrequencyTable::from_counts([(0, 0, 7), (10, 10, 3), (4, 2, 12)]).unwrap();
        let parsed = FrequencyTable::parse_tsv(&table.to_tsv().unwrap(), &src()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn parse_tolerates_trailing_tabs_and_blank_lines() {
        let mut raw = String::new();
        for hit in 0..MAX_MONSTERS_PER_BUCKET {
            for ring in 0..MAX_MONSTERS_PER_BUCKET {
                raw.push_str(&(hit * ring).to_string());
                raw.push('\t');
            }
            raw.push('\n');
        }
        raw.push_str("\n\n");
        let table = FrequencyTable::parse_tsv(&raw, &src()).unwrap();
        assert_eq!(table.get(3, 4), 12);
        assert_eq!(table.get(10, 10), 100);
    }

    #[test]
    fn parse_rejects_short_rows() {
        let err = FrequencyTable::parse_tsv("1\t2\t3\n", &src()).unwrap_err();
        assert!(matches!(err, AreaDamageError::MalformedData { .. }));
    }

    #[test]
    fn parse_rejects_interior_empty_cell() {
        let full = vec!["1"; MAX_MONSTERS_PER_BUCKET].join("\t");
        let mut gap = vec!["1"; MAX_MONSTERS_PER_BUCKET];
        gap[1] = "";
        let mut rows = vec![full; MAX_MONSTERS_PER_BUCKET];
        rows[0] = gap.join("\t");
        let err = FrequencyTable::parse_tsv(&rows.join("\n"), &src()).unwrap_err();
        match err {
            AreaDamageError::MalformedData { message, .. } => {
                assert!(message.contains("row 0 column 1"), "{message}")
            }
            other => panic!("expected MalformedData, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_double_tab_shifting_columns() {
        let shifted = (0..10u64).map(|n| n.to_string()).collect::<Vec<_>>();
        let mut row0 = vec![shifted[0].clone(), String::new()];
        row0.extend(shifted[1..].iter().cloned());
        row0.push("999".to_string());
        let full = vec!["0"; MAX_MONSTERS_PER_BUCKET].join("\t");
        let mut rows = vec![full; MAX_MONSTERS_PER_BUCKET];
        rows[0] = row0.join("\t");
        let err = FrequencyTable::parse_tsv(&rows.join("\n"), &src()).unwrap_err();
        assert!(matches!(err, AreaDamageError::MalformedData { .. }));
    }

    #[test]
    fn to_tsv_writes_eleven_rows() {
        let text = FrequencyTable::from_counts([(1, 2, 5)]).unwrap().to_tsv().unwrap();
        assert_eq!(text.lines().count(), MAX_MONSTERS_PER_BUCKET);
        assert_eq!(text.lines().nth(1), Some("0\t0\t5\t0\t0\t0\t0\t0\t0\t0\t0"));
    }

    #[test]
    fn parse_rejects_non_numeric_cells() {
        let row = vec!["x"; MAX_MONSTERS_PER_BUCKET].join("\t");
        let raw = vec![row; MAX_MONSTERS_PER_BUCKET].join("\n");
        assert!(FrequencyTable::parse_tsv(&raw, &src()).is_err());
    }

    #[test]
    fn observations_parse_pairs() {
        let obs = parse_observations("2 3 0 0\n10 1", Path::new("obs.txt")).unwrap();
        assert_eq!(
            obs,
            vec![
                Observation { hit: 2, ring: 3 },
                Observation { hit: 0, ring: 0 },
                Observation { hit: 10, ring: 1 },
            ]
        );
    }

    #[test]
    fn observations_reject_odd_token_count() {
        assert!(parse_observations("1 2 3", Path::new("obs.txt")).is_err());
    }

    #[test]
    fn observations_reject_out_of_range() {
        let err = parse_observations("12 0", Path::new("obs.txt")).unwrap_err();
        assert!(matches!(err, AreaDamageError::OutOfRange { .. }));
    }

    #[test]
    fn empty_observation_file_is_empty_batch() {
        assert!(parse_observations("  \n", Path::new("obs.txt")).unwrap().is_empty());
    }
}
