//! Synthetic confidence tiers for a CSV dataset
//!
//! Rows are shuffled with a seeded RNG, then the first 10% become red (0.0),
//! the next 20% yellow (0.5), and the rest green (1.0). Counts are floored, so
//! rounding leftovers always land in green.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

pub const CONFIDENCE_COLUMN: &str = "confidence";
pub const COLOR_COLUMN: &str = "color";

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum RelabelError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Red,
    Yellow,
    Green,
}

impl Tier {
    pub fn confidence(&self) -> f64 {
        match self {
            Tier::Red => 0.0,
            Tier::Yellow => 0.5,
            Tier::Green => 1.0,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Tier::Red => "red",
            Tier::Yellow => "yellow",
            Tier::Green => "green",
        }
    }

    /// Inverse of [`Tier::confidence`]
    pub fn from_confidence(confidence: f64) -> Option<Self> {
        [Tier::Red, Tier::Yellow, Tier::Green]
            .into_iter()
            .find(|t| t.confidence() == confidence)
    }

    /// Confidence as written to the CSV
    fn confidence_text(&self) -> &'static str {
        match self {
            Tier::Red => "0.0",
            Tier::Yellow => "0.5",
            Tier::Green => "1.0",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierCounts {
    pub red: usize,
    pub yellow: usize,
    pub green: usize,
}

impl TierCounts {
    /// floor(10%) red, floor(20%) yellow, remainder green
    pub fn for_rows(n: usize) -> Self {
        let red = n / 10;
        let yellow = n / 5;
        Self {
            red,
            yellow,
            green: n - red - yellow,
        }
    }

    pub fn total(&self) -> usize {
        self.red + self.yellow + self.green
    }

    /// Tier of the row at `position` after shuffling
    pub fn tier_at(&self, position: usize) -> Tier {
        if position < self.red {
            Tier::Red
        } else if position < self.red + self.yellow {
            Tier::Yellow
        } else {
            Tier::Green
        }
    }
}

/// Relabel CSV from `input` into `output`
pub fn relabel<R: Read, W: Write>(input: R, output: W, seed: u64) -> Result<TierCounts, RelabelError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    // Existing tier columns are replaced rather than duplicated.
    let kept: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| *name != CONFIDENCE_COLUMN && *name != COLOR_COLUMN)
        .map(|(idx, _)| idx)
        .collect();

    let mut rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    rows.shuffle(&mut StdRng::seed_from_u64(seed));

    let counts = TierCounts::for_rows(rows.len());

    let mut writer = csv::Writer::from_writer(output);
    let mut header_out: Vec<&str> = kept.iter().map(|&i| &headers[i]).collect();
    header_out.extend([CONFIDENCE_COLUMN, COLOR_COLUMN]);
    writer.write_record(&header_out)?;

    for (position, row) in rows.iter().enumerate() {
        let tier = counts.tier_at(position);
        let mut out: Vec<&str> = kept.iter().map(|&i| row.get(i).unwrap_or("")).collect();
        out.extend([tier.confidence_text(), tier.color()]);
        writer.write_record(&out)?;
    }

    writer
        .flush()
        .map_err(|source| RelabelError::Io {
            path: "<output>".to_string(),
            source,
        })?;

    Ok(counts)
}

/// File-to-file wrapper around [`relabel`]
pub fn relabel_file(input: &Path, output: &Path, seed: u64) -> Result<TierCounts, RelabelError> {
    let io_error = |path: &Path| {
        let path = path.display().to_string();
        move |source| RelabelError::Io { path, source }
    };

    let reader = File::open(input).map_err(io_error(input))?;
    let writer = File::create(output).map_err(io_error(output))?;
    relabel(reader, writer, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> String {
        let mut csv = String::from("image,floors\n");
        for i in 0..n {
            csv.push_str(&format!("building{:03}.jpg,{}\n", i, i % 5 + 1));
        }
        csv
    }

    fn run(input: &str, seed: u64) -> (TierCounts, Vec<csv::StringRecord>, csv::StringRecord) {
        let mut out = Vec::new();
        let counts = relabel(input.as_bytes(), &mut out, seed).unwrap();
        let mut reader = csv::Reader::from_reader(out.as_slice());
        let headers = reader.headers().unwrap().clone();
        let rows = reader.records().map(|r| r.unwrap()).collect();
        (counts, rows, headers)
    }

    #[test]
    fn test_counts_for_any_row_count() {
        for n in 0..=250 {
            let counts = TierCounts::for_rows(n);
            assert_eq!(counts.red, n / 10, "red for n={}", n);
            assert_eq!(counts.yellow, n / 5, "yellow for n={}", n);
            assert_eq!(counts.total(), n);
        }
    }

    #[test]
    fn test_output_partition_matches_counts() {
        for n in [0, 1, 9, 10, 11, 37, 100, 123] {
            let (counts, rows, _) = run(&dataset(n), DEFAULT_SEED);
            assert_eq!(rows.len(), n);

            let tally = |color: &str| rows.iter().filter(|r| &r[3] == color).count();
            assert_eq!(tally("red"), counts.red);
            assert_eq!(tally("yellow"), counts.yellow);
            assert_eq!(tally("green"), counts.green);
        }
    }

    #[test]
    fn test_color_follows_confidence() {
        let (_, rows, headers) = run(&dataset(57), DEFAULT_SEED);
        assert_eq!(&headers[2], CONFIDENCE_COLUMN);
        assert_eq!(&headers[3], COLOR_COLUMN);

        for row in &rows {
            let confidence: f64 = row[2].parse().unwrap();
            let tier = Tier::from_confidence(confidence).unwrap();
            assert_eq!(&row[3], tier.color());
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let input = dataset(40);
        let (_, first, _) = run(&input, 7);
        let (_, second, _) = run(&input, 7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_tier_columns_are_replaced() {
        let input = "image,confidence,color\na.jpg,0.9,blue\nb.jpg,0.1,pink\n";
        let (_, rows, headers) = run(input, DEFAULT_SEED);

        assert_eq!(headers.len(), 3);
        assert_eq!(&headers[0], "image");
        for row in &rows {
            assert_eq!(&row[1], "1.0");
            assert_eq!(&row[2], "green");
        }
    }

    #[test]
    fn test_relabel_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.csv");
        let output = dir.path().join("data_modified.csv");
        std::fs::write(&input, dataset(20)).unwrap();

        let counts = relabel_file(&input, &output, DEFAULT_SEED).unwrap();
        assert_eq!(counts, TierCounts { red: 2, yellow: 4, green: 14 });
        assert!(std::fs::read_to_string(&output).unwrap().starts_with("image,floors,confidence,color"));
    }

    #[test]
    fn test_missing_input_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = relabel_file(&dir.path().join("nope.csv"), &dir.path().join("out.csv"), 1)
            .unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
