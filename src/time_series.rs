//! Availability profiles for weather-dependent technologies.
//!
//! The time series is read from a CSV file, either on disk or over HTTP(S). The first column holds
//! timestamps and every other column holds one profile, with values between 0 and 1. Empty cells
//! are treated as missing values.
use crate::error::{StudyError, StudyResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

/// The values of one time series column. Shared read-only between networks.
pub type Profile = Rc<[Option<f64>]>;

/// Formats accepted for timestamps without a time zone
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// A set of profiles sharing a timestamp index
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    columns: IndexMap<String, Profile>,
}

/// Parse a timestamp in one of the supported formats
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Whether `source` should be fetched over the network rather than read from disk
fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

impl TimeSeries {
    /// Create a time series from an index and columns of equal length.
    ///
    /// # Arguments
    ///
    /// * `index` - Timestamps, which must be strictly increasing
    /// * `columns` - Profile values, keyed by profile name
    pub fn new(
        index: Vec<NaiveDateTime>,
        columns: IndexMap<String, Vec<Option<f64>>>,
    ) -> StudyResult<Self> {
        if let Some(pos) = index.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(StudyError::InvalidParameter(format!(
                "time series timestamps must be strictly increasing (at {})",
                index[pos + 1]
            )));
        }

        if let Some((name, _)) = columns.iter().find(|(_, values)| values.len() != index.len()) {
            return Err(StudyError::InvalidParameter(format!(
                "time series column {name} has a different length to the index"
            )));
        }

        Ok(Self {
            index,
            columns: columns
                .into_iter()
                .map(|(name, values)| (name, values.into()))
                .collect(),
        })
    }

    /// Load a time series from a URL (if `source` starts with `http://` or `https://`) or a path
    pub fn load(source: &str) -> StudyResult<Self> {
        if is_url(source) {
            Self::fetch(source)
        } else {
            Self::from_path(Path::new(source))
        }
    }

    /// Fetch a time series over HTTP(S), blocking until the whole body has been read
    pub fn fetch(url: &str) -> StudyResult<Self> {
        debug!("Fetching time series from {url}");
        let response = ureq::get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => {
                StudyError::data_fetch(url, format!("server returned HTTP {code}"))
            }
            ureq::Error::Transport(transport) => StudyError::data_fetch(url, transport.to_string()),
        })?;

        Self::from_reader(response.into_reader(), url)
    }

    /// Read a time series from a CSV file on disk
    pub fn from_path(path: &Path) -> StudyResult<Self> {
        let source_name = path.display().to_string();
        let file =
            File::open(path).map_err(|err| StudyError::data_fetch(&source_name, err.to_string()))?;

        Self::from_reader(file, &source_name)
    }

    /// Parse a time series from CSV data.
    ///
    /// # Arguments
    ///
    /// * `reader` - Source of CSV data
    /// * `source_name` - URL or path, used in error messages
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> StudyResult<Self> {
        let malformed = |message: String| StudyError::data_fetch(source_name, message);

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| malformed(err.to_string()))?
            .clone();
        if headers.len() < 2 {
            return Err(malformed(
                "expected a timestamp column and at least one profile column".into(),
            ));
        }

        let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
        if let Some(name) = names.iter().duplicates().next() {
            return Err(malformed(format!("duplicate column \"{name}\"")));
        }
        let mut index = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
        for (row, record) in reader.records().enumerate() {
            // Row numbers in messages count the header as line 1
            let line = row + 2;
            let record = record.map_err(|err| malformed(err.to_string()))?;

            let timestamp = record.get(0).unwrap_or_default();
            index.push(parse_timestamp(timestamp).ok_or_else(|| {
                malformed(format!("invalid timestamp \"{timestamp}\" on line {line}"))
            })?);

            for (values, field) in columns.iter_mut().zip(record.iter().skip(1)) {
                let value = if field.is_empty() {
                    None
                } else {
                    Some(field.parse::<f64>().map_err(|_| {
                        malformed(format!("invalid value \"{field}\" on line {line}"))
                    })?)
                };
                values.push(value);
            }
        }

        if index.is_empty() {
            return Err(malformed("time series contains no data".into()));
        }

        debug!(
            "Read {} rows with columns {:?} from {source_name}",
            index.len(),
            names
        );
        Self::new(index, names.into_iter().zip(columns).collect())
            .map_err(|err| malformed(err.to_string()))
    }

    /// The timestamps of the time series
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// The number of timestamps
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the time series has no timestamps
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterate over the names of the profiles
    pub fn iter_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Get a profile by name
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.columns.get(name)
    }

    /// Resample to a fixed time step without interpolating.
    ///
    /// The new index starts at the first timestamp and runs to the last in increments of `step`.
    /// Each new row takes the values of the original row at exactly the same time. Original rows
    /// between grid points are dropped and grid points with no original row are left empty.
    pub fn resample(&self, step: TimeDelta) -> StudyResult<Self> {
        if step <= TimeDelta::zero() {
            return Err(StudyError::InvalidParameter(
                "resampling step must be positive".into(),
            ));
        }

        let mut index = Vec::new();
        if let (Some(&first), Some(&last)) = (self.index.first(), self.index.last()) {
            let mut time = first;
            while time <= last {
                index.push(time);
                time += step;
            }
        }

        let rows: Vec<Option<usize>> = index
            .iter()
            .map(|time| self.index.binary_search(time).ok())
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let resampled: Profile =
                    rows.iter().map(|row| row.and_then(|i| values[i])).collect();
                (name.clone(), resampled)
            })
            .collect();

        Ok(Self { index, columns })
    }
}
