use csv::{Reader, StringRecord};
use derive_more::{Constructor, Error};
use log::error;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Parse the variational parameters definition
/// # Arguments
/// * __`fp`__ - File path to the definition file, in csv format.
/// # Returns
/// The parameter values, ordered by identifier.
pub fn parse_vparams_def(fp: &Path) -> Result<Vec<f64>> {
    let file = File::open(fp)?;
    let mut reader = Reader::from_reader(file);
    let mut entries: Vec<Option<f64>> = Vec::new();
    for (k, result) in reader.records().enumerate() {
        let rec = result?;
        if rec.len() != 2 {
            error!("Error at line {} in {}, invalid number of elements.", k, fp.display());
            return Err(VparamsParseError::new("Invalid number of argument on a line.".to_owned()));
        }
        let id = parse_identifier(&rec, k)?;
        let value = rec.get(1).unwrap_or("").trim().parse::<f64>()?;
        if entries.len() < id {
            entries.resize(id, None);
        }
        if entries[id - 1].replace(value).is_some() {
            error!("Error at line {}, parameter {} defined twice.", k, id);
            return Err(VparamsParseError::new(format!("Duplicate parameter identifier {}.", id)));
        }
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| VparamsParseError::new(format!("Missing parameter identifier {}.", i + 1))))
        .collect()
}

fn parse_identifier(line: &StringRecord, l: usize) -> Result<usize> {
    let id = line.get(0).unwrap_or("").trim().parse::<usize>()?;
    if id == 0 {
        error!("Parameter identifiers start at 1, got 0 at line {}.", l);
        return Err(VparamsParseError::new("Parameter identifier 0.".to_owned()));
    }
    Ok(id)
}

type Result<T> = std::result::Result<T, VparamsParseError>;

/// Error in the variational parameters definition.
#[derive(Debug, Clone, Error, Constructor)]
pub struct VparamsParseError {
    pub details: String,
}

impl fmt::Display for VparamsParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Parsing error encountered in the parameters file: {}", self.details)
    }
}

impl From<std::num::ParseIntError> for VparamsParseError {
    fn from(err: std::num::ParseIntError) -> Self {
        VparamsParseError::new(format!("Expected to parse an integer: {}", err))
    }
}

impl From<std::num::ParseFloatError> for VparamsParseError {
    fn from(err: std::num::ParseFloatError) -> Self {
        VparamsParseError::new(format!("Expected to parse a float: {}", err))
    }
}

impl From<csv::Error> for VparamsParseError {
    fn from(err: csv::Error) -> Self {
        VparamsParseError::new(err.to_string())
    }
}

impl From<std::io::Error> for VparamsParseError {
    fn from(err: std::io::Error) -> Self {
        VparamsParseError::new(err.to_string())
    }
}
