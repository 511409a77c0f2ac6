//! Plain-text match files.
//!
//! ```text
//! SceneName <name>
//! <keypoint> | <keypoint> | <offset x> <offset y>
//! ```
//!
//! where each keypoint is `sensor frame px py depth wx wy wz size response`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::core::EnrichedKeypoint;
use crate::matching::MatchStore;

const HEADER: &str = "SceneName";

#[derive(Debug, Error)]
pub enum MatchIoError {
    #[error("failed to write matches {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("failed to read matches {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("invalid match file: {message}")]
    InvalidFormat { message: String },
}

/// One line of a match file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRecord {
    pub source: EnrichedKeypoint,
    pub target: EnrichedKeypoint,
    pub offset: Vec2,
}

/// Contents of a match file
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFile {
    pub scene_name: String,
    pub records: Vec<MatchRecord>,
}

pub fn save_matches(path: &Path, scene_name: &str, matches: &MatchStore) -> Result<(), MatchIoError> {
    let write_err = |source| MatchIoError::Write {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{} {}", HEADER, scene_name).map_err(write_err)?;
    for m in matches {
        writeln!(writer, "{} | {} | {} {}", m.source, m.target, m.offset.x, m.offset.y).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    Ok(())
}

pub fn load_matches(path: &Path) -> Result<MatchFile, MatchIoError> {
    let read_err = |source| MatchIoError::Read {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut lines = BufReader::new(file).lines();

    let header = lines
        .next()
        .transpose()
        .map_err(read_err)?
        .ok_or_else(|| invalid("empty file".to_string()))?;
    let scene_name = header
        .strip_prefix(HEADER)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| invalid(format!("expected '{} <name>' header, got '{}'", HEADER, header)))?
        .to_string();

    let mut records = Vec::new();
    for (line_num, line) in lines.enumerate() {
        let line = line.map_err(read_err)?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_record(&line).map_err(|message| invalid(format!("line {}: {}", line_num + 2, message)))?);
    }

    Ok(MatchFile { scene_name, records })
}

fn invalid(message: String) -> MatchIoError {
    MatchIoError::InvalidFormat { message }
}

fn parse_record(line: &str) -> Result<MatchRecord, String> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 '|'-separated fields, got {}", parts.len()));
    }

    let offset: Vec<f32> = parse_numbers(parts[2])?;
    if offset.len() != 2 {
        return Err(format!("expected 2 offset values, got {}", offset.len()));
    }

    Ok(MatchRecord {
        source: parse_keypoint(parts[0])?,
        target: parse_keypoint(parts[1])?,
        offset: Vec2::new(offset[0], offset[1]),
    })
}

fn parse_keypoint(field: &str) -> Result<EnrichedKeypoint, String> {
    let tokens: Vec<&str> = field.split_whitespace().collect();
    if tokens.len() != 10 {
        return Err(format!("expected 10 keypoint values, got {}", tokens.len()));
    }

    let index = |i: usize| -> Result<usize, String> {
        tokens[i]
            .parse()
            .map_err(|e| format!("invalid index '{}': {}", tokens[i], e))
    };
    let values = parse_numbers(&tokens[2..].join(" "))?;

    Ok(EnrichedKeypoint {
        sensor: index(0)?,
        frame: index(1)?,
        pixel: Vec2::new(values[0], values[1]),
        depth: values[2],
        world: Vec3::new(values[3], values[4], values[5]),
        size: values[6],
        response: values[7],
    })
}

fn parse_numbers(field: &str) -> Result<Vec<f32>, String> {
    field
        .split_whitespace()
        .map(|t| t.parse::<f32>().map_err(|e| format!("invalid number '{}': {}", t, e)))
        .collect()
}
