//! Reading instances from disk.
//!
//! Two formats are understood: the JSON form of `InstanceDef`, and a line oriented text
//! format with parameter lines, a `CITIES` section and a `DEMAND` section:
//!
//! ```text
//! # anything after a hash is ignored
//! NUMBER OF PLANES 3;
//! TIME HORIZON 24;
//! TIME RESOLUTION 0.5;
//! WEIGHT LIMIT 40;
//! AIRPORT COST 100;
//! PLANE FIXED COST 1000;
//! FUEL COST 1.5;
//! PLANE SPEED 400;
//! CITIES:
//! Berlin 10 20 Hub
//! Hamburg 8 30 Terminal
//! Munich 12 2 City
//! DEMAND:
//! Berlin Munich 12;
//! Hamburg Berlin 4;
//! ```
//!
//! The value of a parameter line is its last token. Keywords are only recognized before
//! the `CITIES` section. City roles starting with `H` are
//! hubs, roles starting with `T` terminals, anything else is an ordinary city.
use std::path::Path;

use derive_more::Display;
use log::{debug, trace, warn};

use crate::error::Result;
use crate::problem::{City, CityRole, DemandEntry, InstanceDef, Problem};

#[derive(Debug, Display, Clone, PartialEq)]
#[display(fmt = "line {}: {}", line, message)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Number,
    Horizon,
    Resolution,
    Limit,
    Airport,
    PlaneFixed,
    Fuel,
    Speed,
}

impl Keyword {
    /// The first keyword among `tokens`. `PLANE` only counts when followed by `FIXED`.
    fn find(tokens: &[&str]) -> Option<Keyword> {
        tokens.iter().enumerate().find_map(|(i, token)| {
            match token.to_ascii_uppercase().as_str() {
                "NUMBER" => Some(Keyword::Number),
                "HORIZON" => Some(Keyword::Horizon),
                "RESOLUTION" => Some(Keyword::Resolution),
                "LIMIT" => Some(Keyword::Limit),
                "AIRPORT" => Some(Keyword::Airport),
                "FUEL" => Some(Keyword::Fuel),
                "SPEED" => Some(Keyword::Speed),
                "PLANE"
                    if tokens
                        .get(i + 1)
                        .map_or(false, |next| next.eq_ignore_ascii_case("FIXED")) =>
                {
                    Some(Keyword::PlaneFixed)
                }
                _ => None,
            }
        })
    }

    fn name(self) -> &'static str {
        match self {
            Keyword::Number => "NUMBER",
            Keyword::Horizon => "HORIZON",
            Keyword::Resolution => "RESOLUTION",
            Keyword::Limit => "LIMIT",
            Keyword::Airport => "AIRPORT",
            Keyword::PlaneFixed => "PLANE FIXED",
            Keyword::Fuel => "FUEL",
            Keyword::Speed => "SPEED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Parameters,
    Cities,
    Demand,
}

fn number(line: usize, token: &str) -> std::result::Result<f64, ParseError> {
    token
        .parse::<f64>()
        .map_err(|_| ParseError::new(line, format!("expected a number, found `{token}`")))
}

fn parse_role(token: &str) -> CityRole {
    match token.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('H') => CityRole::Hub,
        Some('T') => CityRole::Terminal,
        _ => CityRole::Ordinary,
    }
}

/// Parses the text instance format into an `InstanceDef`. No validation beyond syntax
/// happens here.
pub fn read_text_instance(text: &str) -> std::result::Result<InstanceDef, ParseError> {
    let mut section = Section::Parameters;
    let mut values: [Option<f64>; 8] = [None; 8];
    let mut cities = Vec::new();
    let mut demand = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or_default();
        let tokens: Vec<&str> = content
            .split_whitespace()
            .map(|t| t.trim_end_matches(|c| c == ';' || c == ':'))
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            continue;
        }

        let header = tokens[0].to_ascii_uppercase();
        if header.contains("CITIES") {
            section = Section::Cities;
            continue;
        }
        if header.contains("DEMAND") {
            section = Section::Demand;
            continue;
        }

        match section {
            Section::Parameters => match Keyword::find(&tokens) {
                Some(keyword) => {
                    let value = number(line, tokens[tokens.len() - 1])?;
                    trace!("line {line}: {} = {value}", keyword.name());
                    values[keyword as usize] = Some(value);
                }
                None => warn!("line {line}: ignoring `{}`", content.trim()),
            },
            Section::Cities => {
                if tokens.len() < 3 {
                    return Err(ParseError::new(line, "expected `name x y [role]`"));
                }
                let x = number(line, tokens[1])?;
                let y = number(line, tokens[2])?;
                let role = tokens.get(3).map_or(CityRole::Ordinary, |t| parse_role(t));
                cities.push(City::new(tokens[0], x, y, role));
            }
            Section::Demand => {
                if tokens.len() < 3 {
                    return Err(ParseError::new(
                        line,
                        "expected `origin destination quantity`",
                    ));
                }
                demand.push(DemandEntry {
                    origin: tokens[0].to_string(),
                    destination: tokens[1].to_string(),
                    quantity: number(line, tokens[tokens.len() - 1])?,
                });
            }
        }
    }

    let lines = text.lines().count();
    let get = |keyword: Keyword| {
        values[keyword as usize].ok_or_else(|| {
            ParseError::new(lines, format!("missing parameter {}", keyword.name()))
        })
    };

    let planes = get(Keyword::Number)?;
    if planes < 0.0 || planes.fract() != 0.0 {
        return Err(ParseError::new(
            lines,
            format!("the number of planes must be a non-negative integer, got {planes}"),
        ));
    }

    debug!(
        "Read text instance with {} cities and {} demand entries",
        cities.len(),
        demand.len()
    );

    Ok(InstanceDef {
        cities,
        fleet_size: planes as usize,
        horizon: get(Keyword::Horizon)?,
        resolution: get(Keyword::Resolution)?,
        fuel_cost: get(Keyword::Fuel)?,
        airport_cost: get(Keyword::Airport)?,
        plane_cost: get(Keyword::PlaneFixed)?,
        speed: get(Keyword::Speed)?,
        weight_limit: get(Keyword::Limit)?,
        demand,
    })
}

/// Reads and validates an instance. Files whose content starts with `{` are read as JSON,
/// everything else as the text format.
pub fn read_instance(path: impl AsRef<Path>) -> Result<Problem> {
    let text = std::fs::read_to_string(path.as_ref())?;
    debug!("Reading instance {}", path.as_ref().display());
    if text.trim_start().starts_with('{') {
        Ok(serde_json::from_str(&text)?)
    } else {
        Problem::try_from(read_text_instance(&text)?)
    }
}
