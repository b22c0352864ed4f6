use std::collections::HashMap;

use derive_more::{Deref, Display, From, Into};
use log::warn;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use crate::error::{Result, SndError};
use crate::geometry::{self, Distance, Point};

/// The type used for cargo quantities
pub type Quantity = f64;
/// The type used for cost.
pub type Cost = f64;
/// A discrete time step in `0..=H`
pub type TimeIndex = usize;

/// Index of a city. Cities are ordered lexicographically by name, so the index is also
/// the rank used for plotting.
#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct CityIndex(usize);

/// What a city is allowed to do with cargo that is not its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityRole {
    Ordinary,
    /// May transfer any commodity
    Hub,
    /// May only send its own commodity and receive commodities destined for itself
    Terminal,
}

impl Default for CityRole {
    fn default() -> Self {
        CityRole::Ordinary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// The identifier of the city
    pub name: String,
    /// The location of the city in the plane
    pub location: Point,
    #[serde(default)]
    pub role: CityRole,
}

impl City {
    pub fn new(name: &str, x: f64, y: f64, role: CityRole) -> City {
        City {
            name: name.to_string(),
            location: Point(x, y),
            role,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.role == CityRole::Terminal
    }
}

/// A single entry in the demand table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandEntry {
    pub origin: String,
    pub destination: String,
    pub quantity: Quantity,
}

/// The raw description of an instance, as read from disk. Converted into a `Problem`
/// through `TryFrom`, which is where all validation happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDef {
    pub cities: Vec<City>,
    /// The number of planes available
    pub fleet_size: usize,
    /// The length of the planning period
    pub horizon: f64,
    /// The length of a single time step, in the same unit as `horizon`
    pub resolution: f64,
    /// Cost per unit of distance flown
    pub fuel_cost: Cost,
    /// Fixed cost per flight
    pub airport_cost: Cost,
    /// Fixed cost per plane in use
    pub plane_cost: Cost,
    /// Distance covered per unit of time
    pub speed: f64,
    /// Cargo capacity of a single plane
    pub weight_limit: Quantity,
    #[serde(default)]
    pub demand: Vec<DemandEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "InstanceDef", into = "InstanceDef")]
pub struct Problem {
    /// The cities, sorted by name
    cities: TiVec<CityIndex, City>,
    /// The number of planes available
    fleet_size: usize,
    /// The length of the planning period
    horizon: f64,
    /// The length of a single time step
    resolution: f64,
    /// The index of the last time step
    timesteps: TimeIndex,
    /// Cost per unit of distance flown
    fuel_cost: Cost,
    /// Fixed cost per flight
    airport_cost: Cost,
    /// Fixed cost per plane in use
    plane_cost: Cost,
    /// Distance covered per unit of time
    speed: f64,
    /// Cargo capacity of a single plane
    weight_limit: Quantity,
    /// demand[[o, d]] is the quantity that must be shipped from o to d
    demand: Array2<Quantity>,
}

impl Problem {
    /// The cities, sorted by name
    pub fn cities(&self) -> &TiVec<CityIndex, City> {
        &self.cities
    }

    pub fn city(&self, city: CityIndex) -> &City {
        &self.cities[city]
    }

    /// Looks up a city by name
    pub fn city_index(&self, name: &str) -> Option<CityIndex> {
        self.cities
            .binary_search_by(|city| city.name.as_str().cmp(name))
            .ok()
    }

    pub fn fleet_size(&self) -> usize {
        self.fleet_size
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// The index of the last time step, `H = ceil(horizon / resolution)`
    pub fn timesteps(&self) -> TimeIndex {
        self.timesteps
    }

    pub fn fuel_cost(&self) -> Cost {
        self.fuel_cost
    }

    pub fn airport_cost(&self) -> Cost {
        self.airport_cost
    }

    pub fn plane_cost(&self) -> Cost {
        self.plane_cost
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn weight_limit(&self) -> Quantity {
        self.weight_limit
    }

    /// The quantity that must be shipped from `origin` to `destination`
    pub fn demand(&self, origin: CityIndex, destination: CityIndex) -> Quantity {
        self.demand[[origin.into(), destination.into()]]
    }

    /// The total quantity `origin` ships to all other cities
    pub fn total_demand(&self, origin: CityIndex) -> Quantity {
        self.demand.row(origin.into()).sum()
    }

    /// All (origin, destination, quantity) triples with a strictly positive quantity
    pub fn demand_pairs(&self) -> impl Iterator<Item = (CityIndex, CityIndex, Quantity)> + '_ {
        self.demand
            .indexed_iter()
            .filter(|&(_, &q)| q > 0.0)
            .map(|((o, d), &q)| (CityIndex(o), CityIndex(d), q))
    }

    /// The distance between two cities
    pub fn distance(&self, from: CityIndex, to: CityIndex) -> Distance {
        geometry::distance(self.cities[from].location, self.cities[to].location)
    }

    /// The number of time steps needed to fly between two cities
    pub fn flight_duration(&self, from: CityIndex, to: CityIndex) -> Result<usize> {
        geometry::flight_duration(
            self.cities[from].location,
            self.cities[to].location,
            self.speed,
            self.resolution,
        )
    }
}

fn non_negative(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SndError::invalid(
            name,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

fn positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SndError::invalid(
            name,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

impl TryFrom<InstanceDef> for Problem {
    type Error = SndError;

    fn try_from(def: InstanceDef) -> Result<Problem> {
        let horizon = positive("horizon", def.horizon)?;
        let resolution = positive("resolution", def.resolution)?;
        let speed = positive("speed", def.speed)?;
        let timesteps = geometry::horizon_steps(horizon, resolution)?;

        if def.cities.is_empty() {
            return Err(SndError::invalid("cities", "at least one city is required"));
        }

        let mut cities = def.cities;
        cities.sort_by(|a, b| a.name.cmp(&b.name));
        for city in &cities {
            if city.name.is_empty() {
                return Err(SndError::invalid("cities", "city names can not be empty"));
            }
            if !city.location.is_finite() {
                return Err(SndError::invalid(
                    "cities",
                    format!("city {} has malformed coordinates", city.name),
                ));
            }
        }
        if let Some(pair) = cities.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(SndError::invalid(
                "cities",
                format!("city {} is defined more than once", pair[0].name),
            ));
        }

        let index: HashMap<&str, usize> = cities
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), i))
            .collect();

        let mut demand = Array2::zeros((cities.len(), cities.len()));
        for entry in &def.demand {
            let lookup = |name: &str| {
                index.get(name).copied().ok_or_else(|| {
                    SndError::invalid("demand", format!("unknown city {name}"))
                })
            };
            let o = lookup(&entry.origin)?;
            let d = lookup(&entry.destination)?;
            let quantity = non_negative("demand", entry.quantity)?;
            if o == d {
                if quantity > 0.0 {
                    warn!("Ignoring demand from {} to itself", entry.origin);
                }
                continue;
            }
            demand[[o, d]] += quantity;
        }

        Ok(Problem {
            cities: cities.into(),
            fleet_size: def.fleet_size,
            horizon,
            resolution,
            timesteps,
            fuel_cost: non_negative("fuel_cost", def.fuel_cost)?,
            airport_cost: non_negative("airport_cost", def.airport_cost)?,
            plane_cost: non_negative("plane_cost", def.plane_cost)?,
            speed,
            weight_limit: non_negative("weight_limit", def.weight_limit)?,
            demand,
        })
    }
}

impl From<Problem> for InstanceDef {
    fn from(problem: Problem) -> Self {
        let demand = problem
            .demand_pairs()
            .map(|(o, d, quantity)| DemandEntry {
                origin: problem.cities[o].name.clone(),
                destination: problem.cities[d].name.clone(),
                quantity,
            })
            .collect();

        InstanceDef {
            fleet_size: problem.fleet_size,
            horizon: problem.horizon,
            resolution: problem.resolution,
            fuel_cost: problem.fuel_cost,
            airport_cost: problem.airport_cost,
            plane_cost: problem.plane_cost,
            speed: problem.speed,
            weight_limit: problem.weight_limit,
            demand,
            cities: problem.cities.into_iter().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two cities ten units apart, one plane, five units of demand from A to B
    pub fn two_city_def() -> InstanceDef {
        InstanceDef {
            cities: vec![
                City::new("B", 0.0, 10.0, CityRole::Ordinary),
                City::new("A", 0.0, 0.0, CityRole::Ordinary),
            ],
            fleet_size: 1,
            horizon: 3.0,
            resolution: 1.0,
            fuel_cost: 1.0,
            airport_cost: 0.0,
            plane_cost: 100.0,
            speed: 10.0,
            weight_limit: 5.0,
            demand: vec![DemandEntry {
                origin: "A".into(),
                destination: "B".into(),
                quantity: 5.0,
            }],
        }
    }

    #[test]
    fn cities_are_sorted_by_name() {
        let problem = Problem::try_from(two_city_def()).unwrap();
        let names: Vec<_> = problem.cities().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(problem.city_index("B"), Some(CityIndex(1)));
        assert_eq!(problem.city_index("C"), None);
    }

    #[test]
    fn missing_demand_defaults_to_zero() {
        let problem = Problem::try_from(two_city_def()).unwrap();
        let (a, b) = (CityIndex(0), CityIndex(1));
        assert_eq!(problem.demand(a, b), 5.0);
        assert_eq!(problem.demand(b, a), 0.0);
        assert_eq!(problem.demand(a, a), 0.0);
        assert_eq!(problem.total_demand(a), 5.0);
        assert_eq!(problem.demand_pairs().count(), 1);
        assert_eq!(problem.timesteps(), 3);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut def = two_city_def();
        def.speed = 0.0;
        assert!(matches!(
            Problem::try_from(def),
            Err(SndError::InvalidParameter { .. })
        ));

        let mut def = two_city_def();
        def.horizon = -1.0;
        assert!(Problem::try_from(def).is_err());

        let mut def = two_city_def();
        def.cities[0].location = Point(f64::NAN, 0.0);
        assert!(Problem::try_from(def).is_err());

        let mut def = two_city_def();
        def.demand[0].destination = "Z".into();
        assert!(Problem::try_from(def).is_err());

        let mut def = two_city_def();
        def.cities.push(City::new("A", 1.0, 1.0, CityRole::Hub));
        assert!(Problem::try_from(def).is_err());
    }

    #[test]
    fn json_round_trip_keeps_the_instance() {
        let problem = Problem::try_from(two_city_def()).unwrap();
        let json = serde_json::to_string(&problem).unwrap();
        let back: Problem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cities(), problem.cities());
        assert_eq!(back.demand(CityIndex(0), CityIndex(1)), 5.0);
        assert_eq!(back.timesteps(), problem.timesteps());
    }
}
