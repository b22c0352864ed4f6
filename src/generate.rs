use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::problem::{City, CityRole, DemandEntry, InstanceDef, Problem};

/// Parameters of the random instance generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of cities
    pub cities: usize,
    /// Cities are placed uniformly in `[0, extent) x [0, extent)`
    pub extent: f64,
    /// Probability that a city is a hub
    pub hub_probability: f64,
    /// Probability that a city is a terminal
    pub terminal_probability: f64,
    /// Probability that an ordered pair of cities has positive demand
    pub demand_density: f64,
    /// Demand quantities are drawn from `1..=max_demand`
    pub max_demand: u32,
    pub fleet_size: usize,
    pub horizon: f64,
    pub resolution: f64,
    pub speed: f64,
    pub weight_limit: f64,
    pub fuel_cost: f64,
    pub airport_cost: f64,
    pub plane_cost: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            cities: 5,
            extent: 100.0,
            hub_probability: 0.2,
            terminal_probability: 0.3,
            demand_density: 0.3,
            max_demand: 10,
            fleet_size: 3,
            horizon: 6.0,
            resolution: 1.0,
            speed: 50.0,
            weight_limit: 10.0,
            fuel_cost: 1.0,
            airport_cost: 5.0,
            plane_cost: 100.0,
        }
    }
}

/// Draws a random instance. The same `seed` always yields the same instance.
pub fn generate(config: &GeneratorConfig, seed: u64) -> Result<Problem> {
    debug!("Generating random instance: {:?}, seed = {}", config, seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let cities: Vec<City> = (0..config.cities)
        .map(|i| {
            let role = match rng.gen::<f64>() {
                p if p < config.hub_probability => CityRole::Hub,
                p if p < config.hub_probability + config.terminal_probability => {
                    CityRole::Terminal
                }
                _ => CityRole::Ordinary,
            };
            City::new(
                &format!("c{:02}", i),
                rng.gen_range(0.0..config.extent).floor(),
                rng.gen_range(0.0..config.extent).floor(),
                role,
            )
        })
        .collect();

    let mut demand = Vec::new();
    for origin in &cities {
        for destination in &cities {
            if origin.name != destination.name && rng.gen_bool(config.demand_density) {
                demand.push(DemandEntry {
                    origin: origin.name.clone(),
                    destination: destination.name.clone(),
                    quantity: rng.gen_range(1..=config.max_demand) as f64,
                });
            }
        }
    }

    Problem::try_from(InstanceDef {
        cities,
        fleet_size: config.fleet_size,
        horizon: config.horizon,
        resolution: config.resolution,
        fuel_cost: config.fuel_cost,
        airport_cost: config.airport_cost,
        plane_cost: config.plane_cost,
        speed: config.speed,
        weight_limit: config.weight_limit,
        demand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_instance() {
        let config = GeneratorConfig::default();
        let one = generate(&config, 7).unwrap();
        let two = generate(&config, 7).unwrap();
        assert_eq!(one.cities(), two.cities());
        assert_eq!(
            one.demand_pairs().collect::<Vec<_>>(),
            two.demand_pairs().collect::<Vec<_>>()
        );
    }

    #[test]
    fn respects_city_count() {
        let config = GeneratorConfig {
            cities: 9,
            ..GeneratorConfig::default()
        };
        let problem = generate(&config, 1).unwrap();
        assert_eq!(problem.cities().len(), 9);
        assert!(problem
            .demand_pairs()
            .all(|(o, d, q)| o != d && (1.0..=10.0).contains(&q)));
    }
}
