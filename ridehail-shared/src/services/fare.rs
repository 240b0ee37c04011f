/// Fare estimation.
///
/// `fare = base_fare + per_km_rate * distance_km`, rounded to cents.
///
/// There is no geocoding yet: [`RandomDistance`] stands in for a real route
/// distance and draws a value between 1 and 20 km. It is a placeholder and
/// encodes no pricing rule. Swap in another [`DistanceEstimator`] once pickup
/// and dropoff resolve to coordinates.

use rand::Rng;

/// Pricing knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareConfig {
    pub base_fare: f64,
    pub per_km_rate: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base_fare: 2.50,
            per_km_rate: 1.25,
        }
    }
}

/// Estimates trip distance between two free-text locations
pub trait DistanceEstimator: Send + Sync {
    fn distance_km(&self, pickup: &str, dropoff: &str) -> f64;
}

/// Placeholder estimator returning a uniform random distance
#[derive(Debug, Clone, Copy)]
pub struct RandomDistance {
    pub min_km: f64,
    pub max_km: f64,
}

impl Default for RandomDistance {
    fn default() -> Self {
        Self {
            min_km: 1.0,
            max_km: 20.0,
        }
    }
}

impl DistanceEstimator for RandomDistance {
    fn distance_km(&self, _pickup: &str, _dropoff: &str) -> f64 {
        rand::thread_rng().gen_range(self.min_km..=self.max_km)
    }
}

/// Always returns the same distance
#[derive(Debug, Clone, Copy)]
pub struct FixedDistance(pub f64);

impl DistanceEstimator for FixedDistance {
    fn distance_km(&self, _pickup: &str, _dropoff: &str) -> f64 {
        self.0
    }
}

pub struct FareEstimator {
    config: FareConfig,
    distance: Box<dyn DistanceEstimator>,
}

impl FareEstimator {
    pub fn new(config: FareConfig, distance: Box<dyn DistanceEstimator>) -> Self {
        Self { config, distance }
    }

    /// Default pricing over the random placeholder distance
    pub fn placeholder(config: FareConfig) -> Self {
        Self::new(config, Box::new(RandomDistance::default()))
    }

    pub fn estimate(&self, pickup: &str, dropoff: &str) -> f64 {
        let distance = self.distance.distance_km(pickup, dropoff).max(0.0);
        let fare = self.config.base_fare + self.config.per_km_rate * distance;
        (fare * 100.0).round() / 100.0
    }
}
