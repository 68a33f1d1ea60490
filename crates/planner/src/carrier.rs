use serde::{Deserialize, Serialize};

use shipsync_core::{DomainError, DomainResult, ValueObject};

use crate::recommendation::Priority;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierOption {
    pub name: String,
    /// Flat cost per shipment.
    pub cost: u32,
    pub eta_hours: u32,
    /// Historical on-time ratio in \[0, 1\].
    pub reliability: f64,
}

impl ValueObject for CarrierOption {}

/// Carriers available for shipments. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CarrierOption>", into = "Vec<CarrierOption>")]
pub struct CarrierCatalog {
    options: Vec<CarrierOption>,
    fastest: usize,
    cheapest: usize,
}

impl CarrierCatalog {
    pub fn new(options: Vec<CarrierOption>) -> DomainResult<Self> {
        // Ties fall back to the name so selection never depends on input order.
        let fastest = pick(&options, |c| (c.eta_hours, c.cost));
        let cheapest = pick(&options, |c| (c.cost, c.eta_hours));
        match (fastest, cheapest) {
            (Some(fastest), Some(cheapest)) => Ok(Self {
                options,
                fastest,
                cheapest,
            }),
            _ => Err(DomainError::validation("carrier catalog cannot be empty")),
        }
    }

    pub fn options(&self) -> &[CarrierOption] {
        &self.options
    }

    /// All carriers, cheapest first.
    pub fn by_cost(&self) -> Vec<&CarrierOption> {
        let mut ranked: Vec<&CarrierOption> = self.options.iter().collect();
        ranked.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.name.cmp(&b.name)));
        ranked
    }

    pub fn fastest(&self) -> &CarrierOption {
        &self.options[self.fastest]
    }

    pub fn cheapest(&self) -> &CarrierOption {
        &self.options[self.cheapest]
    }

    /// Urgent and high-priority shipments go with the fastest carrier, the rest ride cheapest.
    pub fn for_priority(&self, priority: Priority) -> &CarrierOption {
        match priority {
            Priority::Urgent | Priority::High => self.fastest(),
            Priority::Normal => self.cheapest(),
        }
    }
}

fn pick<K: Ord>(options: &[CarrierOption], key: impl Fn(&CarrierOption) -> K) -> Option<usize> {
    options
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| key(*a).cmp(&key(*b)).then_with(|| a.name.cmp(&b.name)))
        .map(|(idx, _)| idx)
}

impl Default for CarrierCatalog {
    fn default() -> Self {
        let options = vec![
            CarrierOption {
                name: "FastX EXP".to_string(),
                cost: 150,
                eta_hours: 2,
                reliability: 0.95,
            },
            CarrierOption {
                name: "Econo STD".to_string(),
                cost: 75,
                eta_hours: 24,
                reliability: 0.85,
            },
            CarrierOption {
                name: "Premium Air".to_string(),
                cost: 200,
                eta_hours: 4,
                reliability: 0.98,
            },
        ];
        Self {
            options,
            fastest: 0,
            cheapest: 1,
        }
    }
}

impl TryFrom<Vec<CarrierOption>> for CarrierCatalog {
    type Error = DomainError;

    fn try_from(options: Vec<CarrierOption>) -> DomainResult<Self> {
        Self::new(options)
    }
}

impl From<CarrierCatalog> for Vec<CarrierOption> {
    fn from(catalog: CarrierCatalog) -> Self {
        catalog.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_matches_constructed_one() {
        let built = CarrierCatalog::new(CarrierCatalog::default().options().to_vec()).unwrap();
        assert_eq!(built, CarrierCatalog::default());
    }

    #[test]
    fn ranks_cheapest_first() {
        let catalog = CarrierCatalog::default();
        let names: Vec<&str> = catalog.by_cost().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Econo STD", "FastX EXP", "Premium Air"]);
        assert!(catalog.by_cost().windows(2).all(|w| w[0].cost <= w[1].cost));
    }

    #[test]
    fn priority_selects_carrier() {
        let catalog = CarrierCatalog::default();
        assert_eq!(catalog.for_priority(Priority::Urgent).name, "FastX EXP");
        assert_eq!(catalog.for_priority(Priority::High).name, "FastX EXP");
        assert_eq!(catalog.for_priority(Priority::Normal).name, "Econo STD");
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(CarrierCatalog::new(vec![]).unwrap_err().is_validation());
        assert!(serde_json::from_str::<CarrierCatalog>("[]").is_err());
    }
}
