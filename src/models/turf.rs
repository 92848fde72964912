use serde::{Deserialize, Serialize};

use crate::models::slot::parse_hhmm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turf {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub price_per_hour: f64,
    pub currency: String,
    pub opening_time: String,
    pub closing_time: String,
    pub is_active: bool,
    pub sport_types: Vec<String>,
    pub facilities: Vec<String>,
}

impl Turf {
    /// Field-level checks shared by turf create and update.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow::anyhow!("turf name must not be empty"));
        }
        if self.price_per_hour <= 0.0 {
            return Err(anyhow::anyhow!("price_per_hour must be positive"));
        }
        if self.sport_types.is_empty() {
            return Err(anyhow::anyhow!("at least one sport type is required"));
        }
        let opening = parse_hhmm(&self.opening_time)?;
        let closing = parse_hhmm(&self.closing_time)?;
        if opening >= closing {
            return Err(anyhow::anyhow!(
                "opening_time must be before closing_time ({} >= {})",
                self.opening_time,
                self.closing_time
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turf() -> Turf {
        Turf {
            id: "t1".to_string(),
            name: "Greenfield Arena".to_string(),
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            price_per_hour: 1200.0,
            currency: "INR".to_string(),
            opening_time: "06:00".to_string(),
            closing_time: "22:00".to_string(),
            is_active: true,
            sport_types: vec!["football".to_string()],
            facilities: vec!["parking".to_string()],
        }
    }

    #[test]
    fn test_valid_turf() {
        assert!(turf().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_hours() {
        let mut t = turf();
        t.opening_time = "22:00".to_string();
        t.closing_time = "06:00".to_string();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_rejects_equal_hours() {
        let mut t = turf();
        t.closing_time = t.opening_time.clone();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_sport_types() {
        let mut t = turf();
        t.sport_types.clear();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_time_format() {
        let mut t = turf();
        t.opening_time = "6:00".to_string();
        assert!(t.validate().is_err());
    }
}
