use std::str::FromStr;

use chrono::NaiveDate;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Membership {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Bronze => "BRONZE",
            Membership::Silver => "SILVER",
            Membership::Gold => "GOLD",
        }
    }
}

impl FromStr for Membership {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BRONZE" | "B" => Ok(Membership::Bronze),
            "SILVER" | "S" => Ok(Membership::Silver),
            "GOLD" | "G" => Ok(Membership::Gold),
            _ => Err(DomainError::validation(format!("unknown membership '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct CustomerView {
    pub id: i64,
    pub user_id: i64,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
    pub address: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct CustomerUpdate {
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
    pub address: Option<Address>,
}

impl CustomerUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.phone.chars().count() > 255 {
            return Err(DomainError::validation("phone is longer than 255 characters"));
        }
        if let Some(address) = &self.address {
            if address.street.trim().is_empty() || address.city.trim().is_empty() {
                return Err(DomainError::validation("address needs a street and a city"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_accepts_short_codes() {
        assert_eq!("g".parse::<Membership>().unwrap(), Membership::Gold);
        assert_eq!("Silver".parse::<Membership>().unwrap(), Membership::Silver);
        assert!("platinum".parse::<Membership>().is_err());
    }

    #[test]
    fn default_membership_is_bronze() {
        assert_eq!(Membership::default().as_str(), "BRONZE");
    }

    #[test]
    fn address_requires_street_and_city() {
        let update = CustomerUpdate {
            phone: String::new(),
            birth_date: None,
            membership: Membership::Bronze,
            address: Some(Address {
                street: "1 Main St".to_string(),
                city: " ".to_string(),
            }),
        };
        assert!(update.validate().is_err());
    }
}
