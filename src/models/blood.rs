use super::InvalidValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BloodType {
    A,
    B,
    AB,
    O,
}

impl BloodType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::AB => "AB",
            Self::O => "O",
        }
    }
}

impl FromStr for BloodType {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "AB" => Ok(Self::AB),
            "O" => Ok(Self::O),
            other => Err(InvalidValue {
                field: "blood_type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Rhesus {
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

impl Rhesus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "+",
            Self::Negative => "-",
        }
    }
}

impl FromStr for Rhesus {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "+" => Ok(Self::Positive),
            "-" => Ok(Self::Negative),
            other => Err(InvalidValue {
                field: "rhesus",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_blood_type_and_rhesus() {
        assert_eq!("AB".parse::<BloodType>(), Ok(BloodType::AB));
        assert!("ab".parse::<BloodType>().is_err());
        assert_eq!("-".parse::<Rhesus>(), Ok(Rhesus::Negative));
        assert!("neg".parse::<Rhesus>().is_err());
        assert_eq!(serde_json::to_string(&Rhesus::Positive).unwrap(), "\"+\"");
    }
}
