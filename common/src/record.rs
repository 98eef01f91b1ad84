use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Placeholder written in place of a missing salary.
pub const SALARY_NOT_SPECIFIED: &str = "Salary not specified";

/// Placeholder shown in place of an empty description.
pub const DESCRIPTION_NOT_PROVIDED: &str = "Description not provided";

/// Minimum offered salary, or the "not specified" marker.
///
/// Persisted as a plain JSON number or as the sentinel string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Salary {
    Amount(u64),
    NotSpecified,
}

impl Salary {
    /// Treats zero and missing values as "not specified".
    pub fn from_optional(value: Option<u64>) -> Self {
        match value {
            Some(amount) if amount > 0 => Salary::Amount(amount),
            _ => Salary::NotSpecified,
        }
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Salary::Amount(amount) => write!(f, "{}", amount),
            Salary::NotSpecified => f.write_str(SALARY_NOT_SPECIFIED),
        }
    }
}

impl Serialize for Salary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Salary::Amount(amount) => serializer.serialize_u64(*amount),
            Salary::NotSpecified => serializer.serialize_str(SALARY_NOT_SPECIFIED),
        }
    }
}

struct SalaryVisitor;

impl<'de> Visitor<'de> for SalaryVisitor {
    type Value = Salary;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative number or a \"not specified\" string")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Salary, E> {
        Ok(Salary::Amount(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Salary, E> {
        u64::try_from(value)
            .map(Salary::Amount)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Salary, E> {
        if value.is_finite() && value >= 0.0 {
            Ok(Salary::Amount(value.round() as u64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }

    // Any text means the provider had no figure; older files may carry a
    // different sentinel wording.
    fn visit_str<E: de::Error>(self, _value: &str) -> Result<Salary, E> {
        Ok(Salary::NotSpecified)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Salary, E> {
        Ok(Salary::NotSpecified)
    }

    fn visit_none<E: de::Error>(self) -> Result<Salary, E> {
        Ok(Salary::NotSpecified)
    }
}

impl<'de> Deserialize<'de> for Salary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SalaryVisitor)
    }
}

/// A single job listing normalized from any provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VacancyRecord {
    pub title: String,
    pub link: String,
    pub salary: Salary,
    pub description: String,
}

impl VacancyRecord {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        salary: Salary,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            salary,
            description: description.into(),
        }
    }
}

impl fmt::Display for VacancyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = if self.description.is_empty() {
            DESCRIPTION_NOT_PROVIDED
        } else {
            &self.description
        };

        write!(
            f,
            "Title: {}\nLink: {}\nSalary: {}\nDescription: {}",
            self.title, self.link, self.salary, description
        )
    }
}
