use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[default]
    Unrated,
    Silver,
    Gold,
    Bad,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Unrated, Rating::Silver, Rating::Gold, Rating::Bad];

    pub fn next(self) -> Self {
        match self {
            Rating::Unrated => Rating::Silver,
            Rating::Silver => Rating::Gold,
            Rating::Gold => Rating::Bad,
            Rating::Bad => Rating::Unrated,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Unrated => "unrated",
            Rating::Silver => "silver",
            Rating::Gold => "gold",
            Rating::Bad => "bad",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Rating::Unrated => "Unrated",
            Rating::Silver => "Silver",
            Rating::Gold => "Gold",
            Rating::Bad => "Bad",
        }
    }

    /// Single-cell marker drawn in the rating column.
    pub fn glyph(self) -> &'static str {
        match self {
            Rating::Unrated => "○",
            Rating::Silver => "◐",
            Rating::Gold => "●",
            Rating::Bad => "✗",
        }
    }

    // Anything unrecognized reads as bad, same as the icon fallback.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "unrated" | "" => Rating::Unrated,
            "silver" => Rating::Silver,
            "gold" => Rating::Gold,
            _ => Rating::Bad,
        }
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Rating::parse_lossy(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_every_rating() {
        assert_eq!(Rating::Unrated.next(), Rating::Silver);
        assert_eq!(Rating::Silver.next(), Rating::Gold);
        assert_eq!(Rating::Gold.next(), Rating::Bad);
        assert_eq!(Rating::Bad.next(), Rating::Unrated);
    }

    #[test]
    fn four_cycles_return_to_start() {
        for start in Rating::ALL {
            let mut rating = start;
            for _ in 0..4 {
                rating = rating.next();
            }
            assert_eq!(rating, start);
        }
    }

    #[test]
    fn serializes_lowercase() {
        let raw = serde_json::to_string(&Rating::Gold).unwrap();
        assert_eq!(raw, "\"gold\"");
    }

    #[test]
    fn unknown_strings_read_as_bad() {
        let rating: Rating = serde_json::from_str("\"legendary\"").unwrap();
        assert_eq!(rating, Rating::Bad);
        let rating: Rating = serde_json::from_str("\"Silver\"").unwrap();
        assert_eq!(rating, Rating::Silver);
    }
}
