//! The one timestamp encoding used on both sides of every conversion.
//!
//! RFC 3339 with an explicit offset. UTC is written as `Z`; other offsets are
//! kept as written. Fractional seconds are emitted only when non-zero, with as
//! many digits as needed (3, 6 or 9). Naive datetimes, bare times and
//! locale-dependent formats are rejected on input.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use {
    chrono::{DateTime, FixedOffset, SecondsFormat, Utc},
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
};

/// Two timestamps are equal only if they name the same instant with the same
/// offset. Ordering is by instant first.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().fixed_offset())
    }

    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }

    /// Canonical text form.
    #[must_use]
    pub fn encode(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn key(&self) -> (DateTime<Utc>, i32) {
        (self.to_utc(), self.0.offset().local_minus_utc())
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(Self)
            .map_err(|e| format!("timestamp {s:?} is not RFC 3339 with an explicit offset: {e}"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an RFC 3339 timestamp string with an explicit offset")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Timestamp, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("2025-06-01T12:30:00Z")]
    #[case("2025-06-01T12:30:00.250Z")]
    #[case("2025-06-01T12:30:00.123456789Z")]
    #[case("2025-06-01T14:30:00+02:00")]
    #[case("2025-06-01T07:00:00-05:30")]
    fn canonical_text_is_stable(#[case] text: &str) {
        let ts: Timestamp = text.parse().unwrap();
        assert_eq!(ts.encode(), text);
    }

    #[test]
    fn utc_offset_is_written_as_z() {
        let ts: Timestamp = "2025-06-01T12:30:00+00:00".parse().unwrap();
        assert_eq!(ts.encode(), "2025-06-01T12:30:00Z");
    }

    #[rstest]
    #[case("2025-06-01T12:30:00")]
    #[case("12:30:00")]
    #[case("June 1st")]
    fn rejects_offsetless_forms(#[case] text: &str) {
        assert!(text.parse::<Timestamp>().is_err());
    }

    #[test]
    fn equality_keeps_the_offset() {
        let local: Timestamp = "2025-06-01T14:30:00+02:00".parse().unwrap();
        let utc: Timestamp = "2025-06-01T12:30:00Z".parse().unwrap();
        assert_eq!(local.to_utc(), utc.to_utc());
        assert_ne!(local, utc);
        assert_eq!(local, "2025-06-01T14:30:00+02:00".parse::<Timestamp>().unwrap());
    }

    #[test]
    fn orders_by_instant() {
        let a: Timestamp = "2025-06-01T12:00:00+02:00".parse().unwrap();
        let b: Timestamp = "2025-06-01T11:00:00Z".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn now_survives_serde() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
        assert_eq!(back.encode(), ts.encode());
    }
}
