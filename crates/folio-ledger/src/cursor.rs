//! Opaque pagination cursors.
//!
//! A cursor encodes the `(timestamp, id)` sort key of the last item on a
//! page. Tokens are positional rather than snapshots: rows appearing or
//! vanishing behind the cursor shift nothing, and a scan resumes strictly
//! after the encoded key.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{LedgerError, Result};

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Hard ceiling on page size.
pub const MAX_PAGE_SIZE: usize = 200;

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_limit(requested: Option<usize>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(n) => n.min(MAX_PAGE_SIZE),
    }
}

/// Resume position of a paginated scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub ts: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(ts: DateTime<Utc>, id: Uuid) -> Self {
        Self { ts, id }
    }

    /// Encode as an opaque token: hex over `<rfc3339>|<uuid>`.
    pub fn encode(&self) -> String {
        let raw = format!(
            "{}|{}",
            self.ts.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.id
        );
        hex::encode(raw.as_bytes())
    }

    /// Decode a token produced by [`Cursor::encode`].
    pub fn decode(token: &str) -> Result<Self> {
        let bytes =
            hex::decode(token).map_err(|_| LedgerError::invalid("malformed cursor token"))?;
        let raw =
            String::from_utf8(bytes).map_err(|_| LedgerError::invalid("malformed cursor token"))?;
        let (ts_part, id_part) = raw
            .split_once('|')
            .ok_or_else(|| LedgerError::invalid("malformed cursor token"))?;
        let ts = DateTime::parse_from_rfc3339(ts_part)
            .map_err(|_| LedgerError::invalid("malformed cursor timestamp"))?
            .with_timezone(&Utc);
        let id = id_part
            .parse::<Uuid>()
            .map_err(|_| LedgerError::invalid("malformed cursor id"))?;
        Ok(Self { ts, id })
    }
}

/// Index of the first record strictly after `after` in a slice sorted
/// ascending by `key`.
///
/// `key` must be the slice's full sort key, otherwise the binary search can
/// land inside a run of equal prefixes. When no record follows the cursor,
/// returns `records.len()`.
pub fn resume_after<T, K, F>(records: &[T], after: &K, key: F) -> usize
where
    K: Ord,
    F: Fn(&T) -> K,
{
    records.partition_point(|r| key(r) <= *after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let cursor = Cursor::new(
            Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap(),
            Uuid::now_v7(),
        );
        let token = cursor.encode();
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn token_is_opaque_hex() {
        let token = Cursor::new(ts(0), Uuid::nil()).encode();
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn decode_rejects_garbage() {
        for token in ["zzzz", "00", &hex::encode("no-separator"), ""] {
            let err = Cursor::decode(token).unwrap_err();
            assert!(matches!(err, LedgerError::Invalid { .. }), "{token:?}");
        }
    }

    #[test]
    fn decode_rejects_bad_parts() {
        let bad_ts = hex::encode(format!("not-a-date|{}", Uuid::nil()));
        assert!(Cursor::decode(&bad_ts).is_err());
        let bad_id = hex::encode("2024-01-01T00:00:00Z|not-a-uuid");
        assert!(Cursor::decode(&bad_id).is_err());
    }

    #[test]
    fn resume_after_lands_past_exact_match() {
        let records: Vec<(DateTime<Utc>, Uuid)> = (0..5)
            .map(|i| (ts(i), Uuid::from_u128(i as u128 + 1)))
            .collect();
        let after = records[2];
        assert_eq!(resume_after(&records, &after, |r| *r), 3);
    }

    #[test]
    fn resume_after_skips_vanished_anchor() {
        let mut records: Vec<(DateTime<Utc>, Uuid)> = (0..5)
            .map(|i| (ts(i), Uuid::from_u128(i as u128 + 1)))
            .collect();
        let after = records.remove(2);
        // anchor gone: resume lands on the first strictly later key
        assert_eq!(resume_after(&records, &after, |r| *r), 2);
        assert!(records[2].0 > after.0);
    }

    #[test]
    fn resume_after_end_of_data() {
        let records: Vec<(DateTime<Utc>, Uuid)> =
            vec![(ts(1), Uuid::from_u128(1)), (ts(2), Uuid::from_u128(2))];
        let after = (ts(9), Uuid::from_u128(9));
        assert_eq!(resume_after(&records, &after, |r| *r), records.len());
    }
}
