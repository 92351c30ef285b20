use chrono::{DateTime, NaiveDateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::Result;

const ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the secret keys the gateway generates itself.
pub const SECRET_KEY_LEN: usize = 40;

/// Random secret key of `size` ASCII letters and digits.
pub fn gen_secret_key(size: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

/// Random identifier of upper-case letters and digits, handy for user and
/// bucket names.
pub fn id_generator(size: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..size)
        .map(|_| char::from(ID_CHARS[rng.gen_range(0..ID_CHARS.len())]))
        .collect()
}

/// Parses timestamps in the format RADOS uses, e.g.
/// `2024-03-01T12:30:45.123456Z`.
pub fn parse_rados_datestring(s: &str) -> Result<DateTime<Utc>> {
    Ok(NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")?.and_utc())
}
