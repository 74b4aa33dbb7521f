//! Generated identifiers (structure codes, trigger ids).

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

fn suffix<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// `STR-XXXXXX`, upper-case so it is already a normalized code.
pub fn structure_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("STR-{}", suffix(rng, 6).to_uppercase())
}

/// `trigger_<unix millis>_<9 lowercase alphanumerics>`.
pub fn trigger_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "trigger_{}_{}",
        Utc::now().timestamp_millis(),
        suffix(rng, 9).to_lowercase()
    )
}
