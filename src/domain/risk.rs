//! Stop-loss derivation.
//!
//! Stateless: invoked once at position open, holds nothing across
//! positions.

/// Stop boundary for a long entry: `entry_price * (1 - stop_pct)`.
///
/// A `stop_pct` of 0 (or less) disables the stop; the returned 0.0
/// sentinel never triggers [`Position::stop_hit`](super::position::Position::stop_hit).
pub fn stop_price(entry_price: f64, stop_pct: f64) -> f64 {
    if stop_pct > 0.0 {
        entry_price * (1.0 - stop_pct)
    } else {
        0.0
    }
}
