//! Final-step rounding of net pay.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};

/// Rounds `net` to whole minor units, half up on its magnitude with the
/// sign reapplied: `sign(net) * round_half_up(|net|)`.
///
/// A negative net cannot come out of a valid payslip, but it rounds
/// symmetrically rather than failing.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_net;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_net(Decimal::new(25, 1)).unwrap(), 3);
/// assert_eq!(round_net(Decimal::new(-25, 1)).unwrap(), -3);
/// assert_eq!(round_net(Decimal::new(249, 2)).unwrap(), 2);
/// ```
pub fn round_net(net: Decimal) -> EngineResult<i64> {
    let magnitude = net
        .abs()
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let signed = if net.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    };

    signed.to_i64().ok_or_else(|| {
        EngineError::validation(format!(
            "net {} does not fit in minor units",
            net.normalize()
        ))
    })
}
