//! Encoders: item value → channel wire values.
//!
//! The Watkins unit takes target-temperature adjustments as a 16-bit word in
//! big-endian: high byte 0xFF, low byte the two's complement of the signed
//! step count in half degrees. -5 steps is 0xFFFB (65531), +5 is 0xFF05
//! (65285). Lighting state uses high byte 0x04 and low byte 0x10/0x11 for
//! off/on; the meaning of those bytes beyond that is unknown, so they are
//! reproduced exactly.

use super::ItemReading;
use crate::error::{GatewayError, GatewayResult};
use crate::rci::ChannelValue;
use rcibridge_core::ItemValue;
use tracing::debug;

/// Accepted target temperature range of the unit, degrees Celsius.
const TEMP_BOUNDS: (f64, f64) = (26.0, 40.0);

/// +1 half-degree step word.
const STEP_UP: u16 = u16::from_be_bytes([0xff, 0x01]);
/// -1 half-degree step word.
const STEP_DOWN: u16 = u16::from_be_bytes([0xff, 0xff]);

fn checked_temperature(value: &ItemValue) -> GatewayResult<f64> {
    let new = value
        .as_f64()
        .ok_or_else(|| GatewayError::Encode(format!("temperature must be numeric: {}", value)))?;
    if !(TEMP_BOUNDS.0..=TEMP_BOUNDS.1).contains(&new) {
        return Err(GatewayError::OutOfBounds {
            value: new,
            min: TEMP_BOUNDS.0,
            max: TEMP_BOUNDS.1,
        });
    }
    Ok(new)
}

fn previous_temperature(item: &ItemReading) -> GatewayResult<f64> {
    item.previous
        .as_ref()
        .and_then(|v| v.as_f64())
        .ok_or(GatewayError::MissingPrevious)
}

/// Encode a target temperature as one relative adjustment word.
///
/// The step count is `(new - previous) / 0.5`, bounds-checked against the
/// unit's accepted range before anything is computed.
pub fn watkins_set_temp_relative(
    value: &ItemValue,
    item: &ItemReading,
) -> GatewayResult<Vec<ChannelValue>> {
    let new = checked_temperature(value)?;
    let prev = previous_temperature(item)?;
    let adjust = ((new - prev) / 0.5) as i64;
    debug!(prev, new, adjust, "relative temperature adjustment");

    let adjust = i8::try_from(adjust)
        .map_err(|_| GatewayError::Encode(format!("adjustment {} does not fit one word", adjust)))?;
    let word = u16::from_be_bytes([0xff, adjust as u8]);
    Ok(vec![ChannelValue::Integer(word as i64)])
}

/// Encode a target temperature as a run of single-step adjustment words.
///
/// Variant of [`watkins_set_temp_relative`] for firmware revisions that only
/// accept one step per command: the delta is computed in whole Fahrenheit
/// degrees and emitted as that many repetitions of the +1 or -1 word.
pub fn watkins_step_temp_relative(
    value: &ItemValue,
    item: &ItemReading,
) -> GatewayResult<Vec<ChannelValue>> {
    let new = checked_temperature(value)?;
    let prev = previous_temperature(item)?;
    let adjust = (new * 1.8 + 32.0).round() as i64 - (prev * 1.8 + 32.0).round() as i64;
    debug!(prev, new, adjust, "stepwise temperature adjustment");

    let word = if adjust >= 0 { STEP_UP } else { STEP_DOWN };
    Ok(vec![
        ChannelValue::Integer(word as i64);
        adjust.unsigned_abs() as usize
    ])
}

/// Encode the all-lights switch.
///
/// 0x0411 switches on, 0x0410 switches off.
pub fn watkins_set_all_lights(
    value: &ItemValue,
    _item: &ItemReading,
) -> GatewayResult<Vec<ChannelValue>> {
    let on = match value {
        ItemValue::Boolean(v) => *v,
        ItemValue::Integer(v) => *v != 0,
        other => {
            return Err(GatewayError::Encode(format!(
                "lighting state must be boolean: {}",
                other
            )));
        }
    };
    let word = u16::from_be_bytes([0x04, 0x10 + u8::from(on)]);
    Ok(vec![ChannelValue::Integer(word as i64)])
}
