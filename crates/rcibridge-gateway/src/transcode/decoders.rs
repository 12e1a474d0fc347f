//! Decoders: channel wire value → item value.

use super::ItemReading;
use crate::error::{GatewayError, GatewayResult};
use crate::rci::ChannelValue;
use rcibridge_core::ItemValue;

/// Decode a Watkins temperature reading in whole Fahrenheit degrees into
/// half-degree Celsius.
///
/// The reading arrives either numeric or as a string with an `F` suffix
/// (`"100F"`); any other string is an error.
///
/// The unit reports whole Fahrenheit degrees while items track half Celsius
/// degrees, so the conversion would oscillate: an item set to 37.5°C reads
/// back as 100°F, which converts to 38.0°C, which would overwrite the item.
/// If the fresh reading equals what the current item value reports as in
/// Fahrenheit, `None` is returned and the item is left alone.
pub fn watkins_temp_f_to_c(
    value: &ChannelValue,
    item: &ItemReading,
) -> GatewayResult<Option<ItemValue>> {
    let fahrenheit = match value {
        ChannelValue::Integer(v) => *v as f64,
        ChannelValue::Text(s) => {
            let digits = s
                .strip_suffix('F')
                .ok_or_else(|| GatewayError::Decode(format!("cannot decode value: {}", s)))?;
            digits
                .parse::<i64>()
                .map_err(|_| GatewayError::Decode(format!("cannot decode value: {}", s)))?
                as f64
        }
        ChannelValue::Boolean(_) => {
            return Err(GatewayError::Decode("temperature cannot be boolean".into()));
        }
    };

    let current = item
        .current
        .as_ref()
        .and_then(|v| v.as_f64())
        .ok_or(GatewayError::MissingValue)?;
    if (current * 1.8 + 32.0).round() == fahrenheit {
        return Ok(None);
    }

    let celsius = ((fahrenheit - 32.0) / 1.8 / 0.5).round() * 0.5;
    Ok(Some(ItemValue::Float(celsius)))
}

/// Decode a pump speed level. The wire counts from zero, the item from one.
pub fn watkins_pump_speed(
    value: &ChannelValue,
    _item: &ItemReading,
) -> GatewayResult<Option<ItemValue>> {
    let level = value
        .as_i64()
        .ok_or_else(|| GatewayError::Decode(format!("cannot decode value: {}", value)))?;
    Ok(Some(ItemValue::Integer(level + 1)))
}

/// Decode the lights-on counter: any positive count means on.
pub fn watkins_all_lights_on(
    value: &ChannelValue,
    _item: &ItemReading,
) -> GatewayResult<Option<ItemValue>> {
    let count = value
        .as_i64()
        .ok_or_else(|| GatewayError::Decode(format!("cannot decode value: {}", value)))?;
    Ok(Some(ItemValue::Boolean(count > 0)))
}
