//! Value transcoding between channel wire values and item values.
//!
//! Transcoders are plain functions resolved by name once at item
//! registration. A decoder may return `None` to suppress the item update for
//! a polled value; an encoder returns the wire values to write, one element
//! per discrete channel_set command.

pub mod decoders;
pub mod encoders;

use crate::error::GatewayResult;
use crate::rci::ChannelValue;
use rcibridge_core::ItemValue;

/// Read access to the item a transcoder is working on.
#[derive(Debug, Clone, Default)]
pub struct ItemReading {
    /// Current item value.
    pub current: Option<ItemValue>,
    /// Value the item held before its most recent update.
    pub previous: Option<ItemValue>,
}

/// Converts a polled channel value into an item value, or `None` to leave
/// the item untouched.
pub type Decoder = fn(&ChannelValue, &ItemReading) -> GatewayResult<Option<ItemValue>>;

/// Converts an item value into the sequence of wire values to write.
pub type Encoder = fn(&ItemValue, &ItemReading) -> GatewayResult<Vec<ChannelValue>>;

/// Look up a decoder by name.
pub fn decoder(name: &str) -> Option<Decoder> {
    match name {
        "watkins_temp_f_to_c" => Some(decoders::watkins_temp_f_to_c as Decoder),
        "watkins_pump_speed" => Some(decoders::watkins_pump_speed as Decoder),
        "watkins_all_lights_on" => Some(decoders::watkins_all_lights_on as Decoder),
        _ => None,
    }
}

/// Look up an encoder by name.
pub fn encoder(name: &str) -> Option<Encoder> {
    match name {
        "watkins_set_temp_relative" => Some(encoders::watkins_set_temp_relative as Encoder),
        "watkins_step_temp_relative" => Some(encoders::watkins_step_temp_relative as Encoder),
        "watkins_set_all_lights" => Some(encoders::watkins_set_all_lights as Encoder),
        _ => None,
    }
}

/// Names of all registered decoders.
pub fn available_decoders() -> &'static [&'static str] {
    &[
        "watkins_temp_f_to_c",
        "watkins_pump_speed",
        "watkins_all_lights_on",
    ]
}

/// Names of all registered encoders.
pub fn available_encoders() -> &'static [&'static str] {
    &[
        "watkins_set_temp_relative",
        "watkins_step_temp_relative",
        "watkins_set_all_lights",
    ]
}
