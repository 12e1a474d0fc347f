//! RCI client: XML command envelopes over HTTP POST.
//!
//! Every operation wraps a single element in `<do_command target="..">` and
//! POSTs it with `Content-Type: text/xml`. A non-200 status is a hard
//! failure and surfaces the response body for diagnostics. Transport and
//! XML-structure errors propagate to the caller; retry policy lives in the
//! engine, not here.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rcibridge_core::ItemValue;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Typed value of a remote channel.
///
/// Produced fresh on every dump; channels have no local representation
/// beyond their name.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl ChannelValue {
    /// Integer view of the value, parsing textual digits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Boolean(_) => None,
        }
    }
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<ChannelValue> for ItemValue {
    fn from(value: ChannelValue) -> Self {
        match value {
            ChannelValue::Integer(v) => ItemValue::Integer(v),
            ChannelValue::Boolean(v) => ItemValue::Boolean(v),
            ChannelValue::Text(v) => ItemValue::Text(v),
        }
    }
}

impl From<&ItemValue> for ChannelValue {
    fn from(value: &ItemValue) -> Self {
        match value {
            ItemValue::Integer(v) => ChannelValue::Integer(*v),
            ItemValue::Boolean(v) => ChannelValue::Boolean(*v),
            ItemValue::Float(v) => ChannelValue::Text(v.to_string()),
            ItemValue::Text(v) => ChannelValue::Text(v.clone()),
        }
    }
}

/// RCI command surface the synchronization engine depends on.
#[async_trait]
pub trait RciCommands: Send + Sync {
    /// Dump every channel with its current value, keyed
    /// `"{device}.{channel}"`.
    async fn channel_dump(&self) -> GatewayResult<HashMap<String, ChannelValue>>;

    /// Ask the device to re-read one channel from hardware.
    async fn channel_refresh(&self, name: &str) -> GatewayResult<()>;

    /// Write a value to one channel.
    async fn channel_set(&self, name: &str, value: &ChannelValue) -> GatewayResult<()>;
}

/// HTTP implementation of [`RciCommands`].
pub struct RciClient {
    http: reqwest::Client,
    url: String,
    target: String,
    timeout: Duration,
}

impl RciClient {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            target: config.rci_target.clone(),
            timeout: config.http_timeout(),
        })
    }

    async fn post(&self, body: String) -> GatewayResult<String> {
        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "text/xml")
            .timeout(self.timeout)
            .body(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if status != 200 {
            debug!(status, body = %text, "error in HTTP request");
            return Err(GatewayError::Status { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait]
impl RciCommands for RciClient {
    async fn channel_dump(&self) -> GatewayResult<HashMap<String, ChannelValue>> {
        let body = self.post(build_dump(&self.target)).await?;
        parse_channel_dump(&body)
    }

    async fn channel_refresh(&self, name: &str) -> GatewayResult<()> {
        let body = self.post(build_refresh(&self.target, name)).await?;
        ensure_well_formed(&body)
    }

    async fn channel_set(&self, name: &str, value: &ChannelValue) -> GatewayResult<()> {
        let body = self
            .post(build_set(&self.target, name, &value.to_string()))
            .await?;
        ensure_well_formed(&body)
    }
}

fn envelope(target: &str, op: &str) -> String {
    format!("<do_command target=\"{}\">{}</do_command>", escape(target), op)
}

pub(crate) fn build_dump(target: &str) -> String {
    envelope(target, "<channel_dump/>")
}

pub(crate) fn build_refresh(target: &str, name: &str) -> String {
    envelope(target, &format!("<channel_refresh name=\"{}\"/>", escape(name)))
}

pub(crate) fn build_set(target: &str, name: &str, value: &str) -> String {
    envelope(
        target,
        &format!(
            "<channel_set name=\"{}\" value=\"{}\"/>",
            escape(name),
            escape(value)
        ),
    )
}

fn attr_value(element: &BytesStart<'_>, name: &str) -> GatewayResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parse a channel_dump response into a `"{device}.{channel}"` → value map.
///
/// Entries whose declared integer type fails to parse are dropped, not
/// fatal; the rest of the dump still goes through.
pub(crate) fn parse_channel_dump(xml: &str) -> GatewayResult<HashMap<String, ChannelValue>> {
    let mut reader = Reader::from_str(xml);
    let mut channels = HashMap::new();
    let mut device: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"device" => {
                device = attr_value(&e, "name")?;
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"device" => {
                device = None;
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"channel" => {
                let Some(device) = device.as_deref() else {
                    continue;
                };
                let name = attr_value(&e, "name")?.ok_or_else(|| {
                    GatewayError::MalformedResponse("channel element without name".into())
                })?;
                let name = format!("{}.{}", device, name);
                let raw = attr_value(&e, "value")?.unwrap_or_default();
                let kind = attr_value(&e, "type")?.unwrap_or_default();
                let value = match kind.as_str() {
                    "int" | "long" => match raw.parse::<i64>() {
                        Ok(v) => ChannelValue::Integer(v),
                        Err(e) => {
                            debug!(channel = %name, error = %e, "ignored channel, cannot parse value");
                            continue;
                        }
                    },
                    "Boolean" => ChannelValue::Boolean(raw.eq_ignore_ascii_case("true")),
                    _ => ChannelValue::Text(raw),
                };
                channels.insert(name, value);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(GatewayError::MalformedResponse(e.to_string())),
        }
    }
    Ok(channels)
}

/// Validate that an acknowledgement body is well-formed XML. Nothing else is
/// consumed from refresh/set responses.
pub(crate) fn ensure_well_formed(xml: &str) -> GatewayResult<()> {
    let mut reader = Reader::from_str(xml);
    let mut seen_element = false;
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => {
                if seen_element {
                    return Ok(());
                }
                return Err(GatewayError::MalformedResponse(
                    "response contains no XML element".into(),
                ));
            }
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) => seen_element = true,
            Ok(_) => {}
            Err(e) => return Err(GatewayError::MalformedResponse(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_envelopes() {
        assert_eq!(
            build_dump("idigi_dia"),
            r#"<do_command target="idigi_dia"><channel_dump/></do_command>"#
        );
        assert_eq!(
            build_refresh("idigi_dia", "spa.temp"),
            r#"<do_command target="idigi_dia"><channel_refresh name="spa.temp"/></do_command>"#
        );
        assert_eq!(
            build_set("idigi_dia", "spa.set_temp", "65281"),
            r#"<do_command target="idigi_dia"><channel_set name="spa.set_temp" value="65281"/></do_command>"#
        );
    }

    #[test]
    fn envelope_escapes_attribute_values() {
        let cmd = build_set("t", "a<b", "x\"y");
        assert!(cmd.contains("name=\"a&lt;b\""));
        assert!(cmd.contains("value=\"x&quot;y\""));
    }

    #[test]
    fn dump_parses_typed_values() {
        let xml = r#"<rci_reply>
            <do_command target="idigi_dia">
                <device name="spa">
                    <channel name="temp" value="100F" type="string"/>
                    <channel name="pump_speed" value="2" type="int"/>
                    <channel name="uptime" value="12345" type="long"/>
                    <channel name="heater" value="True" type="Boolean"/>
                </device>
            </do_command>
        </rci_reply>"#;
        let channels = parse_channel_dump(xml).unwrap();
        assert_eq!(
            channels.get("spa.temp"),
            Some(&ChannelValue::Text("100F".into()))
        );
        assert_eq!(
            channels.get("spa.pump_speed"),
            Some(&ChannelValue::Integer(2))
        );
        assert_eq!(channels.get("spa.uptime"), Some(&ChannelValue::Integer(12345)));
        assert_eq!(channels.get("spa.heater"), Some(&ChannelValue::Boolean(true)));
        assert_eq!(channels.len(), 4);
    }

    #[test]
    fn dump_drops_unparseable_integers() {
        let xml = r#"<resp><device name="spa">
            <channel name="bad" value="oops" type="int"/>
            <channel name="good" value="7" type="int"/>
        </device></resp>"#;
        let channels = parse_channel_dump(xml).unwrap();
        assert!(!channels.contains_key("spa.bad"));
        assert_eq!(channels.get("spa.good"), Some(&ChannelValue::Integer(7)));
    }

    #[test]
    fn dump_handles_multiple_devices() {
        let xml = r#"<resp>
            <device name="spa"><channel name="temp" value="100F" type="string"/></device>
            <device name="pool"><channel name="temp" value="80F" type="string"/></device>
        </resp>"#;
        let channels = parse_channel_dump(xml).unwrap();
        assert_eq!(channels.len(), 2);
        assert!(channels.contains_key("spa.temp"));
        assert!(channels.contains_key("pool.temp"));
    }

    #[test]
    fn boolean_comparison_is_case_insensitive() {
        let xml = r#"<r><device name="d">
            <channel name="a" value="TRUE" type="Boolean"/>
            <channel name="b" value="false" type="Boolean"/>
            <channel name="c" value="1" type="Boolean"/>
        </device></r>"#;
        let channels = parse_channel_dump(xml).unwrap();
        assert_eq!(channels.get("d.a"), Some(&ChannelValue::Boolean(true)));
        assert_eq!(channels.get("d.b"), Some(&ChannelValue::Boolean(false)));
        assert_eq!(channels.get("d.c"), Some(&ChannelValue::Boolean(false)));
    }

    #[test]
    fn truncated_response_is_rejected() {
        assert!(ensure_well_formed("<rci_reply><ok/></rci_reply>").is_ok());
        assert!(ensure_well_formed("<rci_reply><ok/>").is_err());
        assert!(ensure_well_formed("").is_err());
        assert!(ensure_well_formed("not xml at all").is_err());
        assert!(parse_channel_dump("<resp><device name=").is_err());
    }

    #[test]
    fn channel_value_display_is_wire_form() {
        assert_eq!(ChannelValue::Integer(65281).to_string(), "65281");
        assert_eq!(ChannelValue::Boolean(true).to_string(), "true");
        assert_eq!(ChannelValue::Text("100F".into()).to_string(), "100F");
    }
}
