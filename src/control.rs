//! Remote control via MQTT
//!
//! Connects to an MQTT broker and subscribes to a topic. JSON messages tune
//! atmosphere/wave/burst parameters or trigger a firework, and are forwarded
//! to the main loop where they are applied at a frame boundary.

use log::warn;
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "seafire";

/// Partial update for the atmosphere parameters; absent fields keep their
/// current value
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SkyPatch {
    pub turbidity: Option<f32>,
    pub rayleigh: Option<f32>,
    pub mie_coefficient: Option<f32>,
    pub mie_directional_g: Option<f32>,
    pub elevation: Option<f32>,
    pub azimuth: Option<f32>,
    pub exposure: Option<f32>,
}

impl SkyPatch {
    pub fn apply(&self, params: &mut crate::sky::SkyParams) {
        if let Some(v) = self.turbidity {
            params.turbidity = v;
        }
        if let Some(v) = self.rayleigh {
            params.rayleigh = v;
        }
        if let Some(v) = self.mie_coefficient {
            params.mie_coefficient = v;
        }
        if let Some(v) = self.mie_directional_g {
            params.mie_directional_g = v;
        }
        if let Some(v) = self.elevation {
            params.elevation = v;
        }
        if let Some(v) = self.azimuth {
            params.azimuth = v;
        }
        if let Some(v) = self.exposure {
            params.exposure = v;
        }
    }
}

/// Partial update for the wave parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WavePatch {
    pub big_elevation: Option<f32>,
    pub big_frequency_x: Option<f32>,
    pub big_frequency_y: Option<f32>,
    pub big_speed: Option<f32>,
    pub small_elevation: Option<f32>,
    pub small_frequency: Option<f32>,
    pub small_speed: Option<f32>,
    pub small_iterations: Option<u32>,
    pub depth_color: Option<(u8, u8, u8)>,
    pub surface_color: Option<(u8, u8, u8)>,
    pub color_offset: Option<f32>,
    pub color_multiplier: Option<f32>,
}

impl WavePatch {
    pub fn apply(&self, params: &mut crate::water::WaveParams) {
        if let Some(v) = self.big_elevation {
            params.big_elevation = v;
        }
        if let Some(v) = self.big_frequency_x {
            params.big_frequency_x = v;
        }
        if let Some(v) = self.big_frequency_y {
            params.big_frequency_y = v;
        }
        if let Some(v) = self.big_speed {
            params.big_speed = v;
        }
        if let Some(v) = self.small_elevation {
            params.small_elevation = v;
        }
        if let Some(v) = self.small_frequency {
            params.small_frequency = v;
        }
        if let Some(v) = self.small_speed {
            params.small_speed = v;
        }
        if let Some(v) = self.small_iterations {
            params.small_iterations = v;
        }
        if let Some(v) = self.depth_color {
            params.depth_color = v;
        }
        if let Some(v) = self.surface_color {
            params.surface_color = v;
        }
        if let Some(v) = self.color_offset {
            params.color_offset = v;
        }
        if let Some(v) = self.color_multiplier {
            params.color_multiplier = v;
        }
    }
}

/// Partial update for the burst tuning
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BurstPatch {
    pub count_min: Option<u32>,
    pub count_span: Option<u32>,
    pub click_depth: Option<f32>,
    pub click_extent: Option<f32>,
}

impl BurstPatch {
    pub fn apply(&self, tuning: &mut crate::fireworks::BurstTuning) {
        if let Some(v) = self.count_min {
            tuning.count_min = v;
        }
        if let Some(v) = self.count_span {
            tuning.count_span = v;
        }
        if let Some(v) = self.click_depth {
            tuning.click_depth = v;
        }
        if let Some(v) = self.click_extent {
            tuning.click_extent = v;
        }
    }
}

/// Commands accepted over the control topic
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Trigger a firework; x/y are optional normalized screen coordinates
    Burst {
        #[serde(default)]
        x: Option<f32>,
        #[serde(default)]
        y: Option<f32>,
    },
    /// Patch atmosphere parameters
    Sky {
        #[serde(flatten)]
        patch: SkyPatch,
    },
    /// Patch wave parameters
    Water {
        #[serde(flatten)]
        patch: WavePatch,
    },
    /// Patch burst tuning
    Bursts {
        #[serde(flatten)]
        patch: BurstPatch,
    },
}

/// MQTT client that receives control messages in a background thread
pub struct Controller {
    receiver: Receiver<ControlMessage>,
    _thread: thread::JoinHandle<()>,
}

impl Controller {
    /// Create a new controller and connect to the broker.
    /// Fails immediately if connection cannot be established.
    pub fn new(host: &str, topic: &str) -> Result<Self, String> {
        let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };

        let mut options = MqttOptions::new("seafire", host, DEFAULT_PORT);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);

        client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| format!("Failed to subscribe to topic '{}': {}", topic, e))?;

        // Test connection by polling once - fail fast if broker unreachable
        match connection.iter().next() {
            Some(Ok(_)) => {},
            Some(Err(e)) => {
                return Err(format!(
                    "Failed to connect to MQTT broker at {}:{} - {}",
                    host, DEFAULT_PORT, e
                ));
            },
            None => {
                return Err(format!(
                    "Failed to connect to MQTT broker at {}:{} - connection closed",
                    host, DEFAULT_PORT
                ));
            },
        }

        let (sender, receiver) = mpsc::channel();
        let topic_owned = topic.to_string();

        let handle = thread::spawn(move || {
            Self::message_loop(connection, sender, &topic_owned);
        });

        log::info!(
            "control: connected to {}:{}, subscribed to '{}'",
            host,
            DEFAULT_PORT,
            topic
        );

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn message_loop(
        mut connection: rumqttc::Connection,
        sender: Sender<ControlMessage>,
        topic: &str,
    ) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if publish.topic != topic {
                        continue;
                    }
                    match serde_json::from_slice::<ControlMessage>(&publish.payload) {
                        Ok(msg) => {
                            if sender.send(msg).is_err() {
                                // Main thread gone, exit
                                break;
                            }
                        },
                        Err(e) => warn!("control: unparseable message: {}", e),
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    warn!("control: mqtt error: {}", e);
                    // Keep iterating - the connection may recover
                },
            }
        }
    }

    /// Drain all pending messages (non-blocking). Commands are applied in
    /// arrival order by the caller.
    pub fn poll(&self) -> Vec<ControlMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sky::SkyParams;
    use crate::water::WaveParams;

    #[test]
    fn test_parse_burst_with_position() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"cmd":"burst","x":0.25,"y":0.5}"#).unwrap();
        match msg {
            ControlMessage::Burst { x, y } => {
                assert_eq!(x, Some(0.25));
                assert_eq!(y, Some(0.5));
            },
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bare_burst() {
        let msg: ControlMessage = serde_json::from_str(r#"{"cmd":"burst"}"#).unwrap();
        assert!(matches!(msg, ControlMessage::Burst { x: None, y: None }));
    }

    #[test]
    fn test_sky_patch_applies_partially() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"cmd":"sky","elevation":10.0,"turbidity":4.5}"#).unwrap();
        let ControlMessage::Sky { patch } = msg else {
            panic!("wrong variant");
        };
        let mut params = SkyParams::default();
        let old_azimuth = params.azimuth;
        patch.apply(&mut params);
        assert_eq!(params.elevation, 10.0);
        assert_eq!(params.turbidity, 4.5);
        assert_eq!(params.azimuth, old_azimuth);
    }

    #[test]
    fn test_water_patch_with_color() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"cmd":"water","depth_color":[0,30,60],"small_iterations":5}"#)
                .unwrap();
        let ControlMessage::Water { patch } = msg else {
            panic!("wrong variant");
        };
        let mut params = WaveParams::default();
        patch.apply(&mut params);
        assert_eq!(params.depth_color, (0, 30, 60));
        assert_eq!(params.small_iterations, 5);
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(serde_json::from_str::<ControlMessage>(r#"{"cmd":"reboot"}"#).is_err());
    }
}
