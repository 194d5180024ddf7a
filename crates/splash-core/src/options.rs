//! Host options given as `key=value` pairs.
//!
//! The web host reads them from the page's query string, the native host
//! from its command line. Malformed values are logged and replaced with the
//! default; parsing never fails.

use crate::constants::{DEFAULT_IDLE_TIMEOUT_SECS, MAX_SPLAT_BATCH, MIDI_MAX_VALUE};
use crate::midi::{ChannelMask, VelocityMap};

#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    pub channel_mask: ChannelMask,
    /// MIDI input port to open (native host).
    pub port_name: Option<String>,
    pub velocity_map: VelocityMap,
    pub pause_parameter_animation: bool,
    /// Seconds without pointer or keyboard input before pausing.
    pub idle_timeout: f64,
    /// Maximum splats per draw call.
    pub splat_group_size: usize,
    /// JSON file overlaying `SimConfig` (native host).
    pub config_path: Option<String>,
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            channel_mask: ChannelMask::ALL,
            port_name: None,
            velocity_map: VelocityMap::default(),
            pause_parameter_animation: false,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS as f64,
            splat_group_size: MAX_SPLAT_BATCH,
            config_path: None,
            seed: None,
        }
    }
}

impl Options {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key.as_ref(), value.as_ref());
        }
        options
    }

    /// Arguments of the form `key=value`; a bare `key` is a flag.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        Self::from_pairs(args.into_iter().map(|arg| match arg.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (arg, String::new()),
        }))
    }

    pub fn set(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key {
            "midiChannelMask" => self.channel_mask = ChannelMask::parse_or_default(value),
            "midiPortName" => {
                self.port_name = (!value.is_empty()).then(|| value.to_string());
            }
            "midiVelocityOffset" => {
                self.velocity_map.offset = parse_or(key, value, 0.0, |v: f32| {
                    (0.0..=MIDI_MAX_VALUE).contains(&v)
                });
            }
            "midiVelocityFactor" => {
                self.velocity_map.factor = parse_or(key, value, 1.0, |v: f32| v > 0.0 && v.is_finite());
            }
            "pauseParameterAnimation" => {
                self.pause_parameter_animation = parse_flag(key, value);
            }
            "idleTimeout" => {
                let secs = parse_or(key, value, DEFAULT_IDLE_TIMEOUT_SECS, |v: u64| v > 0);
                self.idle_timeout = secs as f64;
            }
            "splatGroupSize" => {
                let size = parse_or(key, value, MAX_SPLAT_BATCH, |v: usize| v > 0);
                if size > MAX_SPLAT_BATCH {
                    log::warn!("[options] splatGroupSize {size} clamped to {MAX_SPLAT_BATCH}");
                }
                self.splat_group_size = size.min(MAX_SPLAT_BATCH);
            }
            "config" => self.config_path = (!value.is_empty()).then(|| value.to_string()),
            "seed" => self.seed = value.parse().ok(),
            _ => log::warn!("[options] unknown option {key:?}"),
        }
    }
}

fn parse_or<T>(key: &str, value: &str, default: T, valid: impl Fn(T) -> bool) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match value.parse::<T>() {
        Ok(v) if valid(v) => v,
        _ => {
            log::error!("[options] invalid {key} {value:?}; using {default}");
            default
        }
    }
}

fn parse_flag(key: &str, value: &str) -> bool {
    match value {
        "" | "1" | "true" => true,
        "0" | "false" => false,
        other => {
            log::error!("[options] invalid {key} {other:?}; treating as set");
            true
        }
    }
}
