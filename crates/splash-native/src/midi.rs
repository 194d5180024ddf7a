use anyhow::{anyhow, Context};
use crossbeam_channel::{Receiver, Sender};
use midir::{MidiInput, MidiInputConnection};

const CLIENT_NAME: &str = "fluid-splash";

/// One undecoded MIDI message.
pub type RawMessage = Vec<u8>;

/// An open input port. Dropping it closes the connection.
pub struct MidiListener {
    _connection: MidiInputConnection<()>,
    pub port_name: String,
    pub receiver: Receiver<RawMessage>,
}

pub fn list_ports() -> Vec<String> {
    match MidiInput::new(CLIENT_NAME) {
        Ok(midi_in) => midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect(),
        Err(err) => {
            log::error!("[midi] input unavailable: {err}");
            Vec::new()
        }
    }
}

/// Open the port called `wanted`, or the first port when `None`.
/// Messages are forwarded undecoded; the frame loop applies the channel mask.
/// `wake` runs on the MIDI thread after each message is queued.
pub fn connect(
    wanted: Option<&str>,
    wake: impl Fn() + Send + 'static,
) -> anyhow::Result<MidiListener> {
    let mut midi_in = MidiInput::new(CLIENT_NAME).context("creating MIDI input")?;
    midi_in.ignore(midir::Ignore::None);
    let ports = midi_in.ports();
    let port = match wanted {
        Some(name) => ports
            .into_iter()
            .find(|port| midi_in.port_name(port).is_ok_and(|n| n == name))
            .ok_or_else(|| anyhow!("MIDI port {name:?} not found"))?,
        None => ports
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no MIDI input ports"))?,
    };
    let port_name = midi_in.port_name(&port)?;
    let (sender, receiver): (Sender<RawMessage>, Receiver<RawMessage>) =
        crossbeam_channel::unbounded();
    let connection = midi_in
        .connect(
            &port,
            "fluid-splash-input",
            move |_stamp, message, _| {
                if sender.send(message.to_vec()).is_ok() {
                    wake();
                }
            },
            (),
        )
        .map_err(|e| anyhow!("failed to connect to {port_name:?}: {e}"))?;
    log::info!("[midi] listening on {port_name:?}");
    Ok(MidiListener {
        _connection: connection,
        port_name,
        receiver,
    })
}
