//! Well-known criterion names
//!
//! The configuration decides which of these criteria exist and in which
//! domain. Accessors for unconfigured names read 0 and write nothing.

pub const ANDROID_MODE: &str = "AndroidMode";
pub const MODEM_STATE: &str = "ModemState";
pub const MODEM_AUDIO_STATUS: &str = "ModemAudioStatus";
pub const HAS_MODEM: &str = "HasModem";
pub const OUTPUT_DEVICES: &str = "SelectedOutputDevices";
pub const INPUT_DEVICES: &str = "SelectedInputDevices";
pub const CSV_BAND: &str = "CsvBandType";
pub const VOIP_BAND: &str = "VoIPBandType";
pub const MIC_MUTE: &str = "MicMute";
pub const INPUT_SOURCES: &str = "InputSources";
pub const OUTPUT_FLAGS: &str = "OutputFlags";
