//! Typed accessors over well-known criteria

use audio_hal_core::{BandType, Direction};

use crate::names;
use crate::state::PlatformState;

impl PlatformState {
    pub fn set_modem_alive(&self, alive: bool) {
        self.set_value(u32::from(alive), names::MODEM_STATE);
    }

    pub fn is_modem_alive(&self) -> bool {
        self.get_value(names::MODEM_STATE) != 0
    }

    pub fn set_modem_audio_available(&self, available: bool) {
        self.set_value(u32::from(available), names::MODEM_AUDIO_STATUS);
    }

    pub fn is_modem_audio_available(&self) -> bool {
        self.get_value(names::MODEM_AUDIO_STATUS) != 0
    }

    pub fn set_modem_embedded(&self, embedded: bool) {
        self.set_value(u32::from(embedded), names::HAS_MODEM);
    }

    pub fn is_modem_embedded(&self) -> bool {
        self.get_value(names::HAS_MODEM) != 0
    }

    /// Set the audio mode code of the operating system
    pub fn set_mode(&self, mode: u32) {
        self.set_value(mode, names::ANDROID_MODE);
    }

    pub fn mode(&self) -> u32 {
        self.get_value(names::ANDROID_MODE)
    }

    /// Set the selected device mask of one direction
    pub fn set_devices(&self, devices: u32, direction: Direction) {
        self.set_value(devices, devices_criterion(direction));
    }

    pub fn devices(&self, direction: Direction) -> u32 {
        self.get_value(devices_criterion(direction))
    }

    /// Set the band negotiated by the modem for circuit switched calls
    pub fn set_csv_band(&self, band: BandType) {
        self.set_value(band.code(), names::CSV_BAND);
    }

    pub fn csv_band(&self) -> Option<BandType> {
        BandType::from_code(self.get_value(names::CSV_BAND))
    }

    pub fn set_voip_band(&self, band: BandType) {
        self.set_value(band.code(), names::VOIP_BAND);
    }

    pub fn voip_band(&self) -> Option<BandType> {
        BandType::from_code(self.get_value(names::VOIP_BAND))
    }

    pub fn set_mic_mute(&self, muted: bool) {
        self.set_value(u32::from(muted), names::MIC_MUTE);
    }

    pub fn is_mic_muted(&self) -> bool {
        self.get_value(names::MIC_MUTE) != 0
    }

    /// Input sources of the active input streams
    pub fn input_sources(&self) -> u32 {
        self.get_value(names::INPUT_SOURCES)
    }

    /// Output flags of the active output streams
    pub fn output_flags(&self) -> u32 {
        self.get_value(names::OUTPUT_FLAGS)
    }
}

fn devices_criterion(direction: Direction) -> &'static str {
    match direction {
        Direction::Input => names::INPUT_DEVICES,
        Direction::Output => names::OUTPUT_DEVICES,
    }
}
