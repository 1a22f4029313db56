//! Property-based tests for the platform state
//!
//! Uses proptest to verify code assignment, change detection and round trips
//! across many random inputs.

use audio_hal_core::{LoopbackRouteConnector, LoopbackStreamInterface};
use audio_platform_state::value_list::{assign_codes, parse_type_values};
use audio_platform_state::{KeyValuePairs, PlatformState, PlatformStateSettings};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

const CONF: &str = r#"
route {
    inclusive-criterion-type {
        DeviceMask "Earpiece,Speaker,Headset,Bluetooth,Usb"
    }
    exclusive-criterion-type {
        ModeType "Normal,RingTone,InCall,InCommunication"
    }
    criterion {
        Devices {
            type DeviceMask
            key devices
        }
        Mode {
            type ModeType
            default Normal
            key mode
        }
    }
}
"#;

const DEVICES: [&str; 5] = ["Earpiece", "Speaker", "Headset", "Bluetooth", "Usb"];
const MODES: [&str; 4] = ["Normal", "RingTone", "InCall", "InCommunication"];

// ===== Helpers =====

fn engine() -> (Arc<LoopbackStreamInterface>, Arc<LoopbackRouteConnector>, PlatformState) {
    let stream = Arc::new(LoopbackStreamInterface::new());
    let connector = Arc::new(LoopbackRouteConnector::new("/tmp/Route.xml"));
    let state = PlatformState::from_conf_str(
        PlatformStateSettings::default(),
        CONF,
        stream.clone(),
        connector.clone(),
    )
    .unwrap();
    (stream, connector, state)
}

fn literals(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Za-z][A-Za-z0-9_]{0,8}", 1..=max)
        .prop_map(|set| set.into_iter().collect())
}

fn device_literal() -> impl Strategy<Value = String> {
    prop::sample::subsequence(DEVICES.to_vec(), 0..=DEVICES.len())
        .prop_map(|members| members.join("|"))
}

fn mode_literal() -> impl Strategy<Value = String> {
    prop::sample::select(MODES.to_vec()).prop_map(str::to_string)
}

// ===== Property Tests =====

proptest! {
    /// Property: implicit inclusive codes are disjoint single bits in declaration order
    #[test]
    fn implicit_inclusive_codes_are_powers_of_two(names in literals(32)) {
        let values = parse_type_values(&names.join(",")).unwrap();
        let codes = assign_codes(&values, true).unwrap();

        prop_assert_eq!(codes.len(), names.len());
        let mut seen = 0u32;
        for (index, (code, literal)) in codes.iter().enumerate() {
            prop_assert_eq!(*code, 1u32 << index);
            prop_assert_eq!(seen & code, 0);
            prop_assert_eq!(literal, &names[index]);
            seen |= code;
        }
    }

    /// Property: implicit exclusive codes increase by one from zero
    #[test]
    fn implicit_exclusive_codes_are_indices(names in literals(64)) {
        let values = parse_type_values(&names.join(",")).unwrap();
        let codes = assign_codes(&values, false).unwrap();

        for (index, (code, _)) in codes.iter().enumerate() {
            prop_assert_eq!(*code as usize, index);
        }
    }

    /// Property: get_parameters returns what set_parameters stored
    #[test]
    fn set_then_get_round_trips(devices in device_literal(), mode in mode_literal()) {
        let (_, _, state) = engine();
        let text = format!("devices={};mode={}", devices, mode);
        state.set_parameters(&text, false).unwrap();

        let returned = KeyValuePairs::parse(&state.get_parameters("devices;mode"));
        prop_assert_eq!(returned.get("devices"), Some(devices.as_str()));
        prop_assert_eq!(returned.get("mode"), Some(mode.as_str()));
    }

    /// Property: repeating a parameter string never notifies again
    #[test]
    fn repeated_settings_notify_at_most_once(
        devices in device_literal(),
        mode in mode_literal(),
        repeats in 1usize..5,
    ) {
        let (stream, connector, state) = engine();
        let text = format!("mode={};devices={}", mode, devices);
        for _ in 0..repeats {
            state.set_parameters(&text, false).unwrap();
        }

        let changed = mode != "Normal" || !devices.is_empty();
        prop_assert_eq!(stream.reconsider_count(), usize::from(changed));
        prop_assert_eq!(connector.apply_count(), usize::from(changed));
        prop_assert!(!state.has_platform_state_changed());
    }

    /// Property: pairs keep the last value of each key, in first-seen order
    #[test]
    fn key_value_pairs_keep_last_value(
        entries in prop::collection::vec(("[a-z]{1,3}", "[a-z0-9|]{0,6}"), 0..12)
    ) {
        let text: Vec<String> = entries.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        let pairs = KeyValuePairs::parse(&text.join(";"));

        let distinct: BTreeSet<&String> = entries.iter().map(|(k, _)| k).collect();
        prop_assert_eq!(pairs.len(), distinct.len());
        for (key, _) in &entries {
            let last = entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
            prop_assert_eq!(pairs.get(key), last);
        }
        prop_assert_eq!(KeyValuePairs::parse(&pairs.to_string()), pairs);
    }
}
