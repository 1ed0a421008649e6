use crate::mac_address::get_mac_regex;
use crate::{MacAddress, ModelError};

/// **VALUE**: Verifies that a colon separated MAC parses into the expected raw octets.
///
/// **WHY THIS MATTERS**: The octets are written verbatim into every control message. A
/// wrong octet would make wmediumd answer "interface not found" for a valid station.
///
/// **BUG THIS CATCHES**: Would catch byte order or radix mistakes in `from_str`.
#[test]
fn given_valid_mac_when_parsed_then_yields_octets() {
    // GIVEN: A MAC string in mixed case
    let text = "02:00:0A:ff:01:00";

    // WHEN: Parsing
    let mac: MacAddress = text.parse().expect("valid mac");

    // THEN: Octets match and display is normalized to lower case
    assert_eq!(mac.octets(), [0x02, 0x00, 0x0a, 0xff, 0x01, 0x00]);
    assert_eq!(mac.to_string(), "02:00:0a:ff:01:00");
}

/// **VALUE**: Verifies malformed MAC strings are rejected with a validation error.
///
/// **WHY THIS MATTERS**: A MAC typo in a harness script must fail before anything is sent.
///
/// **BUG THIS CATCHES**: Would catch a regex that accepts short, long or non-hex input.
#[test]
fn given_malformed_macs_when_parsed_then_returns_validation_error() {
    // GIVEN: Several malformed inputs
    let invalid_cases = vec![
        "",
        "02:00:00:00:00",
        "02:00:00:00:00:00:00",
        "02-00-00-00-00-00",
        "0g:00:00:00:00:00",
        "020000000000",
    ];

    // WHEN / THEN: Each is rejected
    for invalid in invalid_cases {
        assert!(!get_mac_regex().is_match(invalid), "Regex matched: {invalid}");
        match invalid.parse::<MacAddress>() {
            Err(ModelError::Validation { message, .. }) => {
                assert!(message.contains("Invalid MAC address"));
            }
            Ok(mac) => panic!("Parsed invalid MAC {invalid} as {mac}"),
        }
    }
}

/// **VALUE**: Verifies that MACs serialize as strings and deserialize with validation.
///
/// **WHY THIS MATTERS**: Connector configuration files list interface MACs as strings.
///
/// **BUG THIS CATCHES**: Would catch if serde derives fall back to a byte array format.
#[test]
fn given_mac_when_serialized_then_uses_string_form() {
    // GIVEN: A MAC
    let mac = MacAddress::new([0x02, 0, 0, 0, 0x01, 0]);

    // WHEN: Serializing and parsing back
    let json = serde_json::to_string(&mac).expect("serializable");
    let parsed: MacAddress = serde_json::from_str(&json).expect("deserializable");

    // THEN: String form, same value
    assert_eq!(json, "\"02:00:00:00:01:00\"");
    assert_eq!(parsed, mac);
    assert!(serde_json::from_str::<MacAddress>("\"nope\"").is_err());
}
