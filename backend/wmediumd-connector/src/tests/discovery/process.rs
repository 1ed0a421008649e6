// Unit tests for process module private functions
// Integration tests for public API are in integration_tests/discovery/process.rs

use crate::discovery::process::{executable_name, format_command, module_listed, with_process};

use std::ffi::OsStr;

/// **VALUE**: Tests the private `format_command()` helper on a real process.
///
/// **WHY THIS MATTERS**: The command line of an attached server ends up in the connection
/// handle; a panic here would break attaching to a running wmediumd.
///
/// **BUG THIS CATCHES**: Ensures we don't crash when formatting our own command line.
#[test]
fn given_valid_process_when_format_command_called_then_returns_command_string() {
    // GIVEN: A valid process (using our own PID)
    let our_pid = std::process::id();

    // WHEN: Calling format_command on the process
    let result = with_process(our_pid, |p| format_command(p));

    // THEN: Should return Some with non-empty command string
    assert!(result.is_some(), "Should find the process");
    let cmd = result.unwrap();
    assert!(!cmd.is_empty(), "Command string should not be empty");
}

/// **VALUE**: Tests that `with_process()` gracefully handles non-existent PIDs.
///
/// **WHY THIS MATTERS**: wmediumd can exit between discovery and stop. If `with_process()`
/// panics instead of returning None, disconnect would crash.
///
/// **BUG THIS CATCHES**: Prevents crashes when querying processes that died in between.
#[test]
fn given_nonexistent_pid_when_with_process_called_then_returns_none() {
    // GIVEN: A PID that doesn't exist
    let fake_pid = u32::MAX;

    // WHEN: Calling with_process with the invalid PID
    let result = with_process(fake_pid, |_| true);

    // THEN: Should return None (graceful handling)
    assert!(
        result.is_none(),
        "Should return None for non-existent process"
    );
}

/// **VALUE**: Verifies module detection reads only the first column of `/proc/modules`.
///
/// **WHY THIS MATTERS**: Loading `mac80211_hwsim` twice with `radios=0` is harmless, but not
/// loading it at all leaves wmediumd without a netlink family to attach to.
///
/// **BUG THIS CATCHES**: Would catch a substring match that treats `mac80211` (the
/// dependency listed in the "used by" column) as the hwsim module, or the reverse.
#[test]
fn given_proc_modules_listing_when_module_listed_called_then_matches_name_column_only() {
    // GIVEN: A listing where mac80211_hwsim appears only as a dependant
    let without_hwsim = "mac80211 1142784 1 mac80211_hwsim, Live 0x0000000000000000\n\
                         cfg80211 1167360 2 mac80211, Live 0x0000000000000000\n";
    let with_hwsim = "mac80211_hwsim 69632 0 - Live 0x0000000000000000\n\
                      mac80211 1142784 1 mac80211_hwsim, Live 0x0000000000000000\n";

    // WHEN / THEN
    assert!(!module_listed(without_hwsim, "mac80211_hwsim"));
    assert!(module_listed(with_hwsim, "mac80211_hwsim"));
    assert!(!module_listed("", "mac80211_hwsim"));
}

/// **VALUE**: Verifies a configured executable path is reduced to the process name.
///
/// **BUG THIS CATCHES**: Would catch comparing `/usr/local/bin/wmediumd` against process
/// names, which never matches and leads to spawning a second server.
#[test]
fn given_executable_path_when_executable_name_called_then_returns_file_name() {
    // GIVEN / WHEN / THEN
    assert_eq!(
        executable_name("/usr/local/bin/wmediumd"),
        Some(OsStr::new("wmediumd"))
    );
    assert_eq!(executable_name("wmediumd"), Some(OsStr::new("wmediumd")));
    assert_eq!(executable_name("/"), None);
}
