use models::mac_address::MAC_ADDRESS_LEN;
use models::{LINK_RATE_COUNT, LINK_SIZE_COUNT};

// Message types
pub const WSERVER_SHUTDOWN_REQUEST_TYPE: u8 = 0;
pub const WSERVER_SNR_UPDATE_REQUEST_TYPE: u8 = 1;
pub const WSERVER_SNR_UPDATE_RESPONSE_TYPE: u8 = 2;
pub const WSERVER_DEL_BY_MAC_REQUEST_TYPE: u8 = 3;
pub const WSERVER_DEL_BY_MAC_RESPONSE_TYPE: u8 = 4;
pub const WSERVER_DEL_BY_ID_REQUEST_TYPE: u8 = 5;
pub const WSERVER_DEL_BY_ID_RESPONSE_TYPE: u8 = 6;
pub const WSERVER_ADD_REQUEST_TYPE: u8 = 7;
pub const WSERVER_ADD_RESPONSE_TYPE: u8 = 8;
pub const WSERVER_ERRPROB_UPDATE_REQUEST_TYPE: u8 = 9;
pub const WSERVER_ERRPROB_UPDATE_RESPONSE_TYPE: u8 = 10;
pub const WSERVER_SPECPROB_UPDATE_REQUEST_TYPE: u8 = 11;
pub const WSERVER_SPECPROB_UPDATE_RESPONSE_TYPE: u8 = 12;

// Update status codes
pub const WUPDATE_SUCCESS: u8 = 0;
pub const WUPDATE_INTF_NOTFOUND: u8 = 1;
pub const WUPDATE_INTF_DUPLICATE: u8 = 2;
pub const WUPDATE_WRONG_MODE: u8 = 3;

// Field sizes
pub const TYPE_LEN: usize = 1;
pub const STATUS_LEN: usize = 1;
pub const I32_LEN: usize = 4;
pub const MAC_LEN: usize = MAC_ADDRESS_LEN;
pub const SPECPROB_VALUE_COUNT: usize = LINK_SIZE_COUNT * LINK_RATE_COUNT;

// Request sizes
pub const SHUTDOWN_REQUEST_LEN: usize = TYPE_LEN;
pub const SNR_UPDATE_REQUEST_LEN: usize = TYPE_LEN + 2 * MAC_LEN + I32_LEN;
pub const ERRPROB_UPDATE_REQUEST_LEN: usize = TYPE_LEN + 2 * MAC_LEN + I32_LEN;
pub const SPECPROB_UPDATE_REQUEST_LEN: usize =
    TYPE_LEN + 2 * MAC_LEN + SPECPROB_VALUE_COUNT * I32_LEN;
pub const DEL_BY_MAC_REQUEST_LEN: usize = TYPE_LEN + MAC_LEN;
pub const DEL_BY_ID_REQUEST_LEN: usize = TYPE_LEN + I32_LEN;
pub const ADD_REQUEST_LEN: usize = TYPE_LEN + MAC_LEN;

// Response sizes (type byte, echoed request, trailing fields)
pub const SNR_UPDATE_RESPONSE_LEN: usize = TYPE_LEN + SNR_UPDATE_REQUEST_LEN + STATUS_LEN;
pub const ERRPROB_UPDATE_RESPONSE_LEN: usize = TYPE_LEN + ERRPROB_UPDATE_REQUEST_LEN + STATUS_LEN;
// The spec-prob response does not echo the 144 probabilities.
pub const SPECPROB_UPDATE_RESPONSE_LEN: usize = TYPE_LEN + 2 * MAC_LEN + STATUS_LEN;
pub const DEL_BY_MAC_RESPONSE_LEN: usize = TYPE_LEN + DEL_BY_MAC_REQUEST_LEN + STATUS_LEN;
pub const DEL_BY_ID_RESPONSE_LEN: usize = TYPE_LEN + DEL_BY_ID_REQUEST_LEN + STATUS_LEN;
pub const ADD_RESPONSE_LEN: usize = TYPE_LEN + ADD_REQUEST_LEN + I32_LEN + STATUS_LEN;
