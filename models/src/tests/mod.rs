mod link;
mod mac_address;
mod server_info;
