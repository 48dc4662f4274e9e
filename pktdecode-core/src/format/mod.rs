//! Text rendering of addresses and decoded packets.

mod address;
mod summary;

pub use address::{format_ipv4, format_ipv6, format_mac};
pub use summary::{details, hex_dump, summary};
