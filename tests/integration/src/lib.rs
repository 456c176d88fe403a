//! Fixtures shared by the integration tests.

use hopguard_core::{ChannelId, Millitokens, NodeId, NODE_KEY_LEN};
use hopguard_routing::{AttemptedHop, Hop, Route, RouteHop};

/// Deterministic node key `n`.
pub fn key(n: u8) -> NodeId {
    NodeId::from_bytes([n; NODE_KEY_LEN])
}

/// Channel `nxnxn`.
pub fn chan(n: u32) -> ChannelId {
    ChannelId::new(n, n, n as u16)
}

/// Route along `(channel, node)` pairs, each hop forwarding `mtokens`.
pub fn route(path: &[(u32, u8)], mtokens: u64) -> Route {
    let hops = path
        .iter()
        .map(|(c, n)| RouteHop {
            channel: chan(*c),
            to_node: key(*n),
            forward_mtokens: Millitokens(mtokens),
        })
        .collect();
    match Route::new(hops) {
        Ok(route) => route,
        Err(err) => panic!("fixture route must be non-empty: {err}"),
    }
}

pub fn hops(path: &[(u32, u8)], mtokens: u64) -> Vec<Hop> {
    path.iter()
        .map(|(c, n)| Hop::new(chan(*c), key(*n), Millitokens(mtokens)))
        .collect()
}

pub fn attempted(path: &[(u32, u8)]) -> Vec<AttemptedHop> {
    path.iter()
        .map(|(c, n)| AttemptedHop::new(chan(*c), key(*n)))
        .collect()
}
