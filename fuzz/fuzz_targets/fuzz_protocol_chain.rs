//! Fuzz target for the protocol decoders.
//!
//! Arbitrary bytes are printed header by header from each root and run
//! through a filter that reaches every built-in decoder's fields.

#![no_main]

use libfuzzer_sys::fuzz_target;
use snoopy_core::{default_registry, print_packet, Compiler};

const FILTER: &str = "ether(addr=ff:ff:ff:ff:ff:ff) || arp(op=1) || ip(ttl=1) || \
                      ip6(hlim=1) || tcp(flags=2) || udp(port=53) || icmp(type=8)";

fuzz_target!(|data: &[u8]| {
    let registry = default_registry();

    for root in ["ether", "ip", "ip6"] {
        let Some(id) = registry.lookup(root) else {
            continue;
        };
        let mut out = String::new();
        print_packet(&registry, id, data, false, &mut out);
    }

    let compiler = Compiler::new(&registry, "ether").unwrap();
    let filter = compiler.compile(FILTER).unwrap();
    let _ = filter.matches(&registry, data);
});
