//! Fuzz target for the filter compiler.
//!
//! Feeds arbitrary text through parse, complete, optimize, compile and
//! validate. Any input may be rejected; none may panic or loop forever in
//! the optimizer.

#![no_main]

use libfuzzer_sys::fuzz_target;
use snoopy_core::{default_registry, Compiler};

fuzz_target!(|data: &[u8]| {
    let Ok(expr) = std::str::from_utf8(data) else {
        return;
    };

    let registry = default_registry();
    for root in ["ether", "ip"] {
        let Ok(compiler) = Compiler::new(&registry, root) else {
            continue;
        };
        if let Ok(filter) = compiler.compile(expr) {
            // Whatever compiled must also evaluate
            let _ = filter.matches(&registry, &[]);
            let _ = filter.to_string();
        }
    }
});
