#![cfg_attr(not(feature = "std"), no_std)]

use core::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Runs once when the contract is deployed.
#[no_mangle]
pub extern "C" fn deploy() {
    COUNTER.store(0, Ordering::Relaxed);
}

/// Entry for every transaction sent to the contract.
#[no_mangle]
pub extern "C" fn call() {
    COUNTER.fetch_add(1, Ordering::Relaxed);
}

pub fn counter() -> u32 {
    COUNTER.load(Ordering::Relaxed)
}

#[cfg(all(not(feature = "std"), target_arch = "wasm32"))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    core::arch::wasm32::unreachable()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_increments_counter() {
        deploy();
        call();
        call();
        assert_eq!(counter(), 2);
    }
}
