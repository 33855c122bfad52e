use ethereum_types::U256;
use std::sync::LazyLock;

// === Access list constants (Berlin fork) ===

/// Gas charged for each address entry in an access list.
pub const ACCESS_LIST_ADDRESS_COST: u64 = 2400;

/// Gas charged for each storage key in an access list entry.
pub const ACCESS_LIST_STORAGE_KEY_COST: u64 = 1900;

// === Signature constants ===

/// Half the order of the secp256k1 group. A signature whose `s` component is
/// above this bound has a distinct-but-equivalent low-s form and is rejected
/// as of EIP-2.
pub static SECP256K1_N_HALF: LazyLock<U256> = LazyLock::new(|| {
    U256::from_str_radix(
        "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0",
        16,
    )
    .expect("Failed to decode hex from string")
});
