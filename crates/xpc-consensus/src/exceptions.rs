//! Transactions that were mined while the duplicate-input check was broken.
//!
//! The check has since been fixed, but these six are already buried in the
//! chain and must keep validating.

use xpc_core::types::TxId;

pub const KNOWN_DUPLICATE_INPUT_TXIDS: [&str; 6] = [
    "f7ed64886878598d8ddbb587017a6324a670331eecaa0f716b71442ef63dc427",
    "bfe31e8a75dda9accbb3307af8a293be1f029e9b91e3c2d339dcbde53cda96e5",
    "cee964493303b36c755e72b5c04070943b0708c3af50aa00e22255658355a9e4",
    "0ad33e81b865fea076f31ea138ceb7480f16e447cc7e45b1b1d9d301fde80706",
    "86f5b30e2e17478fa93fed5994f9ec99cf00874a662b5ad8f0242e178efae112",
    "e7b528a44ce78cf31d22b6177ee31d1482303462a4264a7f7df49e64b311b8d0",
];

/// True if `txid` is one of the grandfathered duplicate-input transactions.
pub fn is_known_exception(txid: &TxId) -> bool {
    let hex = txid.to_hex();
    KNOWN_DUPLICATE_INPUT_TXIDS.iter().any(|known| *known == hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_txid_is_known() {
        for hex in KNOWN_DUPLICATE_INPUT_TXIDS {
            let id = TxId::from_hex(hex).unwrap();
            assert!(is_known_exception(&id), "{hex}");
        }
    }

    #[test]
    fn near_misses_are_not_known() {
        for hex in KNOWN_DUPLICATE_INPUT_TXIDS {
            let mut chars: Vec<char> = hex.chars().collect();
            let last = chars.len() - 1;
            chars[last] = if chars[last] == '0' { '1' } else { '0' };
            let near: String = chars.into_iter().collect();
            assert!(!is_known_exception(&TxId::from_hex(&near).unwrap()), "{near}");
        }
    }

    #[test]
    fn first_character_flip_is_not_known() {
        let near = "e7ed64886878598d8ddbb587017a6324a670331eecaa0f716b71442ef63dc427";
        assert!(!is_known_exception(&TxId::from_hex(near).unwrap()));
    }

    #[test]
    fn arbitrary_txids_are_not_known() {
        assert!(!is_known_exception(&TxId::ZERO));
        assert!(!is_known_exception(&TxId::from_bytes([0xff; 32])));
    }

    #[test]
    fn byte_order_matters() {
        // The listed strings are display order; the same bytes in digest
        // order are a different id.
        let display = TxId::from_hex(KNOWN_DUPLICATE_INPUT_TXIDS[0]).unwrap();
        let mut reversed = *display.as_bytes();
        reversed.reverse();
        assert!(!is_known_exception(&TxId::from_bytes(reversed)));
    }
}
