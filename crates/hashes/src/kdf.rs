//! HMAC and PBKDF2 over the keel engines.
//!
//! The engines implement the `digest` traits, so the standard
//! inner/outer-pad HMAC and iterated PBKDF2 constructions come from the
//! `hmac` and `pbkdf2` crates running directly over them.

use hmac::{Mac, SimpleHmac};

use crate::{sha1::Sha1, sha256::Sha256, sha512::Sha512};

/// HMAC-SHA-1 over the keel engine.
pub type HmacSha1 = SimpleHmac<Sha1>;

/// HMAC-SHA-256 over the keel engine.
pub type HmacSha256 = SimpleHmac<Sha256>;

/// HMAC-SHA-512 over the keel engine.
pub type HmacSha512 = SimpleHmac<Sha512>;

/// One-shot HMAC-SHA-256.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// One-shot HMAC-SHA-512.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// PBKDF2-HMAC-SHA-1, filling `out`.
pub fn pbkdf2_hmac_sha1(password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
    pbkdf2::pbkdf2::<HmacSha1>(password, salt, rounds, out)
        .expect("HMAC accepts keys of any length");
}

/// PBKDF2-HMAC-SHA-256, filling `out`.
pub fn pbkdf2_hmac_sha256(password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
    pbkdf2::pbkdf2::<HmacSha256>(password, salt, rounds, out)
        .expect("HMAC accepts keys of any length");
}

/// PBKDF2-HMAC-SHA-512, filling `out`. Used by BIP39/Electrum seed
/// stretching.
pub fn pbkdf2_hmac_sha512(password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
    pbkdf2::pbkdf2::<HmacSha512>(password, salt, rounds, out)
        .expect("HMAC accepts keys of any length");
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 4231 test cases 1 and 2.
    #[test]
    fn it_matches_hmac_vectors() {
        let key = [0x0bu8; 20];
        let data = b"Hi There";
        assert_eq!(
            hex::encode(hmac_sha256(&key, data)),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
        assert_eq!(
            hex::encode(hmac_sha512(&key, data)),
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
        );

        let key = b"Jefe";
        let data = b"what do ya want for nothing?";
        assert_eq!(
            hex::encode(hmac_sha256(key, data)),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        assert_eq!(
            hex::encode(hmac_sha512(key, data)),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    // HMAC over a key longer than the block forces the key-hashing path.
    #[test]
    fn it_hashes_oversized_keys() {
        let key = [0xaau8; 131];
        let data = b"Test Using Larger Than Block-Size Key - Hash Key First";
        assert_eq!(
            hex::encode(hmac_sha256(&key, data)),
            "60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54"
        );
    }

    // RFC 6070 vectors.
    #[test]
    fn it_matches_pbkdf2_sha1_vectors() {
        let cases: [(u32, &str); 3] = [
            (1, "0c60c80f961f0e71f3a9b524af6012062fe037a6"),
            (2, "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957"),
            (4096, "4b007901b765489abead49d926f721d065a429c1"),
        ];
        for (rounds, expected) in cases.iter() {
            let mut out = [0u8; 20];
            pbkdf2_hmac_sha1(b"password", b"salt", *rounds, &mut out);
            assert_eq!(hex::encode(out), *expected);
        }
    }

    #[test]
    fn it_matches_pbkdf2_sha256_vectors() {
        let cases: [(u32, &str); 3] = [
            (
                1,
                "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b",
            ),
            (
                2,
                "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43",
            ),
            (
                4096,
                "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a",
            ),
        ];
        for (rounds, expected) in cases.iter() {
            let mut out = [0u8; 32];
            pbkdf2_hmac_sha256(b"password", b"salt", *rounds, &mut out);
            assert_eq!(hex::encode(out), *expected);
        }
    }

    // BIP39's parameterization: 2048 rounds of HMAC-SHA-512 over the
    // sentence, "mnemonic" || passphrase as salt.
    #[test]
    fn it_derives_bip39_seeds() {
        let mut seed = [0u8; 64];
        pbkdf2_hmac_sha512(
            b"legal winner thank year wave sausage worth useful legal winner thank yellow",
            b"mnemonicTREZOR",
            2048,
            &mut seed,
        );
        assert_eq!(
            hex::encode(seed),
            "2e8905819b8723fe2c1d161860e5ee1830318dbf49a83bd451cfb8440c28bd6f\
             a457fe1296106559a3c80937a1c1069be3a3a5bd381ee6260e8d9739fce1f607"
        );
    }
}
