//! Key material for the cipher-bearing protocols.
//!
//! The Kia V3/V4 decoder tries a small ring of candidate KeeLoq manufacturer
//! keys; the Kia V5 decoder mixes with an 8-byte keystore. Both are explicit
//! configuration values handed to the decoder at construction — nothing here
//! is process-global, and everything is read-only during decoding.
//!
//! Keys load from `keystore.ini` in a per-user config directory. Values are
//! hexadecimal with an optional `0x` prefix; entries that are missing,
//! zeroed, or unparseable are skipped, and the corresponding protocol
//! decodes without decryption (cipher fields report as "Unknown").

use anyhow::{Context, Result};
use configparser::ini::Ini;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::protocols::KiaV5Decoder;

/// Which ring slot a matched KeeLoq key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Ring index 0.
    V4,
    /// Ring index 1.
    V3,
}

/// Candidate KeeLoq manufacturer keys for Kia V3/V4.
///
/// A zero entry means "not provisioned" and is never tried. The default
/// ring is empty: decryption unavailable, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyRing {
    v4: u64,
    v3: u64,
}

impl KeyRing {
    pub const fn new(v4: u64, v3: u64) -> Self {
        Self { v4, v3 }
    }

    pub const fn empty() -> Self {
        Self { v4: 0, v3: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.v4 == 0 && self.v3 == 0
    }

    /// Non-zero candidates in trial order: V4 slot first, then V3.
    pub fn candidates(&self) -> impl Iterator<Item = (KeyClass, u64)> {
        [(KeyClass::V4, self.v4), (KeyClass::V3, self.v3)]
            .into_iter()
            .filter(|&(_, key)| key != 0)
    }
}

/// All externally supplied key material, as loaded from `keystore.ini`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStore {
    /// Kia V3/V4 KeeLoq candidate keys.
    pub kia_ring: KeyRing,
    /// Kia V5 mixer keystore bytes.
    pub kia_v5_keystore: [u8; 8],
}

impl Default for KeyStore {
    fn default() -> Self {
        Self {
            kia_ring: KeyRing::empty(),
            kia_v5_keystore: KiaV5Decoder::DEFAULT_KEYSTORE,
        }
    }
}

/// Default `keystore.ini` template, written on request so users know which
/// keys to configure.
const KEYSTORE_TEMPLATE: &str = r#"; fobdec keystore - protocol cipher keys
;
; Key values are hexadecimal with an optional 0x prefix
; (e.g. 0x0123456789ABCDEF).
;
; Keys left at 0x0000000000000000 or omitted are treated as "not loaded".
; The corresponding protocol still decodes, but cipher fields report as
; Unknown.

[kia]
; Kia V3/V4: KeeLoq manufacturer keys tried against each hop code.
; Slot order matters: a match on v4_mf_key reports Kia V4, on v3_mf_key
; reports Kia V3.
v4_mf_key = 0x0000000000000000
v3_mf_key = 0x0000000000000000

; Kia V5: 8-byte mixer keystore. Omit to use the built-in bytes.
; v5_keystore = 0x535446524B453030
"#;

/// Parse a hex string (with or without "0x" prefix) into a u64.
fn parse_hex_u64(s: &str) -> Option<u64> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(s, 16).ok()
}

impl KeyStore {
    /// Conventional per-user keystore directory.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("fobdec"))
    }

    /// Write the `keystore.ini` template into `dir` unless one exists.
    pub fn create_template(dir: &Path) -> Result<()> {
        let ini_path = dir.join("keystore.ini");
        if ini_path.exists() {
            return Ok(());
        }
        std::fs::write(&ini_path, KEYSTORE_TEMPLATE)
            .with_context(|| format!("failed to write keystore template {ini_path:?}"))?;
        info!("Created keystore template at {:?}", ini_path);
        Ok(())
    }

    /// Load key material from `dir/keystore.ini`.
    ///
    /// A missing file yields the defaults (empty ring, built-in V5
    /// keystore); a file that cannot be parsed is an error.
    pub fn load(dir: &Path) -> Result<KeyStore> {
        let ini_path = dir.join("keystore.ini");
        let mut store = KeyStore::default();

        if !ini_path.exists() {
            info!("No keystore.ini at {:?} - keys not loaded", ini_path);
            return Ok(store);
        }

        let mut ini = Ini::new();
        ini.load(ini_path.to_string_lossy().as_ref())
            .map_err(|e| anyhow::anyhow!("failed to parse {ini_path:?}: {e}"))?;

        let mut loaded = 0u32;

        let v4 = ini
            .get("kia", "v4_mf_key")
            .and_then(|s| parse_hex_u64(&s))
            .unwrap_or(0);
        let v3 = ini
            .get("kia", "v3_mf_key")
            .and_then(|s| parse_hex_u64(&s))
            .unwrap_or(0);
        if v4 != 0 || v3 != 0 {
            store.kia_ring = KeyRing::new(v4, v3);
            loaded += u32::from(v4 != 0) + u32::from(v3 != 0);
            info!("Loaded Kia V3/V4 manufacturer key ring");
        }

        if let Some(raw) = ini.get("kia", "v5_keystore") {
            match parse_hex_u64(&raw) {
                Some(value) if value != 0 => {
                    store.kia_v5_keystore = value.to_be_bytes();
                    loaded += 1;
                    info!("Loaded Kia V5 mixer keystore");
                }
                Some(_) => {}
                None => warn!("Unparseable kia.v5_keystore value, keeping built-in bytes"),
            }
        }

        if loaded > 0 {
            info!("Keystore loaded: {} key(s) from {:?}", loaded, dir);
        } else {
            info!("Keystore loaded but no non-zero keys found");
        }
        Ok(store)
    }
}
