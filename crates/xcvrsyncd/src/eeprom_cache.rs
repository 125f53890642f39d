//! EEPROM snapshot cache
//!
//! Raw EEPROM dumps are staged through one shared cache file that is
//! truncated and rewritten wholesale on every fetch. The file is
//! created empty at startup so consumers can open it before the first
//! snapshot lands. Fetches are serialized by the context's cache lock;
//! interleaving two ports' dumps would hand one port's reader the
//! other port's bytes.

use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tracing::{debug, instrument};

use sonic_xcvr_common::{XcvrError, XcvrResult};

use crate::context::XcvrContext;

/// Creates the cache directory and file if they do not exist yet.
///
/// Existing file contents are left alone; only the first boot actually
/// creates anything.
pub(crate) async fn prime_cache_file(path: &Path) -> XcvrResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    Ok(())
}

/// Decodes a hex dump into raw bytes, tolerating ASCII whitespace.
fn decode_hex(hex: &str) -> XcvrResult<Vec<u8>> {
    let compact: Vec<u8> = hex
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if compact.len() % 2 != 0 {
        return Err(XcvrError::rpc("eeprom_hex", "odd-length hex dump"));
    }

    compact
        .chunks(2)
        .map(|pair| Ok(hex_val(pair[0])? << 4 | hex_val(pair[1])?))
        .collect()
}

fn hex_val(b: u8) -> XcvrResult<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(XcvrError::rpc(
            "eeprom_hex",
            format!("invalid hex byte 0x{:02x}", b),
        )),
    }
}

impl XcvrContext {
    /// Fetches a raw EEPROM snapshot for `port` into the cache file.
    ///
    /// Returns the cache path on success, `Ok(None)` when no module is
    /// present. The fetch holds the cache lock from the presence check
    /// through the file rewrite.
    #[instrument(skip(self))]
    pub async fn port_eeprom_path(&self, port: u32) -> XcvrResult<Option<PathBuf>> {
        self.ensure_valid_port(port).await?;

        let _guard = self.eeprom_lock.lock().await;

        let mut conn = self.client().connect().await?;
        if !conn.presence(port).await? {
            debug!(port, "No module present, skipping EEPROM fetch");
            return Ok(None);
        }

        let hex = conn.eeprom_hex(port).await?;
        let raw = decode_hex(&hex)?;

        let path = self.config().eeprom.cache_path.clone();
        fs::write(&path, &raw).await?;
        debug!(port, bytes = raw.len(), "EEPROM snapshot written");

        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sonic_xcvr_common::MockPltfmMgr;

    use super::*;
    use crate::config::XcvrConfig;

    async fn test_setup(max_port: u32) -> (MockPltfmMgr, XcvrContext, tempfile::TempDir) {
        let mock = MockPltfmMgr::new(max_port);
        let dir = tempfile::tempdir().unwrap();
        let mut config = XcvrConfig::default();
        config.eeprom.cache_path = dir.path().join("sfp").join("cache");
        let ctx = XcvrContext::new(Arc::new(mock.clone()), config)
            .await
            .unwrap();
        (mock, ctx, dir)
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex("00ff10Ab").unwrap(), vec![0x00, 0xff, 0x10, 0xab]);
        assert_eq!(decode_hex("0d 0a\n42").unwrap(), vec![0x0d, 0x0a, 0x42]);
    }

    #[test]
    fn test_decode_hex_rejects_garbage() {
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("zz").is_err());
    }

    #[tokio::test]
    async fn test_prime_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platform").join("sfp").join("cache");

        prime_cache_file(&path).await.unwrap();

        let metadata = fs::metadata(&path).await.unwrap();
        assert_eq!(metadata.len(), 0);
    }

    #[tokio::test]
    async fn test_prime_preserves_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        fs::write(&path, b"leftover").await.unwrap();

        prime_cache_file(&path).await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), b"leftover");
    }

    #[tokio::test]
    async fn test_fetch_writes_decoded_dump() {
        let (mock, ctx, _dir) = test_setup(4).await;
        mock.insert_module(1);
        mock.set_eeprom_hex(1, "0011aabb");

        let path = ctx.port_eeprom_path(1).await.unwrap().expect("path");

        assert_eq!(fs::read(&path).await.unwrap(), vec![0x00, 0x11, 0xaa, 0xbb]);
    }

    #[tokio::test]
    async fn test_fetch_absent_port_returns_none() {
        let (_mock, ctx, _dir) = test_setup(4).await;

        let result = ctx.port_eeprom_path(2).await.unwrap();

        assert!(result.is_none());
        // The primed file stays empty.
        let len = fs::metadata(ctx.config().eeprom.cache_path.clone())
            .await
            .unwrap()
            .len();
        assert_eq!(len, 0);
    }

    #[tokio::test]
    async fn test_fetch_overwrites_previous_snapshot() {
        let (mock, ctx, _dir) = test_setup(4).await;
        mock.insert_module(1);
        mock.insert_module(2);
        mock.set_eeprom_hex(1, "deadbeef");
        mock.set_eeprom_hex(2, "0102");

        ctx.port_eeprom_path(1).await.unwrap();
        let path = ctx.port_eeprom_path(2).await.unwrap().expect("path");

        // Wholesale rewrite: the longer previous dump is gone.
        assert_eq!(fs::read(&path).await.unwrap(), vec![0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_fetch_invalid_port_errors() {
        let (_mock, ctx, _dir) = test_setup(4).await;
        assert!(ctx.port_eeprom_path(99).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_malformed_dump_errors() {
        let (mock, ctx, _dir) = test_setup(4).await;
        mock.insert_module(1);
        mock.set_eeprom_hex(1, "not-hex!");

        assert!(ctx.port_eeprom_path(1).await.is_err());
    }
}
