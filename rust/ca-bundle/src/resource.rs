use std::path::{Path, PathBuf};

/// Directory that the system trust store picks additional anchors up from on the bootstrap node.
pub const DEFAULT_ANCHORS_DIR: &str = "/etc/pki/ca-trust/source/anchors";

const NAME_PREFIX: &str = "ca";
const FILE_EXTENSION: &str = "crt";
/// Number of hex characters of the SHA256 digest that are part of the name.
const NAME_DIGEST_LEN: usize = 16;

/// A single CA certificate taken from a bundle, ready to be written into the boot configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaResource {
    name: String,
    sha256: String,
    pem: Vec<u8>,
}

impl CaResource {
    /// `index` is the position of the certificate in its bundle. It keeps names unique even if
    /// the same certificate is listed more than once.
    pub(crate) fn new(index: usize, pem: Vec<u8>, sha256_digest: &[u8]) -> Self {
        let sha256 = hex::encode(sha256_digest);
        Self {
            name: resource_name(index, &sha256),
            sha256,
            pem,
        }
    }

    /// Deterministic identifier of the form `ca-<index>-<digest prefix>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex-encoded SHA256 digest of the certificate's DER encoding.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// The PEM block exactly as it was found in the bundle.
    pub fn pem(&self) -> &[u8] {
        &self.pem
    }

    pub fn into_pem(self) -> Vec<u8> {
        self.pem
    }

    pub fn file_name(&self) -> String {
        format!("{}.{FILE_EXTENSION}", self.name)
    }

    pub fn path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(self.file_name())
    }

    /// Encodes the certificate as a `data:` URL, as used for file sources in ignition configs.
    ///
    /// The encoded content is terminated by a newline, like any PEM file.
    pub fn data_url(&self) -> String {
        let mut contents = Vec::with_capacity(self.pem.len() + 1);
        contents.extend_from_slice(&self.pem);
        contents.push(b'\n');
        format!(
            "data:text/plain;charset=utf-8;base64,{}",
            openssl::base64::encode_block(&contents)
        )
    }
}

fn resource_name(index: usize, sha256: &str) -> String {
    let digest_prefix = &sha256[..NAME_DIGEST_LEN.min(sha256.len())];
    format!("{NAME_PREFIX}-{index:03}-{digest_prefix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming() {
        let resource = CaResource::new(7, b"pem".to_vec(), &[0xab; 32]);
        assert_eq!(resource.name(), "ca-007-abababababababab");
        assert_eq!(resource.sha256(), "ab".repeat(32));
        assert_eq!(resource.file_name(), "ca-007-abababababababab.crt");
        assert_eq!(
            resource.path_in(DEFAULT_ANCHORS_DIR),
            PathBuf::from("/etc/pki/ca-trust/source/anchors/ca-007-abababababababab.crt")
        );
    }

    #[test]
    fn test_index_wider_than_padding() {
        let resource = CaResource::new(1234, Vec::new(), &[0x01; 32]);
        assert_eq!(resource.name(), "ca-1234-0101010101010101");
    }

    #[test]
    fn test_data_url() {
        let resource = CaResource::new(0, b"foo".to_vec(), &[0; 32]);
        // base64("foo\n")
        assert_eq!(
            resource.data_url(),
            "data:text/plain;charset=utf-8;base64,Zm9vCg=="
        );
    }
}
