use openssl::{
    hash::{DigestBytes, MessageDigest},
    nid::Nid,
    x509::X509Ref,
};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to compute SHA256 fingerprint"))]
    Fingerprint { source: openssl::error::ErrorStack },

    #[snafu(display("failed to render serial number as hex"))]
    Serial { source: openssl::error::ErrorStack },
}

/// Identifying details of a certificate, used for naming and for logging.
#[derive(Debug)]
pub struct Identity {
    /// SHA256 over the DER encoding.
    pub sha256: DigestBytes,
    pub serial: String,
    /// Common name of the subject, if it has one.
    pub common_name: Option<String>,
}

pub trait CertExt {
    fn identity(&self) -> Result<Identity, Error>;
}

impl CertExt for X509Ref {
    fn identity(&self) -> Result<Identity, Error> {
        let sha256 = self
            .digest(MessageDigest::sha256())
            .context(FingerprintSnafu)?;
        let serial = self
            .serial_number()
            .to_bn()
            .and_then(|serial| serial.to_hex_str())
            .context(SerialSnafu)?
            .to_string();
        let common_name = self
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().as_utf8().ok())
            .map(|cn| cn.to_string());
        Ok(Identity {
            sha256,
            serial,
            common_name,
        })
    }
}
