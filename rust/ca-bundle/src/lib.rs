//! Ingestion of the additional CA bundle that operators can configure for a cluster.
//!
//! The bundle is a sequence of PEM `CERTIFICATE` blocks, optionally surrounded and separated by
//! blank lines. Every block must hold a structurally valid X.509 certificate; there is no
//! best-effort mode, a single bad block rejects the whole bundle. Trust chains, expiry and key
//! usage are not checked here.

use cluster_installer_utils::pem::{self, pem_blocks, PemBlock};
use openssl::x509::X509;
use snafu::{ensure, ResultExt, Snafu};

use crate::cert_ext::CertExt;
pub use crate::resource::{CaResource, DEFAULT_ANCHORS_DIR};

pub mod cert_ext;
mod resource;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

#[derive(Debug, Snafu)]
#[snafu(display(
    "invalid certificate bundle: block {index} at byte offset {offset} is not a valid certificate"
))]
pub struct ParseError {
    source: InvalidBlockError,
    index: usize,
    offset: usize,
}

impl ParseError {
    /// Zero-based position of the offending block in the bundle.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of the offending block in the bundle.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum InvalidBlockError {
    #[snafu(display("malformed PEM framing"), context(false))]
    Framing { source: pem::Error },

    #[snafu(display("expected a CERTIFICATE block, found {label:?}"))]
    UnexpectedLabel { label: String },

    #[snafu(display("failed to decode certificate payload"))]
    DecodePayload { source: pem::DecodeError },

    #[snafu(display("failed to parse payload as an X.509 certificate"))]
    ParseCertificate { source: openssl::error::ErrorStack },

    #[snafu(display("failed to re-encode certificate"))]
    EncodeCertificate { source: openssl::error::ErrorStack },

    #[snafu(display("certificate is followed by {trailing} bytes of trailing data"))]
    TrailingData { trailing: usize },

    #[snafu(display("failed to identify certificate"))]
    IdentifyCertificate { source: cert_ext::Error },
}

/// Parses `bundle` into one [`CaResource`] per certificate, in bundle order.
///
/// An empty or whitespace-only bundle yields no resources.
pub fn parse_certificate_bundle(bundle: &[u8]) -> Result<Vec<CaResource>, ParseError> {
    let resources = ca_resources(bundle).collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(certificates = resources.len(), "Parsed certificate bundle");
    Ok(resources)
}

/// Lazy variant of [`parse_certificate_bundle`]. Stops after the first error.
pub fn ca_resources(bundle: &[u8]) -> impl Iterator<Item = Result<CaResource, ParseError>> + '_ {
    pem_blocks(bundle).enumerate().map(|(index, block)| {
        let offset = match &block {
            Ok(block) => block.offset(),
            Err(err) => err.offset(),
        };
        parse_block(index, block).context(ParseSnafu { index, offset })
    })
}

fn parse_block(
    index: usize,
    block: Result<PemBlock<'_>, pem::Error>,
) -> Result<CaResource, InvalidBlockError> {
    use invalid_block_error::*;
    let block = block?;
    ensure!(
        block.label() == CERTIFICATE_LABEL,
        UnexpectedLabelSnafu {
            label: block.label()
        }
    );
    let der = block.decode_payload().context(DecodePayloadSnafu)?;
    let certificate = X509::from_der(&der).context(ParseCertificateSnafu)?;
    // d2i stops after the first certificate, anything behind it must be rejected explicitly
    let encoded = certificate.to_der().context(EncodeCertificateSnafu)?;
    ensure!(
        encoded == der,
        TrailingDataSnafu {
            trailing: der.len().saturating_sub(encoded.len())
        }
    );
    let identity = certificate.identity().context(IdentifyCertificateSnafu)?;

    let resource = CaResource::new(index, block.raw().to_vec(), &identity.sha256);
    tracing::debug!(
        ca.name = resource.name(),
        hash.sha256 = resource.sha256(),
        subject.common_name = identity.common_name.as_deref(),
        serial = %identity.serial,
        not_after = ?certificate.not_after(),
        "Parsed CA certificate"
    );
    Ok(resource)
}
