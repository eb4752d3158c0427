use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use cluster_installer_ca_bundle::{parse_certificate_bundle, CaResource};
use serde::Serialize;
use snafu::{ResultExt, Snafu};

use crate::cli::ParseCaBundleArguments;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read CA bundle from {path}", path = path.display()))]
    ReadBundle {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse CA bundle at {path}", path = path.display()))]
    ParseBundle {
        source: cluster_installer_ca_bundle::ParseError,
        path: PathBuf,
    },

    #[snafu(display("failed to create output directory {path}", path = path.display()))]
    CreateOutDir {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to stage certificate in {path}", path = path.display()))]
    StageCertificate {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to move certificate into place at {path}", path = path.display()))]
    PersistCertificate {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to serialize manifest"))]
    SerializeManifest { source: serde_json::Error },

    #[snafu(display("failed to write manifest to {path}", path = path.display()))]
    WriteManifest {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to write manifest to stdout"))]
    WriteManifestStdout { source: std::io::Error },
}

/// One entry of the manifest, describing where a certificate is installed and what it contains.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub path: PathBuf,
    pub sha256: String,
    pub source: String,
}

impl ManifestEntry {
    fn new(resource: &CaResource, anchors_dir: &Path) -> Self {
        Self {
            name: resource.name().to_owned(),
            path: resource.path_in(anchors_dir),
            sha256: resource.sha256().to_owned(),
            source: resource.data_url(),
        }
    }
}

pub fn parse_ca_bundle(args: ParseCaBundleArguments) -> Result<(), Error> {
    let bundle = fs::read(&args.bundle).context(ReadBundleSnafu { path: &args.bundle })?;
    let resources =
        parse_certificate_bundle(&bundle).context(ParseBundleSnafu { path: &args.bundle })?;
    tracing::info!(
        bundle = %args.bundle.display(),
        certificates = resources.len(),
        "Parsed CA bundle"
    );

    if let Some(out_dir) = &args.out_dir {
        write_certificates(&resources, out_dir)?;
    }

    let manifest = resources
        .iter()
        .map(|resource| ManifestEntry::new(resource, &args.anchors_dir))
        .collect::<Vec<_>>();
    let manifest = serde_json::to_vec_pretty(&manifest).context(SerializeManifestSnafu)?;

    match &args.manifest {
        Some(path) => fs::write(path, &manifest).context(WriteManifestSnafu { path }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&manifest)
                .and_then(|()| stdout.write_all(b"\n"))
                .context(WriteManifestStdoutSnafu)
        }
    }
}

/// Writes one file per certificate into `out_dir`.
///
/// All files are staged next to their final location first, so a failed write leaves no
/// certificates behind.
fn write_certificates(resources: &[CaResource], out_dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(out_dir).context(CreateOutDirSnafu { path: out_dir })?;
    let staged = resources
        .iter()
        .map(|resource| {
            let mut file = tempfile::Builder::new()
                .prefix(".staged-")
                .tempfile_in(out_dir)
                .context(StageCertificateSnafu { path: out_dir })?;
            file.write_all(resource.pem())
                .and_then(|()| file.write_all(b"\n"))
                .context(StageCertificateSnafu { path: out_dir })?;
            Ok((resource, file))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut persisted = Vec::with_capacity(staged.len());
    for (resource, file) in staged {
        let path = resource.path_in(out_dir);
        if let Err(err) = file.persist(&path) {
            // Staged files that were not persisted yet are removed when dropped
            for path in &persisted {
                let _ = fs::remove_file(path);
            }
            return Err(err.error).context(PersistCertificateSnafu { path });
        }
        tracing::info!(
            ca.name = resource.name(),
            ca.sha256 = resource.sha256(),
            path = %path.display(),
            "Wrote certificate"
        );
        persisted.push(path);
    }
    Ok(())
}
