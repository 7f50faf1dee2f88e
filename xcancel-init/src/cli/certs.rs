//! Moving mkcert output into the layout the proxy containers mount.
//!
//! mkcert writes `twitter.com+N.pem` and `twitter.com+N-key.pem` into its
//! working directory. Both are copied to `<server>/ssl/` under fixed names,
//! given fixed modes, and the originals are removed.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    constants::{
        CERT_BUNDLE_MODE, CERT_BUNDLE_NAME, CERT_KEY_MODE, CERT_KEY_NAME,
        MKCERT_KEY_MARKER, MKCERT_OUTPUT_PREFIX,
    },
    error::CertError,
    models::{InstalledCerts, WebServer},
};

/// Generated certificate and key paths in the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCerts {
    /// Issued certificate.
    pub cert: PathBuf,
    /// Private key for `cert`.
    pub key: PathBuf,
}

/// Find the mkcert output pair in `dir`; a file with `-key` in its name is
/// the key, any other match is the certificate.
pub fn locate_generated(dir: &Path) -> Result<GeneratedCerts, CertError> {
    let entries = fs::read_dir(dir).map_err(|source| CertError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut cert = None;
    let mut key = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(MKCERT_OUTPUT_PREFIX) || !name.ends_with(".pem") {
            continue;
        }
        if name.contains(MKCERT_KEY_MARKER) {
            key = Some(entry.path());
        } else {
            cert = Some(entry.path());
        }
    }

    match (cert, key) {
        (Some(cert), Some(key)) => Ok(GeneratedCerts { cert, key }),
        _ => Err(CertError::MissingOutput {
            dir: dir.to_path_buf(),
        }),
    }
}

/// `<project>/<server>/ssl`.
pub fn ssl_dir(project_dir: &Path, server: WebServer) -> PathBuf {
    project_dir.join(server.slug()).join("ssl")
}

/// Copy, chmod, then delete the originals.
pub fn install_generated(
    generated: &GeneratedCerts,
    project_dir: &Path,
    server: WebServer,
) -> Result<InstalledCerts, CertError> {
    let dir = ssl_dir(project_dir, server);
    fs::create_dir_all(&dir).map_err(|source| CertError::Io {
        path: dir.clone(),
        source,
    })?;

    let bundle = dir.join(CERT_BUNDLE_NAME);
    let key = dir.join(CERT_KEY_NAME);

    copy_with_mode(&generated.cert, &bundle, CERT_BUNDLE_MODE)?;
    copy_with_mode(&generated.key, &key, CERT_KEY_MODE)?;

    for original in [&generated.cert, &generated.key] {
        fs::remove_file(original).map_err(|source| CertError::Io {
            path: original.clone(),
            source,
        })?;
    }

    debug!(ssl_dir = %dir.display(), "installed certificates");
    Ok(InstalledCerts {
        ssl_dir: dir,
        bundle,
        key,
    })
}

fn copy_with_mode(from: &Path, to: &Path, mode: u32) -> Result<(), CertError> {
    let io_err = |source: std::io::Error| CertError::Io {
        path: to.to_path_buf(),
        source,
    };
    fs::copy(from, to).map_err(io_err)?;
    set_mode(to, mode).map_err(io_err)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
