//! Fetching of remote objects into a scratch directory before rendering.

use crate::error::{RenderError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn is_remote(object_path: &str) -> bool {
    object_path.starts_with("http")
}

/// UID from the URL's last path segment, up to the first `.`.
pub fn object_uid_from_url(url: &str) -> String {
    let segment = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or(url);
    segment.split('.').next().unwrap_or(segment).to_string()
}

/// Downloads through `{uid}.glb.tmp` and renames to `{uid}.glb` once complete.
pub fn download_object(url: &str, dir: &Path) -> Result<PathBuf> {
    let uid = object_uid_from_url(url);
    fs::create_dir_all(dir).map_err(|e| RenderError::io(dir, e))?;

    let tmp_path = dir.join(format!("{}.glb.tmp", uid));
    let final_path = dir.join(format!("{}.glb", uid));

    log::info!("Downloading {}", url);
    let network = |source| RenderError::Network {
        url: url.to_string(),
        source,
    };
    let bytes = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(network)?;

    fs::write(&tmp_path, &bytes).map_err(|e| RenderError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, &final_path).map_err(|e| RenderError::io(&tmp_path, e))?;

    let absolute = final_path
        .canonicalize()
        .map_err(|e| RenderError::io(&final_path, e))?;
    log::debug!("Saved {} bytes to {}", bytes.len(), absolute.display());
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::tempdir;

    /// Answers a single GET with `body` and returns the server's base URL.
    fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(&body).unwrap();
        });
        base
    }

    #[test]
    fn download_is_renamed_from_tmp_to_absolute_glb() {
        let body = b"glTF\x02\x00\x00\x00payload".to_vec();
        let base = serve_once(body.clone());
        let dir = tempdir().unwrap();
        let scratch = dir.path().join("tmp-objects");

        let path = download_object(&format!("{}/glbs/000-001/abc.glb", base), &scratch).unwrap();

        assert!(path.is_absolute());
        assert_eq!(path.file_name().unwrap(), "abc.glb");
        assert_eq!(fs::read(&path).unwrap(), body);
        assert!(!scratch.join("abc.glb.tmp").exists());
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 1);
    }

    #[test]
    fn uid_comes_from_last_segment() {
        let url = "https://huggingface.co/datasets/allenai/objaverse/resolve/main/glbs/000-023/8476c4170df24cf5bbe6967222d1a42d.glb";

        assert!(is_remote(url));
        assert!(!is_remote("/data/objects/chair.glb"));
        assert_eq!(object_uid_from_url(url), "8476c4170df24cf5bbe6967222d1a42d");
        assert_eq!(object_uid_from_url("http://host/a/b.glb?download=1"), "b");
    }
}
