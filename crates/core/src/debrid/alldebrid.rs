//! AllDebrid v4 API client.
//!
//! Every response is an envelope `{"status": "success", "data": ...}` or
//! `{"status": "error", "error": {"code", "message"}}`, decoded here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DebridClient, DebridError, Magnet, MagnetRequest, Readiness, VideoFile};
use crate::config::AllDebridConfig;

const DEFAULT_BASE_URL: &str = "https://api.alldebrid.com";

/// AllDebrid API client.
pub struct AllDebridClient {
    client: Client,
    base_url: String,
    api_key: String,
    agent: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, DebridError> {
        if self.status == "success" {
            return self
                .data
                .ok_or_else(|| DebridError::Parse("success envelope without data".to_string()));
        }

        let error = self.error.unwrap_or(ApiErrorBody {
            code: "UNKNOWN".to_string(),
            message: format!("status '{}'", self.status),
        });
        Err(DebridError::Rejected {
            code: error.code,
            message: error.message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    magnets: Vec<UploadedMagnet>,
}

#[derive(Debug, Deserialize)]
struct UploadedMagnet {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FilesData {
    #[serde(default)]
    magnets: Vec<MagnetFiles>,
}

#[derive(Debug, Deserialize)]
struct MagnetFiles {
    #[serde(default)]
    files: Vec<FileNode>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

/// File tree node: `n` name, `s` size, `l` link, `e` children.
#[derive(Debug, Deserialize)]
struct FileNode {
    n: String,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    l: Option<String>,
    #[serde(default)]
    e: Option<Vec<FileNode>>,
}

#[derive(Debug, Deserialize)]
struct UnlockData {
    link: String,
}

impl AllDebridClient {
    pub fn new(config: &AllDebridConfig, timeout: Duration) -> Result<Self, DebridError> {
        if config.api_key.trim().is_empty() {
            return Err(DebridError::NotConfigured(
                "AllDebrid API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            agent: config.agent.clone(),
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, DebridError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .query(&[("agent", self.agent.as_str())])
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_envelope(path, status, &body)
    }
}

fn decode_envelope<T: DeserializeOwned>(
    path: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> Result<T, DebridError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => envelope.into_data(),
        Err(_) if !status.is_success() => Err(DebridError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        }),
        Err(e) => Err(DebridError::Parse(format!(
            "Unexpected response from {}: {}",
            path, e
        ))),
    }
}

/// Flatten the file tree into files that carry a link.
fn flatten_files(nodes: Vec<FileNode>, out: &mut Vec<VideoFile>) {
    for node in nodes {
        match node.e {
            Some(children) => flatten_files(children, out),
            None => {
                if let Some(link) = node.l.filter(|l| !l.is_empty()) {
                    out.push(VideoFile {
                        name: node.n,
                        size_bytes: node.s.unwrap_or(0),
                        link,
                    });
                }
            }
        }
    }
}

fn to_magnets(data: UploadData, requests: &[MagnetRequest]) -> Vec<Magnet> {
    data.magnets
        .into_iter()
        .filter_map(|uploaded| {
            if let Some(error) = uploaded.error {
                warn!(
                    hash = ?uploaded.hash,
                    code = %error.code,
                    message = %error.message,
                    "Magnet rejected by AllDebrid"
                );
                return None;
            }

            let hash = uploaded.hash?.to_lowercase();
            let remote_id = uploaded.id?;
            let source = requests
                .iter()
                .find(|r| r.hash.eq_ignore_ascii_case(&hash))
                .map(|r| r.source.clone())
                .unwrap_or_default();

            Some(Magnet {
                name: uploaded.name.unwrap_or_else(|| hash.clone()),
                hash,
                remote_id,
                size_bytes: uploaded.size.unwrap_or(0),
                readiness: if uploaded.ready {
                    Readiness::Ready
                } else {
                    Readiness::NotReady
                },
                source,
            })
        })
        .collect()
}

#[async_trait]
impl DebridClient for AllDebridClient {
    fn name(&self) -> &str {
        "alldebrid"
    }

    async fn upload_magnets(&self, magnets: &[MagnetRequest]) -> Result<Vec<Magnet>, DebridError> {
        if magnets.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = magnets.len(), "Uploading magnets");

        let form: Vec<(&str, String)> = magnets
            .iter()
            .map(|m| ("magnets[]", m.hash.clone()))
            .collect();
        let data: UploadData = self.post("/v4/magnet/upload", &form).await?;

        Ok(to_magnets(data, magnets))
    }

    async fn list_files(&self, remote_id: u64) -> Result<Vec<VideoFile>, DebridError> {
        debug!(remote_id, "Listing magnet files");

        let data: FilesData = self
            .post("/v4/magnet/files", &[("id[]", remote_id.to_string())])
            .await?;

        let Some(magnet) = data.magnets.into_iter().next() else {
            return Ok(Vec::new());
        };
        if let Some(error) = magnet.error {
            return Err(DebridError::Rejected {
                code: error.code,
                message: error.message,
            });
        }

        let mut files = Vec::new();
        flatten_files(magnet.files, &mut files);
        Ok(files)
    }

    async fn unlock(&self, link: &str) -> Result<String, DebridError> {
        debug!(link, "Unlocking link");

        let data: UnlockData = self
            .post("/v4/link/unlock", &[("link", link.to_string())])
            .await?;
        Ok(data.link)
    }

    async fn delete_magnets(&self, remote_ids: &[u64]) -> Result<(), DebridError> {
        if remote_ids.is_empty() {
            return Ok(());
        }
        debug!(count = remote_ids.len(), "Deleting magnets");

        let form: Vec<(&str, String)> = remote_ids
            .iter()
            .map(|id| ("ids[]", id.to_string()))
            .collect();
        let _: serde_json::Value = self.post("/v4/magnet/delete", &form).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_envelope_skips_rejected_magnets() {
        let json = r#"{
            "status": "success",
            "data": {"magnets": [
                {"magnet": "ABC", "hash": "ABC", "name": "Movie.2020", "size": 100, "ready": true, "id": 11},
                {"magnet": "bad", "error": {"code": "MAGNET_INVALID_URI", "message": "invalid"}},
                {"magnet": "def", "hash": "def", "name": "Other", "size": 5, "ready": false, "id": 12}
            ]}
        }"#;
        let envelope: Envelope<UploadData> = serde_json::from_str(json).unwrap();
        let requests = vec![MagnetRequest {
            hash: "abc".to_string(),
            source: "sharewood".to_string(),
        }];
        let magnets = to_magnets(envelope.into_data().unwrap(), &requests);

        assert_eq!(magnets.len(), 2);
        assert_eq!(magnets[0].hash, "abc");
        assert_eq!(magnets[0].source, "sharewood");
        assert!(magnets[0].is_ready());
        assert_eq!(magnets[1].remote_id, 12);
        assert_eq!(magnets[1].readiness, Readiness::NotReady);
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"status": "error", "error": {"code": "AUTH_BAD_APIKEY", "message": "The auth apikey is invalid"}}"#;
        let envelope: Envelope<UnlockData> = serde_json::from_str(json).unwrap();
        match envelope.into_data() {
            Err(DebridError::Rejected { code, .. }) => assert_eq!(code, "AUTH_BAD_APIKEY"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_envelope_without_data() {
        let ok = reqwest::StatusCode::OK;
        let result: Result<UnlockData, _> =
            decode_envelope("/link/unlock", ok, r#"{"status": "success"}"#);
        assert!(matches!(result, Err(DebridError::Parse(_))));

        let result: Result<UnlockData, _> = decode_envelope(
            "/link/unlock",
            ok,
            r#"{"status": "error", "error": {"code": "LINK_DOWN", "message": "down"}}"#,
        );
        assert!(matches!(result, Err(DebridError::Rejected { .. })));

        let result: Result<UnlockData, _> = decode_envelope(
            "/link/unlock",
            reqwest::StatusCode::BAD_GATEWAY,
            "<html>bad gateway</html>",
        );
        assert!(matches!(result, Err(DebridError::Api { status: 502, .. })));
    }

    #[test]
    fn test_flatten_nested_files() {
        let json = r#"{
            "status": "success",
            "data": {"magnets": [{"id": "11", "files": [
                {"n": "Show.S01E01.mkv", "s": 100, "l": "https://alldebrid.com/f/1"},
                {"n": "Show S01", "e": [
                    {"n": "Show.S01E02.mkv", "s": 200, "l": "https://alldebrid.com/f/2"},
                    {"n": "nolink.nfo", "s": 1}
                ]}
            ]}]}
        }"#;
        let envelope: Envelope<FilesData> = serde_json::from_str(json).unwrap();
        let magnet = envelope.into_data().unwrap().magnets.into_iter().next().unwrap();
        let mut files = Vec::new();
        flatten_files(magnet.files, &mut files);

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Show.S01E01.mkv", "Show.S01E02.mkv"]);
        assert_eq!(files[1].size_bytes, 200);
    }

    #[test]
    fn test_requires_api_key() {
        let config = AllDebridConfig {
            api_key: String::new(),
            base_url: None,
            agent: "relaystream".to_string(),
        };
        assert!(matches!(
            AllDebridClient::new(&config, Duration::from_secs(1)),
            Err(DebridError::NotConfigured(_))
        ));
    }
}
