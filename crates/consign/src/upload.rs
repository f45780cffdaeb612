//! Two-phase file upload: register with the API, then post the bytes to
//! the presigned URL the registration hands back.

use std::path::Path;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};

use crate::api::ApiClient;
use crate::checksum;
use crate::error::PublishError;
use crate::report::Reporter;

pub struct Uploader<'a> {
    api: &'a ApiClient,
    transfer: &'a Client,
    owner: &'a str,
    repository: &'a str,
}

impl<'a> Uploader<'a> {
    pub fn new(
        api: &'a ApiClient,
        transfer: &'a Client,
        owner: &'a str,
        repository: &'a str,
    ) -> Self {
        Self {
            api,
            transfer,
            owner,
            repository,
        }
    }

    /// Push one file through the two-phase upload.
    ///
    /// The checksum is computed up front and sent with the registration so
    /// the service can verify the stored bytes. The returned identifier is
    /// what package assembly later refers to. `source_name` is the local
    /// file's own name; the registration payload, the multipart file part,
    /// and failure details all carry it, whatever the file is destined to
    /// be called in the repository. The presigned POST itself is
    /// unauthenticated; the registration response carries all credentials
    /// as form fields, and the file part must come after them.
    pub fn upload(
        &self,
        source: &Path,
        source_name: &str,
        content_type: &str,
        reporter: &mut dyn Reporter,
    ) -> Result<String, PublishError> {
        let digest = checksum::md5_hex(source).map_err(|err| PublishError::ChecksumIo {
            file: source_name.to_string(),
            source: err,
        })?;

        reporter.debug(&format!(
            "Requesting file upload for {source_name} (md5 {digest})"
        ));
        let registration =
            self.api
                .register_upload(self.owner, self.repository, source_name, &digest)?;

        reporter.info(&format!("Uploading {source_name} ({content_type})"));
        let mut form = Form::new();
        for (key, value) in &registration.upload_fields {
            form = form.text(key.clone(), value.clone());
        }
        let part = Part::file(source)
            .map_err(|err| PublishError::UploadIo {
                file: source_name.to_string(),
                source: err,
            })?
            .file_name(source_name.to_string())
            .mime_str(content_type)
            .map_err(|err| PublishError::UploadTransport {
                file: source_name.to_string(),
                source: err,
            })?;
        let form = form.part("file", part).text("md5_checksum", digest);

        let resp = self
            .transfer
            .post(&registration.upload_url)
            .multipart(form)
            .send()
            .map_err(|err| PublishError::UploadTransport {
                file: source_name.to_string(),
                source: err,
            })?;

        let status = resp.status();
        if status.is_success() {
            reporter.debug(&format!(
                "Uploaded {source_name} as {}",
                registration.identifier
            ));
            return Ok(registration.identifier);
        }
        if status == StatusCode::BAD_REQUEST {
            // 400 carries the storage backend's own explanation.
            return Err(PublishError::UploadRejected {
                status: status.as_u16(),
                detail: resp.text().unwrap_or_default(),
            });
        }
        Err(PublishError::UploadRejected {
            status: status.as_u16(),
            detail: format!("failed to upload file: {source_name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use tempfile::tempdir;
    use tiny_http::{Header, Response, Server, StatusCode};

    use super::*;
    use crate::api::API_KEY_HEADER;

    #[derive(Default)]
    struct CollectingReporter {
        debugs: Vec<String>,
        infos: Vec<String>,
        warns: Vec<String>,
        errors: Vec<String>,
    }

    impl Reporter for CollectingReporter {
        fn debug(&mut self, msg: &str) {
            self.debugs.push(msg.to_string());
        }

        fn info(&mut self, msg: &str) {
            self.infos.push(msg.to_string());
        }

        fn warn(&mut self, msg: &str) {
            self.warns.push(msg.to_string());
        }

        fn error(&mut self, msg: &str) {
            self.errors.push(msg.to_string());
        }
    }

    struct TestCaptureServer {
        base_url: String,
        #[allow(clippy::type_complexity)]
        seen: Arc<Mutex<Vec<(String, String, Option<String>)>>>,
        handle: thread::JoinHandle<()>,
    }

    impl TestCaptureServer {
        fn join(self) {
            self.handle.join().expect("join server");
        }
    }

    fn spawn_capture_server(
        mut routes: std::collections::BTreeMap<String, Vec<(u16, String)>>,
        expected_requests: usize,
    ) -> TestCaptureServer {
        let server = Server::http("127.0.0.1:0").expect("server");
        let base_url = format!("http://{}", server.server_addr());
        let seen = Arc::new(Mutex::new(Vec::<(String, String, Option<String>)>::new()));
        let seen_thread = Arc::clone(&seen);

        let handle = thread::spawn(move || {
            for _ in 0..expected_requests {
                let mut req = server.recv().expect("request");
                let path = req.url().to_string();
                let mut body = String::new();
                let _ = std::io::Read::read_to_string(req.as_reader(), &mut body);
                let api_key = req
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv(API_KEY_HEADER))
                    .map(|h| h.value.as_str().to_string());
                seen_thread
                    .lock()
                    .expect("lock")
                    .push((path.clone(), body, api_key));

                let response = if let Some(list) = routes.get_mut(&path) {
                    if list.is_empty() {
                        (404, "{}".to_string())
                    } else if list.len() == 1 {
                        list[0].clone()
                    } else {
                        list.remove(0)
                    }
                } else {
                    (404, "{}".to_string())
                };

                let resp = Response::from_string(response.1)
                    .with_status_code(StatusCode(response.0))
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json").expect("header"),
                    );
                req.respond(resp).expect("respond");
            }
        });

        TestCaptureServer {
            base_url,
            seen,
            handle,
        }
    }

    fn api_client(base: &str) -> ApiClient {
        ApiClient::new(
            base,
            Some("sekrit".to_string()),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .expect("api client")
    }

    fn jar_fixture(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("widget-1.0.jar");
        fs::write(&path, b"PK\x03\x04demo-bytes").expect("write fixture");
        path
    }

    fn registration_body(storage_base: &str) -> String {
        format!(
            r#"{{"identifier":"file-7","upload_url":"{storage_base}/put/","upload_fields":{{"acl":"private","key":"k1"}}}}"#
        )
    }

    fn server_seen(server: &TestCaptureServer) -> Vec<(String, String, Option<String>)> {
        server.seen.lock().expect("lock").clone()
    }

    #[test]
    fn uploads_file_and_returns_identifier() {
        let mut storage_routes = std::collections::BTreeMap::new();
        storage_routes.insert("/put/".to_string(), vec![(201, "{}".to_string())]);
        let storage = spawn_capture_server(storage_routes, 1);

        let mut api_routes = std::collections::BTreeMap::new();
        api_routes.insert(
            "/files/acme/widgets/".to_string(),
            vec![(200, registration_body(&storage.base_url))],
        );
        let api_server = spawn_capture_server(api_routes, 1);

        let td = tempdir().expect("tempdir");
        let path = jar_fixture(td.path());

        let api = api_client(&api_server.base_url);
        let transfer = Client::new();
        let uploader = Uploader::new(&api, &transfer, "acme", "widgets");
        let mut reporter = CollectingReporter::default();

        let identifier = uploader
            .upload(&path, "widget-1.0.jar", "application/java-archive", &mut reporter)
            .expect("upload");
        assert_eq!(identifier, "file-7");
        assert!(
            reporter
                .infos
                .iter()
                .any(|msg| msg == "Uploading widget-1.0.jar (application/java-archive)")
        );
        assert!(reporter.warns.is_empty());
        assert!(reporter.errors.is_empty());

        let api_seen = server_seen(&api_server);
        assert_eq!(api_seen[0].0, "/files/acme/widgets/");
        assert_eq!(api_seen[0].2.as_deref(), Some("sekrit"));

        let storage_seen = server_seen(&storage);
        let body = &storage_seen[0].1;
        assert_eq!(storage_seen[0].2, None, "presigned POST must not carry the api key");
        assert!(body.contains("name=\"acl\""));
        assert!(body.contains("name=\"key\""));
        assert!(body.contains("filename=\"widget-1.0.jar\""));
        assert!(body.contains("application/java-archive"));
        assert!(body.contains("demo-bytes"));
        assert!(body.contains("name=\"md5_checksum\""));

        let fields_at = body.find("name=\"key\"").expect("fields present");
        let file_at = body.find("name=\"file\"").expect("file part present");
        let checksum_at = body.find("name=\"md5_checksum\"").expect("checksum present");
        assert!(fields_at < file_at, "server fields must precede the file part");
        assert!(file_at < checksum_at, "checksum part must follow the file");

        api_server.join();
        storage.join();
    }

    #[test]
    fn bad_request_surfaces_storage_detail_verbatim() {
        let mut storage_routes = std::collections::BTreeMap::new();
        storage_routes.insert("/put/".to_string(), vec![(400, "bad signature".to_string())]);
        let storage = spawn_capture_server(storage_routes, 1);

        let mut api_routes = std::collections::BTreeMap::new();
        api_routes.insert(
            "/files/acme/widgets/".to_string(),
            vec![(200, registration_body(&storage.base_url))],
        );
        let api_server = spawn_capture_server(api_routes, 1);

        let td = tempdir().expect("tempdir");
        let path = jar_fixture(td.path());

        let api = api_client(&api_server.base_url);
        let transfer = Client::new();
        let uploader = Uploader::new(&api, &transfer, "acme", "widgets");
        let mut reporter = CollectingReporter::default();

        let err = uploader
            .upload(&path, "widget-1.0.jar", "application/java-archive", &mut reporter)
            .expect_err("rejected upload");
        match err {
            PublishError::UploadRejected { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "bad signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        api_server.join();
        storage.join();
    }

    #[test]
    fn other_rejections_use_a_generic_detail() {
        let mut storage_routes = std::collections::BTreeMap::new();
        storage_routes.insert("/put/".to_string(), vec![(503, "slow down".to_string())]);
        let storage = spawn_capture_server(storage_routes, 1);

        let mut api_routes = std::collections::BTreeMap::new();
        api_routes.insert(
            "/files/acme/widgets/".to_string(),
            vec![(200, registration_body(&storage.base_url))],
        );
        let api_server = spawn_capture_server(api_routes, 1);

        let td = tempdir().expect("tempdir");
        let path = jar_fixture(td.path());

        let api = api_client(&api_server.base_url);
        let transfer = Client::new();
        let uploader = Uploader::new(&api, &transfer, "acme", "widgets");
        let mut reporter = CollectingReporter::default();

        let err = uploader
            .upload(&path, "widget-1.0.jar", "application/java-archive", &mut reporter)
            .expect_err("rejected upload");
        match err {
            PublishError::UploadRejected { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail, "failed to upload file: widget-1.0.jar");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        api_server.join();
        storage.join();
    }

    #[test]
    fn registration_failure_skips_the_transfer() {
        let storage = spawn_capture_server(std::collections::BTreeMap::new(), 0);

        let mut api_routes = std::collections::BTreeMap::new();
        api_routes.insert(
            "/files/acme/widgets/".to_string(),
            vec![(403, "key lacks upload permission".to_string())],
        );
        let api_server = spawn_capture_server(api_routes, 1);

        let td = tempdir().expect("tempdir");
        let path = jar_fixture(td.path());

        let api = api_client(&api_server.base_url);
        let transfer = Client::new();
        let uploader = Uploader::new(&api, &transfer, "acme", "widgets");
        let mut reporter = CollectingReporter::default();

        let err = uploader
            .upload(&path, "widget-1.0.jar", "application/java-archive", &mut reporter)
            .expect_err("rejected registration");
        assert!(matches!(err, PublishError::RegistrationRejected { .. }));
        assert!(err.to_string().contains("key lacks upload permission"));

        api_server.join();
        storage.join();
    }

    #[test]
    fn checksum_failure_never_touches_the_network() {
        let api_server = spawn_capture_server(std::collections::BTreeMap::new(), 0);

        let td = tempdir().expect("tempdir");
        let missing = td.path().join("absent.jar");

        let api = api_client(&api_server.base_url);
        let transfer = Client::new();
        let uploader = Uploader::new(&api, &transfer, "acme", "widgets");
        let mut reporter = CollectingReporter::default();

        let err = uploader
            .upload(&missing, "absent.jar", "application/java-archive", &mut reporter)
            .expect_err("missing file");
        assert!(matches!(err, PublishError::ChecksumIo { .. }));
        assert!(reporter.infos.is_empty());

        api_server.join();
    }
}
