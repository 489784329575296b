//! End-to-end coverage for the intake pipeline and the back office reading
//! what it wrote, driven through the public facade and the HTTP routers.

mod common {
    use std::sync::Arc;

    use concorso::intake::{
        ApplicantDetails, Declarations, DocumentUpload, EmploymentCategory, FsSubmissionStore,
        PhotoCategory, PhotoUpload, SubmissionPipeline, SubmissionRequest, PHOTO_CONTENT_TYPE,
    };

    pub(super) const FISCAL_CODE: &str = "RSSMRA80A01H501U";

    pub(super) fn details() -> ApplicantDetails {
        ApplicantDetails {
            first_name: "Mario".to_string(),
            last_name: "Rossi".to_string(),
            email: "mario@example.com".to_string(),
            phone: "3331234567".to_string(),
            fiscal_code: FISCAL_CODE.to_string(),
            birth_date: "1980-01-01".to_string(),
            birth_place: "Roma".to_string(),
            residence_municipality: "Roma".to_string(),
            residence_address: "Via Appia 1".to_string(),
            employment: EmploymentCategory::None,
        }
    }

    pub(super) fn photo(category: PhotoCategory, title: &str) -> PhotoUpload {
        PhotoUpload {
            original_name: format!("{title}.jpg"),
            content_type: PHOTO_CONTENT_TYPE.to_string(),
            category,
            municipality: "Roma".to_string(),
            title: title.to_string(),
            bytes: format!("jpeg-bytes-{title}").into_bytes(),
        }
    }

    pub(super) fn submission() -> SubmissionRequest {
        SubmissionRequest {
            details: details(),
            declarations: Declarations {
                photo_authorship: true,
                content_suitability: true,
                terms_accepted: true,
                privacy_accepted: true,
            },
            signed_form: Some(DocumentUpload {
                original_name: "Allegato1.pdf".to_string(),
                bytes: b"%PDF-allegato".to_vec(),
            }),
            consent_release: Some(DocumentUpload {
                original_name: "Liberatoria.pdf".to_string(),
                bytes: b"%PDF-liberatoria".to_vec(),
            }),
            photos: vec![
                photo(PhotoCategory::FreeTheme, "Alba"),
                photo(PhotoCategory::FoodAndWine, "Vigna"),
            ],
        }
    }

    pub(super) fn pipeline(root: &std::path::Path) -> SubmissionPipeline<FsSubmissionStore> {
        SubmissionPipeline::new(Arc::new(FsSubmissionStore::new(root)))
    }
}

mod persistence {
    use super::common::*;
    use concorso::backoffice::Backoffice;

    #[test]
    fn back_office_lists_sealed_submissions_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = pipeline(dir.path());
        pipeline.submit(submission()).expect("first applicant");

        let mut second = submission();
        second.details.fiscal_code = "RSSFNC95T55H501N".to_string();
        second.details.first_name = "Francesca".to_string();
        pipeline.submit(second).expect("second applicant");

        let listing = Backoffice::new(dir.path())
            .list_submissions()
            .expect("listing");
        assert_eq!(listing.len(), 2);
        // Newest first.
        assert_eq!(listing[0].participant.fiscal_code, "RSSFNC95T55H501N");
        assert_eq!(listing[0].images_count, 2);
        assert!(listing[0].has_signed_form);
        assert!(listing[0].has_consent_release);
    }

    #[test]
    fn unsealed_folders_are_not_listed() {
        let dir = tempfile::tempdir().expect("tempdir");
        pipeline(dir.path()).submit(submission()).expect("submit");

        // Simulate a crash before the manifest write: folder, no dati.json.
        let partial = dir.path().join("BNCLRA85T45H501X");
        std::fs::create_dir_all(partial.join("documenti")).expect("partial folder");

        let listing = Backoffice::new(dir.path())
            .list_submissions()
            .expect("listing");
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].participant.fiscal_code, FISCAL_CODE);
    }

    #[test]
    fn media_listing_splits_photos_and_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        pipeline(dir.path()).submit(submission()).expect("submit");

        let media = Backoffice::new(dir.path())
            .media(FISCAL_CODE)
            .expect("media");
        assert_eq!(media.images.len(), 2);
        assert_eq!(media.documents.len(), 2);
        assert!(media
            .images
            .iter()
            .any(|entry| entry.path == "immagini/TL/Rossi_Mario_TL_Roma_Alba.jpg"));
        assert!(media
            .documents
            .iter()
            .any(|entry| entry.name.starts_with("Allegato1")));
    }

    #[test]
    fn integrity_verification_detects_tampering() {
        let dir = tempfile::tempdir().expect("tempdir");
        pipeline(dir.path()).submit(submission()).expect("submit");

        let backoffice = Backoffice::new(dir.path());
        assert!(backoffice.verify(FISCAL_CODE).expect("verify").ok);

        let tampered = dir
            .path()
            .join(FISCAL_CODE)
            .join("immagini/TL/Rossi_Mario_TL_Roma_Alba.jpg");
        std::fs::write(&tampered, b"edited").expect("tamper");

        let report = backoffice.verify(FISCAL_CODE).expect("verify");
        assert!(!report.ok);
        assert_eq!(
            report.mismatched,
            vec!["immagini/TL/Rossi_Mario_TL_Roma_Alba.jpg".to_string()]
        );
    }

    #[test]
    fn archive_round_trips_stored_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        pipeline(dir.path()).submit(submission()).expect("submit");

        let bytes = Backoffice::new(dir.path())
            .archive(FISCAL_CODE)
            .expect("archive");
        let mut zip =
            zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("valid zip archive");

        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).expect("entry").name().to_string())
            .collect();
        assert!(names.contains(&"dati.json".to_string()));
        assert!(names.contains(&"log.txt".to_string()));
        assert!(names.contains(&"immagini/TL/Rossi_Mario_TL_Roma_Alba.jpg".to_string()));
        assert!(names.contains(&format!("documenti/Allegato1_firmato_{FISCAL_CODE}.pdf")));

        use std::io::Read;
        let mut stored = Vec::new();
        zip.by_name("immagini/TL/Rossi_Mario_TL_Roma_Alba.jpg")
            .expect("entry")
            .read_to_end(&mut stored)
            .expect("read entry");
        assert_eq!(stored, b"jpeg-bytes-Alba");
    }

    #[test]
    fn concurrent_submissions_for_one_fiscal_code_yield_one_success() {
        use concorso::intake::SubmissionError;
        use std::sync::Arc;

        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = Arc::new(pipeline(dir.path()));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let pipeline = pipeline.clone();
                std::thread::spawn(move || pipeline.submit(submission()))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();

        let successes = results.iter().filter(|result| result.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|result| matches!(result, Err(SubmissionError::Duplicate)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 1);
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use concorso::backoffice::{backoffice_router, Backoffice, BackofficeContext, StaticCredentials};
    use concorso::config::AdminConfig;
    use concorso::intake::intake_router;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn admin_config() -> AdminConfig {
        AdminConfig {
            username: "admin".to_string(),
            password: "concorso2025".to_string(),
        }
    }

    fn backoffice_app(root: &std::path::Path) -> axum::Router {
        backoffice_router(Arc::new(BackofficeContext {
            backoffice: Backoffice::new(root),
            credentials: Arc::new(StaticCredentials::new(&admin_config())),
        }))
    }

    #[tokio::test]
    async fn login_issues_token_for_valid_credentials() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = backoffice_app(dir.path());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"username":"admin","password":"concorso2025"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let token = payload
            .get("token")
            .and_then(Value::as_str)
            .expect("token present");
        assert!(token.len() >= 10);

        let denied = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"nope"}"#))
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn back_office_routes_require_a_plausible_bearer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = backoffice_app(dir.path());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/backoffice/submissions")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/backoffice/submissions")
                    .header(header::AUTHORIZATION, "Bearer abcdefghijklmnop")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn download_returns_zip_attachment() {
        let dir = tempfile::tempdir().expect("tempdir");
        pipeline(dir.path()).submit(submission()).expect("submit");
        let app = backoffice_app(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/backoffice/download/{FISCAL_CODE}"))
                    .header(header::AUTHORIZATION, "Bearer abcdefghijklmnop")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
            Some(format!("attachment; filename=\"{FISCAL_CODE}.zip\"").as_str())
        );
    }

    fn push_text(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    fn push_file(
        body: &mut Vec<u8>,
        boundary: &str,
        name: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    fn multipart_submission(boundary: &str) -> Vec<u8> {
        multipart_submission_without(boundary, "")
    }

    fn multipart_submission_without(boundary: &str, omit: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in [
            ("nome", "Mario"),
            ("cognome", "Rossi"),
            ("email", "mario@example.com"),
            ("telefono", "3331234567"),
            ("codiceFiscale", FISCAL_CODE),
            ("dataNascita", "1980-01-01"),
            ("luogoNascita", "Roma"),
            ("residenzaComune", "Roma"),
            ("residenzaIndirizzo", "Via Appia 1"),
            ("dipendente", "nessuno"),
            ("dichiarazionePaternita", "true"),
            ("dichiarazioneContenuti", "true"),
            ("accettazioneRegolamento", "true"),
            ("accettazionePrivacy", "true"),
        ] {
            if name != omit {
                push_text(&mut body, boundary, name, value);
            }
        }
        push_file(
            &mut body,
            boundary,
            "allegato1",
            "Allegato1.pdf",
            "application/pdf",
            b"%PDF-allegato",
        );
        push_file(
            &mut body,
            boundary,
            "foto",
            "alba.jpg",
            "image/jpeg",
            b"jpeg-bytes-alba",
        );
        push_text(
            &mut body,
            boundary,
            "fotoMeta",
            r#"{"categoria":"TL","comune":"Roma Est","titolo":"Alba!"}"#,
        );
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn multipart_submission_is_persisted_and_renamed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = intake_router(Arc::new(pipeline(dir.path())));

        let boundary = "concorso-test-boundary";
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/submissions")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(multipart_submission(boundary)))
                    .expect("request"),
            )
            .await
            .expect("dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.get("filesCount").and_then(Value::as_u64), Some(2));
        assert_eq!(
            payload.get("codiceFiscale").and_then(Value::as_str),
            Some(FISCAL_CODE)
        );

        assert!(dir
            .path()
            .join(FISCAL_CODE)
            .join("immagini/TL/Rossi_Mario_TL_Roma_Est_Alba_.jpg")
            .is_file());

        // Same fiscal code again: the duplicate guard answers 409.
        let repeat = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/submissions")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(multipart_submission(boundary)))
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(repeat.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn submission_without_employment_field_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = intake_router(Arc::new(pipeline(dir.path())));

        let boundary = "concorso-test-boundary";
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/submissions")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(multipart_submission_without(
                        boundary,
                        "dipendente",
                    )))
                    .expect("request"),
            )
            .await
            .expect("dispatch");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024 * 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert!(payload
            .get("error")
            .and_then(Value::as_str)
            .expect("error message")
            .contains("dipendente"));
        assert!(!dir.path().join(FISCAL_CODE).exists());
    }
}
