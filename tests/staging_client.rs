// ABOUTME: Integration tests for the HTTP staging client against a mock server.
// ABOUTME: Covers JSON/XML decoding, 404 normalization, transport retries, auth errors and dry-run.

mod support;

use serde_json::json;
use stagehand::staging::{RepositoryState, StagingClient, StagingOps, StagingSettings};
use stagehand::types::{Coordinates, Deployable, ProfileId, RepositoryId};
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_bytes, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "deployer";
const PASSWORD: &str = "s3cret";

fn settings(server: &MockServer) -> StagingSettings {
    StagingSettings {
        url: format!("{}/", server.uri()),
        snapshot_url: None,
        username: USER.to_string(),
        password: PASSWORD.to_string(),
        description: None,
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(5),
        transport_retries: 2,
        transport_retry_delay: Duration::from_millis(10),
        dry_run: false,
    }
}

fn client(server: &MockServer) -> StagingClient {
    support::init_tracing();
    StagingClient::new(settings(server)).unwrap()
}

fn dry_run_client(server: &MockServer) -> StagingClient {
    let mut settings = settings(server);
    settings.dry_run = true;
    StagingClient::new(settings).unwrap()
}

fn jar(dir: &tempfile::TempDir) -> Deployable {
    let file = dir.path().join("lib-1.0.0.jar");
    std::fs::write(&file, b"jar-bytes").unwrap();
    Deployable::new(Coordinates::parse("com.example:lib:1.0.0").unwrap(), file).unwrap()
}

mod discovery {
    use super::*;

    #[tokio::test]
    async fn profiles_from_json_sorted_by_name_descending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/profile_evaluate"))
            .and(query_param("t", "maven2"))
            .and(query_param("g", "com.example"))
            .and(basic_auth(USER, PASSWORD))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": "a1", "name": "com.example" },
                    { "id": "b2", "name": "com.example.tools" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let profiles = client(&server)
            .find_staging_profiles("com.example")
            .await
            .unwrap();

        let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["com.example.tools", "com.example"]);
        assert_eq!(profiles[1].id, ProfileId::new("a1"));
    }

    #[tokio::test]
    async fn profiles_from_xml() {
        let server = MockServer::start().await;
        let xml = r#"<stagingProfiles>
  <data>
    <stagingProfile><id>a1</id><name>com.example</name></stagingProfile>
  </data>
</stagingProfiles>"#;
        Mock::given(method("GET"))
            .and(path("/staging/profile_evaluate"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(xml, "application/xml"))
            .mount(&server)
            .await;

        let profiles = client(&server)
            .find_staging_profiles("com.example")
            .await
            .unwrap();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, ProfileId::new("a1"));
    }

    #[tokio::test]
    async fn repositories_filtered_by_group_most_recent_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/profile_repositories/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "profileId": "a1", "profileName": "com.example", "repositoryId": "comexample-1001",
                      "type": "open", "updatedTimestamp": 1700000000000i64 },
                    { "profileId": "a1", "profileName": "com.other", "repositoryId": "comother-1002",
                      "type": "open", "updatedTimestamp": 1700000900000i64 },
                    { "profileId": "a1", "profileName": "com.example", "repositoryId": "comexample-1003",
                      "type": "closed", "updatedTimestamp": 1700000500000i64 }
                ]
            })))
            .mount(&server)
            .await;

        let repositories = client(&server)
            .find_staging_repositories(&ProfileId::new("a1"), "com.example")
            .await
            .unwrap();

        let ids: Vec<_> = repositories
            .iter()
            .map(|r| r.repository_id.as_str())
            .collect();
        assert_eq!(ids, vec!["comexample-1003", "comexample-1001"]);
        assert_eq!(repositories[0].state, RepositoryState::Closed);
    }
}

mod repository {
    use super::*;

    #[tokio::test]
    async fn missing_repository_reads_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/repository/comexample-1001"))
            .respond_with(ResponseTemplate::new(404).set_body_string("No such repository"))
            .expect(1)
            .mount(&server)
            .await;

        let repository = client(&server)
            .get_repository(&RepositoryId::new("comexample-1001"))
            .await
            .unwrap();

        assert_eq!(repository.state, RepositoryState::NotFound);
        assert!(!repository.transitioning);
    }

    #[tokio::test]
    async fn repository_from_xml() {
        let server = MockServer::start().await;
        let xml = r#"<stagingProfileRepository>
  <profileId>a1</profileId>
  <profileName>com.example</profileName>
  <repositoryId>comexample-1001</repositoryId>
  <type>released</type>
  <transitioning>false</transitioning>
</stagingProfileRepository>"#;
        Mock::given(method("GET"))
            .and(path("/staging/repository/comexample-1001"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(xml, "application/xml"))
            .mount(&server)
            .await;

        let repository = client(&server)
            .get_repository(&RepositoryId::new("comexample-1001"))
            .await
            .unwrap();

        assert_eq!(repository.state, RepositoryState::Released);
        assert_eq!(repository.profile_id, Some(ProfileId::new("a1")));
    }

    #[tokio::test]
    async fn activity_log_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/repository/comexample-1001/activity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "name": "close",
                    "events": [
                        { "name": "ruleFailed",
                          "properties": [ { "name": "failureMessage", "value": "Missing signature" } ] }
                    ]
                }
            ])))
            .mount(&server)
            .await;

        let activities = client(&server)
            .list_activity(&RepositoryId::new("comexample-1001"))
            .await
            .unwrap();

        assert_eq!(
            stagehand::deploy::failure_messages(&activities, "close"),
            vec!["Missing signature".to_string()]
        );
    }
}

mod transitions {
    use super::*;

    #[tokio::test]
    async fn start_sends_description_and_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/staging/profiles/a1/start"))
            .and(basic_auth(USER, PASSWORD))
            .and(body_json(json!({
                "data": { "description": "Staging repository for com.example" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "stagedRepositoryId": "comexample-1001" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .create_repository(&ProfileId::new("a1"), "com.example")
            .await
            .unwrap();

        assert_eq!(id, Some(RepositoryId::new("comexample-1001")));
    }

    #[tokio::test]
    async fn close_posts_to_finish() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/staging/profiles/a1/finish"))
            .and(body_json(json!({
                "data": {
                    "stagedRepositoryId": "comexample-1001",
                    "description": "Staging repository for com.example"
                }
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .close_repository(
                &ProfileId::new("a1"),
                &RepositoryId::new("comexample-1001"),
                "com.example",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn release_and_drop_use_their_endpoints() {
        let server = MockServer::start().await;
        for endpoint in ["promote", "drop"] {
            Mock::given(method("POST"))
                .and(path(format!("/staging/profiles/a1/{endpoint}")))
                .respond_with(ResponseTemplate::new(201))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client(&server);
        let profile = ProfileId::new("a1");
        let repository = RepositoryId::new("comexample-1001");
        client
            .release_repository(&profile, &repository, "com.example")
            .await
            .unwrap();
        client
            .drop_repository(&profile, &repository, "com.example")
            .await
            .unwrap();
    }
}

mod uploads {
    use super::*;

    #[tokio::test]
    async fn deploy_puts_file_under_repository_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(
                "/staging/deployByRepositoryId/comexample-1001/com/example/lib/1.0.0/lib-1.0.0.jar",
            ))
            .and(basic_auth(USER, PASSWORD))
            .and(body_bytes(b"jar-bytes".to_vec()))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        client(&server)
            .deploy(Some(&RepositoryId::new("comexample-1001")), &jar(&dir))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let server = MockServer::start().await;
        let deployable = Deployable::new(
            Coordinates::parse("com.example:lib:1.0.0").unwrap(),
            "/definitely/not/here/lib-1.0.0.jar",
        )
        .unwrap();

        let err = client(&server)
            .deploy(Some(&RepositoryId::new("comexample-1001")), &deployable)
            .await
            .unwrap_err();

        assert!(matches!(err, stagehand::staging::StagingError::Io { .. }));
    }

    #[tokio::test]
    async fn existence_probe_follows_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/maven2/com/example/lib/1.0.0/lib-1.0.0.jar"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = client(&server);
        let present = format!("{}/maven2/{{{{path}}}}/{{{{filename}}}}", server.uri());
        let absent = format!("{}/other/{{{{path}}}}/{{{{filename}}}}", server.uri());

        assert!(client.artifact_exists(&jar(&dir), Some(&present)).await.unwrap());
        assert!(!client.artifact_exists(&jar(&dir), Some(&absent)).await.unwrap());
        assert!(!client.artifact_exists(&jar(&dir), None).await.unwrap());
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn server_errors_are_retried_then_surface() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/repository/comexample-1001"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server)
            .get_repository(&RepositoryId::new("comexample-1001"))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn transient_server_error_recovers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/repository/comexample-1001"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/staging/repository/comexample-1001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "repositoryId": "comexample-1001", "type": "open", "transitioning": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let repository = client(&server)
            .get_repository(&RepositoryId::new("comexample-1001"))
            .await
            .unwrap();

        assert_eq!(repository.state, RepositoryState::Open);
        assert!(repository.transitioning);
    }

    #[tokio::test]
    async fn slow_start_is_not_resent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/staging/profiles/a1/start"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({ "data": { "stagedRepositoryId": "comexample-1001" } }))
                    .set_delay(Duration::from_millis(800)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = settings(&server);
        settings.read_timeout = Duration::from_millis(200);
        let client = StagingClient::new(settings).unwrap();

        let err = client
            .create_repository(&ProfileId::new("a1"), "com.example")
            .await
            .unwrap_err();

        assert!(matches!(err, stagehand::staging::StagingError::Transport { .. }));
        assert!(!err.is_unsent());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn start_rejected_by_server_is_not_resent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/staging/profiles/a1/start"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .create_repository(&ProfileId::new("a1"), "com.example")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn auth_errors_are_classified_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/profile_evaluate"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/staging/profile_repositories/a1"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let unauthorized = client.find_staging_profiles("com.example").await.unwrap_err();
        let forbidden = client
            .find_staging_repositories(&ProfileId::new("a1"), "com.example")
            .await
            .unwrap_err();

        assert!(unauthorized.is_unauthorized());
        assert!(forbidden.is_forbidden());
        assert!(!forbidden.is_retryable());
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/repository/comexample-1001"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_repository(&RepositoryId::new("comexample-1001"))
            .await
            .unwrap_err();

        assert!(matches!(err, stagehand::staging::StagingError::Decode { .. }));
    }
}

mod dry_run {
    use super::*;

    #[tokio::test]
    async fn mutating_calls_send_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = dry_run_client(&server);
        let profile = ProfileId::new("a1");
        let repository = RepositoryId::new("comexample-1001");
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(
            client.create_repository(&profile, "com.example").await.unwrap(),
            None
        );
        client
            .close_repository(&profile, &repository, "com.example")
            .await
            .unwrap();
        client
            .drop_repository(&profile, &repository, "com.example")
            .await
            .unwrap();
        client.deploy(Some(&repository), &jar(&dir)).await.unwrap();
    }

    #[tokio::test]
    async fn reads_still_happen() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staging/profile_evaluate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let profiles = dry_run_client(&server)
            .find_staging_profiles("com.example")
            .await
            .unwrap();
        assert!(profiles.is_empty());
    }
}
