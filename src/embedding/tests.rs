use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

mod kind_tests {
    use super::*;

    #[test]
    fn test_parse_backend_kind() {
        assert_eq!("http".parse::<EmbeddingBackendKind>().unwrap(), EmbeddingBackendKind::Http);
        assert_eq!(" Local ".parse::<EmbeddingBackendKind>().unwrap(), EmbeddingBackendKind::Local);
        assert_eq!("STUB".parse::<EmbeddingBackendKind>().unwrap(), EmbeddingBackendKind::Stub);
        assert!("openai".parse::<EmbeddingBackendKind>().is_err());
    }

    #[test]
    fn test_backend_kind_display_roundtrip() {
        for kind in [
            EmbeddingBackendKind::Http,
            EmbeddingBackendKind::Local,
            EmbeddingBackendKind::Stub,
        ] {
            assert_eq!(kind.to_string().parse::<EmbeddingBackendKind>().unwrap(), kind);
        }
        assert_eq!(EmbeddingBackendKind::default(), EmbeddingBackendKind::Http);
    }
}

mod stub_tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_is_deterministic_and_normalized() {
        let stub = StubEmbedder::new(64).unwrap();
        let a = stub.embed("hello").await.unwrap();
        let b = stub.embed("hello").await.unwrap();
        let c = stub.embed("goodbye").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!((norm(&a) - 1.0).abs() < 1e-5);
        assert_eq!(stub.dimension(), Some(64));
        assert_eq!(stub.backend_name(), "stub");
    }

    #[test]
    fn test_stub_rejects_zero_dimension() {
        assert!(matches!(
            StubEmbedder::new(0),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_backend_from_stub_config() {
        let backend = EmbeddingBackend::from_config(&EmbeddingConfig::stub(16)).unwrap();
        assert_eq!(backend.backend_name(), "stub");
        assert_eq!(backend.dimension(), Some(16));
        assert_eq!(backend.embed("x").await.unwrap().len(), 16);
        assert!(backend.as_http().is_none());
    }

    #[test]
    fn test_local_backend_requires_model_path() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackendKind::Local,
            model_path: None,
            ..EmbeddingConfig::stub(4)
        };
        assert!(matches!(
            EmbeddingBackend::from_config(&config),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_local_backend_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalEmbedder::load(dir.path(), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelNotFound { .. }));
    }
}

mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_scripted_and_fallback() {
        let mock = MockEmbedder::new(8).with_vector("hi", vec![1.0, 0.0]);
        assert_eq!(mock.embed("hi").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(mock.embed("other").await.unwrap().len(), 8);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure_toggle() {
        let mock = MockEmbedder::new(4);
        mock.fail(true);
        assert!(matches!(
            mock.embed("x").await,
            Err(EmbeddingError::Provider { status: 503, .. })
        ));
        mock.fail(false);
        assert!(mock.embed("x").await.is_ok());
    }
}

mod http_tests {
    use super::*;

    async fn embedder(server: &MockServer) -> HttpEmbedder {
        HttpEmbedder::new(format!("{}/", server.uri()), Duration::from_millis(300)).unwrap()
    }

    #[tokio::test]
    async fn test_http_embed_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_json(json!({"text": "good morning", "normalize": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": [0.6, 0.8],
                "model": "all-MiniLM-L6-v2",
                "dim": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = embedder(&server).await;
        assert_eq!(client.base_url(), server.uri());
        let vector = client.embed("good morning").await.unwrap();
        assert_eq!(vector, vec![0.6, 0.8]);
        assert_eq!(client.dimension(), None);
    }

    #[tokio::test]
    async fn test_http_embed_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let err = embedder(&server).await.embed("x").await.unwrap_err();
        match err {
            EmbeddingError::Provider { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model crashed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_embed_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vector": [1.0]})))
            .mount(&server)
            .await;

        assert!(matches!(
            embedder(&server).await.embed("x").await,
            Err(EmbeddingError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_embed_empty_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": []})))
            .mount(&server)
            .await;

        assert!(matches!(
            embedder(&server).await.embed("x").await,
            Err(EmbeddingError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_http_embed_dim_disagrees() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embedding": [1.0, 0.0], "dim": 3})),
            )
            .mount(&server)
            .await;

        assert!(matches!(
            embedder(&server).await.embed("x").await,
            Err(EmbeddingError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_embed_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"embedding": [1.0]}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        assert!(matches!(
            embedder(&server).await.embed("x").await,
            Err(EmbeddingError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_embed_connection_refused() {
        let client =
            HttpEmbedder::new("http://127.0.0.1:9", Duration::from_millis(300)).unwrap();
        assert!(matches!(
            client.embed("x").await,
            Err(EmbeddingError::Transport { .. }) | Err(EmbeddingError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "model": "all-MiniLM-L6-v2",
                "model_loaded": true
            })))
            .mount(&server)
            .await;

        let health = embedder(&server).await.health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.model.as_deref(), Some("all-MiniLM-L6-v2"));
        assert_eq!(health.model_loaded, Some(true));
    }

    #[test]
    fn test_http_rejects_empty_url() {
        assert!(matches!(
            HttpEmbedder::new("", Duration::from_secs(1)),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
    }
}
