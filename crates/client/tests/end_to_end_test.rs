//! Client against the real API on an in-memory database.

use std::net::SocketAddr;
use std::sync::Arc;

use api_lib::{app, middleware::Cache, AppConfig};
use common::{DatabaseConfig, JwtConfig};
use diary_client::{ClientConfig, ClientError, DiaryClient, FileTokenStore, TokenStore};
use diary_service_lib::infra::Database;
use domain::{CreateDiary, PaginationParams, UpdateDiary, Visibility};

const PASSWORD: &str = "correct horse battery";

async fn spawn_api() -> String {
    let jwt = JwtConfig::new("test-secret-key-for-testing-only-32chars", 15, 7).unwrap();
    let database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    let config = AppConfig::new(database, jwt);
    let db = Database::connect_with(&config.database).await.unwrap();
    let router = app(db, Arc::new(Cache::in_memory()), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let base_url = spawn_api().await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    let store = Arc::new(FileTokenStore::new(&session_file));
    let client = DiaryClient::new(ClientConfig::new(&base_url), store.clone()).unwrap();

    assert!(matches!(client.me().await, Err(ClientError::NotAuthenticated)));

    let config = client.site_config().await.unwrap();
    assert!(config.registration_open);

    let user = client
        .register("writer@example.com", PASSWORD, "Writer")
        .await
        .unwrap();
    client.login("writer@example.com", PASSWORD).await.unwrap();
    assert!(store.load().await.unwrap().is_some());
    assert_eq!(client.me().await.unwrap().id, user.id);

    let diary = client
        .create_diary(&CreateDiary {
            title: "First page".to_string(),
            content: "It begins.".to_string(),
            visibility: Visibility::Public,
            ..Default::default()
        })
        .await
        .unwrap();
    let updated = client
        .update_diary(
            diary.id,
            &UpdateDiary {
                mood: Some("calm".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.mood.as_deref(), Some("calm"));

    let mine = client.list_diaries(PaginationParams::default()).await.unwrap();
    assert_eq!(mine.meta.total, 1);
    let feed = client.public_diaries(PaginationParams::default()).await.unwrap();
    assert_eq!(feed.data[0].id, diary.id);

    // an explicit refresh rotates the pair
    client.refresh().await.unwrap();
    assert_eq!(client.get_diary(diary.id).await.unwrap().title, "First page");

    // a second process picks the session up from disk
    let restored = DiaryClient::new(
        ClientConfig::new(&base_url),
        Arc::new(FileTokenStore::new(&session_file)),
    )
    .unwrap();
    assert!(restored.restore_session().await.unwrap());
    assert_eq!(restored.unread_count().await.unwrap().unread, 0);

    client.delete_diary(diary.id).await.unwrap();
    match client.get_diary(diary.id).await {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected result: {:?}", other.map(|d| d.id)),
    }

    client.logout().await.unwrap();
    assert!(!session_file.exists());
    assert!(matches!(client.me().await, Err(ClientError::NotAuthenticated)));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let base_url = spawn_api().await;
    let client = DiaryClient::new(
        ClientConfig::new(&base_url),
        Arc::new(diary_client::MemoryTokenStore::new()),
    )
    .unwrap();
    client
        .register("someone@example.com", PASSWORD, "Someone")
        .await
        .unwrap();

    match client.login("someone@example.com", "nope nope nope").await {
        Err(ClientError::Api { status, code, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(code, "INVALID_CREDENTIALS");
        }
        other => panic!("unexpected result: {:?}", other.is_ok()),
    }
}
