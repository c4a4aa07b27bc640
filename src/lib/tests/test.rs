use std::time::Duration;

use crate::adapters::HttpServer;
use crate::client::{ClientConfig, RegistryClient};
use crate::core::{NewUser, UserRegistry, UserUpdate};
use crate::storage::memory::MemoryRepository;
#[cfg(feature = "storage")]
use crate::storage::sqlite::SqliteRepository;

fn client_config(port: u16) -> ClientConfig {
    ClientConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        connect_retries: 25,
        retry_interval: Duration::from_millis(100),
    }
}

fn spawn_memory_server(port: u16) -> tokio::task::JoinHandle<()> {
    let server = HttpServer::new(UserRegistry::new(MemoryRepository::new()));
    tokio::spawn(async move {
        server.serve(&format!("127.0.0.1:{}", port)).await.unwrap();
    })
}

fn assert_error_kind(err: &anyhow::Error, kind: &str) {
    let text = err.to_string();
    assert!(text.contains(kind), "expected {} in error: {}", kind, text);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crud_flow() -> Result<(), Box<dyn std::error::Error>> {
    let server_handle = spawn_memory_server(3700);
    let client = RegistryClient::connect_with_retry(client_config(3700)).await?;

    assert!(client.list_users().await?.is_empty());

    let ada = client
        .create_user(&NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
        })
        .await?;
    assert_eq!(ada.username, "ada");
    assert_eq!(ada.email, "ada@example.com");
    assert_eq!(ada.created_at, ada.updated_at);

    let fetched = client.get_user(ada.id).await?;
    assert_eq!(fetched, ada);

    let updated = client
        .update_user(
            ada.id,
            &UserUpdate {
                username: Some("countess".into()),
                email: None,
            },
        )
        .await?;
    assert_eq!(updated.username, "countess");
    assert_eq!(updated.email, "ada@example.com");
    assert!(updated.updated_at >= updated.created_at);

    let listed = client.list_users().await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].username, "countess");

    client.delete_user(ada.id).await?;
    assert!(client.list_users().await?.is_empty());

    server_handle.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_user_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let server_handle = spawn_memory_server(3701);
    let client = RegistryClient::connect_with_retry(client_config(3701)).await?;

    let err = client.get_user(999).await.unwrap_err();
    assert_error_kind(&err, "NOT_FOUND");

    let err = client
        .update_user(
            999,
            &UserUpdate {
                username: Some("nobody".into()),
                email: None,
            },
        )
        .await
        .unwrap_err();
    assert_error_kind(&err, "NOT_FOUND");

    server_handle.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_email_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let server_handle = spawn_memory_server(3702);
    let client = RegistryClient::connect_with_retry(client_config(3702)).await?;

    client
        .create_user(&NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
        })
        .await?;

    let err = client
        .create_user(&NewUser {
            username: "imposter".into(),
            email: "ADA@example.com".into(),
        })
        .await
        .unwrap_err();
    assert_error_kind(&err, "DUPLICATE_EMAIL");
    assert_eq!(client.list_users().await?.len(), 1);

    server_handle.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_payloads_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let server_handle = spawn_memory_server(3703);
    let client = RegistryClient::connect_with_retry(client_config(3703)).await?;

    let err = client
        .create_user(&NewUser {
            username: "   ".into(),
            email: "ok@example.com".into(),
        })
        .await
        .unwrap_err();
    assert_error_kind(&err, "VALIDATION_ERROR");

    let err = client
        .create_user(&NewUser {
            username: "ada".into(),
            email: "not-an-address".into(),
        })
        .await
        .unwrap_err();
    assert_error_kind(&err, "VALIDATION_ERROR");

    assert!(client.list_users().await?.is_empty());

    server_handle.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_is_not_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let server_handle = spawn_memory_server(3704);
    let client = RegistryClient::connect_with_retry(client_config(3704)).await?;

    let ada = client
        .create_user(&NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
        })
        .await?;
    client.delete_user(ada.id).await?;

    let err = client.delete_user(ada.id).await.unwrap_err();
    assert_error_kind(&err, "NOT_FOUND");

    server_handle.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_error_body_wire_shape() -> Result<(), Box<dyn std::error::Error>> {
    let server_handle = spawn_memory_server(3707);
    // Waits until the server is up before the raw request below.
    RegistryClient::connect_with_retry(client_config(3707)).await?;

    let resp = reqwest::get("http://127.0.0.1:3707/api/users/12345").await?;
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("12345"));

    server_handle.abort();
    Ok(())
}

#[cfg(feature = "storage")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sqlite_persistence_across_restart() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = "test_sqlite_persistence.db";
    let _ = std::fs::remove_file(db_path);

    let repo = SqliteRepository::new(db_path).await?;
    let server = HttpServer::new(UserRegistry::new(repo));
    let server_handle = tokio::spawn(async move {
        server.serve("127.0.0.1:3705").await.unwrap();
    });

    let client = RegistryClient::connect_with_retry(client_config(3705)).await?;
    let ada = client
        .create_user(&NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
        })
        .await?;
    server_handle.abort();

    // Same file, fresh server: the row must still be there.
    let repo = SqliteRepository::new(db_path).await?;
    let server = HttpServer::new(UserRegistry::new(repo));
    let server_handle = tokio::spawn(async move {
        server.serve("127.0.0.1:3706").await.unwrap();
    });

    let client = RegistryClient::connect_with_retry(client_config(3706)).await?;
    let listed = client.list_users().await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], ada);

    // Ids keep growing past rows written before the restart.
    let grace = client
        .create_user(&NewUser {
            username: "grace".into(),
            email: "grace@example.com".into(),
        })
        .await?;
    assert!(grace.id > ada.id);

    server_handle.abort();
    let _ = std::fs::remove_file(db_path);
    Ok(())
}
