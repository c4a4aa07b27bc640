use user_registry::adapters::HttpServer;
use user_registry::client::{ClientConfig, RegistryClient};
use user_registry::core::{NewUser, UserRegistry, UserUpdate};
use user_registry::storage::memory::MemoryRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server = HttpServer::new(UserRegistry::new(MemoryRepository::new()));
    tokio::spawn(async move {
        server.serve("127.0.0.1:8080").await.unwrap();
    });

    let client = RegistryClient::connect_with_retry(ClientConfig::default()).await?;

    let ada = client
        .create_user(&NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
        })
        .await?;
    println!("created: {:?}", ada);

    let updated = client
        .update_user(
            ada.id,
            &UserUpdate {
                username: Some("countess".into()),
                email: None,
            },
        )
        .await?;
    println!("updated: {:?}", updated);

    for user in client.list_users().await? {
        println!("listed: {} <{}>", user.username, user.email);
    }

    client.delete_user(ada.id).await?;
    println!("deleted user {}", ada.id);
    Ok(())
}
