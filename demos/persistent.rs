use user_registry::adapters::HttpServer;
use user_registry::client::{ClientConfig, RegistryClient};
use user_registry::core::{NewUser, UserRegistry};
use user_registry::storage::sqlite::SqliteRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let repo = SqliteRepository::new("registry.db").await?;
    let server = HttpServer::new(UserRegistry::new(repo));
    tokio::spawn(async move {
        server.serve("127.0.0.1:8080").await.unwrap();
    });

    let client = RegistryClient::connect_with_retry(ClientConfig::default()).await?;

    // Rows accumulate across runs; a duplicate add on rerun is reported.
    match client
        .create_user(&NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
        })
        .await
    {
        Ok(user) => println!("created: {:?}", user),
        Err(e) => println!("create failed: {}", e),
    }

    for user in client.list_users().await? {
        println!("stored: {} <{}> (id {})", user.username, user.email, user.id);
    }
    Ok(())
}
