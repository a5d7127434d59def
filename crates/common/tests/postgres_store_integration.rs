#![cfg(feature = "integration-tests")]

use common::auth::{ResourceKind, Role, ScopeFilter};
use common::domain::{
    CreateRecordInput, CreateUserInputWithId, DomainError, RegionFields, ResourceStore,
    UpdateUserInputWithHash, UserRepository,
};
use common::postgres::{
    ensure_schema, PostgresClient, PostgresConfig, PostgresResourceStore, PostgresUserRepository,
};
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use testcontainers::runners::AsyncRunner;

async fn setup_test_db() -> (ContainerAsync<Postgres>, PostgresClient) {
    let postgres = Postgres::default().start().await.unwrap();
    let host = postgres.get_host().await.unwrap();
    let port = postgres.get_host_port_ipv4(5432).await.unwrap();

    let client = PostgresClient::new(&PostgresConfig {
        host: host.to_string(),
        port,
        database: "postgres".to_string(),
        username: "postgres".to_string(),
        password: "postgres".to_string(),
        max_pool_size: 5,
    })
    .expect("Failed to create client");

    ensure_schema(&client).await.expect("schema setup failed");

    (postgres, client)
}

fn region(id: &str, owner: Option<&str>) -> CreateRecordInput<RegionFields> {
    CreateRecordInput {
        id: id.to_string(),
        owner: owner.map(String::from),
        fields: RegionFields {
            name: format!("Region {id}"),
            code: id.to_uppercase(),
            description: Some("coastal".to_string()),
        },
    }
}

fn user(id: &str, username: &str, role: Role) -> CreateUserInputWithId {
    CreateUserInputWithId {
        id: id.to_string(),
        username: username.to_string(),
        password_hash: "hashed_password".to_string(),
        role,
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_schema_is_idempotent() {
    let (_container, client) = setup_test_db().await;
    ensure_schema(&client).await.unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_record_crud_with_owner_scope() {
    let (_container, client) = setup_test_db().await;
    let store = PostgresResourceStore::<RegionFields>::new(client);

    let created = store.create(region("north", Some("staff1"))).await.unwrap();
    assert_eq!(created.owner.as_deref(), Some("staff1"));
    store.create(region("south", Some("staff2"))).await.unwrap();
    store.create(region("central", None)).await.unwrap();

    let fetched = store.get("north").await.unwrap().expect("record exists");
    assert_eq!(fetched.fields.code, "NORTH");
    assert_eq!(fetched.fields.description.as_deref(), Some("coastal"));

    let all = store.list(&ScopeFilter::Unrestricted).await.unwrap();
    assert_eq!(all.len(), 3);

    let mine = store
        .list(&ScopeFilter::OwnedBy("staff1".to_string()))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, "north");

    let mut fields = fetched.fields.clone();
    fields.name = "Northern highlands".to_string();
    let updated = store.update("north", fields).await.unwrap();
    assert_eq!(updated.fields.name, "Northern highlands");
    assert_eq!(updated.owner.as_deref(), Some("staff1"));

    store.delete("north").await.unwrap();
    assert!(store.get("north").await.unwrap().is_none());

    let err = store.delete("north").await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::ResourceNotFound(ResourceKind::Region, _)
    ));
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_duplicate_record_id_is_constraint_violation() {
    let (_container, client) = setup_test_db().await;
    let store = PostgresResourceStore::<RegionFields>::new(client);

    store.create(region("north", None)).await.unwrap();
    let err = store.create(region("north", None)).await.unwrap_err();
    assert!(matches!(err, DomainError::ConstraintViolation(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_user_repository_roundtrip() {
    let (_container, client) = setup_test_db().await;
    let repo = PostgresUserRepository::new(client);

    assert!(!repo.has_role(Role::Super).await.unwrap());
    repo.create_user(user("u1", "admin", Role::Super)).await.unwrap();
    repo.create_user(user("u2", "staff1", Role::Basic)).await.unwrap();
    assert!(repo.has_role(Role::Super).await.unwrap());

    let found = repo
        .get_user_by_username("staff1")
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(found.id, "u2");
    assert_eq!(found.role, Role::Basic);

    let scoped = repo
        .list_users(&ScopeFilter::OwnedBy("staff1".to_string()))
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(repo.list_users(&ScopeFilter::Unrestricted).await.unwrap().len(), 2);

    let updated = repo
        .update_user(UpdateUserInputWithHash {
            id: "u2".to_string(),
            password_hash: None,
            role: Some(Role::Semi),
        })
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Semi);
    assert_eq!(updated.password_hash, "hashed_password");

    repo.delete_user("u2").await.unwrap();
    assert!(repo.get_user("u2").await.unwrap().is_none());
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_duplicate_username_rejected() {
    let (_container, client) = setup_test_db().await;
    let repo = PostgresUserRepository::new(client);

    repo.create_user(user("u1", "staff1", Role::Basic)).await.unwrap();
    let err = repo
        .create_user(user("u2", "staff1", Role::Semi))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UserAlreadyExists(name) if name == "staff1"));
}
