pub mod hashmap_credential_store;
pub mod hashmap_one_time_token_store;
pub mod hashmap_session_store;
pub mod hashmap_user_store;
pub mod postgres_credential_store;
pub mod postgres_one_time_token_store;
pub mod postgres_session_store;
pub mod postgres_user_store;

pub use hashmap_credential_store::HashMapCredentialStore;
pub use hashmap_one_time_token_store::HashMapOneTimeTokenStore;
pub use hashmap_session_store::HashMapSessionStore;
pub use hashmap_user_store::HashMapUserStore;
pub use postgres_credential_store::PostgresCredentialStore;
pub use postgres_one_time_token_store::PostgresOneTimeTokenStore;
pub use postgres_session_store::PostgresSessionStore;
pub use postgres_user_store::PostgresUserStore;
