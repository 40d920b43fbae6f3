pub mod claims;
pub mod credential;
pub mod email;
pub mod one_time_token;
pub mod password;
pub mod session;
pub mod token_hash;
pub mod user;
