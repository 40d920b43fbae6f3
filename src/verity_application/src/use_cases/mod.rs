pub mod initiate_email_verification;
pub mod register_user;
pub mod set_password;
pub mod sign_in;
pub mod validate_email_verification;
