mod email_verification;
mod hardening;
mod health;
mod helpers;
mod protected_routes;
mod register_user;
mod sign_in;
