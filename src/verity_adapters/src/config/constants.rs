pub mod env {
    pub const APP_MODE_ENV_VAR: &str = "APP_MODE";
    pub const JWT_SECRET_ENV_VAR: &str = "JWT_SECRET";
    pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
    pub const POSTMARK_AUTH_TOKEN_ENV_VAR: &str = "POSTMARK_AUTH_TOKEN";
    pub const APP_BASE_URL_ENV_VAR: &str = "APP_BASE_URL";
    /// Prefix of layered variables, e.g. `VERITY__APP__PORT`.
    pub const SETTINGS_ENV_PREFIX: &str = "VERITY";
}

pub const CONFIG_DIR: &str = "config";
pub const DEFAULT_MODE: &str = "development";

pub mod prod {
    pub const APP_HOST: &str = "0.0.0.0";
    pub const APP_PORT: u16 = 8000;
    pub mod rate_limit {
        pub const REQUESTS_PER_SECOND: u32 = 20;
        pub const BURST_SIZE: u32 = 60;
    }
    pub mod email_client {
        use std::time::Duration;

        pub const BASE_URL: &str = "https://api.postmarkapp.com/";
        pub const SENDER: &str = "no-reply@verity.local";
        pub const TIMEOUT: Duration = std::time::Duration::from_secs(10);
    }
}

pub mod test {
    pub const APP_ADDRESS: &str = "127.0.0.1:0";
    pub mod email_client {
        use std::time::Duration;

        pub const SENDER: &str = "test@email.com";
        pub const TIMEOUT: Duration = std::time::Duration::from_millis(200);
    }
}
