use anyhow::Result;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub s3_bucket: String,
    pub database_url: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let s3_bucket = env::var("S3_BUCKET").unwrap_or_else(|_| "dockless-raw".to_string());

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "transportation".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "postgres".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            s3_bucket,
            database_url,
            log_level,
        })
    }
}
