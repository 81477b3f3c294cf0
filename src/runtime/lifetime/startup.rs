use crate::cache::{ObjectCache, create_object_cache};
use crate::errors::Result;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@lms.local";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// 初始化管理员账号，用户名已存在时跳过
async fn seed_admin(storage: &Arc<dyn Storage>) -> Result<()> {
    let username = env_or("ADMIN_USERNAME", DEFAULT_ADMIN_USERNAME);
    let email = env_or("ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL);

    if let Some(user) = storage.get_user_by_username(&username).await? {
        debug!("Admin account '{}' already exists (ID: {})", username, user.id);
        return Ok(());
    }

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(pwd) if !pwd.is_empty() => pwd,
        _ => {
            let pwd = generate_password(16);
            warn!("==========================================================");
            warn!("  ADMIN_PASSWORD NOT SET - USING GENERATED PASSWORD");
            warn!("  Generated admin password: {}", pwd);
            warn!("  Please save this password or set ADMIN_PASSWORD");
            warn!("==========================================================");
            pwd
        }
    };

    let password_hash = hash_password(&password)?;

    let request = CreateUserRequest {
        username,
        email,
        password: password_hash,
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        phone: None,
        role: UserRole::Admin,
        department_id: None,
        is_active: true,
    };

    let user = storage.create_user(request, None).await?;
    info!(
        "Admin account created (ID: {}, username: {})",
        user.id, user.username
    );
    Ok(())
}

/// 准备服务器启动上下文：存储、管理员账号和缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage).await?;

    let cache = create_object_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}
