//! 缓存模块
//!
//! 后端以插件形式在进程启动时注册，运行时按配置名称选择。

pub mod object_cache;
pub mod register;
pub mod traits;

use std::sync::Arc;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use register::get_object_cache_plugin;
pub use traits::{CacheResult, ObjectCache};

/// 认证用户缓存键
pub fn user_cache_key(token: &str) -> String {
    format!("user:{token}")
}

/// 注册缓存插件
///
/// 类型需提供 `fn new() -> Result<Self, String>`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        let cache = <$ty>::new()
                            .map_err($crate::errors::LmsError::cache_connection)?;
                        Ok::<_, $crate::errors::LmsError>(
                            Box::new(cache) as Box<dyn $crate::cache::ObjectCache>
                        )
                    }) as $crate::cache::register::BoxedObjectCacheFuture
                }),
            );
        }
    };
}

async fn build_backend(name: &str) -> Result<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name).ok_or_else(|| {
        LmsError::cache_plugin_not_found(format!("Cache backend '{name}' not registered"))
    })?;
    let cache = constructor().await?;
    Ok(Arc::from(cache))
}

/// 按配置创建缓存，失败时回退到进程内 moka 缓存
pub async fn create_object_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = AppConfig::get().cache.cache_type.as_str();
    warn!("Attempting to create {} cache backend", cache_type);

    match build_backend(cache_type).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != "moka" => {
            warn!("Failed to create {} cache: {}, falling back to moka", cache_type, e);
            build_backend("moka").await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Entry {
        id: i64,
        name: String,
    }

    #[tokio::test]
    async fn test_moka_plugin_registered() {
        let cache = build_backend("moka").await.unwrap();
        cache.insert_raw("k".into(), "v".into(), 0).await;
        assert_eq!(cache.get_raw("k").await, CacheResult::Found("v".to_string()));
        cache.remove("k").await;
        assert_eq!(cache.get_raw("k").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache = build_backend("moka").await.unwrap();
        let entry = Entry {
            id: 3,
            name: "alice".into(),
        };
        cache.insert_json(user_cache_key("abc"), &entry, 60).await;
        assert_eq!(
            cache.get_json::<Entry>(&user_cache_key("abc")).await,
            CacheResult::Found(entry)
        );

        cache.insert_raw("broken".into(), "{not json".into(), 0).await;
        assert_eq!(
            cache.get_json::<Entry>("broken").await,
            CacheResult::ExistsButNoValue
        );
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        assert!(build_backend("memcached").await.is_err());
    }
}
