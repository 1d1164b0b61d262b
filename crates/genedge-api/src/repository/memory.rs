//! 메모리 대체 디렉터리.
//!
//! 주 저장소에 접근할 수 없을 때만 사용하는 비영속 사용자 저장소입니다.
//! 이메일을 키로 사용하며 쓰기는 `RwLock`으로 직렬화됩니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use genedge_core::{
    normalize_email, DirectoryError, NewPrincipal, Principal, PrincipalDirectory, PrincipalRecord,
};

/// 메모리 사용자 디렉터리.
pub struct MemoryPrincipalDirectory {
    users: RwLock<HashMap<String, PrincipalRecord>>,
    next_id: AtomicU64,
}

impl Default for MemoryPrincipalDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPrincipalDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// 부트스트랩 관리자 등록.
    ///
    /// 이미 같은 이메일이 있으면 덮어쓰지 않습니다. ID는 `admin-1` 고정.
    pub async fn seed_admin(&self, new: NewPrincipal) -> Principal {
        let mut users = self.users.write().await;
        let record = users.entry(new.email.clone()).or_insert_with(|| PrincipalRecord {
            principal: Principal {
                id: "admin-1".to_string(),
                display_name: new.display_name,
                email: new.email,
                role: new.role,
                created_at: Utc::now(),
            },
            password_hash: new.password_hash,
        });
        record.principal.clone()
    }

    /// 사용자 삭제. 삭제되었으면 true.
    pub async fn remove(&self, email: &str) -> bool {
        self.users
            .write()
            .await
            .remove(&normalize_email(email))
            .is_some()
    }

    /// 저장된 사용자 수.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryPrincipalDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, DirectoryError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|r| r.principal.id == id)
            .map(|r| r.principal.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, DirectoryError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create(&self, new: NewPrincipal) -> Result<Principal, DirectoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&new.email) {
            return Err(DirectoryError::Duplicate(new.email));
        }

        let id = format!("user-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let principal = Principal {
            id,
            display_name: new.display_name,
            email: new.email.clone(),
            role: new.role,
            created_at: Utc::now(),
        };
        users.insert(
            new.email,
            PrincipalRecord {
                principal: principal.clone(),
                password_hash: new.password_hash,
            },
        );

        Ok(principal)
    }

    async fn list(&self) -> Result<Vec<Principal>, DirectoryError> {
        let mut principals: Vec<Principal> = self
            .users
            .read()
            .await
            .values()
            .map(|r| r.principal.clone())
            .collect();
        principals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(principals)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
