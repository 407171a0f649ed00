//! In-memory [`Datastore`](super::Datastore).
//!
//! Mirrors the unique indexes of the SQL schema so tests observe the same
//! conflicts the database would raise. All state sits behind one mutex; no
//! lock is held across an `.await`.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use stylecore_core::{
    Email, EstablishmentId, OAuthProvider, TenantBlueprint, TenantId, TenantScope, UserId,
    UserStatus,
};

use super::{EstablishmentStore, RepositoryError, TenantStore, UserStore};
use crate::models::{Domain, Establishment, NewEstablishment, NewUser, Tenant, User};

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

#[derive(Debug, Default)]
struct Data {
    tenants: Vec<Tenant>,
    domains: Vec<Domain>,
    users: Vec<User>,
    passwords: HashMap<UserId, String>,
    establishments: Vec<Establishment>,
    staff: BTreeSet<(EstablishmentId, UserId)>,
    last_user_id: i32,
    last_establishment_id: i32,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Data {
    fn user_mut(&mut self, scope: &TenantScope, id: UserId) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id && scope.admits(&u.tenant_id))
    }

    fn provider_taken(
        &self,
        tenant_id: &TenantId,
        provider: OAuthProvider,
        provider_id: &str,
        except: Option<UserId>,
    ) -> bool {
        self.users.iter().any(|u| {
            &u.tenant_id == tenant_id
                && Some(u.id) != except
                && u.provider_id(provider) == Some(provider_id)
        })
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create_tenant(
        &self,
        blueprint: &TenantBlueprint,
    ) -> Result<(Tenant, Domain), RepositoryError> {
        let mut data = self.data.lock();
        if data.tenants.iter().any(|t| t.id == blueprint.id) {
            return Err(RepositoryError::Conflict("tenant".to_owned()));
        }
        if data.domains.iter().any(|d| d.domain == blueprint.domain) {
            return Err(RepositoryError::Conflict("domain".to_owned()));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: blueprint.id.clone(),
            name: blueprint.name.clone(),
            email: blueprint.email.clone(),
            created_at: now,
            updated_at: now,
        };
        let domain = Domain {
            domain: blueprint.domain.clone(),
            tenant_id: blueprint.id.clone(),
        };
        data.tenants.push(tenant.clone());
        data.domains.push(domain.clone());
        Ok((tenant, domain))
    }

    async fn tenant_for_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        let data = self.data.lock();
        let tenant = data
            .domains
            .iter()
            .find(|d| d.domain == domain)
            .and_then(|d| data.tenants.iter().find(|t| t.id == d.tenant_id))
            .cloned();
        Ok(tenant)
    }

    async fn add_domain(
        &self,
        tenant_id: &TenantId,
        domain: &str,
    ) -> Result<Domain, RepositoryError> {
        let mut data = self.data.lock();
        if !data.tenants.iter().any(|t| &t.id == tenant_id) {
            return Err(RepositoryError::NotFound);
        }
        if data.domains.iter().any(|d| d.domain == domain) {
            return Err(RepositoryError::Conflict("domain".to_owned()));
        }
        let domain = Domain {
            domain: domain.to_owned(),
            tenant_id: tenant_id.clone(),
        };
        data.domains.push(domain.clone());
        Ok(domain)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        scope: &TenantScope,
        user: NewUser,
    ) -> Result<User, RepositoryError> {
        let tenant_id = scope.stamp(user.tenant_id)?;
        let mut data = self.data.lock();

        if !data.tenants.iter().any(|t| t.id == tenant_id) {
            return Err(RepositoryError::NotFound);
        }
        if data.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict("username".to_owned()));
        }
        if data
            .users
            .iter()
            .any(|u| u.tenant_id == tenant_id && u.email == user.email)
        {
            return Err(RepositoryError::Conflict("email".to_owned()));
        }
        for provider in OAuthProvider::ALL {
            let provider_id = match provider {
                OAuthProvider::Google => user.google_id.as_deref(),
                OAuthProvider::Facebook => user.facebook_id.as_deref(),
            };
            if let Some(provider_id) = provider_id
                && data.provider_taken(&tenant_id, provider, provider_id, None)
            {
                return Err(RepositoryError::Conflict(provider.id_column().to_owned()));
            }
        }

        data.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: UserId::new(data.last_user_id),
            tenant_id,
            name: user.name,
            username: user.username,
            email: user.email,
            phone: user.phone,
            role: user.role,
            user_type: user.user_type,
            status: user.status,
            email_verified_at: user.email_verified_at,
            google_id: user.google_id,
            facebook_id: user.facebook_id,
            avatar: user.avatar,
            created_at: now,
            updated_at: now,
        };
        data.passwords.insert(created.id, user.password_hash);
        data.users.push(created.clone());
        Ok(created)
    }

    async fn find_user(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<User>, RepositoryError> {
        let data = self.data.lock();
        Ok(data
            .users
            .iter()
            .find(|u| u.id == id && scope.admits(&u.tenant_id))
            .cloned())
    }

    async fn find_user_by_email(
        &self,
        scope: &TenantScope,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        let data = self.data.lock();
        Ok(data
            .users
            .iter()
            .find(|u| &u.email == email && scope.admits(&u.tenant_id))
            .cloned())
    }

    async fn find_user_by_provider(
        &self,
        scope: &TenantScope,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let data = self.data.lock();
        Ok(data
            .users
            .iter()
            .find(|u| u.provider_id(provider) == Some(provider_id) && scope.admits(&u.tenant_id))
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        Ok(self.data.lock().users.iter().any(|u| u.username == username))
    }

    async fn password_hash(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let data = self.data.lock();
        let visible = data
            .users
            .iter()
            .any(|u| u.id == id && scope.admits(&u.tenant_id));
        Ok(if visible {
            data.passwords.get(&id).cloned()
        } else {
            None
        })
    }

    async fn link_provider(
        &self,
        scope: &TenantScope,
        id: UserId,
        provider: OAuthProvider,
        provider_id: &str,
        avatar: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let mut data = self.data.lock();
        let tenant_id = data
            .user_mut(scope, id)
            .map(|u| u.tenant_id.clone())
            .ok_or(RepositoryError::NotFound)?;
        if data.provider_taken(&tenant_id, provider, provider_id, Some(id)) {
            return Err(RepositoryError::Conflict(provider.id_column().to_owned()));
        }

        let user = data.user_mut(scope, id).ok_or(RepositoryError::NotFound)?;
        let provider_id = Some(provider_id.to_owned());
        match provider {
            OAuthProvider::Google => user.google_id = provider_id,
            OAuthProvider::Facebook => user.facebook_id = provider_id,
        }
        if user.avatar.is_none() {
            user.avatar = avatar.map(str::to_owned);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn mark_email_verified(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<User, RepositoryError> {
        let mut data = self.data.lock();
        let user = data.user_mut(scope, id).ok_or(RepositoryError::NotFound)?;
        let now = Utc::now();
        user.email_verified_at.get_or_insert(now);
        user.status = UserStatus::Active;
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn activate_user(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<User, RepositoryError> {
        let mut data = self.data.lock();
        let user = data.user_mut(scope, id).ok_or(RepositoryError::NotFound)?;
        user.status = UserStatus::Active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl EstablishmentStore for MemoryStore {
    async fn create_establishment(
        &self,
        scope: &TenantScope,
        establishment: NewEstablishment,
    ) -> Result<Establishment, RepositoryError> {
        let tenant_id = scope.stamp(establishment.tenant_id)?;
        let mut data = self.data.lock();

        let owner_in_tenant = data
            .users
            .iter()
            .any(|u| u.id == establishment.owner_id && u.tenant_id == tenant_id);
        if !owner_in_tenant {
            return Err(RepositoryError::NotFound);
        }

        data.last_establishment_id += 1;
        let now = Utc::now();
        let created = Establishment {
            id: EstablishmentId::new(data.last_establishment_id),
            tenant_id,
            owner_id: establishment.owner_id,
            name: establishment.name,
            description: establishment.description,
            created_at: now,
            updated_at: now,
        };
        data.establishments.push(created.clone());
        Ok(created)
    }

    async fn find_establishment(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Option<Establishment>, RepositoryError> {
        let data = self.data.lock();
        Ok(data
            .establishments
            .iter()
            .find(|e| e.id == id && scope.admits(&e.tenant_id))
            .cloned())
    }

    async fn staff_ids(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Vec<UserId>, RepositoryError> {
        let data = self.data.lock();
        let visible = data
            .establishments
            .iter()
            .any(|e| e.id == id && scope.admits(&e.tenant_id));
        if !visible {
            return Ok(Vec::new());
        }
        Ok(data
            .staff
            .iter()
            .filter(|(establishment, _)| *establishment == id)
            .map(|(_, user)| *user)
            .collect())
    }

    async fn add_staff(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
        user: UserId,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.lock();
        let tenant_id = data
            .establishments
            .iter()
            .find(|e| e.id == id && scope.admits(&e.tenant_id))
            .map(|e| e.tenant_id.clone())
            .ok_or(RepositoryError::NotFound)?;
        let same_tenant = data
            .users
            .iter()
            .any(|u| u.id == user && u.tenant_id == tenant_id);
        if !same_tenant {
            return Err(RepositoryError::NotFound);
        }
        data.staff.insert((id, user));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stylecore_core::{UserRole, UserType};

    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            tenant_id: None,
            name: "Ana Souza".to_owned(),
            username: username.to_owned(),
            email: Email::parse(email).unwrap(),
            phone: None,
            role: UserRole::Customer,
            user_type: UserType::Client,
            status: UserStatus::Pending,
            email_verified_at: None,
            google_id: None,
            facebook_id: None,
            avatar: None,
            password_hash: "hash".to_owned(),
        }
    }

    async fn store_with_tenants() -> MemoryStore {
        let store = MemoryStore::new();
        for name in ["Acme Salon", "Beta Barber"] {
            store
                .create_tenant(&TenantBlueprint::new(name, None).unwrap())
                .await
                .unwrap();
        }
        store
    }

    fn scope(id: &str) -> TenantScope {
        TenantScope::Tenant(TenantId::new(id))
    }

    #[tokio::test]
    async fn email_is_unique_per_tenant_only() {
        let store = store_with_tenants().await;
        store
            .create_user(&scope("acme-salon"), new_user("ana", "ana@mail.com"))
            .await
            .unwrap();

        let duplicate = store
            .create_user(&scope("acme-salon"), new_user("ana2", "ana@mail.com"))
            .await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(f)) if f == "email"));

        store
            .create_user(&scope("beta-barber"), new_user("ana3", "ana@mail.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn username_is_globally_unique() {
        let store = store_with_tenants().await;
        store
            .create_user(&scope("acme-salon"), new_user("ana", "ana@mail.com"))
            .await
            .unwrap();
        let duplicate = store
            .create_user(&scope("beta-barber"), new_user("ana", "other@mail.com"))
            .await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(f)) if f == "username"));
    }

    #[tokio::test]
    async fn scoped_reads_hide_other_tenants() {
        let store = store_with_tenants().await;
        let user = store
            .create_user(&scope("acme-salon"), new_user("ana", "ana@mail.com"))
            .await
            .unwrap();

        assert!(
            store
                .find_user(&scope("beta-barber"), user.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_user(&TenantScope::Platform, user.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn platform_scope_requires_explicit_tenant_on_create() {
        let store = store_with_tenants().await;
        let result = store
            .create_user(&TenantScope::Platform, new_user("ana", "ana@mail.com"))
            .await;
        assert!(matches!(result, Err(RepositoryError::Scope(_))));
    }

    #[tokio::test]
    async fn link_provider_keeps_existing_avatar() {
        let store = store_with_tenants().await;
        let mut input = new_user("ana", "ana@mail.com");
        input.avatar = Some("https://cdn/own.png".to_owned());
        let user = store.create_user(&scope("acme-salon"), input).await.unwrap();

        let linked = store
            .link_provider(
                &scope("acme-salon"),
                user.id,
                OAuthProvider::Google,
                "g-1",
                Some("https://google/pic.png"),
            )
            .await
            .unwrap();
        assert_eq!(linked.google_id.as_deref(), Some("g-1"));
        assert_eq!(linked.avatar.as_deref(), Some("https://cdn/own.png"));
    }

    #[tokio::test]
    async fn owner_must_share_the_tenant() {
        let store = store_with_tenants().await;
        let outsider = store
            .create_user(&scope("beta-barber"), new_user("out", "out@mail.com"))
            .await
            .unwrap();

        let result = store
            .create_establishment(
                &scope("acme-salon"),
                NewEstablishment {
                    tenant_id: None,
                    owner_id: outsider.id,
                    name: "Downtown".to_owned(),
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn staff_must_share_the_tenant() {
        let store = store_with_tenants().await;
        let owner = store
            .create_user(&scope("acme-salon"), new_user("owner", "owner@mail.com"))
            .await
            .unwrap();
        let outsider = store
            .create_user(&scope("beta-barber"), new_user("out", "out@mail.com"))
            .await
            .unwrap();
        let salon = store
            .create_establishment(
                &scope("acme-salon"),
                NewEstablishment {
                    tenant_id: None,
                    owner_id: owner.id,
                    name: "Downtown".to_owned(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let result = store
            .add_staff(&scope("acme-salon"), salon.id, outsider.id)
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert!(
            store
                .staff_ids(&scope("acme-salon"), salon.id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
