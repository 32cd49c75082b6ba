use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    core::identity::types::{Identity, Template, MAX_DISPLAY_NAME_LEN},
    storage::IdentityStore,
    utils::{
        config::ResolutionConfig,
        error::{AttendanceError, Result},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentPolicy {
    pub min_template_len: usize,
    pub reject_duplicate_names: bool,
}

impl From<&ResolutionConfig> for EnrollmentPolicy {
    fn from(config: &ResolutionConfig) -> Self {
        Self {
            min_template_len: config.min_template_len,
            reject_duplicate_names: config.reject_duplicate_names,
        }
    }
}

pub struct EnrollmentService {
    store: Arc<dyn IdentityStore>,
    policy: EnrollmentPolicy,
    // makes the duplicate-name check and the insert one step
    enroll_lock: Mutex<()>,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn IdentityStore>, policy: EnrollmentPolicy) -> Self {
        Self {
            store,
            policy,
            enroll_lock: Mutex::new(()),
        }
    }

    pub async fn enroll(&self, name: &str, template: Template) -> Result<Identity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AttendanceError::MalformedInput("name must not be empty".into()));
        }
        if name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(AttendanceError::MalformedInput(format!(
                "name must be at most {} characters",
                MAX_DISPLAY_NAME_LEN
            )));
        }
        template.validate(self.policy.min_template_len)?;

        let _enrolling = self.enroll_lock.lock().await;

        if self.policy.reject_duplicate_names {
            if let Some(existing) = self.store.find_by_name(name).await? {
                warn!(existing = %existing.id, "Rejected enrollment with duplicate name");
                return Err(AttendanceError::DuplicateEnrollment(format!(
                    "an identity named '{}' is already enrolled",
                    existing.display_name
                )));
            }
        }

        let identity = Identity::new(name, template);
        self.store.insert(identity.clone()).await?;

        info!(identity = %identity.id, template_len = identity.template.len(), "Enrolled new identity");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryIdentityStore;
    use tokio_test::{assert_err, assert_ok};

    fn service(reject_duplicate_names: bool) -> (EnrollmentService, Arc<MemoryIdentityStore>) {
        let store = Arc::new(MemoryIdentityStore::new());
        let policy = EnrollmentPolicy { min_template_len: 64, reject_duplicate_names };
        (EnrollmentService::new(store.clone(), policy), store)
    }

    fn template(len: usize) -> Template {
        Template::new((0..len).map(|i| i as f32 / len as f32).collect())
    }

    #[tokio::test]
    async fn test_enroll_trims_and_stores() {
        let (service, store) = service(true);
        let identity = service.enroll("  Alice ", template(120)).await.unwrap();

        assert_eq!(identity.display_name, "Alice");
        let stored = store.get(&identity.id).await.unwrap().unwrap();
        assert_eq!(stored.template.len(), 120);
    }

    #[tokio::test]
    async fn test_enroll_validates_input() {
        let (service, _) = service(true);

        let result = service.enroll("   ", template(120)).await;
        assert!(matches!(result, Err(AttendanceError::MalformedInput(_))));

        let result = service.enroll("Alice", Template::new(Vec::new())).await;
        assert!(matches!(result, Err(AttendanceError::MalformedInput(_))));

        let result = service.enroll("Alice", template(10)).await;
        assert!(matches!(result, Err(AttendanceError::MalformedInput(_))));

        let long_name = "x".repeat(MAX_DISPLAY_NAME_LEN + 1);
        assert_err!(service.enroll(&long_name, template(120)).await);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected_case_insensitively() {
        let (service, store) = service(true);
        assert_ok!(service.enroll("Alice", template(120)).await);

        let result = service.enroll("alice", template(120)).await;
        assert!(matches!(result, Err(AttendanceError::DuplicateEnrollment(_))));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_allowed_when_policy_is_off() {
        let (service, store) = service(false);
        assert_ok!(service.enroll("Alice", template(120)).await);
        assert_ok!(service.enroll("Alice", template(120)).await);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_enrollments_admit_one() {
        let (service, store) = service(true);
        let service = Arc::new(service);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.enroll("Alice", template(120)).await })
            })
            .collect();

        let admitted = futures::future::join_all(handles)
            .await
            .into_iter()
            .filter(|joined| matches!(joined, Ok(Ok(_))))
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
