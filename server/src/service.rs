use async_trait::async_trait;
use common::{GeneratedImage, Profile, SIGNUP_BONUS_CREDITS};
use errors::AppError;
use genapi::{ImageGenerator, PlaceholderGenerator};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug)]
pub struct GenerationOutcome {
    pub image: GeneratedImage,
    pub remaining_credits: i64,
}

/// The credit-ledger workflow: check balance, generate, debit and record
/// as one unit, so that for every user
/// `credits == SIGNUP_BONUS_CREDITS - count(records)` holds at all times.
#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Option<Profile>;

    /// Creates the profile row with the signup bonus. Idempotent on
    /// `user_id`. A failure here is fatal to the signup.
    async fn provision_profile(&self, user_id: Uuid, email: &str) -> Result<Profile, AppError>;

    async fn list_images(&self, user_id: Uuid) -> Vec<GeneratedImage>;

    /// Validating -> Generating -> Settling -> Done. Any failure leaves
    /// balance and history untouched.
    async fn generate(&self, user_id: Uuid, prompt: &str) -> Result<GenerationOutcome, AppError>;
}

pub struct RealLedgerService {
    pub pool: PgPool,
    pub generator: Arc<dyn ImageGenerator>,
}

#[async_trait]
impl LedgerService for RealLedgerService {
    async fn get_profile(&self, user_id: Uuid) -> Option<Profile> {
        db::get_profile(&self.pool, user_id).await
    }

    async fn provision_profile(&self, user_id: Uuid, email: &str) -> Result<Profile, AppError> {
        db::insert_profile(&self.pool, user_id, email, SIGNUP_BONUS_CREDITS)
            .await
            .map_err(AppError::Store)?;
        db::get_profile(&self.pool, user_id)
            .await
            .ok_or_else(|| AppError::Store(anyhow::anyhow!("profile missing after insert")))
    }

    async fn list_images(&self, user_id: Uuid) -> Vec<GeneratedImage> {
        db::list_images_for_user(&self.pool, user_id)
            .await
            .unwrap_or_else(|e| {
                log::error!("Failed to list images for {user_id}: {e}");
                Vec::new()
            })
    }

    async fn generate(&self, user_id: Uuid, prompt: &str) -> Result<GenerationOutcome, AppError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::prompt_required());
        }

        let profile = db::get_profile(&self.pool, user_id)
            .await
            .ok_or_else(|| AppError::Store(anyhow::anyhow!("profile missing for {user_id}")))?;
        if profile.credits < 1 {
            return Err(AppError::insufficient_credits());
        }

        let image_url = self
            .generator
            .generate(prompt)
            .await
            .map_err(|e| AppError::Adapter(e.into()))?;

        match db::settle_generation(&self.pool, user_id, prompt, &image_url)
            .await
            .map_err(AppError::Store)?
        {
            db::SettleOutcome::Recorded {
                image,
                remaining_credits,
            } => Ok(GenerationOutcome {
                image,
                remaining_credits,
            }),
            // Lost the race for the last credit between the early check
            // and the conditional decrement.
            db::SettleOutcome::InsufficientCredits => Err(AppError::insufficient_credits()),
        }
    }
}

// --- In-memory service for --demo mode and tests ---

#[derive(Default)]
struct DemoState {
    profiles: HashMap<Uuid, Profile>,
    images: Vec<GeneratedImage>,
}

pub struct DemoLedgerService {
    state: Mutex<DemoState>,
    generator: Arc<dyn ImageGenerator>,
}

impl DemoLedgerService {
    pub fn new() -> Self {
        Self::with_generator(Arc::new(PlaceholderGenerator))
    }

    pub fn with_generator(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            state: Mutex::new(DemoState::default()),
            generator,
        }
    }

    fn now_date() -> String {
        chrono::Utc::now().format("%Y-%m-%d").to_string()
    }

    fn now_datetime() -> String {
        chrono::Utc::now().format("%Y-%m-%d %H:%M").to_string()
    }
}

impl Default for DemoLedgerService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerService for DemoLedgerService {
    async fn get_profile(&self, user_id: Uuid) -> Option<Profile> {
        let state = self.state.lock().expect("demo state poisoned");
        state.profiles.get(&user_id).cloned()
    }

    async fn provision_profile(&self, user_id: Uuid, email: &str) -> Result<Profile, AppError> {
        let mut state = self.state.lock().expect("demo state poisoned");
        let profile = state.profiles.entry(user_id).or_insert_with(|| Profile {
            user_id,
            email: email.to_string(),
            credits: SIGNUP_BONUS_CREDITS,
            created_at: Self::now_date(),
        });
        Ok(profile.clone())
    }

    async fn list_images(&self, user_id: Uuid) -> Vec<GeneratedImage> {
        let state = self.state.lock().expect("demo state poisoned");
        state
            .images
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn generate(&self, user_id: Uuid, prompt: &str) -> Result<GenerationOutcome, AppError> {
        let prompt = prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(AppError::prompt_required());
        }

        {
            let state = self.state.lock().expect("demo state poisoned");
            let profile = state
                .profiles
                .get(&user_id)
                .ok_or_else(|| AppError::Store(anyhow::anyhow!("profile missing for {user_id}")))?;
            if profile.credits < 1 {
                return Err(AppError::insufficient_credits());
            }
        }

        let image_url = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| AppError::Adapter(e.into()))?;

        // Re-check under the lock: the balance may have been spent while
        // the adapter call was in flight. Debit and record together or
        // not at all.
        let mut state = self.state.lock().expect("demo state poisoned");
        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::Store(anyhow::anyhow!("profile missing for {user_id}")))?;
        if profile.credits < 1 {
            return Err(AppError::insufficient_credits());
        }
        profile.credits -= 1;
        let remaining_credits = profile.credits;
        let image = GeneratedImage {
            image_id: Uuid::new_v4(),
            user_id,
            prompt,
            image_url,
            created_at: Self::now_datetime(),
        };
        state.images.push(image.clone());
        Ok(GenerationOutcome {
            image,
            remaining_credits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genapi::GenApiError;

    struct FailingGenerator;

    #[async_trait]
    impl ImageGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenApiError> {
            Err(GenApiError::MissingImageUrl)
        }
    }

    async fn provisioned(service: &DemoLedgerService) -> Uuid {
        let user_id = Uuid::new_v4();
        let profile = service.provision_profile(user_id, "a@x.com").await.unwrap();
        assert_eq!(profile.credits, SIGNUP_BONUS_CREDITS);
        user_id
    }

    #[tokio::test]
    async fn provisioning_is_idempotent() {
        let service = DemoLedgerService::new();
        let user_id = Uuid::new_v4();
        service.provision_profile(user_id, "a@x.com").await.unwrap();
        service.generate(user_id, "sunset").await.unwrap();
        // A double-submitted signup must not reset the balance.
        let profile = service.provision_profile(user_id, "a@x.com").await.unwrap();
        assert_eq!(profile.credits, SIGNUP_BONUS_CREDITS - 1);
    }

    #[tokio::test]
    async fn generate_debits_exactly_one_credit_and_records() {
        let service = DemoLedgerService::new();
        let user_id = provisioned(&service).await;

        let outcome = service.generate(user_id, "sunset").await.unwrap();
        assert_eq!(outcome.remaining_credits, SIGNUP_BONUS_CREDITS - 1);
        assert_eq!(outcome.image.prompt, "sunset");
        assert!(outcome.image.image_url.contains("picsum.photos"));

        let profile = service.get_profile(user_id).await.unwrap();
        assert_eq!(profile.credits, SIGNUP_BONUS_CREDITS - 1);
        let images = service.list_images(user_id).await;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].prompt, "sunset");
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_anything_happens() {
        let service = DemoLedgerService::with_generator(Arc::new(FailingGenerator));
        let user_id = provisioned(&service).await;

        // The failing generator proves the adapter is never reached.
        let err = service.generate(user_id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), errors::PROMPT_REQUIRED_MSG);

        let profile = service.get_profile(user_id).await.unwrap();
        assert_eq!(profile.credits, SIGNUP_BONUS_CREDITS);
        assert!(service.list_images(user_id).await.is_empty());
    }

    #[tokio::test]
    async fn adapter_failure_never_debits() {
        let service = DemoLedgerService::with_generator(Arc::new(FailingGenerator));
        let user_id = provisioned(&service).await;

        let err = service.generate(user_id, "sunset").await.unwrap_err();
        assert!(matches!(err, AppError::Adapter(_)));

        let profile = service.get_profile(user_id).await.unwrap();
        assert_eq!(profile.credits, SIGNUP_BONUS_CREDITS);
        assert!(service.list_images(user_id).await.is_empty());
    }

    #[tokio::test]
    async fn exhausted_balance_rejects_generation() {
        let service = DemoLedgerService::new();
        let user_id = provisioned(&service).await;

        for i in 0..SIGNUP_BONUS_CREDITS {
            service.generate(user_id, &format!("prompt {i}")).await.unwrap();
        }
        let profile = service.get_profile(user_id).await.unwrap();
        assert_eq!(profile.credits, 0);

        let err = service.generate(user_id, "one more").await.unwrap_err();
        assert_eq!(err.to_string(), errors::INSUFFICIENT_CREDITS_MSG);

        let profile = service.get_profile(user_id).await.unwrap();
        assert_eq!(profile.credits, 0);
        assert_eq!(
            service.list_images(user_id).await.len() as i64,
            SIGNUP_BONUS_CREDITS
        );
    }

    #[tokio::test]
    async fn ledger_invariant_holds_after_every_step() {
        let service = DemoLedgerService::new();
        let user_id = provisioned(&service).await;

        for i in 0..5 {
            service.generate(user_id, &format!("prompt {i}")).await.unwrap();
            let profile = service.get_profile(user_id).await.unwrap();
            let records = service.list_images(user_id).await.len() as i64;
            assert_eq!(profile.credits, SIGNUP_BONUS_CREDITS - records);
        }
    }

    #[tokio::test]
    async fn concurrent_requests_for_last_credit_yield_one_success() {
        let service = Arc::new(DemoLedgerService::new());
        let user_id = provisioned(&service).await;

        // Drain the balance down to a single credit.
        for i in 0..SIGNUP_BONUS_CREDITS - 1 {
            service.generate(user_id, &format!("warmup {i}")).await.unwrap();
        }

        let a = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.generate(user_id, "racer a").await })
        };
        let b = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.generate(user_id, "racer b").await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let profile = service.get_profile(user_id).await.unwrap();
        assert_eq!(profile.credits, 0);
        assert_eq!(
            service.list_images(user_id).await.len() as i64,
            SIGNUP_BONUS_CREDITS
        );
    }

    #[tokio::test]
    async fn history_is_newest_first_and_stable() {
        let service = DemoLedgerService::new();
        let user_id = provisioned(&service).await;

        service.generate(user_id, "first").await.unwrap();
        service.generate(user_id, "second").await.unwrap();
        service.generate(user_id, "third").await.unwrap();

        let listed = service.list_images(user_id).await;
        let prompts: Vec<&str> = listed.iter().map(|i| i.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["third", "second", "first"]);

        let again = service.list_images(user_id).await;
        let ids: Vec<Uuid> = listed.iter().map(|i| i.image_id).collect();
        let ids_again: Vec<Uuid> = again.iter().map(|i| i.image_id).collect();
        assert_eq!(ids, ids_again);
    }

    #[tokio::test]
    async fn history_is_scoped_per_user() {
        let service = DemoLedgerService::new();
        let alice = provisioned(&service).await;
        let bob = Uuid::new_v4();
        service.provision_profile(bob, "b@x.com").await.unwrap();

        service.generate(alice, "alice prompt").await.unwrap();
        service.generate(bob, "bob prompt").await.unwrap();

        let for_alice = service.list_images(alice).await;
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_alice[0].prompt, "alice prompt");
    }

    #[tokio::test]
    async fn generate_without_profile_is_a_store_error() {
        let service = DemoLedgerService::new();
        let err = service.generate(Uuid::new_v4(), "sunset").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }
}
