use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, instrument};

use crate::auth::dto::{CreateUserParams, SignInParams, UpdateUserParams};
use crate::auth::repo_types::{User, UserDocument};
use crate::backend::{unique_id, AccountSession};
use crate::error::GatewayError;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Result of looking up who is signed in. `TransportError` keeps the failure
/// detail so callers can log it before treating it like `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum UserLookup {
    Found(User),
    NotFound,
    TransportError(String),
}

/// Register an account, sign into it and create its profile document.
#[instrument(skip(st, params), fields(email = %params.email))]
pub async fn create_user(
    st: &AppState,
    params: CreateUserParams,
) -> Result<UserDocument, GatewayError> {
    let account = st
        .backend
        .create_account(&unique_id(), &params.email, &params.password, &params.name)
        .await
        .map_err(|e| {
            error!(error = %e, "create account failed");
            e
        })?;
    if account.id.is_empty() {
        return Err(GatewayError::MissingRecord("account"));
    }

    sign_in(
        st,
        SignInParams {
            email: params.email.clone(),
            password: params.password,
        },
    )
    .await?;

    let avatar = st.backend.initials_avatar_url(&params.name);
    let profile = UserDocument::create(
        st,
        &unique_id(),
        &account.id,
        &params.email,
        &params.name,
        &avatar,
    )
    .await
    .map_err(|e| {
        error!(error = %e, account_id = %account.id, "create profile document failed");
        e
    })?;

    info!(account_id = %account.id, user_id = %profile.id, "user registered");
    Ok(profile)
}

#[instrument(skip(st, params), fields(email = %params.email))]
pub async fn sign_in(st: &AppState, params: SignInParams) -> Result<AccountSession, GatewayError> {
    let session = st
        .backend
        .create_email_password_session(&params.email, &params.password)
        .await?;
    info!(account_id = %session.user_id, "signed in");
    Ok(session)
}

/// Profile document of the signed-in account, if it has one.
#[instrument(skip(st))]
pub async fn get_current_user(st: &AppState) -> Result<Option<UserDocument>, GatewayError> {
    let account = st.backend.get_account().await?;
    let profile = UserDocument::find_by_account_id(st, &account.id).await?;
    debug!(account_id = %account.id, found = profile.is_some(), "current user resolved");
    Ok(profile)
}

/// [`get_current_user`] folded into a [`UserLookup`].
pub async fn lookup_current_user(st: &AppState) -> UserLookup {
    match get_current_user(st).await {
        Ok(Some(doc)) => UserLookup::Found(User::from(doc)),
        Ok(None) => UserLookup::NotFound,
        Err(e) => UserLookup::TransportError(e.to_string()),
    }
}

#[instrument(skip(st, changes))]
pub async fn update_user(
    st: &AppState,
    user_id: &str,
    changes: UpdateUserParams,
) -> Result<User, GatewayError> {
    let doc = UserDocument::update(st, user_id, &changes).await?;
    info!(user_id = %doc.id, "profile updated");
    Ok(User::from(doc))
}

#[instrument(skip(st))]
pub async fn sign_out(st: &AppState) -> Result<(), GatewayError> {
    st.backend.delete_session("current").await?;
    info!("signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::{json, Value};

    use crate::backend::fake::FakeBackend;
    use crate::backend::{Account, Backend, DocumentList, Query};
    use crate::error::BackendError;

    fn jane() -> CreateUserParams {
        CreateUserParams {
            email: "jane@example.com".into(),
            password: "password123".into(),
            name: "Jane Doe".into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn create_user_then_current_user_has_initials_avatar() {
        let (st, fake) = AppState::fake();
        let created = create_user(&st, jane()).await.expect("create user");

        let current = get_current_user(&st)
            .await
            .expect("lookup")
            .expect("profile exists");
        let expected = crate::backend::initials_avatar_url(
            &st.config.appwrite.endpoint,
            &st.config.appwrite.project_id,
            "Jane Doe",
        );
        assert_eq!(current.id, created.id);
        assert_eq!(current.avatar, expected);
        assert_eq!(current.name, "Jane Doe");
        assert_eq!(current.account_id, fake.current_account_id().await.unwrap());
    }

    #[tokio::test]
    async fn create_user_propagates_duplicate_account() {
        let (st, _fake) = AppState::fake();
        create_user(&st, jane()).await.expect("first");
        sign_out(&st).await.expect("sign out");

        let err = create_user(&st, jane()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn create_user_fails_when_sign_in_fails() {
        let (st, fake) = AppState::fake();
        fake.create_account("other", "other@example.com", "password123", "Other")
            .await
            .expect("account");
        fake.create_email_password_session("other@example.com", "password123")
            .await
            .expect("session");

        let err = create_user(&st, jane()).await.unwrap_err();
        assert!(err.to_string().contains("session is active"));
        let cfg = &st.config.appwrite;
        assert!(fake
            .documents(&cfg.database_id, &cfg.user_collection_id)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_propagates() {
        let (st, _fake) = AppState::fake();
        create_user(&st, jane()).await.expect("create");
        sign_out(&st).await.expect("sign out");

        let err = sign_in(
            &st,
            SignInParams {
                email: "jane@example.com".into(),
                password: "wrong-password".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid credentials. Please check the email and password."
        );
    }

    #[tokio::test]
    async fn current_user_without_session_is_an_error() {
        let (st, _fake) = AppState::fake();
        let err = get_current_user(&st).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Backend(BackendError::Api { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn lookup_distinguishes_outcomes() {
        let (st, fake) = AppState::fake();
        assert!(matches!(
            lookup_current_user(&st).await,
            UserLookup::TransportError(_)
        ));

        fake.create_account("A1", "a1@example.com", "password123", "A One")
            .await
            .expect("account");
        fake.create_email_password_session("a1@example.com", "password123")
            .await
            .expect("session");
        assert_eq!(lookup_current_user(&st).await, UserLookup::NotFound);

        let cfg = &st.config.appwrite;
        fake.seed_document(
            &cfg.database_id,
            &cfg.user_collection_id,
            json!({
                "$id": "U1",
                "$collectionId": cfg.user_collection_id,
                "$databaseId": cfg.database_id,
                "$createdAt": "2025-07-27T00:00:00.000+00:00",
                "$updatedAt": "2025-07-27T00:00:00.000+00:00",
                "$permissions": [],
                "$sequence": 1,
                "accountId": "A1",
                "name": "A One",
                "email": "a1@example.com",
                "avatar": "https://fake.local/v1/avatars/initials?name=A+One&project=test"
            }),
        )
        .await;
        match lookup_current_user(&st).await {
            UserLookup::Found(user) => assert_eq!(user.id, "U1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_user_returns_projected_record() {
        let (st, _fake) = AppState::fake();
        let created = create_user(&st, jane()).await.expect("create");

        let updated = update_user(
            &st,
            &created.id,
            UpdateUserParams {
                name: "Jane Smith".into(),
                email: "jane.smith@example.com".into(),
            },
        )
        .await
        .expect("update");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Jane Smith");
        assert_eq!(updated.email, "jane.smith@example.com");
        assert_eq!(updated.avatar, created.avatar);
    }

    #[tokio::test]
    async fn update_unknown_document_propagates() {
        let (st, _fake) = AppState::fake();
        let err = update_user(
            &st,
            "missing",
            UpdateUserParams {
                name: "X".into(),
                email: "x@example.com".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("could not be found"));
    }

    #[tokio::test]
    async fn sign_out_without_session_propagates() {
        let (st, _fake) = AppState::fake();
        assert!(sign_out(&st).await.is_err());
    }

    /// Platform that acknowledges account creation without returning an id.
    struct BlankAccountBackend(Arc<FakeBackend>);

    #[async_trait]
    impl Backend for BlankAccountBackend {
        async fn create_account(
            &self,
            account_id: &str,
            email: &str,
            password: &str,
            name: &str,
        ) -> Result<Account, BackendError> {
            let mut account = self
                .0
                .create_account(account_id, email, password, name)
                .await?;
            account.id.clear();
            Ok(account)
        }

        async fn create_email_password_session(
            &self,
            email: &str,
            password: &str,
        ) -> Result<AccountSession, BackendError> {
            self.0.create_email_password_session(email, password).await
        }

        async fn get_account(&self) -> Result<Account, BackendError> {
            self.0.get_account().await
        }

        async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
            self.0.delete_session(session_id).await
        }

        async fn create_document(
            &self,
            database_id: &str,
            collection_id: &str,
            document_id: &str,
            data: Value,
        ) -> Result<Value, BackendError> {
            self.0
                .create_document(database_id, collection_id, document_id, data)
                .await
        }

        async fn list_documents(
            &self,
            database_id: &str,
            collection_id: &str,
            queries: &[Query],
        ) -> Result<DocumentList, BackendError> {
            self.0.list_documents(database_id, collection_id, queries).await
        }

        async fn update_document(
            &self,
            database_id: &str,
            collection_id: &str,
            document_id: &str,
            data: Value,
        ) -> Result<Value, BackendError> {
            self.0
                .update_document(database_id, collection_id, document_id, data)
                .await
        }

        async fn get_file_view(&self, bucket_id: &str, file_id: &str) -> Result<Bytes, BackendError> {
            self.0.get_file_view(bucket_id, file_id).await
        }

        fn initials_avatar_url(&self, name: &str) -> String {
            self.0.initials_avatar_url(name)
        }

        fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String {
            self.0.file_view_url(bucket_id, file_id)
        }
    }

    #[tokio::test]
    async fn create_user_without_account_id_is_missing_record() {
        let (fake_state, fake) = AppState::fake();
        let st = AppState::from_parts(
            fake_state.config.clone(),
            Arc::new(BlankAccountBackend(fake.clone())),
        );

        let err = create_user(&st, jane()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingRecord("account")), "{err:?}");
        assert_eq!(err.to_string(), "account was not created");
        assert_eq!(fake.sessions_created().await, 0);
        let cfg = &st.config.appwrite;
        assert!(fake
            .documents(&cfg.database_id, &cfg.user_collection_id)
            .await
            .is_empty());
    }
}

