//! Account lookup and login across the `users` and `artists` collections.
//!
//! Listeners and artists live in two separate collections and an identifier
//! can be either a username or an email. Lookups probe a fixed sequence of
//! `(collection, field)` pairs and stop at the first document found.

// Use 3rd party
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

// Use internal modules
use crate::client::{ClientError, ClientResult, CrudClient, ListOptions};
use crate::filter::eq_clause;
use crate::model::artist::Artist;
use crate::model::user::{Role, User};
use crate::model::Document;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRole {
    User,
    Artist,
}

impl AccountRole {
    pub fn collection(self) -> &'static str {
        match self {
            AccountRole::User => User::COLLECTION,
            AccountRole::Artist => Artist::COLLECTION,
        }
    }
}

/// One lookup step: which collection to query, by which field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    pub role: AccountRole,
    pub field: &'static str,
}

impl Probe {
    pub fn collection(&self) -> &'static str {
        self.role.collection()
    }
}

/// Probe sequence for a login identifier: email first when it looks like an
/// email address, users before artists.
pub fn probe_order(identifier: &str) -> Vec<Probe> {
    let fields = if identifier.contains('@') {
        ["email", "username"]
    } else {
        ["username", "email"]
    };

    [AccountRole::User, AccountRole::Artist]
        .iter()
        .flat_map(|role| fields.iter().map(move |field| Probe { role: *role, field: *field }))
        .collect()
}

/// Fields used to re-fetch a known account document.
fn account_fields(role: AccountRole) -> [&'static str; 3] {
    match role {
        AccountRole::User => ["username", "email", "_id"],
        AccountRole::Artist => ["username", "_id", "email"],
    }
}

/// An account document, tagged with the collection it was found in.
#[derive(Clone, Debug, PartialEq)]
pub enum Account {
    User(User),
    Artist(Artist),
}

impl Account {
    fn from_value(role: AccountRole, document: Value) -> ClientResult<Self> {
        let account = match role {
            AccountRole::User => Account::User(serde_json::from_value(document)?),
            AccountRole::Artist => Account::Artist(serde_json::from_value(document)?),
        };
        Ok(account)
    }

    pub fn role(&self) -> AccountRole {
        match self {
            Account::User(_) => AccountRole::User,
            Account::Artist(_) => AccountRole::Artist,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Account::User(user) => user.id(),
            Account::Artist(artist) => artist.id(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Account::User(user) => user.username.as_deref(),
            Account::Artist(artist) => artist.username.as_deref(),
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Account::User(user) => user.email.as_deref(),
            Account::Artist(artist) => artist.email.as_deref(),
        }
    }

    fn password(&self) -> Option<&str> {
        match self {
            Account::User(user) => user.password.as_deref(),
            Account::Artist(artist) => artist.password.as_deref(),
        }
    }

    fn field(&self, field: &str) -> Option<&str> {
        match field {
            "_id" => self.id(),
            "username" => self.username(),
            "email" => self.email(),
            _ => None,
        }
    }
}

pub struct Auth<'a>(pub &'a CrudClient);

impl Auth<'_> {
    /// First account whose username or email equals `identifier`.
    pub async fn find_account(&self, identifier: &str) -> ClientResult<Option<Account>> {
        let options = ListOptions::new().limit(1);
        for probe in probe_order(identifier) {
            debug!("looking up {} by {}", probe.collection(), probe.field);
            let lookup = self
                .0
                .find_by_field::<Value>(probe.collection(), probe.field, identifier, &options)
                .await;

            match lookup {
                Ok(lookup) => {
                    if let Some(document) = lookup.first() {
                        return Account::from_value(probe.role, document).map(Some);
                    }
                }
                Err(ClientError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Passwords are stored and compared in plain text by this backend.
    pub async fn login(&self, identifier: &str, password: &str) -> ClientResult<Account> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ClientError::Validation("an identifier is required".to_owned()));
        }

        let account = self
            .find_account(identifier)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("no account for {}", identifier)))?;

        if account.password() != Some(password) {
            return Err(ClientError::Authentication(format!(
                "wrong password for {}",
                identifier
            )));
        }

        info!("{} logged in from {}", identifier, account.role().collection());
        Ok(account)
    }

    /// Re-fetches the authoritative document of an account the caller already
    /// holds, trying each identifying field it carries.
    pub async fn resolve_account(&self, known: &Account) -> ClientResult<Option<Account>> {
        let role = known.role();
        for field in account_fields(role).iter() {
            let value = match known.field(field) {
                Some(value) if !value.is_empty() => value,
                _ => continue,
            };

            let options = ListOptions::new().filter(eq_clause(field, value)).limit(1);
            let page = self.0.list_documents::<Value>(role.collection(), &options).await?;
            if let Some(document) = page.first() {
                return Account::from_value(role, document).map(Some);
            }
        }
        Ok(None)
    }

    /// Creates a listener account and returns its id.
    pub async fn register(&self, user: &User) -> ClientResult<String> {
        for (name, value) in [
            ("username", &user.username),
            ("email", &user.email),
            ("password", &user.password),
        ]
        .iter()
        {
            if value.as_deref().map_or(true, |value| value.trim().is_empty()) {
                return Err(ClientError::Validation(format!("{} is required", name)));
            }
        }

        let mut user = user.clone();
        user.id = None;
        user.role.get_or_insert(Role::User);
        self.0.create_document(User::COLLECTION, &user).await
    }

    pub async fn update_account<U: Serialize + ?Sized>(&self, account: &Account, update: &U) -> ClientResult<u64> {
        let id = account
            .id()
            .ok_or_else(|| ClientError::Validation("account has no _id".to_owned()))?;
        self.0.update_document(account.role().collection(), id, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, mock_request_success, mock_request_success_from_file};
    use mockito::{mock, Matcher};
    use serde_json::json;

    fn not_found(path: &str) -> mockito::Mock {
        mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"detail": "Document not found"}"#)
            .create()
    }

    #[test]
    fn probe_order_for_email() {
        let order: Vec<(&str, &str)> = probe_order("a@b.com")
            .iter()
            .map(|probe| (probe.collection(), probe.field))
            .collect();
        assert_eq!(
            order,
            vec![
                ("users", "email"),
                ("users", "username"),
                ("artists", "email"),
                ("artists", "username"),
            ]
        );
    }

    #[test]
    fn probe_order_for_username() {
        let order: Vec<(&str, &str)> = probe_order("bob")
            .iter()
            .map(|probe| (probe.collection(), probe.field))
            .collect();
        assert_eq!(
            order,
            vec![
                ("users", "username"),
                ("users", "email"),
                ("artists", "username"),
                ("artists", "email"),
            ]
        );
    }

    #[tokio::test]
    async fn login_user_by_username() {
        let _mock = mock_request_success_from_file(
            "GET",
            "/crud/users/by/username/bob",
            vec![],
            "tests/files/user_document.json",
        );
        let skipped = mock("GET", Matcher::Regex("^/crud/artists/.*$".to_owned()))
            .match_query(Matcher::Any)
            .expect(0)
            .create();

        let account = client().auth().login("bob", "hunter2").await.unwrap();
        assert_eq!(account.role(), AccountRole::User);
        assert_eq!(account.id(), Some("u-1"));
        skipped.assert();
    }

    #[tokio::test]
    async fn login_falls_through_to_artists() {
        let _users_email = not_found("/crud/users/by/email/miles@example.com");
        let _users_username = not_found("/crud/users/by/username/miles@example.com");
        let artists_email = mock_request_success_from_file(
            "GET",
            "/crud/artists/by/email/miles@example.com",
            vec![],
            "tests/files/artist_document.json",
        );
        let artists_username = mock("GET", "/crud/artists/by/username/miles@example.com")
            .match_query(Matcher::Any)
            .expect(0)
            .create();

        let account = client()
            .auth()
            .login("miles@example.com", "kindofblue")
            .await
            .unwrap();
        assert_eq!(account.role(), AccountRole::Artist);
        assert_eq!(account.username(), Some("miles"));
        artists_email.assert();
        artists_username.assert();
    }

    #[tokio::test]
    async fn login_wrong_password() {
        let _mock = mock_request_success_from_file(
            "GET",
            "/crud/users/by/username/bob",
            vec![],
            "tests/files/user_document.json",
        );

        let err = client().auth().login("bob", "nope").await.unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));
    }

    #[tokio::test]
    async fn login_unknown_identifier() {
        let _users_username = not_found("/crud/users/by/username/ghost");
        let _users_email = not_found("/crud/users/by/email/ghost");
        let _artists_username = not_found("/crud/artists/by/username/ghost");
        let _artists_email = not_found("/crud/artists/by/email/ghost");

        let err = client().auth().login("ghost", "x").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn login_requires_identifier() {
        let err = client().auth().login("   ", "x").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn resolve_account_skips_missing_fields() {
        let known = Account::Artist(Artist {
            id: Some("ar-1".to_owned()),
            ..Default::default()
        });
        let _mock = mock_request_success(
            "GET",
            "/crud/artists",
            vec![
                Matcher::UrlEncoded("filter".into(), r#"{"_id":"ar-1"}"#.into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ],
            r#"{"items": [{"_id": "ar-1", "username": "miles", "genre": "Jazz"}], "total": 1, "skip": 0, "limit": 1}"#,
        );

        let account = client().auth().resolve_account(&known).await.unwrap().unwrap();
        match account {
            Account::Artist(artist) => assert_eq!(artist.genre.as_deref(), Some("Jazz")),
            other => panic!("unexpected account {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let user = User {
            username: Some("bob".to_owned()),
            email: Some("".to_owned()),
            password: Some("pw".to_owned()),
            ..Default::default()
        };
        let err = client().auth().register(&user).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn register_creates_user() {
        let create = mock("POST", "/crud/users")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "hunter2",
                "role": "user"
            })))
            .with_body(r#"{"id": "u-1", "message": "Document created in users"}"#)
            .create();

        let user = User {
            id: Some("ignored".to_owned()),
            username: Some("bob".to_owned()),
            email: Some("bob@example.com".to_owned()),
            password: Some("hunter2".to_owned()),
            ..Default::default()
        };
        let id = client().auth().register(&user).await.unwrap();
        assert_eq!(id, "u-1");
        create.assert();
    }
}
