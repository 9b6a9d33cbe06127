//! Endpoint functions for user administration

// Use 3rd party
use serde_json::json;

use crate::client::*;
use crate::filter::FilterBuilder;
use crate::model::user::*;
use crate::model::Document;
use crate::page::Page;

pub struct Users<'a>(pub &'a CrudClient);

impl Users<'_> {
    pub async fn get(&self, id: &str) -> ClientResult<User> {
        self.0.get_document::<User>(id).await
    }

    /// One page of users, passwords left out.
    pub async fn list(&self, skip: u64, limit: u64) -> ClientResult<Page<User>> {
        let options = ListOptions::new()
            .projection(json!({ "password": 0 }))
            .skip(skip)
            .limit(limit);
        self.0.list_documents::<User>(User::COLLECTION, &options).await
    }

    pub async fn search(&self, term: &str) -> ClientResult<Vec<User>> {
        let options = ListOptions::new()
            .filter(FilterBuilder::new().query(term).search_fields(vec!["username", "email"]).build())
            .projection(json!({ "password": 0 }))
            .limit(20);
        let users = self.0.list_documents::<User>(User::COLLECTION, &options).await?.items;
        Ok(users)
    }

    pub async fn set_role(&self, id: &str, role: Role) -> ClientResult<u64> {
        self.0.update_document(User::COLLECTION, id, &json!({ "role": role })).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<Deleted> {
        self.0.delete_document(User::COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, mock_request_success, mock_request_success_from_file};
    use mockito::{mock, Matcher};

    #[tokio::test]
    async fn get() {
        let _mock = mock_request_success_from_file(
            "GET",
            "/crud/users/by/_id/u-1",
            vec![],
            "tests/files/user_document.json",
        );

        let user = client().users().get("u-1").await.unwrap();
        assert_eq!(user.role, Some(Role::User));
        assert_eq!(user.display_name(), Some("Bob"));
        assert_eq!(user.followed_artists, vec!["ar-1"]);
    }

    #[tokio::test]
    async fn list() {
        let _mock = mock_request_success(
            "GET",
            "/crud/users",
            vec![
                Matcher::UrlEncoded("projection".into(), r#"{"password":0}"#.into()),
                Matcher::UrlEncoded("skip".into(), "10".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ],
            r#"{"items": [{"_id": "u-11", "username": "ann", "role": "admin"}, {"_id": "u-12", "username": "cy", "role": "curator"}], "total": 12, "skip": 10, "limit": 10}"#,
        );

        let page = client().users().list(10, 10).await.unwrap();
        assert_eq!(page.items[0].role, Some(Role::Admin));
        assert_eq!(page.items[1].role, Some(Role::Unknown));
        assert!(!page.has_next());
        assert_eq!(page.page_number(), 2);
    }

    #[tokio::test]
    async fn set_role() {
        let update = mock("PUT", "/crud/users/by/u-1")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({"role": "artist"})))
            .with_body(r#"{"modified": 1, "message": "Document u-1 from users updated"}"#)
            .create();

        assert_eq!(client().users().set_role("u-1", Role::Artist).await.unwrap(), 1);
        update.assert();
    }

    #[tokio::test]
    async fn delete() {
        let _mock = mock_request_success(
            "DELETE",
            "/crud/users/by/u-1",
            vec![],
            r#"{"deleted": 1, "message": "Document {id} from {collection_name} deleted"}"#,
        );

        assert_eq!(client().users().delete("u-1").await.unwrap().deleted, 1);
    }
}
