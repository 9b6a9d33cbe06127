//! Soundsync is an asynchronous client for the SoundSync music catalogue API,
//! a generic document store exposed over HTTP (`/crud/{collection}`).
//!
//! ## Configuration
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! soundsync = "0.1.0"
//! ```
//!
//! Soundsync uses asynchronous programming with `async` and `await`.
//!
//! The server address and default page size come from a [`ClientConfig`],
//! either built in code or read from the environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `SOUNDSYNC_API_BASE` | `http://127.0.0.1:8000` |
//! | `SOUNDSYNC_PAGE_SIZE` | `50` |
//! | `SOUNDSYNC_TIMEOUT_SECS` | transport default |
//!
//! ## Getting Started
//!
//! Every collection is reachable through the generic document operations on
//! [`CrudClient`] (`list_documents`, `find_by_field`, `create_document`, ...),
//! and the catalogue collections also have typed namespaces:
//! `client.tracks()`, `client.albums()`, `client.playlists()`, `client.likes()`...
//!
//! Filters are Mongo-style query documents, built with [`FilterBuilder`].
//!
//! ### Examples
//!
//! ```toml
//! [dependencies]
//! soundsync = { version = "0.1.0" }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ```rust,no_run
//! use soundsync::client::{CrudClient, ListOptions};
//! use soundsync::config::ClientConfig;
//! use soundsync::filter::FilterBuilder;
//! use soundsync::model::like::LikeTarget;
//! use soundsync::model::track::Track;
//! use dotenv::dotenv;
//!
//! #[tokio::main]
//! async fn main() {
//!     {
//!         dotenv().ok();
//!     }
//!
//!     let client = CrudClient::new(ClientConfig::from_env().unwrap()).unwrap();
//!
//!     // Log in with a username or an email
//!     let account = client.auth().login("miles@example.com", "kindofblue").await.unwrap();
//!
//!     // Jazz tracks matching "blue", second page
//!     let filter = FilterBuilder::new()
//!         .query("blue")
//!         .search_fields(vec!["title", "artist"])
//!         .field("genre", "Jazz")
//!         .build();
//!     let options = ListOptions::new().filter(filter).skip(10).limit(10);
//!     let page = client.list_documents::<Track>("tracks", &options).await.unwrap();
//!     println!("{} of {} tracks", page.items.len(), page.total);
//!
//!     if let (Some(user_id), Some(track)) = (account.id(), page.items.first()) {
//!         let track_id = track.id.as_deref().unwrap_or_default();
//!         let toggled = client.likes().toggle(user_id, LikeTarget::Track, track_id).await;
//!         println!("{:?}", toggled);
//!     }
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod debounce;
pub mod endpoints;
pub mod filter;
pub mod model;
pub mod page;

pub use crate::client::{ClientError, ClientResult, CrudClient, ListOptions};
pub use crate::config::ClientConfig;
pub use crate::filter::FilterBuilder;
pub use crate::page::Page;

use crate::auth::Auth;
use crate::endpoints::albums::*;
use crate::endpoints::artists::*;
use crate::endpoints::likes::*;
use crate::endpoints::meta::*;
use crate::endpoints::playlists::*;
use crate::endpoints::search::*;
use crate::endpoints::tracks::*;
use crate::endpoints::uploads::*;
use crate::endpoints::users::*;

// Endpoint function namespaces

impl CrudClient {
    pub const fn auth(&self) -> Auth {
        Auth(self)
    }

    pub const fn albums(&self) -> Albums {
        Albums(self)
    }

    pub const fn artists(&self) -> Artists {
        Artists(self)
    }

    pub const fn likes(&self) -> Likes {
        Likes(self)
    }

    pub const fn meta(&self) -> Meta {
        Meta(self)
    }

    pub const fn playlists(&self) -> Playlists {
        Playlists(self)
    }

    pub const fn searches(&self) -> Search {
        Search(self)
    }

    pub const fn tracks(&self) -> Tracks {
        Tracks(self)
    }

    pub const fn uploads(&self) -> Uploads {
        Uploads(self)
    }

    pub const fn users(&self) -> Users {
        Users(self)
    }
}
