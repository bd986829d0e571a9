//! Shared backend constructor for all platforms.
//!
//! [`make_backend`] picks the collaborator the app talks to:
//! - **default**: [`store::FirebaseBackend`], configured from `FIREBASE_*` variables
//!   (captured at build time on wasm + `web`, read at startup otherwise). The
//!   sign-in is kept in `localStorage` on the web and in
//!   `<data_dir>/blog-app/session.json` elsewhere, so a reload stays signed in.
//! - **`offline` feature**: [`store::MemoryBackend`], nothing leaves the process
//!
//! [`ServicesProvider`] builds the backend once and puts a [`Services`] bundle into
//! the Dioxus context for every screen below it.

use api::{PostRepository, SessionProvider, UserDirectory};
use dioxus::prelude::*;

#[cfg(not(feature = "offline"))]
pub type AppBackend = store::FirebaseBackend;
#[cfg(feature = "offline")]
pub type AppBackend = store::MemoryBackend;

/// Create the platform-appropriate backend.
pub fn make_backend() -> Result<AppBackend, store::ConfigError> {
    #[cfg(feature = "offline")]
    {
        Ok(store::MemoryBackend::new())
    }
    #[cfg(all(not(feature = "offline"), target_arch = "wasm32", feature = "web"))]
    {
        let config = store::BackendConfig::from_build_env()?;
        let tokens = store::LocalTokenStore::new(SESSION_KEY);
        Ok(store::FirebaseBackend::with_token_store(config, tokens))
    }
    #[cfg(all(not(feature = "offline"), not(all(target_arch = "wasm32", feature = "web"))))]
    {
        let config = store::BackendConfig::from_env()?;
        Ok(store::FirebaseBackend::with_token_store(config, session_file()))
    }
}

#[cfg(all(not(feature = "offline"), target_arch = "wasm32", feature = "web"))]
const SESSION_KEY: &str = "blog-app.session";

#[cfg(all(not(feature = "offline"), not(all(target_arch = "wasm32", feature = "web"))))]
fn session_file() -> store::FileTokenStore {
    #[cfg(not(target_arch = "wasm32"))]
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    #[cfg(target_arch = "wasm32")]
    let base = std::path::PathBuf::from(".");
    store::FileTokenStore::new(base.join("blog-app").join("session.json"))
}

/// Session, posts and profiles over one shared backend.
#[derive(Clone)]
pub struct Services {
    pub session: SessionProvider<AppBackend>,
    pub posts: PostRepository<AppBackend>,
    pub users: UserDirectory<AppBackend>,
}

impl Services {
    pub fn new(backend: AppBackend) -> Self {
        Self {
            session: SessionProvider::new(backend.clone()),
            posts: PostRepository::new(backend.clone()),
            users: UserDirectory::new(backend),
        }
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session
    }
}

pub fn use_services() -> Services {
    use_context::<Services>()
}

/// Builds the backend and provides [`Services`] to `children`.
///
/// A configuration error replaces the whole app with an error page.
#[component]
pub fn ServicesProvider(children: Element) -> Element {
    let services = use_hook(|| match make_backend() {
        Ok(backend) => Ok(Services::new(backend)),
        Err(e) => {
            tracing::error!("backend configuration: {e}");
            Err(e.to_string())
        }
    });

    match services {
        Ok(services) => rsx! {
            ServicesScope { services, {children} }
        },
        Err(message) => rsx! {
            div {
                class: "view-page",
                h1 { class: "view-title", "Configuration error" }
                p { class: "view-error", "{message}" }
            }
        },
    }
}

#[component]
fn ServicesScope(services: Services, children: Element) -> Element {
    use_context_provider(|| services);
    rsx! {
        {children}
    }
}
