use dioxus::prelude::*;

use ui::{AuthProvider, ServicesProvider};
use views::{Author, Dashboard, EditBlog, Home, Login, NotFound, Profile, Shell, Signup};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Shell)]
        #[route("/")]
        Home {},
        #[route("/login")]
        Login {},
        #[route("/signup")]
        Signup {},
        #[route("/dashboard")]
        Dashboard {},
        #[route("/profile")]
        Profile {},
        #[route("/author/:id")]
        Author { id: String },
        #[route("/edit-blog/:id")]
        EditBlog { id: String },
        #[route("/:..segments")]
        NotFound { segments: Vec<String> },
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::logger::init(tracing::Level::INFO).expect("failed to init logger");
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        ServicesProvider {
            AuthProvider {
                Router::<Route> {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str) -> Route {
        path.parse::<Route>().unwrap()
    }

    #[test]
    fn test_static_routes() {
        assert_eq!(parse("/"), Route::Home {});
        assert_eq!(parse("/login"), Route::Login {});
        assert_eq!(parse("/signup"), Route::Signup {});
        assert_eq!(parse("/dashboard"), Route::Dashboard {});
        assert_eq!(parse("/profile"), Route::Profile {});
    }

    #[test]
    fn test_parameter_routes() {
        assert_eq!(
            parse("/author/u1"),
            Route::Author {
                id: "u1".to_string()
            }
        );
        assert_eq!(
            parse("/edit-blog/-Nabc"),
            Route::EditBlog {
                id: "-Nabc".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_paths_are_not_found() {
        assert_eq!(
            parse("/no/such/page"),
            Route::NotFound {
                segments: vec!["no".to_string(), "such".to_string(), "page".to_string()]
            }
        );
    }

    #[test]
    fn test_route_display() {
        let route = Route::EditBlog {
            id: "p1".to_string(),
        };
        assert_eq!(route.to_string(), "/edit-blog/p1");
        assert_eq!(Route::Dashboard {}.to_string(), "/dashboard");
    }
}
