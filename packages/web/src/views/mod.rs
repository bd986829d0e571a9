mod shell;
pub use shell::Shell;

mod home;
pub use home::Home;

mod login;
pub use login::Login;

mod signup;
pub use signup::Signup;

mod dashboard;
pub use dashboard::Dashboard;

mod edit_blog;
pub use edit_blog::EditBlog;

mod profile;
pub use profile::Profile;

mod author;
pub use author::Author;

mod not_found;
pub use not_found::NotFound;
