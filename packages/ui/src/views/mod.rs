mod confirm_dialog;
pub use confirm_dialog::ConfirmDialog;

mod load_error;
pub use load_error::LoadError;

mod post_form;
pub use post_form::PostForm;

mod home;
pub use home::HomeView;

mod author;
pub use author::AuthorView;

mod dashboard;
pub use dashboard::DashboardView;

mod edit_post;
pub use edit_post::EditPostView;

mod login;
pub use login::LoginView;

mod signup;
pub use signup::SignupView;

mod profile;
pub use profile::ProfileView;

mod not_found;
pub use not_found::NotFoundView;
