pub mod facebook;
pub mod github;
pub mod google;
pub mod line;
pub mod twitter;

pub use facebook::FacebookProvider;
pub use github::GithubProvider;
pub use google::GoogleProvider;
pub use line::LineProvider;
pub use twitter::TwitterProvider;
