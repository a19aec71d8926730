pub mod approval;
pub mod ceremony;
pub mod session;
pub mod submitter;
pub mod vault;
pub mod wallet;
