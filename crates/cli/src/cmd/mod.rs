mod init;
mod list;
mod resolve;
mod run;
mod watch;

pub use init::cmd_init;
pub use list::cmd_list;
pub use resolve::cmd_resolve;
pub use run::cmd_run;
pub use watch::cmd_watch;
