pub mod checkout;
pub mod filter;
pub mod find;
pub mod gc;
pub mod index_filter;
pub mod init;
pub mod pull;
pub mod push;
pub mod status;
pub mod track;
pub mod verify;

pub use checkout::CheckoutCmd;
pub use filter::{FilterCleanCmd, FilterSmudgeCmd};
pub use find::FindCmd;
pub use gc::GcCmd;
pub use index_filter::IndexFilterCmd;
pub use init::InitCmd;
pub use pull::PullCmd;
pub use push::PushCmd;
pub use status::StatusCmd;
pub use track::{TrackCmd, UntrackCmd};
pub use verify::VerifyCmd;
