pub mod compile;
pub mod inputs;
pub mod lint;
pub mod transforms;
pub mod watch;

pub use compile::{compile, CompileArgs};
pub use lint::{lint, LintArgs};
pub use transforms::{transforms, TransformsArgs};
pub use watch::{watch, WatchArgs};
