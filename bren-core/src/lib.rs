#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod actions;
pub mod archive;
pub mod attributes;
pub mod config;
pub mod error;
pub mod launcher;
pub mod operations;
pub mod output;
pub mod pattern;
pub mod placeholder;
pub mod preview;
pub mod rename;
pub mod rollback;
pub mod scanner;

pub use actions::RenameActions;
pub use archive::{process_archive, ArchiveFormat};
pub use attributes::{apply_attributes, AttributeChange};
pub use config::Config;
pub use error::{InvalidArgument, PermissionDenied};
pub use launcher::{launch, LaunchError, LaunchOutcome, LaunchTarget};
pub use operations::{rename_operation, rollback_operation, RenameRequest};
pub use output::{
    FailedItem, OutputFormat, OutputFormatter, PlannedRename, RenameResult, RollbackResult,
};
pub use pattern::{MatchKind, MatchPattern};
pub use placeholder::{PlaceholderOptions, RandomCase};
pub use preview::{render_preview, Preview};
pub use rename::{rename_root, RenameOptions};
pub use rollback::{rollback, RenameRecord, RollbackLog};
pub use scanner::{EntryFilter, EntryKind, ScanOptions, SortKey};
