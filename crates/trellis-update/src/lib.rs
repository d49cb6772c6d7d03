//! Self-update for the Trellis CLI.
//!
//! This crate handles:
//! - Querying the latest release
//! - Picking the release asset for the running platform
//! - Replacing the running executable through the install pipeline
//! - The non-blocking "update available" notice

pub mod asset;
pub mod error;
pub mod notice;
pub mod release;
pub mod updater;

pub use asset::{candidate_names, find_checksum_asset, find_release_asset};
pub use error::{UpdateError, UpdateResult};
pub use notice::{NO_UPDATE_CHECK_ENV_VAR, NOTICE_BUDGET, UpdateNotice, notice_enabled};
pub use release::{Release, ReleaseAsset, ReleaseFeed};
pub use updater::{
    BUILD_VERSION, DEV_VERSION, SelfUpdater, UpdateReport, UpdateStatus, current_executable,
    is_dev_build,
};
